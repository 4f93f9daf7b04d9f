//! Slot auction engine.
//!
//! Decides which campaigns a display slot shows, in order, under a fixed
//! precedence of system, operational and commercial content, with audience
//! targeting for commercial campaigns and an audit row for every candidate.

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod resolve;
pub mod result;
pub mod selector;
pub mod store;
pub mod targeting;
pub mod tiers;

pub use config::AppConfig;
pub use engine::{AuctionEngine, Stores};
pub use error::{AuctionError, ConfigError};
pub use result::{CreativePayload, WinnerResult};
