use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

use crate::error::ConfigError;

pub const DEFAULT_SLA_WARN_MS: u64 = 3000;
pub const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    /// Runs slower than this are reported at warn level; behavior is unchanged.
    #[validate(range(min = 1))]
    pub sla_warn_ms: u64,
    /// Deadline applied when the caller passes none.
    #[validate(range(min = 1))]
    pub default_deadline_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sla_warn_ms: DEFAULT_SLA_WARN_MS,
            default_deadline_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn sla_warn(&self) -> Duration {
        Duration::from_millis(self.sla_warn_ms)
    }

    pub fn default_deadline(&self) -> Option<Duration> {
        self.default_deadline_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct AuditConfig {
    #[validate(range(min = 1))]
    pub queue_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_AUDIT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: log::LevelFilter,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: log::LevelFilter::Info,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(nested)]
    pub engine: EngineConfig,
    #[validate(nested)]
    pub audit: AuditConfig,
    #[validate(nested)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = AppConfig::from_toml_str("").expect("empty config should parse");
        assert_eq!(cfg.engine.sla_warn_ms, 3000);
        assert_eq!(cfg.engine.default_deadline(), None);
        assert_eq!(cfg.audit.queue_capacity, 1024);
        assert_eq!(cfg.logging.level, log::LevelFilter::Info);
    }

    #[test]
    fn parses_all_sections() {
        let toml_str = "[engine]\nsla_warn_ms = 500\ndefault_deadline_ms = 250\n\n[audit]\nqueue_capacity = 16\n\n[logging]\nlevel = \"debug\"\n";
        let cfg = AppConfig::from_toml_str(toml_str).expect("should parse valid config");
        assert_eq!(cfg.engine.sla_warn(), Duration::from_millis(500));
        assert_eq!(
            cfg.engine.default_deadline(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(cfg.audit.queue_capacity, 16);
        assert_eq!(cfg.logging.level, log::LevelFilter::Debug);
    }

    #[test]
    fn rejects_invalid_level() {
        let toml_str = "[logging]\nlevel = \"verbose\"\n";
        let err = AppConfig::from_toml_str(toml_str).err().expect("should error");
        assert!(matches!(err, ConfigError::Parse(_)), "unexpected error: {}", err);
    }

    #[test]
    fn rejects_zero_queue_capacity() {
        let err = AppConfig::from_toml_str("[audit]\nqueue_capacity = 0\n")
            .err()
            .expect("should error");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_deadline() {
        let err = AppConfig::from_toml_str("[engine]\ndefault_deadline_ms = 0\n")
            .err()
            .expect("should error");
        // error originates from validator; don't rely on exact text
        assert!(err.to_string().to_lowercase().contains("valid"));
    }
}
