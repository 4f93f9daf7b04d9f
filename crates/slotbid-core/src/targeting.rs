//! Audience targeting predicates and their evaluation against viewer tags.
//!
//! Matching is fail-open: a missing rule, an empty rule list or a viewer
//! without tags all match unconditionally.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};

/// Flat key/value tags describing one viewer.
pub type UserTags = HashMap<String, String>;

/// Largest magnitude below which every whole `f64` is an exact integer.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    All,
    Any,
}

/// Comparison applied between a viewer tag and a rule value.
///
/// `Unrecognized` keeps operators this build does not know about so that
/// a rule written by a newer admin tool still loads; it never matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Unrecognized(String),
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "eq" => Operator::Eq,
            "neq" => Operator::Neq,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            _ => Operator::Unrecognized(s),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Unrecognized(other) => other.as_str(),
        };
        f.write_str(s)
    }
}

/// A single `tag_key <operator> value` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRule {
    pub tag_key: String,
    pub operator: Operator,
    /// String, number or bool.
    pub value: JsonValue,
}

impl TagRule {
    pub fn new(tag_key: &str, operator: Operator, value: impl Into<JsonValue>) -> Self {
        Self {
            tag_key: tag_key.to_string(),
            operator,
            value: value.into(),
        }
    }

    /// Rule value as the string it is compared with.
    fn value_string(&self) -> String {
        match &self.value {
            JsonValue::String(s) => s.clone(),
            JsonValue::Null => "null".to_string(),
            // 3.0 compares as "3"
            JsonValue::Number(n) if n.is_f64() => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT => (f as i64).to_string(),
                _ => n.to_string(),
            },
            other => other.to_string(),
        }
    }

    fn evaluate(&self, tags: &UserTags) -> bool {
        let Some(actual) = tags.get(&self.tag_key) else {
            return false;
        };
        let expected = self.value_string();
        match &self.operator {
            Operator::Eq => *actual == expected,
            Operator::Neq => *actual != expected,
            Operator::Gt => compare_numeric(actual, &expected, |a, b| a > b),
            Operator::Gte => compare_numeric(actual, &expected, |a, b| a >= b),
            Operator::Lt => compare_numeric(actual, &expected, |a, b| a < b),
            Operator::Lte => compare_numeric(actual, &expected, |a, b| a <= b),
            Operator::Unrecognized(op) => {
                log::warn!(
                    "targeting: unrecognized operator '{}' on tag '{}', treating as no match",
                    op,
                    self.tag_key
                );
                false
            }
        }
    }
}

fn compare_numeric(actual: &str, expected: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => cmp(a, b),
        _ => false,
    }
}

impl Validate for TagRule {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.tag_key.trim().is_empty() {
            let mut error = ValidationError::new("required");
            error.message = Some("tag_key must be non-empty".into());
            errors.add("tag_key", error);
        }

        if self.value.is_array() || self.value.is_object() || self.value.is_null() {
            let mut error = ValidationError::new("scalar");
            error.message = Some("value must be a string, number or bool".into());
            errors.add("value", error);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Structured audience predicate attached to a commercial campaign.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct TargetingRule {
    #[serde(default)]
    pub match_type: MatchType,
    #[serde(default)]
    #[validate(nested)]
    pub rules: Vec<TagRule>,
}

impl TargetingRule {
    pub fn all(rules: Vec<TagRule>) -> Self {
        Self {
            match_type: MatchType::All,
            rules,
        }
    }

    pub fn any(rules: Vec<TagRule>) -> Self {
        Self {
            match_type: MatchType::Any,
            rules,
        }
    }
}

/// Evaluate `rule` against a viewer's `tags`.
pub fn matches(rule: Option<&TargetingRule>, tags: Option<&UserTags>) -> bool {
    let Some(rule) = rule else {
        return true;
    };
    let tags = match tags {
        Some(t) if !t.is_empty() => t,
        _ => return true,
    };
    if rule.rules.is_empty() {
        return true;
    }

    match rule.match_type {
        MatchType::All => rule.rules.iter().all(|r| r.evaluate(tags)),
        MatchType::Any => rule.rules.iter().any(|r| r.evaluate(tags)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> UserTags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn city_bj() -> TargetingRule {
        TargetingRule::all(vec![TagRule::new("city", Operator::Eq, "BJ")])
    }

    #[test]
    fn missing_rule_matches() {
        assert!(matches(None, Some(&tags(&[("city", "SH")]))));
        assert!(matches(None, None));
    }

    #[test]
    fn missing_or_empty_tags_match() {
        let rule = city_bj();
        assert!(matches(Some(&rule), None));
        assert!(matches(Some(&rule), Some(&UserTags::new())));
    }

    #[test]
    fn empty_rule_list_matches() {
        let rule = TargetingRule::all(vec![]);
        assert!(matches(Some(&rule), Some(&tags(&[("city", "SH")]))));
    }

    #[test]
    fn eq_and_neq_compare_strings() {
        let t = tags(&[("city", "BJ")]);
        assert!(matches(Some(&city_bj()), Some(&t)));
        assert!(!matches(Some(&city_bj()), Some(&tags(&[("city", "SH")]))));

        let neq = TargetingRule::all(vec![TagRule::new("city", Operator::Neq, "SH")]);
        assert!(matches(Some(&neq), Some(&t)));
    }

    #[test]
    fn eq_coerces_numeric_value_to_string() {
        let rule = TargetingRule::all(vec![TagRule::new("level", Operator::Eq, 3)]);
        assert!(matches(Some(&rule), Some(&tags(&[("level", "3")]))));
        assert!(!matches(Some(&rule), Some(&tags(&[("level", "3.0")]))));

        let rule = TargetingRule::all(vec![TagRule::new("level", Operator::Eq, 3.0)]);
        assert!(matches(Some(&rule), Some(&tags(&[("level", "3")]))));
        assert!(!matches(Some(&rule), Some(&tags(&[("level", "3.0")]))));

        let rule = TargetingRule::all(vec![TagRule::new("level", Operator::Neq, -2.0)]);
        assert!(!matches(Some(&rule), Some(&tags(&[("level", "-2")]))));

        let rule = TargetingRule::all(vec![TagRule::new("ratio", Operator::Eq, 2.5)]);
        assert!(matches(Some(&rule), Some(&tags(&[("ratio", "2.5")]))));

        let rule = TargetingRule::all(vec![TagRule::new("vip", Operator::Eq, true)]);
        assert!(matches(Some(&rule), Some(&tags(&[("vip", "true")]))));
    }

    #[test]
    fn numeric_operators_parse_floats() {
        let t = tags(&[("age", "25")]);
        let check = |op: Operator, v: f64| {
            let rule = TargetingRule::all(vec![TagRule::new("age", op, v)]);
            matches(Some(&rule), Some(&t))
        };
        assert!(check(Operator::Gt, 18.0));
        assert!(!check(Operator::Gt, 25.0));
        assert!(check(Operator::Gte, 25.0));
        assert!(check(Operator::Lt, 30.5));
        assert!(!check(Operator::Lt, 25.0));
        assert!(check(Operator::Lte, 25.0));
    }

    #[test]
    fn numeric_operator_on_non_numeric_tag_is_false() {
        let rule = TargetingRule::all(vec![TagRule::new("age", Operator::Gt, 18)]);
        assert!(!matches(Some(&rule), Some(&tags(&[("age", "unknown")]))));
    }

    #[test]
    fn absent_tag_key_fails_sub_rule() {
        let rule = city_bj();
        assert!(!matches(Some(&rule), Some(&tags(&[("gender", "f")]))));
    }

    #[test]
    fn unrecognized_operator_is_false_not_error() {
        let v = serde_json::json!({
            "match_type": "all",
            "rules": [{"tag_key": "city", "operator": "contains", "value": "B"}]
        });
        let rule: TargetingRule = serde_json::from_value(v).unwrap();
        assert_eq!(
            rule.rules[0].operator,
            Operator::Unrecognized("contains".to_string())
        );
        assert!(!matches(Some(&rule), Some(&tags(&[("city", "BJ")]))));
    }

    #[test]
    fn all_requires_every_rule_any_requires_one() {
        let t = tags(&[("city", "BJ"), ("age", "20")]);
        let sub = vec![
            TagRule::new("city", Operator::Eq, "BJ"),
            TagRule::new("age", Operator::Gte, 30),
        ];
        assert!(!matches(Some(&TargetingRule::all(sub.clone())), Some(&t)));
        assert!(matches(Some(&TargetingRule::any(sub)), Some(&t)));
    }

    #[test]
    fn match_type_defaults_to_all() {
        let v = serde_json::json!({
            "rules": [
                {"tag_key": "city", "operator": "eq", "value": "BJ"},
                {"tag_key": "age", "operator": "gt", "value": 40}
            ]
        });
        let rule: TargetingRule = serde_json::from_value(v).unwrap();
        assert_eq!(rule.match_type, MatchType::All);
        assert!(!matches(
            Some(&rule),
            Some(&tags(&[("city", "BJ"), ("age", "20")]))
        ));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let rule = TargetingRule::any(vec![
            TagRule::new("city", Operator::Eq, "BJ"),
            TagRule::new("age", Operator::Lt, 18),
        ]);
        let t = tags(&[("city", "SH"), ("age", "16")]);
        let first = matches(Some(&rule), Some(&t));
        let second = matches(Some(&rule), Some(&t));
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn operator_round_trips_through_string() {
        let json = serde_json::to_string(&Operator::Gte).unwrap();
        assert_eq!(json, "\"gte\"");
        let op: Operator = serde_json::from_str("\"lte\"").unwrap();
        assert_eq!(op, Operator::Lte);
    }

    #[test]
    fn validation_rejects_empty_tag_key_and_non_scalar_value() {
        let rule = TargetingRule::all(vec![TagRule::new("", Operator::Eq, "x")]);
        assert!(rule.validate().is_err());

        let rule = TargetingRule::all(vec![TagRule::new(
            "city",
            Operator::Eq,
            serde_json::json!(["BJ", "SH"]),
        )]);
        assert!(rule.validate().is_err());

        assert!(city_bj().validate().is_ok());
    }
}
