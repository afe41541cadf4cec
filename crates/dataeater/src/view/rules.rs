//! Structured filter rules.

use serde::{Deserialize, Serialize};

/// Comparison applied by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
}

impl Operator {
    /// Whether the operator compares against a value.
    pub fn needs_value(&self) -> bool {
        !matches!(self, Operator::IsEmpty | Operator::IsNotEmpty)
    }
}

/// One filter condition on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    /// Target column; empty when unset.
    #[serde(default)]
    pub column: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Position in the AND chain, ascending.
    #[serde(default)]
    pub priority: i32,
}

fn default_active() -> bool {
    true
}

impl Rule {
    /// Active rule with priority 0.
    pub fn new(
        id: impl Into<String>,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            column: column.into(),
            operator,
            value: value.into(),
            active: true,
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether the rule takes part in compilation.
    pub fn is_applicable(&self) -> bool {
        self.active && !self.column.trim().is_empty()
    }
}

/// Applicable rules in ascending priority. Ties keep their input order.
pub fn ordered_rules(rules: &[Rule]) -> Vec<&Rule> {
    let mut applicable: Vec<&Rule> = rules.iter().filter(|r| r.is_applicable()).collect();
    applicable.sort_by_key(|r| r.priority);
    applicable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_json_defaults() {
        let rule: Rule =
            serde_json::from_str(r#"{"id":"r1","column":"age","operator":"greater_than","value":"30"}"#)
                .unwrap();
        assert!(rule.active);
        assert_eq!(rule.priority, 0);
        assert_eq!(rule.operator, Operator::GreaterThan);
    }

    #[test]
    fn test_ordered_rules_skips_inactive_and_blank() {
        let mut inactive = Rule::new("b", "city", Operator::Equals, "Paris");
        inactive.active = false;
        let rules = vec![
            Rule::new("a", "age", Operator::LessThan, "5").with_priority(2),
            inactive,
            Rule::new("c", "", Operator::IsEmpty, ""),
            Rule::new("d", "name", Operator::IsNotEmpty, "").with_priority(1),
        ];
        let ids: Vec<&str> = ordered_rules(&rules).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a"]);
    }
}
