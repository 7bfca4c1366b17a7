use std::collections::BTreeMap;

use gems_expr::literal::format_float;
use serde::Serialize;

/// User variables created by rules during a session. Values are always text.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Missing variables never equal anything.
    pub fn value_is(&self, name: &str, value: &str) -> bool {
        self.get(name).map_or(false, |current| smart_eq(current, value))
    }

    /// Add one, seeding `"1"` when the variable is missing or not numeric.
    pub fn increase(&mut self, name: &str) -> String {
        let next = match self.numeric(name) {
            Some(current) => format_number(current + 1.0),
            None => "1".to_string(),
        };
        self.set(name, next.clone());
        next
    }

    /// Subtract one, seeding `"0"` when the variable is missing or not numeric.
    pub fn decrease(&mut self, name: &str) -> String {
        let next = match self.numeric(name) {
            Some(current) => format_number(current - 1.0),
            None => "0".to_string(),
        };
        self.set(name, next.clone());
        next
    }

    fn numeric(&self, name: &str) -> Option<f64> {
        self.get(name)?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// Numeric equality when both trimmed sides parse as floats, otherwise exact
/// text equality.
pub fn smart_eq(left: &str, right: &str) -> bool {
    match (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => left == right,
    }
}

/// Whole numbers print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        format_float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_compare_prefers_numbers() {
        assert!(smart_eq("3", "3.0"));
        assert!(smart_eq(" 2 ", "2"));
        assert!(!smart_eq("abc", "ABC"));
        assert!(smart_eq("abc", "abc"));
        assert!(!smart_eq("3", "three"));
    }

    #[test]
    fn value_is_and_missing_variables() {
        let mut vars = Variables::new();
        assert!(!vars.value_is("door", "open"));
        vars.set("door", "open");
        assert!(vars.value_is("door", "open"));
        assert!(!vars.value_is("door", "closed"));
    }

    #[test]
    fn increase_then_decrease_from_missing() {
        let mut vars = Variables::new();
        assert_eq!(vars.increase("n"), "1");
        assert_eq!(vars.decrease("n"), "0");
        assert_eq!(vars.get("n"), Some("0"));
    }

    #[test]
    fn increase_keeps_integer_formatting() {
        let mut vars = Variables::new();
        vars.set("score", "2.0");
        assert_eq!(vars.increase("score"), "3");
        vars.set("ratio", "0.5");
        assert_eq!(vars.increase("ratio"), "1.5");
        vars.set("word", "many");
        assert_eq!(vars.decrease("word"), "0");
    }
}
