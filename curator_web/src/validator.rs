//! Form validation helpers.
//!
//! Checks are plain predicates; a [`Validator`] collects one message per
//! failing field so a form can be shown again with its errors.

use std::collections::BTreeMap;

pub const BLANK_FIELD: &str = "Cannot be empty";
pub const NOT_A_NUMBER: &str = "Must be a whole number";

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_integer(value: &str) -> bool {
    value.trim().parse::<i64>().is_ok()
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    field_errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty()
    }

    /// Record `message` for `field` unless `ok`. The first message for a field wins.
    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    pub fn add_field_error(&mut self, field: &str, message: &str) {
        self.field_errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Acme"));
        assert!(not_blank("  x "));
        assert!(!not_blank(""));
        assert!(!not_blank(" \t\n"));
    }

    #[test]
    fn test_is_integer() {
        assert!(is_integer("3"));
        assert!(is_integer(" -12 "));
        assert!(!is_integer("high"));
        assert!(!is_integer("1.5"));
        assert!(!is_integer(""));
    }

    #[test]
    fn test_validator_collects_first_error_per_field() {
        let mut v = Validator::default();
        assert!(v.is_valid());

        v.check_field(true, "name", BLANK_FIELD);
        assert!(v.is_valid());

        v.check_field(false, "priority", BLANK_FIELD);
        v.check_field(false, "priority", NOT_A_NUMBER);
        v.check_field(false, "status", BLANK_FIELD);

        assert!(!v.is_valid());
        assert_eq!(v.field_error("priority"), Some(BLANK_FIELD));
        assert_eq!(v.field_error("status"), Some(BLANK_FIELD));
        assert_eq!(v.field_error("name"), None);
        assert_eq!(v.field_errors().len(), 2);
    }
}
