//! Wire models of the production-management backend
//!
//! The backend is loose about identifier types: ids arrive as JSON strings or
//! numbers, and "no reference" is spelled `null`, `""`, `"null"` or `0`
//! depending on the endpoint. Everything is held as `String` here and
//! normalised through [`normalize_ref`].

pub mod department;
pub mod employee;
pub mod factory;
pub mod user;

pub use department::{Department, Leader};
pub use employee::{Employee, SalaryType};
pub use factory::Factory;
pub use user::User;

/// Normalise a nullable reference (parent department, employee department).
///
/// Returns `None` for values meaning "no reference": absent, blank, the
/// literal `null` in any case, and `0`.
pub fn normalize_ref(raw: Option<&str>) -> Option<&str> {
    let s = raw?.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") || s == "0" {
        return None;
    }
    Some(s)
}

/// Serde helpers accepting string or numeric identifiers
pub mod id {
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    fn stringify(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn required<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        stringify(Value::deserialize(deserializer)?)
            .ok_or_else(|| D::Error::custom("identifier must not be null"))
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(deserializer)?.and_then(stringify))
    }
}

/// Serde helper for money fields, which arrive as numbers or decimal strings
pub mod amount {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Blank or unparsable values decode as `None`
    pub fn optional<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ref() {
        assert_eq!(normalize_ref(None), None);
        assert_eq!(normalize_ref(Some("")), None);
        assert_eq!(normalize_ref(Some("  ")), None);
        assert_eq!(normalize_ref(Some("null")), None);
        assert_eq!(normalize_ref(Some("NULL")), None);
        assert_eq!(normalize_ref(Some("0")), None);
        assert_eq!(normalize_ref(Some(" d-1 ")), Some("d-1"));
        assert_eq!(normalize_ref(Some("10")), Some("10"));
    }
}
