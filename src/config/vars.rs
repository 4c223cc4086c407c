//! Caller-supplied custom macro variables (`--json` / `--json-file`).
use std::path::Path;

use serde_json::Value;

use crate::error::ConfigError;

/// Ordered key → value mapping of custom macro variables.
///
/// Insertion order is the order the keys appear in the JSON object and is
/// the order both substitution passes visit them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomVars(Vec<(String, String)>);

impl CustomVars {
    /// Parse a JSON object into an ordered variable list.
    ///
    /// Strings are taken verbatim, numbers and booleans use their JSON text,
    /// `null` becomes an empty value (which both passes skip).
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object, a key contains
    /// characters that cannot appear in a macro token, or a value is an
    /// array or object.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(map) = value else {
            return Err(ConfigError::NotAnObject);
        };

        let mut vars = Vec::with_capacity(map.len());
        for (key, value) in map {
            if !is_valid_key(&key) {
                return Err(ConfigError::InvalidKey(key));
            }
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => return Err(ConfigError::InvalidValue(key)),
            };
            vars.push((key, text));
        }
        Ok(Self(vars))
    }

    /// Read and parse a JSON object from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails [`parse`](Self::parse).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Build from pairs that are already known to be valid.
    #[must_use]
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Iterate `(key, value)` pairs in mapping order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no variables were supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_mapping_order() {
        let vars = CustomVars::parse(r#"{"zeta":"1","alpha":"2","mid":"3"}"#).unwrap();
        let keys: Vec<&str> = vars.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn parse_empty_object() {
        let vars = CustomVars::parse("{}").unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn parse_stringifies_scalars() {
        let vars = CustomVars::parse(r#"{"n":3,"b":true,"z":null}"#).unwrap();
        let pairs: Vec<(&str, &str)> = vars.iter().collect();
        assert_eq!(pairs, vec![("n", "3"), ("b", "true"), ("z", "")]);
    }

    #[test]
    fn parse_rejects_non_object() {
        assert!(matches!(
            CustomVars::parse(r#"["a"]"#),
            Err(ConfigError::NotAnObject)
        ));
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(matches!(
            CustomVars::parse("{k1:v1}"),
            Err(ConfigError::InvalidJson(_))
        ));
    }

    #[test]
    fn parse_rejects_bad_key() {
        assert!(matches!(
            CustomVars::parse(r#"{"a/b":"x"}"#),
            Err(ConfigError::InvalidKey(k)) if k == "a/b"
        ));
        assert!(matches!(
            CustomVars::parse(r#"{"":"x"}"#),
            Err(ConfigError::InvalidKey(_))
        ));
    }

    #[test]
    fn parse_rejects_nested_value() {
        assert!(matches!(
            CustomVars::parse(r#"{"k":{"nested":1}}"#),
            Err(ConfigError::InvalidValue(k)) if k == "k"
        ));
    }

    #[test]
    fn from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.json");
        std::fs::write(&path, r#"{"m1":"v1","m2":"v2"}"#).unwrap();
        let vars = CustomVars::from_file(&path).unwrap();
        assert_eq!(vars, CustomVars::from_pairs([("m1", "v1"), ("m2", "v2")]));
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CustomVars::from_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
