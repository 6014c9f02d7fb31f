use serde_json::Value;
use std::str::FromStr;

/// Field mapping parse errors
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Input is not valid JSON
    #[error("invalid field mapping JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level JSON value is not an object
    #[error("field mapping must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A field maps to something other than a path string
    #[error("field mapping entry '{0}' must be a path string")]
    NonStringPath(String),
}

/// Ordered association of output field names to path expressions.
///
/// Iteration order is the order in which fields were written in the
/// configuration, and that order is carried into every mapped record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    fields: Vec<(String, String)>,
}

impl FieldMapping {
    /// Build a mapping from (output field, path) pairs.
    ///
    /// A repeated field name keeps its first position and takes the last
    /// path, as a JSON object literal with duplicate keys does.
    pub fn from_pairs<I, K, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<String>,
    {
        let mut mapping = Self::default();
        for (field, path) in pairs {
            mapping.insert(field, path);
        }
        mapping
    }

    /// Parse a mapping from a JSON object string such as
    /// `{"c": "data.body", "upvotes": "data.ups"}`
    pub fn from_json(json: &str) -> Result<Self, MappingError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Build a mapping from an already parsed JSON object
    pub fn from_value(value: &Value) -> Result<Self, MappingError> {
        let object = match value {
            Value::Object(object) => object,
            other => return Err(MappingError::NotAnObject(json_kind(other))),
        };

        let mut mapping = Self::default();
        for (field, path) in object {
            match path {
                Value::String(path) => mapping.insert(field.clone(), path.clone()),
                _ => return Err(MappingError::NonStringPath(field.clone())),
            }
        }
        Ok(mapping)
    }

    fn insert(&mut self, field: impl Into<String>, path: impl Into<String>) {
        let field = field.into();
        let path = path.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == field) {
            Some(entry) => entry.1 = path,
            None => self.fields.push((field, path)),
        }
    }

    /// Iterate (output field, path) pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(f, p)| (f.as_str(), p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromStr for FieldMapping {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_preserves_order() {
        let mapping = FieldMapping::from_json(
            r#"{"zeta": "data.z", "alpha": "data.a", "mid": "data.m[0]"}"#,
        )
        .unwrap();

        let fields: Vec<_> = mapping.iter().collect();
        assert_eq!(
            fields,
            vec![("zeta", "data.z"), ("alpha", "data.a"), ("mid", "data.m[0]")]
        );
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(matches!(
            FieldMapping::from_json("[1, 2]"),
            Err(MappingError::NotAnObject("array"))
        ));
        assert!(matches!(
            FieldMapping::from_json("not json"),
            Err(MappingError::Json(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_non_string_path() {
        let err = FieldMapping::from_json(r#"{"c": "data.body", "n": 3}"#).unwrap_err();
        assert!(matches!(err, MappingError::NonStringPath(ref f) if f == "n"));
        assert_eq!(
            err.to_string(),
            "field mapping entry 'n' must be a path string"
        );
    }

    #[test]
    fn test_duplicate_field_keeps_first_position() {
        let mapping = FieldMapping::from_pairs([("a", "x"), ("b", "y"), ("a", "z")]);
        let fields: Vec<_> = mapping.iter().collect();
        assert_eq!(fields, vec![("a", "z"), ("b", "y")]);
    }

    #[test]
    fn test_parse_via_from_str() {
        let mapping: FieldMapping = r#"{"c": "data.body"}"#.parse().unwrap();
        assert_eq!(mapping.len(), 1);
        assert!(!mapping.is_empty());
        assert!(FieldMapping::from_json("{}").unwrap().is_empty());
    }
}
