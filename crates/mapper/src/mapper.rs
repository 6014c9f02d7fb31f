use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::mapping::FieldMapping;
use crate::path::extract_value;

/// Where a comment listing keeps its records
pub const DEFAULT_RECORDS_PATH: &str = "data.children";

/// One flattened record.
///
/// Fields appear in field-mapping order. A field whose path did not resolve
/// is kept as `None` and left out when serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedRecord {
    fields: Vec<(String, Option<Value>)>,
}

impl MappedRecord {
    /// Value extracted for `field`, if its path resolved
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| value.as_ref())
    }

    /// All fields in mapping order, including unresolved ones
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Output field names in mapping order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for MappedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.fields.iter().filter(|(_, v)| v.is_some()).count();
        let mut map = serializer.serialize_map(Some(present))?;
        for (name, value) in &self.fields {
            if let Some(value) = value {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

/// Mapping result for one batch
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct MappedBatch {
    /// Flattened records in input order
    pub records: Vec<MappedRecord>,

    /// Number of input records processed
    pub processed_count: usize,
}

/// Flatten the records of a comment listing (`data.children`).
///
/// `limit <= 0` means every record is processed.
pub fn map_records(batch: &Value, mapping: &FieldMapping, limit: i64) -> MappedBatch {
    map_records_at(batch, DEFAULT_RECORDS_PATH, mapping, limit)
}

/// Flatten the records found at `records_path` inside `batch`.
///
/// A batch without a record array at that path yields an empty result.
/// Records are processed in order until `limit` is reached; a non-positive
/// limit processes all of them.
pub fn map_records_at(
    batch: &Value,
    records_path: &str,
    mapping: &FieldMapping,
    limit: i64,
) -> MappedBatch {
    let Some(Value::Array(records)) = extract_value(batch, records_path) else {
        return MappedBatch::default();
    };

    let take = match usize::try_from(limit) {
        Ok(n) if n > 0 => n,
        _ => usize::MAX,
    };

    let records: Vec<MappedRecord> = records
        .iter()
        .take(take)
        .map(|record| map_record(record, mapping))
        .collect();

    MappedBatch {
        processed_count: records.len(),
        records,
    }
}

fn map_record(record: &Value, mapping: &FieldMapping) -> MappedRecord {
    MappedRecord {
        fields: mapping
            .iter()
            .map(|(field, path)| (field.to_string(), extract_value(record, path).cloned()))
            .collect(),
    }
}
