//! Peekaboo comment mapper
//!
//! Flattens nested JSON records into ordered field sets using dotted path
//! expressions such as `data.body` or `choices[0].message.content`.

mod mapper;
mod mapping;
mod path;

pub use mapper::{map_records, map_records_at, MappedBatch, MappedRecord, DEFAULT_RECORDS_PATH};
pub use mapping::{FieldMapping, MappingError};
pub use path::extract_value;
