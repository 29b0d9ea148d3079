//! Translation of raw schema metadata into normalized field, index and foreign key records.

pub mod fields;
pub mod foreign_keys;
pub mod indexes;

pub use fields::{parse_enum_values, ColumnModelBuilder};
pub use foreign_keys::ForeignKeyExtractor;
pub use indexes::{ClassifiedIndexes, IndexClassifier};
