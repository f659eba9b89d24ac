//! Supplier-side data model: the loosely typed record and its field vocabulary.

pub mod field;
pub mod raw_record;
