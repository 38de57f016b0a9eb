//! On-disk storage primitives: the data file, the fixed-width index file,
//! and the attribute posting file, plus the shared format constants they
//! are encoded with.

pub mod attr_index;
pub mod data_file;
pub mod format;
pub mod index_file;
pub mod index_table;

pub use attr_index::AttrIndex;
pub use data_file::DataFile;
pub use index_file::IndexFile;
pub use index_table::{IndexRecord, IndexTable};
