//! Data types exchanged with callers: the dataset table and result records.

mod records;
mod table;

pub use records::*;
pub use table::*;
