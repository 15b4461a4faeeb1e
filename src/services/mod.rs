pub mod assembler;
pub mod droid;
pub mod extraction;
pub mod fetcher;
pub mod pagination;
pub mod row_parser;

pub use assembler::*;
pub use droid::*;
pub use extraction::*;
pub use fetcher::*;
pub use pagination::*;
pub use row_parser::*;
