pub mod dataset;
pub mod page;
pub mod record;

pub use dataset::*;
pub use page::*;
pub use record::*;
