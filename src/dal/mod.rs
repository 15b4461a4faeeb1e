pub mod dataset_csv;

pub use dataset_csv::*;
