pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod table;
pub mod util;

pub use error::IngestError;
pub use ingest::{Dataset, DatasetBuilder};
