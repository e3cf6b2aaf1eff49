//! Core functionality for the geospatial visualisation pipeline
//!
//! This crate provides the dataset model, magnitude scaling, derived
//! location queries and the state store that the map layers are built from.

pub mod config;
pub mod dataset;
pub mod events;
pub mod queries;
pub mod scale;
pub mod state;

use thiserror::Error;

// Re-export commonly used types
pub use config::{ColumnRole, StoreField, VisualizationConfig};
pub use dataset::{CellValue, Dataset, Record};
pub use events::EventBus;
pub use queries::{ColumnSelection, Location};
pub use scale::{calc_domain, create_linear_scale, Domain, LinearScale};
pub use state::{ParseOutcome, VisualizationStore};
pub use data::DatasetParser;

/// Errors raised by the state store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unknown store field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: StoreField, value: String },

    #[error("Column '{0}' is not present in the current header")]
    UnknownColumn(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Seam between the store and the text parser
pub mod data {
    use crate::dataset::Dataset;

    /// Turns delimited text into a dataset
    #[async_trait::async_trait]
    pub trait DatasetParser: Send + Sync {
        /// Parse synchronously
        fn parse(&self, text: &str, delimiter: &str) -> anyhow::Result<Dataset>;

        /// Parse off the calling task; resolves only once the whole input is consumed
        async fn parse_async(&self, text: &str, delimiter: &str) -> anyhow::Result<Dataset>;
    }
}
