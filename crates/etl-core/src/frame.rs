//! The pipeline's data currency: a dataframe plus source identity.

use polars::prelude::DataFrame;

/// A table flowing through the pipeline, tagged with where it came from.
///
/// Created by the extractor, passed through the transform chain (each step
/// produces a new frame), and consumed by the loader. Nothing persists beyond
/// one run except the output artifact itself.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    /// Stable identifier of the origin (file path or URL), used in logs and
    /// parse errors.
    pub source_id: String,
    /// The table data.
    pub data: DataFrame,
}

impl SourceFrame {
    pub fn new(source_id: impl Into<String>, data: DataFrame) -> Self {
        Self {
            source_id: source_id.into(),
            data,
        }
    }

    pub fn row_count(&self) -> usize {
        self.data.height()
    }

    pub fn column_count(&self) -> usize {
        self.data.width()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// The same source with different data, e.g. after a transform step.
    pub fn with_data(&self, data: DataFrame) -> Self {
        Self {
            source_id: self.source_id.clone(),
            data,
        }
    }
}
