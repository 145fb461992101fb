//! Tabular input shapes and the cube → record-set rewrite.
//!
//! Two mutually exclusive shapes exist: "Cube" (parallel named
//! dimension/measure columns) and "Set" (explicit series or row-oriented
//! records). The engine consumes records exclusively, so cube payloads are
//! unpivoted before submission. A payload carrying markers of both shapes at
//! once is rejected, never merged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::InteropError;

/// One record field value. Dimensions produce text cells, measures numeric
/// ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

/// Row-oriented record: field name → cell, in column order.
pub type Record = IndexMap<String, Cell>;

/// Explicit series column (Set shape).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    #[serde(default)]
    pub values: Vec<Cell>,
}

impl Series {
    /// A series whose values are all numeric is treated as a measure column;
    /// anything else is a dimension.
    pub fn is_measure(&self) -> bool {
        !self.values.is_empty()
            && self.values.iter().all(|c| matches!(c, Cell::Number(_)))
    }
}

/// Named dimension column (Cube shape).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Named measure column (Cube shape).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub values: Vec<f64>,
}

/// Data section of an animation target. Which optional fields are present
/// determines the shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<Series>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Record>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<Dimension>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measures: Option<Vec<Measure>>,
}

impl DataPayload {
    /// Cube markers present?
    pub fn is_cube(&self) -> bool {
        self.dimensions.is_some() || self.measures.is_some()
    }

    /// Set markers present?
    pub fn is_set(&self) -> bool {
        self.series.is_some() || self.records.is_some()
    }
}

/// Expand a cube payload into row-oriented records.
///
/// One output row per position across the paired columns, one field per
/// named dimension/measure, values taken positionally. All columns must be
/// of equal length. The input payload is not modified on failure.
pub fn unpivot(payload: &DataPayload) -> Result<DataPayload, InteropError> {
    let dimensions = payload.dimensions.as_deref().unwrap_or(&[]);
    let measures = payload.measures.as_deref().unwrap_or(&[]);

    let expected = dimensions
        .first()
        .map(|d| d.categories.len())
        .or_else(|| measures.first().map(|m| m.values.len()))
        .unwrap_or(0);

    for dim in dimensions {
        if dim.categories.len() != expected {
            return Err(InteropError::ColumnLength {
                column: dim.name.clone(),
                len: dim.categories.len(),
                expected,
            });
        }
    }
    for measure in measures {
        if measure.values.len() != expected {
            return Err(InteropError::ColumnLength {
                column: measure.name.clone(),
                len: measure.values.len(),
                expected,
            });
        }
    }

    let mut rows = Vec::with_capacity(expected);
    for i in 0..expected {
        let mut row = Record::new();
        for dim in dimensions {
            row.insert(dim.name.clone(), Cell::Text(dim.categories[i].clone()));
        }
        for measure in measures {
            row.insert(measure.name.clone(), Cell::Number(measure.values[i]));
        }
        rows.push(row);
    }

    Ok(DataPayload {
        records: Some(rows),
        ..DataPayload::default()
    })
}
