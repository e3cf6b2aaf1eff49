//! Derived queries over the store state
//!
//! These are pure functions of a dataset and a column selection. The store
//! calls them on every read, so nothing derived is ever cached.

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Record};
use crate::scale::{calc_domain, LinearScale};

/// Which columns hold latitude, longitude and the optional magnitude
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub multiplier: Option<String>,
}

impl ColumnSelection {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
            multiplier: None,
        }
    }

    pub fn with_multiplier(mut self, multiplier: impl Into<String>) -> Self {
        self.multiplier = Some(multiplier.into());
        self
    }
}

/// A derived point: coordinates plus an optional normalised magnitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: Option<f64>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, magnitude: None }
    }

    pub fn with_magnitude(latitude: f64, longitude: f64, magnitude: f64) -> Self {
        Self { latitude, longitude, magnitude: Some(magnitude) }
    }

    /// `[lat, lon]` or `[lat, lon, magnitude]`
    pub fn to_vec(&self) -> Vec<f64> {
        match self.magnitude {
            Some(m) => vec![self.latitude, self.longitude, m],
            None => vec![self.latitude, self.longitude],
        }
    }
}

/// Column names of the dataset, empty when it holds no records
pub fn columns(dataset: &Dataset) -> Vec<String> {
    if dataset.is_empty() {
        Vec::new()
    } else {
        dataset.header.clone()
    }
}

/// Derive one location per record.
///
/// Returns an empty list when latitude or longitude is unselected. Cells that
/// do not coerce to a number become `NaN` so the output length always equals
/// the record count. When a multiplier column is selected, its values are
/// normalised onto `[0, 1]` with a scale built once from the column domain.
pub fn locations(dataset: &Dataset, selection: &ColumnSelection) -> Vec<Location> {
    let (lat_col, lon_col) = match (&selection.latitude, &selection.longitude) {
        (Some(lat), Some(lon)) => (lat.as_str(), lon.as_str()),
        _ => return Vec::new(),
    };

    let coerce = |record: &Record, column: &str| {
        record.get(column).map(|cell| cell.as_f64()).unwrap_or(f64::NAN)
    };

    match &selection.multiplier {
        None => dataset
            .records
            .iter()
            .map(|record| Location::new(coerce(record, lat_col), coerce(record, lon_col)))
            .collect(),
        Some(mult_col) => {
            let scale = calc_domain(dataset, mult_col).map(LinearScale::normalized);
            dataset
                .records
                .iter()
                .map(|record| {
                    let value = coerce(record, mult_col);
                    let magnitude = match scale {
                        Some(scale) if value.is_finite() => scale.scale(value),
                        _ => f64::NAN,
                    };
                    Location::with_magnitude(coerce(record, lat_col), coerce(record, lon_col), magnitude)
                })
                .collect()
        }
    }
}
