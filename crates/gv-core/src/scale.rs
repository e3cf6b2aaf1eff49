//! Domain and linear scale utilities for magnitude normalisation

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Numeric (min, max) range of a column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width of the domain
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

/// Compute the numeric domain of `column` in a single pass.
///
/// Cells that do not coerce to a finite number are skipped. Returns `None`
/// when the column holds no numeric value at all.
pub fn calc_domain(dataset: &Dataset, column: &str) -> Option<Domain> {
    dataset
        .column_values(column)
        .flatten()
        .map(|cell| cell.as_f64())
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<Domain>, v| match acc {
            None => Some(Domain::new(v, v)),
            Some(d) => Some(Domain::new(d.min.min(v), d.max.max(v))),
        })
}

/// Linear mapping from a domain onto a target range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: Domain,
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: Domain, range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Scale onto the unit interval
    pub fn normalized(domain: Domain) -> Self {
        Self::new(domain, (0.0, 1.0))
    }

    /// Map `value` onto the target range.
    ///
    /// A degenerate domain maps every value to the start of the range.
    pub fn scale(&self, value: f64) -> f64 {
        if self.domain.is_degenerate() {
            return self.range.0;
        }
        let t = (value - self.domain.min) / self.domain.span();
        self.range.0 + t * (self.range.1 - self.range.0)
    }
}

/// Build a pure scaling function for `domain` → `range`
pub fn create_linear_scale(domain: Domain, range: (f64, f64)) -> impl Fn(f64) -> f64 {
    let scale = LinearScale::new(domain, range);
    move |value| scale.scale(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CellValue, Record};

    fn dataset_with(values: &[&str]) -> Dataset {
        let records = values
            .iter()
            .map(|v| {
                let mut record = Record::new();
                record.insert("mag".to_string(), CellValue::from(*v));
                record
            })
            .collect();
        Dataset::new(vec!["mag".to_string()], records)
    }

    #[test]
    fn test_scale_midpoint_and_bounds() {
        let scale = create_linear_scale(Domain::new(0.0, 10.0), (0.0, 1.0));
        assert_eq!(scale(5.0), 0.5);
        assert_eq!(scale(0.0), 0.0);
        assert_eq!(scale(10.0), 1.0);
    }

    #[test]
    fn test_scale_custom_range() {
        let scale = LinearScale::new(Domain::new(10.0, 20.0), (100.0, 200.0));
        assert_eq!(scale.scale(15.0), 150.0);
    }

    #[test]
    fn test_degenerate_domain_maps_to_range_start() {
        let scale = LinearScale::new(Domain::new(3.0, 3.0), (0.25, 1.0));
        assert_eq!(scale.scale(3.0), 0.25);
        assert_eq!(scale.scale(42.0), 0.25);
    }

    #[test]
    fn test_calc_domain() {
        let dataset = dataset_with(&["4", "-2", "9.5", "n/a"]);
        assert_eq!(calc_domain(&dataset, "mag"), Some(Domain::new(-2.0, 9.5)));
    }

    #[test]
    fn test_calc_domain_without_numbers() {
        assert_eq!(calc_domain(&dataset_with(&["x", ""]), "mag"), None);
        assert_eq!(calc_domain(&Dataset::default(), "mag"), None);
        assert_eq!(calc_domain(&dataset_with(&["1"]), "missing"), None);
    }
}
