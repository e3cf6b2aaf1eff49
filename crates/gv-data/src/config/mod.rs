//! Parse configuration

use serde::{Serialize, Deserialize};

/// How double quotes in the input are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStrategy {
    /// Remove every `"` before splitting.
    ///
    /// A delimiter inside a quoted field is still treated as a separator,
    /// so such fields are split apart.
    #[default]
    Strip,
    /// RFC 4180 quoting: quoted fields may contain the delimiter
    Rfc4180,
}

/// What happens to rows whose field count differs from the header, and to
/// headers that repeat a column name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowValidation {
    /// Short rows lose their trailing keys, extra fields are dropped.
    ///
    /// A repeated header name keeps both entries in the header, but each
    /// record holds a single key for it carrying the later field's value.
    #[default]
    Lax,
    /// Any row length mismatch or repeated header name aborts the whole parse
    Strict,
}

/// Parser options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub quoting: QuoteStrategy,
    pub validation: RowValidation,
    /// Store cells that parse as floats as numbers
    pub coerce_numbers: bool,
}

impl ParseOptions {
    /// Options for the validating streaming path
    pub fn strict() -> Self {
        Self {
            validation: RowValidation::Strict,
            ..Self::default()
        }
    }

    pub fn with_quoting(mut self, quoting: QuoteStrategy) -> Self {
        self.quoting = quoting;
        self
    }

    pub fn with_numbers(mut self, coerce: bool) -> Self {
        self.coerce_numbers = coerce;
        self
    }
}
