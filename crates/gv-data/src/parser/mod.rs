//! Delimited text parser
//!
//! One implementation covers both quoting strategies and both validation
//! modes; the async entry point runs the same parse on the blocking pool.

use async_trait::async_trait;
use csv::ReaderBuilder;
use tracing::debug;

use gv_core::dataset::{CellValue, Dataset, Record};
use gv_core::DatasetParser;

use crate::config::{ParseOptions, QuoteStrategy, RowValidation};
use crate::DataError;

/// Parser for delimited text with a header line
#[derive(Debug, Clone, Default)]
pub struct DelimitedParser {
    options: ParseOptions,
}

impl DelimitedParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Parser that rejects rows whose length differs from the header
    pub fn strict() -> Self {
        Self::new(ParseOptions::strict())
    }

    /// Parse on the blocking pool; nothing is returned until the whole input is consumed
    pub async fn parse_owned(&self, text: String, delimiter: String) -> Result<Dataset, DataError> {
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || parse_text(&text, &delimiter, &options)).await?
    }
}

#[async_trait]
impl DatasetParser for DelimitedParser {
    fn parse(&self, text: &str, delimiter: &str) -> anyhow::Result<Dataset> {
        Ok(parse_text(text, delimiter, &self.options)?)
    }

    async fn parse_async(&self, text: &str, delimiter: &str) -> anyhow::Result<Dataset> {
        Ok(self.parse_owned(text.to_string(), delimiter.to_string()).await?)
    }
}

/// Parse `text` into a dataset.
///
/// The input is trimmed, the first line is the header and every following
/// line is zipped positionally with it. The delimiter applies to every line.
pub fn parse_text(text: &str, delimiter: &str, options: &ParseOptions) -> Result<Dataset, DataError> {
    if delimiter.is_empty() {
        return Err(DataError::InvalidDelimiter(delimiter.to_string()));
    }

    let dataset = match options.quoting {
        QuoteStrategy::Strip => parse_stripped(text, delimiter, options)?,
        QuoteStrategy::Rfc4180 => parse_quoted(text, delimiter, options)?,
    };

    debug!(
        "Parsed {} rows x {} columns ({:?}, {:?})",
        dataset.len(),
        dataset.header.len(),
        options.quoting,
        options.validation
    );
    Ok(dataset)
}

fn parse_stripped(text: &str, delimiter: &str, options: &ParseOptions) -> Result<Dataset, DataError> {
    let cleaned = text.trim().replace('"', "");
    let mut lines = cleaned.lines();

    let header: Vec<String> = match lines.next() {
        Some(line) => line.split(delimiter).map(str::to_string).collect(),
        None => return Ok(Dataset::default()),
    };
    check_header(&header, options)?;

    let mut records = Vec::new();
    for (idx, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split(delimiter).collect();
        if options.validation == RowValidation::Strict && fields.len() != header.len() {
            return Err(DataError::RowLength {
                // Header is line 1
                line: idx as u64 + 2,
                expected: header.len(),
                found: fields.len(),
            });
        }
        records.push(build_record(&header, fields, options.coerce_numbers));
    }

    Ok(Dataset::new(header, records))
}

fn parse_quoted(text: &str, delimiter: &str, options: &ParseOptions) -> Result<Dataset, DataError> {
    let delimiter = match delimiter.as_bytes() {
        [byte] => *byte,
        _ => return Err(DataError::InvalidDelimiter(delimiter.to_string())),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Dataset::default());
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(options.validation == RowValidation::Lax)
        .from_reader(trimmed.as_bytes());

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    check_header(&header, options)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        records.push(build_record(&header, row.iter(), options.coerce_numbers));
    }

    Ok(Dataset::new(header, records))
}

/// Strict parsing rejects a header that names a column twice
fn check_header(header: &[String], options: &ParseOptions) -> Result<(), DataError> {
    if options.validation == RowValidation::Lax {
        return Ok(());
    }
    match header.iter().enumerate().find(|&(idx, name)| header[..idx].contains(name)) {
        Some((_, name)) => Err(DataError::DuplicateColumn(name.clone())),
        None => Ok(()),
    }
}

/// Zip fields with the header; surplus fields are dropped, missing ones leave keys absent
fn build_record<'a>(header: &[String], fields: impl IntoIterator<Item = &'a str>, coerce_numbers: bool) -> Record {
    header
        .iter()
        .zip(fields)
        .map(|(name, value)| (name.clone(), to_cell(value, coerce_numbers)))
        .collect()
}

fn to_cell(value: &str, coerce_numbers: bool) -> CellValue {
    if coerce_numbers {
        if let Ok(number) = value.trim().parse::<f64>() {
            return CellValue::Number(number);
        }
    }
    CellValue::Text(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lax(text: &str) -> Dataset {
        parse_text(text, ",", &ParseOptions::default()).unwrap()
    }

    fn keys(record: &Record) -> Vec<&str> {
        record.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_header_and_rows_in_order() {
        let dataset = lax("lat,lon,name\n1,2,a\n3,4,b\n5,6,c\n");
        assert_eq!(dataset.header, vec!["lat", "lon", "name"]);
        assert_eq!(dataset.len(), 3);
        for record in &dataset.records {
            assert_eq!(keys(record), vec!["lat", "lon", "name"]);
        }
        assert_eq!(dataset.records[2]["name"], CellValue::from("c"));
    }

    #[test]
    fn test_lax_row_lengths() {
        let dataset = lax("a,b,c\n1,2\n1,2,3,4");
        assert_eq!(keys(&dataset.records[0]), vec!["a", "b"]);
        assert_eq!(keys(&dataset.records[1]), vec!["a", "b", "c"]);
        assert_eq!(dataset.records[1]["c"], CellValue::from("3"));
    }

    #[test]
    fn test_quotes_are_stripped() {
        let dataset = lax("\"name\",\"lat\"\n\"Paris, FR\",48.8");
        // The embedded delimiter still splits the quoted field
        assert_eq!(dataset.header, vec!["name", "lat"]);
        assert_eq!(dataset.records[0]["name"], CellValue::from("Paris"));
        assert_eq!(dataset.records[0]["lat"], CellValue::from(" FR"));
    }

    #[test]
    fn test_configured_delimiter_applies_to_rows() {
        let dataset = parse_text("lat;lon\n1;2\r\n3;4", ";", &ParseOptions::default()).unwrap();
        assert_eq!(dataset.header, vec!["lat", "lon"]);
        assert_eq!(dataset.records[1]["lon"], CellValue::from("4"));
    }

    #[test]
    fn test_empty_input() {
        let dataset = lax("   \n ");
        assert!(dataset.header.is_empty());
        assert!(dataset.is_empty());
        assert!(matches!(
            parse_text("a,b", "", &ParseOptions::default()),
            Err(DataError::InvalidDelimiter(_))
        ));
    }

    #[test]
    fn test_strict_rejects_short_rows() {
        let err = parse_text("a,b\n1,2\n3", ",", &ParseOptions::strict()).unwrap_err();
        assert!(matches!(err, DataError::RowLength { line: 3, expected: 2, found: 1 }));
    }

    #[test]
    fn test_rfc4180_keeps_embedded_delimiters() {
        let options = ParseOptions::default().with_quoting(QuoteStrategy::Rfc4180);
        let dataset = parse_text("name,lat\n\"Paris, FR\",48.8", ",", &options).unwrap();
        assert_eq!(dataset.records[0]["name"], CellValue::from("Paris, FR"));

        let strict = ParseOptions::strict().with_quoting(QuoteStrategy::Rfc4180);
        assert!(matches!(
            parse_text("a,b\n1,2,3", ",", &strict),
            Err(DataError::RowLength { expected: 2, found: 3, .. })
        ));
        assert!(matches!(
            parse_text("a,b", "::", &options),
            Err(DataError::InvalidDelimiter(_))
        ));
    }

    #[test]
    fn test_numeric_coercion() {
        let options = ParseOptions::default().with_numbers(true);
        let dataset = parse_text("lat,name\n1.5,x", ",", &options).unwrap();
        assert_eq!(dataset.records[0]["lat"], CellValue::Number(1.5));
        assert_eq!(dataset.records[0]["name"], CellValue::from("x"));
    }

    #[test]
    fn test_duplicate_header_names() {
        // Lax: one key per name, the later field wins
        let dataset = lax("a,a,b\n1,2,3");
        assert_eq!(dataset.header, vec!["a", "a", "b"]);
        assert_eq!(keys(&dataset.records[0]), vec!["a", "b"]);
        assert_eq!(dataset.records[0]["a"], CellValue::from("2"));

        let err = parse_text("a,a,b\n1,2,3", ",", &ParseOptions::strict()).unwrap_err();
        assert!(matches!(err, DataError::DuplicateColumn(name) if name == "a"));

        let strict_quoted = ParseOptions::strict().with_quoting(QuoteStrategy::Rfc4180);
        assert!(matches!(
            parse_text("x,y,x\n1,2,3", ",", &strict_quoted),
            Err(DataError::DuplicateColumn(_))
        ));
    }

    #[tokio::test]
    async fn test_async_parse() {
        let parser = DelimitedParser::strict();
        let dataset = parser.parse_async("lat,lon\n1,2", ",").await.unwrap();
        assert_eq!(dataset.len(), 1);

        assert!(parser.parse_async("lat,lon\n1,2\n3", ",").await.is_err());

        let lax = DelimitedParser::default();
        assert_eq!(lax.parse_async("lat,lon\n1,2\n3", ",").await.unwrap().len(), 2);
    }
}
