pub use crate::config::*;

use log::debug;
use std::collections::HashSet;

/// A builder for assembling a dataset, one record at a time.
///
/// This is what the spreadsheet readers use: the header is normalized once,
/// then every row is checked against it.
///
/// ```
/// use survey_summary::builder::DatasetBuilder;
/// use survey_summary::{CellValue, DatasetError};
///
/// let mut builder = DatasetBuilder::new(&["Committee".to_string(), "Score".to_string()])?;
/// builder.add_record(vec![CellValue::from_text("Safety"), CellValue::Number(4.0)])?;
/// // Short rows are padded.
/// builder.add_record(vec![CellValue::from_text("Outreach")])?;
///
/// let dataset = builder.build();
/// assert_eq!(dataset.len(), 2);
/// # Ok::<(), DatasetError>(())
/// ```
pub struct Builder {
    pub(crate) _columns: Vec<String>,
    pub(crate) _records: Vec<Record>,
}

pub type DatasetBuilder = Builder;

impl Builder {
    pub fn new(header: &[String]) -> Result<Builder, DatasetError> {
        if header.is_empty() {
            return Err(DatasetError::NoColumns);
        }
        Ok(Builder {
            _columns: normalize_columns(header),
            _records: Vec::new(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self._columns
    }

    /// Adds a record. Missing trailing values are filled with `Empty`.
    pub fn add_record(&mut self, mut values: Vec<CellValue>) -> Result<(), DatasetError> {
        let expected = self._columns.len();
        if values.len() > expected {
            // Trailing blank cells beyond the header are harmless.
            while values.len() > expected && values.last() == Some(&CellValue::Empty) {
                values.pop();
            }
            if values.len() > expected {
                return Err(DatasetError::RecordTooWide {
                    row: self._records.len() + 1,
                    expected,
                    found: values.len(),
                });
            }
        }
        values.resize(expected, CellValue::Empty);
        self._records.push(Record { values });
        Ok(())
    }

    pub fn build(self) -> Dataset {
        debug!(
            "build: {} columns, {} records",
            self._columns.len(),
            self._records.len()
        );
        Dataset {
            columns: self._columns,
            records: self._records,
        }
    }
}

/// Blank names become `Unnamed: <index>` and repeated names get a `.1`, `.2`...
/// suffix, in order of appearance.
fn normalize_columns(header: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut res: Vec<String> = Vec::with_capacity(header.len());
    for (idx, raw) in header.iter().enumerate() {
        let base = match raw.trim() {
            "" => format!("Unnamed: {}", idx),
            s => s.to_string(),
        };
        let mut name = base.clone();
        let mut dup = 0;
        while seen.contains(&name) {
            dup += 1;
            name = format!("{}.{}", base, dup);
        }
        seen.insert(name.clone());
        res.push(name);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn header_normalization() {
        let b = Builder::new(&header(&["A", "", "A", " B ", "A"])).unwrap();
        assert_eq!(b.columns(), &["A", "Unnamed: 1", "A.1", "B", "A.2"]);
    }

    #[test]
    fn empty_header_rejected() {
        assert_eq!(Builder::new(&[]).err(), Some(DatasetError::NoColumns));
    }

    #[test]
    fn rows_padded_and_checked() {
        let mut b = Builder::new(&header(&["A", "B"])).unwrap();
        b.add_record(vec![CellValue::from_text("x")]).unwrap();
        b.add_record(vec![
            CellValue::from_text("y"),
            CellValue::Number(1.0),
            CellValue::Empty,
        ])
        .unwrap();
        let err = b
            .add_record(vec![
                CellValue::from_text("z"),
                CellValue::Number(1.0),
                CellValue::Number(2.0),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            DatasetError::RecordTooWide {
                row: 3,
                expected: 2,
                found: 3
            }
        );
        let ds = b.build();
        assert_eq!(ds.len(), 2);
        assert!(ds.records().iter().all(|r| r.values.len() == 2));
        assert_eq!(ds.records()[0].get(1), &CellValue::Empty);
    }
}
