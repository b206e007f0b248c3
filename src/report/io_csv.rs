// Primitives for reading CSV files.

use crate::report::io_common::push_row;
use crate::report::*;

use survey_summary::builder::DatasetBuilder;

/// Reads a CSV file (UTF-8, comma separated, header on the first line).
///
/// All the lines must have the same number of fields as the header.
pub fn read_csv_dataset(path: &str) -> ReportResult<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1u64 })?
        .iter()
        .map(|s| s.trim_start_matches('\u{feff}').to_string())
        .collect();
    debug!("read_csv_dataset: header: {:?}", header);
    ensure!(!header.is_empty(), MissingHeaderSnafu { path });
    let mut builder = DatasetBuilder::new(&header).context(InvalidDatasetSnafu { path })?;

    for (idx, line_r) in rdr.records().enumerate() {
        let line = match line_r {
            Ok(l) => l,
            Err(e) => {
                let lineno = e
                    .position()
                    .map(|p| p.line())
                    .unwrap_or((idx + 2) as u64);
                return Err(e).context(CsvLineParseSnafu { path, lineno });
            }
        };
        debug!("read_csv_dataset: idx: {:?} row: {:?}", idx, line);
        let values: Vec<CellValue> = line.iter().map(CellValue::from_text).collect();
        push_row(&mut builder, values, path)?;
    }
    Ok(builder.build())
}
