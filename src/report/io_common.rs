use crate::report::io_csv::read_csv_dataset;
use crate::report::io_excel::read_excel_dataset;
use crate::report::*;

use std::collections::HashSet;
use survey_summary::builder::DatasetBuilder;

/// Reads a spreadsheet, choosing the reader from the file extension.
pub fn load_dataset(path: &str, worksheet: &Option<String>) -> ReportResult<Dataset> {
    let p = Path::new(path);
    ensure!(p.is_file(), InputNotFoundSnafu { path });
    let extension = p
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    debug!("load_dataset: path: {:?} extension: {:?}", path, extension);
    match extension.as_str() {
        "csv" => read_csv_dataset(path),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_excel_dataset(path, worksheet),
        _ => UnsupportedFormatSnafu { path, extension }.fail(),
    }
}

/// Adds a row to the dataset under construction. Rows without any value are
/// dropped.
pub fn push_row(
    builder: &mut DatasetBuilder,
    values: Vec<CellValue>,
    path: &str,
) -> ReportResult<()> {
    if values.iter().all(|v| *v == CellValue::Empty) {
        debug!("push_row: {}: skipping empty row", path);
        return Ok(());
    }
    builder
        .add_record(values)
        .context(InvalidDatasetSnafu { path })
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string())
}

/// Where the overall report goes when `--out` is not given:
/// `<output_dir>/<input name>.tex`.
pub fn overall_output_path(
    input: &str,
    out: &Option<String>,
    output_dir: &str,
) -> ReportResult<PathBuf> {
    if let Some(o) = out {
        if !o.ends_with(".tex") {
            whatever!("The output file {} should have the .tex extension", o);
        }
        return Ok(PathBuf::from(o));
    }
    Ok(Path::new(output_dir).join(format!("{}.tex", simplify_file_name(input))))
}

/// Replaces every character that is not a letter or a digit by `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// The file names of the committee reports, in the same order.
///
/// Names that would be the same after sanitizing (ignoring case) get a
/// `_2`, `_3`... suffix.
pub fn committee_file_names(committees: &[String], suffix: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut res = Vec::with_capacity(committees.len());
    for c in committees.iter() {
        let base = sanitize_name(c);
        let mut name = base.clone();
        let mut dup = 1;
        while seen.contains(&name.to_lowercase()) {
            dup += 1;
            name = format!("{}_{}", base, dup);
        }
        seen.insert(name.to_lowercase());
        if name != base {
            warn!(
                "Committee {:?}: file name already used, writing {}{}.tex",
                c, name, suffix
            );
        }
        res.push(format!("{}{}.tex", name, suffix));
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_names() {
        assert_eq!(sanitize_name("R&D Group, Task-Force #1"), "R_D_Group__Task_Force__1");
        assert_eq!(sanitize_name("Ergonomía"), "Ergonomía");
    }

    #[test]
    fn unique_file_names() {
        let names: Vec<String> = ["R&D", "R D", "r-d", "Safety"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            committee_file_names(&names, "_report"),
            vec![
                "R_D_report.tex",
                "R_D_2_report.tex",
                "r_d_3_report.tex",
                "Safety_report.tex"
            ]
        );
    }

    #[test]
    fn output_paths() {
        assert_eq!(
            overall_output_path("data/survey 2024.xlsx", &None, "out").unwrap(),
            Path::new("out").join("survey 2024.tex")
        );
        assert_eq!(
            overall_output_path("survey.csv", &Some("final.tex".to_string()), "out").unwrap(),
            PathBuf::from("final.tex")
        );
        assert!(overall_output_path("survey.csv", &Some("final.pdf".to_string()), ".").is_err());
    }

    #[test]
    fn empty_rows_are_skipped() {
        let mut b = DatasetBuilder::new(&["A".to_string(), "B".to_string()]).unwrap();
        push_row(&mut b, vec![CellValue::Empty, CellValue::Empty], "x.csv").unwrap();
        push_row(&mut b, vec![CellValue::from_text("a"), CellValue::Empty], "x.csv").unwrap();
        let err = push_row(
            &mut b,
            vec![
                CellValue::from_text("a"),
                CellValue::from_text("b"),
                CellValue::from_text("c"),
            ],
            "x.csv",
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::InvalidDataset { .. }));
        assert_eq!(b.build().len(), 1);
    }
}
