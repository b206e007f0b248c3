// Primitives for reading workbooks (Excel and OpenDocument).

use calamine::{open_workbook_auto, DataType, Range, Reader};

use crate::report::io_common::push_row;
use crate::report::*;

use survey_summary::builder::DatasetBuilder;

pub fn read_excel_dataset(path: &str, worksheet: &Option<String>) -> ReportResult<Dataset> {
    let wrange = get_range(path, worksheet)?;

    let mut rows = wrange.rows();
    let header: Vec<String> = rows
        .next()
        .context(MissingHeaderSnafu { path })?
        .iter()
        .map(|c| read_cell(c).to_string())
        .collect();
    debug!("read_excel_dataset: header: {:?}", header);
    let mut builder = DatasetBuilder::new(&header).context(InvalidDatasetSnafu { path })?;

    for (idx, row) in rows.enumerate() {
        debug!("read_excel_dataset: idx: {:?} row: {:?}", idx, row);
        let values: Vec<CellValue> = row.iter().map(read_cell).collect();
        push_row(&mut builder, values, path)?;
    }
    Ok(builder.build())
}

fn get_range(path: &str, worksheet: &Option<String>) -> ReportResult<Range<DataType>> {
    debug!(
        "read_excel_dataset: path: {:?} worksheet: {:?}",
        path, worksheet
    );
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet {
        let wrange = workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    }
}

/// Converts a workbook cell. Dates are written as `YYYY-MM-DD` and error
/// cells (`#N/A`, `#DIV/0!`...) are empty.
fn read_cell(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(s) => CellValue::from_text(s),
        DataType::Float(f) => CellValue::Number(*f),
        DataType::Int(i) => CellValue::Number(*i as f64),
        DataType::Bool(b) => CellValue::Bool(*b),
        DataType::DateTime(_) => match cell.as_date() {
            Some(d) => CellValue::Text(d.format("%Y-%m-%d").to_string()),
            None => CellValue::Empty,
        },
        DataType::Error(e) => {
            debug!("read_cell: error cell {:?}", e);
            CellValue::Empty
        }
        DataType::Empty => CellValue::Empty,
        #[allow(unreachable_patterns)]
        _ => CellValue::from_text(&cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::io_common::load_dataset;
    use calamine::CellErrorType;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    fn xml_text(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    // Numbers are written as numeric cells, the rest as shared strings.
    // Blank rows are left out of the sheet.
    fn sheet_xml(rows: &[Vec<&str>], strings: &mut Vec<String>) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<worksheet xmlns=\"{}\"><sheetData>",
            MAIN_NS
        );
        for (r, row) in rows.iter().enumerate() {
            if row.iter().all(|v| v.is_empty()) {
                continue;
            }
            xml.push_str(&format!("<row r=\"{}\">", r + 1));
            for (c, v) in row.iter().enumerate() {
                if v.is_empty() {
                    continue;
                }
                let cell = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                if v.parse::<f64>().is_ok() {
                    xml.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", cell, v));
                } else {
                    strings.push(v.to_string());
                    xml.push_str(&format!(
                        "<c r=\"{}\" t=\"s\"><v>{}</v></c>",
                        cell,
                        strings.len() - 1
                    ));
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }

    fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<&str>>)]) {
        let mut strings: Vec<String> = Vec::new();
        let mut parts: Vec<(String, String)> = Vec::new();
        let mut sheet_list = String::new();
        let mut rels = String::new();
        let mut overrides = String::new();
        for (i, (name, rows)) in sheets.iter().enumerate() {
            let id = i + 1;
            parts.push((
                format!("xl/worksheets/sheet{}.xml", id),
                sheet_xml(rows, &mut strings),
            ));
            sheet_list.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
                xml_text(name),
                id,
                id
            ));
            rels.push_str(&format!(
                "<Relationship Id=\"rId{}\" Type=\"{}/worksheet\" Target=\"worksheets/sheet{}.xml\"/>",
                id, REL_NS, id
            ));
            overrides.push_str(&format!(
                "<Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
                id
            ));
        }
        let shared: String = strings
            .iter()
            .map(|s| format!("<si><t>{}</t></si>", xml_text(s)))
            .collect();

        parts.push((
            "[Content_Types].xml".to_string(),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
                 <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
                 <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
                 <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
                 <Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>\
                 {}</Types>",
                overrides
            ),
        ));
        parts.push((
            "_rels/.rels".to_string(),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
                 <Relationship Id=\"rId1\" Type=\"{}/officeDocument\" Target=\"xl/workbook.xml\"/></Relationships>",
                REL_NS
            ),
        ));
        parts.push((
            "xl/workbook.xml".to_string(),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<workbook xmlns=\"{}\" xmlns:r=\"{}\"><sheets>{}</sheets></workbook>",
                MAIN_NS, REL_NS, sheet_list
            ),
        ));
        parts.push((
            "xl/_rels/workbook.xml.rels".to_string(),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{}\
                 <Relationship Id=\"rId{}\" Type=\"{}/sharedStrings\" Target=\"sharedStrings.xml\"/></Relationships>",
                rels,
                sheets.len() + 1,
                REL_NS
            ),
        ));
        parts.push((
            "xl/sharedStrings.xml".to_string(),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<sst xmlns=\"{}\" count=\"{}\" uniqueCount=\"{}\">{}</sst>",
                MAIN_NS,
                strings.len(),
                strings.len(),
                shared
            ),
        ));

        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, contents) in parts.iter() {
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn survey_workbook(dir: &tempfile::TempDir) -> String {
        let p = dir.path().join("survey.xlsx");
        write_workbook(
            &p,
            &[
                ("Notes", vec![vec!["Exported from the survey form"]]),
                (
                    "Responses",
                    vec![
                        vec!["Committee, Group, or Task Force", "Chair hours", "Chair"],
                        vec!["R&D", "2.504", "Ana"],
                        vec![],
                        vec!["Safety", "4"],
                    ],
                ),
            ],
        );
        p.display().to_string()
    }

    #[test]
    fn workbook_by_worksheet_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = survey_workbook(&dir);
        let ds = load_dataset(&path, &Some("Responses".to_string())).unwrap();
        assert_eq!(
            ds.columns(),
            &["Committee, Group, or Task Force", "Chair hours", "Chair"]
        );
        // The blank row is skipped and the short one padded.
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].get(0).as_text(), Some("R&D".to_string()));
        assert_eq!(ds.records()[0].get(1).as_text(), Some("2.504".to_string()));
        assert_eq!(ds.records()[1].get(1).as_number(), Some(4.0));
        assert!(ds.records()[1].get(2).is_missing());
    }

    #[test]
    fn workbook_first_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = survey_workbook(&dir);
        let ds = load_dataset(&path, &None).unwrap();
        assert_eq!(ds.columns(), &["Exported from the survey form"]);
        assert!(ds.is_empty());
    }

    #[test]
    fn workbook_missing_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = survey_workbook(&dir);
        let err = load_dataset(&path, &Some("Budget".to_string())).unwrap_err();
        assert!(matches!(err, ReportError::MissingWorksheet { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn cells() {
        assert_eq!(
            read_cell(&DataType::String("  Safety ".to_string())),
            CellValue::Text("Safety".to_string())
        );
        assert_eq!(read_cell(&DataType::String("".to_string())), CellValue::Empty);
        assert_eq!(read_cell(&DataType::Int(4)), CellValue::Number(4.0));
        assert_eq!(read_cell(&DataType::Float(3.5)), CellValue::Number(3.5));
        assert_eq!(read_cell(&DataType::Bool(true)), CellValue::Bool(true));
        assert_eq!(read_cell(&DataType::Error(CellErrorType::NA)), CellValue::Empty);
        assert_eq!(read_cell(&DataType::Empty), CellValue::Empty);
        // 45413 is 2024-05-01 in the 1900 date system.
        assert_eq!(
            read_cell(&DataType::DateTime(45413.0)),
            CellValue::Text("2024-05-01".to_string())
        );
    }

    #[test]
    fn unreadable_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("survey.xlsx");
        fs::write(&p, b"this is not a zip archive").unwrap();
        let err = read_excel_dataset(&p.display().to_string(), &None).unwrap_err();
        assert!(matches!(err, ReportError::OpeningExcel { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
