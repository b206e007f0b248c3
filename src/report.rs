use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_summary::goals::index_goals;
use survey_summary::latex::TemplateVars;
use survey_summary::render::{render_committee, render_overall};
use survey_summary::*;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use text_diff::print_diff;

pub mod compiler;
pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

use crate::report::compiler::DocumentCompiler;
use crate::report::config_reader::*;
use crate::report::io_common::*;

#[derive(Debug, Snafu)]
pub enum ReportError {
    #[snafu(display("Input file {path} not found"))]
    InputNotFound { path: String },
    #[snafu(display(
        "Unsupported input format {extension:?} for {path} (expected csv, xlsx, xlsm, xls, xlsb or ods)"
    ))]
    UnsupportedFormat { path: String, extension: String },
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("Workbook {path} has no worksheet named {name:?}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("No header row in {path}"))]
    MissingHeader { path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Malformed CSV file {path} at line {lineno}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: u64,
    },
    #[snafu(display("Invalid data in {path}"))]
    InvalidDataset {
        source: DatasetError,
        path: String,
    },
    #[snafu(display("No record found in {path}"))]
    EmptyInput { path: String },
    #[snafu(display("No record of {path} has a committee name"))]
    NoCommittee { path: String },
    #[snafu(display("The input does not have the expected columns"))]
    MissingColumn { source: SummaryError },
    #[snafu(display("Could not render {name}"))]
    Rendering { source: RenderError, name: String },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading configuration {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("LaTeX compiler {program:?} not found"))]
    ToolMissing { program: String },
    #[snafu(display("Could not run {program:?}"))]
    CompilerSpawn {
        source: std::io::Error,
        program: String,
    },
    #[snafu(display("{program} failed on {path} ({status}):\n{diagnostics}"))]
    CompilationFailed {
        program: String,
        path: String,
        status: String,
        diagnostics: String,
    },
    #[snafu(display("{program} did not finish on {path} within {timeout:?}"))]
    CompileTimeout {
        program: String,
        path: String,
        timeout: Duration,
    },
    #[snafu(display("{program} did not produce {path}"))]
    MissingPdf { program: String, path: String },
    #[snafu(display("Error reading reference {path}"))]
    ReadingReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{path} differs from the reference {reference}"))]
    ReferenceMismatch { path: String, reference: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

impl ReportError {
    /// The exit code of the program for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::InputNotFound { .. }
            | ReportError::UnsupportedFormat { .. }
            | ReportError::OpeningExcel { .. }
            | ReportError::MissingWorksheet { .. }
            | ReportError::EmptyExcel { .. }
            | ReportError::MissingHeader { .. }
            | ReportError::CsvOpen { .. }
            | ReportError::CsvLineParse { .. }
            | ReportError::InvalidDataset { .. }
            | ReportError::MissingColumn { .. } => 2,
            ReportError::EmptyInput { .. } | ReportError::NoCommittee { .. } => 3,
            ReportError::Rendering { .. } => 4,
            ReportError::ToolMissing { .. }
            | ReportError::CompilerSpawn { .. }
            | ReportError::CompilationFailed { .. }
            | ReportError::CompileTimeout { .. }
            | ReportError::MissingPdf { .. } => 5,
            _ => 1,
        }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;

/// What to read and where to write, for one run.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ReportOptions {
    pub input: String,
    pub config: Option<String>,
    pub excel_worksheet_name: Option<String>,
    /// Replaces the current date in the reports.
    pub date: Option<String>,
    pub output_dir: String,
    /// Overall report only: the path of the LaTeX source.
    pub out: Option<String>,
    /// A reference file (overall) or directory (committee).
    pub reference: Option<String>,
}

/// Writes the overall report and compiles it if a compiler is given.
///
/// Returns the paths of the written files.
pub fn run_overall(
    opts: &ReportOptions,
    compiler: Option<&dyn DocumentCompiler>,
) -> ReportResult<Vec<PathBuf>> {
    let settings = load_settings(&opts.config)?;
    let dataset = load_input(opts)?;

    let committee_col = dataset
        .require_column(&settings.group_column)
        .context(MissingColumnSnafu {})?;
    let committees = distinct_values(&dataset, committee_col);
    let summaries =
        summarize(&dataset, &Grouping::None, &settings.stats).context(MissingColumnSnafu {})?;
    let summary = summaries.first().context(EmptyInputSnafu {
        path: opts.input.as_str(),
    })?;

    let overall = &settings.overall;
    let mut goals = Vec::new();
    for spec in overall.goal_sections.iter() {
        let gi = index_goals(
            &dataset,
            committee_col,
            settings.gate.count,
            spec,
            &overall.objective_columns,
        )
        .context(MissingColumnSnafu {})?;
        goals.push(gi);
    }

    let mut vars = base_vars("All committees", &opts.date);
    let year = settings
        .year_column
        .as_ref()
        .and_then(|p| dataset.find_column(p))
        .and_then(|c| first_value(&dataset, c))
        .unwrap_or_else(|| settings.default_year.clone());
    let period = settings
        .period_column
        .as_ref()
        .and_then(|p| dataset.find_column(p))
        .and_then(|c| first_value(&dataset, c))
        .unwrap_or_else(|| settings.default_period.clone());
    vars.set("year", &year).set("period", &period);

    let out_path = overall_output_path(&opts.input, &opts.out, &opts.output_dir)?;
    let tex = render_overall(
        summary,
        committees.len(),
        &goals,
        &overall.layout,
        &vars,
    )
    .context(RenderingSnafu {
        name: out_path.display().to_string(),
    })?;
    write_output(&out_path, &tex)?;
    info!("LaTeX report generated: {}", out_path.display());

    if let Some(reference) = &opts.reference {
        check_reference(&tex, &out_path, Path::new(reference))?;
    }

    let mut outputs = vec![out_path.clone()];
    if let Some(c) = compiler {
        outputs.push(c.compile(&out_path)?);
    }
    Ok(outputs)
}

/// Writes one report per committee, then compiles all of them if a compiler
/// is given.
///
/// Returns the paths of the written files.
pub fn run_committee(
    opts: &ReportOptions,
    compiler: Option<&dyn DocumentCompiler>,
) -> ReportResult<Vec<PathBuf>> {
    let settings = load_settings(&opts.config)?;
    let dataset = load_input(opts)?;

    let grouping = Grouping::ByColumn(settings.group_column.clone());
    let groups = group_records(&dataset, &grouping).context(MissingColumnSnafu {})?;
    let summaries =
        summarize_groups(&dataset, &groups, &settings.stats).context(MissingColumnSnafu {})?;
    ensure!(
        !groups.is_empty(),
        NoCommitteeSnafu {
            path: opts.input.as_str()
        }
    );

    let keys: Vec<String> = groups
        .iter()
        .map(|g| g.key.clone().unwrap_or_default())
        .collect();
    let file_names = committee_file_names(&keys, &settings.file_suffix);
    let year_col = settings
        .year_column
        .as_ref()
        .and_then(|p| dataset.find_column(p));
    let period_col = settings
        .period_column
        .as_ref()
        .and_then(|p| dataset.find_column(p));

    let out_dir = Path::new(&opts.output_dir);
    let mut written: Vec<PathBuf> = Vec::new();
    for ((group, summary), file_name) in groups.iter().zip(summaries.iter()).zip(file_names.iter())
    {
        let committee = group.key.as_deref().unwrap_or_default();
        let path = out_dir.join(file_name);
        let mut vars = base_vars(committee, &opts.date);
        vars.set("year", &group_value(group, year_col, &settings.default_year))
            .set(
                "period",
                &group_value(group, period_col, &settings.default_period),
            );
        let tex = render_committee(
            &dataset,
            group,
            summary,
            &settings.committee,
            &settings.gate,
            &vars,
        )
        .context(RenderingSnafu {
            name: path.display().to_string(),
        })?;
        write_output(&path, &tex)?;
        info!("Created report for {}: {}", committee, path.display());

        if let Some(reference_dir) = &opts.reference {
            check_reference(&tex, &path, &Path::new(reference_dir).join(file_name))?;
        }
        written.push(path);
    }
    info!(
        "Generated {} committee reports in {}",
        written.len(),
        out_dir.display()
    );

    let mut outputs = written.clone();
    if let Some(c) = compiler {
        for p in written.iter() {
            outputs.push(c.compile(p)?);
        }
    }
    Ok(outputs)
}

fn load_input(opts: &ReportOptions) -> ReportResult<Dataset> {
    let dataset = load_dataset(&opts.input, &opts.excel_worksheet_name)?;
    ensure!(
        !dataset.is_empty(),
        EmptyInputSnafu {
            path: opts.input.as_str()
        }
    );
    info!(
        "Loaded {} records with {} columns from {}",
        dataset.len(),
        dataset.columns().len(),
        opts.input
    );
    Ok(dataset)
}

// The placeholders shared by both reports, except year and period.
fn base_vars(group: &str, fixed_date: &Option<String>) -> TemplateVars {
    let (date, generated) = match fixed_date {
        Some(d) => (d.clone(), d.clone()),
        None => {
            let now = Local::now();
            (
                now.format("%B %d, %Y").to_string(),
                now.format("%Y-%m-%d").to_string(),
            )
        }
    };
    let mut vars = TemplateVars::new();
    vars.set("group", group)
        .set("date", &date)
        .set("generated", &generated);
    vars
}

fn group_value(group: &Group, column: Option<usize>, default: &str) -> String {
    column
        .and_then(|c| group.records.first().and_then(|r| r.get(c).as_text()))
        .unwrap_or_else(|| default.to_string())
}

fn write_output(path: &Path, contents: &str) -> ReportResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).context(WritingOutputSnafu {
            path: dir.display().to_string(),
        })?;
    }
    fs::write(path, contents).context(WritingOutputSnafu {
        path: path.display().to_string(),
    })
}

fn check_reference(rendered: &str, path: &Path, reference: &Path) -> ReportResult<()> {
    let expected = fs::read_to_string(reference).context(ReadingReferenceSnafu {
        path: reference.display().to_string(),
    })?;
    if expected != rendered {
        warn!("Found differences with the reference {}", reference.display());
        print_diff(expected.as_str(), rendered, "\n");
        return ReferenceMismatchSnafu {
            path: path.display().to_string(),
            reference: reference.display().to_string(),
        }
        .fail();
    }
    debug!("check_reference: {} matches", reference.display());
    Ok(())
}
