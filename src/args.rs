use clap::{Parser, Subcommand};

/// Generates LaTeX and PDF reports from committee survey spreadsheets.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: ReportCommand,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReportCommand {
    /// One report for the whole survey, organized by strategic goal.
    Overall(OverallArgs),
    /// One report per committee.
    Committee(CommitteeArgs),
    /// Prints the built-in configuration (JSON). It can be used as a starting point for --config.
    DefaultConfig,
}

#[derive(clap::Args, Debug, Clone)]
pub struct OverallArgs {
    /// (file path) The survey data (csv, xlsx, xlsm, xls, xlsb or ods).
    #[clap(value_parser)]
    pub input: String,

    /// (file path) Where to write the LaTeX source. Defaults to <output-dir>/<input name>.tex
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (directory, default .) The directory of the generated files.
    #[clap(long, value_parser, default_value = ".")]
    pub output_dir: String,

    /// (file path) A reference LaTeX file. If provided, the generated source must be identical to it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    #[clap(flatten)]
    pub common: CommonArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CommitteeArgs {
    /// (file path) The survey data (csv, xlsx, xlsm, xls, xlsb or ods).
    #[clap(value_parser)]
    pub input: String,

    /// (directory) The directory of the generated files.
    #[clap(short, long, value_parser, default_value = "committee_reports")]
    pub output_dir: String,

    /// (directory) A directory of reference LaTeX files, with the same names as the generated ones.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    #[clap(flatten)]
    pub common: CommonArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    /// (file path, optional) The configuration in JSON format: columns, statistics and layout of the reports.
    /// See the output of the default-config command for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// When using a workbook, indicates the name of the worksheet to use. By default, the first one is read.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (text) The date written in the reports instead of the current date.
    #[clap(long, value_parser)]
    pub date: Option<String>,

    /// Only write the LaTeX sources.
    #[clap(long, takes_value = false)]
    pub no_pdf: bool,

    /// (program, default pdflatex) The LaTeX compiler.
    #[clap(long, value_parser, default_value = "pdflatex")]
    pub latex: String,

    /// Extra argument for the LaTeX compiler, placed before the standard ones. Can be repeated.
    #[clap(long, value_parser, allow_hyphen_values = true)]
    pub latex_arg: Vec<String>,

    /// (default 1) How many times the compiler runs on each document.
    #[clap(long, value_parser, default_value_t = 1)]
    pub latex_passes: u32,

    /// (seconds, default 120) The time after which the compiler is stopped.
    #[clap(long, value_parser, default_value_t = 120)]
    pub latex_timeout: u64,
}
