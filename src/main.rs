use clap::Parser;
use log::{info, warn, LevelFilter};
use snafu::ErrorCompat;
use std::error::Error;
use std::time::Duration;

mod args;
mod report;

use crate::args::{Args, CommonArgs, ReportCommand};
use crate::report::compiler::{DocumentCompiler, LatexCompiler};
use crate::report::config_reader::DEFAULT_CONFIG;
use crate::report::{run_committee, run_overall, ReportOptions, ReportResult};

fn compiler_for(common: &CommonArgs) -> Option<LatexCompiler> {
    if common.no_pdf {
        info!("Skipping the PDF conversion");
        return None;
    }
    let mut c = LatexCompiler::new(&common.latex);
    c.leading_args = common.latex_arg.clone();
    c.passes = common.latex_passes;
    c.timeout = Duration::from_secs(common.latex_timeout);
    Some(c)
}

fn options_for(input: &str, output_dir: &str, common: &CommonArgs) -> ReportOptions {
    ReportOptions {
        input: input.to_string(),
        config: common.config.clone(),
        excel_worksheet_name: common.excel_worksheet_name.clone(),
        date: common.date.clone(),
        output_dir: output_dir.to_string(),
        ..Default::default()
    }
}

fn run(args: &Args) -> ReportResult<()> {
    match &args.command {
        ReportCommand::Overall(a) => {
            let mut opts = options_for(&a.input, &a.output_dir, &a.common);
            opts.out = a.out.clone();
            opts.reference = a.reference.clone();
            let compiler = compiler_for(&a.common);
            let outputs = run_overall(
                &opts,
                compiler.as_ref().map(|c| c as &dyn DocumentCompiler),
            )?;
            for p in outputs.iter() {
                println!("{}", p.display());
            }
        }
        ReportCommand::Committee(a) => {
            let mut opts = options_for(&a.input, &a.output_dir, &a.common);
            opts.reference = a.reference.clone();
            let compiler = compiler_for(&a.common);
            let outputs = run_committee(
                &opts,
                compiler.as_ref().map(|c| c as &dyn DocumentCompiler),
            )?;
            for p in outputs.iter() {
                println!("{}", p.display());
            }
        }
        ReportCommand::DefaultConfig => {
            print!("{}", DEFAULT_CONFIG);
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    if let Err(e) = run(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        let mut source = e.source();
        while let Some(s) = source {
            eprintln!("  caused by: {}", s);
            source = s.source();
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(e.exit_code());
    }
}
