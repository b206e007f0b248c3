use crate::report::*;

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Turns a LaTeX source into a PDF.
pub trait DocumentCompiler {
    /// Compiles the source file and returns the path of the PDF.
    fn compile(&self, source: &Path) -> ReportResult<PathBuf>;
}

/// Runs an external `pdflatex`-compatible program.
///
/// The program is called as
/// `<program> <leading args> -interaction=nonstopmode -halt-on-error <file>`
/// from the directory of the source, once per pass.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LatexCompiler {
    pub program: String,
    pub leading_args: Vec<String>,
    pub passes: u32,
    pub timeout: Duration,
}

impl LatexCompiler {
    pub fn new(program: &str) -> LatexCompiler {
        LatexCompiler {
            program: program.to_string(),
            leading_args: Vec::new(),
            passes: 1,
            timeout: Duration::from_secs(120),
        }
    }

    fn run_once(&self, dir: &Path, file_name: &str, display_path: &str) -> ReportResult<()> {
        let program = self.program.as_str();
        let spawned = Command::new(program)
            .args(&self.leading_args)
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(file_name)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ToolMissingSnafu { program }.fail();
            }
            Err(e) => return Err(e).context(CompilerSpawnSnafu { program }),
        };

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let start = Instant::now();
        let status = loop {
            match child.try_wait().context(CompilerSpawnSnafu { program })? {
                Some(status) => break status,
                None if start.elapsed() >= self.timeout => {
                    warn!("{} is still running after {:?}, stopping it", program, self.timeout);
                    let _ = child.kill();
                    let _ = child.wait();
                    // The pipe readers are left behind: a grandchild may still hold the pipes.
                    return CompileTimeoutSnafu {
                        program,
                        path: display_path,
                        timeout: self.timeout,
                    }
                    .fail();
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        let out = collect(stdout);
        let err = collect(stderr);
        debug!("run_once: {} exited with {}", program, status);
        if !status.success() {
            return CompilationFailedSnafu {
                program,
                path: display_path,
                status: status.to_string(),
                diagnostics: format!("{}{}", out, err),
            }
            .fail();
        }
        Ok(())
    }
}

impl DocumentCompiler for LatexCompiler {
    fn compile(&self, source: &Path) -> ReportResult<PathBuf> {
        let display_path = source.display().to_string();
        let dir = match source.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        let file_name = match source.file_name().and_then(|f| f.to_str()) {
            Some(f) => f,
            None => whatever!("Not a file name: {}", display_path),
        };
        for pass in 1..=self.passes.max(1) {
            info!("Converting {} to PDF (pass {})", display_path, pass);
            self.run_once(dir, file_name, &display_path)?;
        }
        let pdf = source.with_extension("pdf");
        ensure!(
            pdf.is_file(),
            MissingPdfSnafu {
                program: self.program.as_str(),
                path: pdf.display().to_string()
            }
        );
        info!("PDF report generated: {}", pdf.display());
        Ok(pdf)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut p| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = p.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
