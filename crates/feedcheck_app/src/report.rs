use std::io::{self, Write};

use feedcheck_core::{Status, ValidationResult};
use feedcheck_engine::{DispatchReport, ResultSink};

/// Writes each result line to stdout under one lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl ResultSink for StdoutSink {
    fn emit(&self, result: &ValidationResult) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", result.report_line());
    }
}

/// Failure listing followed by the summary block.
pub fn write_report<W: Write>(out: &mut W, report: &DispatchReport) -> io::Result<()> {
    let mut failures: Vec<&ValidationResult> = report
        .results
        .iter()
        .filter(|result| result.status() != Status::Valid)
        .collect();
    failures.sort_by(|a, b| (a.status(), a.url()).cmp(&(b.status(), b.url())));

    for result in failures {
        let label = match result.status() {
            Status::Invalid => "Invalid",
            _ => "Transient",
        };
        writeln!(out, "[{label}] {} ({})", result.url(), result.message())?;
    }
    for url in &report.skipped {
        writeln!(out, "[Skipped] {url} (not admitted)")?;
    }

    let summary = &report.summary;
    writeln!(out)?;
    writeln!(out, "Results Summary:")?;
    writeln!(
        out,
        "{} Valid: {} (with {} warnings)",
        Status::Valid.symbol(),
        summary.valid,
        summary.warnings
    )?;
    writeln!(out, "{} Invalid: {}", Status::Invalid.symbol(), summary.invalid)?;
    writeln!(
        out,
        "{} Transient Errors: {}",
        Status::Transient.symbol(),
        summary.transient
    )?;
    writeln!(out, "Total: {} feeds checked", summary.total)?;
    Ok(())
}
