//! prepare, baseline, capture and reset handlers

use covpipe::{CoveragePipeline, PrepareReport, ProcessRunner};

use crate::commands::CaptureArgs;
use crate::error::CliResult;
use crate::output::ProgressReporter;

/// One-line description of a preparation walk
#[must_use]
pub fn describe_prepare(report: &PrepareReport) -> String {
    format!(
        "{} note files, {} counter files created, {} permissions fixed, {} failures",
        report.notes_seen, report.counters_created, report.permissions_fixed, report.failures
    )
}

/// Execute the prepare command
pub fn execute_prepare<R: ProcessRunner>(
    pipeline: &CoveragePipeline<R>,
    reporter: &ProgressReporter,
) -> Option<PrepareReport> {
    let Some(report) = pipeline.prepare_data_files() else {
        reporter.warning("No coverage data directory configured; nothing to prepare");
        return None;
    };
    if report.is_clean() {
        reporter.success(&describe_prepare(&report));
    } else {
        reporter.warning(&describe_prepare(&report));
    }
    Some(report)
}

/// Execute the baseline command
pub fn execute_baseline<R: ProcessRunner>(
    pipeline: &mut CoveragePipeline<R>,
    args: &CaptureArgs,
    reporter: &ProgressReporter,
) -> CliResult<()> {
    let trace = pipeline.initialize_baseline(args.output.as_deref(), args.label.as_deref())?;
    report_trace(pipeline, trace.as_deref(), "Baseline", reporter);
    Ok(())
}

/// Execute the capture command
pub fn execute_capture<R: ProcessRunner>(
    pipeline: &mut CoveragePipeline<R>,
    args: &CaptureArgs,
    reporter: &ProgressReporter,
) -> CliResult<()> {
    let trace = pipeline.capture_incremental(args.output.as_deref(), args.label.as_deref())?;
    report_trace(pipeline, trace.as_deref(), "Capture", reporter);
    Ok(())
}

/// Execute the reset command
pub fn execute_reset<R: ProcessRunner>(
    pipeline: &CoveragePipeline<R>,
    reporter: &ProgressReporter,
) -> CliResult<()> {
    if pipeline.reset()? {
        reporter.success("Coverage counters reset");
        reporter.info("Restart running instrumented processes to start counting from zero");
    } else {
        reporter.warning("No coverage data directory configured; nothing to reset");
    }
    Ok(())
}

fn report_trace<R: ProcessRunner>(
    pipeline: &CoveragePipeline<R>,
    trace: Option<&std::path::Path>,
    step: &str,
    reporter: &ProgressReporter,
) {
    match trace {
        Some(trace) => {
            reporter.success(&format!("{step} written to {}", trace.display()));
            println!("{}", trace.display());
        }
        None if pipeline.session().data_dir().is_none() => {
            reporter.warning("No coverage data directory configured; nothing captured");
        }
        None => reporter.failure(&format!("{step} produced no trace; see the log above")),
    }
}
