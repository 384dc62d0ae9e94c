//! Merge command handler

use covpipe::{CoveragePipeline, ProcessRunner, BASELINE_TRACE, TESTS_TRACE};

use crate::commands::MergeArgs;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// Register the traces to merge.
///
/// Explicit `-a` traces must exist. Without any, the baseline and tests
/// traces of the output directory are used when present.
pub fn register_traces<R: ProcessRunner>(
    pipeline: &mut CoveragePipeline<R>,
    args: &MergeArgs,
) -> CliResult<usize> {
    if args.traces.is_empty() {
        for name in [BASELINE_TRACE, TESTS_TRACE] {
            let trace = pipeline.session().output_path(name);
            if trace.is_file() {
                pipeline.add_trace(trace);
            }
        }
    } else {
        for trace in &args.traces {
            if !trace.is_file() {
                return Err(CliError::invalid_argument(format!(
                    "trace {} does not exist",
                    trace.display()
                )));
            }
            pipeline.add_trace(trace);
        }
    }
    Ok(pipeline.traces().len())
}

/// Execute the merge command
pub fn execute_merge<R: ProcessRunner>(
    pipeline: &mut CoveragePipeline<R>,
    args: &MergeArgs,
    reporter: &ProgressReporter,
) -> CliResult<()> {
    register_traces(pipeline, args)?;
    match pipeline.merge(args.output.as_deref(), args.label.as_deref(), args.exclude.as_slice())? {
        Some(total) => {
            reporter.success(&format!(
                "Merged {} traces into {}",
                pipeline.traces().len(),
                total.display()
            ));
            println!("{}", total.display());
        }
        None if pipeline.session().data_dir().is_none() => {
            reporter.warning("No coverage data directory configured; nothing merged");
        }
        None => reporter.warning("No traces to merge"),
    }
    Ok(())
}
