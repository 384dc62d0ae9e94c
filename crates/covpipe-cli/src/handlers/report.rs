//! html, relocate and summary handlers

use covpipe::{CoveragePipeline, CoverageSummary, ProcessRunner, RelocationReport};

use crate::commands::{HtmlArgs, RelocateArgs, SummaryArgs};
use crate::error::CliResult;
use crate::output::ProgressReporter;

/// Execute the html command
pub fn execute_html<R: ProcessRunner>(
    pipeline: &CoveragePipeline<R>,
    args: &HtmlArgs,
    no_source: bool,
    reporter: &ProgressReporter,
) -> CliResult<()> {
    match pipeline.generate_html(args.input.as_deref(), args.output.as_deref(), no_source)? {
        Some(dir) => {
            reporter.success(&format!("HTML report in {}", dir.display()));
            println!("{}", dir.display());
        }
        None if pipeline.session().report_tool().is_none() => {
            reporter.warning("genhtml not found; no HTML report generated");
        }
        None => reporter.warning("No trace to render"),
    }
    Ok(())
}

/// Execute the relocate command
pub fn execute_relocate<R: ProcessRunner>(
    pipeline: &CoveragePipeline<R>,
    args: &RelocateArgs,
    reporter: &ProgressReporter,
) -> CliResult<Option<RelocationReport>> {
    let report = pipeline.relocate(args.dir.as_deref(), None)?;
    match report {
        Some(ref r) => {
            reporter.success(&format!(
                "Rewrote {} links in {} pages for {}",
                r.links_rewritten, r.html_files, r.base_url
            ));
            println!("{}", r.destination.display());
        }
        None if pipeline.session().base_url().is_none() => {
            reporter.warning("No base URL configured; pass --base-url or set COVPIPE_BASE_URL");
        }
        None => reporter.warning("No HTML report to relocate"),
    }
    Ok(report)
}

/// Execute the summary command
pub fn execute_summary<R: ProcessRunner>(
    pipeline: &CoveragePipeline<R>,
    args: &SummaryArgs,
    reporter: &ProgressReporter,
) -> CliResult<()> {
    let text = pipeline.summarize(args.input.as_deref())?;
    if args.json {
        let summary = CoverageSummary::parse(&text);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    if text.is_empty() {
        reporter.warning("No trace to summarize");
    } else {
        print!("{text}");
    }
    Ok(())
}
