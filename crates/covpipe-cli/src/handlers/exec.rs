//! Exec command handler: one full coverage session around a command

use std::process::{Command, ExitStatus};

use covpipe::{CovResult, CoveragePipeline, CoverageSummary, ProcessRunner};

use crate::commands::ExecArgs;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// Post-processing steps after the wrapped command
const STEPS: u64 = 5;

/// Exit code to report for a finished child
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Run `command` with inherited stdio and wait for it
pub fn run_wrapped(command: &[String]) -> CliResult<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| CliError::invalid_argument("exec needs a command after `--`"))?;
    tracing::info!(command = %command.join(" "), "running wrapped command");
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| CliError::Exec {
            command: program.clone(),
            source,
        })?;
    Ok(exit_code(status))
}

/// Report a failed coverage step and carry on
fn logged<T>(reporter: &ProgressReporter, step: &str, result: CovResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(step, error = %e, "coverage step failed");
            reporter.failure(&format!("{step} failed: {e}"));
            None
        }
    }
}

/// Execute the exec command.
///
/// Returns the wrapped command's exit code. Coverage steps never change it:
/// a failing step is reported and the remaining steps still run. Only a
/// command that cannot be started is an error.
pub fn execute_exec<R: ProcessRunner>(
    pipeline: &mut CoveragePipeline<R>,
    args: &ExecArgs,
    no_source: bool,
    reporter: &mut ProgressReporter,
) -> CliResult<i32> {
    let label = args.label.as_deref();
    if pipeline.session().data_dir().is_none() {
        reporter.warning("No coverage data directory configured; running without coverage");
    }

    let baseline = pipeline.initialize_baseline(None, label);
    if let Some(trace) = logged(reporter, "baseline", baseline).flatten() {
        reporter.info(&format!("Baseline written to {}", trace.display()));
    }

    let code = run_wrapped(&args.command)?;
    if code == 0 {
        reporter.success(&format!("{} exited with 0", args.command.join(" ")));
    } else {
        reporter.failure(&format!("{} exited with {code}", args.command.join(" ")));
    }

    reporter.start_progress(STEPS, "capturing");
    let captured = pipeline.capture_incremental(None, label);
    logged(reporter, "capture", captured);
    reporter.step("merging");
    let merged = pipeline.merge(None, label, args.exclude.as_slice());
    logged(reporter, "merge", merged);
    reporter.step("rendering HTML");
    let html = logged(reporter, "html", pipeline.generate_html(None, None, no_source)).flatten();
    reporter.step("relocating");
    let relocated = logged(reporter, "relocate", pipeline.relocate(None, None)).flatten();
    reporter.step("summarizing");
    let text = logged(reporter, "summary", pipeline.summarize(None)).unwrap_or_default();
    reporter.finish();

    if let Some(dir) = html {
        reporter.info(&format!("HTML report in {}", dir.display()));
    }
    if let Some(r) = relocated {
        reporter.info(&format!("Relocated report in {}", r.destination.display()));
    }
    let summary = CoverageSummary::parse(&text);
    if !summary.is_empty() {
        reporter.header("Coverage");
        println!("{}", reporter.format_summary(&summary));
    }
    Ok(code)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_is_error() {
        assert!(matches!(
            run_wrapped(&[]),
            Err(CliError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_missing_program_is_exec_error() {
        let err = run_wrapped(&["/nonexistent/covpipe-test-bin".to_string()]).unwrap_err();
        assert!(matches!(err, CliError::Exec { .. }));
    }

    #[cfg(unix)]
    mod unix_tests {
        use super::*;
        use covpipe::mock::RecordingRunner;
        use covpipe::{Session, SessionConfig};
        use std::fs;
        use std::path::PathBuf;
        use tempfile::TempDir;

        fn sh(script: &str) -> Vec<String> {
            vec!["sh".to_string(), "-c".to_string(), script.to_string()]
        }

        #[test]
        fn test_run_wrapped_exit_codes() {
            assert_eq!(run_wrapped(&sh("exit 0")).unwrap(), 0);
            assert_eq!(run_wrapped(&sh("exit 7")).unwrap(), 7);
        }

        #[test]
        fn test_signal_maps_above_128() {
            assert_eq!(run_wrapped(&sh("kill -TERM $$")).unwrap(), 128 + 15);
        }

        #[test]
        fn test_full_session_keeps_command_status() {
            let tmp = TempDir::new().unwrap();
            let data = tmp.path().join("build");
            fs::create_dir_all(&data).unwrap();
            fs::write(data.join("main.gcno"), b"n").unwrap();
            let config = SessionConfig::new()
                .with_data_dir(&data)
                .with_output_dir(tmp.path().join("cov"));
            let session = Session::resolve_with(&config, |n| Some(PathBuf::from(n))).unwrap();
            let mut pipeline = CoveragePipeline::new(session, RecordingRunner::new().materializing());
            let args = ExecArgs {
                label: Some("unit".to_string()),
                exclude: vec!["/usr/*".to_string()],
                command: sh("exit 3"),
            };

            let code = execute_exec(
                &mut pipeline,
                &args,
                false,
                &mut ProgressReporter::new(false, true),
            )
            .unwrap();

            assert_eq!(code, 3);
            let flags: Vec<String> = pipeline
                .runner()
                .argvs()
                .iter()
                .map(|argv| argv[1..].join(" "))
                .collect();
            assert!(flags[0].starts_with("-t unit -i -d"));
            assert!(flags[1].starts_with("-t unit -c -d"));
            assert!(flags[2].starts_with("-t unit -a"));
            assert!(flags[3].starts_with("-t unit -r"));
            let html = tmp.path().join("cov").join("html");
            assert!(flags[4].ends_with(&format!("-o {}", html.display())));
            assert!(flags[5].starts_with("--summary"));
            assert_eq!(flags.len(), 6);
        }

        fn session_in(tmp: &TempDir) -> Session {
            let data = tmp.path().join("build");
            fs::create_dir_all(&data).unwrap();
            fs::write(data.join("main.gcno"), b"n").unwrap();
            let config = SessionConfig::new()
                .with_data_dir(&data)
                .with_output_dir(tmp.path().join("cov"))
                .with_base_url("/reports/run1");
            Session::resolve_with(&config, |n| Some(PathBuf::from(n))).unwrap()
        }

        fn exec_args(script: &str) -> ExecArgs {
            ExecArgs {
                label: None,
                exclude: Vec::new(),
                command: sh(script),
            }
        }

        #[test]
        fn test_failed_report_step_keeps_status_and_continues() {
            let tmp = TempDir::new().unwrap();
            let runner = RecordingRunner::new()
                .materializing()
                .failing_to_spawn("genhtml");
            let mut pipeline = CoveragePipeline::new(session_in(&tmp), runner);

            let code = execute_exec(
                &mut pipeline,
                &exec_args("exit 3"),
                false,
                &mut ProgressReporter::new(false, true),
            )
            .unwrap();

            assert_eq!(code, 3);
            let argvs = pipeline.runner().argvs();
            assert_eq!(argvs.len(), 5);
            assert_eq!(argvs[3][0], "genhtml");
            assert_eq!(argvs[4][1], "--summary");
            assert!(tmp.path().join("cov").join("total.info").is_file());
            assert!(!tmp.path().join("cov").join("html_baseurl").exists());
        }

        #[test]
        fn test_failed_baseline_still_runs_command() {
            let tmp = TempDir::new().unwrap();
            let marker = tmp.path().join("ran");
            let runner = RecordingRunner::new().failing_to_spawn("lcov");
            let mut pipeline = CoveragePipeline::new(session_in(&tmp), runner);

            let code = execute_exec(
                &mut pipeline,
                &exec_args(&format!("touch {} && exit 5", marker.display())),
                false,
                &mut ProgressReporter::new(false, true),
            )
            .unwrap();

            assert_eq!(code, 5);
            assert!(marker.is_file());
        }
    }
}
