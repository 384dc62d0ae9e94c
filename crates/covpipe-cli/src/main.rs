//! covpipe: coverage sessions from the command line
//!
//! ## Usage
//!
//! ```bash
//! covpipe --data-dir build exec -- make check     # Whole session around a command
//! covpipe --output-dir cov --data-dir build baseline
//! covpipe --output-dir cov --data-dir build capture -t smoke
//! covpipe --output-dir cov --data-dir build merge -x '/usr/*'
//! covpipe --output-dir cov html --no-source
//! covpipe --output-dir cov summary --json
//! ```

use clap::Parser;
use covpipe::CoveragePipeline;
use covpipe_cli::{
    handlers, logging, require_output_dir, session_config, Cli, CliConfig, CliResult, Commands,
    ProgressReporter,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = CliConfig::from_cli(&cli);
    logging::init_logging(&config)?;

    let session = session_config(&cli)?;
    if cli.command.needs_output_dir() {
        require_output_dir(&session, cli.command.name())?;
    }

    let mut reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let mut pipeline = CoveragePipeline::from_config(&session)?;

    match cli.command {
        Commands::Prepare => {
            handlers::execute_prepare(&pipeline, &reporter);
        }
        Commands::Baseline(ref args) => handlers::execute_baseline(&mut pipeline, args, &reporter)?,
        Commands::Capture(ref args) => handlers::execute_capture(&mut pipeline, args, &reporter)?,
        Commands::Reset => handlers::execute_reset(&pipeline, &reporter)?,
        Commands::Merge(ref args) => handlers::execute_merge(&mut pipeline, args, &reporter)?,
        Commands::Html(ref args) => {
            handlers::execute_html(&pipeline, args, cli.no_source, &reporter)?;
        }
        Commands::Relocate(ref args) => {
            handlers::execute_relocate(&pipeline, args, &reporter)?;
        }
        Commands::Summary(ref args) => handlers::execute_summary(&pipeline, args, &reporter)?,
        Commands::Exec(ref args) => {
            let code = handlers::execute_exec(&mut pipeline, args, cli.no_source, &mut reporter)?;
            return Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)));
        }
    }
    Ok(ExitCode::SUCCESS)
}
