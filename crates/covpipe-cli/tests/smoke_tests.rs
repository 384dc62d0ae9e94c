//! Smoke tests for the covpipe CLI
//!
//! lcov and genhtml are replaced by small shell scripts that log their
//! arguments and create the `-o` target, so the whole command surface runs
//! without a real toolchain.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command for the covpipe binary with a clean environment
fn covpipe() -> Command {
    let mut cmd = Command::cargo_bin("covpipe").expect("covpipe binary should exist");
    cmd.env_remove("COVPIPE_DATA_DIR")
        .env_remove("COVPIPE_OUTPUT_DIR")
        .env_remove("COVPIPE_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    covpipe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    covpipe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("capture"))
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("relocate"));
}

#[test]
fn test_no_args_shows_help() {
    covpipe().assert().failure(); // Requires a subcommand
}

#[test]
fn test_exec_subcommand_help() {
    covpipe()
        .args(["exec", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exit status"));
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_missing_coverage_tool_is_fatal() {
    let tmp = TempDir::new().unwrap();
    covpipe()
        .args(["--output-dir"])
        .arg(tmp.path())
        .args(["--lcov", "/nonexistent/lcov", "capture"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/lcov not found"));
}

#[test]
fn test_stepwise_command_needs_output_dir() {
    covpipe()
        .args(["--lcov", "/bin/sh", "merge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("output directory"));
}

#[test]
fn test_invalid_data_dir_is_fatal() {
    let tmp = TempDir::new().unwrap();
    covpipe()
        .arg("--output-dir")
        .arg(tmp.path())
        .args(["--data-dir", "/nonexistent/build", "--lcov", "/bin/sh", "capture"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/build"));
}

// ============================================================================
// Sessions with stand-in tools
// ============================================================================

#[cfg(unix)]
mod session_tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const FAKE_TOOL: &str = r#"#!/bin/sh
echo "$(basename "$0") $*" >> "$(dirname "$0")/calls.log"
case "$1" in
  --summary)
    echo "Summary coverage rate:" >&2
    echo "  lines......: 75.0% (3 of 4 lines)" >&2
    echo "  functions..: 100.0% (1 of 1 function)" >&2
    echo "  branches...: no data found" >&2
    exit 0 ;;
esac
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
[ -z "$out" ] && exit 0
case "$(basename "$0")" in
  genhtml*)
    mkdir -p "$out"
    printf '<link rel="stylesheet" href="gcov.css"><a href="src/index.html">src</a>\n' > "$out/index.html" ;;
  *)
    printf 'TN:\nend_of_record\n' > "$out" ;;
esac
"#;

    struct Fixture {
        tmp: TempDir,
        lcov: PathBuf,
        genhtml: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let bin = tmp.path().join("bin");
            fs::create_dir_all(&bin).unwrap();
            let lcov = install(&bin, "lcov");
            let genhtml = install(&bin, "genhtml");
            let build = tmp.path().join("build");
            fs::create_dir_all(&build).unwrap();
            fs::write(build.join("main.gcno"), b"note").unwrap();
            Self { tmp, lcov, genhtml }
        }

        fn out(&self) -> PathBuf {
            self.tmp.path().join("cov")
        }

        fn cmd(&self) -> Command {
            let mut cmd = covpipe();
            cmd.arg("--lcov")
                .arg(&self.lcov)
                .arg("--genhtml")
                .arg(&self.genhtml)
                .arg("--data-dir")
                .arg(self.tmp.path().join("build"))
                .arg("--output-dir")
                .arg(self.out())
                .arg("--no-elevate")
                .arg("--color")
                .arg("never");
            cmd
        }

        fn calls(&self) -> Vec<String> {
            fs::read_to_string(self.tmp.path().join("bin").join("calls.log"))
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn install(bin: &Path, name: &str) -> PathBuf {
        let path = bin.join(name);
        fs::write(&path, FAKE_TOOL).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_prepare_creates_counter_files() {
        let fx = Fixture::new();
        fx.cmd().arg("prepare").assert().success();
        assert!(fx.tmp.path().join("build").join("main.gcda").is_file());
    }

    #[test]
    fn test_stepwise_session() {
        let fx = Fixture::new();

        fx.cmd()
            .arg("baseline")
            .assert()
            .success()
            .stdout(predicate::str::contains("baseline.info"));
        fx.cmd().args(["capture", "-t", "smoke"]).assert().success();
        fx.cmd().args(["merge", "-x", "/usr/*"]).assert().success();
        fx.cmd().arg("html").assert().success();

        assert!(fx.out().join("total.info").is_file());
        assert!(!fx.out().join("total.info.tmp").exists());
        assert!(fx.out().join("html").join("index.html").is_file());

        let calls = fx.calls();
        assert!(calls[0].starts_with("lcov -i -d"));
        assert!(calls[1].starts_with("lcov -t smoke -c -d"));
        assert!(calls[2].contains(" -a ") && calls[2].contains("baseline.info"));
        assert!(calls[3].starts_with("lcov -r"));
        assert!(calls[4].starts_with("genhtml"));
    }

    #[test]
    fn test_summary_text_and_json() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.out()).unwrap();
        fs::write(fx.out().join("total.info"), "TN:\n").unwrap();

        fx.cmd()
            .arg("summary")
            .assert()
            .success()
            .stdout(predicate::str::contains("lines......: 75.0%"));
        fx.cmd()
            .args(["summary", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"found\": 4"))
            .stdout(predicate::str::contains("\"branches\": null"));
    }

    #[test]
    fn test_relocate_rewrites_copy() {
        let fx = Fixture::new();
        let html = fx.out().join("html");
        fs::create_dir_all(&html).unwrap();
        fs::write(html.join("index.html"), "<a href=\"src/a.html\">a</a>").unwrap();

        fx.cmd()
            .args(["--base-url", "https://ci.example.com/r/9", "relocate"])
            .assert()
            .success();

        let page = fs::read_to_string(fx.out().join("html_baseurl").join("index.html")).unwrap();
        assert_eq!(page, "<a href=\"https://ci.example.com/r/9/src/a.html\">a</a>");
        assert_eq!(
            fs::read_to_string(html.join("index.html")).unwrap(),
            "<a href=\"src/a.html\">a</a>"
        );
    }

    #[test]
    fn test_exec_propagates_exit_status() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["--base-url", "/reports/run1", "exec", "--", "sh", "-c", "exit 4"])
            .assert()
            .code(4)
            .stdout(predicate::str::contains("75.0% (3 of 4)"));

        assert!(fx.out().join("total.info").is_file());
        let page =
            fs::read_to_string(fx.out().join("html_baseurl").join("index.html")).unwrap();
        assert!(page.contains("href=\"/reports/run1/gcov.css\""));
        assert!(page.contains("href=\"/reports/run1/src/index.html\""));
    }

    #[test]
    fn test_exec_rejects_unusable_base_url_before_running() {
        let fx = Fixture::new();
        let marker = fx.tmp.path().join("ran");
        fx.cmd()
            .args(["--base-url", "mailto:ci@example.com", "exec", "--", "touch"])
            .arg(&marker)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("mailto:ci@example.com"));

        assert!(!marker.exists());
        assert!(fx.calls().is_empty());
    }

    #[test]
    fn test_without_data_dir_only_reports() {
        let fx = Fixture::new();
        let mut cmd = covpipe();
        cmd.arg("--lcov")
            .arg(&fx.lcov)
            .arg("--output-dir")
            .arg(fx.out())
            .args(["--color", "never", "capture"])
            .assert()
            .success()
            .stderr(predicate::str::contains("No coverage data directory"));
        assert!(fx.calls().is_empty());
    }
}
