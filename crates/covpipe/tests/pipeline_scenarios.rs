//! End-to-end pipeline scenarios driven through the public API.
//!
//! Every external call goes to a [`RecordingRunner`], which creates the
//! files lcov and genhtml would have written.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use covpipe::mock::RecordingRunner;
use covpipe::{CoveragePipeline, Session, SessionConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn tools_found(name: &str) -> Option<PathBuf> {
    Some(PathBuf::from("/usr/bin").join(name))
}

fn pipeline(config: &SessionConfig) -> CoveragePipeline<RecordingRunner> {
    let session = Session::resolve_with(config, tools_found).unwrap();
    CoveragePipeline::new(session, RecordingRunner::new().materializing())
}

fn build_tree(root: &Path) {
    fs::create_dir_all(root.join("lib")).unwrap();
    fs::write(root.join("main.gcno"), b"n").unwrap();
    fs::write(root.join("lib").join("util.gcno"), b"n").unwrap();
}

#[test]
fn test_without_data_dir_every_capture_step_is_a_noop() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("cov");
    let mut p = pipeline(&SessionConfig::new().with_output_dir(&out));

    assert_eq!(p.initialize_baseline(None, None).unwrap(), None);
    assert_eq!(p.capture_incremental(None, None).unwrap(), None);
    assert_eq!(p.merge::<&str>(None, None, &[]).unwrap(), None);
    assert_eq!(p.summarize(None).unwrap(), "");

    assert!(p.runner().invocations().is_empty());
    assert!(!out.exists());
}

#[test]
fn test_two_captures_merge_in_call_order() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("build");
    build_tree(&data);
    let out = tmp.path().join("cov");
    let config = SessionConfig::new().with_data_dir(&data).with_output_dir(&out);
    let mut p = pipeline(&config);

    let first = p.capture_incremental(Some(out.join("run1.info").as_path()), None).unwrap().unwrap();
    let second = p.capture_incremental(Some(out.join("run2.info").as_path()), None).unwrap().unwrap();
    let total = p.merge::<&str>(None, None, &[]).unwrap().unwrap();

    let argvs = p.runner().argvs();
    let merge = argvs.last().unwrap();
    let added: Vec<&str> = merge
        .windows(2)
        .filter(|w| w[0] == "-a")
        .map(|w| w[1].as_str())
        .collect();
    assert_eq!(
        added,
        [first.display().to_string(), second.display().to_string()]
    );
    assert_eq!(merge.last().unwrap(), &total.display().to_string());
}

#[test]
fn test_full_session_with_exclude_and_relocation() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("build");
    build_tree(&data);
    let out = tmp.path().join("cov");
    let config = SessionConfig::new()
        .with_data_dir(&data)
        .with_output_dir(&out)
        .with_base_url("https://ci.example.com/reports/run42");
    let mut p = pipeline(&config);

    let report = p.prepare_data_files().unwrap();
    assert_eq!(report.notes_seen, 2);
    assert_eq!(report.counters_created, 2);

    p.initialize_baseline(None, Some("session")).unwrap();
    p.capture_incremental(None, Some("session")).unwrap();
    let total = p.merge(None, None, &["/usr/*"]).unwrap().unwrap();
    assert!(total.is_file());
    assert!(!out.join("total.info.tmp").exists());

    let html = p.generate_html(None, None, false).unwrap().unwrap();
    fs::create_dir_all(html.join("sub")).unwrap();
    fs::write(
        html.join("sub").join("page.html"),
        "<a href=\"index.html\">up</a> <a href=\"http://ltp.sourceforge.net/coverage/lcov.php\">LCOV</a>",
    )
    .unwrap();
    let original = fs::read(html.join("sub").join("page.html")).unwrap();

    let relocated = p.relocate(None, None).unwrap().unwrap();

    assert_eq!(fs::read(html.join("sub").join("page.html")).unwrap(), original);
    let page = fs::read_to_string(relocated.destination.join("sub").join("page.html")).unwrap();
    assert!(page.contains("href=\"https://ci.example.com/reports/run42/sub/index.html\""));
    assert!(page.contains("href=\"http://ltp.sourceforge.net/coverage/lcov.php\""));
}

#[test]
fn test_unresolved_report_tool_leaves_html_dir_untouched() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("cov");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("total.info"), "TN:\n").unwrap();
    let config = SessionConfig::new().with_output_dir(&out);
    let session = Session::resolve_with(&config, |name| {
        (name != "genhtml").then(|| PathBuf::from("/usr/bin").join(name))
    })
    .unwrap();
    let p = CoveragePipeline::new(session, RecordingRunner::new().materializing());

    assert_eq!(p.generate_html(None, None, false).unwrap(), None);
    assert!(p.runner().invocations().is_empty());
    assert!(!out.join("html").exists());
}

#[test]
fn test_unresolved_coverage_tool_is_fatal() {
    let err = Session::resolve_with(&SessionConfig::new(), |_| None).unwrap_err();
    assert!(err.is_fatal());
}
