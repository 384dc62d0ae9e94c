//! Relocatable HTML reports.
//!
//! genhtml writes links relative to each page. To publish a report under a
//! prefix that is only known later (an artifact host path that changes per
//! run), the report tree is copied next to the original as `<dir>_baseurl`
//! and the links in the copy are rewritten to absolute URLs:
//!
//! ```text
//! base:   https://ci.example.com/reports/run42/
//! page:   html_baseurl/sub/page.html
//! before: <a href="index.html">
//! after:  <a href="https://ci.example.com/reports/run42/sub/index.html">
//! ```
//!
//! Rewritten attributes are `<a href>`, `<img src>` and
//! `<link rel="stylesheet" href>`. Values that already carry a scheme are
//! left alone, and nothing outside the rewritten values changes.
//!
//! The original tree is never modified, so relocating again (to the same or a
//! different base URL) always starts from genhtml's output.
//!
//! Pages are handled as bytes. genhtml copies source lines into its listings
//! verbatim, so a page may hold text in any encoding; only the rewritten
//! attribute values have to be UTF-8.

use std::collections::HashMap;
use std::fs;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use url::{ParseError, Position, Url};
use walkdir::WalkDir;

use crate::pipeline::CoveragePipeline;
use crate::result::{CovError, CovResult};
use crate::runner::ProcessRunner;
use crate::session::HTML_DIR;

/// Suffix of the relocated copy's directory name
pub const BASEURL_SUFFIX: &str = "_baseurl";

/// Origin used to resolve base URLs that have no scheme
const PLACEHOLDER_ORIGIN: &str = "http://relocate.invalid/";

/// Result of a relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationReport {
    /// The rewritten copy
    pub destination: PathBuf,
    /// Base URL used, with trailing `/`
    pub base_url: String,
    /// HTML files processed
    pub html_files: usize,
    /// Attribute values rewritten
    pub links_rewritten: usize,
}

/// Append `/` unless present
#[must_use]
pub fn normalize_base_url(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    }
}

/// `<parent>/<name>_baseurl` for `html_out`
pub fn relocated_dir(html_out: &Path) -> CovResult<PathBuf> {
    let name = html_out.file_name().ok_or_else(|| {
        CovError::config(format!("{} has no directory name", html_out.display()))
    })?;
    let mut name = name.to_os_string();
    name.push(BASEURL_SUFFIX);
    Ok(html_out.with_file_name(name))
}

/// A parsed base URL.
///
/// Base URLs without a scheme (`/reports/run42/`) are resolved against a
/// placeholder origin which is stripped again on output.
#[derive(Debug, Clone)]
pub struct BaseUrl {
    url: Url,
    path_only: bool,
}

impl BaseUrl {
    /// Parse `base_url`, adding a trailing `/`
    pub fn parse(base_url: &str) -> CovResult<Self> {
        let normalized = normalize_base_url(base_url);
        let invalid = |message: String| CovError::InvalidBaseUrl {
            url: base_url.to_string(),
            message,
        };

        let (url, path_only) = match Url::parse(&normalized) {
            Ok(url) => (url, false),
            Err(ParseError::RelativeUrlWithoutBase) => {
                let origin = Url::parse(PLACEHOLDER_ORIGIN).map_err(|e| invalid(e.to_string()))?;
                (origin.join(&normalized).map_err(|e| invalid(e.to_string()))?, true)
            }
            Err(e) => return Err(invalid(e.to_string())),
        };
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base".to_string()));
        }
        Ok(Self { url, path_only })
    }

    /// URL of the directory `rel_dir` below the base, with trailing `/`
    pub fn for_dir<S: AsRef<str>>(&self, rel_dir: &[S]) -> CovResult<DirUrl> {
        let mut url = self.url.clone();
        if !rel_dir.is_empty() {
            url.path_segments_mut()
                .map_err(|()| CovError::InvalidBaseUrl {
                    url: self.url.to_string(),
                    message: "URL cannot be used as a base".to_string(),
                })?
                .pop_if_empty()
                .extend(rel_dir.iter().map(AsRef::<str>::as_ref))
                .push("");
        }
        Ok(DirUrl {
            url,
            path_only: self.path_only,
        })
    }

    /// Display form, with trailing `/`
    #[must_use]
    pub fn as_str(&self) -> &str {
        if self.path_only {
            &self.url[Position::BeforePath..]
        } else {
            self.url.as_str()
        }
    }
}

/// Base URL of one directory of the report.
#[derive(Debug, Clone)]
pub struct DirUrl {
    url: Url,
    path_only: bool,
}

impl DirUrl {
    /// Display form, with trailing `/`
    #[must_use]
    pub fn as_str(&self) -> &str {
        if self.path_only {
            &self.url[Position::BeforePath..]
        } else {
            self.url.as_str()
        }
    }

    /// Resolve `reference` against this directory.
    ///
    /// Returns `None` for references that already have a scheme and for
    /// references that cannot be resolved. Without a scheme in the base,
    /// references naming their own host (`//cdn.example.com/x.css`) are left
    /// alone too.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> Option<String> {
        if Url::parse(reference).is_ok() {
            return None;
        }
        let joined = self.url.join(reference).ok()?;
        if !self.path_only {
            return Some(joined.to_string());
        }
        if joined.host_str() != self.url.host_str() {
            return None;
        }
        Some(joined[Position::BeforePath..].to_string())
    }
}

fn tag_regex() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r#"(?i-u)<(a|img|link)\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).ok())
        .as_ref()
}

fn attr_regex() -> Option<&'static Regex> {
    static ATTR: OnceLock<Option<Regex>> = OnceLock::new();
    ATTR.get_or_init(|| {
        Regex::new(r#"(?-u)([^\s"'<>/=]+)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'=<>`]+))?"#).ok()
    })
    .as_ref()
}

struct Attr<'h> {
    name: &'h str,
    value: &'h str,
    /// Span of the value token, quotes included, within the document
    span: Range<usize>,
}

fn attributes(html: &[u8], region: Range<usize>) -> Vec<Attr<'_>> {
    let offset = region.start;
    let Some(attr_re) = attr_regex() else {
        return Vec::new();
    };
    attr_re
        .captures_iter(&html[region])
        .filter_map(|caps| {
            let name = std::str::from_utf8(caps.get(1)?.as_bytes()).ok()?;
            let raw = caps.get(2)?;
            let token = std::str::from_utf8(raw.as_bytes()).ok()?;
            let value = token
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| token.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(token);
            Some(Attr {
                name,
                value,
                span: offset + raw.start()..offset + raw.end(),
            })
        })
        .collect()
}

fn is_stylesheet(attrs: &[Attr<'_>]) -> bool {
    attrs.iter().any(|a| {
        a.name.eq_ignore_ascii_case("rel")
            && a
                .value
                .split_ascii_whitespace()
                .any(|t| t.eq_ignore_ascii_case("stylesheet"))
    })
}

/// Rewrite the link attributes of one HTML document.
///
/// Returns the new document and the number of values rewritten. Values
/// that are not UTF-8 are left as they are.
#[must_use]
pub fn rewrite_html(html: &[u8], dir_url: &DirUrl) -> (Vec<u8>, usize) {
    let Some(tag_re) = tag_regex() else {
        return (html.to_vec(), 0);
    };
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    for caps in tag_re.captures_iter(html) {
        let (Some(tag), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let attrs = attributes(html, body.range());
        let target = match tag.as_bytes().to_ascii_lowercase().as_slice() {
            b"a" => "href",
            b"img" => "src",
            b"link" if is_stylesheet(&attrs) => "href",
            _ => continue,
        };

        let Some(attr) = attrs.iter().find(|a| a.name.eq_ignore_ascii_case(target)) else {
            continue;
        };
        if let Some(resolved) = dir_url.resolve(attr.value) {
            edits.push((attr.span.clone(), format!("\"{}\"", resolved.replace('"', "&quot;"))));
        }
    }

    let count = edits.len();
    let mut out = Vec::with_capacity(html.len() + count * 32);
    let mut last = 0;
    for (span, value) in edits {
        out.extend_from_slice(&html[last..span.start]);
        out.extend_from_slice(value.as_bytes());
        last = span.end;
    }
    out.extend_from_slice(&html[last..]);
    (out, count)
}

fn copy_tree(src: &Path, dest: &Path) -> CovResult<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn relative_segments(dir: &Path, root: &Path) -> Vec<String> {
    dir.strip_prefix(root)
        .unwrap_or(Path::new(""))
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Copy `html_out` to its `_baseurl` sibling and rewrite the copy's links.
pub fn relocate_tree(html_out: &Path, base: &BaseUrl) -> CovResult<RelocationReport> {
    let dest = relocated_dir(html_out)?;
    match fs::symlink_metadata(&dest) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(&dest)?,
        Ok(_) => fs::remove_file(&dest)?,
        Err(_) => {}
    }
    copy_tree(html_out, &dest)?;

    let mut report = RelocationReport {
        destination: dest.clone(),
        base_url: base.as_str().to_string(),
        html_files: 0,
        links_rewritten: 0,
    };
    let mut dir_urls: HashMap<PathBuf, DirUrl> = HashMap::new();

    for entry in WalkDir::new(&dest) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |e| e != "html") {
            continue;
        }
        let dir = path.parent().unwrap_or(&dest).to_path_buf();
        if !dir_urls.contains_key(&dir) {
            let url = base.for_dir(&relative_segments(&dir, &dest))?;
            tracing::debug!(dir = %dir.display(), url = url.as_str(), "directory base");
            dir_urls.insert(dir.clone(), url);
        }
        let Some(dir_url) = dir_urls.get(&dir) else {
            continue;
        };

        let html = match fs::read(path) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unreadable HTML file");
                continue;
            }
        };
        let (rewritten, count) = rewrite_html(&html, dir_url);
        if count > 0 {
            fs::write(path, rewritten)?;
        }
        report.html_files += 1;
        report.links_rewritten += count;
    }

    Ok(report)
}

impl<R: ProcessRunner> CoveragePipeline<R> {
    /// Make the report at `html_out` (default `<output_dir>/html`) servable
    /// from `base_url` (default: the session's).
    ///
    /// Returns `Ok(None)` if no base URL is configured or the report does
    /// not exist.
    pub fn relocate(
        &self,
        html_out: Option<&Path>,
        base_url: Option<&str>,
    ) -> CovResult<Option<RelocationReport>> {
        let Some(base_url) = base_url.or_else(|| self.session().base_url()) else {
            return Ok(None);
        };
        let html_out = self.or_default(html_out, HTML_DIR);
        if !html_out.is_dir() {
            tracing::debug!(dir = %html_out.display(), "no report to relocate");
            return Ok(None);
        }

        let base = BaseUrl::parse(base_url)?;
        tracing::info!(base_url = base.as_str(), "changing report base URL");
        let report = relocate_tree(&html_out, &base)?;
        tracing::info!(
            destination = %report.destination.display(),
            files = report.html_files,
            links = report.links_rewritten,
            "report relocated"
        );
        Ok(Some(report))
    }
}
