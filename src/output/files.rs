//! Markdown directory sink
//!
//! Writes each converted page to `<output>/<boundary dir>/<subdirs>/<stem>.md`,
//! mirroring the link's path below the crawl boundary. The file stem comes
//! from the navigation label when there is one, else from the URL's last
//! path segment.

use crate::output::traits::{OutputError, OutputResult, PageRecord, PageSink, PageStatus};
use crate::url::{Link, ScopeBoundary};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Stem used when neither the label nor the URL yields a usable name
pub const UNTITLED_STEM: &str = "untitled_page";

/// Writes successful records as `.md` files under an output directory
#[derive(Debug)]
pub struct MarkdownDirectorySink {
    output_dir: PathBuf,
    root_name: String,
    boundary_path: String,
    reserved: HashSet<PathBuf>,
    written: Vec<PathBuf>,
}

impl MarkdownDirectorySink {
    /// Creates a sink rooted at `output_dir` for a crawl bounded by `boundary`
    pub fn new(output_dir: impl Into<PathBuf>, boundary: &ScopeBoundary) -> Self {
        let boundary_path = boundary.path().to_string();
        let root_name = boundary_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .last()
            .map(sanitize_segment)
            .unwrap_or_default();

        Self {
            output_dir: output_dir.into(),
            root_name,
            boundary_path,
            reserved: HashSet::new(),
            written: Vec::new(),
        }
    }

    /// Files written so far, in write order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// The directory that mirrors the boundary
    pub fn root_dir(&self) -> PathBuf {
        if self.root_name.is_empty() {
            self.output_dir.clone()
        } else {
            self.output_dir.join(&self.root_name)
        }
    }

    /// Picks a path for the record that no earlier record or existing file uses
    pub fn reserve_path(&mut self, link: &Link, label: Option<&str>) -> OutputResult<PathBuf> {
        let url = link
            .to_url()
            .map_err(|_| OutputError::InvalidPath(link.to_string()))?;

        let relative = url
            .path()
            .strip_prefix(&self.boundary_path)
            .ok_or_else(|| OutputError::InvalidPath(link.to_string()))?;

        let mut directory = self.root_dir();
        let segments: Vec<&str> = relative.split('/').collect();
        if let Some((_, parents)) = segments.split_last() {
            for segment in parents.iter().filter(|s| !s.is_empty()) {
                directory.push(sanitize_segment(segment));
            }
        }

        let stem = file_stem(label, url.path());
        let mut candidate = directory.join(format!("{}.md", stem));
        let mut counter = 1;
        while self.reserved.contains(&candidate) || candidate.exists() {
            candidate = directory.join(format!("{}_{}.md", stem, counter));
            counter += 1;
        }

        self.reserved.insert(candidate.clone());
        Ok(candidate)
    }

    fn write(&mut self, path: &Path, markdown: &str) -> OutputResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| OutputError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, markdown).map_err(|source| OutputError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        self.written.push(path.to_path_buf());
        Ok(())
    }
}

impl PageSink for MarkdownDirectorySink {
    fn accept(&mut self, record: &PageRecord) -> OutputResult<()> {
        match &record.status {
            PageStatus::Success { markdown, .. } => {
                let path = self.reserve_path(&record.source_url, record.label.as_deref())?;
                self.write(&path, markdown)?;
                tracing::info!("Saved {}", path.display());
                Ok(())
            }
            PageStatus::Failed { reason, attempts } => {
                tracing::error!(
                    "Not saving {} ({} attempts): {}",
                    record.source_url,
                    attempts,
                    reason
                );
                Ok(())
            }
        }
    }

    fn finish(&mut self) -> OutputResult<()> {
        tracing::info!(
            "Wrote {} Markdown files under {}",
            self.written.len(),
            self.root_dir().display()
        );
        Ok(())
    }
}

/// Derives a file stem from a link label, falling back to the URL path
///
/// # Examples
///
/// ```
/// use doc_scribe::output::file_stem;
///
/// assert_eq!(file_stem(Some("Getting Started!"), "/docs/intro.html"), "getting_started");
/// assert_eq!(file_stem(None, "/docs/intro.html"), "intro_html");
/// assert_eq!(file_stem(Some("???"), "/"), "untitled_page");
/// ```
pub fn file_stem(label: Option<&str>, url_path: &str) -> String {
    let base = match label.map(str::trim).filter(|label| !label.is_empty()) {
        Some(label) => label.to_string(),
        None => url_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .replace('.', "_"),
    };

    let sanitized = sanitize(&base);
    if sanitized.is_empty() {
        UNTITLED_STEM.to_string()
    } else {
        sanitized
    }
}

/// Lowercases, maps spaces to `_`, keeps alphanumerics, `_` and `-`
fn sanitize(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
        .trim_matches(|c| c == '_' || c == '-')
        .to_string()
}

/// Keeps a URL path segment usable as a single directory name
fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '%') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
