//! Loading source files into documents.

use scribe_core::{AppError, AppResult};
use scribe_retrieval::Document;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Content type classification by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    Code,
    PlainText,
    Unknown,
}

impl ContentType {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md" | "markdown") => Self::Markdown,
            Some("html" | "htm") => Self::Html,
            Some(
                "rs" | "py" | "js" | "ts" | "go" | "c" | "cpp" | "java" | "sh" | "yaml" | "yml"
                | "json" | "toml",
            ) => Self::Code,
            Some("txt") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Code => "code",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Read one file into a [`Document`]. The id is the path as given.
///
/// Returns `Ok(None)` for files that look binary.
pub fn load_file(path: &Path) -> AppResult<Option<Document>> {
    let content_type = ContentType::from_path(path);
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Other(format!("Failed to read {}: {}", path.display(), e)))?;

    let text = match content_type {
        ContentType::Markdown => clean_markdown(&raw),
        ContentType::Html => clean_html(&raw),
        ContentType::Code | ContentType::PlainText => raw,
        ContentType::Unknown if raw.contains('\0') => {
            tracing::warn!("Skipping likely binary file: {}", path.display());
            return Ok(None);
        }
        ContentType::Unknown => raw,
    };

    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(Some(
        Document::new(path.display().to_string(), title, text)
            .with_metadata("sourcePath", path.display().to_string())
            .with_metadata("sourceType", content_type.as_str()),
    ))
}

/// Load every readable file under `paths`, walking directories.
///
/// Hidden entries (`.git`, `.scribe`, ...) are skipped. Unreadable files are
/// logged and skipped; a missing top-level path is an error.
pub fn load_documents(paths: &[PathBuf]) -> AppResult<Vec<Document>> {
    let mut documents = Vec::new();

    for path in paths {
        if path.is_file() {
            documents.extend(load_file(path)?);
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                match load_file(entry.path()) {
                    Ok(doc) => documents.extend(doc),
                    Err(e) => tracing::warn!("Skipping {}: {}", entry.path().display(), e),
                }
            }
        } else {
            return Err(AppError::Config(format!(
                "Source path does not exist: {}",
                path.display()
            )));
        }
    }

    tracing::debug!("Loaded {} documents", documents.len());
    Ok(documents)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Drop heading markers, rules and code fences.
fn clean_markdown(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_start_matches('#').trim())
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("---")
                && !line.starts_with("```")
                && !line.starts_with("~~~")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip tags plus `<script>`/`<style>` bodies and collapse whitespace.
fn clean_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        out.push(' ');
        let tag = &rest[open..];

        let skip_to = ["script", "style"].iter().find_map(|name| {
            let opener = format!("<{}", name);
            let starts = tag
                .get(..opener.len())
                .map(|t| t.eq_ignore_ascii_case(&opener))
                .unwrap_or(false);
            starts.then(|| format!("</{}", name))
        });

        rest = match skip_to {
            Some(closer) => match tag.to_ascii_lowercase().find(&closer) {
                Some(end) => after_tag(&tag[end..]),
                None => "",
            },
            None => after_tag(tag),
        };
    }
    out.push_str(rest);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text following the first `>`, or nothing for an unterminated tag.
fn after_tag(tag: &str) -> &str {
    tag.find('>').map(|i| &tag[i + 1..]).unwrap_or("")
}
