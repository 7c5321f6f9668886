//! Notebook publishing
//!
//! Mirrors a directory of notebooks as a static site: every `.ipynb` file is
//! converted to HTML next to where it was, every other file is copied as is,
//! and links between notebooks are pointed at the converted pages. The
//! conversion itself is delegated to a [`NotebookConverter`].

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::error::{Error, Result};

/// Output of converting one notebook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertedNotebook {
    /// The HTML page
    pub html: String,
    /// Link targets to rewrite in the page, original to published
    pub links: IndexMap<String, String>,
}

impl ConvertedNotebook {
    /// A page with no extra link rewrites
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            links: IndexMap::new(),
        }
    }

    /// Add a link rewrite
    pub fn with_link(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.links.insert(from.into(), to.into());
        self
    }
}

/// Converts a single notebook to HTML
pub trait NotebookConverter {
    /// Convert the notebook at `notebook`
    fn convert(&self, notebook: &Path) -> Result<ConvertedNotebook>;
}

/// Converter running `jupyter nbconvert --to html --stdout`
#[derive(Debug, Clone)]
pub struct JupyterConverter {
    program: PathBuf,
}

impl Default for JupyterConverter {
    fn default() -> Self {
        Self {
            program: PathBuf::from("jupyter"),
        }
    }
}

impl JupyterConverter {
    /// Use `jupyter` from the search path
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `jupyter` executable
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl NotebookConverter for JupyterConverter {
    fn convert(&self, notebook: &Path) -> Result<ConvertedNotebook> {
        tracing::debug!(notebook = %notebook.display(), "running nbconvert");
        let output = Command::new(&self.program)
            .args(["nbconvert", "--to", "html", "--stdout"])
            .arg(notebook)
            .output()
            .map_err(|e| {
                Error::Publish(format!(
                    "Failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(Error::Publish(format!(
                "nbconvert failed on '{}': {}",
                notebook.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let html = String::from_utf8(output.stdout).map_err(|e| {
            Error::Publish(format!(
                "nbconvert produced invalid UTF-8 for '{}': {}",
                notebook.display(),
                e
            ))
        })?;
        Ok(ConvertedNotebook::new(html))
    }
}

/// Configuration for publishing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    /// Remove the output directory before publishing
    pub clean_output: bool,
    /// Extension of notebook files, without the dot
    pub notebook_extension: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            clean_output: false,
            notebook_extension: "ipynb".to_string(),
        }
    }
}

impl PublishConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the output directory is removed first
    pub fn with_clean_output(mut self, clean: bool) -> Self {
        self.clean_output = clean;
        self
    }
}

/// Result of a publish run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Notebooks converted to HTML
    pub converted: usize,
    /// Other files copied
    pub copied: usize,
    /// Links rewritten in the produced pages
    pub rewritten_links: usize,
    /// Pages written, in walk order
    pub pages: Vec<PathBuf>,
}

/// Publishes a notebook directory with a given converter
#[derive(Debug)]
pub struct Publisher<C> {
    converter: C,
    config: PublishConfig,
}

// A converted page waiting for link rewriting
struct PendingPage {
    path: PathBuf,
    notebook: ConvertedNotebook,
}

impl<C: NotebookConverter> Publisher<C> {
    /// Create a publisher with default configuration
    pub fn new(converter: C) -> Self {
        Self {
            converter,
            config: PublishConfig::default(),
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: PublishConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Convert and copy `input_dir` into `output_dir`
    pub fn publish(&self, input_dir: &Path, output_dir: &Path) -> Result<PublishReport> {
        if !input_dir.is_dir() {
            return Err(Error::Publish(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            )));
        }

        if self.config.clean_output && output_dir.exists() {
            fs::remove_dir_all(output_dir)?;
        }
        fs::create_dir_all(output_dir)?;

        let mut report = PublishReport::default();
        let mut pending = Vec::new();
        let mut notebook_names = IndexSet::new();
        self.publish_dir(
            input_dir,
            output_dir,
            &mut report,
            &mut pending,
            &mut notebook_names,
        )?;

        let pattern = notebook_link_pattern(&notebook_names, &self.config.notebook_extension)?;
        for page in pending {
            let (html, rewritten) = rewrite_links(&page.notebook, pattern.as_ref());
            fs::write(&page.path, html)?;
            tracing::info!(page = %page.path.display(), links = rewritten, "published notebook");
            report.rewritten_links += rewritten;
            report.converted += 1;
            report.pages.push(page.path);
        }

        Ok(report)
    }

    fn publish_dir(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        report: &mut PublishReport,
        pending: &mut Vec<PendingPage>,
        notebook_names: &mut IndexSet<String>,
    ) -> Result<()> {
        let mut entries = fs::read_dir(input_dir)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }

            let source = entry.path();
            let target = output_dir.join(&name);

            if entry.file_type()?.is_dir() {
                fs::create_dir_all(&target)?;
                self.publish_dir(&source, &target, report, pending, notebook_names)?;
                continue;
            }

            let is_notebook = source
                .extension()
                .map(|ext| ext == self.config.notebook_extension.as_str())
                .unwrap_or(false);
            if is_notebook {
                let stem = source
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let notebook = self.converter.convert(&source)?;
                notebook_names.insert(stem);
                pending.push(PendingPage {
                    path: target.with_extension("html"),
                    notebook,
                });
            } else {
                fs::copy(&source, &target)?;
                tracing::debug!(file = %target.display(), "copied");
                report.copied += 1;
            }
        }

        Ok(())
    }
}

/// `href`/`src` attributes pointing at one of the converted notebooks
fn notebook_link_pattern(names: &IndexSet<String>, extension: &str) -> Result<Option<Regex>> {
    if names.is_empty() {
        return Ok(None);
    }

    let alternatives = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r#"\b((?:href|src)=['"](?:[^'"]*/)?(?:{}))\.{}(['"])"#,
        alternatives,
        regex::escape(extension)
    );

    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| Error::Publish(format!("Invalid link pattern: {}", e)))
}

/// Apply notebook link rewriting and the converter's link map
fn rewrite_links(notebook: &ConvertedNotebook, pattern: Option<&Regex>) -> (String, usize) {
    let mut html = notebook.html.clone();
    let mut rewritten = 0;

    if let Some(pattern) = pattern {
        rewritten += pattern.find_iter(&html).count();
        html = pattern.replace_all(&html, "${1}.html${2}").into_owned();
    }

    for (from, to) in &notebook.links {
        let count = html.matches(from.as_str()).count();
        if count > 0 {
            html = html.replace(from.as_str(), to);
            rewritten += count;
        }
    }

    (html, rewritten)
}
