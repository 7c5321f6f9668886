//! Resource location resolution
//!
//! This module classifies where a schema comes from: a file path, a URL, or
//! text held in memory.

use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::{Error, Result};

/// Resource location - can be a URL, file path, or in-memory text
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URL (http, https, ftp, etc.)
    Url(Url),
    /// In-memory schema text
    String(String),
}

impl FromStr for Location {
    type Err = Error;

    /// Auto-detect the kind of location; `file:` URLs become paths
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(s) {
            if url.scheme() == "file" {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::Resource(format!("Invalid file URL: {}", s)))?;
                return Ok(Location::Path(path));
            }
            // Single letters are Windows drive prefixes, not schemes
            if url.scheme().len() > 1 {
                return Ok(Location::Url(url));
            }
        }

        Ok(Location::Path(PathBuf::from(s)))
    }
}

impl Location {
    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
            Location::String(_) => "<string>".to_string(),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }
}
