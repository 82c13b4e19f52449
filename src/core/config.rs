//! Pattern configuration
//!
//! The document set comes from a plain-text file listing one glob pattern
//! per line. There is no default set: a missing pattern file stops the
//! tool, and the file is re-read for every rebuild and query so edits take
//! effect mid-session.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

/// Default pattern file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".docsim_config";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file '{path}' not found")]
    Missing { path: String },

    #[error("cannot read configuration file '{path}': {source}")]
    Unreadable { path: String, source: io::Error },

    #[error("invalid glob pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        source: glob::PatternError,
    },
}

/// The glob patterns describing the document set.
#[derive(Debug, Clone)]
pub struct PatternConfig {
    patterns: Vec<String>,
}

impl PatternConfig {
    /// Read the pattern file: one glob per line, blank lines skipped.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing {
                    path: path.display().to_string(),
                });
            }
            Err(e) => {
                return Err(ConfigError::Unreadable {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };

        let patterns = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Expand every pattern into a sorted, de-duplicated list of file
    /// paths. Directories are excluded; matches the walker cannot read are
    /// skipped with a warning. An invalid pattern is an error naming it.
    ///
    /// A trailing bare `**` is widened to `**/*` before expansion so it
    /// reaches files at every depth, not just directories.
    pub fn resolve(&self) -> Result<Vec<String>, ConfigError> {
        let mut paths = BTreeSet::new();

        for pattern in &self.patterns {
            // `glob` matches only directories for a trailing bare `**`.
            let target = if pattern == "**" || pattern.ends_with("/**") {
                format!("{pattern}/*")
            } else {
                pattern.clone()
            };

            let matches = glob::glob(&target).map_err(|source| ConfigError::BadPattern {
                pattern: pattern.clone(),
                source,
            })?;

            for entry in matches {
                match entry {
                    Ok(path) if path.is_file() => {
                        paths.insert(path.to_string_lossy().into_owned());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("skipping unreadable match: {e}");
                    }
                }
            }
        }

        Ok(paths.into_iter().collect())
    }
}
