use std::fmt;
use std::path::Path;

use itertools::Itertools;
use url::Url;

use crate::error::{Error, Result};

/// Outcome of converting one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRecord {
    Parsed { url: Url, markdown: String },
    Failed { url: Url, error: String },
}

impl PageRecord {
    pub fn url(&self) -> &Url {
        match self {
            PageRecord::Parsed { url, .. } | PageRecord::Failed { url, .. } => url,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PageRecord::Failed { .. })
    }
}

impl fmt::Display for PageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRecord::Parsed { url, markdown } => {
                write!(f, "<!-- Source: {} -->\n\n{}\n\n---", url, markdown)
            }
            PageRecord::Failed { url, error } => {
                write!(f, "<!-- Failed to parse {}: {} -->\n\n---", url, error)
            }
        }
    }
}

/// The flattened site: page records in link order, separated by blank lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    records: Vec<PageRecord>,
}

impl Document {
    pub fn new(records: Vec<PageRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    pub fn failures(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter().filter(|record| record.is_failed())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_string()).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Wrote {} records to {}", self.records.len(), path.display());
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.records.iter().join("\n\n"))
    }
}
