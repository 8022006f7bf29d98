//! Line-oriented source reader collaborator.
//!
//! The scan engine only needs an ordered stream of lines; upload
//! transport and object storage mechanics live behind this trait.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub trait LogSource: Send + Sync {
    /// Open the job input for one forward pass. A missing input is an
    /// error the orchestrator treats as fatal for the job.
    fn open(&self, path: &str) -> Result<Box<dyn BufRead + Send>>;
}

/// Local filesystem source.
pub struct FileSource;

impl LogSource for FileSource {
    fn open(&self, path: &str) -> Result<Box<dyn BufRead + Send>> {
        let file = File::open(Path::new(path))
            .with_context(|| format!("failed to open log source {path}"))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
