//! Media sources for packages
//!
//! A `MediaFetcher` yields media entries one at a time. Only one entry is
//! open at once: the reader handed out by `next_entry` borrows the fetcher,
//! and asking for the next entry closes the previous one.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media filter failed for {}: {message}", .path.display())]
    Filter { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, MediaError>;

/// One media asset: its logical file name, contents and modification time
pub struct MediaEntry<'a> {
    pub name: String,
    pub modified: DateTime<Utc>,
    pub reader: &'a mut dyn Read,
}

/// Sequential, single-pass source of media entries
pub trait MediaFetcher {
    /// Open the next entry, closing the previous one. `None` once exhausted.
    fn next_entry(&mut self) -> Result<Option<MediaEntry<'_>>>;

    /// Close any open entry and rewind to the start.
    fn close(&mut self);
}

/// Transforms a file's contents as it is read, e.g. to re-encode images
pub type MediaFilter = Box<dyn Fn(&Path, Box<dyn Read>) -> Result<Box<dyn Read>>>;

enum MediaSource {
    File(PathBuf),
    Bytes(Vec<u8>),
}

/// Media fetcher over files on disk and in-memory buffers, in insertion order
pub struct MediaMap {
    entries: Vec<(String, MediaSource)>,
    position: usize,
    current: Option<Box<dyn Read>>,
    filter: Option<MediaFilter>,
}

impl MediaMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            position: 0,
            current: None,
            filter: None,
        }
    }

    /// Build from (name, path) pairs and (name, bytes) pairs; files first
    pub fn from_sources(
        paths: impl IntoIterator<Item = (String, PathBuf)>,
        in_memory: impl IntoIterator<Item = (String, Vec<u8>)>,
    ) -> Self {
        let mut map = Self::new();
        for (name, path) in paths {
            map = map.with_file(name, path);
        }
        for (name, data) in in_memory {
            map = map.with_bytes(name, data);
        }
        map
    }

    pub fn with_file(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.entries.push((name.into(), MediaSource::File(path.into())));
        self
    }

    pub fn with_bytes(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.entries.push((name.into(), MediaSource::Bytes(data)));
        self
    }

    /// Apply `filter` to every file entry as it is opened
    pub fn with_filter(mut self, filter: MediaFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MediaMap {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaFetcher for MediaMap {
    fn next_entry(&mut self) -> Result<Option<MediaEntry<'_>>> {
        self.current = None;

        let Some((name, source)) = self.entries.get(self.position) else {
            return Ok(None);
        };
        let name = name.clone();

        let (reader, modified): (Box<dyn Read>, DateTime<Utc>) = match source {
            MediaSource::File(path) => {
                let file = File::open(path)?;
                let modified: DateTime<Utc> = file.metadata()?.modified()?.into();
                let reader: Box<dyn Read> = Box::new(file);
                let reader = match &self.filter {
                    Some(filter) => filter(path.as_path(), reader)?,
                    None => reader,
                };
                (reader, modified)
            }
            MediaSource::Bytes(data) => {
                let reader: Box<dyn Read> = Box::new(Cursor::new(data.clone()));
                (reader, Utc::now())
            }
        };

        self.position += 1;
        let reader = self.current.insert(reader);
        Ok(Some(MediaEntry {
            name,
            modified,
            reader: reader.as_mut(),
        }))
    }

    fn close(&mut self) {
        self.current = None;
        self.position = 0;
    }
}
