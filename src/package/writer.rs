//! Assembling `.apkg` archives
//!
//! Archive layout:
//! ```text
//! collection.anki2   # SQLite collection
//! 0, 1, 2, ...       # media payloads, positional names
//! media              # JSON: {"0": "name0", "1": "name1", ...}
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::Path;

use chrono::{DateTime, Datelike, Timelike, Utc};
use rusqlite::{Connection, Transaction};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::media::MediaFetcher;
use crate::deck::{Deck, APKG_SCHEMA};
use crate::errors::{ApkgError, Result};

pub const COLLECTION_ENTRY: &str = "collection.anki2";
pub const MEDIA_MANIFEST_ENTRY: &str = "media";

/// The root container: a list of decks written into one archive
#[derive(Debug, Clone, Default)]
pub struct Package {
    decks: Vec<Deck>,
}

impl Package {
    pub fn new(decks: Vec<Deck>) -> Self {
        Self { decks }
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    /// Create `path` and write the archive into it.
    ///
    /// On error the file may exist with partial content and must be discarded.
    pub fn write_to_file(&mut self, path: &Path, media: Option<&mut dyn MediaFetcher>) -> Result<()> {
        let file = File::create(path).map_err(ApkgError::ArchiveIo)?;
        let file = self.write(file, media)?;
        file.sync_all().map_err(ApkgError::ArchiveIo)?;
        log::info!("Wrote package to {:?}", path);
        Ok(())
    }

    /// Apply the schema and write every deck inside `tx`. Does not commit.
    pub fn write_to_db(&mut self, tx: &Transaction<'_>) -> Result<()> {
        tx.execute_batch(APKG_SCHEMA)?;
        let now = Utc::now();
        for deck in &mut self.decks {
            deck.write_to_db(tx, now)?;
        }
        Ok(())
    }

    /// Write the full archive to `writer` and hand the writer back.
    ///
    /// The collection is built in a fresh temporary file that is removed on
    /// every exit path.
    pub fn write<W: Write + Seek>(&mut self, writer: W, media: Option<&mut dyn MediaFetcher>) -> Result<W> {
        let db_file = NamedTempFile::new().map_err(ApkgError::TempFile)?;
        self.write_collection(db_file.path())?;

        let mut zip = ZipWriter::new(writer);

        zip.start_file(COLLECTION_ENTRY, entry_options())?;
        let mut db = db_file.reopen().map_err(ApkgError::TempFile)?;
        io::copy(&mut db, &mut zip).map_err(ApkgError::ArchiveIo)?;

        let media_count = write_media(&mut zip, media)?;

        let writer = zip.finish()?;
        log::info!(
            "Assembled package with {} decks and {} media files",
            self.decks.len(),
            media_count
        );
        Ok(writer)
    }

    fn write_collection(&mut self, path: &Path) -> Result<()> {
        let mut conn = Connection::open(path)?;
        let tx = conn.transaction()?;
        self.write_to_db(&tx)?;
        tx.commit()?;
        conn.close().map_err(|(_, err)| err)?;
        Ok(())
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Write media payloads and the manifest. Without a fetcher the manifest is
/// `{}`. The fetcher is closed whether or not copying succeeds.
fn write_media<W: Write + Seek>(zip: &mut ZipWriter<W>, media: Option<&mut dyn MediaFetcher>) -> Result<usize> {
    let mut manifest: BTreeMap<String, String> = BTreeMap::new();

    if let Some(fetcher) = media {
        let copied = copy_media(zip, fetcher, &mut manifest);
        fetcher.close();
        copied?;
    }

    zip.start_file(MEDIA_MANIFEST_ENTRY, entry_options())?;
    zip.write_all(serde_json::to_string(&manifest)?.as_bytes())
        .map_err(ApkgError::ArchiveIo)?;

    Ok(manifest.len())
}

fn copy_media<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    fetcher: &mut dyn MediaFetcher,
    manifest: &mut BTreeMap<String, String>,
) -> Result<()> {
    let mut index = 0usize;
    while let Some(entry) = fetcher.next_entry()? {
        let archive_name = index.to_string();
        let options = entry_options().last_modified_time(zip_datetime(entry.modified));
        zip.start_file(archive_name.as_str(), options)?;
        io::copy(entry.reader, zip).map_err(ApkgError::ArchiveIo)?;

        log::debug!("Added media {} as {}", entry.name, archive_name);
        manifest.insert(archive_name, entry.name);
        index += 1;
    }
    Ok(())
}

/// Zip timestamps cannot represent dates before 1980; those fall back to the
/// format's epoch.
fn zip_datetime(ts: DateTime<Utc>) -> zip::DateTime {
    u16::try_from(ts.year())
        .ok()
        .and_then(|year| {
            zip::DateTime::from_date_and_time(
                year,
                ts.month() as u8,
                ts.day() as u8,
                ts.hour() as u8,
                ts.minute() as u8,
                ts.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_zip_datetime() {
        let ts = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 8).unwrap();
        let dt = zip_datetime(ts);
        assert_eq!(dt.year(), 2021);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.day(), 4);
        assert_eq!(dt.hour(), 5);
        assert_eq!(dt.minute(), 6);
    }

    #[test]
    fn test_zip_datetime_before_1980() {
        let ts = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(zip_datetime(ts), zip::DateTime::default());
    }
}
