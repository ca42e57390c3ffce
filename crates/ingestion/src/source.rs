//! Session sources: where the replay engine gets its rows from.
//!
//! A source is an ordered list of sessions (one trading day each). Opening a
//! session yields its rows in file order; the engine pulls them one at a time.
//!
//! - [`ZipArchiveSource`]: one CSV member per session inside a zip archive
//! - [`DirectorySource`]: sorted `*.csv` files in a directory
//! - [`VecSource`]: in-memory sessions, for tests and embedded backtests

use crate::parser::RowParser;
use lobsim_core::config::FeedLayout;
use lobsim_core::{Error, RawRecord, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Rows of one opened session, in file order.
pub type SessionRows = Box<dyn Iterator<Item = Result<RawRecord>> + Send>;

/// An ordered collection of replayable sessions.
pub trait SessionSource {
    /// Number of sessions available.
    fn session_count(&self) -> usize;

    /// Identifier of a session (archive member or file name).
    fn session_name(&self, index: usize) -> Option<String>;

    /// Open a session and return its rows.
    fn open_session(&mut self, index: usize) -> Result<SessionRows>;
}

impl<S: SessionSource + ?Sized> SessionSource for Box<S> {
    fn session_count(&self) -> usize {
        (**self).session_count()
    }

    fn session_name(&self, index: usize) -> Option<String> {
        (**self).session_name(index)
    }

    fn open_session(&mut self, index: usize) -> Result<SessionRows> {
        (**self).open_session(index)
    }
}

/// Streaming CSV rows parsed into records.
struct CsvRows<R: Read> {
    reader: csv::Reader<R>,
    parser: RowParser,
    record: csv::StringRecord,
}

impl<R: Read> CsvRows<R> {
    fn new(reader: R, layout: &FeedLayout) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();
        let parser = RowParser::from_headers(&headers, layout)?;
        Ok(Self {
            reader,
            parser,
            record: csv::StringRecord::new(),
        })
    }
}

impl<R: Read> Iterator for CsvRows<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(self.parser.parse(&self.record)),
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// Sessions stored as CSV members of a zip archive, in archive order.
pub struct ZipArchiveSource {
    path: PathBuf,
    archive: zip::ZipArchive<BufReader<File>>,
    /// Archive indices and names of the file members.
    members: Vec<(usize, String)>,
    layout: FeedLayout,
}

impl ZipArchiveSource {
    /// Open an archive. Directory entries are skipped.
    pub fn open(path: impl AsRef<Path>, layout: FeedLayout) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let archive_name = path.display().to_string();

        let file = File::open(&path).map_err(|e| Error::archive_open(archive_name.clone(), e))?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| Error::archive_open(archive_name.clone(), e))?;

        let mut members = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| Error::archive_open(archive_name.clone(), e))?;
            if !entry.is_dir() {
                members.push((i, entry.name().to_string()));
            }
        }

        debug!(archive = %archive_name, sessions = members.len(), "opened archive");

        Ok(Self {
            path,
            archive,
            members,
            layout,
        })
    }
}

impl SessionSource for ZipArchiveSource {
    fn session_count(&self) -> usize {
        self.members.len()
    }

    fn session_name(&self, index: usize) -> Option<String> {
        self.members.get(index).map(|(_, name)| name.clone())
    }

    fn open_session(&mut self, index: usize) -> Result<SessionRows> {
        let (archive_idx, name) = self
            .members
            .get(index)
            .cloned()
            .ok_or_else(|| Error::archive_open(self.path.display().to_string(), format!("no session {index}")))?;
        let member = format!("{}!{}", self.path.display(), name);

        // Members borrow the archive, so buffer the session in memory.
        let mut bytes = Vec::new();
        {
            let mut entry = self
                .archive
                .by_index(archive_idx)
                .map_err(|e| Error::archive_open(member.clone(), e))?;
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| Error::archive_open(member.clone(), e))?;
        }

        let rows = CsvRows::new(Cursor::new(bytes), &self.layout)
            .map_err(|e| Error::archive_open(member, e))?;
        Ok(Box::new(rows))
    }
}

/// Sessions stored as `*.csv` files in one directory, in file name order.
pub struct DirectorySource {
    files: Vec<PathBuf>,
    layout: FeedLayout,
}

impl DirectorySource {
    /// Scan a directory for session files.
    pub fn open(dir: impl AsRef<Path>, layout: FeedLayout) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::archive_open(dir.display().to_string(), e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if path.is_file() && is_csv {
                files.push(path);
            }
        }
        files.sort();

        Ok(Self { files, layout })
    }
}

impl SessionSource for DirectorySource {
    fn session_count(&self) -> usize {
        self.files.len()
    }

    fn session_name(&self, index: usize) -> Option<String> {
        let path = self.files.get(index)?;
        path.file_name().map(|n| n.to_string_lossy().into_owned())
    }

    fn open_session(&mut self, index: usize) -> Result<SessionRows> {
        let path = self
            .files
            .get(index)
            .ok_or_else(|| Error::archive_open(format!("session #{index}"), "no such session"))?;
        let file_name = path.display().to_string();

        let file = File::open(path).map_err(|e| Error::archive_open(file_name.clone(), e))?;
        let rows = CsvRows::new(BufReader::new(file), &self.layout)
            .map_err(|e| Error::archive_open(file_name, e))?;
        Ok(Box::new(rows))
    }
}

/// In-memory sessions.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    sessions: Vec<(String, Vec<RawRecord>)>,
}

impl VecSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a session.
    pub fn with_session(mut self, name: impl Into<String>, records: Vec<RawRecord>) -> Self {
        self.sessions.push((name.into(), records));
        self
    }
}

impl SessionSource for VecSource {
    fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn session_name(&self, index: usize) -> Option<String> {
        self.sessions.get(index).map(|(name, _)| name.clone())
    }

    fn open_session(&mut self, index: usize) -> Result<SessionRows> {
        let (_, records) = self
            .sessions
            .get(index)
            .ok_or_else(|| Error::archive_open(format!("session #{index}"), "no such session"))?;
        Ok(Box::new(records.clone().into_iter().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobsim_core::RecordKind;
    use std::io::Write;

    const DAY_ONE: &str = ",Date,Type,Price,Size\n\
        0,2016-08-01 10:00:00,BID,12.00,100\n\
        1,2016-08-01 10:00:00,ASK,12.02,200\n\
        2,2016-08-01 10:00:04,TRADE,12.02,50\n";

    const DAY_TWO: &str = ",Date,Type,Price,Size\n\
        0,2016-08-02 10:00:00,BID,12.10,300\n";

    fn collect(rows: SessionRows) -> Vec<RawRecord> {
        rows.collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_vec_source() {
        let record = RawRecord {
            row: 0,
            seconds: 36_000,
            price: 10.0,
            size: 1,
            kind: RecordKind::Bid,
        };
        let mut source = VecSource::new()
            .with_session("a", vec![record.clone()])
            .with_session("b", vec![]);

        assert_eq!(source.session_count(), 2);
        assert_eq!(source.session_name(1).as_deref(), Some("b"));
        assert_eq!(collect(source.open_session(0).unwrap()), vec![record]);
        assert!(source.open_session(2).is_err());
    }

    #[test]
    fn test_directory_source_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20160802.csv"), DAY_TWO).unwrap();
        std::fs::write(dir.path().join("20160801.csv"), DAY_ONE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = DirectorySource::open(dir.path(), FeedLayout::default()).unwrap();
        assert_eq!(source.session_count(), 2);
        assert_eq!(source.session_name(0).as_deref(), Some("20160801.csv"));

        let rows = collect(source.open_session(0).unwrap());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].kind, RecordKind::Trade);
        assert_eq!(rows[2].seconds, 36_004);
        assert_eq!(rows[2].size, 50);
    }

    #[test]
    fn test_zip_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.zip");
        {
            let file = File::create(&path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::FileOptions::default();
            writer.add_directory("raw/", options).unwrap();
            writer.start_file("raw/20160801.csv", options).unwrap();
            writer.write_all(DAY_ONE.as_bytes()).unwrap();
            writer.start_file("raw/20160802.csv", options).unwrap();
            writer.write_all(DAY_TWO.as_bytes()).unwrap();
            writer.finish().unwrap();
        }

        let mut source = ZipArchiveSource::open(&path, FeedLayout::default()).unwrap();
        assert_eq!(source.session_count(), 2);
        assert_eq!(source.session_name(1).as_deref(), Some("raw/20160802.csv"));

        let rows = collect(source.open_session(1).unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].size, 300);
    }

    #[test]
    fn test_missing_archive() {
        let err = ZipArchiveSource::open("/nonexistent/feed.zip", FeedLayout::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::ArchiveOpen { .. }));
    }
}
