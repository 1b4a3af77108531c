use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use wb_crypto::SnapshotHasher;
use wb_types::Snapshot;

use crate::config::SyncMode;
use crate::error::{LedgerError, Result};
use crate::tx::Tx;

/// Record separator between encoded transactions.
pub const RECORD_SEPARATOR: u8 = b'\n';

/// One decoded line of the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    /// 1-based line number.
    pub line: u64,
    pub tx: Tx,
}

/// Append-only, newline-delimited transaction log.
///
/// On-disk format, one record per line:
/// ```text
/// {"from":"andrej","to":"babayaga","value":2000,"data":""}\n
/// ```
/// The file is opened once for read + append. Appends always land at the end
/// of the file; reads seek the shared handle back to byte 0 first.
pub struct TxLog {
    path: PathBuf,
    file: File,
    /// Current file length, i.e. the offset of the next record.
    len: u64,
    sync_mode: SyncMode,
}

impl TxLog {
    /// Open an existing log. A missing file is an error; logs are never
    /// created implicitly.
    pub fn open(path: &Path, sync_mode: SyncMode) -> Result<Self> {
        let file = OpenOptions::new().read(true).append(true).open(path)?;
        Self::from_file(path, file, sync_mode)
    }

    /// Create the log (and its parent directory) if absent, then open it.
    pub fn create(path: &Path, sync_mode: SyncMode) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        Self::from_file(path, file, sync_mode)
    }

    fn from_file(path: &Path, file: File, sync_mode: SyncMode) -> Result<Self> {
        let len = file.metadata()?.len();
        let mut log = Self {
            path: path.to_path_buf(),
            file,
            len,
            sync_mode,
        };
        if !log.ends_with_separator()? {
            warn!(path = %path.display(), "log does not end with a record separator");
        }
        debug!(path = %path.display(), len, "log opened");
        Ok(log)
    }

    fn ends_with_separator(&mut self) -> Result<bool> {
        if self.len == 0 {
            return Ok(true);
        }
        let mut last = [0u8; 1];
        self.file.seek(SeekFrom::Start(self.len - 1))?;
        self.file.read_exact(&mut last)?;
        Ok(last[0] == RECORD_SEPARATOR)
    }

    /// Append one record. Returns the byte offset at which it starts.
    pub fn append(&mut self, tx: &Tx) -> Result<u64> {
        let mut record = tx.encode()?;
        record.push(RECORD_SEPARATOR);

        let offset = self.len;
        if let Err(e) = self.write_record(&record) {
            // Part of the record may have landed.
            self.len = self.file.metadata().map_or(self.len, |m| m.len());
            warn!(offset, len = self.len, error = %e, "log append failed");
            return Err(e.into());
        }
        self.len += record.len() as u64;

        debug!(offset, len = record.len(), "log append");
        Ok(offset)
    }

    fn write_record(&mut self, record: &[u8]) -> std::io::Result<()> {
        self.file.write_all(record)?;
        self.file.flush()?;
        if matches!(self.sync_mode, SyncMode::EveryWrite) {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Lazily decode every record from the start of the file.
    ///
    /// The iterator is single-pass and stops after the first error.
    pub fn records(&mut self) -> Result<LogRecords<'_>> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(LogRecords {
            reader: BufReader::new(&self.file),
            line: 0,
            done: false,
        })
    }

    /// Re-read the whole file and hash it.
    pub fn digest(&mut self) -> Result<Snapshot> {
        self.file.seek(SeekFrom::Start(0))?;
        let snapshot = SnapshotHasher::digest_reader(&self.file)?;
        Ok(snapshot)
    }

    /// Force appended data to stable storage.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Single-pass reader over the records of a [`TxLog`].
pub struct LogRecords<'a> {
    reader: BufReader<&'a File>,
    line: u64,
    done: bool,
}

impl LogRecords<'_> {
    fn read_record(&mut self) -> Result<Option<LogRecord>> {
        let mut buf = Vec::new();
        if self.reader.read_until(RECORD_SEPARATOR, &mut buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;

        if buf.last() == Some(&RECORD_SEPARATOR) {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }

        let tx = Tx::decode(&buf).map_err(|e| LedgerError::TxParse {
            line: self.line,
            reason: e.to_string(),
        })?;
        Ok(Some(LogRecord {
            line: self.line,
            tx,
        }))
    }
}

impl Iterator for LogRecords<'_> {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_log(dir: &tempfile::TempDir) -> TxLog {
        TxLog::create(&dir.path().join("tx.db"), SyncMode::default()).unwrap()
    }

    #[test]
    fn open_missing_log_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx.db");
        let err = TxLog::open(&path, SyncMode::default()).err().unwrap();
        assert!(matches!(err, LedgerError::Io(e) if e.kind() == std::io::ErrorKind::NotFound));
        assert!(!path.exists());
    }

    #[test]
    fn create_makes_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database").join("tx.db");
        let log = TxLog::create(&path, SyncMode::default()).unwrap();
        assert!(path.exists());
        assert!(log.is_empty());
    }

    #[test]
    fn append_then_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = new_log(&dir);

        let txs = [
            Tx::new("andrej", "babayaga", 2000),
            Tx::reward("andrej", 100),
            Tx::new("babayaga", "ceo", 1),
        ];
        for tx in &txs {
            log.append(tx).unwrap();
        }

        let records: Vec<LogRecord> = log.records().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 3);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.line, i as u64 + 1);
            assert_eq!(record.tx, txs[i]);
        }
    }

    #[test]
    fn append_returns_increasing_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = new_log(&dir);

        let off1 = log.append(&Tx::new("a", "b", 1)).unwrap();
        let off2 = log.append(&Tx::new("a", "b", 2)).unwrap();
        assert_eq!(off1, 0);
        assert!(off2 > off1);
        assert_eq!(log.len(), fs::metadata(log.path()).unwrap().len());
    }

    #[test]
    fn digest_covers_exact_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = new_log(&dir);
        assert_eq!(log.digest().unwrap(), SnapshotHasher::digest(b""));

        log.append(&Tx::new("A", "B", 30)).unwrap();
        let on_disk = fs::read(log.path()).unwrap();
        assert_eq!(on_disk, b"{\"from\":\"A\",\"to\":\"B\",\"value\":30,\"data\":\"\"}\n");
        assert_eq!(log.digest().unwrap(), SnapshotHasher::digest(&on_disk));
    }

    #[test]
    fn append_after_read_still_lands_at_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = new_log(&dir);
        log.append(&Tx::new("a", "b", 1)).unwrap();
        log.digest().unwrap();
        let _ = log.records().unwrap().count();
        log.append(&Tx::new("a", "b", 2)).unwrap();

        let values: Vec<u64> = log
            .records()
            .unwrap()
            .map(|r| r.unwrap().tx.value)
            .collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn malformed_line_stops_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx.db");
        fs::write(
            &path,
            "{\"from\":\"a\",\"to\":\"b\",\"value\":1,\"data\":\"\"}\n\
             garbage\n\
             {\"from\":\"a\",\"to\":\"b\",\"value\":2,\"data\":\"\"}\n",
        )
        .unwrap();
        let mut log = TxLog::open(&path, SyncMode::default()).unwrap();

        let mut records = log.records().unwrap();
        assert!(records.next().unwrap().is_ok());
        let err = records.next().unwrap().unwrap_err();
        assert!(matches!(err, LedgerError::TxParse { line: 2, .. }));
        assert!(records.next().is_none());
    }

    #[test]
    fn blank_line_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx.db");
        fs::write(&path, "\n").unwrap();
        let mut log = TxLog::open(&path, SyncMode::default()).unwrap();

        let first = log.records().unwrap().next().unwrap();
        assert!(matches!(first, Err(LedgerError::TxParse { line: 1, .. })));
    }

    #[test]
    fn tolerates_crlf_and_missing_final_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx.db");
        fs::write(
            &path,
            "{\"from\":\"a\",\"to\":\"b\",\"value\":1}\r\n{\"from\":\"a\",\"to\":\"b\",\"value\":2}",
        )
        .unwrap();
        let mut log = TxLog::open(&path, SyncMode::default()).unwrap();

        let values: Vec<u64> = log
            .records()
            .unwrap()
            .map(|r| r.unwrap().tx.value)
            .collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_append_resyncs_length_with_file() {
        let mut log = TxLog::open(Path::new("/dev/full"), SyncMode::default()).unwrap();
        let err = log.append(&Tx::new("a", "b", 1)).unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
        assert_eq!(log.len(), fs::metadata("/dev/full").unwrap().len());
    }

    #[test]
    fn every_write_sync_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = TxLog::create(&dir.path().join("tx.db"), SyncMode::EveryWrite).unwrap();
        log.append(&Tx::new("a", "b", 1)).unwrap();
        log.sync().unwrap();
        assert_eq!(log.records().unwrap().count(), 1);
    }
}
