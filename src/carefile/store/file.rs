use super::lock::PathLock;
use super::row::{Line, Row, DELIMITER};
use crate::error::{CarefileError, Result};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Row-level access to one Collection File.
///
/// Knows nothing about entities: rows go in and out as [`Row`]s, and the only
/// structure it relies on is the header line and the key in the first column.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    header: Vec<String>,
    lock: PathLock,
}

/// The header line as found in the file.
struct FileHeader {
    raw: Vec<u8>,
    names: Vec<String>,
}

impl FileHeader {
    fn line_ending(&self) -> &'static str {
        if self.raw.ends_with(b"\r\n") {
            "\r\n"
        } else {
            "\n"
        }
    }
}

/// Header and every data line as read in one pass.
struct Snapshot {
    header: Option<FileHeader>,
    /// Blank and unreadable lines included, so rewrites can copy them back.
    lines: Vec<Line>,
}

impl Snapshot {
    fn header_names(&self) -> Option<&[String]> {
        self.header.as_ref().map(|h| h.names.as_slice())
    }

    fn line_ending(&self) -> &'static str {
        self.header.as_ref().map_or("\n", FileHeader::line_ending)
    }

    /// Index into `lines` of the first readable row keyed `id`.
    fn position_of(&self, id: &str) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.row().is_some_and(|row| !row.is_blank() && row.key() == id))
    }
}

impl RecordStore {
    /// Opens the Collection File at `path`, creating it with `header` if absent.
    pub fn open<S: AsRef<str>>(path: impl Into<PathBuf>, header: &[S]) -> Result<Self> {
        let path = path.into();
        let header: Vec<String> = header.iter().map(|h| h.as_ref().to_string()).collect();
        create_with_header(&path, &header.join(","))?;

        let path = fs::canonicalize(&path)?;
        let lock = PathLock::for_path(&path);
        Ok(Self { path, header, lock })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The header this store was opened with.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Collection name used in error messages (the file stem).
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn header_line(&self) -> String {
        self.header.join(",")
    }

    /// Creates the file and its parent directory and writes the header, unless
    /// the file already exists. Returns whether the file was created.
    pub fn ensure_file(&self) -> Result<bool> {
        create_with_header(&self.path, &self.header_line())
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut chunks = content.split_inclusive(|b| *b == b'\n');
        let header = chunks.next().map(|raw| FileHeader {
            names: String::from_utf8_lossy(raw)
                .trim_end_matches(['\r', '\n'])
                .split(DELIMITER)
                .map(|h| h.trim().to_string())
                .collect(),
            raw: raw.to_vec(),
        });
        let lines = chunks
            .enumerate()
            .map(|(i, raw)| Line::parse(i + 2, raw))
            .collect();
        Ok(Snapshot { header, lines })
    }

    /// Readable, non-blank rows in file order. Unreadable lines are skipped
    /// with a warning.
    fn readable(&self, lines: Vec<Line>) -> Vec<Line> {
        lines
            .into_iter()
            .filter(|line| {
                if line.row().is_none() {
                    warn!(
                        "event=read module=store status=skipped collection={} line={} key={} error=invalid_utf8",
                        self.name(),
                        line.number(),
                        line.key()
                    );
                }
                line.row().is_some_and(|row| !row.is_blank())
            })
            .collect()
    }

    /// Every data row, header excluded, in file order.
    pub fn read_all(&self) -> Result<Vec<Row>> {
        let lines = self.snapshot()?.lines;
        Ok(self
            .readable(lines)
            .into_iter()
            .filter_map(Line::into_row)
            .collect())
    }

    /// Every non-blank data line, including lines that are not valid UTF-8.
    pub fn read_lines(&self) -> Result<Vec<Line>> {
        Ok(self
            .snapshot()?
            .lines
            .into_iter()
            .filter(|line| !line.is_blank())
            .collect())
    }

    /// Number of non-blank data lines, unreadable ones included.
    pub fn row_count(&self) -> Result<usize> {
        Ok(self.read_lines()?.len())
    }

    /// First row whose key equals `id`.
    pub fn read_by_key(&self, id: &str) -> Result<Option<Row>> {
        let snapshot = self.snapshot()?;
        let id = id.trim();
        Ok(snapshot
            .position_of(id)
            .and_then(|i| snapshot.lines.into_iter().nth(i))
            .and_then(Line::into_row))
    }

    /// Zero-based position of `column` in the file's header line.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        let snapshot = self.snapshot()?;
        self.resolve_column(snapshot.header_names(), column)
    }

    fn resolve_column(&self, file_header: Option<&[String]>, column: &str) -> Result<usize> {
        let header = file_header.unwrap_or(self.header.as_slice());
        let wanted = column.trim();
        header
            .iter()
            .position(|name| name == wanted)
            .ok_or_else(|| CarefileError::UnknownColumn {
                collection: self.name(),
                column: column.to_string(),
            })
    }

    fn scan_column(&self, column: &str, value: &str, first_only: bool) -> Result<Vec<Line>> {
        let snapshot = self.snapshot()?;
        let index = self.resolve_column(snapshot.header_names(), column)?;
        let value = value.trim();

        let mut found = Vec::new();
        for line in self.readable(snapshot.lines) {
            let Some(row) = line.row() else { continue };
            let matched = match row.field(index) {
                Some(field) => field.trim() == value,
                None => {
                    warn!(
                        "event=column_scan module=store status=skipped collection={} line={} column={} fields={}",
                        self.name(),
                        line.number(),
                        column,
                        row.field_count()
                    );
                    false
                }
            };
            if matched {
                found.push(line);
                if first_only {
                    break;
                }
            }
        }
        Ok(found)
    }

    /// First row (in file order) whose `column` equals `value`, both trimmed.
    pub fn find_by_column(&self, column: &str, value: &str) -> Result<Option<Row>> {
        Ok(self
            .scan_column(column, value, true)?
            .into_iter()
            .next()
            .and_then(Line::into_row))
    }

    /// Every row whose `column` equals `value`, both trimmed, in file order.
    ///
    /// Rows too short to have the column are skipped with a warning.
    pub fn find_all_by_column(&self, column: &str, value: &str) -> Result<Vec<Row>> {
        Ok(self
            .find_lines_by_column(column, value)?
            .into_iter()
            .filter_map(Line::into_row)
            .collect())
    }

    /// Same as [`find_all_by_column`](Self::find_all_by_column), keeping line numbers.
    pub fn find_lines_by_column(&self, column: &str, value: &str) -> Result<Vec<Line>> {
        self.scan_column(column, value, false)
    }

    /// Appends one row on its own line. Keys are not checked for duplicates.
    pub fn append(&self, row: &Row) -> Result<()> {
        self.append_all(std::slice::from_ref(row))
    }

    /// Appends rows in order with a single open of the file.
    ///
    /// Writes the header first when the file is empty, and starts a new line
    /// first when the last byte on disk is not a line break.
    pub fn append_all(&self, rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let _guard = self.lock.acquire();
        self.append_locked(rows)
    }

    /// Like [`append_all`](Self::append_all), but fails with `DuplicateId` when
    /// a key is already in the file or repeated within `rows`.
    ///
    /// The check and the append happen under one hold of the path lock.
    pub fn append_all_unique(&self, rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let _guard = self.lock.acquire();

        let mut seen: HashSet<String> = self
            .snapshot()?
            .lines
            .iter()
            .filter(|line| !line.is_blank())
            .map(Line::key)
            .collect();
        for row in rows {
            if !seen.insert(row.key().to_string()) {
                return Err(CarefileError::DuplicateId {
                    collection: self.name(),
                    id: row.key().to_string(),
                });
            }
        }
        self.append_locked(rows)
    }

    /// Callers must hold the path lock.
    fn append_locked(&self, rows: &[Row]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;

        let len = file.metadata()?.len();
        let mut out = String::new();
        let ending = if len == 0 {
            out.push_str(&self.header_line());
            out.push('\n');
            "\n"
        } else {
            let ending = line_ending_of(&mut file)?;
            if !ends_with_newline(&mut file, len)? {
                out.push_str(ending);
            }
            ending
        };
        for row in rows {
            out.push_str(row.as_str());
            out.push_str(ending);
        }

        file.write_all(out.as_bytes())?;
        file.flush()?;
        debug!(
            "event=append module=store status=ok collection={} rows={}",
            self.name(),
            rows.len()
        );
        Ok(())
    }

    /// Replaces every data line with `rows`. The header line is kept as it is
    /// in the file.
    pub fn write_all(&self, rows: &[Row]) -> Result<()> {
        let _guard = self.lock.acquire();
        let snapshot = self.snapshot()?;
        let ending = snapshot.line_ending();
        let mut body = Vec::new();
        for row in rows {
            body.extend_from_slice(row.as_str().as_bytes());
            body.extend_from_slice(ending.as_bytes());
        }
        self.rewrite(&snapshot, &body, rows.len())
    }

    /// Atomic rewrite: temp sibling file, then rename over the original.
    /// Callers must hold the path lock.
    fn rewrite(&self, snapshot: &Snapshot, body: &[u8], rows: usize) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut content = Vec::with_capacity(body.len() + 64);
        match &snapshot.header {
            Some(header) => {
                content.extend_from_slice(&header.raw);
                if !header.raw.ends_with(b"\n") && !body.is_empty() {
                    content.extend_from_slice(header.line_ending().as_bytes());
                }
            }
            None => {
                content.extend_from_slice(self.header_line().as_bytes());
                content.push(b'\n');
            }
        }
        content.extend_from_slice(body);

        let tmp_path = dir.join(format!(".{}-{}.tmp", self.name(), Uuid::new_v4()));
        fs::write(&tmp_path, content)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!(
            "event=rewrite module=store status=ok collection={} rows={}",
            self.name(),
            rows
        );
        Ok(())
    }

    /// Swaps the first row keyed `id` for `row` and rewrites the file.
    ///
    /// Every other line is written back byte for byte.
    pub fn replace_by_key(&self, id: &str, row: Row) -> Result<()> {
        let _guard = self.lock.acquire();
        let snapshot = self.snapshot()?;
        let id = id.trim();
        let position = snapshot.position_of(id).ok_or_else(|| self.not_found(id))?;

        let mut body = Vec::new();
        for (i, line) in snapshot.lines.iter().enumerate() {
            if i == position {
                body.extend_from_slice(row.as_str().as_bytes());
                body.extend_from_slice(line.terminator().as_bytes());
            } else {
                body.extend_from_slice(line.bytes());
            }
        }
        self.rewrite(&snapshot, &body, snapshot.lines.len())
    }

    /// Drops the first row keyed `id` and rewrites the file.
    ///
    /// The file is left untouched when no row matches.
    pub fn delete_by_key(&self, id: &str) -> Result<()> {
        let _guard = self.lock.acquire();
        let snapshot = self.snapshot()?;
        let id = id.trim();
        let position = snapshot.position_of(id).ok_or_else(|| self.not_found(id))?;

        let mut body = Vec::new();
        for (i, line) in snapshot.lines.iter().enumerate() {
            if i != position {
                body.extend_from_slice(line.bytes());
            }
        }
        self.rewrite(&snapshot, &body, snapshot.lines.len() - 1)
    }

    fn not_found(&self, id: &str) -> CarefileError {
        CarefileError::NotFound {
            collection: self.name(),
            id: id.to_string(),
        }
    }
}

fn create_with_header(path: &Path, header_line: &str) -> Result<bool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(format!("{}\n", header_line).as_bytes())?;
            info!(
                "event=collection_created module=store status=ok path={}",
                path.display()
            );
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// `"\r\n"` when the file's first line ends that way, else `"\n"`.
fn line_ending_of(file: &mut File) -> io::Result<&'static str> {
    file.seek(SeekFrom::Start(0))?;
    let mut first = Vec::new();
    BufReader::new(&mut *file).read_until(b'\n', &mut first)?;
    Ok(if first.ends_with(b"\r\n") { "\r\n" } else { "\n" })
}

fn ends_with_newline(file: &mut File, len: u64) -> io::Result<bool> {
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &[&str] = &["id", "name", "stock"];

    fn setup() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("data").join("stock.csv"), HEADER).unwrap();
        (dir, store)
    }

    fn on_disk(store: &RecordStore) -> String {
        fs::read_to_string(store.path()).unwrap()
    }

    #[test]
    fn open_creates_parent_dir_and_header() {
        let (_dir, store) = setup();
        assert_eq!(on_disk(&store), "id,name,stock\n");
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn ensure_file_never_rewrites_existing_content() {
        let (_dir, store) = setup();
        store.append(&Row::from("A,Aspirin,3")).unwrap();
        let before = on_disk(&store);

        assert!(!store.ensure_file().unwrap());
        assert!(!store.ensure_file().unwrap());
        assert_eq!(on_disk(&store), before);
    }

    #[test]
    fn append_keeps_order_and_single_trailing_newline() {
        let (_dir, store) = setup();
        store.append(&Row::from("A,Aspirin,3")).unwrap();
        store.append(&Row::from("B,Bisoprolol,9")).unwrap();

        assert_eq!(
            store.read_all().unwrap(),
            vec![Row::from("A,Aspirin,3"), Row::from("B,Bisoprolol,9")]
        );
        assert_eq!(on_disk(&store), "id,name,stock\nA,Aspirin,3\nB,Bisoprolol,9\n");
    }

    #[test]
    fn append_starts_new_line_when_file_lacks_trailing_newline() {
        let (_dir, store) = setup();
        fs::write(store.path(), "id,name,stock\nA,Aspirin,3").unwrap();

        store.append(&Row::from("B,Bisoprolol,9")).unwrap();
        assert_eq!(on_disk(&store), "id,name,stock\nA,Aspirin,3\nB,Bisoprolol,9\n");
    }

    #[test]
    fn append_writes_header_into_empty_file() {
        let (_dir, store) = setup();
        fs::write(store.path(), "").unwrap();

        store.append(&Row::from("A,Aspirin,3")).unwrap();
        assert_eq!(on_disk(&store), "id,name,stock\nA,Aspirin,3\n");
    }

    #[test]
    fn append_tolerates_duplicate_keys() {
        let (_dir, store) = setup();
        store
            .append_all(&[Row::from("A,Aspirin,3"), Row::from("A,Aspirin,4")])
            .unwrap();
        assert_eq!(store.row_count().unwrap(), 2);
        assert_eq!(
            store.read_by_key("A").unwrap(),
            Some(Row::from("A,Aspirin,3"))
        );
    }

    #[test]
    fn column_search_matches_trimmed_values_in_file_order() {
        let (_dir, store) = setup();
        fs::write(
            store.path(),
            "id,name,stock\nA,Aspirin,3\nB,Bisoprolol, 9\nC,Codeine,9\n\nD\nE,Ephedrine,1\n",
        )
        .unwrap();

        let all = store.read_all().unwrap();
        let expected: Vec<Row> = all
            .iter()
            .filter(|r| r.field(2).map(str::trim) == Some("9"))
            .cloned()
            .collect();

        let found = store.find_all_by_column("stock", "9").unwrap();
        assert_eq!(found, expected);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].key(), "B");

        assert_eq!(
            store.find_by_column("stock", "9").unwrap().map(|r| r.key().to_string()),
            Some("B".to_string())
        );
        assert!(store.find_by_column("stock", "42").unwrap().is_none());
    }

    #[test]
    fn column_search_uses_file_header() {
        let (_dir, store) = setup();
        fs::write(store.path(), "id,stock,name\nA,3,Aspirin\n").unwrap();
        assert_eq!(store.column_index("name").unwrap(), 2);
        assert_eq!(store.find_all_by_column("name", "Aspirin").unwrap().len(), 1);
    }

    #[test]
    fn unknown_column_is_reported_distinctly() {
        let (_dir, store) = setup();
        let err = store.find_all_by_column("colour", "red").unwrap_err();
        assert!(matches!(
            err,
            CarefileError::UnknownColumn { ref column, .. } if column == "colour"
        ));
    }

    #[test]
    fn write_all_replaces_content_and_leaves_no_temp_files() {
        let (_dir, store) = setup();
        store.append(&Row::from("A,Aspirin,3")).unwrap();
        store
            .write_all(&[Row::from("C,Codeine,1"), Row::from("B,Bisoprolol,2")])
            .unwrap();

        assert_eq!(on_disk(&store), "id,name,stock\nC,Codeine,1\nB,Bisoprolol,2\n");
        for entry in fs::read_dir(store.path().parent().unwrap()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            assert!(!name.ends_with(".tmp"), "leftover temp file: {}", name);
        }
    }

    #[test]
    fn replace_by_key_touches_only_target_row() {
        let (_dir, store) = setup();
        fs::write(
            store.path(),
            "id,name,stock\nA,Aspirin,3\nB,Bisoprolol,9\nC, Codeine ,1\n",
        )
        .unwrap();

        store.replace_by_key("B", Row::from("B,Bisoprolol,5")).unwrap();
        assert_eq!(
            on_disk(&store),
            "id,name,stock\nA,Aspirin,3\nB,Bisoprolol,5\nC, Codeine ,1\n"
        );
    }

    #[test]
    fn delete_by_key_removes_one_row() {
        let (_dir, store) = setup();
        store
            .append_all(&[Row::from("A,Aspirin,3"), Row::from("B,Bisoprolol,9")])
            .unwrap();

        store.delete_by_key("A").unwrap();
        assert_eq!(store.read_all().unwrap(), vec![Row::from("B,Bisoprolol,9")]);
    }

    #[test]
    fn delete_missing_key_leaves_file_unchanged() {
        let (_dir, store) = setup();
        store.append(&Row::from("A,Aspirin,3")).unwrap();
        let before = on_disk(&store);

        let err = store.delete_by_key("Z").unwrap_err();
        assert!(matches!(err, CarefileError::NotFound { ref id, .. } if id == "Z"));
        assert_eq!(on_disk(&store), before);
    }

    #[test]
    fn rewrites_keep_the_header_line_found_in_the_file() {
        let (_dir, store) = setup();
        fs::write(store.path(), "id , name,stock,legacy\nA,Aspirin,3,x\nB,Bisoprolol,9,y\n").unwrap();

        store.replace_by_key("A", Row::from("A,Aspirin,4,x")).unwrap();
        store.delete_by_key("B").unwrap();
        assert_eq!(on_disk(&store), "id , name,stock,legacy\nA,Aspirin,4,x\n");
        assert_eq!(store.column_index("legacy").unwrap(), 3);

        store.write_all(&[Row::from("C,Codeine,1,z")]).unwrap();
        assert_eq!(on_disk(&store), "id , name,stock,legacy\nC,Codeine,1,z\n");
    }

    #[test]
    fn rewrites_keep_crlf_endings_and_blank_lines() {
        let (_dir, store) = setup();
        fs::write(
            store.path(),
            "id,name,stock\r\nA,Aspirin,3\r\n\r\nB,Bisoprolol,9\r\n\nC,Codeine,1",
        )
        .unwrap();

        store.replace_by_key("B", Row::from("B,Bisoprolol,5")).unwrap();
        assert_eq!(
            on_disk(&store),
            "id,name,stock\r\nA,Aspirin,3\r\n\r\nB,Bisoprolol,5\r\n\nC,Codeine,1"
        );

        store.delete_by_key("A").unwrap();
        assert_eq!(
            on_disk(&store),
            "id,name,stock\r\n\r\nB,Bisoprolol,5\r\n\nC,Codeine,1"
        );

        store.append(&Row::from("D,Diazepam,2")).unwrap();
        assert!(on_disk(&store).ends_with("C,Codeine,1\r\nD,Diazepam,2\r\n"));
        assert_eq!(store.row_count().unwrap(), 3);
    }

    #[test]
    fn a_line_with_invalid_utf8_does_not_hide_the_others() {
        let (_dir, store) = setup();
        let mut content = b"id,name,stock\nA,Aspirin,3\nB,Caf".to_vec();
        content.extend_from_slice(b"\xe9ine,2\nC,Codeine,1\n");
        fs::write(store.path(), &content).unwrap();

        let keys: Vec<String> = store
            .read_all()
            .unwrap()
            .iter()
            .map(|r| r.key().to_string())
            .collect();
        assert_eq!(keys, vec!["A", "C"]);
        assert_eq!(store.find_all_by_column("stock", "1").unwrap().len(), 1);

        let lines = store.read_lines().unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].row().is_none());
        assert_eq!(lines[1].number(), 3);
        assert_eq!(lines[1].key(), "B");

        store.delete_by_key("C").unwrap();
        let kept = &content[..content.len() - "C,Codeine,1\n".len()];
        assert_eq!(fs::read(store.path()).unwrap(), kept);
    }

    #[test]
    fn append_unique_rejects_keys_on_disk_and_in_the_batch() {
        let (_dir, store) = setup();
        store.append(&Row::from("A,Aspirin,3")).unwrap();

        let err = store
            .append_all_unique(&[Row::from("B,Bisoprolol,9"), Row::from(" A ,Aspirin,4")])
            .unwrap_err();
        assert!(matches!(err, CarefileError::DuplicateId { ref id, .. } if id == "A"));

        let err = store
            .append_all_unique(&[Row::from("B,Bisoprolol,9"), Row::from("B,Bisoprolol,1")])
            .unwrap_err();
        assert!(matches!(err, CarefileError::DuplicateId { ref id, .. } if id == "B"));
        assert_eq!(store.row_count().unwrap(), 1);

        store.append_all_unique(&[Row::from("B,Bisoprolol,9")]).unwrap();
        assert_eq!(store.row_count().unwrap(), 2);
    }

    #[test]
    fn stores_on_same_path_share_lock() {
        let (dir, store) = setup();
        let other = RecordStore::open(dir.path().join("data/./stock.csv"), HEADER).unwrap();
        assert!(store.lock.same_as(&other.lock));
        other.append(&Row::from("A,Aspirin,3")).unwrap();
        assert_eq!(store.row_count().unwrap(), 1);
    }
}
