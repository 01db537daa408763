//! CsvDrawStore - `Name,Date` ヘッダーの CSV ファイルを正本にする
//!
//! # 実装詳細
//! - ブロッキング I/O は spawn_blocking で実行
//! - 書き込みは一時ファイル + rename で置き換え（途中状態が見えない）
//! - 壊れた行はスキップしてログに出すが、書き戻し時はそのまま残す
//! - id はデータ行の位置（1 始まり）

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use csv::ByteRecord;
use tempfile::NamedTempFile;

use crate::domain::{CorruptRecord, DrawRecord, Name, RecordId, RecordScan, StoreError};
use crate::ports::DrawStore;

const HEADER: [&str; 2] = ["Name", "Date"];

/// Timestamp layouts accepted besides RFC 3339; interpreted as UTC.
const LEGACY_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// CsvDrawStore は 1 行 1 記録の CSV ファイル
pub struct CsvDrawStore {
    path: PathBuf,
    /// Serializes read-modify-write of the file within this process.
    lock: Arc<Mutex<()>>,
}

impl CsvDrawStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_file<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        let lock = self.lock.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            op(&path)
        })
        .await?
    }

    async fn scan(&self) -> Result<RecordScan, StoreError> {
        self.with_file(|path| {
            let rows = read_rows(path)?;
            Ok(parse_rows(path, &rows))
        })
        .await
    }
}

#[async_trait]
impl DrawStore for CsvDrawStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        self.with_file(|path| {
            if path.exists() {
                return Ok(());
            }
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            write_rows(path, &[])?;
            tracing::debug!(path = %path.display(), "created draw file");
            Ok(())
        })
        .await
    }

    async fn load_all(&self) -> Result<Vec<DrawRecord>, StoreError> {
        Ok(self.scan().await?.records)
    }

    async fn used_names(&self) -> Result<Vec<Name>, StoreError> {
        Ok(self.scan().await?.used_names())
    }

    async fn append(&self, name: &Name, at: DateTime<Utc>) -> Result<DrawRecord, StoreError> {
        let name = name.clone();
        self.with_file(move |path| {
            let mut rows = read_rows(path)?;
            rows.push(ByteRecord::from(vec![
                name.as_str().to_string(),
                format_timestamp(at),
            ]));
            write_rows(path, &rows)?;
            let id = RecordId::new(rows.len() as i64);
            Ok(DrawRecord::new(id, name, at))
        })
        .await
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.with_file(|path| write_rows(path, &[])).await
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    LEGACY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Raw data rows, header excluded. A missing file reads as empty.
fn read_rows(path: &Path) -> Result<Vec<ByteRecord>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for (i, row) in reader.byte_records().enumerate() {
        let row = row?;
        if i == 0 && is_header(&row) {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

fn is_header(row: &ByteRecord) -> bool {
    row.len() == HEADER.len()
        && row
            .iter()
            .zip(HEADER)
            .all(|(field, expected)| field == expected.as_bytes())
}

fn parse_rows(path: &Path, rows: &[ByteRecord]) -> RecordScan {
    RecordScan::collect(
        rows.iter()
            .enumerate()
            .map(|(index, row)| parse_row(path, index, row)),
    )
}

/// First field as a name, if it is UTF-8 and not blank.
fn readable_name(row: &ByteRecord) -> Option<Name> {
    row.get(0)
        .and_then(|field| std::str::from_utf8(field).ok())
        .filter(|name| !name.trim().is_empty())
        .map(Name::from)
}

fn parse_row(path: &Path, index: usize, row: &ByteRecord) -> Result<DrawRecord, CorruptRecord> {
    let line = row.position().map(|p| p.line()).unwrap_or(index as u64 + 2);
    let location = format!("{}:{}", path.display(), line);
    let name = readable_name(row);

    if row.len() != HEADER.len() {
        let reason = format!("expected {} fields, found {}", HEADER.len(), row.len());
        return Err(CorruptRecord::new(location, reason).with_name(name));
    }
    let Some(name) = name else {
        let reason = match std::str::from_utf8(&row[0]) {
            Ok(_) => "name is blank",
            Err(_) => "name is not valid UTF-8",
        };
        return Err(CorruptRecord::new(location, reason));
    };
    let Some(date) = std::str::from_utf8(&row[1]).ok() else {
        return Err(CorruptRecord::new(location, "date is not valid UTF-8").with_name(Some(name)));
    };
    let Some(drawn_at) = parse_timestamp(date) else {
        let reason = format!("unparseable timestamp {date:?}");
        return Err(CorruptRecord::new(location, reason).with_name(Some(name)));
    };

    Ok(DrawRecord::new(RecordId::new(index as i64 + 1), name, drawn_at))
}

/// Replace the file with `HEADER` + `rows` in one rename.
fn write_rows(path: &Path, rows: &[ByteRecord]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(tmp.as_file_mut());
        writer.write_record(HEADER)?;
        for row in rows {
            writer.write_byte_record(row)?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn store_in(dir: &TempDir) -> CsvDrawStore {
        CsvDrawStore::new(dir.path().join("used_names.csv"))
    }

    #[tokio::test]
    async fn initialize_writes_header_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.initialize().await.unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "Name,Date\n");

        store.append(&Name::from("Alice"), t0()).await.unwrap();
        store.initialize().await.unwrap();
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn initialize_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = CsvDrawStore::new(dir.path().join("nested/deeper/used.csv"));
        store.initialize().await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appended_records_survive_a_new_store_instance() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().await.unwrap();
        let alice = store.append(&Name::from("Alice"), t0()).await.unwrap();
        let bob = store
            .append(&Name::from("Bob"), t0() + Duration::nanoseconds(1_234_567))
            .await
            .unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.load_all().await.unwrap(), vec![alice, bob]);
    }

    #[tokio::test]
    async fn file_layout_is_name_then_date() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(&Name::from("Alice"), t0()).await.unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents, "Name,Date\nAlice,2024-05-01T09:30:00Z\n");
    }

    #[tokio::test]
    async fn names_with_delimiters_are_quoted_and_read_back() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(&Name::from("Smith, Jo"), t0()).await.unwrap();

        let records = store.load_all().await.unwrap();
        assert_eq!(records[0].name, "Smith, Jo");
    }

    #[tokio::test]
    async fn clear_all_keeps_only_the_header() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(&Name::from("Alice"), t0()).await.unwrap();
        store.clear_all().await.unwrap();
        store.clear_all().await.unwrap();

        assert!(store.load_all().await.unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "Name,Date\n");
    }

    #[tokio::test]
    async fn corrupt_rows_are_skipped_but_preserved() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            "Name,Date\nAlice,2024-05-01 09:00:00\nBob,yesterday\nCarol\n",
        )
        .unwrap();

        let records = store.load_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].id, RecordId::new(1));

        let dave = store.append(&Name::from("Dave"), t0()).await.unwrap();
        assert_eq!(dave.id, RecordId::new(4));
        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("Bob,yesterday"));
        assert!(contents.contains("Carol"));
    }

    #[tokio::test]
    async fn corrupt_rows_with_a_readable_name_still_count_as_used() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            "Name,Date\nAlice,not-a-date\nBob,2024-05-01T09:00:00Z\n,2024-05-01T09:00:00Z\n",
        )
        .unwrap();

        assert_eq!(store.load_all().await.unwrap().len(), 1);
        assert_eq!(
            store.used_names().await.unwrap(),
            vec![Name::from("Bob"), Name::from("Alice")]
        );
    }

    #[tokio::test]
    async fn ids_are_unique_among_live_rows_and_restart_after_clear() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let alice = store.append(&Name::from("Alice"), t0()).await.unwrap();
        let bob = store.append(&Name::from("Bob"), t0()).await.unwrap();
        assert!(bob.id > alice.id);

        store.clear_all().await.unwrap();
        let again = store.append(&Name::from("Alice"), t0()).await.unwrap();
        assert_eq!(again.id, RecordId::new(1));
        assert_eq!(store.load_all().await.unwrap(), vec![again]);
    }

    #[tokio::test]
    async fn headerless_file_keeps_its_first_row() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "Alice,2024-05-01T09:00:00Z\n").unwrap();

        let records = store.load_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Alice");
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(&Name::from("Alice"), t0()).await.unwrap();
        store
            .append(&Name::from("Bob"), t0() + Duration::minutes(1))
            .await
            .unwrap();

        let names: Vec<String> = store
            .load_history()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name.to_string())
            .collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[tokio::test]
    async fn unwritable_location_reports_unavailable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let store = CsvDrawStore::new(blocker.join("used.csv"));

        let err = store.append(&Name::from("Alice"), t0()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[rstest]
    #[case::rfc3339_utc("2024-05-01T09:30:00Z")]
    #[case::rfc3339_offset("2024-05-01T11:30:00+02:00")]
    #[case::pandas_style("2024-05-01 09:30:00")]
    #[case::pandas_fraction("2024-05-01 09:30:00.000000")]
    #[case::iso_naive("2024-05-01T09:30:00")]
    fn accepted_timestamp_layouts(#[case] raw: &str) {
        assert_eq!(parse_timestamp(raw), Some(t0()));
    }

    #[rstest]
    #[case::words("yesterday")]
    #[case::empty("")]
    #[case::date_only("2024-05-01")]
    fn rejected_timestamp_layouts(#[case] raw: &str) {
        assert_eq!(parse_timestamp(raw), None);
    }
}
