mod schema;

use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use crate::{definitions::DB_BUSY_TIMEOUT, error::StoreError, scene_extract::SceneBreak};

pub type FileId = i64;

/// One ingested video file. `fps` and `duration_secs` come from the probe
/// at ingest time; `fix-metadata` is the only operation that updates them.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FileRecord {
    pub id: FileId,
    pub path: PathBuf,
    pub fps: f64,
    pub duration_secs: f64,
}

/// What a purge found (and, when not a dry run, removed).
#[derive(Debug, Clone, Default)]
pub struct PurgeReport {
    /// File records whose path is no longer readable on disk.
    pub missing_files: Vec<FileRecord>,
    /// Fingerprint/brightness rows whose file record no longer exists.
    pub orphan_rows: usize,
    /// Whitelist pairs referencing a removed file id.
    pub stale_whitelist_pairs: usize,
}

/// SQLite-backed store for file records, brightness samples, scene
/// fingerprints, and the whitelist.
///
/// All multi-statement operations run in a transaction: a reader never
/// observes a partially-ingested file. Contention with other processes is
/// absorbed by a large busy timeout rather than surfaced as an error.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::configure(conn)
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(DB_BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    ////////////////////////////////////////////////////////////////////////
    // Files
    ////////////////////////////////////////////////////////////////////////

    pub fn is_ingested(&self, path: &Path) -> Result<bool, StoreError> {
        Ok(self.lookup_id(path)?.is_some())
    }

    pub fn lookup_id(&self, path: &Path) -> Result<Option<FileId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM filenames WHERE name = ?1",
                params![path.to_string_lossy()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Insert a file record together with its brightness samples and
    /// fingerprints, atomically. On any failure nothing of the file is
    /// persisted.
    ///
    /// Brightness values are stored one row per decoded frame, in order.
    /// Fingerprint frames must be strictly increasing or the whole insert
    /// fails.
    pub fn insert_video(
        &mut self,
        path: &Path,
        fps: f64,
        duration_secs: f64,
        brightness: &[f64],
        fingerprints: &[SceneBreak],
    ) -> Result<FileId, StoreError> {
        for pair in fingerprints.windows(2) {
            if pair[1].frame <= pair[0].frame {
                return Err(StoreError::FingerprintOrder(path.to_path_buf()));
            }
        }

        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO filenames (name, fps, duration) VALUES (?1, ?2, ?3)",
            params![path.to_string_lossy(), fps, duration_secs],
        )?;
        if inserted == 0 {
            return Err(StoreError::AlreadyIngested(path.to_path_buf()));
        }
        let file_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO brightness (filename_id, frame, value) VALUES (?1, ?2, ?3)",
            )?;
            for (frame, value) in brightness.iter().enumerate() {
                stmt.execute(params![file_id, frame as i64, value])?;
            }

            let mut stmt =
                tx.prepare("INSERT INTO hashes (filename_id, frame, value) VALUES (?1, ?2, ?3)")?;
            for print in fingerprints {
                stmt.execute(params![file_id, i64::from(print.frame), print.gap_secs])?;
            }
        }

        tx.commit()?;
        debug!(
            "stored {} ({} frames, {} fingerprints)",
            path.display(),
            brightness.len(),
            fingerprints.len()
        );
        Ok(file_id)
    }

    pub fn files(&self) -> Result<Vec<FileRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, fps, duration FROM filenames ORDER BY id")?;
        let records = stmt
            .query_map([], |row| {
                Ok(FileRecord {
                    id: row.get(0)?,
                    path: PathBuf::from(row.get::<_, String>(1)?),
                    fps: row.get(2)?,
                    duration_secs: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Fingerprints for one file, restricted to `min_frame..=max_frame`,
    /// ordered by frame index.
    pub fn fingerprints_in_range(
        &self,
        file_id: FileId,
        min_frame: i64,
        max_frame: i64,
    ) -> Result<Vec<SceneBreak>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT frame, value FROM hashes
             WHERE filename_id = ?1 AND frame >= ?2 AND frame <= ?3
             ORDER BY frame",
        )?;
        let prints = stmt
            .query_map(params![file_id, min_frame, max_frame], |row| {
                Ok(SceneBreak {
                    frame: row.get::<_, i64>(0)? as u32,
                    gap_secs: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(prints)
    }

    pub fn brightness_count(&self, file_id: FileId) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM brightness WHERE filename_id = ?1",
            params![file_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    ////////////////////////////////////////////////////////////////////////
    // Metadata backfill
    ////////////////////////////////////////////////////////////////////////

    /// Files whose fps or duration was not known at ingest time.
    pub fn files_missing_metadata(&self) -> Result<Vec<FileRecord>, StoreError> {
        Ok(self
            .files()?
            .into_iter()
            .filter(|f| f.fps <= 0.0 || f.duration_secs <= 0.0)
            .collect())
    }

    pub fn update_metadata(
        &mut self,
        file_id: FileId,
        fps: f64,
        duration_secs: f64,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE filenames SET fps = ?1, duration = ?2 WHERE id = ?3",
            params![fps, duration_secs, file_id],
        )?;
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////
    // Whitelist
    ////////////////////////////////////////////////////////////////////////

    /// Record a whitelist clique: every unordered pair among `ids` is
    /// stored canonicalized (id1 < id2). The whole add is rejected if the
    /// group has fewer than two distinct members or references an id that
    /// is not in the store.
    pub fn whitelist_add(&mut self, ids: &[FileId]) -> Result<usize, StoreError> {
        let distinct = ids.iter().copied().sorted().dedup().collect::<Vec<_>>();
        if distinct.len() < 2 {
            return Err(StoreError::WhitelistTooSmall);
        }

        for &id in &distinct {
            let known: Option<i64> = self
                .conn
                .query_row(
                    "SELECT id FROM filenames WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            if known.is_none() {
                return Err(StoreError::UnknownWhitelistId(id));
            }
        }

        let tx = self.conn.transaction()?;
        let mut added = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO whitelist (id1, id2) VALUES (?1, ?2)")?;
            for (a, b) in distinct.iter().copied().tuple_combinations() {
                added += stmt.execute(params![a, b])?;
            }
        }
        tx.commit()?;
        Ok(added)
    }

    pub fn whitelist_contains(&self, a: FileId, b: FileId) -> Result<bool, StoreError> {
        if a == b {
            return Err(StoreError::DegenerateWhitelistPair);
        }
        let (id1, id2) = if a < b { (a, b) } else { (b, a) };

        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM whitelist WHERE id1 = ?1 AND id2 = ?2",
                params![id1, id2],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    ////////////////////////////////////////////////////////////////////////
    // Purge
    ////////////////////////////////////////////////////////////////////////

    /// Find rows that no longer correspond to anything on disk: file
    /// records whose path is unreadable, fingerprint/brightness rows whose
    /// file record is gone, and whitelist pairs referencing removed ids.
    ///
    /// With `dry_run` the report is returned without deleting anything.
    /// Purging is idempotent: a second run finds nothing new.
    pub fn purge(&mut self, dry_run: bool) -> Result<PurgeReport, StoreError> {
        let missing_files = self
            .files()?
            .into_iter()
            .filter(|f| !f.path.exists())
            .collect::<Vec<_>>();
        let missing_ids = missing_files.iter().map(|f| f.id).collect::<Vec<_>>();

        fn count(conn: &Connection, sql: &str) -> Result<i64, rusqlite::Error> {
            conn.query_row(sql, [], |row| row.get(0))
        }

        let orphan_rows = count(
            &self.conn,
            "SELECT COUNT(*) FROM hashes
             WHERE filename_id NOT IN (SELECT id FROM filenames)",
        )? + count(
            &self.conn,
            "SELECT COUNT(*) FROM brightness
             WHERE filename_id NOT IN (SELECT id FROM filenames)",
        )?;

        let stale_whitelist_pairs = count(
            &self.conn,
            "SELECT COUNT(*) FROM whitelist
             WHERE id1 NOT IN (SELECT id FROM filenames)
                OR id2 NOT IN (SELECT id FROM filenames)",
        )?;

        let report = PurgeReport {
            missing_files,
            orphan_rows: orphan_rows as usize,
            stale_whitelist_pairs: stale_whitelist_pairs as usize,
        };

        if dry_run {
            return Ok(report);
        }

        let tx = self.conn.transaction()?;
        for &id in &missing_ids {
            tx.execute("DELETE FROM hashes WHERE filename_id = ?1", params![id])?;
            tx.execute("DELETE FROM brightness WHERE filename_id = ?1", params![id])?;
            tx.execute(
                "DELETE FROM whitelist WHERE id1 = ?1 OR id2 = ?1",
                params![id],
            )?;
            tx.execute("DELETE FROM filenames WHERE id = ?1", params![id])?;
        }
        tx.execute_batch(
            "DELETE FROM hashes
                 WHERE filename_id NOT IN (SELECT id FROM filenames);
             DELETE FROM brightness
                 WHERE filename_id NOT IN (SELECT id FROM filenames);
             DELETE FROM whitelist
                 WHERE id1 NOT IN (SELECT id FROM filenames)
                    OR id2 NOT IN (SELECT id FROM filenames);",
        )?;
        tx.commit()?;

        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn prints(frames_and_gaps: &[(u32, f64)]) -> Vec<SceneBreak> {
        frames_and_gaps
            .iter()
            .map(|&(frame, gap_secs)| SceneBreak { frame, gap_secs })
            .collect()
    }

    fn insert_dummy(store: &mut Store, name: &str) -> FileId {
        store
            .insert_video(
                Path::new(name),
                25.0,
                600.0,
                &[1.0, 2.0, 3.0],
                &prints(&[(10, 0.4), (50, 1.6)]),
            )
            .unwrap()
    }

    #[test]
    fn insert_then_is_ingested() {
        let mut store = Store::open_in_memory().unwrap();
        assert!(!store.is_ingested(Path::new("/vids/a.mp4")).unwrap());
        insert_dummy(&mut store, "/vids/a.mp4");
        assert!(store.is_ingested(Path::new("/vids/a.mp4")).unwrap());
    }

    #[test]
    fn reinserting_a_path_fails_and_changes_nothing() {
        let mut store = Store::open_in_memory().unwrap();
        let id = insert_dummy(&mut store, "/vids/a.mp4");

        let err = store.insert_video(Path::new("/vids/a.mp4"), 30.0, 1.0, &[], &[]);
        assert!(matches!(err, Err(StoreError::AlreadyIngested(_))));

        // original rows are untouched
        let files = store.files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].fps, 25.0);
        assert_eq!(store.brightness_count(id).unwrap(), 3);
        assert_eq!(
            store.fingerprints_in_range(id, 0, i64::MAX).unwrap().len(),
            2
        );
    }

    #[test]
    fn out_of_order_fingerprints_are_rejected_atomically() {
        let mut store = Store::open_in_memory().unwrap();
        let err = store.insert_video(
            Path::new("/vids/bad.mp4"),
            25.0,
            10.0,
            &[1.0],
            &prints(&[(50, 2.0), (10, 0.4)]),
        );
        assert!(matches!(err, Err(StoreError::FingerprintOrder(_))));
        assert!(store.files().unwrap().is_empty());
    }

    #[test]
    fn fingerprint_range_query_is_ordered_and_inclusive() {
        let mut store = Store::open_in_memory().unwrap();
        let id = store
            .insert_video(
                Path::new("/vids/a.mp4"),
                25.0,
                600.0,
                &[],
                &prints(&[(10, 0.4), (50, 1.6), (100, 2.0), (200, 4.0)]),
            )
            .unwrap();

        let in_range = store.fingerprints_in_range(id, 50, 100).unwrap();
        assert_eq!(
            in_range.iter().map(|p| p.frame).collect::<Vec<_>>(),
            vec![50, 100]
        );
    }

    #[test]
    fn whitelist_pairs_are_canonical_and_unique() {
        let mut store = Store::open_in_memory().unwrap();
        let a = insert_dummy(&mut store, "/vids/a.mp4");
        let b = insert_dummy(&mut store, "/vids/b.mp4");

        assert_eq!(store.whitelist_add(&[b, a]).unwrap(), 1);
        // adding again inserts nothing new
        assert_eq!(store.whitelist_add(&[a, b]).unwrap(), 0);

        assert!(store.whitelist_contains(a, b).unwrap());
        assert!(store.whitelist_contains(b, a).unwrap());
    }

    #[test]
    fn whitelisting_a_clique_records_every_pair() {
        let mut store = Store::open_in_memory().unwrap();
        let a = insert_dummy(&mut store, "/vids/a.mp4");
        let b = insert_dummy(&mut store, "/vids/b.mp4");
        let c = insert_dummy(&mut store, "/vids/c.mp4");

        assert_eq!(store.whitelist_add(&[c, a, b]).unwrap(), 3);
        assert!(store.whitelist_contains(a, b).unwrap());
        assert!(store.whitelist_contains(a, c).unwrap());
        assert!(store.whitelist_contains(b, c).unwrap());
    }

    #[test]
    fn whitelist_on_a_single_file_is_rejected() {
        let mut store = Store::open_in_memory().unwrap();
        let a = insert_dummy(&mut store, "/vids/a.mp4");

        assert!(matches!(
            store.whitelist_add(&[a]),
            Err(StoreError::WhitelistTooSmall)
        ));
        assert!(matches!(
            store.whitelist_add(&[a, a]),
            Err(StoreError::WhitelistTooSmall)
        ));
    }

    #[test]
    fn whitelist_referencing_unknown_id_rejects_the_whole_add() {
        let mut store = Store::open_in_memory().unwrap();
        let a = insert_dummy(&mut store, "/vids/a.mp4");
        let b = insert_dummy(&mut store, "/vids/b.mp4");

        let err = store.whitelist_add(&[a, b, 999]);
        assert!(matches!(err, Err(StoreError::UnknownWhitelistId(999))));
        // nothing was recorded
        assert!(!store.whitelist_contains(a, b).unwrap());
    }

    #[test]
    fn degenerate_whitelist_query_is_an_error() {
        let mut store = Store::open_in_memory().unwrap();
        let a = insert_dummy(&mut store, "/vids/a.mp4");
        assert!(matches!(
            store.whitelist_contains(a, a),
            Err(StoreError::DegenerateWhitelistPair)
        ));
    }

    #[test]
    fn purge_removes_rows_for_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let kept_path = tmp.path().join("kept.mp4");
        std::fs::write(&kept_path, b"x").unwrap();
        let gone_path = tmp.path().join("gone.mp4");

        let mut store = Store::open_in_memory().unwrap();
        let kept = store
            .insert_video(&kept_path, 25.0, 1.0, &[1.0], &prints(&[(10, 0.4)]))
            .unwrap();
        let gone = store
            .insert_video(&gone_path, 25.0, 1.0, &[1.0], &prints(&[(10, 0.4)]))
            .unwrap();
        store.whitelist_add(&[kept, gone]).unwrap();

        let report = store.purge(false).unwrap();
        assert_eq!(report.missing_files.len(), 1);
        assert_eq!(report.missing_files[0].id, gone);

        let files = store.files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, kept);
        assert!(store
            .fingerprints_in_range(gone, 0, i64::MAX)
            .unwrap()
            .is_empty());
        assert_eq!(store.brightness_count(gone).unwrap(), 0);
        assert!(!store.whitelist_contains(kept, gone).unwrap());
    }

    #[test]
    fn purge_dry_run_deletes_nothing() {
        let mut store = Store::open_in_memory().unwrap();
        insert_dummy(&mut store, "/definitely/not/on/disk.mp4");

        let report = store.purge(true).unwrap();
        assert_eq!(report.missing_files.len(), 1);
        assert_eq!(store.files().unwrap().len(), 1);
    }

    #[test]
    fn purge_is_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        insert_dummy(&mut store, "/definitely/not/on/disk.mp4");

        let first = store.purge(false).unwrap();
        assert_eq!(first.missing_files.len(), 1);

        let second = store.purge(false).unwrap();
        assert!(second.missing_files.is_empty());
        assert_eq!(second.orphan_rows, 0);
        assert_eq!(second.stale_whitelist_pairs, 0);
    }

    #[test]
    fn metadata_backfill_updates_the_record() {
        let mut store = Store::open_in_memory().unwrap();
        let id = store
            .insert_video(Path::new("/vids/a.mp4"), 0.0, 0.0, &[], &[])
            .unwrap();

        assert_eq!(store.files_missing_metadata().unwrap().len(), 1);

        store.update_metadata(id, 25.0, 600.0).unwrap();
        assert!(store.files_missing_metadata().unwrap().is_empty());
        let record = &store.files().unwrap()[0];
        assert_eq!(record.fps, 25.0);
        assert_eq!(record.duration_secs, 600.0);
    }

    #[test]
    fn foreign_keys_reject_rows_for_unknown_files() {
        let store = Store::open_in_memory().unwrap();

        let orphan_hash = store.conn.execute(
            "INSERT INTO hashes (filename_id, frame, value) VALUES (999, 0, 1.0)",
            [],
        );
        assert!(orphan_hash.is_err());

        let orphan_brightness = store.conn.execute(
            "INSERT INTO brightness (filename_id, frame, value) VALUES (999, 0, 1.0)",
            [],
        );
        assert!(orphan_brightness.is_err());

        let orphan_pair = store
            .conn
            .execute("INSERT INTO whitelist (id1, id2) VALUES (998, 999)", []);
        assert!(orphan_pair.is_err());
    }

    #[test]
    fn store_survives_close_and_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("library.sqlite");

        let id;
        {
            let mut store = Store::open(&db_path).unwrap();
            id = insert_dummy(&mut store, "/vids/a.mp4");
        }
        {
            let store = Store::open(&db_path).unwrap();
            assert!(store.is_ingested(Path::new("/vids/a.mp4")).unwrap());
            assert_eq!(store.brightness_count(id).unwrap(), 3);
        }
    }
}
