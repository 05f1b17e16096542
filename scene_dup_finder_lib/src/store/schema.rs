use rusqlite::Connection;

// One database file per library. `hashes` holds the scene fingerprints
// (sparse), `brightness` the dense per-frame values they were derived
// from. Whitelist pairs are stored canonicalized with id1 < id2.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS filenames (
    id       INTEGER PRIMARY KEY,
    name     TEXT NOT NULL UNIQUE,
    fps      REAL NOT NULL,
    duration REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS hashes (
    filename_id INTEGER NOT NULL,
    frame       INTEGER NOT NULL,
    value       REAL NOT NULL,
    UNIQUE (filename_id, frame),
    FOREIGN KEY (filename_id) REFERENCES filenames(id)
);

CREATE TABLE IF NOT EXISTS brightness (
    filename_id INTEGER NOT NULL,
    frame       INTEGER NOT NULL,
    value       REAL NOT NULL,
    FOREIGN KEY (filename_id) REFERENCES filenames(id)
);
CREATE INDEX IF NOT EXISTS idx_brightness_file_frame
    ON brightness (filename_id, frame);

CREATE TABLE IF NOT EXISTS whitelist (
    id1 INTEGER NOT NULL,
    id2 INTEGER NOT NULL,
    UNIQUE (id1, id2),
    CHECK (id1 < id2),
    FOREIGN KEY (id1) REFERENCES filenames(id),
    FOREIGN KEY (id2) REFERENCES filenames(id)
);
";

/// Create all tables and indexes. Idempotent.
pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
