use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    tx_type TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    debit REAL NOT NULL DEFAULT 0,
    credit REAL NOT NULL DEFAULT 0,
    category TEXT NOT NULL DEFAULT '',
    subcategory TEXT,
    account TEXT NOT NULL DEFAULT '',
    counter_iban TEXT NOT NULL DEFAULT '',
    manually_edited INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS ux_transactions_signature
ON transactions (date, description, debit, credit, account, counter_iban);

CREATE TABLE IF NOT EXISTS keyword_rules (
    id INTEGER PRIMARY KEY,
    keyword TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    imported_count INTEGER,
    skipped_count INTEGER,
    error_count INTEGER,
    checksum TEXT
);
";

// (keyword, category)
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("miete", "Wohnen"),
    ("rewe", "Lebensmittel"),
    ("edeka", "Lebensmittel"),
    ("aldi", "Lebensmittel"),
    ("lidl", "Lebensmittel"),
    ("rossmann", "Drogerie"),
    ("tankstelle", "Mobilit\u{e4}t"),
    ("aral", "Mobilit\u{e4}t"),
    ("gehalt", "Gehalt"),
    ("apotheke", "Gesundheit"),
    ("versicherung", "Versicherung"),
    ("strom", "Nebenkosten"),
    ("telekom", "Kommunikation"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM keyword_rules", [], |row| row.get(0))?;
    if count == 0 {
        for (keyword, category) in DEFAULT_RULES {
            conn.execute(
                "INSERT INTO keyword_rules (keyword, category) VALUES (?1, ?2)",
                rusqlite::params![keyword, category],
            )?;
        }
    }
    Ok(())
}

/// The unique signature index is authoritative for deduplication; a
/// constraint violation on insert means "already imported", not a failure.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["transactions", "keyword_rules", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_init_db_seeds_rules() {
        let (_dir, conn) = test_db();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM keyword_rules", [], |r| r.get(0))
            .unwrap();
        assert!(count >= 13, "expected at least 13 seeded rules, got {count}");
    }

    #[test]
    fn test_signature_index_rejects_duplicates() {
        let (_dir, conn) = test_db();
        let insert = "INSERT INTO transactions (date, description, debit, credit, account, counter_iban) \
                      VALUES ('2024-03-01', 'Rewe Einkauf', 45.9, 0.0, 'DE02100100100006820101', '')";
        conn.execute(insert, []).unwrap();
        let err = conn.execute(insert, []).unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn test_keyword_unique() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO keyword_rules (keyword, category) VALUES ('netflix', 'Freizeit')",
            [],
        )
        .unwrap();
        let err = conn
            .execute(
                "INSERT INTO keyword_rules (keyword, category) VALUES ('netflix', 'Abos')",
                [],
            )
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }
}
