use serde::{Deserialize, Serialize};

use crate::case::CaseTier;
use crate::error::{LookupError, Result};

/// Version string recorded in every `dictionary_meta` row so that readers
/// can detect tables written by an older build.
pub const SCHEMA_VERSION: &str = "1.0.0";

pub const DEFAULT_UPPER_TABLE: &str = "UPPER";
pub const DEFAULT_MIXED_TABLE: &str = "MIXED";
pub const DEFAULT_LOWER_TABLE: &str = "LOWER";

/// Bookkeeping table shared by all tier tables in one database file.
pub const CREATE_META_TABLE: &str = "
CREATE TABLE IF NOT EXISTS dictionary_meta (
    table_name      TEXT    NOT NULL PRIMARY KEY,
    tier            TEXT    NOT NULL,
    schema_version  TEXT    NOT NULL,
    term_count      INTEGER NOT NULL DEFAULT 0,
    written_at      TEXT    NOT NULL
);
";

// ---------------------------------------------------------------------------
// TierTables
// ---------------------------------------------------------------------------

/// Names of the three tier tables of a storage-backed dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTables {
    #[serde(default = "default_upper")]
    pub upper: String,
    #[serde(default = "default_mixed")]
    pub mixed: String,
    #[serde(default = "default_lower")]
    pub lower: String,
}

fn default_upper() -> String {
    DEFAULT_UPPER_TABLE.to_string()
}

fn default_mixed() -> String {
    DEFAULT_MIXED_TABLE.to_string()
}

fn default_lower() -> String {
    DEFAULT_LOWER_TABLE.to_string()
}

impl Default for TierTables {
    fn default() -> Self {
        Self {
            upper: default_upper(),
            mixed: default_mixed(),
            lower: default_lower(),
        }
    }
}

impl TierTables {
    pub fn table(&self, tier: CaseTier) -> &str {
        match tier {
            CaseTier::Upper => &self.upper,
            CaseTier::Mixed => &self.mixed,
            CaseTier::Lower => &self.lower,
        }
    }

    /// Table names are spliced into SQL text, so only plain identifiers are
    /// accepted.
    pub fn validate(&self) -> Result<()> {
        for tier in CaseTier::ALL {
            let name = self.table(tier);
            if !is_identifier(name) {
                return Err(LookupError::Schema(format!(
                    "invalid {} table name '{name}'",
                    tier.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// Reject a table name that is not a plain identifier.
pub fn validate_table_name(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(LookupError::Schema(format!("invalid table name '{name}'")))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// DDL for one tier table and its lookup index.
pub fn tier_table_ddl(table: &str) -> String {
    format!(
        "
CREATE TABLE IF NOT EXISTS {table} (
    CUI         INTEGER NOT NULL,
    PREFIX      TEXT    NOT NULL DEFAULT '',
    INDEX_WORD  TEXT    NOT NULL,
    SUFFIX      TEXT    NOT NULL DEFAULT '',
    RANK        INTEGER NOT NULL DEFAULT 1,
    INSTANCES   INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_{table}_index_word
    ON {table} (INDEX_WORD);
"
    )
}

/// DDL for a code table mapping concept codes to one vocabulary.
///
/// `CODE` has no declared type so integer and text codes keep their storage
/// class.
pub fn encoder_table_ddl(table: &str) -> String {
    format!(
        "
CREATE TABLE IF NOT EXISTS {table} (
    CUI   INTEGER NOT NULL,
    CODE  NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_{table}_cui
    ON {table} (CUI);
"
    )
}

pub fn table_exists(conn: &rusqlite::Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        rusqlite::params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Fail with a schema error naming the first tier table the database lacks.
/// Only reads, so it is safe on a read-only connection.
pub fn check_tier_tables(conn: &rusqlite::Connection, tables: &TierTables) -> Result<()> {
    for tier in CaseTier::ALL {
        let table = tables.table(tier);
        if !table_exists(conn, table)? {
            return Err(LookupError::Schema(format!(
                "{} table '{table}' does not exist",
                tier.as_str()
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Migration runner
// ---------------------------------------------------------------------------

/// Create the tier tables and the meta table if they do not exist yet.
///
/// This function is **idempotent**.
pub fn run_migrations(conn: &rusqlite::Connection, tables: &TierTables) -> Result<()> {
    tables.validate()?;

    // WAL mode gives better read concurrency for the pooled readers.
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;

    conn.execute_batch(CREATE_META_TABLE)?;
    for tier in CaseTier::ALL {
        conn.execute_batch(&tier_table_ddl(tables.table(tier)))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn open_memory() -> Connection {
        Connection::open_in_memory().expect("in-memory db")
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = open_memory();
        let tables = TierTables::default();
        run_migrations(&conn, &tables).expect("first migration");
        run_migrations(&conn, &tables).expect("second migration");
    }

    #[test]
    fn default_tables_exist_after_migration() {
        let conn = open_memory();
        run_migrations(&conn, &TierTables::default()).unwrap();
        for table in ["UPPER", "MIXED", "LOWER", "dictionary_meta"] {
            assert!(table_exists(&conn, table).unwrap(), "table '{table}' should exist");
        }
    }

    #[test]
    fn custom_table_names() {
        let conn = open_memory();
        let tables = TierTables {
            upper: "sno_upper".into(),
            mixed: "sno_mixed".into(),
            lower: "sno_lower".into(),
        };
        run_migrations(&conn, &tables).unwrap();
        assert!(table_exists(&conn, "sno_upper").unwrap());
        assert!(table_exists(&conn, "sno_lower").unwrap());
    }

    #[test]
    fn invalid_table_name_is_rejected() {
        let tables = TierTables {
            upper: "UPPER; DROP TABLE x".into(),
            ..TierTables::default()
        };
        assert!(matches!(tables.validate(), Err(LookupError::Schema(_))));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(is_identifier("_abc1"));
    }

    #[test]
    fn tier_table_check_names_the_missing_table() {
        let conn = open_memory();
        let tables = TierTables::default();
        assert!(matches!(check_tier_tables(&conn, &tables), Err(LookupError::Schema(_))));

        conn.execute_batch(&tier_table_ddl("UPPER")).unwrap();
        conn.execute_batch(&tier_table_ddl("LOWER")).unwrap();
        match check_tier_tables(&conn, &tables) {
            Err(LookupError::Schema(msg)) => assert!(msg.contains("MIXED"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }

        conn.execute_batch(&tier_table_ddl("MIXED")).unwrap();
        check_tier_tables(&conn, &tables).unwrap();
        assert!(!table_exists(&conn, "dictionary_meta").unwrap());
    }

    #[test]
    fn encoder_table_keeps_code_storage_class() {
        let conn = open_memory();
        conn.execute_batch(&encoder_table_ddl("TUI")).unwrap();
        conn.execute_batch(&encoder_table_ddl("TUI")).unwrap();
        conn.execute("INSERT INTO TUI (CUI, CODE) VALUES (55, 184)", []).unwrap();
        conn.execute("INSERT INTO TUI (CUI, CODE) VALUES (55, 'T184')", []).unwrap();
        let kinds: Vec<String> = conn
            .prepare("SELECT typeof(CODE) FROM TUI ORDER BY rowid")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(kinds, vec!["integer", "text"]);
        assert!(validate_table_name("TUI").is_ok());
        assert!(validate_table_name("TUI; DROP").is_err());
    }

    #[test]
    fn tier_tables_deserialize_with_defaults() {
        let tables: TierTables = serde_json::from_str(r#"{"upper":"U"}"#).unwrap();
        assert_eq!(tables.upper, "U");
        assert_eq!(tables.mixed, "MIXED");
        assert_eq!(tables.lower, "LOWER");
    }
}
