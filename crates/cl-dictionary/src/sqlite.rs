use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::{debug, error, info};

use cl_core::db::{create_read_only_pool, read_table_meta, DbPool};
use cl_core::schema::{check_tier_tables, table_exists, TierTables, SCHEMA_VERSION};
use cl_core::{CandidateTerm, CaseTier, LookupError, Result, TokenView};

use crate::dictionary::{CasedDictionary, TierPolicy};

// ---------------------------------------------------------------------------
// SqliteDictionary
// ---------------------------------------------------------------------------

/// Dictionary backed by three tier tables in a SQLite database.
///
/// Every query borrows its own connection from the pool, so one instance can
/// serve concurrent lookups.
pub struct SqliteDictionary {
    name: String,
    pool: DbPool,
    tables: TierTables,
}

impl SqliteDictionary {
    /// Wrap an existing pool. The tier table names must be valid and the
    /// tables must exist; the stored metadata, if any, is logged.
    pub fn new(name: impl Into<String>, pool: DbPool, tables: TierTables) -> Result<Self> {
        tables.validate()?;
        let dictionary = Self {
            name: name.into(),
            pool,
            tables,
        };
        check_tier_tables(&*dictionary.conn()?, &dictionary.tables)?;
        dictionary.log_meta()?;
        Ok(dictionary)
    }

    /// Open an existing database file or `file:` URI read-only.
    ///
    /// The file is never created or migrated; build it with
    /// [`cl_core::db::write_terms`].
    pub fn open(name: impl Into<String>, path: &str, tables: TierTables) -> Result<Self> {
        tables.validate()?;
        let pool = create_read_only_pool(path)?;
        Self::new(name, pool, tables)
    }

    pub fn tables(&self) -> &TierTables {
        &self.tables
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| LookupError::Internal(e.to_string()))
    }

    fn log_meta(&self) -> Result<()> {
        let conn = self.conn()?;
        if !table_exists(&conn, "dictionary_meta")? {
            debug!("Dictionary {} has no dictionary_meta table", self.name);
            return Ok(());
        }
        let meta = read_table_meta(&conn)?;
        if meta.is_empty() {
            info!("Dictionary {} connected, no tier tables written yet", self.name);
        }
        for row in meta {
            if row.schema_version != SCHEMA_VERSION {
                info!(
                    "Dictionary {}: table {} has schema {}, current is {}",
                    self.name, row.table_name, row.schema_version, SCHEMA_VERSION
                );
            }
            info!(
                "Dictionary {}: {} table {} holds {} terms, written {}",
                self.name,
                row.tier.as_str(),
                row.table_name,
                row.term_count,
                row.written_at.to_rfc3339()
            );
        }
        Ok(())
    }

    /// All rows of one tier table whose `INDEX_WORD` equals `key`.
    pub fn query_tier(&self, tier: CaseTier, key: &str) -> Result<Vec<CandidateTerm>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT CUI, PREFIX, INDEX_WORD, SUFFIX, RANK, INSTANCES
               FROM {}
              WHERE INDEX_WORD = ?1",
            self.tables.table(tier)
        );
        let case = tier.profile();
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(params![key], |row| {
                let cui: i64 = row.get(0)?;
                let prefix: String = row.get(1)?;
                let index_word: String = row.get(2)?;
                let suffix: String = row.get(3)?;
                let rank: i32 = row.get(4)?;
                let instances: i32 = row.get(5)?;
                Ok(CandidateTerm::from_columns(
                    cui,
                    &prefix,
                    &index_word,
                    &suffix,
                    case,
                    rank,
                    instances,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl CasedDictionary for SqliteDictionary {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidate_terms(&self, token: &TokenView) -> Vec<CandidateTerm> {
        TierPolicy::Union.candidates(token, |tier, key| match self.query_tier(tier, key) {
            Ok(found) => {
                debug!(
                    "Dictionary {}: {} {} rows for '{key}'",
                    self.name,
                    found.len(),
                    tier.as_str()
                );
                found
            }
            Err(e) => {
                error!(
                    "Dictionary {}: {} lookup of '{key}' failed: {e}",
                    self.name,
                    tier.as_str()
                );
                Vec::new()
            }
        })
    }

    fn tier_policy(&self) -> TierPolicy {
        TierPolicy::Union
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use cl_core::db::{create_memory_pool, create_pool, write_terms};
    use cl_core::{FixedPivot, TermFrequencyPivot, TokenizedTerm};
    use rusqlite::Connection;
    use std::path::Path;
    use std::sync::Arc;

    /// A database holding only the three tier tables, written without any of
    /// this crate's bookkeeping, with "fever" (55) in the lower tier.
    fn bare_tier_database(path: &Path) {
        let conn = Connection::open(path).unwrap();
        for table in ["UPPER", "MIXED", "LOWER"] {
            conn.execute_batch(&format!(
                "CREATE TABLE {table} (CUI INTEGER, PREFIX TEXT, INDEX_WORD TEXT,
                                       SUFFIX TEXT, RANK INTEGER, INSTANCES INTEGER)"
            ))
            .unwrap();
        }
        conn.execute(
            "INSERT INTO LOWER VALUES (55, '', 'fever', '', 1, 1)",
            [],
        )
        .unwrap();
    }

    fn populated(terms: &[TokenizedTerm]) -> (tempfile::TempDir, SqliteDictionary) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.db");
        let tables = TierTables::default();
        let pool = create_pool(path.to_str().unwrap(), &tables).unwrap();
        let pivot = TermFrequencyPivot::from_terms(terms);
        write_terms(&pool, &tables, terms, &pivot).unwrap();
        let dictionary = SqliteDictionary::new("sql", pool, tables).unwrap();
        (dir, dictionary)
    }

    fn codes(found: &[CandidateTerm]) -> Vec<i64> {
        let mut codes: Vec<i64> = found.iter().map(|c| c.concept_code()).collect();
        codes.sort();
        codes
    }

    #[test]
    fn union_merges_every_compatible_tier() {
        let (_dir, d) = populated(&[
            TokenizedTerm::new(1, "AIDS"),
            TokenizedTerm::new(2, "Aids"),
            TokenizedTerm::new(3, "aids"),
        ]);
        let found = d.candidate_terms(&TokenView::new(0, 4, "AIDS", true));
        // "AIDS" is all-upper, so the mixed table is queried with "AIDS" and
        // finds nothing stored under "Aids".
        assert_eq!(codes(&found), vec![1, 3]);

        let found = d.candidate_terms(&TokenView::new(0, 4, "Aids", true));
        assert_eq!(codes(&found), vec![2, 3]);
    }

    #[test]
    fn lower_token_reads_lower_table_only() {
        let (_dir, d) = populated(&[TokenizedTerm::new(1, "AIDS"), TokenizedTerm::new(3, "aids")]);
        let found = d.candidate_terms(&TokenView::new(0, 4, "aids", true));
        assert_eq!(codes(&found), vec![3]);
    }

    #[test]
    fn case_match_follows_source_tier() {
        let (_dir, d) = populated(&[TokenizedTerm::new(1, "AIDS"), TokenizedTerm::new(3, "aids")]);
        let found = d.candidate_terms(&TokenView::new(0, 4, "AIDS", true));
        for c in &found {
            assert_eq!(c.matches_lookup_case(), c.concept_code() == 1);
        }
    }

    #[test]
    fn columns_are_rebuilt_into_tokens() {
        let (_dir, d) = populated(&[TokenizedTerm::new(123, "acute myocardial infarction")]);
        // Equal frequencies, so the first token is the pivot.
        let all = d.query_tier(CaseTier::Lower, "acute").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].suffixes().len(), 2);
        assert_eq!(all[0].tokens(), vec!["acute", "myocardial", "infarction"]);
        assert_eq!(all[0].rank(), 1);
        assert_eq!(all[0].instances(), 1);
    }

    #[test]
    fn single_word_row_has_no_affixes() {
        let tables = TierTables::default();
        let pool = create_memory_pool(&tables).unwrap();
        write_terms(&pool, &tables, &[TokenizedTerm::new(55, "fever")], &FixedPivot(0)).unwrap();
        let d = SqliteDictionary::new("mem", pool, tables).unwrap();
        let found = d.candidate_terms(&TokenView::new(0, 5, "fever", true));
        assert_eq!(found.len(), 1);
        assert!(found[0].prefixes().is_empty());
        assert!(found[0].suffixes().is_empty());
    }

    #[test]
    fn missing_tier_table_fails_construction() {
        let tables = TierTables::default();
        let pool = create_memory_pool(&tables).unwrap();
        pool.get().unwrap().execute_batch("DROP TABLE MIXED").unwrap();
        let result = SqliteDictionary::new("broken", pool, tables);
        assert!(matches!(result, Err(LookupError::Schema(_))));
    }

    #[test]
    fn table_lost_after_open_is_logged_and_empty() {
        let tables = TierTables::default();
        let pool = create_memory_pool(&tables).unwrap();
        let d = SqliteDictionary::new("broken", pool.clone(), tables).unwrap();
        pool.get().unwrap().execute_batch("DROP TABLE MIXED").unwrap();
        assert!(d.query_tier(CaseTier::Mixed, "Aids").is_err());
        assert!(d.candidate_terms(&TokenView::new(0, 4, "Aids", true)).is_empty());
    }

    #[test]
    fn open_reads_a_database_without_bookkeeping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.db");
        bare_tier_database(&path);

        let d = SqliteDictionary::open("bare", path.to_str().unwrap(), TierTables::default())
            .unwrap();
        let found = d.candidate_terms(&TokenView::new(0, 5, "fever", true));
        assert_eq!(codes(&found), vec![55]);
        drop(d);

        let conn = Connection::open(&path).unwrap();
        assert!(!table_exists(&conn, "dictionary_meta").unwrap());
        let indexes: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'index'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(indexes, 0);
        let mode: String = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0)).unwrap();
        assert_eq!(mode, "delete");
    }

    #[test]
    fn open_accepts_a_read_only_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.db");
        bare_tier_database(&path);

        let uri = format!("file:{}?mode=ro", path.display());
        let d = SqliteDictionary::open("uri", &uri, TierTables::default()).unwrap();
        let found = d.candidate_terms(&TokenView::new(0, 5, "FEVER", true));
        assert_eq!(codes(&found), vec![55]);
        assert!(!found[0].matches_lookup_case());
    }

    #[test]
    fn open_reports_a_missing_file_without_creating_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tpyo.db");
        let result = SqliteDictionary::open("typo", path.to_str().unwrap(), TierTables::default());
        assert!(matches!(result, Err(LookupError::NotFound(_))));
        assert!(!path.exists());
    }

    #[test]
    fn open_rejects_a_database_missing_a_tier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.db");
        bare_tier_database(&path);
        Connection::open(&path).unwrap().execute_batch("DROP TABLE UPPER").unwrap();

        let result = SqliteDictionary::open("partial", path.to_str().unwrap(), TierTables::default());
        match result {
            Err(LookupError::Schema(msg)) => assert!(msg.contains("UPPER"), "{msg}"),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("partial database was accepted"),
        }
    }

    #[test]
    fn concurrent_lookups_share_the_pool() {
        let (_dir, d) = populated(&[TokenizedTerm::new(55, "fever")]);
        let d = Arc::new(d);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let d = Arc::clone(&d);
                std::thread::spawn(move || {
                    d.candidate_terms(&TokenView::new(0, 5, "fever", true)).len()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }

    #[test]
    fn invalid_table_names_are_rejected() {
        let pool = create_memory_pool(&TierTables::default()).unwrap();
        let tables = TierTables {
            lower: "LOWER WHERE 1".into(),
            ..TierTables::default()
        };
        assert!(SqliteDictionary::new("bad", pool, tables).is_err());
    }
}
