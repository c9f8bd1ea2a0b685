use std::path::Path;

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info, warn};

use crate::candidate::CandidateTerm;
use crate::case::CaseTier;
use crate::encoding::EncodedCode;
use crate::error::{LookupError, Result};
use crate::pivot::PivotPolicy;
use crate::schema::{
    encoder_table_ddl, run_migrations, validate_table_name, TierTables, SCHEMA_VERSION,
};
use crate::term::TokenizedTerm;

// ---------------------------------------------------------------------------
// Pool type alias
// ---------------------------------------------------------------------------

pub type DbPool = Pool<SqliteConnectionManager>;

// ---------------------------------------------------------------------------
// Pool constructors
// ---------------------------------------------------------------------------

/// Open a connection pool backed by a file-based SQLite database and make
/// sure the tier tables exist.
pub fn create_pool(db_path: &str, tables: &TierTables) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path);

    let pool = Pool::builder()
        .max_size(16)
        .build(manager)
        .map_err(|e| LookupError::Internal(e.to_string()))?;

    let conn = pool.get().map_err(|e| LookupError::Internal(e.to_string()))?;
    run_migrations(&conn, tables)?;

    Ok(pool)
}

/// Open a read-only pool over an existing database for lookups.
///
/// `db_path` is a file path or a `file:` URI. Nothing is created or
/// migrated: a plain path that does not exist is reported as
/// [`LookupError::NotFound`], and any other open failure is returned before
/// the pool is built.
pub fn create_read_only_pool(db_path: &str) -> Result<DbPool> {
    if !db_path.starts_with("file:") && !Path::new(db_path).is_file() {
        return Err(LookupError::NotFound(format!("database file {db_path}")));
    }
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    // r2d2 keeps retrying a failing connection until its checkout timeout.
    Connection::open_with_flags(db_path, flags)?;

    let manager = SqliteConnectionManager::file(db_path).with_flags(flags);
    let pool = Pool::builder()
        .max_size(16)
        .build(manager)
        .map_err(|e| LookupError::Internal(e.to_string()))?;
    debug!("Opened {db_path} read-only");
    Ok(pool)
}

/// Open a single-connection pool over an in-memory SQLite database.
///
/// Every in-memory connection is its own database, so the pool is capped at
/// one connection that is never retired, keeping readers and writers on the
/// same data.
pub fn create_memory_pool(tables: &TierTables) -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();

    let pool = Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .build(manager)
        .map_err(|e| LookupError::Internal(e.to_string()))?;

    let conn = pool.get().map_err(|e| LookupError::Internal(e.to_string()))?;
    run_migrations(&conn, tables)?;

    Ok(pool)
}

// ---------------------------------------------------------------------------
// TableMeta
// ---------------------------------------------------------------------------

/// One row of the `dictionary_meta` table.
#[derive(Debug, Clone)]
pub struct TableMeta {
    pub table_name: String,
    pub tier: CaseTier,
    pub schema_version: String,
    pub term_count: i64,
    pub written_at: DateTime<Utc>,
}

fn parse_tier(text: &str) -> Option<CaseTier> {
    CaseTier::ALL.into_iter().find(|t| t.as_str() == text)
}

fn row_to_meta(row: &rusqlite::Row<'_>) -> rusqlite::Result<TableMeta> {
    let table_name: String = row.get(0)?;
    let tier_str: String = row.get(1)?;
    let schema_version: String = row.get(2)?;
    let term_count: i64 = row.get(3)?;
    let written_at_str: String = row.get(4)?;

    let tier = parse_tier(&tier_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown tier '{tier_str}'").into(),
        )
    })?;
    let written_at = DateTime::parse_from_rfc3339(&written_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(TableMeta {
        table_name,
        tier,
        schema_version,
        term_count,
        written_at,
    })
}

/// Read the bookkeeping rows for every tier table written so far.
pub fn read_table_meta(conn: &rusqlite::Connection) -> Result<Vec<TableMeta>> {
    let mut stmt = conn.prepare(
        "SELECT table_name, tier, schema_version, term_count, written_at
           FROM dictionary_meta
          ORDER BY table_name ASC",
    )?;
    let rows = stmt
        .query_map([], row_to_meta)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Number of rows written into each tier by one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub upper: usize,
    pub mixed: usize,
    pub lower: usize,
    pub skipped: usize,
}

impl WriteSummary {
    fn bump(&mut self, tier: CaseTier) {
        match tier {
            CaseTier::Upper => self.upper += 1,
            CaseTier::Mixed => self.mixed += 1,
            CaseTier::Lower => self.lower += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.upper + self.mixed + self.lower
    }
}

/// Split tokenized terms at the pivot chosen by `policy` and store them in
/// the tier matching each term's own case.
pub fn write_terms(
    pool: &DbPool,
    tables: &TierTables,
    terms: &[TokenizedTerm],
    policy: &dyn PivotPolicy,
) -> Result<WriteSummary> {
    let mut candidates = Vec::with_capacity(terms.len());
    let mut skipped = 0;
    for term in terms {
        let candidate = policy
            .pivot_index(term.tokens())
            .map(|index| CandidateTerm::from_tokenized(term, index));
        match candidate {
            Some(Ok(candidate)) => candidates.push(candidate),
            Some(Err(e)) => {
                warn!("Skipping term for concept {}: {e}", term.concept_code());
                skipped += 1;
            }
            None => {
                warn!("No rare word for concept {} term '{}'", term.concept_code(), term.tokens().join(" "));
                skipped += 1;
            }
        }
    }
    let mut summary = write_candidates(pool, tables, &candidates)?;
    summary.skipped += skipped;
    Ok(summary)
}

/// Store already-split candidate terms, each in the tier of its case profile,
/// inside one transaction, then refresh the meta rows.
pub fn write_candidates(
    pool: &DbPool,
    tables: &TierTables,
    candidates: &[CandidateTerm],
) -> Result<WriteSummary> {
    tables.validate()?;
    let mut conn = pool.get().map_err(|e| LookupError::Internal(e.to_string()))?;
    let tx = conn.transaction()?;
    let mut summary = WriteSummary::default();

    for candidate in candidates {
        let tier = candidate.case_profile().tier();
        let sql = format!(
            "INSERT INTO {} (CUI, PREFIX, INDEX_WORD, SUFFIX, RANK, INSTANCES)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            tables.table(tier)
        );
        tx.prepare_cached(&sql)?.execute(params![
            candidate.concept_code(),
            candidate.prefixes().join(" "),
            candidate.rare_word(),
            candidate.suffixes().join(" "),
            candidate.rank(),
            candidate.instances(),
        ])?;
        summary.bump(tier);
    }

    let written_at = Utc::now().to_rfc3339();
    for tier in CaseTier::ALL {
        let table = tables.table(tier);
        let count: i64 = tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        tx.execute(
            "INSERT INTO dictionary_meta (table_name, tier, schema_version, term_count, written_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(table_name) DO UPDATE SET
                tier = excluded.tier,
                schema_version = excluded.schema_version,
                term_count = excluded.term_count,
                written_at = excluded.written_at",
            params![table, tier.as_str(), SCHEMA_VERSION, count, written_at],
        )?;
    }

    tx.commit()?;
    info!(
        "Wrote {} terms (upper {}, mixed {}, lower {})",
        summary.total(),
        summary.upper,
        summary.mixed,
        summary.lower
    );
    Ok(summary)
}

/// Create the code table `table` if needed and append `(concept, code)`
/// rows in one transaction. Returns the number of rows written.
pub fn write_codes(pool: &DbPool, table: &str, codes: &[(i64, EncodedCode)]) -> Result<usize> {
    validate_table_name(table)?;
    let mut conn = pool.get().map_err(|e| LookupError::Internal(e.to_string()))?;
    let tx = conn.transaction()?;
    tx.execute_batch(&encoder_table_ddl(table))?;
    {
        let mut stmt = tx.prepare_cached(&format!("INSERT INTO {table} (CUI, CODE) VALUES (?1, ?2)"))?;
        for (cui, code) in codes {
            match code {
                EncodedCode::Number(n) => stmt.execute(params![cui, n])?,
                EncodedCode::Text(s) => stmt.execute(params![cui, s])?,
            };
        }
    }
    tx.commit()?;
    info!("Wrote {} codes to {table}", codes.len());
    Ok(codes.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
