//! Term encoders: concept code to vocabulary codes.
//!
//! An encoder is consulted after lookup for every distinct concept found.
//! Like dictionaries, encoders never fail a lookup: storage errors are logged
//! and the concept simply gets no codes from that encoder.

use std::collections::HashMap;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use rusqlite::types::ValueRef;
use tracing::{debug, error, info, warn};

use cl_core::db::{create_read_only_pool, DbPool};
use cl_core::schema::{table_exists, validate_table_name};
use cl_core::{parse_concept_code, CodeType, EncodedCode, LookupError, Result, TermEncoding};

/// Source of vocabulary codes for concepts.
pub trait TermEncoder: Send + Sync {
    fn name(&self) -> &str;

    /// Every code known for `concept_code`, possibly none.
    fn encodings(&self, concept_code: i64) -> Vec<TermEncoding>;
}

/// Read a code written as text according to `code_type`. Tui codes may carry
/// their conventional `T` prefix.
pub fn parse_code(text: &str, code_type: CodeType) -> Option<EncodedCode> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if !code_type.is_numeric() {
        return Some(EncodedCode::Text(text.to_string()));
    }
    let digits = match code_type {
        CodeType::Tui => text.strip_prefix('T').unwrap_or(text),
        _ => text,
    };
    let n: i64 = digits.parse().ok()?;
    if code_type.is_narrow() && i32::try_from(n).is_err() {
        return None;
    }
    Some(EncodedCode::Number(n))
}

fn schema_for(name: &str, code_type: CodeType) -> String {
    code_type.fixed_schema().unwrap_or(name).to_string()
}

// ---------------------------------------------------------------------------
// SqliteEncoder
// ---------------------------------------------------------------------------

/// Encoder reading a `(CUI, CODE)` table.
pub struct SqliteEncoder {
    name: String,
    pool: DbPool,
    table: String,
    code_type: CodeType,
}

impl SqliteEncoder {
    /// Wrap an existing pool. The code table must exist.
    pub fn new(
        name: impl Into<String>,
        pool: DbPool,
        table: impl Into<String>,
        code_type: CodeType,
    ) -> Result<Self> {
        let name = name.into();
        let table = table.into();
        validate_table_name(&table)?;
        {
            let conn = pool.get().map_err(|e| LookupError::Internal(e.to_string()))?;
            if !table_exists(&conn, &table)? {
                return Err(LookupError::NotFound(format!(
                    "encoder {name}: code table '{table}'"
                )));
            }
        }
        info!("Encoder {name} reads {code_type:?} codes from table {table}");
        Ok(Self {
            name,
            pool,
            table,
            code_type,
        })
    }

    /// Open an existing database file or `file:` URI read-only.
    pub fn open(
        name: impl Into<String>,
        path: &str,
        table: impl Into<String>,
        code_type: CodeType,
    ) -> Result<Self> {
        let pool = create_read_only_pool(path)?;
        Self::new(name, pool, table, code_type)
    }

    pub fn code_type(&self) -> CodeType {
        self.code_type
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| LookupError::Internal(e.to_string()))
    }

    /// All codes stored for `concept_code`, in row order.
    pub fn query(&self, concept_code: i64) -> Result<Vec<TermEncoding>> {
        let conn = self.conn()?;
        let sql = format!("SELECT CODE FROM {} WHERE CUI = ?1", self.table);
        let schema = schema_for(&self.name, self.code_type);
        let mut stmt = conn.prepare_cached(&sql)?;
        let codes = stmt
            .query_map(params![concept_code], |row| read_code(row.get_ref(0)?, self.code_type))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(codes
            .into_iter()
            .map(|code| TermEncoding {
                schema: schema.clone(),
                code,
            })
            .collect())
    }
}

fn read_code(value: ValueRef<'_>, code_type: CodeType) -> rusqlite::Result<EncodedCode> {
    let mismatch = || {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            value.data_type(),
            format!("not a {code_type:?} code").into(),
        )
    };
    let code = match value {
        ValueRef::Integer(n) if code_type.is_numeric() => {
            if code_type.is_narrow() && i32::try_from(n).is_err() {
                return Err(mismatch());
            }
            EncodedCode::Number(n)
        }
        ValueRef::Integer(n) => EncodedCode::Text(n.to_string()),
        ValueRef::Real(f) if !code_type.is_numeric() => EncodedCode::Text(f.to_string()),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|_| mismatch())?;
            parse_code(text, code_type).ok_or_else(mismatch)?
        }
        _ => return Err(mismatch()),
    };
    Ok(code)
}

impl TermEncoder for SqliteEncoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn encodings(&self, concept_code: i64) -> Vec<TermEncoding> {
        match self.query(concept_code) {
            Ok(found) => {
                debug!("Encoder {}: {} codes for {concept_code}", self.name, found.len());
                found
            }
            Err(e) => {
                error!("Encoder {}: lookup of {concept_code} failed: {e}", self.name);
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryEncoder
// ---------------------------------------------------------------------------

/// Encoder holding its codes in a map.
#[derive(Debug, Default)]
pub struct MemoryEncoder {
    name: String,
    codes: HashMap<i64, Vec<TermEncoding>>,
}

impl MemoryEncoder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            codes: HashMap::new(),
        }
    }

    /// Build from an inline `CUI:CODE|CUI:CODE` list. Malformed pairs are
    /// logged and skipped.
    pub fn from_list(name: &str, code_type: CodeType, list: &str) -> Self {
        let mut encoder = Self::new(name);
        let schema = schema_for(name, code_type);
        for pair in list.split('|').map(str::trim).filter(|p| !p.is_empty()) {
            let parsed = pair.split_once(':').and_then(|(cui, code)| {
                Some((parse_concept_code(cui)?, parse_code(code, code_type)?))
            });
            match parsed {
                Some((cui, code)) => encoder.insert(
                    cui,
                    TermEncoding {
                        schema: schema.clone(),
                        code,
                    },
                ),
                None => warn!("Encoder {name}: malformed pair '{pair}', expected CUI:CODE"),
            }
        }
        info!("Encoder {name} loaded codes for {} concepts", encoder.codes.len());
        encoder
    }

    /// Add one code. Repeated codes are stored once.
    pub fn insert(&mut self, concept_code: i64, encoding: TermEncoding) {
        let codes = self.codes.entry(concept_code).or_default();
        if !codes.contains(&encoding) {
            codes.push(encoding);
        }
    }

    pub fn len(&self) -> usize {
        self.codes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl TermEncoder for MemoryEncoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn encodings(&self, concept_code: i64) -> Vec<TermEncoding> {
        self.codes.get(&concept_code).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
