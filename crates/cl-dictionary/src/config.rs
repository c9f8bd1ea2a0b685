use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cl_core::schema::TierTables;
use cl_core::{CodeType, LookupError, Result};

use crate::bsv::{load_bsv_file, load_bsv_list};
use crate::dictionary::CasedDictionary;
use crate::encoder::{MemoryEncoder, SqliteEncoder, TermEncoder};
use crate::sqlite::SqliteDictionary;

/// Declarative description of one dictionary.
///
/// ```json
/// { "type": "bsv", "name": "local", "path": "terms.bsv" }
/// { "type": "bsv_list", "name": "inline", "list": "55:fever|123:chest pain" }
/// { "type": "sqlite", "name": "snomed", "path": "snomed.db", "lower": "SNO_LOWER" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DictionaryConfig {
    Bsv {
        name: String,
        path: PathBuf,
    },
    BsvList {
        name: String,
        list: String,
    },
    Sqlite {
        name: String,
        path: PathBuf,
        #[serde(flatten)]
        tables: TierTables,
    },
}

impl DictionaryConfig {
    pub fn name(&self) -> &str {
        match self {
            DictionaryConfig::Bsv { name, .. }
            | DictionaryConfig::BsvList { name, .. }
            | DictionaryConfig::Sqlite { name, .. } => name,
        }
    }
}

/// Construct the dictionary a config describes.
///
/// BSV sources never fail (bad input degrades to an empty dictionary); a
/// SQLite source fails if the database is missing, cannot be opened, or
/// lacks a tier table.
pub fn create_dictionary(config: &DictionaryConfig) -> Result<Arc<dyn CasedDictionary>> {
    if config.name().trim().is_empty() {
        return Err(LookupError::Config("dictionary name must not be empty".into()));
    }
    let dictionary: Arc<dyn CasedDictionary> = match config {
        DictionaryConfig::Bsv { name, path } => Arc::new(load_bsv_file(name, path)),
        DictionaryConfig::BsvList { name, list } => Arc::new(load_bsv_list(name, list)),
        DictionaryConfig::Sqlite { name, path, tables } => {
            let path = utf8_path(name, path)?;
            Arc::new(SqliteDictionary::open(name.clone(), path, tables.clone())?)
        }
    };
    Ok(dictionary)
}

fn utf8_path<'a>(name: &str, path: &'a std::path::Path) -> Result<&'a str> {
    path.to_str()
        .ok_or_else(|| LookupError::Config(format!("{name}: path is not valid UTF-8")))
}

// ---------------------------------------------------------------------------
// EncoderConfig
// ---------------------------------------------------------------------------

/// Declarative description of one term encoder.
///
/// ```json
/// { "type": "sqlite", "name": "ICD10CM", "path": "codes.db" }
/// { "type": "sqlite", "name": "semantic", "path": "codes.db", "table": "TUI", "code_type": "tui" }
/// { "type": "list", "name": "local", "list": "55:R50.9|7:R07.9" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncoderConfig {
    Sqlite {
        name: String,
        path: PathBuf,
        /// Defaults to the encoder name in upper case.
        #[serde(default)]
        table: Option<String>,
        #[serde(default)]
        code_type: CodeType,
    },
    List {
        name: String,
        list: String,
        #[serde(default)]
        code_type: CodeType,
    },
}

impl EncoderConfig {
    pub fn name(&self) -> &str {
        match self {
            EncoderConfig::Sqlite { name, .. } | EncoderConfig::List { name, .. } => name,
        }
    }
}

/// Construct the encoder a config describes. A SQLite encoder fails if the
/// database or its code table is missing.
pub fn create_encoder(config: &EncoderConfig) -> Result<Arc<dyn TermEncoder>> {
    if config.name().trim().is_empty() {
        return Err(LookupError::Config("encoder name must not be empty".into()));
    }
    let encoder: Arc<dyn TermEncoder> = match config {
        EncoderConfig::Sqlite {
            name,
            path,
            table,
            code_type,
        } => {
            let path = utf8_path(name, path)?;
            let table = table.clone().unwrap_or_else(|| name.to_uppercase());
            Arc::new(SqliteEncoder::open(name.clone(), path, table, *code_type)?)
        }
        EncoderConfig::List {
            name,
            list,
            code_type,
        } => Arc::new(MemoryEncoder::from_list(name, *code_type, list)),
    };
    Ok(encoder)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
