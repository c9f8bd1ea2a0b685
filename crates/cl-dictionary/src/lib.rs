pub mod dictionary;
pub mod memory;
pub mod bsv;
pub mod sqlite;
pub mod encoder;
pub mod registry;
pub mod config;

pub use dictionary::{CasedDictionary, TierPolicy};
pub use memory::{MemoryDictionary, TierCounts};
pub use bsv::{load_bsv_file, load_bsv_list};
pub use sqlite::SqliteDictionary;
pub use registry::DictionaryRegistry;
pub use encoder::{parse_code, MemoryEncoder, SqliteEncoder, TermEncoder};
pub use config::{create_dictionary, create_encoder, DictionaryConfig, EncoderConfig};
