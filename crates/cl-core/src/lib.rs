pub mod candidate;
pub mod case;
pub mod db;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod pivot;
pub mod schema;
pub mod term;
pub mod token;

pub use candidate::*;
pub use case::*;
pub use encoding::*;
pub use error::*;
pub use hash::*;
pub use pivot::*;
pub use term::*;
pub use token::*;
