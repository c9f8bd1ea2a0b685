pub mod discovered;
pub mod contiguous;
pub mod config;
pub mod result;
pub mod worker;

pub use discovered::{DiscoveredTerm, Span};
pub use contiguous::{ContiguousLookupEngine, TermMap};
pub use config::LookupConfig;
pub use result::*;
pub use worker::LookupEngine;
