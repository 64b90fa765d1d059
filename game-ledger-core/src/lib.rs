//! Data model shared by every game-ledger crate: ledger rows, external
//! sources and scored match candidates.

pub mod candidate;
pub mod region;
pub mod row;
pub mod settings;
pub mod source;

pub use candidate::{MatchCandidate, ValidationInfo};
pub use region::{Region, RegionParseError};
pub use row::LedgerRow;
pub use source::{DataSource, DataSourceParseError};
