//! Match validation: decides whether an external search result denotes the
//! same game as a ledger row.

pub mod normalize;
pub mod platforms;
pub mod validator;

pub use normalize::Normalizer;
pub use validator::{CandidateFacts, MatchValidator};
