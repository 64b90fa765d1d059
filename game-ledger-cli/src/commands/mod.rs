pub(crate) mod config;
pub(crate) mod match_rows;
pub(crate) mod sources;
pub(crate) mod status;
