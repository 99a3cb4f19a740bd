// crates/db/src/queries.rs
// Typed CRUD for recordings, transcripts and summaries.

pub mod recordings;
pub mod summaries;
pub mod transcripts;
