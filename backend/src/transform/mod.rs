//! Mapping of raw records onto the canonical schemas.
//!
//! - [`alias`] - Accepted source spellings per canonical field
//! - [`coerce`] - Loose value coercion
//! - [`canonical`] - Raw record to canonical record
//! - [`pipeline`] - End-to-end ingestion of pasted text

pub mod alias;
pub mod canonical;
pub mod coerce;
pub mod pipeline;

pub use alias::{describe_aliases, AliasTable, CanonicalField, KeyIndex, Resolved};
pub use canonical::{
    canonicalize, canonicalize_all, MappingOutcome, Rejection, SkippedRow, DEFAULT_SUBJECT_SEMESTER,
};
pub use pipeline::{ingest, IngestOptions, IngestResult};
