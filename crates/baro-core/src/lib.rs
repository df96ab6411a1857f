//! Core data types, normalization and rollup calculations for barometric
//! observation datasets
//!
//! Raw records arrive from producers that disagree on key spelling
//! (`REF_YEAR` vs `refYear`). Everything in this crate is pure: it turns raw
//! JSON values into [`NormalizedRecord`]s and reduces them to a
//! [`StatsSummary`]. Fetching lives in `baro-ingest`.

pub mod fallback;
pub mod label;
pub mod normalize;
pub mod pipeline;
pub mod rollups;
pub mod source;
pub mod synth;
pub mod types;

pub use fallback::*;
pub use label::*;
pub use normalize::*;
pub use pipeline::*;
pub use rollups::*;
pub use source::*;
pub use synth::*;
pub use types::*;
