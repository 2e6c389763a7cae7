//! The pure data stages between loading and exporting.
//!
//! - [`filter`]: blocklist filtering and stable ascending sort
//! - [`contact`]: Email/Phone split and Combined Name for contact actions
//! - [`enrich`]: pipeline instance filtering plus the people left join
//!
//! Every function takes its input by reference and returns a new frame, so a
//! failure part way through never leaves a half-transformed table behind.

pub mod contact;
pub mod enrich;
pub mod filter;

pub use contact::split_contact_info;
pub use enrich::{Enrichment, enrich_pipeline, left_join};
pub use filter::{Filtered, filter_out, filter_sort, sort_by};
