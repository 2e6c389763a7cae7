//! # RISE Processor
//!
//! Turns raw Reach CRM exports into the cleaned files EA expects.
//!
//! The flow is always Loader → Filter/Sorter → (Transformer | Enricher) → Exporter:
//!
//! ```no_run
//! use rise_processor::sheet::{Exporter, load_path};
//! use rise_processor::table::Blocklist;
//! use rise_processor::transform::{filter_sort, split_contact_info};
//!
//! let df = load_path("actions.csv".as_ref())?;
//! let filtered = filter_sort(&df, &Blocklist::from_strs(["Up Vote"]), "Action Type")?;
//! let out = split_contact_info(&filtered.frame)?;
//! Exporter::new("exports", false).export_single(&out, "actions_out.csv")?;
//! # Ok::<(), rise_processor::error::ProcessorError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`sheet`]: CSV/XLSX loading and CSV/workbook export
//! - [`table`]: typed cell values, blocklists, column lookup
//! - [`transform`]: filtering, contact splitting, pipeline enrichment
//! - [`pipeline`]: the three jobs and their JSON specs
//! - [`config`]: persisted settings
//! - [`error`]: error type shared by every stage

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod sheet;
pub mod table;
pub mod transform;
