//! Job specification and execution for the three Reach exports.
//!
//! A job names its input files and blocklists; running it loads, filters,
//! reshapes and writes the fixed export file names into an output directory.
//!
//! # Example: Programmatic Job Creation
//!
//! ```no_run
//! use rise_processor::pipeline::{ContactActionsJob, JobSpec, SourceFile, run_job};
//! use rise_processor::sheet::Exporter;
//!
//! let job = JobSpec::ContactActions(ContactActionsJob::new(SourceFile::new("actions.csv")));
//! let report = run_job(&job, &Exporter::new("exports", false))?;
//! println!("{}", report.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Jobs
//!
//! 1. **Contact actions**: drop blocklisted "Action Type" rows, split phone and
//!    email, add "Combined Name", write one CSV.
//! 2. **People**: drop blocklisted "Source Tag" rows, write a workbook holding
//!    the original and processed sheets plus the processed CSV.
//! 3. **Pipeline instances**: drop canceled and early-step rows, join the
//!    people table on "Reach ID" when one is given, write one CSV.

pub mod executor;
pub mod spec;

pub use executor::{
    RunReport, run_contact_actions, run_job, run_people, run_pipeline_instances,
};
pub use spec::{
    CONTACT_ACTIONS_EXPORT, ContactActionsJob, JobSpec, PEOPLE_EA_UPLOAD_EXPORT, PEOPLE_EXPORT,
    PIPELINE_INSTANCES_EXPORT, PeopleJob, PipelineInstancesJob, SOURCE_TAG, SourceFile,
};
