//! Job execution engine.
//!
//! Wires Loader → Filter/Sorter → (Transformer | Enricher) → Exporter for each
//! job and reports what happened.

use super::spec::{
    CONTACT_ACTIONS_EXPORT, ContactActionsJob, JobSpec, PEOPLE_EA_UPLOAD_EXPORT, PEOPLE_EXPORT,
    PIPELINE_INSTANCES_EXPORT, PeopleJob, PipelineInstancesJob, SourceFile,
};
use crate::error::{Result, ResultExt as _};
use crate::sheet::{Exporter, load, load_path};
use crate::transform::{Enrichment, enrich_pipeline, filter_sort, split_contact_info};
use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Report generated after a job run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Which job produced this report
    pub job: &'static str,

    /// Number of rows loaded from the source
    pub rows_before: usize,

    /// Number of rows exported
    pub rows_after: usize,

    /// Number of columns exported
    pub columns_after: usize,

    /// Files written, in write order
    pub outputs: Vec<PathBuf>,

    /// Time taken for execution
    pub duration: Duration,
}

impl RunReport {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    /// Create a summary message
    pub fn summary(&self) -> String {
        format!(
            "{} completed: {} rows ({} → {}, {} removed), {} columns, {} file(s) written, {:.2}s",
            self.job,
            if self.rows_after == self.rows_before {
                "unchanged"
            } else {
                "filtered"
            },
            self.rows_before,
            self.rows_after,
            self.rows_removed(),
            self.columns_after,
            self.outputs.len(),
            self.duration.as_secs_f64()
        )
    }
}

/// Execute any job spec
pub fn run_job(spec: &JobSpec, exporter: &Exporter) -> Result<RunReport> {
    log::info!("Running {} job", spec.name());
    let report = match spec {
        JobSpec::ContactActions(job) => run_contact_actions(job, exporter),
        JobSpec::People(job) => run_people(job, exporter),
        JobSpec::PipelineInstances(job) => run_pipeline_instances(job, exporter),
    }?;
    log::info!("{}", report.summary());
    Ok(report)
}

/// Filter and sort contact actions, split "Contact Info Value", export CSV.
pub fn run_contact_actions(job: &ContactActionsJob, exporter: &Exporter) -> Result<RunReport> {
    let start = Instant::now();
    let original = load_source(&job.source)?;

    let filtered = filter_sort(&original, &job.blocklist, &job.column)?;
    log::info!(
        "Removed {} of {} contact action rows",
        filtered.rows_removed(),
        filtered.rows_before
    );
    let df = split_contact_info(&filtered.frame)?;

    let output = exporter.export_single(&df, CONTACT_ACTIONS_EXPORT)?;
    log::info!("Wrote {}", output.display());

    Ok(RunReport {
        job: "contact actions",
        rows_before: filtered.rows_before,
        rows_after: df.height(),
        columns_after: df.width(),
        outputs: vec![output],
        duration: start.elapsed(),
    })
}

/// Filter and sort people, export the two-sheet workbook and the upload CSV.
pub fn run_people(job: &PeopleJob, exporter: &Exporter) -> Result<RunReport> {
    let start = Instant::now();
    let original = load_source(&job.source)?;

    let filtered = filter_sort(&original, &job.blocklist, &job.column)?;
    log::info!(
        "Removed {} of {} people rows",
        filtered.rows_removed(),
        filtered.rows_before
    );

    let workbook = exporter.export_dual(&original, &filtered.frame, PEOPLE_EXPORT)?;
    log::info!("Wrote {}", workbook.display());
    let upload = exporter.export_single(&filtered.frame, PEOPLE_EA_UPLOAD_EXPORT)?;
    log::info!("Wrote {}", upload.display());

    Ok(RunReport {
        job: "people",
        rows_before: filtered.rows_before,
        rows_after: filtered.rows_after,
        columns_after: filtered.frame.width(),
        outputs: vec![workbook, upload],
        duration: start.elapsed(),
    })
}

/// Filter pipeline instances, join people when given, export CSV.
pub fn run_pipeline_instances(
    job: &PipelineInstancesJob,
    exporter: &Exporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let pipeline = load_source(&job.source)?;
    let people = job.people.as_ref().map(load_source).transpose()?;

    let enrichment = match &people {
        Some(people) => Enrichment::WithPeople(people),
        None => {
            log::info!("No people table given, skipping enrichment");
            Enrichment::Skip
        }
    };
    let df = enrich_pipeline(
        &pipeline,
        enrichment,
        &job.status_blocklist,
        &job.step_blocklist,
    )?;
    log::info!(
        "Kept {} of {} pipeline instance rows",
        df.height(),
        pipeline.height()
    );

    let output = exporter.export_single(&df, PIPELINE_INSTANCES_EXPORT)?;
    log::info!("Wrote {}", output.display());

    Ok(RunReport {
        job: "pipeline instances",
        rows_before: pipeline.height(),
        rows_after: df.height(),
        columns_after: df.width(),
        outputs: vec![output],
        duration: start.elapsed(),
    })
}

fn load_source(source: &SourceFile) -> Result<DataFrame> {
    log::info!("Loading {}", source.path.display());
    match source.media_type {
        Some(media_type) => {
            let bytes = std::fs::read(&source.path)
                .with_context(|| format!("Failed to read {}", source.path.display()))?;
            load(&bytes, media_type)
        }
        None => load_path(&source.path),
    }
}
