//! Job specification data structures.
//!
//! Each entry point is described by an explicit job object. A [`JobSpec`] can
//! be read from JSON so that a run can be repeated without retyping flags.

use crate::error::{Result, ResultExt as _};
use crate::sheet::MediaType;
use crate::table::Blocklist;
use crate::transform::contact::ACTION_TYPE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Column filtered by the people job.
pub const SOURCE_TAG: &str = "Source Tag";

pub const CONTACT_ACTIONS_EXPORT: &str = "xx_to_xx_Contact_Actions_Export.csv";
pub const PEOPLE_EXPORT: &str = "xx_to_xx_People_Export.xlsx";
pub const PEOPLE_EA_UPLOAD_EXPORT: &str = "xx_to_xx_People_Export_EA_Upload.csv";
pub const PIPELINE_INSTANCES_EXPORT: &str = "xx_to_xx_Pipeline_Instances_Export.csv";

/// An input file plus an optional declared media type.
///
/// Without a declared type the file extension decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            media_type: None,
        }
    }
}

/// Filter contact actions, split contact info, export one CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactActionsJob {
    pub source: SourceFile,

    /// Action types to drop
    #[serde(default = "default_action_blocklist")]
    pub blocklist: Blocklist,

    /// Column the blocklist applies to and the sort key
    #[serde(default = "default_action_column")]
    pub column: String,
}

impl ContactActionsJob {
    pub fn new(source: SourceFile) -> Self {
        Self {
            source,
            blocklist: default_action_blocklist(),
            column: default_action_column(),
        }
    }
}

/// Filter people by source tag, export a two-sheet workbook and an upload CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeopleJob {
    pub source: SourceFile,

    /// Source tags to drop
    #[serde(default = "default_people_blocklist")]
    pub blocklist: Blocklist,

    #[serde(default = "default_people_column")]
    pub column: String,
}

impl PeopleJob {
    pub fn new(source: SourceFile) -> Self {
        Self {
            source,
            blocklist: default_people_blocklist(),
            column: default_people_column(),
        }
    }
}

/// Filter pipeline instances, optionally join people, export one CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineInstancesJob {
    pub source: SourceFile,

    /// People table to join on "Reach ID". Omit to filter and sort only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<SourceFile>,

    #[serde(default = "default_status_blocklist")]
    pub status_blocklist: Blocklist,

    #[serde(default = "default_step_blocklist")]
    pub step_blocklist: Blocklist,
}

impl PipelineInstancesJob {
    pub fn new(source: SourceFile, people: Option<SourceFile>) -> Self {
        Self {
            source,
            people,
            status_blocklist: default_status_blocklist(),
            step_blocklist: default_step_blocklist(),
        }
    }
}

/// Any job, tagged by `"job"` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum JobSpec {
    ContactActions(ContactActionsJob),
    People(PeopleJob),
    PipelineInstances(PipelineInstancesJob),
}

impl JobSpec {
    /// Load a job spec from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read job spec file")?;
        Self::from_json(&content)
    }

    /// Parse a job spec from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save job spec to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Short name used in logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            Self::ContactActions(_) => "contact actions",
            Self::People(_) => "people",
            Self::PipelineInstances(_) => "pipeline instances",
        }
    }
}

// Default value functions
pub fn default_action_blocklist() -> Blocklist {
    Blocklist::from_strs([
        "Person Added",
        "Up Vote",
        "Updated Address",
        "Updated Name",
        "Mark as Wrong",
        "Opt Out",
        "External Message",
    ])
}

pub fn default_people_blocklist() -> Blocklist {
    Blocklist::from_strs(["Reach Add"])
}

pub fn default_status_blocklist() -> Blocklist {
    Blocklist::from_strs(["canceled"])
}

pub fn default_step_blocklist() -> Blocklist {
    Blocklist::from_strs(["initial", "linkSentViaEmail", "linkSentViaMessaging"])
}

fn default_action_column() -> String {
    ACTION_TYPE.to_owned()
}

fn default_people_column() -> String {
    SOURCE_TAG.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessorError;
    use crate::table::Scalar;

    #[test]
    fn test_minimal_json_gets_default_blocklists() {
        let spec = JobSpec::from_json(r#"{"job": "people", "source": {"path": "people.xlsx"}}"#)
            .expect("Failed to parse");

        match spec {
            JobSpec::People(job) => {
                assert_eq!(job.source, SourceFile::new("people.xlsx"));
                assert_eq!(job.blocklist, default_people_blocklist());
                assert_eq!(job.column, SOURCE_TAG);
            }
            other => panic!("expected people job, got {other:?}"),
        }
    }

    #[test]
    fn test_pipeline_spec_roundtrip() {
        let mut job = PipelineInstancesJob::new(
            SourceFile::new("pipeline.csv"),
            Some(SourceFile {
                path: "people.bin".into(),
                media_type: Some(MediaType::Xlsx),
            }),
        );
        job.step_blocklist = Blocklist::from_strs(["initial"]);
        let spec = JobSpec::PipelineInstances(job);

        let json = spec.to_json().expect("Failed to serialize");
        assert!(json.contains("\"job\": \"pipeline_instances\""));
        assert!(json.contains("\"media_type\": \"xlsx\""));

        let parsed = JobSpec::from_json(&json).expect("Failed to parse");
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_blocklist_accepts_non_string_values() {
        let spec = JobSpec::from_json(
            r#"{"job": "contact_actions", "source": {"path": "a.csv"}, "blocklist": [3, null]}"#,
        )
        .expect("Failed to parse");

        let JobSpec::ContactActions(job) = spec else {
            panic!("expected contact actions job");
        };
        assert!(job.blocklist.contains(&Scalar::Int(3)));
        assert!(job.blocklist.contains(&Scalar::Null));
        assert_eq!(job.column, ACTION_TYPE);
    }

    #[test]
    fn test_unknown_job_is_config_error() {
        let result = JobSpec::from_json(r#"{"job": "invoices", "source": {"path": "a.csv"}}"#);
        assert!(matches!(result, Err(ProcessorError::Config(_))));
    }

    #[test]
    fn test_missing_spec_file_names_the_spec() {
        match JobSpec::from_file("/definitely/not/here/job.json") {
            Err(ProcessorError::Other(msg)) => {
                assert!(msg.starts_with("Failed to read job spec file"), "{msg}");
            }
            other => panic!("expected Other, got {other:?}"),
        }
    }

    #[test]
    fn test_default_action_blocklist() {
        let blocklist = default_action_blocklist();
        assert_eq!(blocklist.len(), 7);
        assert!(blocklist.contains(&Scalar::from("External Message")));
        assert!(!blocklist.contains(&Scalar::from("Call")));
    }
}
