use crate::error::{Result, ResultExt as _};
use crate::pipeline::spec::{
    ContactActionsJob, PeopleJob, PipelineInstancesJob, SourceFile, default_action_blocklist,
    default_people_blocklist, default_status_blocklist, default_step_blocklist,
};
use crate::sheet::Exporter;
use crate::table::Blocklist;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default blocklists applied when a job is built from [`Settings`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BlocklistSettings {
    #[serde(default = "default_action_blocklist")]
    pub contact_actions: Blocklist,

    #[serde(default = "default_people_blocklist")]
    pub people: Blocklist,

    #[serde(default = "default_status_blocklist")]
    pub pipeline_status: Blocklist,

    #[serde(default = "default_step_blocklist")]
    pub pipeline_step: Blocklist,
}

impl Default for BlocklistSettings {
    fn default() -> Self {
        Self {
            contact_actions: default_action_blocklist(),
            people: default_people_blocklist(),
            pipeline_status: default_status_blocklist(),
            pipeline_step: default_step_blocklist(),
        }
    }
}

/// User settings, stored as JSON. Every field may be omitted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Directory the export files are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Launch the platform viewer on each written file
    #[serde(default = "default_true")]
    pub open_after_export: bool,

    #[serde(default)]
    pub blocklists: BlocklistSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            open_after_export: default_true(),
            blocklists: BlocklistSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn exporter(&self) -> Exporter {
        Exporter::new(&self.output_dir, self.open_after_export)
    }

    pub fn contact_actions_job(&self, source: SourceFile) -> ContactActionsJob {
        ContactActionsJob {
            blocklist: self.blocklists.contact_actions.clone(),
            ..ContactActionsJob::new(source)
        }
    }

    pub fn people_job(&self, source: SourceFile) -> PeopleJob {
        PeopleJob {
            blocklist: self.blocklists.people.clone(),
            ..PeopleJob::new(source)
        }
    }

    pub fn pipeline_instances_job(
        &self,
        source: SourceFile,
        people: Option<SourceFile>,
    ) -> PipelineInstancesJob {
        PipelineInstancesJob {
            source,
            people,
            status_blocklist: self.blocklists.pipeline_status.clone(),
            step_blocklist: self.blocklists.pipeline_step.clone(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}
