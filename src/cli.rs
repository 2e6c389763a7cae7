use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use rise_processor::config::Settings;
use rise_processor::pipeline::{JobSpec, SourceFile, run_job};
use rise_processor::sheet::MediaType;
use rise_processor::table::Blocklist;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rise-processor",
    about = "Filter and reshape Reach exports for EA upload"
)]
pub struct Cli {
    /// Settings JSON file (blocklists, output directory, viewer)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory to write exports into. Overrides the settings file.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Do not open exported files in the default viewer
    #[arg(long, global = true)]
    pub no_open: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a contact actions sheet into the contact actions CSV
    ContactActions {
        /// Contact actions sheet (CSV or XLSX)
        file: PathBuf,

        /// Declared MIME type of FILE. Defaults to the file extension.
        #[arg(long = "type", value_name = "MIME")]
        mime: Option<String>,

        /// Action type to drop. Repeat to drop several; replaces the defaults.
        #[arg(long, value_name = "VALUE")]
        remove: Vec<String>,
    },
    /// Process a people sheet into the PTG/EA Upload workbook and CSV
    People {
        /// People sheet (CSV or XLSX)
        file: PathBuf,

        /// Declared MIME type of FILE. Defaults to the file extension.
        #[arg(long = "type", value_name = "MIME")]
        mime: Option<String>,

        /// Source tag to drop. Repeat to drop several; replaces the defaults.
        #[arg(long, value_name = "VALUE")]
        remove: Vec<String>,
    },
    /// Process a pipeline instances sheet, optionally merged with people
    PipelineInstances {
        /// Pipeline instances sheet (CSV or XLSX)
        file: PathBuf,

        /// People sheet to join on "Reach ID"
        #[arg(long)]
        people: Option<PathBuf>,

        /// Declared MIME type of FILE. Defaults to the file extension.
        #[arg(long = "type", value_name = "MIME")]
        mime: Option<String>,

        /// Status to drop. Repeat to drop several; replaces the defaults.
        #[arg(long, value_name = "VALUE")]
        remove_status: Vec<String>,

        /// Step to drop. Repeat to drop several; replaces the defaults.
        #[arg(long, value_name = "VALUE")]
        remove_step: Vec<String>,
    },
    /// Run a job described by a JSON spec file
    Run {
        /// Path to the job spec JSON
        #[arg(long)]
        spec: PathBuf,
    },
    /// Write the default settings to a JSON file
    InitConfig {
        /// Where to write the settings
        path: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(dir) = cli.output_dir {
        settings.output_dir = dir;
    }
    if cli.no_open {
        settings.open_after_export = false;
    }

    let spec = match cli.command {
        Commands::InitConfig { path } => {
            Settings::default()
                .to_file(&path)
                .with_context(|| format!("Failed to write settings to {}", path.display()))?;
            println!("Wrote default settings to {}", path.display());
            return Ok(());
        }
        command => build_job(command, &settings)?,
    };

    let report = run_job(&spec, &settings.exporter())
        .with_context(|| format!("The {} job failed", spec.name()))?;

    println!("{}", report.summary());
    for path in &report.outputs {
        println!("  {}", path.display());
    }
    Ok(())
}

fn build_job(command: Commands, settings: &Settings) -> Result<JobSpec> {
    let spec = match command {
        Commands::ContactActions { file, mime, remove } => {
            let mut job = settings.contact_actions_job(source(file, mime.as_deref())?);
            override_blocklist(&mut job.blocklist, remove);
            JobSpec::ContactActions(job)
        }
        Commands::People { file, mime, remove } => {
            let mut job = settings.people_job(source(file, mime.as_deref())?);
            override_blocklist(&mut job.blocklist, remove);
            JobSpec::People(job)
        }
        Commands::PipelineInstances {
            file,
            people,
            mime,
            remove_status,
            remove_step,
        } => {
            let mut job = settings
                .pipeline_instances_job(source(file, mime.as_deref())?, people.map(SourceFile::new));
            override_blocklist(&mut job.status_blocklist, remove_status);
            override_blocklist(&mut job.step_blocklist, remove_step);
            JobSpec::PipelineInstances(job)
        }
        Commands::Run { spec } => JobSpec::from_file(&spec)
            .with_context(|| format!("Failed to load job spec {}", spec.display()))?,
        Commands::InitConfig { .. } => anyhow::bail!("init-config does not describe a job"),
    };
    Ok(spec)
}

fn source(path: PathBuf, mime: Option<&str>) -> Result<SourceFile> {
    let media_type = mime.map(MediaType::from_mime).transpose()?;
    Ok(SourceFile { path, media_type })
}

fn override_blocklist(blocklist: &mut Blocklist, values: Vec<String>) {
    if !values.is_empty() {
        *blocklist = Blocklist::from_strs(values);
    }
}
