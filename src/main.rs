// src/main.rs - printqueue command-line tool
use clap::{Parser, Subcommand};
use printqueue_rs::config::load_config_or_default;
use printqueue_rs::queue::UNSAVED_ID;
use printqueue_rs::{active_profile, JobModel, JobRecord, MemoryApi, QueueConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "printqueue", version, about = "Inspect and commit print queue jobs")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "printqueue.toml")]
    config: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print derived progress for a job record
    Inspect {
        job: PathBuf,
        /// Active printer profile, overrides the config file
        #[arg(long)]
        profile: Option<String>,
    },
    /// Run an edit/commit round trip against an in-memory server
    Commit {
        job: PathBuf,
        #[arg(long)]
        profile: Option<String>,
    },
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn read_job(path: &Path, config: &QueueConfig) -> Result<JobRecord, BoxError> {
    let contents = std::fs::read_to_string(path)?;
    let mut record: JobRecord = serde_json::from_str(&contents)?;
    if record.queue.is_none() {
        record.queue = Some(config.queue.default_queue.clone());
    }
    Ok(record)
}

fn print_job(job: &JobModel) {
    println!("job {} \"{}\" [{}]{}", job.id(), job.name(), job.queue(), if job.draft() { " (draft)" } else { "" });
    println!(
        "  progress {}  total {}  completed {}",
        job.percent_complete(),
        job.total_length(),
        job.total_completed()
    );
    for set in job.sets() {
        let left = job
            .set_length_remaining(set.handle())
            .map(|n| n.to_string())
            .unwrap_or_else(|| " ".to_string());
        let mats: Vec<String> = set.materials_view().into_iter().map(|m| m.short_name).collect();
        println!(
            "  {:>4} {:<32} {:>7} {:>5} left {:>4} mats [{}]{}{}",
            set.id(),
            set.short_name(),
            set.progress_text(),
            set.percent_complete().to_string(),
            left,
            mats.join(""),
            if set.profile_matches() { "" } else { " (other profile)" },
            if set.missing_file() { " (missing)" } else { "" },
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = load_config_or_default(&cli.config)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Loaded configuration from: {}", cli.config);

    match cli.command {
        Command::Inspect { job, profile } => {
            let (_profile_tx, profile_rx) = active_profile(profile.or(config.queue.active_profile.clone()));
            let record = read_job(&job, &config)?;
            let model = JobModel::builder(record)
                .api(Arc::new(MemoryApi::new()))
                .profile(profile_rx)
                .build()?;
            print_job(&model);
        }
        Command::Commit { job, profile } => {
            let (_profile_tx, profile_rx) = active_profile(profile.or(config.queue.active_profile.clone()));
            let record = read_job(&job, &config)?;
            let api = Arc::new(MemoryApi::new());
            if record.id != UNSAVED_ID {
                tracing::info!("seeding in-memory server with job {}", record.id);
                api.insert_job(record.clone()).await;
            }
            let mut model = JobModel::builder(record)
                .api(api)
                .profile(profile_rx)
                .build()?;
            model.begin_edit().await?;
            model.end_edit().await?;
            print_job(&model);
            println!("{}", serde_json::to_string_pretty(&model.serialize())?);
        }
    }
    Ok(())
}
