use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use medical_coding_client::{
    api::{HttpWorkflowApi, WorkflowApi},
    config::Config,
    models::{DocumentSubmission, DocumentType},
    poller::{PollerEvent, WorkflowPoller},
    report, tui, utils,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Submit medical documents for ICD-10 coding and follow the workflow.
#[derive(Parser)]
#[command(name = "medcode", version, about)]
struct Cli {
    /// Base URL of the workflow service
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Milliseconds between status checks
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Give up on a job after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Run one job and print the coding report
    Submit(SubmitArgs),
    /// List the service's sample documents
    Samples {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct SubmitArgs {
    #[command(flatten)]
    source: Source,

    /// Patient name; defaults to "Unknown"
    #[arg(long, short = 'n')]
    patient_name: Option<String>,

    /// consultation, discharge_summary, emergency_consultation, follow_up, inpatient_admission
    #[arg(long = "type", short = 't')]
    document_type: Option<DocumentType>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// Document text
    #[arg(long)]
    content: Option<String>,

    /// Read the document from a file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Use sample document N (1-based) from the service
    #[arg(long)]
    sample: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.polling.interval_ms = ms;
    }
    if let Some(secs) = cli.timeout_secs {
        config.polling.timeout_secs = secs;
    }
    config.validate()?;

    let api: Arc<dyn WorkflowApi> = Arc::new(
        HttpWorkflowApi::from_config(&config.api).context("Failed to build HTTP client")?,
    );

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            // The screen belongs to the UI; logs go to a file
            let _guard = utils::init_file(&config.logging.directory, &config.logging.filter)?;
            info!("Configuration loaded: {:?}", config);
            tui::run(config, api).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Submit(args) => {
            utils::init_stderr(&config.logging.filter);
            info!("Configuration loaded: {:?}", config);
            run_submit(config, api, args).await
        }
        Command::Samples { json } => {
            utils::init_stderr(&config.logging.filter);
            list_samples(api.as_ref(), json).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn build_submission(api: &dyn WorkflowApi, args: &SubmitArgs) -> Result<DocumentSubmission> {
    let name = args.patient_name.as_deref().unwrap_or("");
    let doc_type = args.document_type.unwrap_or_default();

    if let Some(content) = &args.source.content {
        return Ok(DocumentSubmission::new(name, doc_type, content));
    }

    if let Some(path) = &args.source.file {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(DocumentSubmission::new(name, doc_type, content));
    }

    let index = args.source.sample.context("No document source given")?;
    let samples = api
        .sample_documents()
        .await
        .context("Failed to load sample documents")?;
    let sample = index
        .checked_sub(1)
        .and_then(|i| samples.get(i))
        .with_context(|| format!("Sample {} not found ({} available)", index, samples.len()))?;

    let mut submission = sample.to_submission();
    if let Some(name) = &args.patient_name {
        submission = DocumentSubmission::new(name, submission.document_type, submission.content);
    }
    if let Some(doc_type) = args.document_type {
        submission.document_type = doc_type;
    }
    Ok(submission)
}

async fn run_submit(config: Config, api: Arc<dyn WorkflowApi>, args: SubmitArgs) -> Result<ExitCode> {
    let submission = build_submission(api.as_ref(), &args).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = WorkflowPoller::new(api, Arc::new(tx), config.polling.settings());

    let workflow_id = match poller.submit(submission).await {
        Ok(id) => id,
        Err(e) => {
            error!("Submission failed: {}", e);
            eprintln!("Error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    eprintln!("Workflow {} started", workflow_id);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(PollerEvent::Progress { progress, message, .. }) => {
                    eprintln!("[{:>3.0}%] {}", progress, message.unwrap_or_default());
                }
                Some(PollerEvent::Completed { workflow_id, result }) => {
                    if args.json {
                        let body = serde_json::json!({
                            "workflow_id": workflow_id,
                            "result": result,
                        });
                        println!("{}", serde_json::to_string_pretty(&body)?);
                    } else {
                        print!("{}", report::render_text(&workflow_id, &result));
                    }
                    let (notice, _) = result.completion_notice();
                    match poller.snapshot() {
                        Some(job) => eprintln!("{} ({:.1}s)", notice, job.elapsed().as_secs_f64()),
                        None => eprintln!("{}", notice),
                    }
                    return Ok(ExitCode::SUCCESS);
                }
                Some(PollerEvent::Failed(e)) => {
                    eprintln!("Error: {}", e);
                    return Ok(ExitCode::FAILURE);
                }
                Some(PollerEvent::PhaseChanged(_)) => {}
                None => anyhow::bail!("Poller event channel closed unexpectedly"),
            },
            _ = &mut ctrl_c => {
                poller.cancel();
                eprintln!("Cancelled");
                return Ok(ExitCode::from(130));
            }
        }
    }
}

async fn list_samples(api: &dyn WorkflowApi, json: bool) -> Result<()> {
    let samples = api
        .sample_documents()
        .await
        .context("Failed to load sample documents")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&samples)?);
        return Ok(());
    }

    for (i, sample) in samples.iter().enumerate() {
        println!("{:>2}. {} ({})", i + 1, sample.name, sample.document_type);
    }
    Ok(())
}
