//! CLI host for the Veo video generation node.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use veo_node::{EnvCredentialStore, FailurePolicy, InputItem, OutputRecord, VeoModel, VeoNode};

#[derive(Parser)]
#[command(name = "veo-node")]
#[command(about = "Generate videos with Google Veo, one per workflow item")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node over a batch of items
    Run(RunArgs),

    /// Print the node description as JSON
    Describe,
}

#[derive(Args)]
struct RunArgs {
    /// JSON file with an array of items (`[{"json": {"prompt": "..."}}]`); `-` reads stdin
    #[arg(short, long, conflicts_with = "prompt")]
    input: Option<PathBuf>,

    /// Generate a single video for this prompt
    #[arg(short, long)]
    prompt: Option<String>,

    /// Write videos into this directory instead of inlining them in the output
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Model identifier
    #[arg(long, default_value = "veo-3.1-generate-preview")]
    model: String,

    /// Seconds between status checks
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    /// Give up after this many seconds of polling
    #[arg(long)]
    timeout: Option<u64>,

    /// Give up after this many status checks
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Record per-item failures instead of aborting the batch
    #[arg(long)]
    continue_on_fail: bool,

    /// API endpoint override
    #[arg(long, env = "VEO_BASE_URL")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("veo_node=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await?,
        Commands::Describe => {
            println!("{}", serde_json::to_string_pretty(&VeoNode::description())?);
        }
    }

    Ok(())
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let items = load_items(&args).await?;

    let mut builder = VeoNode::builder()
        .model(VeoModel::from(args.model.as_str()))
        .poll_interval(Duration::from_secs(args.poll_interval));
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(n) = args.max_attempts {
        builder = builder.max_attempts(n);
    }
    if args.continue_on_fail {
        builder = builder.failure_policy(FailurePolicy::ContinueOnFail);
    }
    if let Some(url) = args.base_url {
        builder = builder.base_url(url);
    }
    let node = builder.build();

    // Ctrl-C stops polling at the next wait.
    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let mut records = node
        .execute(&items, &EnvCredentialStore, Some(&cancel_rx))
        .await?;

    if let Some(ref dir) = args.output_dir {
        std::fs::create_dir_all(dir)?;
        for (index, record) in records.iter_mut().enumerate() {
            write_video(record, dir, index)?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn load_items(args: &RunArgs) -> anyhow::Result<Vec<InputItem>> {
    if let Some(ref prompt) = args.prompt {
        return Ok(vec![InputItem::with_prompt(prompt.clone())]);
    }

    let text = match args.input.as_deref() {
        None => anyhow::bail!("either --prompt or --input is required"),
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
        Some(path) => tokio::fs::read_to_string(path).await?,
    };

    let items: Vec<InputItem> = serde_json::from_str(&text)?;
    if items.is_empty() {
        anyhow::bail!("input contains no items");
    }
    Ok(items)
}

/// Saves the attached video and replaces it in the record with its path.
fn write_video(record: &mut OutputRecord, dir: &std::path::Path, index: usize) -> anyhow::Result<()> {
    let Some(video) = record.video() else {
        return Ok(());
    };
    let extension = video.file_extension.as_deref().unwrap_or("mp4");
    let path = video.save_in(dir, &format!("video-{index}.{extension}"))?;
    let size = video.file_size;
    eprintln!("Saved video: {} ({} bytes)", path.display(), size);

    record.binary = None;
    if let Some(obj) = record.json.as_object_mut() {
        obj.insert(
            "savedTo".into(),
            serde_json::Value::String(path.display().to_string()),
        );
    }
    Ok(())
}
