use anyhow::Result;
use clap::Parser;
use pneumonia_detect::{config::Config, web::serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pneumonia-detect")]
#[command(about = "Chest X-ray pneumonia detection service")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8501")]
    bind: String,

    /// Number of worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Model directory path
    #[arg(long, default_value = "models")]
    models_dir: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Skip the random flip/rotation/translation applied before inference
    #[arg(long)]
    no_augment: bool,

    /// Seed for the augmentation RNG (same input, same augmentation)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level))
        )
        .with_target(false)
        .init();

    tracing::info!("Starting pneumonia detection service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Models directory: {}", args.models_dir);

    let config = Config::new(args.bind, args.models_dir, args.workers, args.dev)?
        .with_augmentation(!args.no_augment, args.seed);

    if config.augment.enabled {
        tracing::warn!(
            "Inference-time augmentation is enabled, confidence may vary between runs (seed: {:?})",
            config.augment.seed
        );
    }

    // workers 决定 tokio 工作线程数量
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))?;

    Ok(())
}
