mod cli;

use mediaforge::{
    config,
    conversion::{FfmpegTranscoder, TaskState},
    server::{self, AppContext},
};
use mediaforge_common::MediaKind;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::time::Duration;

/// How often `convert` polls the task while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting mediaforge server");
    tracing::info!(
        audio_dir = %config.storage.audio_dir().display(),
        video_dir = %config.storage.video_dir().display(),
        output_dir = %config.storage.output_dir().display(),
        "Storage layout"
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediaforge=trace,tower_http=debug".to_string()
        } else {
            "mediaforge=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Convert {
            kind,
            filename,
            format,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_file(kind, &filename, &format, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediaforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn convert_file(
    kind: MediaKind,
    filename: &str,
    format: &str,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    if !config.conversion.allows_format(format) {
        anyhow::bail!("Unsupported target format: {}", format);
    }

    let ctx = AppContext::from_config(config)?;
    let task_id = ctx
        .manager
        .start_conversion(filename, &format.to_ascii_lowercase(), kind)
        .await?;
    println!("Task {} started", task_id);

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let mut last_state = TaskState::Preparing;
    loop {
        ticker.tick().await;
        let task = ctx.manager.get_task(task_id)?;

        if task.state() != last_state {
            last_state = task.state();
            println!("  {}", last_state);
        }

        match task.state() {
            TaskState::Ready => {
                if let Some(path) = task.output_path() {
                    println!("\nConversion complete!");
                    println!("Output: {}", path.display());
                }
                return Ok(());
            }
            TaskState::Error => {
                anyhow::bail!(
                    "Conversion failed: {}",
                    task.error_detail().unwrap_or("unknown error")
                );
            }
            TaskState::Preparing | TaskState::Processing => {}
        }
    }
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tool = FfmpegTranscoder::locate(config.conversion.ffmpeg_path.as_deref()).check();

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);

    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }

    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }

    println!();
    println!();
    if tool.available {
        println!("All required tools are available!");
    } else {
        println!("The codec tool is missing. Install ffmpeg or set conversion.ffmpeg_path.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Audio library: {}", config.storage.audio_dir().display());
            println!("  Video library: {}", config.storage.video_dir().display());
            println!("  Output: {}", config.storage.output_dir().display());
            match config.conversion.max_concurrent {
                Some(n) => println!("  Max concurrent conversions: {}", n),
                None => println!("  Max concurrent conversions: unbounded"),
            }
            match config.conversion.timeout_secs {
                Some(secs) => println!("  Conversion timeout: {}s", secs),
                None => println!("  Conversion timeout: none"),
            }
            println!(
                "  Allowed formats: {}",
                config.conversion.allowed_formats.join(", ")
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
