use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipset::cli::{Cli, Commands};
use clipset::{utils, AnnotationWriter, Config, HarvestPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "clipset=debug"
    } else {
        "clipset=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Run {
            manifest,
            labels,
            mode,
            max_items,
            base_dir,
            emit,
            timeout,
        } => {
            // Check for required external dependencies (non-fatal here;
            // individual items fail with context if a tool is truly absent)
            let missing_deps = utils::check_dependencies().await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in &missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            let mut config = Config::load().await?;
            config.apply_run_overrides(max_items, base_dir, timeout);
            config.validate()?;

            let policy = emit.unwrap_or_else(|| mode.default_policy());
            let writer = AnnotationWriter::new(mode, &labels, policy)?;

            tracing::info!(
                "Starting {} mode dataset run over {}",
                mode,
                manifest.display()
            );

            let pipeline = HarvestPipeline::new(config, !cli.quiet)?;
            let summary = pipeline.run(&manifest, &writer).await?;

            summary.display();
        }
        Commands::Check => {
            let missing = utils::check_dependencies().await;
            if missing.is_empty() {
                println!("All required external tools are available:");
                println!("  • yt-dlp");
                println!("  • ffmpeg");
            } else {
                println!("Missing external tools:");
                for dep in &missing {
                    println!("  • {}", dep);
                }
                std::process::exit(1);
            }
        }
        Commands::Config { show } => {
            let config = Config::load().await?;
            if show {
                config.display();
            } else {
                config.save().await?;
                println!("Configuration written to {}", Config::path()?.display());
            }
        }
    }

    Ok(())
}
