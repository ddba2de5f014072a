//! Cutline command-line front end.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cutline_editor::metrics::init_metrics;
use cutline_editor::{EditSession, EditorConfig};
use cutline_media::{check_ffmpeg, check_ffprobe, probe_duration_strict, FilterChainBuilder};
use cutline_models::ProjectFile;

/// Timeline video editor core
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print Prometheus metrics after the command finishes
    #[arg(long)]
    metrics: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a project file to a video
    Export {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
    /// Show the timeline of a project file
    Inspect {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },
    /// Print the duration of a media file
    Probe {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the JSON schema of project files
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let args = Args::parse();
    let metrics = if args.metrics { Some(init_metrics()?) } else { None };

    // Batch commands never need thumbnails or baked previews
    let config = EditorConfig {
        previews_enabled: false,
        ..EditorConfig::from_env()
    };

    match args.command {
        Command::Export { project, output } => export(config, &project, output).await?,
        Command::Inspect { project } => inspect(config, &project).await?,
        Command::Probe { file } => {
            check_ffprobe()?;
            let duration = probe_duration_strict(&file, config.render.timeouts.probe).await?;
            println!("{:.3}", duration);
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&ProjectFile::schema())?);
        }
    }

    if let Some(handle) = metrics {
        print!("{}", handle.render());
    }
    Ok(())
}

fn init_tracing() -> Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("cutline=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn export(config: EditorConfig, project: &Path, output: PathBuf) -> Result<()> {
    check_ffmpeg()?;
    check_ffprobe()?;

    let mut session = EditSession::new(config);
    let loaded = session
        .load_project(project)
        .await
        .with_context(|| format!("Cannot load {}", project.display()))?;
    info!(clips = loaded.clips_loaded, dropped = loaded.clips_dropped, "Project ready");

    let report = session
        .export(output)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    println!(
        "Exported {} clips to {} in {:.1}s",
        report.clip_count,
        report.output.display(),
        report.elapsed_secs
    );
    Ok(())
}

async fn inspect(config: EditorConfig, project: &Path) -> Result<()> {
    let filters = FilterChainBuilder::new(&config.lut_dir);
    let mut session = EditSession::new(config);
    let loaded = session
        .load_project(project)
        .await
        .with_context(|| format!("Cannot load {}", project.display()))?;

    println!(
        "{:>3}  {:<28} {:>8} {:>8} {:>6} {:>9}  {:<10} {}",
        "#", "media", "start", "end", "speed", "duration", "transition", "lut"
    );
    for (index, clip) in session.timeline().clips().iter().enumerate() {
        let end = clip
            .end()
            .map(|e| format!("{:.2}", e))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>3}  {:<28} {:>8.2} {:>8} {:>6.2} {:>9.2}  {:<10} {}",
            index,
            clip.media().name(),
            clip.start(),
            end,
            clip.speed(),
            clip.effective_duration(),
            clip.transition.as_str(),
            clip.lut_name()
        );

        let chains = filters.build(clip);
        if let Some(video) = chains.video_graph() {
            println!("     -vf {}", video);
        }
        if let Some(audio) = chains.audio_graph() {
            println!("     -af {}", audio);
        }
        for warning in &chains.warnings {
            println!("     ! {}", warning);
        }
    }

    println!(
        "total {:.2}s, {} clips ({} dropped)",
        session.timeline().total_duration(),
        loaded.clips_loaded,
        loaded.clips_dropped
    );
    if let Some(music) = session.bg_music() {
        println!("music {}", music.display());
    }
    Ok(())
}
