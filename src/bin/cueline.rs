use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cueline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the slide timeline from a manifest and print it as JSON.
    Timeline(TimelineArgs),
    /// Resolve one animation block's state at a frame.
    State(StateArgs),
    /// Compute narration segments for a highlighted block.
    Segments(SegmentsArgs),
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Narration manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Session content JSON (question records).
    #[arg(long)]
    session: PathBuf,

    /// Directory of per-audio word timing JSON files.
    #[arg(long)]
    timings_dir: PathBuf,

    /// Directory of choreography JSON documents.
    #[arg(long)]
    choreo_dir: PathBuf,

    /// Frames per second override.
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Parser, Debug)]
struct StateArgs {
    /// Choreography JSON document.
    #[arg(long)]
    choreo: PathBuf,

    /// Block id within the document.
    #[arg(long)]
    block: String,

    /// Global frame to resolve.
    #[arg(long)]
    frame: u64,

    /// Child index for staggered groups.
    #[arg(long)]
    child: Option<usize>,

    /// Frames per second override.
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Parser, Debug)]
struct SegmentsArgs {
    /// Choreography JSON document.
    #[arg(long)]
    choreo: PathBuf,

    /// Block id whose highlight window to partition.
    #[arg(long)]
    block: String,

    /// Comma-separated item texts.
    #[arg(long)]
    items: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Timeline(args) => cmd_timeline(args),
        Command::State(args) => cmd_state(args),
        Command::Segments(args) => cmd_segments(args),
    }
}

fn engine_config(fps: Option<u32>) -> anyhow::Result<cueline::EngineConfig> {
    let mut config = cueline::EngineConfig::default();
    if let Some(num) = fps {
        config.fps = cueline::Fps::new(num, 1).context("invalid fps")?;
    }
    Ok(config)
}

fn read_choreography(path: &Path) -> anyhow::Result<cueline::SlideChoreography> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("open choreography '{}'", path.display()))?;
    let choreo: cueline::SlideChoreography =
        serde_json::from_str(&raw).with_context(|| "parse choreography JSON")?;
    choreo.validate()?;
    Ok(choreo)
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let config = engine_config(args.fps)?;
    let ctx = cueline::SessionContext::load(
        &args.manifest,
        &args.session,
        &args.timings_dir,
        &args.choreo_dir,
    )?;

    let timeline = cueline::TimelineBuilder::new(&ctx, &config).build();
    if timeline.is_empty() {
        eprintln!("{}", cueline::NO_CONTENT_NOTICE);
    }
    println!("{}", serde_json::to_string_pretty(&timeline)?);
    Ok(())
}

fn cmd_state(args: StateArgs) -> anyhow::Result<()> {
    let config = engine_config(args.fps)?;
    let choreo = read_choreography(&args.choreo)?;
    let block = choreo.animation(&args.block);
    if block.is_none() {
        eprintln!(
            "block '{}' not found in '{}', resolving default state",
            args.block, choreo.slide_id
        );
    }

    let state = cueline::resolve(block, args.frame, args.child, config.fps);
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn cmd_segments(args: SegmentsArgs) -> anyhow::Result<()> {
    let config = cueline::EngineConfig::default();
    let choreo = read_choreography(&args.choreo)?;
    let items: Vec<&str> = args
        .items
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    anyhow::ensure!(!items.is_empty(), "--items must name at least one item");

    let highlight = choreo.highlight(&args.block);
    let transcript = choreo
        .narration
        .as_ref()
        .map(|n| n.word_timings.as_slice())
        .unwrap_or_default();

    let segments = cueline::segments_for(&items, highlight, transcript, &config.align);
    println!("{}", serde_json::to_string_pretty(&segments)?);
    Ok(())
}
