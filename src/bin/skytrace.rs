use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "skytrace", version)]
struct Cli {
    /// Log verbosity written to stderr.
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the single frame at one instant as a PNG.
    Frame(FrameArgs),
    /// Render every grid timestep to a PNG sequence or an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input run manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Instant to render, RFC 3339 or `dd/mm/yy HH:MM:SS` (UTC).
    #[arg(long)]
    time: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputKind {
    /// Decide from the `--out` extension: `.mp4` is video, anything else a PNG directory.
    Auto,
    Png,
    Mp4,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input run manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for PNGs, or MP4 file path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputKind::Auto)]
    format: OutputKind,

    /// Suffix of PNG file names (`0001_<tag>.png`).
    #[arg(long, default_value = "frame")]
    tag: String,

    /// Replace existing outputs instead of keeping them.
    #[arg(long)]
    overwrite: bool,

    /// Video frame rate.
    #[arg(long, default_value_t = 10)]
    fps: u32,

    /// Override the manifest's grid step, e.g. `30s` or `2m`.
    #[arg(long)]
    step: Option<String>,

    /// Render timesteps on a thread pool.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for `--parallel` (default: all cores).
    #[arg(long)]
    threads: Option<usize>,

    /// Also write the run summary as JSON.
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log_level)
        .init();

    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_manifest(path: &Path) -> anyhow::Result<skytrace::RunManifest> {
    skytrace::RunManifest::from_path(path)
        .with_context(|| format!("load run manifest '{}'", path.display()))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let manifest = read_manifest(&args.in_path)?;
    let inputs = manifest.load()?;
    let t = skytrace::io::csv_trajectory::parse_timestamp(&args.time)
        .with_context(|| format!("parse --time '{}'", args.time))?;

    match skytrace::render_frame_at(&inputs, &manifest.config, t)? {
        skytrace::TimestepOutcome::Composited(frame) => {
            skytrace::write_png(&args.out, &frame.raster)?;
            eprintln!("wrote {} (scene {})", args.out.display(), frame.scene_id);
            Ok(())
        }
        skytrace::TimestepOutcome::Failed(step) => {
            anyhow::bail!("no frame at {}: {}", step.timestamp, step.reason)
        }
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let manifest = read_manifest(&args.in_path)?;
    let mut config = manifest.config.clone();
    if let Some(step) = &args.step {
        config.grid.step = skytrace::parse_duration(step)?;
    }
    if args.parallel {
        config.threading.parallel = true;
    }
    if args.threads.is_some() {
        config.threading.threads = args.threads;
    }
    config.validate()?;

    let inputs = manifest.load()?;
    let grid = config.grid_for(&inputs.trajectory)?;

    let is_mp4 = match args.format {
        OutputKind::Mp4 => true,
        OutputKind::Png => false,
        OutputKind::Auto => args
            .out
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("mp4")),
    };
    let mut sink: Box<dyn skytrace::FrameSink> = if is_mp4 {
        let mut opts = skytrace::FfmpegSinkOpts::new(&args.out);
        opts.overwrite = args.overwrite;
        opts.fps = args.fps;
        Box::new(skytrace::FfmpegSink::new(opts))
    } else {
        Box::new(skytrace::PngSequenceSink::new(
            &args.out,
            args.tag.clone(),
            args.overwrite,
        ))
    };

    let stop = skytrace::StopSignal::new();
    let summary = skytrace::render_run(&inputs, &config, grid, sink.as_mut(), &stop)?;

    if let Some(path) = &args.summary {
        let f = std::fs::File::create(path)
            .with_context(|| format!("create summary '{}'", path.display()))?;
        serde_json::to_writer_pretty(f, &summary).with_context(|| "write summary JSON")?;
    }
    eprintln!(
        "wrote {} of {} frames to {} ({} skipped, {} already present)",
        summary.frames_emitted,
        summary.grid_len,
        args.out.display(),
        summary.skipped.len(),
        summary.already_present
    );
    Ok(())
}
