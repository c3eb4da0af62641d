//! packed-bench - Main Entry Point
//!
//! Times packed-to-planar conversion of raw frame files and writes per-frame
//! statistics plus the last frame's planes.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info};

use packed_transcode::bench::{self, BenchOptions, BenchmarkSpec};
use packed_transcode::cli::{self, Command, GenerateArgs, RunArgs};
use packed_transcode::cpu;
use packed_transcode::settings::BenchSettings;
use packed_transcode::telemetry::init_logging;

fn main() -> ExitCode {
    let command = match cli::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("{}", cli::USAGE);
            return ExitCode::FAILURE;
        }
    };

    let settings = match BenchSettings::load(command.config_path()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: loading settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Keep the guard alive so file logs are flushed on exit
    let _log_guard = match init_logging(&settings.log_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("warning: logging disabled: {e}");
            None
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "packed-bench starting");

    match run(command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, settings: &BenchSettings) -> Result<()> {
    match command {
        Command::Run(args) => run_benchmark(args, settings),
        Command::Generate(args) => generate(args),
        Command::List => {
            print!("{}", cli::listing(cpu::features()));
            Ok(())
        }
        Command::Config { init } => config(init, settings),
        Command::Help => {
            println!("{}", cli::USAGE);
            Ok(())
        }
    }
}

fn run_benchmark(args: RunArgs, settings: &BenchSettings) -> Result<()> {
    let spec = BenchmarkSpec {
        format: args.format,
        strategy: args.strategy,
        width: args.width,
        height: args.height,
    };
    let options = BenchOptions {
        input: args
            .input
            .unwrap_or_else(|| settings.input_dir.join(spec.input_file_name())),
        output_dir: args.output_dir.unwrap_or_else(|| settings.output_dir.clone()),
        max_frames: args.max_frames.or(settings.max_frames),
        write_planes: settings.write_planes && !args.no_planes,
    };

    let summary = bench::run(&spec, &options)
        .with_context(|| format!("benchmark {} {}x{}", spec.suffix(), spec.width, spec.height))?;

    println!(
        "{}: {} frames, avg {:.1} us, p50 {:.1} us, p95 {:.1} us, max {:.1} us ({:.1} fps)",
        spec.suffix(),
        summary.frames,
        summary.stats.avg_us,
        summary.stats.p50_us,
        summary.stats.p95_us,
        summary.stats.max_us,
        summary.stats.throughput_fps()
    );
    println!("stats: {}", summary.stats_path.display());
    for path in &summary.plane_paths {
        println!("plane: {}", path.display());
    }
    Ok(())
}

fn generate(args: GenerateArgs) -> Result<()> {
    let path = args.output_path();
    let frames = bench::generate(&path, args.format, args.width, args.height, args.frames, args.pattern)
        .with_context(|| format!("generating {}", path.display()))?;
    println!("wrote {frames} {} frames to {}", args.format.name(), path.display());
    Ok(())
}

fn config(init: bool, settings: &BenchSettings) -> Result<()> {
    if init {
        let path = BenchSettings::default()
            .save_new()
            .context("writing default settings")?;
        println!("wrote {}", path.display());
        return Ok(());
    }
    let path = BenchSettings::default_path()
        .map(|p: PathBuf| p.display().to_string())
        .unwrap_or_else(|| "<no config directory>".to_string());
    println!("# {path}");
    println!("{}", serde_json::to_string_pretty(settings).context("serializing settings")?);
    Ok(())
}
