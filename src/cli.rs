//! Command line parsing for `packed-bench`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cpu::CpuFeatures;
use crate::error::ConvertError;
use crate::format::SourceFormat;
use crate::geometry::validate_dimensions;
use crate::strategy::Strategy;
use crate::synth::Pattern;

pub const USAGE: &str = "\
usage:
  packed-bench <formatId> <modeId|name|auto> <width> <height> [--input PATH]
               [--output-dir DIR] [--max-frames N] [--config FILE] [--no-planes]
  packed-bench generate <formatId> <width> <height> <frames> [--output PATH]
               [--seed N] [--constant VALUE]
  packed-bench list
  packed-bench config [--init]";

/// Argument errors; all of them end the process with status 1.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    #[error("expected {expected} positional arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("option '{0}' needs a value")]
    MissingValue(String),
    #[error("invalid {name} '{value}': {reason}")]
    InvalidArgument {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// `packed-bench <format> <mode> <width> <height>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    pub format: SourceFormat,
    pub strategy: Strategy,
    pub width: usize,
    pub height: usize,
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub max_frames: Option<u64>,
    pub config: Option<PathBuf>,
    pub no_planes: bool,
}

/// `packed-bench generate <format> <width> <height> <frames>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    pub format: SourceFormat,
    pub width: usize,
    pub height: usize,
    pub frames: u64,
    pub output: Option<PathBuf>,
    pub pattern: Pattern,
}

impl GenerateArgs {
    /// `--output`, or `bench.<format>` in the working directory.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("bench.{}", self.format.name())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunArgs),
    Generate(GenerateArgs),
    List,
    Config { init: bool },
    Help,
}

impl Command {
    /// Settings file named on the command line, if any.
    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Run(args) => args.config.as_deref(),
            _ => None,
        }
    }
}

/// Splits arguments into positionals and `--flag [value]` pairs.
struct Split {
    positionals: Vec<String>,
    options: Vec<(String, Option<String>)>,
}

fn split(args: Vec<String>, valued: &[&str], switches: &[&str]) -> Result<Split, CliError> {
    let mut positionals = Vec::new();
    let mut options = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if !arg.starts_with("--") {
            positionals.push(arg);
            continue;
        }
        let (name, inline) = match arg.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(value.to_string())),
            None => (arg.clone(), None),
        };
        if switches.contains(&name.as_str()) {
            options.push((name, None));
        } else if valued.contains(&name.as_str()) {
            let value = match inline {
                Some(value) => value,
                None => iter.next().ok_or_else(|| CliError::MissingValue(name.clone()))?,
            };
            options.push((name, Some(value)));
        } else {
            return Err(CliError::UnknownOption(name));
        }
    }
    Ok(Split {
        positionals,
        options,
    })
}

impl Split {
    fn value(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(option, _)| option == name)
            .and_then(|(_, value)| value.as_deref())
    }

    fn flag(&self, name: &str) -> bool {
        self.options.iter().any(|(option, _)| option == name)
    }

    fn expect_positionals(&self, expected: usize) -> Result<(), CliError> {
        if self.positionals.len() != expected {
            return Err(CliError::ArgumentCount {
                expected,
                actual: self.positionals.len(),
            });
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: &str, reason: impl ToString) -> CliError {
    CliError::InvalidArgument {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, CliError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| invalid(name, value, e))
}

/// Accepts decimal or `0x`-prefixed hexadecimal.
fn parse_sample(value: &str) -> Result<u16, CliError> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| invalid("constant", value, e))
}

fn parse_format(value: &str) -> Result<SourceFormat, CliError> {
    value.parse().map_err(|e: String| invalid("format", value, e))
}

fn parse_dimensions(width: &str, height: &str) -> Result<(usize, usize), CliError> {
    let w: i64 = parse_number("width", width)?;
    let h: i64 = parse_number("height", height)?;
    Ok(validate_dimensions(w, h)?)
}

/// Parses arguments, program name excluded.
pub fn parse<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut args: Vec<String> = args.into_iter().collect();
    let Some(first) = args.first().cloned() else {
        return Err(CliError::ArgumentCount {
            expected: 4,
            actual: 0,
        });
    };
    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "list" => {
            split(args.split_off(1), &[], &[])?.expect_positionals(0)?;
            Ok(Command::List)
        }
        "config" => {
            let split = split(args.split_off(1), &[], &["--init"])?;
            split.expect_positionals(0)?;
            Ok(Command::Config {
                init: split.flag("--init"),
            })
        }
        "generate" => parse_generate(args.split_off(1)).map(Command::Generate),
        _ => parse_run(args).map(Command::Run),
    }
}

fn parse_run(args: Vec<String>) -> Result<RunArgs, CliError> {
    let split = split(
        args,
        &["--input", "--output-dir", "--max-frames", "--config"],
        &["--no-planes"],
    )?;
    split.expect_positionals(4)?;
    let p = &split.positionals;

    let format = parse_format(&p[0])?;
    let strategy = Strategy::parse_for(format, &p[1]).map_err(|e| invalid("mode", &p[1], e))?;
    let (width, height) = parse_dimensions(&p[2], &p[3])?;
    let max_frames = split
        .value("--max-frames")
        .map(|v| parse_number("max frames", v))
        .transpose()?;

    Ok(RunArgs {
        format,
        strategy,
        width,
        height,
        input: split.value("--input").map(PathBuf::from),
        output_dir: split.value("--output-dir").map(PathBuf::from),
        max_frames,
        config: split.value("--config").map(PathBuf::from),
        no_planes: split.flag("--no-planes"),
    })
}

fn parse_generate(args: Vec<String>) -> Result<GenerateArgs, CliError> {
    let split = split(args, &["--output", "--seed", "--constant"], &[])?;
    split.expect_positionals(4)?;
    let p = &split.positionals;

    let format = parse_format(&p[0])?;
    let (width, height) = parse_dimensions(&p[1], &p[2])?;
    let frames = parse_number("frame count", &p[3])?;
    let pattern = match split.value("--constant") {
        Some(value) => Pattern::Constant(parse_sample(value)?),
        None => Pattern::Random(
            split
                .value("--seed")
                .map(|v| parse_number("seed", v))
                .transpose()?
                .unwrap_or(0),
        ),
    };

    Ok(GenerateArgs {
        format,
        width,
        height,
        frames,
        output: split.value("--output").map(PathBuf::from),
        pattern,
    })
}

/// Formats, ids and strategies; `*` marks the automatic choice and
/// strategies `cpu` cannot run are flagged.
pub fn listing(cpu: CpuFeatures) -> String {
    let mut out = String::new();
    for &format in SourceFormat::all() {
        let _ = writeln!(
            out,
            "{} {:<7} {} -> {}",
            format.id(),
            format.name(),
            format.display_name(),
            format.planar()
        );
        let preferred = Strategy::preferred_with(format, cpu);
        for (index, strategy) in Strategy::for_format(format).iter().enumerate() {
            let isa = strategy.required_isa();
            let marker = if *strategy == preferred { "*" } else { " " };
            let note = if cpu.supports(isa) {
                String::new()
            } else {
                format!(" (needs {isa}, unavailable)")
            };
            let _ = writeln!(out, "  {marker}{index} {}{note}", strategy.name());
        }
    }
    out
}
