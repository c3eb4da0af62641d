//! Benchmark driver
//!
//! Reads concatenated raw frames from `bench.<format>`, converts each one
//! with a chosen strategy while timing only the conversion call, appends a
//! `mode,frame,micros` record per frame and finally dumps the last converted
//! frame's planes for manual inspection.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, trace};

use crate::adapter::{converter_for, PackedFrameConverter};
use crate::error::ConvertError;
use crate::format::{ConversionPair, SourceFormat};
use crate::frame::{FrameAccess, FrameBuffers, MemoryFrame};
use crate::geometry::PlaneKind;
use crate::strategy::Strategy;
use crate::synth::{Pattern, Synthesizer};
use crate::telemetry::TimingStats;

/// Columns of the statistics file.
pub const CSV_HEADER: [&str; 3] = ["mode", "frame", "micros"];

/// Errors that end a benchmark run.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("corrupt or truncated input: frame {frame} has {actual} bytes, expected {expected}")]
    CorruptOrTruncatedInput {
        frame: u64,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> BenchError + '_ {
    move |source| BenchError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> BenchError + '_ {
    move |source| BenchError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// What to benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkSpec {
    pub format: SourceFormat,
    pub strategy: Strategy,
    pub width: usize,
    pub height: usize,
}

impl BenchmarkSpec {
    /// `<format>-<strategy>`, shared by every output file name.
    pub fn suffix(&self) -> String {
        format!("{}-{}", self.format.name(), self.strategy.name())
    }

    /// `bench.<format>`
    pub fn input_file_name(&self) -> String {
        format!("bench.{}", self.format.name())
    }

    pub fn stats_file_name(&self) -> String {
        format!("stats_-{}.csv", self.suffix())
    }

    /// Plane dump file for planes of `kind`; U and V share the chroma file.
    pub fn plane_file_name(&self, kind: PlaneKind) -> String {
        let prefix = match kind {
            PlaneKind::Luma => "y",
            PlaneKind::Chroma | PlaneKind::U | PlaneKind::V => "uv",
            PlaneKind::Rgb => "rgb",
        };
        format!("{prefix}-{}", self.suffix())
    }
}

/// Where to read and write, and how much.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub max_frames: Option<u64>,
    pub write_planes: bool,
}

/// One timed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkRecord {
    pub strategy: Strategy,
    pub frame: u64,
    pub elapsed: Duration,
}

/// Append-only record log written as `mode,frame,micros` CSV.
pub struct BenchmarkLog<W: Write> {
    writer: csv::Writer<W>,
    records: Vec<BenchmarkRecord>,
}

impl<W: Write> BenchmarkLog<W> {
    /// Writes the header and returns an empty log.
    pub fn new(writer: W) -> csv::Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        writer.write_record(CSV_HEADER)?;
        Ok(Self {
            writer,
            records: Vec::new(),
        })
    }

    pub fn push(&mut self, record: BenchmarkRecord) -> csv::Result<()> {
        self.writer.write_record([
            record.strategy.name().to_string(),
            record.frame.to_string(),
            record.elapsed.as_micros().to_string(),
        ])?;
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }

    /// Flushes the writer and returns the records.
    pub fn finish(mut self) -> csv::Result<Vec<BenchmarkRecord>> {
        self.writer.flush()?;
        Ok(self.records)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct BenchmarkSummary {
    pub spec: BenchmarkSpec,
    pub frames: u64,
    pub stats: TimingStats,
    pub stats_path: PathBuf,
    /// Plane dumps written, empty when none were
    pub plane_paths: Vec<PathBuf>,
}

/// Reads until `buf` is full or the input ends; returns the bytes read.
fn read_frame<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Output files opened before the first frame is read.
struct PlaneOutputs {
    files: Vec<(PathBuf, BufWriter<File>)>,
}

impl PlaneOutputs {
    fn create(spec: &BenchmarkSpec, buffers: &FrameBuffers, dir: &Path) -> Result<Self, BenchError> {
        let mut files: Vec<(PathBuf, BufWriter<File>)> = Vec::new();
        for plane in buffers.layout().planes() {
            let path = dir.join(spec.plane_file_name(plane.kind));
            if files.iter().any(|(existing, _)| *existing == path) {
                continue;
            }
            let file = File::create(&path).map_err(io_error(&path))?;
            files.push((path, BufWriter::new(file)));
        }
        Ok(Self { files })
    }

    /// Writes every plane's genuine samples to its file, in plane order.
    fn write(mut self, spec: &BenchmarkSpec, buffers: &FrameBuffers) -> Result<Vec<PathBuf>, BenchError> {
        for (index, plane) in buffers.layout().planes().iter().enumerate() {
            let path = spec.plane_file_name(plane.kind);
            let Some(slot) = self
                .files
                .iter()
                .position(|(existing, _)| existing.file_name().is_some_and(|f| f == path.as_str()))
            else {
                continue;
            };
            let (path, writer) = &mut self.files[slot];
            for row in buffers.plane_rows(index) {
                writer.write_all(row).map_err(io_error(path))?;
            }
        }
        let mut paths = Vec::with_capacity(self.files.len());
        for (path, mut writer) in self.files {
            writer.flush().map_err(io_error(&path))?;
            paths.push(path);
        }
        Ok(paths)
    }
}

/// Runs the benchmark described by `spec` and `options`.
pub fn run(spec: &BenchmarkSpec, options: &BenchOptions) -> Result<BenchmarkSummary, BenchError> {
    let converter = converter_for(ConversionPair::native(spec.format), spec.strategy)?;
    let mut source = MemoryFrame::new(spec.format, spec.width, spec.height)?;
    let frame_size = source.buffer_mut().len();
    let mut buffers = FrameBuffers::new(spec.format.planar(), spec.width, spec.height, 0)?;

    info!(
        format = %spec.format,
        strategy = %spec.strategy,
        width = spec.width,
        height = spec.height,
        frame_size,
        input = %options.input.display(),
        "Starting benchmark"
    );

    let input = File::open(&options.input).map_err(io_error(&options.input))?;
    let mut reader = BufReader::new(input);

    let stats_path = options.output_dir.join(spec.stats_file_name());
    let stats_file = File::create(&stats_path).map_err(io_error(&stats_path))?;
    let mut log = BenchmarkLog::new(BufWriter::new(stats_file)).map_err(csv_error(&stats_path))?;
    let outputs = if options.write_planes {
        Some(PlaneOutputs::create(spec, &buffers, &options.output_dir)?)
    } else {
        None
    };

    let mut frame_index: u64 = 0;
    loop {
        if options.max_frames.is_some_and(|max| frame_index >= max) {
            break;
        }
        let read = read_frame(&mut reader, source.buffer_mut()).map_err(io_error(&options.input))?;
        if read == 0 {
            break;
        }
        if read != frame_size {
            return Err(BenchError::CorruptOrTruncatedInput {
                frame: frame_index,
                expected: frame_size,
                actual: read,
            });
        }

        let access = FrameAccess::begin(&mut source)?;
        let frame = access.frame()?;
        let mut planes = buffers.planes()?;

        let start = Instant::now();
        converter.convert(&frame, &mut planes, 0)?;
        let elapsed = start.elapsed();

        trace!(frame = frame_index, micros = elapsed.as_micros() as u64, "Frame converted");
        log.push(BenchmarkRecord {
            strategy: converter.strategy(),
            frame: frame_index,
            elapsed,
        })
        .map_err(csv_error(&stats_path))?;
        frame_index += 1;
    }

    let records = log.finish().map_err(csv_error(&stats_path))?;
    let stats = TimingStats::from_durations(records.iter().map(|r| r.elapsed));

    let plane_paths = match outputs {
        Some(outputs) if frame_index > 0 => outputs.write(spec, &buffers)?,
        _ => Vec::new(),
    };

    info!(
        frames = frame_index,
        avg_us = stats.avg_us,
        min_us = stats.min_us,
        p95_us = stats.p95_us,
        max_us = stats.max_us,
        "Benchmark finished"
    );

    Ok(BenchmarkSummary {
        spec: *spec,
        frames: frame_index,
        stats,
        stats_path,
        plane_paths,
    })
}

/// Writes `frames` synthetic frames of `pattern` to `path`.
pub fn generate(
    path: &Path,
    format: SourceFormat,
    width: usize,
    height: usize,
    frames: u64,
    pattern: Pattern,
) -> Result<u64, BenchError> {
    let mut synth = Synthesizer::new(format, width, height, pattern)?;
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    for _ in 0..frames {
        writer
            .write_all(&synth.next_frame())
            .map_err(io_error(path))?;
    }
    writer.flush().map_err(io_error(path))?;
    info!(
        path = %path.display(),
        format = %format,
        frames,
        frame_size = synth.frame_size(),
        "Synthetic input written"
    );
    Ok(frames)
}
