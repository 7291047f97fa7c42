//! `tvmc` command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{error, info};
use thiserror::Error;

use crate::centers::{write_frame_transforms, write_max_distance_matrix, CentersError};
use crate::codec::ExternalCodec;
use crate::config::{RunConfig, DEFAULT_FRAME_RATE};
use crate::layout::DatasetLayout;
use crate::pipeline::{Pipeline, PipelineError};

#[derive(Parser, Debug)]
#[command(name = "tvmc", version, about = "Temporal volumetric mesh compression evaluation")]
pub struct CliArgs {
    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resample, encode, decode, reconstruct and score one group of frames.
    Evaluate(EvaluateArgs),
    /// Derive per-frame center transforms toward the aligned reference centers.
    Transforms(TransformsArgs),
    /// Compute the max pairwise-distance matrix over the center files.
    DistanceMatrix(DatasetArgs),
}

#[derive(Args, Debug, Clone)]
struct DatasetArgs {
    /// Dataset name, e.g. `basketball_player`.
    #[arg(long)]
    dataset: String,
    /// Frames in the group of frames.
    #[arg(long)]
    num_frames: usize,
    /// Number of volume centers.
    #[arg(long)]
    num_centers: usize,
    /// Root directory holding `Data/` and `output/`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    workspace: PathBuf,
}

impl DatasetArgs {
    fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(&self.workspace, &self.dataset, self.num_centers, self.num_frames)
    }
}

#[derive(Args, Debug, Clone)]
struct TransformsArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    /// Index of the first frame.
    #[arg(long)]
    first_index: usize,
}

#[derive(Args, Debug, Clone)]
struct EvaluateArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    #[arg(long)]
    first_index: usize,
    #[arg(long)]
    last_index: usize,
    /// Prefix of the ground-truth frame meshes.
    #[arg(long)]
    file_name_prefix: String,
    #[arg(long, value_name = "FILE")]
    encoder_path: PathBuf,
    #[arg(long, value_name = "FILE")]
    decoder_path: PathBuf,
    /// Quantization parameter for displacement assets.
    #[arg(long)]
    qp: u32,
    /// Directory for reconstructed meshes.
    #[arg(long, value_name = "DIR")]
    output_path: PathBuf,
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
    frame_rate: f64,
}

impl EvaluateArgs {
    fn into_config(self) -> RunConfig {
        RunConfig {
            dataset: self.dataset.dataset,
            num_frames: self.dataset.num_frames,
            num_centers: self.dataset.num_centers,
            first_index: self.first_index,
            last_index: self.last_index,
            file_name_prefix: self.file_name_prefix,
            encoder_path: self.encoder_path,
            decoder_path: self.decoder_path,
            qp: self.qp,
            output_path: self.output_path,
            workspace: self.dataset.workspace,
            frame_rate: self.frame_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error("pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("centers: {0}")]
    Centers(#[from] CentersError),
    #[error("failed to serialise summary: {0}")]
    Summary(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Pipeline(PipelineError::Config(_)) => ExitCode::from(1),
            CliError::Pipeline(_) | CliError::Centers(_) | CliError::Summary(_) => ExitCode::from(2),
        }
    }
}

pub fn run() -> ExitCode {
    let cli = CliArgs::parse();
    init_logger(&resolve_log_level(cli.log_level));
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    }
}

fn execute(command: Command) -> Result<(), CliError> {
    match command {
        Command::Evaluate(args) => {
            let config = args.into_config();
            let codec = ExternalCodec::new(&config.encoder_path, &config.decoder_path);
            let summary = Pipeline::new(&config, codec)?.run()?;
            // Last stdout line, read by the outer sweep.
            println!("{}", summary.summary_line().to_json()?);
        }
        Command::Transforms(args) => {
            let written = write_frame_transforms(&args.dataset.layout(), args.dataset.num_frames, args.first_index)?;
            info!("transforms written for {written} frames");
        }
        Command::DistanceMatrix(args) => {
            write_max_distance_matrix(&args.layout(), args.num_frames, args.num_centers)?;
        }
    }
    Ok(())
}

fn resolve_log_level(flag: Option<LogLevel>) -> String {
    if let Some(level) = flag {
        return level.as_str().to_string();
    }

    if let Ok(level) = std::env::var("RUST_LOG") {
        if !level.trim().is_empty() {
            return level;
        }
    }

    "info".to_string()
}

fn init_logger(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_filters(level);
    builder.format(|buf, record| {
        use std::io::Write;
        let module = record.module_path().unwrap_or(record.target());
        writeln!(
            buf,
            "{} [{}] {}: {}",
            buf.timestamp_millis(),
            record.level(),
            module,
            record.args()
        )
    });

    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_evaluate_args() {
        let cli = parse(&[
            "tvmc",
            "evaluate",
            "--dataset",
            "dancer",
            "--num-frames",
            "10",
            "--num-centers",
            "50",
            "--first-index",
            "1",
            "--last-index",
            "10",
            "--file-name-prefix",
            "dancer_fr",
            "--encoder-path",
            "/bin/draco_encoder",
            "--decoder-path",
            "/bin/draco_decoder",
            "--qp",
            "11",
            "--output-path",
            "out",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        let config = args.into_config();
        assert_eq!(config.dataset, "dancer");
        assert_eq!(config.qp, 11);
        assert_eq!(config.frame_rate, DEFAULT_FRAME_RATE);
        assert_eq!(config.workspace, Path::new("."));
        assert_eq!(config.frame_indices(), 1..=10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_required_arguments() {
        assert!(CliArgs::try_parse_from(["tvmc", "evaluate", "--dataset", "d"]).is_err());
        assert!(CliArgs::try_parse_from(["tvmc", "distance-matrix", "--dataset", "d"]).is_err());
    }

    #[test]
    fn test_transforms_args() {
        let cli = parse(&[
            "tvmc",
            "transforms",
            "--dataset",
            "ball",
            "--num-frames",
            "3",
            "--num-centers",
            "20",
            "--first-index",
            "5",
            "--workspace",
            "/data",
        ]);
        let Command::Transforms(args) = cli.command else {
            panic!("expected transforms");
        };
        assert_eq!(args.first_index, 5);
        assert_eq!(
            args.dataset.layout().indices(5),
            Path::new("/data/Data/ball_20/indices_005.txt")
        );
    }

    #[test]
    fn test_log_level_flag_wins() {
        assert_eq!(resolve_log_level(Some(LogLevel::Warn)), "warn");
    }
}
