//! TVMC tools: codec orchestration, rate accounting and the evaluation
//! pipeline, plus the `tvmc` command line built on them.

pub mod centers;
pub mod cli;
pub mod codec;
pub mod config;
pub mod layout;
pub mod pipeline;
pub mod rate;

pub use codec::{AssetKind, Codec, CodecAsset, CodecError, CodecOrchestrator, CodecRun, EncodeSettings, ExternalCodec};
pub use config::{CodecSettings, ConfigError, RunConfig};
pub use layout::DatasetLayout;
pub use pipeline::{Pipeline, PipelineError, RunSummary, Stage, SummaryLine};
pub use rate::{BitrateReport, RateError};
