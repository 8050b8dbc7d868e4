pub mod aggregator;
pub mod annotator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod language;
pub mod lifecycle;
pub mod line_buffer;
pub mod parser;
pub mod state;

pub use aggregator::SessionAggregator;
pub use annotator::ContentAnnotator;
pub use classifier::BlockClassifier;
pub use config::ParserConfig;
pub use error::{ParseError, Result};
pub use language::{is_executable, normalize_language};
pub use lifecycle::BlockLifecycleManager;
pub use line_buffer::LineBuffer;
pub use parser::StreamParser;
pub use state::ParseState;

pub use blockstream_types::{
    BlockDescriptor, BlockKind, ContentType, SessionStatus, SessionSummary, StreamEvent,
};
