pub mod error;
pub mod session;
pub mod sources;
pub mod sse;
pub mod upstream;

pub use error::{Result, SessionError};
pub use session::{SessionConfig, SessionHandle, StreamSession};
pub use sources::{ScriptedSource, TranscriptSource};
pub use sse::{decode_sse_stream, encode_event, SseDecoder};
pub use upstream::{FragmentSource, TurnRequest, UpstreamEvent, UpstreamStream};
