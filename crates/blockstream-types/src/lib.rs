pub mod block;
pub mod content;
pub mod events;

pub use block::{
    BlockAction, BlockContent, BlockDescriptor, BlockKind, BlockMetadata, TableRow, TableSubtype,
};
pub use content::{ContentContext, ContentMetadata, ContentType};
pub use events::{SearchResult, SessionStatus, SessionSummary, StreamEvent};
