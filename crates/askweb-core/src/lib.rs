pub mod dedupe;
pub mod error;
pub mod filter;
pub mod linewrap;
pub mod models;
pub mod options;
pub mod pipeline;
pub mod prompt;
pub mod query;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use dedupe::{dedupe, merge};
pub use error::AppError;
pub use filter::{ResultFilter, UrlFilter};
pub use linewrap::{LineWrapWriter, LineWrapper};
pub use models::{Conversation, NewConversation, SearchResult};
pub use options::Options;
pub use pipeline::{ResearchEvent, ResearchOutcome, ResearchReporter, ResearchService, TracingReporter};
pub use query::formulate_query;
pub use traits::{Cleaner, ConversationStore, Fetcher, QueryFormulator, SearchProvider, Summarizer};
