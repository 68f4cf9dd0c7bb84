//! wikirc core library
//!
//! Wiki model and storage, the bot configuration repository, and the
//! notification pipeline that turns document changes into IRC lines.

pub mod chat;
pub mod composer;
pub mod constants;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod filter;
pub mod models;
pub mod observation;
pub mod repository;
pub mod settings;
pub mod storage;

pub use chat::ChatClient;
pub use composer::{MessageComposer, NotificationMessage};
pub use context::{ActorResolver, Execution, ExecutionContext};
pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use error::{Error, Result};
pub use feed::ChangeFeed;
pub use filter::{ExclusionFilter, SharedExclusionFilter};
pub use models::*;
pub use observation::{EventListener, ObservationManager};
pub use repository::ConfigRepository;
pub use settings::Settings;
pub use storage::{Database, DocumentStore, ObjectQuery, QueryExecutor};
