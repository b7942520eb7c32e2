//! Host chat platform abstraction
//!
//! The pipeline only talks to a [`ChatSurface`]: it sends messages, edits them
//! in place (for the paginated preview) and uploads files.

mod console;
mod memory;

pub use console::ConsoleSurface;
pub use memory::{MemorySurface, SurfaceEvent};

use crate::chunker::{chunk, query_context, ChunkError};
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Identifier of a message sent through a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of the Back/Next navigation buttons attached to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub back_enabled: bool,
    pub next_enabled: bool,
}

impl Controls {
    pub fn new(back_enabled: bool, next_enabled: bool) -> Self {
        Self {
            back_enabled,
            next_enabled,
        }
    }

    /// Both buttons greyed out
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn any_enabled(&self) -> bool {
        self.back_enabled || self.next_enabled
    }
}

/// Delivery failures reported by a surface
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The message was deleted or is otherwise no longer editable
    #[error("message {0} no longer exists")]
    MessageGone(MessageId),

    #[error("message of {len} characters exceeds the limit of {limit}")]
    TooLong { len: usize, limit: usize },

    #[error("failed to upload {path}: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("platform error: {0}")]
    Platform(String),
}

/// A place where the pipeline can talk to the user who asked for a search
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Send a new message, optionally with navigation controls
    async fn send(
        &self,
        content: &str,
        controls: Option<Controls>,
    ) -> Result<MessageId, DeliveryError>;

    /// Replace the content and controls of a sent message
    async fn edit(
        &self,
        id: MessageId,
        content: &str,
        controls: Option<Controls>,
    ) -> Result<(), DeliveryError>;

    /// Upload a file with a caption
    async fn upload(&self, caption: &str, path: &Path) -> Result<(), DeliveryError>;

    /// Maximum characters per message
    fn message_limit(&self) -> usize;
}

/// Send `text` in as many messages as the surface limit requires.
///
/// `context`, when given, is rendered as `Query: <context>` at the top of the
/// first message. Empty text sends nothing. Returns the number of messages
/// sent.
pub async fn send_split(
    surface: &dyn ChatSurface,
    text: &str,
    context: Option<&str>,
) -> Result<usize, DeliveryError> {
    let context = context.map(query_context);
    let chunks = match chunk(text, surface.message_limit(), context.as_deref()) {
        Ok(chunks) => chunks,
        Err(ChunkError::NothingToSend) => {
            info!("No text to send");
            return Ok(0);
        }
        Err(e) => {
            warn!("Could not split message: {}", e);
            return Err(DeliveryError::Platform(e.to_string()));
        }
    };

    for part in &chunks {
        surface.send(part, None).await?;
    }
    Ok(chunks.len())
}
