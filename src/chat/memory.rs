//! In-memory surface that records everything sent through it

use super::{ChatSurface, Controls, DeliveryError, MessageId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One interaction with a [`MemorySurface`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Sent {
        id: MessageId,
        content: String,
        controls: Option<Controls>,
    },
    Edited {
        id: MessageId,
        content: String,
        controls: Option<Controls>,
    },
    Uploaded {
        caption: String,
        path: PathBuf,
        /// File contents at upload time
        contents: Vec<u8>,
    },
}

#[derive(Default)]
struct State {
    events: Vec<SurfaceEvent>,
    next_id: u64,
    gone: HashSet<MessageId>,
}

/// Surface that keeps every event in memory.
///
/// Used to embed the pipeline without a platform and by the test suites.
pub struct MemorySurface {
    limit: usize,
    fail_uploads: bool,
    state: Mutex<State>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::with_limit(2000)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            fail_uploads: false,
            state: Mutex::new(State::default()),
        }
    }

    /// Make every upload fail
    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// Pretend the message was deleted on the platform
    pub fn remove_message(&self, id: MessageId) {
        self.lock().gone.insert(id);
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.lock().events.clone()
    }

    /// Contents of every sent message, in order
    pub fn sent(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Sent { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    /// `(content, controls)` of every edit, in order
    pub fn edits(&self) -> Vec<(String, Option<Controls>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Edited {
                    content, controls, ..
                } => Some((content, controls)),
                _ => None,
            })
            .collect()
    }

    /// `(caption, path, contents)` of every upload, in order
    pub fn uploads(&self) -> Vec<(String, PathBuf, Vec<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Uploaded {
                    caption,
                    path,
                    contents,
                } => Some((caption, path, contents)),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatSurface for MemorySurface {
    async fn send(
        &self,
        content: &str,
        controls: Option<Controls>,
    ) -> Result<MessageId, DeliveryError> {
        let len = content.chars().count();
        if len > self.limit {
            return Err(DeliveryError::TooLong {
                len,
                limit: self.limit,
            });
        }

        let mut state = self.lock();
        state.next_id += 1;
        let id = MessageId(state.next_id);
        state.events.push(SurfaceEvent::Sent {
            id,
            content: content.to_string(),
            controls,
        });
        Ok(id)
    }

    async fn edit(
        &self,
        id: MessageId,
        content: &str,
        controls: Option<Controls>,
    ) -> Result<(), DeliveryError> {
        let mut state = self.lock();
        if state.gone.contains(&id) || id.0 == 0 || id.0 > state.next_id {
            return Err(DeliveryError::MessageGone(id));
        }
        state.events.push(SurfaceEvent::Edited {
            id,
            content: content.to_string(),
            controls,
        });
        Ok(())
    }

    async fn upload(&self, caption: &str, path: &Path) -> Result<(), DeliveryError> {
        if self.fail_uploads {
            return Err(DeliveryError::Platform("uploads are disabled".to_string()));
        }

        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| DeliveryError::Upload {
                path: path.to_path_buf(),
                source,
            })?;
        self.lock().events.push(SurfaceEvent::Uploaded {
            caption: caption.to_string(),
            path: path.to_path_buf(),
            contents,
        });
        Ok(())
    }

    fn message_limit(&self) -> usize {
        self.limit
    }
}
