//! Terminal surface used by the binary

use super::{ChatSurface, Controls, DeliveryError, MessageId};
use crate::config::ChatSettings;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;
use tracing::debug;

/// Prints messages to a writer (stdout by default) and copies uploads into a
/// download directory
pub struct ConsoleSurface<W = Stdout> {
    out: Mutex<W>,
    next_id: AtomicU64,
    limit: usize,
    download_dir: PathBuf,
}

impl ConsoleSurface<Stdout> {
    pub fn stdout(settings: &ChatSettings) -> Self {
        Self::new(tokio::io::stdout(), settings)
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleSurface<W> {
    pub fn new(out: W, settings: &ChatSettings) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicU64::new(0),
            limit: settings.message_limit,
            download_dir: settings.download_dir.clone(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write_block(&self, header: &str, content: &str) -> Result<(), DeliveryError> {
        let mut out = self.out.lock().await;
        out.write_all(format!("{}\n{}\n\n", header, content).as_bytes())
            .await?;
        out.flush().await?;
        Ok(())
    }
}

fn controls_line(controls: Option<Controls>) -> String {
    match controls {
        None => String::new(),
        Some(c) => {
            let button = |label: &str, enabled: bool| {
                if enabled {
                    format!("[{}]", label)
                } else {
                    format!("({})", label)
                }
            };
            format!(
                "\n{} {}",
                button("b: Back", c.back_enabled),
                button("n: Next", c.next_enabled)
            )
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ChatSurface for ConsoleSurface<W> {
    async fn send(
        &self,
        content: &str,
        controls: Option<Controls>,
    ) -> Result<MessageId, DeliveryError> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let body = format!("{}{}", content, controls_line(controls));
        self.write_block(&format!("--- message {} ---", id), &body)
            .await?;
        Ok(id)
    }

    async fn edit(
        &self,
        id: MessageId,
        content: &str,
        controls: Option<Controls>,
    ) -> Result<(), DeliveryError> {
        if id.0 == 0 || id.0 > self.next_id.load(Ordering::SeqCst) {
            return Err(DeliveryError::MessageGone(id));
        }
        let body = format!("{}{}", content, controls_line(controls));
        self.write_block(&format!("--- message {} (edited) ---", id), &body)
            .await
    }

    async fn upload(&self, caption: &str, path: &Path) -> Result<(), DeliveryError> {
        let upload_err = |source| DeliveryError::Upload {
            path: path.to_path_buf(),
            source,
        };
        let name = path.file_name().ok_or_else(|| {
            upload_err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no file name",
            ))
        })?;

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(upload_err)?;
        let target = self.download_dir.join(name);
        tokio::fs::copy(path, &target).await.map_err(upload_err)?;
        debug!("Copied {} to {}", path.display(), target.display());

        self.write_block(
            "--- upload ---",
            &format!("{}\n{}", caption, target.display()),
        )
        .await
    }

    fn message_limit(&self) -> usize {
        self.limit
    }
}
