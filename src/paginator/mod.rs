//! Interactive preview of a result set
//!
//! A [`PageView`] holds the navigation state. [`InteractivePaginator::start`]
//! sends the first page and spawns a driver task that applies navigation
//! events one at a time, editing the message after each change. The view
//! freezes once no event has arrived before the idle deadline.

mod view;

pub use view::{max_page, PageView};

use crate::chat::{ChatSurface, DeliveryError, MessageId};
use crate::config::PaginatorSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Navigation buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Back,
    Next,
}

impl Navigation {
    /// Parse console input (`b`/`back`, `n`/`next`)
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "b" | "back" | "previous" => Some(Navigation::Back),
            "n" | "next" => Some(Navigation::Next),
            _ => None,
        }
    }
}

/// Starts preview sessions on a surface
#[derive(Clone)]
pub struct InteractivePaginator {
    surface: Arc<dyn ChatSurface>,
    idle_timeout: Duration,
}

impl InteractivePaginator {
    pub fn new(surface: Arc<dyn ChatSurface>, idle_timeout: Duration) -> Self {
        Self {
            surface,
            idle_timeout,
        }
    }

    pub fn from_settings(surface: Arc<dyn ChatSurface>, settings: &PaginatorSettings) -> Self {
        Self::new(surface, settings.idle_timeout())
    }

    /// Send page 0 and start accepting navigation
    pub async fn start(&self, view: PageView) -> Result<PreviewHandle, DeliveryError> {
        let message = self
            .surface
            .send(&view.render(), Some(view.controls()))
            .await?;
        debug!(
            "Preview {} started: {} records over {} pages",
            message,
            view.total(),
            view.max_page() + 1
        );

        let (sender, receiver) = mpsc::channel(16);
        let task = tokio::spawn(drive(
            self.surface.clone(),
            view,
            message,
            receiver,
            self.idle_timeout,
        ));

        Ok(PreviewHandle {
            message,
            sender,
            task,
        })
    }
}

/// Handle to a running preview
pub struct PreviewHandle {
    message: MessageId,
    sender: mpsc::Sender<Navigation>,
    task: JoinHandle<PageView>,
}

impl PreviewHandle {
    /// The message hosting the preview
    pub fn message(&self) -> MessageId {
        self.message
    }

    /// Sender for navigation events, e.g. from an input loop
    pub fn sender(&self) -> mpsc::Sender<Navigation> {
        self.sender.clone()
    }

    /// Queue a navigation event. False once the view has frozen.
    pub async fn navigate(&self, nav: Navigation) -> bool {
        self.sender.send(nav).await.is_ok()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop accepting input and wait for the view to freeze
    pub async fn close(self) -> Option<PageView> {
        drop(self.sender);
        self.task.await.ok()
    }

    /// Wait for the view to freeze, still accepting input meanwhile
    pub async fn finished(self) -> Option<PageView> {
        let PreviewHandle { sender, task, .. } = self;
        let view = task.await.ok();
        drop(sender);
        view
    }
}

async fn drive(
    surface: Arc<dyn ChatSurface>,
    mut view: PageView,
    message: MessageId,
    mut receiver: mpsc::Receiver<Navigation>,
    idle_timeout: Duration,
) -> PageView {
    let mut deadline = Instant::now() + idle_timeout;

    loop {
        let nav = match tokio::time::timeout_at(deadline, receiver.recv()).await {
            Ok(Some(nav)) => nav,
            Ok(None) => {
                debug!("Preview {} input closed", message);
                break;
            }
            Err(_) => {
                debug!("Preview {} timed out", message);
                break;
            }
        };
        deadline = Instant::now() + idle_timeout;

        if !view.apply(nav) {
            continue;
        }
        match surface
            .edit(message, &view.render(), Some(view.controls()))
            .await
        {
            Ok(()) => {}
            Err(DeliveryError::MessageGone(_)) => {
                info!("Preview {} was deleted, stopping", message);
                view.expire();
                return view;
            }
            Err(e) => warn!("Failed to update preview {}: {}", message, e),
        }
    }

    receiver.close();
    view.expire();
    if let Err(e) = surface
        .edit(message, &view.render(), Some(view.controls()))
        .await
    {
        warn!("Failed to freeze preview {}: {}", message, e);
    }
    view
}
