//! Error surface
//!
//! Non-blocking inline notices and navigation requests for the view layer.
//! At most one notice is current; the next user action clears it.

use crate::error::SyncError;
use mochi_model::EntityRef;
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Inline notice attached to an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub entity: EntityRef,
    pub message: String,
    pub error: SyncError,
}

impl Notice {
    #[must_use]
    pub fn new(entity: EntityRef, error: SyncError) -> Self {
        Self {
            entity,
            message: error.user_message(),
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Notice(Notice),
    NoticeCleared,
    /// The view should go to `target`
    Navigate { target: String },
}

#[derive(Debug)]
pub struct ErrorSurface {
    events: broadcast::Sender<SyncEvent>,
    current: Mutex<Option<Notice>>,
}

impl ErrorSurface {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            events,
            current: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn current(&self) -> Option<Notice> {
        self.current.lock().clone()
    }

    pub fn publish(&self, notice: Notice) {
        *self.current.lock() = Some(notice.clone());
        let _ = self.events.send(SyncEvent::Notice(notice));
    }

    pub fn navigate(&self, target: impl Into<String>) {
        let _ = self.events.send(SyncEvent::Navigate {
            target: target.into(),
        });
    }

    /// Drop the current notice, if any
    pub fn clear(&self) {
        if self.current.lock().take().is_some() {
            let _ = self.events.send(SyncEvent::NoticeCleared);
        }
    }
}

impl Default for ErrorSurface {
    fn default() -> Self {
        Self::new(64)
    }
}
