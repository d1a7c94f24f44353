use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeKind {
    Device,
    Model,
    Asset,
}

/// A user-visible, dismissible failure notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct NoticeBoard {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts a notice. An identical undismissed notice of the same kind is replaced.
    pub fn raise(&self, kind: NoticeKind, message: impl Into<String>) -> Uuid {
        let message = message.into();
        let notice = Notice {
            id: Uuid::new_v4(),
            kind,
            message,
            raised_at: Utc::now(),
        };
        let id = notice.id;

        let mut guard = self.lock();
        guard.retain(|existing| !(existing.kind == kind && existing.message == notice.message));
        log::warn!("notice raised ({:?}): {}", kind, notice.message);
        guard.push(notice);
        id
    }

    /// Returns whether a notice with that id was present.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut guard = self.lock();
        let before = guard.len();
        guard.retain(|notice| notice.id != id);
        guard.len() != before
    }

    pub fn clear_kind(&self, kind: NoticeKind) {
        self.lock().retain(|notice| notice.kind != kind);
    }

    pub fn list(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notice>> {
        match self.notices.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
