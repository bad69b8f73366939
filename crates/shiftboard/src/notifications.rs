//! Outbound notifications raised by signup, disposition, and event changes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewEvent,
    ResponsibleParticipationRequested,
    ParticipationConfirmed,
    ParticipationRejected,
    ParticipationFinished,
}

impl NotificationKind {
    pub const fn slug(self) -> &'static str {
        match self {
            NotificationKind::NewEvent => "new_event",
            NotificationKind::ResponsibleParticipationRequested => {
                "responsible_participation_requested"
            }
            NotificationKind::ParticipationConfirmed => "participation_confirmed",
            NotificationKind::ParticipationRejected => "participation_rejected",
            NotificationKind::ParticipationFinished => "participation_finished",
        }
    }
}

/// Message handed to a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipients: Vec<String>,
    pub subject: String,
    pub details: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(kind: NotificationKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            recipients: Vec::new(),
            subject: subject.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn to(mut self, recipients: impl IntoIterator<Item = String>) -> Self {
        self.recipients.extend(recipients);
        self
    }

    pub fn detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Dispatch failure.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Outbound notification hook (mail, push, or a test sink).
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Keeps every notification in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotifications {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotifications {
    pub fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|notification| notification.kind == kind)
            .collect()
    }
}

impl NotificationDispatcher for InMemoryNotifications {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .map_err(|_| NotificationError::Transport("notification store poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifications;

impl NotificationDispatcher for LogNotifications {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        tracing::info!(
            kind = notification.kind.slug(),
            recipients = notification.recipients.len(),
            subject = %notification.subject,
            "notification dispatched"
        );
        Ok(())
    }
}

/// Dispatch and log failures; a lost notification never fails the operation that raised it.
pub(crate) fn send_robust<N: NotificationDispatcher + ?Sized>(
    dispatcher: &N,
    notification: Notification,
) {
    if notification.recipients.is_empty() {
        tracing::debug!(
            kind = notification.kind.slug(),
            "notification skipped, no recipients"
        );
        return;
    }
    let kind = notification.kind;
    if let Err(err) = dispatcher.dispatch(notification) {
        tracing::warn!(kind = kind.slug(), error = %err, "notification dispatch failed");
    }
}
