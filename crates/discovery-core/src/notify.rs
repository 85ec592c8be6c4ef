//! Presentation seam: transient notifications and the send confirmation.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
}

impl Level {
    pub fn icon(self) -> &'static str {
        match self {
            Level::Success => "✓",
            Level::Warning => "⚠",
            Level::Info => "ℹ",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
        })
    }
}

/// What the confirmation prompt shows before sending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub title: String,
    pub body: String,
    pub link: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Cancelled,
}

pub trait Presenter {
    fn notify(&mut self, message: &str, level: Level);

    fn confirm(&mut self, request: &ConfirmRequest) -> Confirmation;
}

/// Keeps everything it is asked to present. Answers every confirmation with
/// a fixed reply.
#[derive(Debug)]
pub struct RecordingPresenter {
    pub notifications: Vec<(Level, String)>,
    pub confirmations: Vec<ConfirmRequest>,
    reply: Confirmation,
}

impl RecordingPresenter {
    pub fn new(reply: Confirmation) -> Self {
        Self {
            notifications: Vec::new(),
            confirmations: Vec::new(),
            reply,
        }
    }

    pub fn last_notification(&self) -> Option<&(Level, String)> {
        self.notifications.last()
    }
}

impl Default for RecordingPresenter {
    fn default() -> Self {
        Self::new(Confirmation::Cancelled)
    }
}

impl Presenter for RecordingPresenter {
    fn notify(&mut self, message: &str, level: Level) {
        self.notifications.push((level, message.to_string()));
    }

    fn confirm(&mut self, request: &ConfirmRequest) -> Confirmation {
        self.confirmations.push(request.clone());
        self.reply
    }
}
