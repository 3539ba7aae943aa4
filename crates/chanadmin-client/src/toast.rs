//! Transient notifications raised by actions.

use std::collections::VecDeque;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Action completed.
    Success,
    /// Action failed.
    Error,
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Severity.
    pub kind: ToastKind,
    /// Rendered, localized text.
    pub message: String,
}

/// FIFO of pending notifications; the front end drains it after each action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastQueue {
    items: VecDeque<Toast>,
}

impl ToastQueue {
    /// Queue a success toast.
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    /// Queue an error toast.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into());
    }

    /// Take every pending toast, oldest first.
    pub fn drain(&mut self) -> Vec<Toast> {
        self.items.drain(..).collect()
    }

    /// Pending toasts without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    /// Number of pending toasts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn push(&mut self, kind: ToastKind, message: String) {
        self.items.push_back(Toast { kind, message });
    }
}
