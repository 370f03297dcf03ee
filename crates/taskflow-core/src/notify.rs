//! Best-effort user notifications.
//!
//! The focus controller announces phase completions through [`Notifier`].
//! Delivery is never guaranteed: an unavailable or denied notification
//! channel silently no-ops, it is never an error.

/// Notification sink consumed by the focus controller.
pub trait Notifier {
    /// Deliver a notification. Infallible by contract; implementations
    /// swallow delivery problems.
    fn notify(&self, title: &str, body: &str);

    /// Ask the platform for notification permission, if it has such a
    /// concept. Called once when a focus session starts.
    fn request_permission(&self) {}
}

/// Discards all notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}
