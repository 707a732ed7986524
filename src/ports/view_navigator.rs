//! Host UI port used by the access gate for its side effects.

/// Transient notification shown before a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Notification and navigation hooks supplied by the host UI.
pub trait ViewNavigator: Send + Sync {
    /// Show a transient notification.
    fn notify(&self, notice: &Notice);

    /// Navigate to a route.
    fn navigate(&self, route: &str);
}
