//! Page-level message region: at most one of error or success is shown.

use tracing::debug;

use qparchive_common::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notice {
    error: Option<String>,
    success: Option<String>,
    /// The last failure was a 401: the stored token is no longer accepted.
    session_expired: bool,
}

impl Notice {
    /// Called at the start of every user action.
    pub fn clear(&mut self) {
        self.error = None;
        self.success = None;
        self.session_expired = false;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("{message}");
        self.success = None;
        self.error = Some(message);
    }

    /// Show `message` for a failed backend call.
    pub fn fail(&mut self, err: &ApiError, message: impl Into<String>) {
        self.set_error(message);
        self.session_expired = err.is_session_expired();
    }

    /// Show the backend's own message for a failed call.
    pub fn fail_with_api_message(&mut self, err: &ApiError) {
        self.fail(err, err.message.clone());
    }

    pub fn set_success(&mut self, message: impl Into<String>) {
        self.error = None;
        self.success = Some(message.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn session_expired(&self) -> bool {
        self.session_expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutually_exclusive() {
        let mut notice = Notice::default();
        notice.set_success("saved");
        notice.set_error("boom");
        assert_eq!(notice.error(), Some("boom"));
        assert_eq!(notice.success(), None);

        notice.set_success("ok");
        assert!(!notice.is_error());
        notice.clear();
        assert_eq!(notice, Notice::default());
    }

    #[test]
    fn test_fail_tracks_expiry() {
        use qparchive_common::error::Endpoint;

        let mut notice = Notice::default();
        let err = ApiError::from_response(Endpoint::ListPapers, 401, None);
        notice.fail(&err, "Could not load papers.");
        assert_eq!(notice.error(), Some("Could not load papers."));
        assert!(notice.session_expired());

        let err = ApiError::from_response(Endpoint::DeletePaper, 500, Some("locked".into()));
        notice.fail_with_api_message(&err);
        assert_eq!(notice.error(), Some("locked"));
        assert!(!notice.session_expired());
    }
}
