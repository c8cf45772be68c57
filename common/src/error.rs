//! Error taxonomy shared by the API client and the pages.
//!
//! Call sites name an [`Endpoint`]; the endpoint supplies the fallback text
//! shown when the backend's error body carries no usable message.

/// Coarse classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was obtained.
    Network,
    /// 401 / 403.
    Unauthorized,
    /// 404.
    NotFound,
    /// 400 / 409 / 422, or a local form check.
    Validation,
    Unknown,
}

impl ErrorKind {
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Network => "Could not reach the server. Please check your connection.",
            Self::Unauthorized => "You are not authorised to do that. Please log in again.",
            Self::NotFound => "The requested item was not found.",
            Self::Validation => "Please check the form and try again.",
            Self::Unknown => "An unexpected error occurred.",
        }
    }

    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            400 | 409 | 422 => Self::Validation,
            _ => Self::Unknown,
        }
    }
}

/// Every backend operation the client performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Signup,
    ListDepartments,
    AddDepartment,
    DeleteDepartment,
    ListCourses,
    AddCourse,
    DeleteCourse,
    ListSubjects,
    ListSubjectsBySemester,
    AddSubject,
    DeleteSubject,
    ListPapers,
    UploadPaper,
    DownloadPaper,
    DeletePaper,
    CreateUser,
}

impl Endpoint {
    /// Message surfaced when the response body has nothing better to say.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::Login => "Login failed",
            Self::Signup => "Signup failed.",
            Self::ListDepartments => "Failed to fetch departments",
            Self::AddDepartment => "Failed to add department.",
            Self::DeleteDepartment => "Failed to delete department.",
            Self::ListCourses => "Failed to fetch courses",
            Self::AddCourse => "Failed to add course.",
            Self::DeleteCourse => "Failed to delete course.",
            Self::ListSubjects => "Failed to fetch subjects for the selected course",
            Self::ListSubjectsBySemester => "Failed to fetch subjects",
            Self::AddSubject => "Failed to add subject.",
            Self::DeleteSubject => "Failed to delete subject.",
            Self::ListPapers => "Failed to fetch question papers",
            Self::UploadPaper => "File upload failed.",
            Self::DownloadPaper => "Download failed.",
            Self::DeletePaper => "Failed to delete paper.",
            Self::CreateUser => "Failed to create user.",
        }
    }

    /// Message for a JSON error body that names no `error`/`message`.
    /// Only login distinguishes this from an unreadable body.
    pub fn unlabelled_json_message(&self) -> &'static str {
        match self {
            Self::Login => "Invalid username or password",
            other => other.fallback_message(),
        }
    }
}

/// A failed backend call, already carrying the text to show the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    /// HTTP status when a response was received.
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    /// Transport failure: no response.
    pub fn network() -> Self {
        Self {
            kind: ErrorKind::Network,
            status: None,
            message: ErrorKind::Network.default_message().to_string(),
        }
    }

    /// Non-success response. `server_message` is whatever could be read
    /// from the body; the endpoint fallback is used when it is `None`.
    pub fn from_response(endpoint: Endpoint, status: u16, server_message: Option<String>) -> Self {
        Self {
            kind: ErrorKind::from_status(status),
            status: Some(status),
            message: server_message.unwrap_or_else(|| endpoint.fallback_message().to_string()),
        }
    }

    /// A 2xx whose body could not be decoded.
    pub fn malformed(endpoint: Endpoint) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: None,
            message: endpoint.fallback_message().to_string(),
        }
    }

    /// Only a 401 says the stored token is no longer accepted.
    pub fn is_session_expired(&self) -> bool {
        self.status == Some(401)
    }
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(422), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Unknown);
    }

    #[test]
    fn test_fallback_used_without_server_message() {
        let err = ApiError::from_response(Endpoint::ListDepartments, 500, None);
        assert_eq!(err.to_string(), "Failed to fetch departments");
        assert!(!err.is_session_expired());

        let err = ApiError::from_response(Endpoint::Login, 401, Some("Bad credentials".into()));
        assert_eq!(err.to_string(), "Bad credentials");
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert!(err.is_session_expired());
    }

    #[test]
    fn test_login_has_two_fallbacks() {
        assert_eq!(Endpoint::Login.fallback_message(), "Login failed");
        assert_eq!(
            Endpoint::Login.unlabelled_json_message(),
            "Invalid username or password"
        );
        assert_eq!(
            Endpoint::ListPapers.unlabelled_json_message(),
            Endpoint::ListPapers.fallback_message()
        );
    }

    #[test]
    fn test_network_error_uses_kind_message() {
        let err = ApiError::network();
        assert_eq!(err.status, None);
        assert_eq!(err.message, ErrorKind::Network.default_message());
    }
}
