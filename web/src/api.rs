//! HTTP client for the archive backend.
//!
//! Every call resolves its path against the configured origin, attaches
//! `Authorization: Bearer <token>` when a session exists, and turns any
//! non-success response into an [`ApiError`] carrying the text to show.

use std::time::Duration;

use anyhow::Context;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use qparchive_common::config::{normalize_base_url, Config};
use qparchive_common::error::{ApiError, Endpoint};
use qparchive_common::protocol::{
    Course, CreatedUser, Department, ErrorBody, Id, LoginRequest, LoginResponse, NewSubject,
    NewUnit, NewUser, Paper, SignupRequest, Subject,
};

use crate::session::SessionStore;

/// Longest plain-text error body surfaced verbatim.
const MAX_TEXT_ERROR_LEN: usize = 300;

/// Header set attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// `Content-Type: application/json` plus auth.
    Json,
    /// Auth only; the transport picks the content type (multipart, downloads).
    AuthOnly,
}

/// Request body.
pub enum Payload {
    Empty,
    Json(Vec<u8>),
    Multipart(Form),
}

/// Fields of the paper upload form.
#[derive(Debug, Clone)]
pub struct PaperUpload {
    pub semester: u8,
    pub year: i32,
    pub session: String,
    pub subject_id: Id,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Option<Duration>, session: SessionStore) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        // The browser fetch backend has no client-wide timeout.
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        #[cfg(target_arch = "wasm32")]
        let _ = timeout;
        let http = builder.build().context("Cannot create HTTP client")?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
            session,
        })
    }

    pub fn from_config(config: &Config, session: SessionStore) -> anyhow::Result<Self> {
        Self::new(&config.api_base_url, config.request_timeout, session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // ── core ─────────────────────────────────────────────────────────────

    /// Send one request and return the response if its status is a success.
    pub async fn request(
        &self,
        endpoint: Endpoint,
        method: Method,
        path: &str,
        payload: Payload,
        mode: HeaderMode,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {url}");

        let mut builder = self.http.request(method.clone(), &url);
        if requires_auth(endpoint) {
            if let Some(token) = self.session.token() {
                builder = builder.bearer_auth(token);
            }
        }
        if mode == HeaderMode::Json {
            builder = builder.header(reqwest::header::CONTENT_TYPE, "application/json");
        }
        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(bytes) => builder.body(bytes),
            Payload::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await.map_err(|e| {
            warn!("{method} {url} failed: {e}");
            ApiError::network()
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match error_message(response).await {
            ErrorText::Message(text) => Some(text),
            ErrorText::UnlabelledJson => Some(endpoint.unlabelled_json_message().to_string()),
            ErrorText::Unreadable => None,
        };
        warn!("{method} {url} returned {status}");
        Err(ApiError::from_response(endpoint, status.as_u16(), message))
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint, path: &str) -> Result<T, ApiError> {
        let response = self
            .request(endpoint, Method::GET, path, Payload::Empty, HeaderMode::Json)
            .await?;
        decode(endpoint, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let bytes = serde_json::to_vec(body).map_err(|_| ApiError::malformed(endpoint))?;
        let response = self
            .request(endpoint, Method::POST, path, Payload::Json(bytes), HeaderMode::Json)
            .await?;
        decode(endpoint, response).await
    }

    async fn delete(&self, endpoint: Endpoint, path: &str) -> Result<(), ApiError> {
        self.request(endpoint, Method::DELETE, path, Payload::Empty, HeaderMode::AuthOnly)
            .await?;
        Ok(())
    }

    // ── auth ─────────────────────────────────────────────────────────────

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post_json(Endpoint::Login, "/auth/login", request).await
    }

    /// The body of a successful signup is not needed.
    pub async fn signup(&self, request: &SignupRequest) -> Result<(), ApiError> {
        let endpoint = Endpoint::Signup;
        let bytes = serde_json::to_vec(request).map_err(|_| ApiError::malformed(endpoint))?;
        self.request(endpoint, Method::POST, "/auth/signup", Payload::Json(bytes), HeaderMode::Json)
            .await?;
        Ok(())
    }

    // ── departments ──────────────────────────────────────────────────────

    pub async fn departments(&self) -> Result<Vec<Department>, ApiError> {
        self.get_json(Endpoint::ListDepartments, "/departments").await
    }

    pub async fn add_department(&self, department: &NewUnit) -> Result<Department, ApiError> {
        self.post_json(Endpoint::AddDepartment, "/departments", department)
            .await
    }

    pub async fn delete_department(&self, id: Id) -> Result<(), ApiError> {
        self.delete(Endpoint::DeleteDepartment, &format!("/departments/{id}"))
            .await
    }

    // ── courses ──────────────────────────────────────────────────────────

    pub async fn courses(&self, department_id: Id) -> Result<Vec<Course>, ApiError> {
        self.get_json(
            Endpoint::ListCourses,
            &format!("/courses/department/{department_id}"),
        )
        .await
    }

    pub async fn add_course(&self, department_id: Id, course: &NewUnit) -> Result<Course, ApiError> {
        self.post_json(
            Endpoint::AddCourse,
            &format!("/courses/department/{department_id}"),
            course,
        )
        .await
    }

    pub async fn delete_course(&self, id: Id) -> Result<(), ApiError> {
        self.delete(Endpoint::DeleteCourse, &format!("/courses/{id}"))
            .await
    }

    // ── subjects ─────────────────────────────────────────────────────────

    pub async fn subjects(&self, course_id: Id) -> Result<Vec<Subject>, ApiError> {
        self.get_json(Endpoint::ListSubjects, &format!("/subjects/course/{course_id}"))
            .await
    }

    pub async fn subjects_for_semester(&self, course_id: Id, semester: u8) -> Result<Vec<Subject>, ApiError> {
        self.get_json(
            Endpoint::ListSubjectsBySemester,
            &format!("/subjects/course/{course_id}/semester/{semester}"),
        )
        .await
    }

    pub async fn add_subject(&self, course_id: Id, subject: &NewSubject) -> Result<Subject, ApiError> {
        self.post_json(
            Endpoint::AddSubject,
            &format!("/subjects/course/{course_id}"),
            subject,
        )
        .await
    }

    pub async fn delete_subject(&self, id: Id) -> Result<(), ApiError> {
        self.delete(Endpoint::DeleteSubject, &format!("/subjects/{id}"))
            .await
    }

    // ── papers ───────────────────────────────────────────────────────────

    pub async fn papers(&self, subject_id: Id) -> Result<Vec<Paper>, ApiError> {
        self.get_json(Endpoint::ListPapers, &format!("/papers/subject/{subject_id}"))
            .await
    }

    /// Multipart upload; the response body is not needed.
    pub async fn upload_paper(&self, upload: PaperUpload) -> Result<(), ApiError> {
        let endpoint = Endpoint::UploadPaper;
        let file = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str("application/pdf")
            .map_err(|_| ApiError::malformed(endpoint))?;
        let form = Form::new()
            .text("semester", upload.semester.to_string())
            .text("year", upload.year.to_string())
            .text("session", upload.session)
            .text("subjectId", upload.subject_id.to_string())
            .part("file", file);

        self.request(
            endpoint,
            Method::POST,
            "/papers/upload",
            Payload::Multipart(form),
            HeaderMode::AuthOnly,
        )
        .await?;
        Ok(())
    }

    /// Raw bytes of a stored paper.
    pub async fn download_paper(&self, id: Id) -> Result<Vec<u8>, ApiError> {
        let endpoint = Endpoint::DownloadPaper;
        let response = self
            .request(
                endpoint,
                Method::GET,
                &format!("/papers/download/{id}"),
                Payload::Empty,
                HeaderMode::AuthOnly,
            )
            .await?;
        let bytes = response.bytes().await.map_err(|e| {
            warn!("Reading download body failed: {e}");
            ApiError::network()
        })?;
        Ok(bytes.to_vec())
    }

    pub async fn delete_paper(&self, id: Id) -> Result<(), ApiError> {
        self.delete(Endpoint::DeletePaper, &format!("/papers/{id}"))
            .await
    }

    // ── admin ────────────────────────────────────────────────────────────

    pub async fn create_user(&self, user: &NewUser) -> Result<CreatedUser, ApiError> {
        self.post_json(Endpoint::CreateUser, "/api/admin/users", user)
            .await
    }
}

// ── helpers ──────────────────────────────────────────────────────────────

/// Login and signup are the only unauthenticated endpoints.
fn requires_auth(endpoint: Endpoint) -> bool {
    !matches!(endpoint, Endpoint::Login | Endpoint::Signup)
}

async fn decode<T: DeserializeOwned>(endpoint: Endpoint, response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(|e| {
        warn!("Reading response body failed: {e}");
        ApiError::network()
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!("Unexpected response body for {endpoint:?}: {e}");
        ApiError::malformed(endpoint)
    })
}

/// What an error body has to say.
#[derive(Debug, PartialEq, Eq)]
enum ErrorText {
    /// Show this text.
    Message(String),
    /// Valid JSON without an `error` or `message` field.
    UnlabelledJson,
    /// Empty, HTML, oversized, or not text at all.
    Unreadable,
}

/// Best-effort extraction of a human-readable message from an error body.
async fn error_message(response: Response) -> ErrorText {
    match response.text().await {
        Ok(text) => extract_message(&text),
        Err(_) => ErrorText::Unreadable,
    }
}

fn extract_message(text: &str) -> ErrorText {
    let text = text.trim();
    if text.is_empty() {
        return ErrorText::Unreadable;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        return serde_json::from_value::<ErrorBody>(value)
            .ok()
            .and_then(ErrorBody::text)
            .map_or(ErrorText::UnlabelledJson, ErrorText::Message);
    }
    if text.starts_with('<') || text.len() > MAX_TEXT_ERROR_LEN {
        return ErrorText::Unreadable;
    }
    ErrorText::Message(text.to_string())
}

// ─── tests ───────────────────────────────────────────────────────────────
