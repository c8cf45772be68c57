//! Wire types exchanged with the archive backend.
//!
//! Field names follow the backend's JSON (camelCase where it uses it).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Backend identifiers are plain integers.
pub type Id = i64;

/// Semesters a subject can belong to.
pub const SEMESTERS: std::ops::RangeInclusive<u8> = 1..=8;

// ── Session ──────────────────────────────────────────────────────────────

/// Role carried by a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Self::Student),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// The `user` entry of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub role: Role,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A complete session: token and user always travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserRecord,
}

// ── Academic hierarchy ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub code: String,
    pub semester: u8,
}

/// Uploader reference embedded in a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uploader {
    pub username: String,
}

/// An archived question paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: Id,
    pub original_name: String,
    pub year: i32,
    pub session: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: Uploader,
}

/// Accept RFC 3339 or a zone-less ISO-8601 date-time (taken as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp '{raw}'")))
}

/// Parse a backend timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// ── Requests / responses ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
}

impl LoginResponse {
    pub fn into_session(self) -> Session {
        Session {
            token: self.token,
            user: UserRecord {
                username: self.username,
                role: self.role,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body for adding a department or a course.
#[derive(Debug, Clone, Serialize)]
pub struct NewUnit {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSubject {
    pub name: String,
    pub code: String,
    pub semester: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Response of the admin user-creation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedUser {
    pub username: String,
    pub role: Role,
}

/// Error body shape most endpoints reply with.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn text(self) -> Option<String> {
        self.error
            .or(self.message)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_paper_from_backend_json() {
        let json = r#"{
            "id": 7,
            "originalName": "DBMS-2023.pdf",
            "year": 2023,
            "session": "Nov/Dec",
            "uploadedAt": "2024-05-01T10:15:30.123",
            "uploadedBy": {"username": "asha", "email": "ignored@x"}
        }"#;
        let paper: Paper = serde_json::from_str(json).unwrap();
        assert_eq!(paper.original_name, "DBMS-2023.pdf");
        assert_eq!(paper.uploaded_by.username, "asha");
        assert_eq!(
            paper.uploaded_at.timestamp(),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 30).unwrap().timestamp()
        );
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let ts = parse_timestamp("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_role_wire_format() {
        let user: UserRecord = serde_json::from_str(r#"{"username":"a","role":"ADMIN"}"#).unwrap();
        assert!(user.is_admin());
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"STUDENT\"");
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert!("professor".parse::<Role>().is_err());
    }

    #[test]
    fn test_error_body_text() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"  Bad credentials "}"#).unwrap();
        assert_eq!(body.text().as_deref(), Some("Bad credentials"));
        let body: ErrorBody = serde_json::from_str(r#"{"message":"gone"}"#).unwrap();
        assert_eq!(body.text().as_deref(), Some("gone"));
        assert_eq!(ErrorBody::default().text(), None);
    }
}
