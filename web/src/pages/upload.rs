//! Upload a question paper (PDF) to a subject.

use std::path::Path;

use chrono::Datelike;
use tracing::{debug, info};

use qparchive_common::error::ApiError;
use qparchive_common::protocol::{Course, Department, Id, Subject, SEMESTERS};

use crate::api::{ApiClient, PaperUpload};
use crate::cascade::{Level, Ticket};
use crate::notice::Notice;
use crate::pages::{load, settle};

pub const MISSING_FIELDS: &str = "Please fill out all fields and select a file.";

/// A file chosen for upload: its base name and contents.
#[derive(Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PickedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PickedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, std::fs::read(path)?))
    }

    pub fn is_pdf(&self) -> bool {
        is_pdf(&self.name)
    }
}

/// Form fields; everything except `year` starts empty.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub semester: Option<u8>,
    pub year: Option<i32>,
    pub session: String,
    pub subject_id: Option<Id>,
    pub file: Option<PickedFile>,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            semester: None,
            year: Some(chrono::Local::now().year()),
            session: String::new(),
            subject_id: None,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadPage {
    pub departments: Level<Department>,
    pub courses: Level<Course>,
    pub subjects: Level<Subject>,
    pub form: UploadForm,
    pub notice: Notice,
}

impl UploadPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mount(&mut self, api: &ApiClient) {
        load(
            &mut self.departments,
            &mut self.notice,
            api.departments(),
            "Failed to load initial data.",
        )
        .await;
    }

    pub fn select_department(&mut self, id: Option<Id>) -> Option<Ticket> {
        self.notice.clear();
        self.departments.select(id);
        self.courses.reset();
        self.subjects.reset();
        self.form.subject_id = None;
        id.map(|_| self.courses.begin_load())
    }

    pub fn courses_loaded(&mut self, ticket: Ticket, result: Result<Vec<Course>, ApiError>) {
        settle(
            &mut self.courses,
            &mut self.notice,
            ticket,
            result,
            "Could not fetch courses.",
        );
    }

    pub async fn change_department(&mut self, api: &ApiClient, id: Option<Id>) {
        if let (Some(ticket), Some(id)) = (self.select_department(id), id) {
            let result = api.courses(id).await;
            self.courses_loaded(ticket, result);
        }
    }

    /// Subjects of every semester of the course are offered.
    pub fn select_course(&mut self, id: Option<Id>) -> Option<Ticket> {
        self.notice.clear();
        self.courses.select(id);
        self.subjects.reset();
        self.form.subject_id = None;
        id.map(|_| self.subjects.begin_load())
    }

    pub fn subjects_loaded(&mut self, ticket: Ticket, result: Result<Vec<Subject>, ApiError>) {
        settle(
            &mut self.subjects,
            &mut self.notice,
            ticket,
            result,
            "Could not load subjects.",
        );
    }

    pub async fn change_course(&mut self, api: &ApiClient, id: Option<Id>) {
        if let (Some(ticket), Some(id)) = (self.select_course(id), id) {
            let result = api.subjects(id).await;
            self.subjects_loaded(ticket, result);
        }
    }

    pub fn select_subject(&mut self, id: Option<Id>) {
        self.notice.clear();
        self.subjects.select(id);
        self.form.subject_id = id;
    }

    /// Attach a file from disk; an unreadable path leaves no file attached.
    pub fn attach(&mut self, path: &Path) -> bool {
        match PickedFile::read(path) {
            Ok(file) => {
                self.form.file = Some(file);
                true
            }
            Err(e) => {
                debug!("Cannot read {}: {e}", path.display());
                self.form.file = None;
                self.notice.set_error("Could not read the selected file.");
                false
            }
        }
    }

    /// Validate locally, then send the multipart upload.
    pub async fn submit(&mut self, api: &ApiClient) -> bool {
        let form = &self.form;
        let (Some(file), Some(subject_id), Some(year), Some(semester)) =
            (form.file.clone(), form.subject_id, form.year, form.semester)
        else {
            self.notice.set_error(MISSING_FIELDS);
            return false;
        };
        if form.session.trim().is_empty() {
            self.notice.set_error(MISSING_FIELDS);
            return false;
        }
        if !SEMESTERS.contains(&semester) {
            self.notice.set_error("Semester must be between 1 and 8.");
            return false;
        }
        if !file.is_pdf() {
            self.notice.set_error("Only PDF files can be uploaded.");
            return false;
        }

        self.notice.clear();
        let PickedFile { name: file_name, bytes } = file;
        let upload = PaperUpload {
            semester,
            year,
            session: self.form.session.trim().to_string(),
            subject_id,
            file_name: file_name.clone(),
            bytes,
        };
        match api.upload_paper(upload).await {
            Ok(()) => {
                info!("Uploaded {file_name} to subject {subject_id}");
                self.notice
                    .set_success(format!("Paper \"{file_name}\" uploaded successfully!"));
                self.form = UploadForm {
                    year: self.form.year,
                    ..UploadForm::default()
                };
                self.subjects.select(None);
                true
            }
            Err(e) => {
                self.notice.fail_with_api_message(&e);
                false
            }
        }
    }
}

fn is_pdf(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

// ─── tests ───────────────────────────────────────────────────────────────
