//! Dashboard: browse papers by Department → Course → Semester → Subject.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use qparchive_common::error::{ApiError, ErrorKind};
use qparchive_common::protocol::{Course, Department, Id, Paper, Subject, UserRecord, SEMESTERS};

use crate::api::ApiClient;
use crate::cascade::{Level, Ticket};
use crate::download;
use crate::notice::Notice;
use crate::pages::{load, reload, settle};

/// How long an uploader may delete their own paper.
pub const DELETE_WINDOW_MINUTES: i64 = 60;

/// Whether the delete control is shown for `paper`.
///
/// Admins always; the uploader within [`DELETE_WINDOW_MINUTES`] of the
/// upload; nobody else.  The backend enforces its own rule regardless.
pub fn can_delete(paper: &Paper, user: &UserRecord, now: DateTime<Utc>) -> bool {
    if user.is_admin() {
        return true;
    }
    if user.username == paper.uploaded_by.username {
        return now - paper.uploaded_at <= Duration::minutes(DELETE_WINDOW_MINUTES);
    }
    false
}

#[derive(Debug, Clone, Default)]
pub struct DashboardPage {
    pub departments: Level<Department>,
    pub courses: Level<Course>,
    pub semesters: Level<u8>,
    pub subjects: Level<Subject>,
    pub papers: Level<Paper>,
    pub notice: Notice,
}

impl DashboardPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// First-level fetch.
    pub async fn mount(&mut self, api: &ApiClient) {
        load(
            &mut self.departments,
            &mut self.notice,
            api.departments(),
            "Could not load departments.",
        )
        .await;
    }

    // ── department ───────────────────────────────────────────────────────

    pub fn select_department(&mut self, id: Option<Id>) -> Option<Ticket> {
        self.notice.clear();
        self.departments.select(id);
        self.courses.reset();
        self.semesters.reset();
        self.subjects.reset();
        self.papers.reset();
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

    // ── course ───────────────────────────────────────────────────────────

    /// Semesters are a fixed list, offered as soon as a course is chosen.
    pub fn select_course(&mut self, id: Option<Id>) {
        self.notice.clear();
        self.courses.select(id);
        self.semesters.reset();
        self.subjects.reset();
        self.papers.reset();
        if id.is_some() {
            self.semesters.fill(SEMESTERS.collect());
        }
    }

    // ── semester ─────────────────────────────────────────────────────────

    pub fn select_semester(&mut self, semester: Option<u8>) -> Option<Ticket> {
        self.notice.clear();
        self.semesters.select(semester);
        self.subjects.reset();
        self.papers.reset();
        match (semester, self.courses.selected()) {
            (Some(_), Some(_)) => Some(self.subjects.begin_load()),
            _ => None,
        }
    }

    pub fn subjects_loaded(&mut self, ticket: Ticket, result: Result<Vec<Subject>, ApiError>) {
        settle(
            &mut self.subjects,
            &mut self.notice,
            ticket,
            result,
            "Could not load subjects for this semester.",
        );
    }

    pub async fn change_semester(&mut self, api: &ApiClient, semester: Option<u8>) {
        let Some(ticket) = self.select_semester(semester) else {
            return;
        };
        if let (Some(course), Some(semester)) = (self.courses.selected(), semester) {
            let result = api.subjects_for_semester(course, semester).await;
            self.subjects_loaded(ticket, result);
        }
    }

    // ── subject / papers ─────────────────────────────────────────────────

    pub fn select_subject(&mut self, id: Option<Id>) -> Option<Ticket> {
        self.notice.clear();
        self.subjects.select(id);
        self.papers.reset();
        id.map(|_| self.papers.begin_load())
    }

    pub fn papers_loaded(&mut self, ticket: Ticket, result: Result<Vec<Paper>, ApiError>) {
        settle(
            &mut self.papers,
            &mut self.notice,
            ticket,
            result,
            "Could not load papers.",
        );
    }

    pub async fn change_subject(&mut self, api: &ApiClient, id: Option<Id>) {
        if let (Some(ticket), Some(id)) = (self.select_subject(id), id) {
            let result = api.papers(id).await;
            self.papers_loaded(ticket, result);
        }
    }

    /// Refetch the current subject's papers without clearing the notice.
    pub async fn refresh_papers(&mut self, api: &ApiClient) {
        let Some(subject) = self.subjects.selected() else {
            return;
        };
        reload(
            &mut self.papers,
            &mut self.notice,
            api.papers(subject),
            "Could not load papers.",
        )
        .await;
    }

    // ── paper actions ────────────────────────────────────────────────────

    /// Papers the given user may delete right now.
    pub fn deletable(&self, user: &UserRecord, now: DateTime<Utc>) -> Vec<Id> {
        self.papers
            .options()
            .iter()
            .filter(|p| can_delete(p, user, now))
            .map(|p| p.id)
            .collect()
    }

    /// Fetch a listed paper's bytes along with the name to save it under.
    pub async fn fetch_paper(&mut self, api: &ApiClient, paper_id: Id) -> Option<(String, Vec<u8>)> {
        self.notice.clear();
        let Some(name) = self.papers.find(paper_id).map(|p| p.original_name.clone()) else {
            self.notice.set_error("That paper is not in the current list.");
            return None;
        };
        match api.download_paper(paper_id).await {
            Ok(bytes) => Some((name, bytes)),
            Err(e) => {
                self.notice.fail(&e, "Download failed.");
                None
            }
        }
    }

    /// Download a listed paper into `dir`. The caller has selected a subject.
    pub async fn download(&mut self, api: &ApiClient, paper_id: Id, dir: &Path) -> Option<PathBuf> {
        let (name, bytes) = self.fetch_paper(api, paper_id).await?;
        match download::save_as(dir, &name, paper_id, &bytes) {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("Saving {name} failed: {e}");
                self.notice.set_error("Download failed.");
                None
            }
        }
    }

    /// Delete a listed paper (after the user confirmed) and refetch the list.
    pub async fn delete_paper(&mut self, api: &ApiClient, paper_id: Id, now: DateTime<Utc>) -> bool {
        self.notice.clear();
        let Some(session) = api.session().get_session() else {
            self.notice.set_error(ErrorKind::Unauthorized.default_message());
            return false;
        };
        let Some(paper) = self.papers.find(paper_id) else {
            self.notice.set_error("That paper is not in the current list.");
            return false;
        };
        if !can_delete(paper, &session.user, now) {
            self.notice.set_error("You can no longer delete this paper.");
            return false;
        }

        match api.delete_paper(paper_id).await {
            Ok(()) => {
                info!("Deleted paper {paper_id}");
                self.notice.set_success("Paper deleted successfully!");
                self.refresh_papers(api).await;
                true
            }
            Err(e) => {
                self.notice.fail_with_api_message(&e);
                false
            }
        }
    }
}

// ─── tests ───────────────────────────────────────────────────────────────
