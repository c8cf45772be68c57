//! Admin: manage the subjects of a course.

use qparchive_common::error::ApiError;
use qparchive_common::protocol::{Course, Department, Id, NewSubject, Subject, SEMESTERS};

use crate::api::ApiClient;
use crate::cascade::{Level, Ticket};
use crate::notice::Notice;
use crate::pages::{load, reload, settle};

const SUBJECTS_FAILED: &str = "Could not fetch subjects.";

/// The "new subject" form.
#[derive(Debug, Clone, Default)]
pub struct SubjectDraft {
    pub name: String,
    pub code: String,
    pub semester: Option<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct AdminSubjectsPage {
    pub departments: Level<Department>,
    pub courses: Level<Course>,
    pub subjects: Level<Subject>,
    pub draft: SubjectDraft,
    pub notice: Notice,
}

impl AdminSubjectsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mount(&mut self, api: &ApiClient) {
        load(
            &mut self.departments,
            &mut self.notice,
            api.departments(),
            "Could not fetch departments.",
        )
        .await;
    }

    pub fn select_department(&mut self, id: Option<Id>) -> Option<Ticket> {
        self.notice.clear();
        self.departments.select(id);
        self.courses.reset();
        self.subjects.reset();
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

    pub fn select_course(&mut self, id: Option<Id>) -> Option<Ticket> {
        self.notice.clear();
        self.courses.select(id);
        self.subjects.reset();
        id.map(|_| self.subjects.begin_load())
    }

    pub fn subjects_loaded(&mut self, ticket: Ticket, result: Result<Vec<Subject>, ApiError>) {
        settle(&mut self.subjects, &mut self.notice, ticket, result, SUBJECTS_FAILED);
    }

    pub async fn change_course(&mut self, api: &ApiClient, id: Option<Id>) {
        if let (Some(ticket), Some(id)) = (self.select_course(id), id) {
            let result = api.subjects(id).await;
            self.subjects_loaded(ticket, result);
        }
    }

    async fn refresh(&mut self, api: &ApiClient) {
        if let Some(course) = self.courses.selected() {
            reload(&mut self.subjects, &mut self.notice, api.subjects(course), SUBJECTS_FAILED).await;
        }
    }

    pub async fn add(&mut self, api: &ApiClient) -> bool {
        self.notice.clear();
        let (Some(course), Some(semester)) = (self.courses.selected(), self.draft.semester) else {
            self.notice.set_error(
                "Please select a department/course and fill in all subject details.",
            );
            return false;
        };
        if self.draft.name.trim().is_empty() || !SEMESTERS.contains(&semester) {
            self.notice.set_error(
                "Please select a department/course and fill in all subject details.",
            );
            return false;
        }

        let body = NewSubject {
            name: self.draft.name.trim().to_string(),
            code: self.draft.code.trim().to_string(),
            semester,
        };
        match api.add_subject(course, &body).await {
            Ok(subject) => {
                self.notice
                    .set_success(format!("Successfully added subject: {}", subject.name));
                self.draft = SubjectDraft::default();
                self.refresh(api).await;
                true
            }
            Err(e) => {
                self.notice.fail_with_api_message(&e);
                false
            }
        }
    }

    /// Delete after the user confirmed.
    pub async fn delete(&mut self, api: &ApiClient, id: Id) -> bool {
        self.notice.clear();
        match api.delete_subject(id).await {
            Ok(()) => {
                self.notice.set_success("Subject deleted successfully.");
                self.refresh(api).await;
                true
            }
            Err(e) => {
                self.notice.fail_with_api_message(&e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;

    #[tokio::test]
    async fn test_add_requires_course_and_semester() {
        let api = ApiClient::new("http://127.0.0.1:9", None, SessionStore::in_memory()).unwrap();
        let mut page = AdminSubjectsPage::new();
        page.draft.name = "Compilers".into();
        page.draft.semester = Some(5);
        assert!(!page.add(&api).await);
        assert!(page.notice.error().unwrap().starts_with("Please select"));

        page.courses.select(Some(3));
        page.draft.semester = Some(9);
        assert!(!page.add(&api).await);
        assert!(page.notice.is_error());
    }

    #[test]
    fn test_course_change_clears_subjects() {
        let mut page = AdminSubjectsPage::new();
        let t = page.select_course(Some(1)).unwrap();
        page.subjects_loaded(
            t,
            Ok(vec![Subject {
                id: 1,
                name: "OS".into(),
                code: "CS301".into(),
                semester: 3,
            }]),
        );
        assert_eq!(page.subjects.options().len(), 1);
        let _ = page.select_department(Some(2));
        assert!(page.subjects.options().is_empty());
        assert_eq!(page.courses.selected(), None);
    }
}
