//! Admin: manage the courses of a department.

use qparchive_common::error::ApiError;
use qparchive_common::protocol::{Course, Department, Id, NewUnit};

use crate::api::ApiClient;
use crate::cascade::{Level, Ticket};
use crate::notice::Notice;
use crate::pages::{all_filled, load, reload, settle};

const COURSES_FAILED: &str = "Could not fetch courses for this department.";

#[derive(Debug, Clone, Default)]
pub struct AdminCoursesPage {
    pub departments: Level<Department>,
    pub courses: Level<Course>,
    pub new_name: String,
    pub new_code: String,
    pub notice: Notice,
}

impl AdminCoursesPage {
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
        id.map(|_| self.courses.begin_load())
    }

    pub fn courses_loaded(&mut self, ticket: Ticket, result: Result<Vec<Course>, ApiError>) {
        settle(&mut self.courses, &mut self.notice, ticket, result, COURSES_FAILED);
    }

    pub async fn change_department(&mut self, api: &ApiClient, id: Option<Id>) {
        if let (Some(ticket), Some(id)) = (self.select_department(id), id) {
            let result = api.courses(id).await;
            self.courses_loaded(ticket, result);
        }
    }

    async fn refresh(&mut self, api: &ApiClient) {
        if let Some(dept) = self.departments.selected() {
            reload(&mut self.courses, &mut self.notice, api.courses(dept), COURSES_FAILED).await;
        }
    }

    pub async fn add(&mut self, api: &ApiClient) -> bool {
        self.notice.clear();
        let Some(dept) = self.departments.selected() else {
            self.notice.set_error("Please select a department first.");
            return false;
        };
        if !all_filled(&[&self.new_name, &self.new_code]) {
            self.notice.set_error("Please enter a course name and code.");
            return false;
        }
        let body = NewUnit {
            name: self.new_name.trim().to_string(),
            code: self.new_code.trim().to_string(),
        };
        match api.add_course(dept, &body).await {
            Ok(course) => {
                self.notice
                    .set_success(format!("Successfully added course: {}", course.name));
                self.new_name.clear();
                self.new_code.clear();
                self.refresh(api).await;
                true
            }
            Err(e) => {
                self.notice.fail_with_api_message(&e);
                false
            }
        }
    }

    /// Delete after the user confirmed; the backend removes its subjects too.
    pub async fn delete(&mut self, api: &ApiClient, id: Id) -> bool {
        self.notice.clear();
        match api.delete_course(id).await {
            Ok(()) => {
                self.notice.set_success("Course deleted successfully.");
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
