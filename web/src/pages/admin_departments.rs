//! Admin: list, add and delete departments.

use qparchive_common::protocol::{Department, Id, NewUnit};

use crate::api::ApiClient;
use crate::cascade::Level;
use crate::notice::Notice;
use crate::pages::{all_filled, load, reload};

const LOAD_FAILED: &str = "Could not fetch departments.";

#[derive(Debug, Clone, Default)]
pub struct AdminDepartmentsPage {
    pub departments: Level<Department>,
    pub new_name: String,
    pub new_code: String,
    pub notice: Notice,
}

impl AdminDepartmentsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mount(&mut self, api: &ApiClient) {
        load(&mut self.departments, &mut self.notice, api.departments(), LOAD_FAILED).await;
    }

    pub async fn add(&mut self, api: &ApiClient) -> bool {
        self.notice.clear();
        if !all_filled(&[&self.new_name, &self.new_code]) {
            self.notice.set_error("Please enter a department name and code.");
            return false;
        }
        let body = NewUnit {
            name: self.new_name.trim().to_string(),
            code: self.new_code.trim().to_string(),
        };
        match api.add_department(&body).await {
            Ok(dept) => {
                self.notice
                    .set_success(format!("Successfully added department: {}", dept.name));
                self.new_name.clear();
                self.new_code.clear();
                reload(&mut self.departments, &mut self.notice, api.departments(), LOAD_FAILED).await;
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
        match api.delete_department(id).await {
            Ok(()) => {
                self.notice.set_success("Department deleted successfully.");
                reload(&mut self.departments, &mut self.notice, api.departments(), LOAD_FAILED).await;
                true
            }
            Err(e) => {
                self.notice.fail_with_api_message(&e);
                false
            }
        }
    }
}
