//! Admin: create an account with a chosen role.

use qparchive_common::protocol::{NewUser, Role};

use crate::api::ApiClient;
use crate::notice::Notice;
use crate::pages::all_filled;

#[derive(Debug, Clone, Default)]
pub struct AdminUsersPage {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Defaults to STUDENT.
    pub role: Role,
    pub notice: Notice,
}

impl AdminUsersPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn submit(&mut self, api: &ApiClient) -> bool {
        self.notice.clear();
        if !all_filled(&[&self.username, &self.email, &self.password]) {
            self.notice.set_error("Please fill out all fields.");
            return false;
        }

        let body = NewUser {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: self.role,
        };
        match api.create_user(&body).await {
            Ok(user) => {
                self.notice.set_success(format!(
                    "Successfully created user: {} with role {}",
                    user.username, user.role
                ));
                let notice = std::mem::take(&mut self.notice);
                *self = Self {
                    notice,
                    ..Self::default()
                };
                true
            }
            Err(e) => {
                self.notice.fail_with_api_message(&e);
                false
            }
        }
    }
}
