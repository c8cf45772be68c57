//! Self-service registration.

use qparchive_common::protocol::SignupRequest;

use crate::app::App;
use crate::notice::Notice;
use crate::pages::all_filled;

pub const REGISTERED_MESSAGE: &str = "We've sent a verification link to your email. \
     Please click the link to activate your account.";

#[derive(Debug, Clone, Default)]
pub struct SignupPage {
    pub username: String,
    pub email: String,
    pub password: String,
    pub notice: Notice,
    /// Set once the backend accepted the registration.
    pub registered: bool,
}

impl SignupPage {
    pub async fn submit(&mut self, app: &App) -> bool {
        self.notice.clear();
        if !all_filled(&[&self.username, &self.email, &self.password]) {
            self.notice.set_error("Please fill out all fields.");
            return false;
        }

        let request = SignupRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        match app.api.signup(&request).await {
            Ok(_) => {
                self.registered = true;
                self.notice.set_success(REGISTERED_MESSAGE);
                true
            }
            Err(e) => {
                self.notice.fail_with_api_message(&e);
                false
            }
        }
    }
}
