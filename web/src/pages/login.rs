//! Login screen.

use tracing::info;

use qparchive_common::protocol::LoginRequest;

use crate::app::{App, Route};
use crate::notice::Notice;
use crate::pages::all_filled;

#[derive(Debug, Clone, Default)]
pub struct LoginPage {
    pub username: String,
    pub password: String,
    pub notice: Notice,
}

impl LoginPage {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            notice: Notice::default(),
        }
    }

    /// Authenticate and persist the session. Returns where to go next.
    pub async fn submit(&mut self, app: &App) -> Option<Route> {
        self.notice.clear();
        if !all_filled(&[&self.username, &self.password]) {
            self.notice
                .set_error("Please enter your username and password.");
            return None;
        }

        let request = LoginRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        };
        let response = match app.api.login(&request).await {
            Ok(r) => r,
            Err(e) => {
                // A 401 here means bad credentials, not an expired session.
                self.notice.set_error(e.message);
                return None;
            }
        };

        if response.token.is_empty() {
            self.notice.set_error("Login failed. Please check your credentials.");
            return None;
        }

        let session = response.into_session();
        if let Err(e) = app.sessions.set_session(&session.token, &session.user) {
            self.notice.set_error(format!("Could not save your session: {e}"));
            return None;
        }

        info!("Logged in as {}", session.user.username);
        self.password.clear();
        Some(Route::Dashboard)
    }
}
