//! One controller per screen.
//!
//! Controllers hold form fields, selector levels and a [`Notice`]; they never
//! render anything.  Cascade transitions come in two halves (`select_*`
//! returning a [`Ticket`], `*_loaded` applying the result) so a front end
//! that runs fetches concurrently can feed results back in any order; the
//! `change_*` methods chain both halves for sequential callers.

pub mod admin_courses;
pub mod admin_departments;
pub mod admin_subjects;
pub mod admin_users;
pub mod dashboard;
pub mod login;
pub mod signup;
pub mod upload;

use std::future::Future;

use tracing::debug;

use qparchive_common::error::ApiError;

use crate::cascade::{Choice, Level, Ticket};
use crate::notice::Notice;

/// Apply a fetch result to `level`; failures show `failure` unless stale.
pub fn settle<T: Choice>(
    level: &mut Level<T>,
    notice: &mut Notice,
    ticket: Ticket,
    result: Result<Vec<T>, ApiError>,
    failure: &str,
) {
    match result {
        Ok(options) => {
            level.accept(ticket, options);
        }
        Err(err) => {
            if level.reject(ticket) {
                debug!("Load failed: {err}");
                notice.fail(&err, failure);
            }
        }
    }
}

/// Clear `level` and fill it from `fetch`.
pub async fn load<T, F>(level: &mut Level<T>, notice: &mut Notice, fetch: F, failure: &str)
where
    T: Choice,
    F: Future<Output = Result<Vec<T>, ApiError>>,
{
    let ticket = level.begin_load();
    let result = fetch.await;
    settle(level, notice, ticket, result, failure);
}

/// Refresh `level` after a mutation, keeping the old list until the new one
/// arrives.
pub async fn reload<T, F>(level: &mut Level<T>, notice: &mut Notice, fetch: F, failure: &str)
where
    T: Choice,
    F: Future<Output = Result<Vec<T>, ApiError>>,
{
    let ticket = level.begin_reload();
    let result = fetch.await;
    settle(level, notice, ticket, result, failure);
}

/// What a front end needs from every controller.
pub trait Page: Clone + Default + Send + Sync + 'static {
    fn notice(&self) -> &Notice;
}

macro_rules! impl_page {
    ($($page:ty),* $(,)?) => {
        $(impl Page for $page {
            fn notice(&self) -> &Notice {
                &self.notice
            }
        })*
    };
}

impl_page!(
    login::LoginPage,
    signup::SignupPage,
    dashboard::DashboardPage,
    upload::UploadPage,
    admin_departments::AdminDepartmentsPage,
    admin_courses::AdminCoursesPage,
    admin_subjects::AdminSubjectsPage,
    admin_users::AdminUsersPage,
);

/// `true` when every field has non-blank content.
pub(crate) fn all_filled(fields: &[&str]) -> bool {
    fields.iter().all(|f| !f.trim().is_empty())
}
