//! Leptos front end: one view per screen over the page controllers.
//!
//! Each view keeps its controller in an `RwSignal`. Cascade changes call the
//! synchronous `select_*` half in place and feed the fetched result back
//! through `*_loaded`, so a stale response is dropped by its ticket. Other
//! actions run on a copy of the controller which is then published whole.

pub mod admin_courses;
pub mod admin_departments;
pub mod admin_subjects;
pub mod admin_users;
pub mod dashboard;
pub mod login;
pub mod signup;
pub mod upload;

use std::future::Future;

use leptos::config::LeptosOptions;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::{provide_meta_context, Meta, MetaTags, Stylesheet, Title};
use leptos_router::components::{ProtectedRoute, Redirect, Route, Router, Routes, A};
use leptos_router::path;
use tracing::warn;

use qparchive_common::error::ApiError;
use qparchive_common::protocol::Session;

use crate::app::{self, guard_of, redirect_for, App, Route as Screen};
use crate::cascade::Ticket;
use crate::components::nav::Nav;
use crate::pages::Page;
use crate::session::SessionStore;

use admin_courses::AdminCoursesView;
use admin_departments::AdminDepartmentsView;
use admin_subjects::AdminSubjectsView;
use admin_users::AdminUsersView;
use dashboard::DashboardView;
use login::LoginView;
use signup::SignupView;
use upload::UploadView;

// ── session state ────────────────────────────────────────────────────────

/// Reactive copy of the stored session.
///
/// Storage is only readable in the browser, so `ready` stays `false` during
/// server rendering and guarded routes render nothing until it flips.
#[derive(Debug, Clone, Copy)]
pub struct Auth {
    ready: RwSignal<bool>,
    session: RwSignal<Option<Session>>,
}

impl Default for Auth {
    fn default() -> Self {
        Self::new()
    }
}

impl Auth {
    pub fn new() -> Self {
        Self {
            ready: RwSignal::new(false),
            session: RwSignal::new(None),
        }
    }

    /// Re-read the session from `sessions`.
    pub fn refresh(&self, sessions: &SessionStore) {
        self.session.set(sessions.get_session());
        self.ready.set(true);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    pub fn session(&self) -> Option<Session> {
        self.session.get()
    }

    /// Guard decision for `screen`; `None` until the session has been read.
    pub fn allows(&self, screen: Screen) -> Option<bool> {
        if !self.ready.get() {
            return None;
        }
        Some(self.session.with(|s| redirect_for(guard_of(screen), s.as_ref()).is_none()))
    }

    /// Where a refused visit to `screen` goes.
    pub fn redirect(&self, screen: Screen) -> Screen {
        self.session
            .with(|s| redirect_for(guard_of(screen), s.as_ref()))
            .unwrap_or(Screen::Root)
    }

    pub fn home(&self) -> Screen {
        self.session.with(|s| app::home(s.as_ref()))
    }
}

/// Context shared by every view.
#[derive(Debug, Clone)]
pub struct Ui {
    pub app: App,
    pub auth: Auth,
}

impl Ui {
    pub fn sync(&self) {
        self.auth.refresh(&self.app.sessions);
    }

    /// Clear the session; the route guards then send the user to `/login`.
    pub fn logout(&self) {
        if let Err(e) = self.app.logout() {
            warn!("Logout failed: {e}");
        }
        self.sync();
    }

    /// The backend refused the token: forget it.
    pub fn expire(&self) {
        if let Err(e) = self.app.sessions.clear_session() {
            warn!("Cannot clear expired session: {e}");
        }
        self.sync();
    }
}

// ── async glue ───────────────────────────────────────────────────────────

/// Run `action` on a copy of the page, then publish the copy.
pub(crate) fn act<P, F, Fut>(ui: &Ui, page: RwSignal<P>, action: F)
where
    P: Page,
    F: FnOnce(P, App) -> Fut + 'static,
    Fut: Future<Output = P> + 'static,
{
    let ui = ui.clone();
    let snapshot = page.get_untracked();
    spawn_local(async move {
        let next = action(snapshot, ui.app.clone()).await;
        let expired = next.notice().session_expired();
        page.set(next);
        if expired {
            ui.expire();
        }
    });
}

/// Second half of a cascade change: fetch for `key` and apply the result
/// under `ticket`. Nothing happens when the selection was cleared.
pub(crate) fn follow<P, K, T, Fut>(
    ui: &Ui,
    page: RwSignal<P>,
    step: Option<(Ticket, K)>,
    fetch: impl FnOnce(K) -> Fut + 'static,
    apply: fn(&mut P, Ticket, Result<T, ApiError>),
) where
    P: Page,
    K: 'static,
    T: 'static,
    Fut: Future<Output = Result<T, ApiError>> + 'static,
{
    let Some((ticket, key)) = step else {
        return;
    };
    let ui = ui.clone();
    spawn_local(async move {
        let result = fetch(key).await;
        page.update(|p| apply(p, ticket, result));
        if page.with_untracked(|p| p.notice().session_expired()) {
            ui.expire();
        }
    });
}

/// Load the page's first level once it is shown in the browser.
pub(crate) fn on_mount<P, F, Fut>(ui: &Ui, page: RwSignal<P>, action: F)
where
    P: Page,
    F: Fn(P, App) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = P> + 'static,
{
    let ui = ui.clone();
    Effect::new(move |_| act(&ui, page, action.clone()));
}

/// The page's notice as a signal.
pub(crate) fn notice_of<P: Page>(page: RwSignal<P>) -> Signal<crate::notice::Notice> {
    Signal::derive(move || page.with(|p| p.notice().clone()))
}

// ── root ─────────────────────────────────────────────────────────────────

/// Full HTML document rendered by the server.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <QpArchive/>
            </body>
        </html>
    }
}

/// The root component. Expects an [`App`] in context.
#[component]
pub fn QpArchive() -> impl IntoView {
    provide_meta_context();

    let ui = Ui {
        app: expect_context::<App>(),
        auth: Auth::new(),
    };
    provide_context(ui.clone());
    Effect::new({
        let ui = ui.clone();
        move |_| ui.sync()
    });
    let auth = ui.auth;

    view! {
        <Stylesheet id="leptos" href="/pkg/qparchive-web.css"/>
        <Title text="QP Archive"/>
        <Meta name="description" content="Previous year question papers"/>

        <Router>
            <Nav/>
            <main class="main-content">
                <Routes fallback=NotFound>
                    <Route path=path!("/") view=Home/>
                    <Route path=path!("/login") view=LoginView/>
                    <Route path=path!("/signup") view=SignupView/>
                    <ProtectedRoute
                        path=path!("/dashboard")
                        view=DashboardView
                        condition=move || auth.allows(Screen::Dashboard)
                        redirect_path=move || auth.redirect(Screen::Dashboard)
                    />
                    <ProtectedRoute
                        path=path!("/upload")
                        view=UploadView
                        condition=move || auth.allows(Screen::Upload)
                        redirect_path=move || auth.redirect(Screen::Upload)
                    />
                    <ProtectedRoute
                        path=path!("/admin/departments")
                        view=AdminDepartmentsView
                        condition=move || auth.allows(Screen::AdminDepartments)
                        redirect_path=move || auth.redirect(Screen::AdminDepartments)
                    />
                    <ProtectedRoute
                        path=path!("/admin/courses")
                        view=AdminCoursesView
                        condition=move || auth.allows(Screen::AdminCourses)
                        redirect_path=move || auth.redirect(Screen::AdminCourses)
                    />
                    <ProtectedRoute
                        path=path!("/admin/subjects")
                        view=AdminSubjectsView
                        condition=move || auth.allows(Screen::AdminSubjects)
                        redirect_path=move || auth.redirect(Screen::AdminSubjects)
                    />
                    <ProtectedRoute
                        path=path!("/admin/users")
                        view=AdminUsersView
                        condition=move || auth.allows(Screen::AdminUsers)
                        redirect_path=move || auth.redirect(Screen::AdminUsers)
                    />
                </Routes>
            </main>
        </Router>
    }
}

/// `/` goes to the dashboard or the login screen.
#[component]
fn Home() -> impl IntoView {
    let auth = expect_context::<Ui>().auth;
    move || auth.is_ready().then(|| view! { <Redirect path=auth.home()/> })
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <section class="page">
            <h1>"Page not found"</h1>
            <A href=Screen::Root.path()>"Back to the archive"</A>
        </section>
    }
}

// ─── tests ───────────────────────────────────────────────────────────────
