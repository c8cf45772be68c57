//! Header shown on every authenticated page.

use leptos::prelude::*;
use leptos_router::components::A;

use qparchive_common::protocol::Session;

use crate::app::Route;
use crate::views::Ui;

/// Header contents for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub greeting: String,
    pub links: Vec<(&'static str, Route)>,
}

/// Build the header; admin links appear only for admins.
pub fn header(session: &Session) -> Header {
    let mut links = vec![("Dashboard", Route::Dashboard), ("Upload", Route::Upload)];
    if session.user.is_admin() {
        links.extend([
            ("Departments", Route::AdminDepartments),
            ("Courses", Route::AdminCourses),
            ("Subjects", Route::AdminSubjects),
            ("Users", Route::AdminUsers),
        ]);
    }
    Header {
        greeting: format!("Welcome, {}", session.user.username),
        links,
    }
}

/// Site-wide navigation bar. Signed-out visitors only see the brand.
#[component]
pub fn Nav() -> impl IntoView {
    let ui = expect_context::<Ui>();
    let auth = ui.auth;

    view! {
        <nav class="nav-bar">
            <div class="nav-brand">
                <A href=Route::Root.path()>"QP Archive"</A>
            </div>
            {move || {
                let ui = ui.clone();
                auth.session().map(|session| {
                    let header = header(&session);
                    view! {
                        <div class="nav-links">
                            {header
                                .links
                                .into_iter()
                                .map(|(label, route)| {
                                    view! { <A href=route.path()>{label}</A> }
                                })
                                .collect_view()}
                        </div>
                        <span class="nav-greeting">{header.greeting}</span>
                        <button class="nav-logout" on:click=move |_| ui.logout()>
                            "Logout"
                        </button>
                    }
                })
            }}
        </nav>
    }
}

// ─── tests ───────────────────────────────────────────────────────────────
