//! Route table, navigation guards and the application shell.

use tracing::{debug, info};

use qparchive_common::config::Config;
use qparchive_common::protocol::Session;

use crate::api::ApiClient;
use crate::session::{SessionStore, StoreError};

/// Every screen of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Signup,
    Dashboard,
    Upload,
    AdminDepartments,
    AdminCourses,
    AdminSubjects,
    AdminUsers,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Dashboard => "/dashboard",
            Self::Upload => "/upload",
            Self::AdminDepartments => "/admin/departments",
            Self::AdminCourses => "/admin/courses",
            Self::AdminSubjects => "/admin/subjects",
            Self::AdminUsers => "/admin/users",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Precondition a route imposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Public,
    RequireSession,
    RequireAdmin,
}

/// Each path is registered exactly once.
pub const ROUTES: [(Route, Guard); 9] = [
    (Route::Root, Guard::Public),
    (Route::Login, Guard::Public),
    (Route::Signup, Guard::Public),
    (Route::Dashboard, Guard::RequireSession),
    (Route::Upload, Guard::RequireSession),
    (Route::AdminDepartments, Guard::RequireAdmin),
    (Route::AdminCourses, Guard::RequireAdmin),
    (Route::AdminSubjects, Guard::RequireAdmin),
    (Route::AdminUsers, Guard::RequireAdmin),
];

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
    NotFound,
}

/// Where `guard` sends the holder of `session`, `None` to render.
///
/// A missing session fails `RequireAdmin` towards the dashboard, whose own
/// guard then sends the user on to the login screen.
pub fn redirect_for(guard: Guard, session: Option<&Session>) -> Option<Route> {
    match (guard, session) {
        (Guard::Public, _) => None,
        (Guard::RequireSession, Some(_)) => None,
        (Guard::RequireSession, None) => Some(Route::Login),
        (Guard::RequireAdmin, Some(session)) if session.user.is_admin() => None,
        (Guard::RequireAdmin, _) => Some(Route::Dashboard),
    }
}

/// Target of `/`.
pub fn home(session: Option<&Session>) -> Route {
    match session {
        Some(_) => Route::Dashboard,
        None => Route::Login,
    }
}

/// Guard registered for `route`.
pub fn guard_of(route: Route) -> Guard {
    ROUTES
        .iter()
        .find(|(r, _)| *r == route)
        .map_or(Guard::Public, |(_, guard)| *guard)
}

/// Redirect target when there is no session, `None` to render.
pub fn require_session(sessions: &SessionStore) -> Option<Route> {
    redirect_for(Guard::RequireSession, sessions.get_session().as_ref())
}

/// Redirect target unless the session belongs to an admin.
pub fn require_admin(sessions: &SessionStore) -> Option<Route> {
    redirect_for(Guard::RequireAdmin, sessions.get_session().as_ref())
}

fn lookup(path: &str) -> Option<(Route, Guard)> {
    let path = match path.trim() {
        "" | "/" => "/",
        p => p.trim_end_matches('/'),
    };
    ROUTES.iter().copied().find(|(route, _)| route.path() == path)
}

/// Resolve `path` against the route table, re-deriving the session each time.
pub fn resolve(path: &str, sessions: &SessionStore) -> Navigation {
    let Some((route, guard)) = lookup(path) else {
        debug!("No route for {path}");
        return Navigation::NotFound;
    };

    let session = sessions.get_session();
    if route == Route::Root {
        return Navigation::Redirect(home(session.as_ref()));
    }

    match redirect_for(guard, session.as_ref()) {
        Some(target) => {
            debug!("Guard on {route} redirected to {target}");
            Navigation::Redirect(target)
        }
        None => Navigation::Render(route),
    }
}

/// Session + API client shared by every page.
#[derive(Debug, Clone)]
pub struct App {
    pub config: Config,
    pub sessions: SessionStore,
    pub api: ApiClient,
}

impl App {
    pub fn new(config: Config, sessions: SessionStore) -> anyhow::Result<Self> {
        let api = ApiClient::from_config(&config, sessions.clone())?;
        Ok(Self {
            config,
            sessions,
            api,
        })
    }

    pub fn navigate(&self, path: &str) -> Navigation {
        resolve(path, &self.sessions)
    }

    /// Follow redirects until a page renders (or nothing matches).
    pub fn open(&self, path: &str) -> Navigation {
        let mut nav = self.navigate(path);
        for _ in 0..ROUTES.len() {
            match nav {
                Navigation::Redirect(target) => nav = self.navigate(target.path()),
                _ => break,
            }
        }
        nav
    }

    /// Clear the session and send the user to the login screen.
    pub fn logout(&self) -> Result<Route, StoreError> {
        self.sessions.clear_session()?;
        info!("Logged out");
        Ok(Route::Login)
    }
}

// ─── tests ───────────────────────────────────────────────────────────────
