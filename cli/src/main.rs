//! `qparchive` – terminal front end for the QP Archive.
//!
//! Every command opens the matching route first, so the same session and
//! admin guards apply as for any other front end.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::info;

use qparchive_common::config::{self, Config};
use qparchive_common::protocol::{Id, Role};
use qparchive_web::app::{App, Navigation, Route};
use qparchive_web::cascade::{parse_selection, Choice, Level};
use qparchive_web::components::nav;
use qparchive_web::notice::Notice;
use qparchive_web::pages::admin_courses::AdminCoursesPage;
use qparchive_web::pages::admin_departments::AdminDepartmentsPage;
use qparchive_web::pages::admin_subjects::AdminSubjectsPage;
use qparchive_web::pages::admin_users::AdminUsersPage;
use qparchive_web::pages::dashboard::DashboardPage;
use qparchive_web::pages::login::LoginPage;
use qparchive_web::pages::signup::SignupPage;
use qparchive_web::pages::upload::UploadPage;
use qparchive_web::session::SessionStore;

const USAGE: &str = "\
usage: qparchive [--config PATH] [--yes] COMMAND

  login USER PASSWORD
  signup USER EMAIL PASSWORD
  logout
  whoami
  open PATH
  browse [DEPT [COURSE [SEMESTER [SUBJECT]]]]
  download SUBJECT PAPER
  delete-paper SUBJECT PAPER
  upload DEPT COURSE SUBJECT SEMESTER YEAR SESSION FILE
  admin departments [add NAME CODE | delete ID]
  admin courses DEPT [add NAME CODE | delete ID]
  admin subjects DEPT COURSE [add NAME CODE SEMESTER | delete ID]
  admin users add USER EMAIL PASSWORD [STUDENT|ADMIN]";

/// Parsed command line.
struct Cli {
    config_path: Option<PathBuf>,
    assume_yes: bool,
    words: Vec<String>,
}

impl Cli {
    fn parse(args: impl Iterator<Item = String>) -> Result<Cli, String> {
        let mut cli = Cli {
            config_path: None,
            assume_yes: false,
            words: Vec::new(),
        };
        let mut args = args;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().ok_or("--config needs a path")?;
                    cli.config_path = Some(PathBuf::from(path));
                }
                "--yes" | "-y" => cli.assume_yes = true,
                "--help" | "-h" => return Err(String::new()),
                _ => cli.words.push(arg),
            }
        }
        Ok(cli)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = match Cli::parse(std::env::args().skip(1)) {
        Ok(cli) if !cli.words.is_empty() => cli,
        Ok(_) | Err(_) => {
            eprintln!("{USAGE}");
            return Ok(ExitCode::from(2));
        }
    };

    // ── load config ──────────────────────────────────────────────────
    let config = match cli
        .config_path
        .clone()
        .or_else(|| std::env::var_os("QPARCHIVE_CONFIG").map(PathBuf::from))
    {
        Some(path) => config::load(&path).context("Config load failed")?,
        None => config::load_or_default(&PathBuf::from(Config::default_path()))
            .context("Config load failed")?,
    };
    info!("Using backend {}", config.api_base_url);

    let sessions = SessionStore::file(&config.session_file);
    let app = App::new(config, sessions)?;
    let shell = Shell {
        app,
        assume_yes: cli.assume_yes,
    };

    let words: Vec<&str> = cli.words.iter().map(String::as_str).collect();
    Ok(shell.run(&words).await)
}

struct Shell {
    app: App,
    assume_yes: bool,
}

impl Shell {
    async fn run(&self, words: &[&str]) -> ExitCode {
        match words {
            ["login", user, password] => self.login(user, password).await,
            ["signup", user, email, password] => self.signup(user, email, password).await,
            ["logout"] => self.logout(),
            ["whoami"] => self.whoami(),
            ["open", path] => self.open(path),
            ["browse", rest @ ..] if rest.len() <= 4 => self.browse(rest).await,
            ["download", subject, paper] => match (id(subject), id(paper)) {
                (Some(s), Some(p)) => self.download(s, p).await,
                _ => usage(),
            },
            ["delete-paper", subject, paper] => match (id(subject), id(paper)) {
                (Some(s), Some(p)) => self.delete_paper(s, p).await,
                _ => usage(),
            },
            ["upload", dept, course, subject, semester, year, session, file] => {
                self.upload([*dept, *course, *subject, *semester, *year], session, file)
                    .await
            }
            ["admin", "departments", rest @ ..] => self.admin_departments(rest).await,
            ["admin", "courses", dept, rest @ ..] => match id(dept) {
                Some(d) => self.admin_courses(d, rest).await,
                None => usage(),
            },
            ["admin", "subjects", dept, course, rest @ ..] => match (id(dept), id(course)) {
                (Some(d), Some(c)) => self.admin_subjects(d, c, rest).await,
                _ => usage(),
            },
            ["admin", "users", "add", user, email, password, role @ ..] if role.len() <= 1 => {
                self.admin_users(user, email, password, role.first().copied())
                    .await
            }
            _ => usage(),
        }
    }

    // ── navigation ───────────────────────────────────────────────────────

    /// Open `route` through its guard; `false` when redirected elsewhere.
    fn enter(&self, route: Route) -> bool {
        match self.app.open(route.path()) {
            Navigation::Render(r) if r == route => true,
            Navigation::Render(r) | Navigation::Redirect(r) => {
                eprintln!("{route} is not available; redirected to {r}");
                if r == Route::Login {
                    eprintln!("Run `qparchive login USER PASSWORD` first.");
                }
                false
            }
            Navigation::NotFound => {
                eprintln!("No page at {route}");
                false
            }
        }
    }

    /// Print the notice and turn it into an exit code.
    fn report(&self, notice: &Notice) -> ExitCode {
        if let Some(message) = notice.success() {
            println!("{message}");
        }
        if let Some(message) = notice.error() {
            eprintln!("error: {message}");
            if notice.session_expired() {
                self.app.sessions.clear_session().ok();
                eprintln!("Your session has expired. Please log in again.");
            }
            return ExitCode::from(1);
        }
        ExitCode::SUCCESS
    }

    fn confirm(&self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{question} [y/N] ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    // ── auth ─────────────────────────────────────────────────────────────

    async fn login(&self, user: &str, password: &str) -> ExitCode {
        if !self.enter(Route::Login) {
            return ExitCode::from(1);
        }
        let mut page = LoginPage::new(user, password);
        match page.submit(&self.app).await {
            Some(next) => {
                if let Some(session) = self.app.sessions.get_session() {
                    println!("{}", nav::header(&session).greeting);
                }
                println!("→ {next}");
                ExitCode::SUCCESS
            }
            None => self.report(&page.notice),
        }
    }

    async fn signup(&self, user: &str, email: &str, password: &str) -> ExitCode {
        if !self.enter(Route::Signup) {
            return ExitCode::from(1);
        }
        let mut page = SignupPage {
            username: user.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            ..SignupPage::default()
        };
        page.submit(&self.app).await;
        self.report(&page.notice)
    }

    fn logout(&self) -> ExitCode {
        match self.app.logout() {
            Ok(next) => {
                println!("Logged out → {next}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(1)
            }
        }
    }

    fn whoami(&self) -> ExitCode {
        match self.app.sessions.get_session() {
            Some(session) => {
                let header = nav::header(&session);
                println!("{} ({})", header.greeting, session.user.role);
                for (label, route) in header.links {
                    println!("  {label:<12} {route}");
                }
                ExitCode::SUCCESS
            }
            None => {
                println!("Not logged in.");
                ExitCode::from(1)
            }
        }
    }

    fn open(&self, path: &str) -> ExitCode {
        match self.app.open(path) {
            Navigation::Render(route) => {
                println!("{route}");
                ExitCode::SUCCESS
            }
            Navigation::Redirect(route) => {
                println!("redirect {route}");
                ExitCode::SUCCESS
            }
            Navigation::NotFound => {
                eprintln!("No page at {path}");
                ExitCode::from(1)
            }
        }
    }

    // ── dashboard ────────────────────────────────────────────────────────

    async fn browse(&self, selection: &[&str]) -> ExitCode {
        if !self.enter(Route::Dashboard) {
            return ExitCode::from(1);
        }
        let api = &self.app.api;
        let mut page = DashboardPage::new();
        page.mount(api).await;

        let Some(dept) = selection.first() else {
            print_level("Departments", &page.departments);
            return self.report(&page.notice);
        };
        page.change_department(api, parse_selection(dept)).await;

        let Some(course) = selection.get(1).filter(|_| !page.notice.is_error()) else {
            print_level("Courses", &page.courses);
            return self.report(&page.notice);
        };
        page.select_course(parse_selection(course));

        let Some(semester) = selection.get(2) else {
            print_level("Semesters", &page.semesters);
            return self.report(&page.notice);
        };
        page.change_semester(api, parse_selection(semester)).await;

        let Some(subject) = selection.get(3).filter(|_| !page.notice.is_error()) else {
            print_level("Subjects", &page.subjects);
            return self.report(&page.notice);
        };
        page.change_subject(api, parse_selection(subject)).await;
        self.print_papers(&page);
        self.report(&page.notice)
    }

    fn print_papers(&self, page: &DashboardPage) {
        let now = chrono::Utc::now();
        let deletable = self
            .app
            .sessions
            .get_session()
            .map(|s| page.deletable(&s.user, now))
            .unwrap_or_default();

        if page.papers.options().is_empty() {
            println!("No papers for this selection.");
            return;
        }
        println!("Papers:");
        for paper in page.papers.options() {
            let marker = if deletable.contains(&paper.id) { " [deletable]" } else { "" };
            println!(
                "  {:>5}  {}  ({} {}, by {}){marker}",
                paper.id, paper.original_name, paper.session, paper.year, paper.uploaded_by.username
            );
        }
    }

    async fn download(&self, subject: Id, paper: Id) -> ExitCode {
        if !self.enter(Route::Dashboard) {
            return ExitCode::from(1);
        }
        let api = &self.app.api;
        let mut page = DashboardPage::new();
        page.change_subject(api, Some(subject)).await;
        if page.notice.is_error() {
            return self.report(&page.notice);
        }
        if let Some(path) = page
            .download(api, paper, &self.app.config.download_dir)
            .await
        {
            println!("Saved {}", path.display());
        }
        self.report(&page.notice)
    }

    async fn delete_paper(&self, subject: Id, paper: Id) -> ExitCode {
        if !self.enter(Route::Dashboard) {
            return ExitCode::from(1);
        }
        let api = &self.app.api;
        let mut page = DashboardPage::new();
        page.change_subject(api, Some(subject)).await;
        if page.notice.is_error() {
            return self.report(&page.notice);
        }
        if !self.confirm("Are you sure you want to delete this paper?") {
            return ExitCode::SUCCESS;
        }
        page.delete_paper(api, paper, chrono::Utc::now()).await;
        self.print_papers(&page);
        self.report(&page.notice)
    }

    // ── upload ───────────────────────────────────────────────────────────

    async fn upload(&self, ids: [&str; 5], session: &str, file: &str) -> ExitCode {
        if !self.enter(Route::Upload) {
            return ExitCode::from(1);
        }
        let [dept, course, subject, semester, year] = ids;
        let api = &self.app.api;
        let mut page = UploadPage::new();
        page.mount(api).await;
        page.change_department(api, parse_selection(dept)).await;
        page.change_course(api, parse_selection(course)).await;
        if page.notice.is_error() {
            return self.report(&page.notice);
        }

        let subject = parse_selection::<Id>(subject);
        if subject.is_some_and(|s| page.subjects.find(s).is_none()) {
            eprintln!("error: subject is not part of the selected course");
            print_level("Subjects", &page.subjects);
            return ExitCode::from(1);
        }
        page.select_subject(subject);
        page.form.semester = parse_selection(semester);
        page.form.year = parse_selection(year);
        page.form.session = session.to_string();
        if !file.is_empty() && !page.attach(std::path::Path::new(file)) {
            return self.report(&page.notice);
        }

        page.submit(api).await;
        self.report(&page.notice)
    }

    // ── admin ────────────────────────────────────────────────────────────

    async fn admin_departments(&self, rest: &[&str]) -> ExitCode {
        if !self.enter(Route::AdminDepartments) {
            return ExitCode::from(1);
        }
        let api = &self.app.api;
        let mut page = AdminDepartmentsPage::new();
        page.mount(api).await;
        match rest {
            [] => {}
            ["add", name, code] => {
                page.new_name = name.to_string();
                page.new_code = code.to_string();
                page.add(api).await;
            }
            ["delete", dept] => {
                let Some(dept) = id(dept) else { return usage() };
                if !self.confirm(
                    "Are you sure you want to delete this department? \
                     This might affect associated courses and subjects.",
                ) {
                    return ExitCode::SUCCESS;
                }
                page.delete(api, dept).await;
            }
            _ => return usage(),
        }
        print_level("Departments", &page.departments);
        self.report(&page.notice)
    }

    async fn admin_courses(&self, dept: Id, rest: &[&str]) -> ExitCode {
        if !self.enter(Route::AdminCourses) {
            return ExitCode::from(1);
        }
        let api = &self.app.api;
        let mut page = AdminCoursesPage::new();
        page.mount(api).await;
        page.change_department(api, Some(dept)).await;
        match rest {
            [] => {}
            ["add", name, code] => {
                page.new_name = name.to_string();
                page.new_code = code.to_string();
                page.add(api).await;
            }
            ["delete", course] => {
                let Some(course) = id(course) else { return usage() };
                if !self.confirm(
                    "Are you sure you want to delete this course? \
                     This will also delete all associated subjects.",
                ) {
                    return ExitCode::SUCCESS;
                }
                page.delete(api, course).await;
            }
            _ => return usage(),
        }
        print_level("Courses", &page.courses);
        self.report(&page.notice)
    }

    async fn admin_subjects(&self, dept: Id, course: Id, rest: &[&str]) -> ExitCode {
        if !self.enter(Route::AdminSubjects) {
            return ExitCode::from(1);
        }
        let api = &self.app.api;
        let mut page = AdminSubjectsPage::new();
        page.mount(api).await;
        page.change_department(api, Some(dept)).await;
        page.change_course(api, Some(course)).await;
        match rest {
            [] => {}
            ["add", name, code, semester] => {
                page.draft.name = name.to_string();
                page.draft.code = code.to_string();
                page.draft.semester = parse_selection(semester);
                page.add(api).await;
            }
            ["delete", subject] => {
                let Some(subject) = id(subject) else { return usage() };
                if !self.confirm(
                    "Are you sure you want to delete this subject? \
                     This might affect associated papers.",
                ) {
                    return ExitCode::SUCCESS;
                }
                page.delete(api, subject).await;
            }
            _ => return usage(),
        }
        print_level("Subjects", &page.subjects);
        self.report(&page.notice)
    }

    async fn admin_users(&self, user: &str, email: &str, password: &str, role: Option<&str>) -> ExitCode {
        if !self.enter(Route::AdminUsers) {
            return ExitCode::from(1);
        }
        let role = match role.map(str::parse::<Role>).transpose() {
            Ok(role) => role.unwrap_or_default(),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(2);
            }
        };
        let mut page = AdminUsersPage {
            username: user.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
            ..AdminUsersPage::default()
        };
        page.submit(&self.app.api).await;
        self.report(&page.notice)
    }
}

// ── helpers ──────────────────────────────────────────────────────────────

fn id(raw: &str) -> Option<Id> {
    parse_selection(raw)
}

fn usage() -> ExitCode {
    eprintln!("{USAGE}");
    ExitCode::from(2)
}

fn print_level<T: Choice>(title: &str, level: &Level<T>) {
    if level.options().is_empty() {
        println!("{title}: none");
        return;
    }
    println!("{title}:");
    for option in level.options() {
        println!("  {:>5}  {}", option.key(), option.label());
    }
}
