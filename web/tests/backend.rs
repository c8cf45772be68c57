//! End-to-end flows against an in-process stub of the archive backend.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use qparchive_common::config::Config;
use qparchive_common::error::{Endpoint, ErrorKind};
use qparchive_common::protocol::Role;
use qparchive_web::app::{App, Navigation, Route};
use qparchive_web::pages::admin_courses::AdminCoursesPage;
use qparchive_web::pages::admin_departments::AdminDepartmentsPage;
use qparchive_web::pages::admin_users::AdminUsersPage;
use qparchive_web::pages::dashboard::DashboardPage;
use qparchive_web::pages::login::LoginPage;
use qparchive_web::pages::signup::{SignupPage, REGISTERED_MESSAGE};
use qparchive_web::pages::upload::UploadPage;
use qparchive_web::session::SessionStore;

// ── stub backend ─────────────────────────────────────────────────────────

struct Stub {
    departments: Vec<Value>,
    /// Courses keyed by department; a department with no entry answers 500.
    courses: HashMap<i64, Vec<Value>>,
    next_id: i64,
    papers: Vec<Value>,
    /// Authorization header seen per request path.
    auth: Vec<(String, Option<String>)>,
    /// Multipart fields of each upload; files are stored as "name;type".
    uploads: Vec<HashMap<String, String>>,
}

impl Default for Stub {
    fn default() -> Self {
        Self {
            departments: vec![
                json!({"id": 1, "name": "Computer Science", "code": "CS"}),
                json!({"id": 2, "name": "Mechanical", "code": "ME"}),
            ],
            courses: HashMap::from([(1, vec![json!({"id": 10, "name": "B.Tech", "code": "BT"})])]),
            next_id: 50,
            papers: Vec::new(),
            auth: Vec::new(),
            uploads: Vec::new(),
        }
    }
}

impl Stub {
    fn issue_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

type Shared = Arc<Mutex<Stub>>;

fn record(stub: &Shared, path: &str, headers: &HeaderMap) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    stub.lock().unwrap().auth.push((path.to_string(), auth));
}

fn router(stub: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/departments", get(departments).post(add_department))
        .route("/departments/{id}", delete(delete_department))
        .route("/courses/department/{id}", get(courses).post(add_course))
        .route("/courses/{id}", delete(delete_course))
        .route("/subjects/course/{id}/semester/{sem}", get(subjects_for_semester))
        .route("/subjects/course/{id}", get(subjects))
        .route("/papers/subject/{id}", get(papers))
        .route("/papers/{id}", delete(delete_paper))
        .route("/papers/download/{id}", get(download))
        .route("/papers/upload", post(upload))
        .route("/api/admin/users", post(create_user))
        .with_state(stub)
}

async fn login(State(stub): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&stub, "/auth/login", &headers);
    let user = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (user, password) {
        ("asha", "secret") => Json(json!({"token": "tok-asha", "username": "asha", "role": "STUDENT"}))
            .into_response(),
        ("root", "secret") => Json(json!({"token": "tok-root", "username": "root", "role": "ADMIN"}))
            .into_response(),
        ("late", "secret") => Json(json!({"token": "tok-expired", "username": "late", "role": "STUDENT"}))
            .into_response(),
        ("ghost", _) => (StatusCode::UNAUTHORIZED, Json(json!({"status": 401}))).into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid credentials"}))).into_response(),
    }
}

async fn signup(Json(body): Json<Value>) -> Response {
    if body["username"] == "taken" {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Username is already taken"})))
            .into_response();
    }
    (StatusCode::OK, "User registered").into_response()
}

async fn departments(State(stub): State<Shared>, headers: HeaderMap) -> Response {
    record(&stub, "/departments", &headers);
    let expired = headers
        .get("authorization")
        .is_some_and(|v| v.as_bytes() == b"Bearer tok-expired");
    if expired {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token expired"}))).into_response();
    }
    Json(Value::Array(stub.lock().unwrap().departments.clone())).into_response()
}

async fn add_department(State(stub): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut stub = stub.lock().unwrap();
    if stub.departments.iter().any(|d| d["name"] == body["name"]) {
        return (StatusCode::CONFLICT, Json(json!({"error": "Department already exists"})))
            .into_response();
    }
    let id = stub.issue_id();
    let dept = json!({"id": id, "name": body["name"], "code": body["code"]});
    stub.departments.push(dept.clone());
    stub.courses.insert(id, Vec::new());
    (StatusCode::CREATED, Json(dept)).into_response()
}

async fn delete_department(State(stub): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    let mut stub = stub.lock().unwrap();
    stub.departments.retain(|d| d["id"].as_i64() != Some(id));
    stub.courses.remove(&id);
    StatusCode::OK
}

async fn courses(State(stub): State<Shared>, Path(id): Path<i64>) -> Response {
    match stub.lock().unwrap().courses.get(&id) {
        Some(courses) => Json(Value::Array(courses.clone())).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "<html><body>boom</body></html>").into_response(),
    }
}

async fn add_course(
    State(stub): State<Shared>,
    Path(dept): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut stub = stub.lock().unwrap();
    let id = stub.issue_id();
    let course = json!({"id": id, "name": body["name"], "code": body["code"]});
    match stub.courses.get_mut(&dept) {
        Some(courses) => {
            courses.push(course.clone());
            (StatusCode::CREATED, Json(course)).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "Department not found"}))).into_response(),
    }
}

async fn delete_course(State(stub): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    for courses in stub.lock().unwrap().courses.values_mut() {
        courses.retain(|c| c["id"].as_i64() != Some(id));
    }
    StatusCode::OK
}

async fn subjects_for_semester(Path((_course, sem)): Path<(i64, u8)>) -> Json<Value> {
    Json(json!([{"id": 100, "name": "DBMS", "code": "CS301", "semester": sem}]))
}

async fn subjects(Path(_course): Path<i64>) -> Json<Value> {
    Json(json!([
        {"id": 100, "name": "DBMS", "code": "CS301", "semester": 3},
        {"id": 101, "name": "Networks", "code": "CS302", "semester": 4}
    ]))
}

async fn papers(State(stub): State<Shared>, Path(_subject): Path<i64>) -> Json<Value> {
    Json(Value::Array(stub.lock().unwrap().papers.clone()))
}

async fn delete_paper(State(stub): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    stub.lock().unwrap().papers.retain(|p| p["id"].as_i64() != Some(id));
    StatusCode::OK
}

async fn download(Path(id): Path<i64>) -> Response {
    match id {
        7 => b"%PDF-1.4 stub".to_vec().into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn upload(State(stub): State<Shared>, mut multipart: Multipart) -> Response {
    let mut fields = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file = field.file_name().map(str::to_string);
        let value = match file {
            Some(file) => format!("{file};{}", field.content_type().unwrap_or_default()),
            None => field.text().await.unwrap_or_default(),
        };
        fields.insert(name, value);
    }
    stub.lock().unwrap().uploads.push(fields);
    (StatusCode::CREATED, "stored").into_response()
}

async fn create_user(Json(body): Json<Value>) -> Response {
    if body["username"] == "taken" {
        return (StatusCode::CONFLICT, "Username already exists").into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({"username": body["username"], "role": body["role"]})),
    )
        .into_response()
}

// ── harness ──────────────────────────────────────────────────────────────

async fn spawn_backend(stub: Shared) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(stub)).await.unwrap();
    });
    format!("http://{addr}")
}

fn scratch_dir(name: &str) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("qparchive_it_{name}_{}_{n}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

async fn start(stub: Stub) -> (App, Shared) {
    let stub = Arc::new(Mutex::new(stub));
    let base = spawn_backend(stub.clone()).await;
    let config = Config {
        api_base_url: base,
        download_dir: scratch_dir("downloads"),
        ..Config::default()
    };
    let app = App::new(config, SessionStore::in_memory()).unwrap();
    (app, stub)
}

async fn logged_in(stub: Stub, user: &str) -> (App, Shared) {
    let (app, stub) = start(stub).await;
    let mut page = LoginPage::new(user, "secret");
    assert_eq!(page.submit(&app).await, Some(Route::Dashboard));
    (app, stub)
}

fn paper(id: i64, name: &str, by: &str, age_minutes: i64) -> Value {
    json!({
        "id": id,
        "originalName": name,
        "year": 2023,
        "session": "May",
        "uploadedAt": (Utc::now() - Duration::minutes(age_minutes)).to_rfc3339(),
        "uploadedBy": {"username": by}
    })
}

// ── auth ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_session() {
    let (app, stub) = start(Stub::default()).await;
    let mut page = LoginPage::new("asha", "secret");
    assert_eq!(page.submit(&app).await, Some(Route::Dashboard));

    let session = app.sessions.get_session().unwrap();
    assert_eq!(session.token, "tok-asha");
    assert_eq!(session.user.username, "asha");
    assert_eq!(session.user.role, Role::Student);

    // Login itself goes out without a bearer token.
    let auth = stub.lock().unwrap().auth.clone();
    assert_eq!(auth, vec![("/auth/login".to_string(), None)]);
}

#[tokio::test]
async fn test_invalid_login_shows_server_message() {
    let (app, _stub) = start(Stub::default()).await;
    let mut page = LoginPage::new("asha", "wrong");
    assert_eq!(page.submit(&app).await, None);
    assert_eq!(page.notice.error(), Some("Invalid credentials"));
    assert!(app.sessions.get_session().is_none());
}

#[tokio::test]
async fn test_unlabelled_login_rejection() {
    let (app, _stub) = start(Stub::default()).await;
    let mut page = LoginPage::new("ghost", "whatever");
    assert_eq!(page.submit(&app).await, None);
    assert_eq!(page.notice.error(), Some("Invalid username or password"));
    assert!(!page.notice.session_expired());
}

#[tokio::test]
async fn test_signup_shows_verification_message() {
    let (app, _stub) = start(Stub::default()).await;
    let mut page = SignupPage {
        username: "neha".into(),
        email: "neha@uni.edu".into(),
        password: "pw".into(),
        ..SignupPage::default()
    };
    assert!(page.submit(&app).await);
    assert!(page.registered);
    assert_eq!(page.notice.success(), Some(REGISTERED_MESSAGE));
    // Registration does not sign the user in.
    assert!(app.sessions.get_session().is_none());

    let mut page = SignupPage {
        username: "taken".into(),
        email: "t@uni.edu".into(),
        password: "pw".into(),
        ..SignupPage::default()
    };
    assert!(!page.submit(&app).await);
    assert!(!page.registered);
    assert_eq!(page.notice.error(), Some("Username is already taken"));
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let (app, stub) = logged_in(Stub::default(), "asha").await;
    let mut page = DashboardPage::new();
    page.mount(&app.api).await;
    assert_eq!(page.departments.options().len(), 2);

    let auth = stub.lock().unwrap().auth.clone();
    assert_eq!(
        auth.last(),
        Some(&("/departments".to_string(), Some("Bearer tok-asha".to_string())))
    );
}

#[tokio::test]
async fn test_expired_token_flags_session() {
    let (app, _stub) = logged_in(Stub::default(), "late").await;
    let mut page = DashboardPage::new();
    page.mount(&app.api).await;
    assert_eq!(page.notice.error(), Some("Could not load departments."));
    assert!(page.notice.session_expired());
}

#[tokio::test]
async fn test_logout_then_guard_redirects() {
    let (app, _stub) = logged_in(Stub::default(), "asha").await;
    assert_eq!(app.open("/upload"), Navigation::Render(Route::Upload));
    assert_eq!(app.open("/admin/users"), Navigation::Render(Route::Dashboard));

    assert_eq!(app.logout().unwrap(), Route::Login);
    assert!(app.sessions.get_session().is_none());
    assert_eq!(app.open("/dashboard"), Navigation::Render(Route::Login));
    assert_eq!(app.open("/"), Navigation::Render(Route::Login));
}

// ── dashboard ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_course_fetch_failure_message() {
    let (app, _stub) = logged_in(Stub::default(), "asha").await;
    let mut page = DashboardPage::new();
    page.mount(&app.api).await;

    page.change_department(&app.api, Some(2)).await;
    assert_eq!(page.notice.error(), Some("Could not fetch courses."));
    assert!(page.courses.options().is_empty());
    assert!(!page.notice.session_expired());

    // An HTML error body falls back to the endpoint's own message.
    let err = app.api.courses(2).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unknown);
    assert_eq!(err.message, Endpoint::ListCourses.fallback_message());
}

#[tokio::test]
async fn test_full_cascade_lists_papers() {
    let stub = Stub {
        papers: vec![paper(7, "DBMS-2023.pdf", "asha", 5)],
        ..Stub::default()
    };
    let (app, _stub) = logged_in(stub, "asha").await;
    let mut page = DashboardPage::new();
    page.mount(&app.api).await;
    page.change_department(&app.api, Some(1)).await;
    page.select_course(Some(10));
    assert_eq!(page.semesters.options().len(), 8);
    page.change_semester(&app.api, Some(3)).await;
    assert_eq!(page.subjects.options()[0].semester, 3);
    page.change_subject(&app.api, Some(100)).await;

    assert!(!page.notice.is_error());
    assert_eq!(page.papers.options().len(), 1);
    assert_eq!(page.papers.options()[0].original_name, "DBMS-2023.pdf");
}

#[tokio::test]
async fn test_delete_refetches_without_paper() {
    let stub = Stub {
        papers: vec![
            paper(7, "DBMS-2023.pdf", "asha", 5),
            paper(8, "DBMS-2022.pdf", "ravi", 5),
        ],
        ..Stub::default()
    };
    let (app, _stub) = logged_in(stub, "asha").await;
    let mut page = DashboardPage::new();
    page.change_subject(&app.api, Some(100)).await;

    let user = app.sessions.get_session().unwrap().user;
    assert_eq!(page.deletable(&user, Utc::now()), vec![7]);

    assert!(!page.delete_paper(&app.api, 8, Utc::now()).await);
    assert_eq!(page.notice.error(), Some("You can no longer delete this paper."));

    assert!(page.delete_paper(&app.api, 7, Utc::now()).await);
    assert_eq!(page.notice.success(), Some("Paper deleted successfully!"));
    let ids: Vec<i64> = page.papers.options().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![8]);
}

#[tokio::test]
async fn test_download_keeps_original_name() {
    let stub = Stub {
        papers: vec![paper(7, "DBMS-2023.pdf", "ravi", 600)],
        ..Stub::default()
    };
    let (app, _stub) = logged_in(stub, "asha").await;
    let mut page = DashboardPage::new();
    page.change_subject(&app.api, Some(100)).await;

    let path = page
        .download(&app.api, 7, &app.config.download_dir)
        .await
        .unwrap();
    assert_eq!(path.file_name().unwrap(), "DBMS-2023.pdf");
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 stub");
}

// ── upload ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_sends_multipart() {
    let (app, stub) = logged_in(Stub::default(), "asha").await;
    let dir = scratch_dir("upload");
    let file = dir.join("OS-2024.pdf");
    std::fs::write(&file, b"%PDF-1.7").unwrap();

    let mut page = UploadPage::new();
    page.mount(&app.api).await;
    page.change_department(&app.api, Some(1)).await;
    page.change_course(&app.api, Some(10)).await;
    page.select_subject(Some(101));
    page.form.semester = Some(4);
    page.form.year = Some(2024);
    page.form.session = "December".into();
    assert!(page.attach(&file));

    assert!(page.submit(&app.api).await);
    assert_eq!(
        page.notice.success(),
        Some("Paper \"OS-2024.pdf\" uploaded successfully!")
    );
    assert_eq!(page.form.subject_id, None);
    assert_eq!(page.form.year, Some(2024));

    let uploads = stub.lock().unwrap().uploads.clone();
    assert_eq!(uploads.len(), 1);
    let fields = &uploads[0];
    assert_eq!(fields["semester"], "4");
    assert_eq!(fields["year"], "2024");
    assert_eq!(fields["session"], "December");
    assert_eq!(fields["subjectId"], "101");
    assert_eq!(fields["file"], "OS-2024.pdf;application/pdf");
}

// ── admin ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_admin_create_user() {
    let (app, _stub) = logged_in(Stub::default(), "root").await;
    assert_eq!(app.open("/admin/users"), Navigation::Render(Route::AdminUsers));

    let mut page = AdminUsersPage {
        username: "meera".into(),
        email: "meera@uni.edu".into(),
        password: "pw".into(),
        role: Role::Admin,
        ..AdminUsersPage::default()
    };
    assert!(page.submit(&app.api).await);
    assert_eq!(
        page.notice.success(),
        Some("Successfully created user: meera with role ADMIN")
    );
    assert!(page.username.is_empty());
    assert_eq!(page.role, Role::Student);

    page.username = "taken".into();
    page.email = "t@uni.edu".into();
    page.password = "pw".into();
    assert!(!page.submit(&app.api).await);
    assert_eq!(page.notice.error(), Some("Username already exists"));
}

#[tokio::test]
async fn test_admin_add_then_delete_department() {
    let (app, _stub) = logged_in(Stub::default(), "root").await;
    let mut page = AdminDepartmentsPage::new();
    page.mount(&app.api).await;
    assert_eq!(page.departments.options().len(), 2);

    page.new_name = "Electrical".into();
    page.new_code = "EE".into();
    assert!(page.add(&app.api).await);
    assert_eq!(
        page.notice.success(),
        Some("Successfully added department: Electrical")
    );
    assert!(page.new_name.is_empty());
    assert_eq!(page.departments.options().len(), 3);
    let added = page.departments.options()[2].id;

    page.new_name = "Electrical".into();
    page.new_code = "EE".into();
    assert!(!page.add(&app.api).await);
    assert_eq!(page.notice.error(), Some("Department already exists"));

    assert!(page.delete(&app.api, added).await);
    assert_eq!(page.notice.success(), Some("Department deleted successfully."));
    let names: Vec<&str> = page.departments.options().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Computer Science", "Mechanical"]);
}

#[tokio::test]
async fn test_admin_course_needs_department() {
    let (app, _stub) = logged_in(Stub::default(), "root").await;
    let mut page = AdminCoursesPage::new();
    page.mount(&app.api).await;
    page.new_name = "M.Tech".into();
    page.new_code = "MT".into();

    assert!(!page.add(&app.api).await);
    assert_eq!(page.notice.error(), Some("Please select a department first."));
    assert_eq!(page.new_name, "M.Tech");
}

#[tokio::test]
async fn test_admin_add_then_delete_course() {
    let (app, _stub) = logged_in(Stub::default(), "root").await;
    let mut page = AdminCoursesPage::new();
    page.mount(&app.api).await;
    page.change_department(&app.api, Some(1)).await;
    assert_eq!(page.courses.options().len(), 1);

    page.new_name = "M.Tech".into();
    page.new_code = "MT".into();
    assert!(page.add(&app.api).await);
    assert_eq!(page.notice.success(), Some("Successfully added course: M.Tech"));
    let names: Vec<&str> = page.courses.options().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["B.Tech", "M.Tech"]);

    assert!(page.delete(&app.api, 10).await);
    assert_eq!(page.notice.success(), Some("Course deleted successfully."));
    let names: Vec<&str> = page.courses.options().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["M.Tech"]);
}
