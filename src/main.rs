// Define data modules
mod auth; // Shared-secret gate for mutating requests
mod avatar; // Avatar upload validation and storage
mod config; // TOML configuration
mod error; // AppError and its HTTP mapping
mod logic; // Account list parsing and completion rules
mod models; // Data structures (Task, Document, Profile, etc.)
mod profile_registry; // Profile CRUD on the store
mod routes_profiles; // HTTP handlers for profiles
mod routes_settings; // HTTP handlers for settings documents
mod routes_tasks; // HTTP handlers for task APIs
mod store; // SQLite store and document settings
mod task_registry; // Task CRUD on the store

use std::sync::Arc;

// Import axum routing utilities and Router
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::avatar::AvatarStore;
use crate::config::Config;
use crate::store::Store;

// Shared by every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub avatars: AvatarStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn open(config: Config) -> error::AppResult<Self> {
        let store = Store::open(&config.db_path)?;
        let avatars = AvatarStore::new(&config.upload_dir)?;
        Ok(Self {
            store: Arc::new(store),
            avatars,
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // tasks
        .route("/tasks", get(routes_tasks::get_tasks).post(routes_tasks::create_task))
        .route(
            "/tasks/:id",
            get(routes_tasks::get_task)
                .put(routes_tasks::edit_task)
                .delete(routes_tasks::delete_task),
        )
        .route("/tasks/:id/toggle", post(routes_tasks::toggle_task))
        .route("/tasks/:id/targets", put(routes_tasks::replace_targets))
        .route("/tasks/:id/progress", put(routes_tasks::replace_progress))
        // settings documents
        .route(
            "/accounts",
            get(routes_settings::get_accounts).put(routes_settings::put_accounts),
        )
        .route(
            "/address-book",
            get(routes_settings::get_address_book).post(routes_settings::append_address),
        )
        .route(
            "/address-book/:index",
            put(routes_settings::replace_address).delete(routes_settings::remove_address),
        )
        .route(
            "/theme",
            get(routes_settings::get_theme).put(routes_settings::put_theme),
        )
        .route(
            "/defaults",
            get(routes_settings::get_defaults).put(routes_settings::put_defaults),
        )
        // profiles
        .route(
            "/profiles",
            get(routes_profiles::get_profiles)
                .post(routes_profiles::create_profile)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route(
            "/profiles/:id",
            put(routes_profiles::update_profile).delete(routes_profiles::delete_profile),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_secret,
        ));

    let uploads = ServeDir::new(state.avatars.dir());
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", uploads)
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("task_tracker=debug,tower_http=info")),
        )
        .init();

    info!("Starting task_tracker v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().expect("failed to load config");
    if config.secret.is_none() {
        warn!("No secret configured; mutating requests are open");
    }

    let addr = config.bind_addr;
    let state = AppState::open(config).expect("failed to open store");
    let app = build_router(state);

    // Print the link to the server
    info!("Server running at http://{}", addr);
    info!("API base:     http://{}/api", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind failed");

    axum::serve(listener, app).await.expect("server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    fn test_state(secret: Option<&str>) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_path: dir.path().join("tracker.db"),
            upload_dir: dir.path().join("uploads"),
            static_dir: dir.path().join("static"),
            secret: secret.map(str::to_string),
            ..Config::default()
        };
        (dir, AppState::open(config).unwrap())
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn task_flow_over_http() {
        let (_dir, state) = test_state(None);
        let app = build_router(state);

        let (status, _) = send(
            &app,
            json_request("PUT", "/api/accounts", serde_json::json!({ "text": "a，b" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, created) = send(
            &app,
            json_request("POST", "/api/tasks", serde_json::json!({ "content": "http://x" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["id"].as_i64().unwrap();

        let (_, task) = send(
            &app,
            json_request(
                "PUT",
                &format!("/api/tasks/{id}/progress"),
                serde_json::json!({ "checked": ["a", "b"] }),
            ),
        )
        .await;
        assert_eq!(task["is_complete"], true);
        assert_eq!(task["done_count"], 2);

        let (status, list) = send(
            &app,
            Request::get("/api/tasks").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["tasks"][0]["target_accounts"], serde_json::json!(["a", "b"]));
    }

    #[tokio::test]
    async fn missing_task_is_404_and_blank_content_is_400() {
        let (_dir, state) = test_state(None);
        let app = build_router(state);

        let req = Request::post("/api/tasks/42/toggle").body(Body::empty()).unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            json_request("POST", "/api/tasks", serde_json::json!({ "content": " " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn address_book_negative_index_is_rejected() {
        let (_dir, state) = test_state(None);
        let app = build_router(state);

        send(
            &app,
            json_request("POST", "/api/address-book", serde_json::json!({ "name": "Bob" })),
        )
        .await;
        let req = Request::delete("/api/address-book/-1").body(Body::empty()).unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, book) = send(
            &app,
            Request::get("/api/address-book").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(book[0]["name"], "Bob");
    }

    #[tokio::test]
    async fn address_entry_without_name_is_400() {
        let (_dir, state) = test_state(None);
        let app = build_router(state);

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/address-book",
                serde_json::json!({ "address": "0xabc", "uid": "7" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, book) = send(
            &app,
            Request::get("/api/address-book").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(book, serde_json::json!([]));
    }

    #[tokio::test]
    async fn mutations_need_the_secret_when_configured() {
        let (_dir, state) = test_state(Some("s3cret"));
        let app = build_router(state);

        let body = serde_json::json!({ "content": "note" });
        let (status, _) = send(&app, json_request("POST", "/api/tasks", body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut req = json_request("POST", "/api/tasks", body);
        req.headers_mut()
            .insert(auth::SECRET_HEADER, "s3cret".parse().unwrap());
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);

        // reads stay open
        let (status, list) = send(
            &app,
            Request::get("/api/tasks").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["tasks"].as_array().unwrap().len(), 1);
    }

    fn multipart_request(filename: &str) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nAlice\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\nIMAGEDATA\r\n--{b}--\r\n",
            b = boundary
        );
        Request::post("/api/profiles")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn avatar_upload_checks_extension() {
        let (dir, state) = test_state(None);
        let app = build_router(state);

        let (status, _) = send(&app, multipart_request("photo.bmp")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, profiles) = send(&app, multipart_request("photo.PNG")).await;
        assert_eq!(status, StatusCode::OK);
        let avatar = profiles[0]["avatar"].as_str().unwrap().to_string();
        assert_ne!(avatar, "photo.PNG");
        assert!(avatar.ends_with(".png"));
        assert!(dir.path().join("uploads").join(&avatar).is_file());
    }
}
