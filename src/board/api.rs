use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::account::AccountStore;
use super::analytics::summarize;
use super::calendar::EventStore;
use super::dnd::DropZone;
use super::functions::{ChatRequest, EdgeFunctions};
use super::models::{
    BoardView, ColumnId, Invite, NewEvent, NewTask, ProfilePatch, Session, SettingsPatch,
    TaskPatch,
};
use super::store::TaskStore;
use super::team::TeamStore;
use crate::errors::BoardError;

// ── Shared application state ──────────────────────────────────────────

/// One signed-in user's board, served to a local front-end. Each store sits
/// behind an async mutex so a mutation and its reload finish before the
/// next request touches the store.
pub struct AppState {
    pub session: Session,
    pub tasks: Mutex<TaskStore>,
    pub team: Mutex<TeamStore>,
    pub events: Mutex<EventStore>,
    pub account: Mutex<AccountStore>,
    pub functions: Arc<dyn EdgeFunctions>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        session: Session,
        tasks: TaskStore,
        team: TeamStore,
        events: EventStore,
        account: AccountStore,
        functions: Arc<dyn EdgeFunctions>,
    ) -> SharedState {
        Arc::new(Self {
            session,
            tasks: Mutex::new(tasks),
            team: Mutex::new(team),
            events: Mutex::new(events),
            account: Mutex::new(account),
            functions,
        })
    }
}

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MoveTaskRequest {
    pub column: String,
}

/// A drop forwarded from the browser: the raw drag payload plus the column
/// it landed on.
#[derive(Deserialize)]
pub struct DropRequest {
    pub payload: String,
    pub column: String,
}

#[derive(Serialize)]
pub struct DropResult {
    pub moved: bool,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    BadGateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        let msg = err.to_string();
        match err {
            BoardError::Validation(_) => ApiError::BadRequest(msg),
            BoardError::NotFound { .. } => ApiError::NotFound(msg),
            BoardError::Unauthenticated(_) => ApiError::Unauthorized(msg),
            _ => ApiError::BadGateway(msg),
        }
    }
}

fn parse_column(raw: &str) -> Result<ColumnId, ApiError> {
    raw.parse::<ColumnId>().map_err(ApiError::BadRequest)
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/board", get(get_board))
        .route("/api/board/drop", post(drop_on_column))
        .route("/api/tasks", post(create_task))
        .route("/api/tasks/{id}", patch(update_task).delete(delete_task))
        .route("/api/tasks/{id}/move", patch(move_task))
        .route("/api/team", get(list_team))
        .route("/api/team/invite", post(invite_member))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/profile", get(get_profile).patch(update_profile))
        .route("/api/settings", get(get_settings).patch(update_settings))
        .route("/api/analytics", get(get_analytics))
        .route("/api/assistant", post(ask_assistant))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

/// Always 200: a failed reload serves the previous snapshot, with the
/// failure among the notices.
async fn get_board(State(state): State<SharedState>) -> Json<BoardView> {
    let mut store = state.tasks.lock().await;
    let _ = store.load(&state.session).await;
    Json(BoardView {
        columns: store.columns(),
        notices: store.take_notices(),
    })
}

async fn create_task(
    State(state): State<SharedState>,
    Json(req): Json<NewTask>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.tasks.lock().await;
    let task = store.add(&state.session, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TaskPatch>,
) -> Result<impl IntoResponse, ApiError> {
    if req.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".into()));
    }
    let mut store = state.tasks.lock().await;
    let task = store.update(&state.session, id, req).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.tasks.lock().await;
    store.remove(&state.session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn move_task(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let column = parse_column(&req.column)?;
    let mut store = state.tasks.lock().await;
    store.move_task(&state.session, id, column).await?;
    Ok(Json(store.columns()))
}

async fn drop_on_column(
    State(state): State<SharedState>,
    Json(req): Json<DropRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut zone = DropZone::new(parse_column(&req.column)?);
    let mut store = state.tasks.lock().await;
    let moved = zone.drop_into(&req.payload, &mut store, &state.session).await?;
    Ok(Json(DropResult { moved }))
}

async fn list_team(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let mut team = state.team.lock().await;
    let members = team.load(&state.session).await?.to_vec();
    Ok(Json(members))
}

async fn invite_member(
    State(state): State<SharedState>,
    Json(req): Json<Invite>,
) -> Result<impl IntoResponse, ApiError> {
    let mut team = state.team.lock().await;
    let member = team.invite(&state.session, req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn list_events(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let mut events = state.events.lock().await;
    let list = events.load(&state.session).await?.to_vec();
    Ok(Json(list))
}

async fn create_event(
    State(state): State<SharedState>,
    Json(req): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let mut events = state.events.lock().await;
    let event = events.add(&state.session, req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn get_profile(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let mut account = state.account.lock().await;
    let profile = account.load_profile(&state.session).await?.clone();
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<SharedState>,
    Json(req): Json<ProfilePatch>,
) -> Result<impl IntoResponse, ApiError> {
    let mut account = state.account.lock().await;
    let profile = account.update_profile(&state.session, req).await?.clone();
    Ok(Json(profile))
}

async fn get_settings(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let mut account = state.account.lock().await;
    let settings = account.load_settings(&state.session).await?.clone();
    Ok(Json(settings))
}

async fn update_settings(
    State(state): State<SharedState>,
    Json(req): Json<SettingsPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let mut account = state.account.lock().await;
    let settings = account.update_settings(&state.session, req).await?.clone();
    Ok(Json(settings))
}

async fn get_analytics(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.tasks.lock().await;
    store.load(&state.session).await?;
    Ok(Json(summarize(store.tasks(), Utc::now())))
}

async fn ask_assistant(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is required".into()));
    }
    let reply = state
        .functions
        .ask_assistant(&state.session, &req)
        .await
        .map_err(|e| ApiError::BadGateway(format!("Assistant request failed: {}", e)))?;
    Ok(Json(reply))
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::backend::MemoryBackend;
    use crate::board::dnd::DragPayload;
    use crate::board::functions::OfflineFunctions;
    use crate::board::store::tests::session;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let backend = Arc::new(MemoryBackend::new());
        let functions = Arc::new(OfflineFunctions::new());
        let state = AppState::new(
            session(),
            TaskStore::new(backend.clone()),
            TeamStore::new(backend.clone(), functions.clone()),
            EventStore::new(backend.clone()),
            AccountStore::new(backend),
            functions,
        );
        api_router().with_state(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn create(app: &Router, title: &str) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/tasks",
                serde_json::json!({"title": title, "priority": "high"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response.into_body()).await
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_empty_board_has_four_columns() {
        let app = test_app();
        let response = app.oneshot(get_request("/api/board")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let board: serde_json::Value = body_json(response.into_body()).await;
        let columns = board["columns"].as_array().unwrap();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[1]["title"], "In Progress");
        assert!(columns.iter().all(|c| c["tasks"].as_array().unwrap().is_empty()));
    }

    #[tokio::test]
    async fn test_create_then_board_shows_task_and_notice() {
        let app = test_app();
        let task = create(&app, "Write docs").await;
        assert_eq!(task["title"], "Write docs");
        assert_eq!(task["priority"], "high");

        let response = app.oneshot(get_request("/api/board")).await.unwrap();
        let board: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(board["columns"][0]["tasks"][0]["title"], "Write docs");
        let notices = board["notices"].as_array().unwrap();
        assert!(notices.iter().any(|n| n["title"] == "Task created"));
    }

    #[tokio::test]
    async fn test_create_blank_title_is_bad_request() {
        let app = test_app();
        let response = app
            .oneshot(json_request("POST", "/api/tasks", serde_json::json!({"title": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert!(body["error"].as_str().unwrap().contains("title"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = test_app();
        let task = create(&app, "Draft").await;
        let id = task["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/tasks/{}", id),
                serde_json::json!({"title": "Final", "assignee": "ana"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(updated["title"], "Final");
        assert_eq!(updated["assignee"], "ana");

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/api/tasks/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let delete_again = Request::builder()
            .method("DELETE")
            .uri(format!("/api/tasks/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(delete_again).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_patch_is_bad_request() {
        let app = test_app();
        let task = create(&app, "Draft").await;
        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/api/tasks/{}", task["id"].as_str().unwrap()),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_move_task() {
        let app = test_app();
        let task = create(&app, "Ship").await;
        let uri = format!("/api/tasks/{}/move", task["id"].as_str().unwrap());

        let response = app
            .clone()
            .oneshot(json_request("PATCH", &uri, serde_json::json!({"column": "done"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let columns: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(columns[3]["tasks"][0]["title"], "Ship");

        let response = app
            .oneshot(json_request("PATCH", &uri, serde_json::json!({"column": "backlog"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_drop_runs_drag_controller() {
        let app = test_app();
        let task = create(&app, "Drag me").await;
        let id: Uuid = task["id"].as_str().unwrap().parse().unwrap();
        let payload = DragPayload::new(id, ColumnId::Todo).encode();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/board/drop",
                serde_json::json!({"payload": payload, "column": "review"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let result: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(result["moved"], true);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/board/drop",
                serde_json::json!({"payload": "garbage", "column": "done"}),
            ))
            .await
            .unwrap();
        let result: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(result["moved"], false);
    }

    #[tokio::test]
    async fn test_invite_and_list_team() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/team/invite",
                serde_json::json!({"email": "kim@example.com", "fullName": "Kim Lee", "role": "admin"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/team/invite",
                serde_json::json!({"email": "not-an-email", "fullName": "X"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(get_request("/api/team")).await.unwrap();
        let members: Vec<serde_json::Value> = body_json(response.into_body()).await;
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["status"], "pending");
    }

    #[tokio::test]
    async fn test_analytics() {
        let app = test_app();
        create(&app, "One").await;
        create(&app, "Two").await;
        let response = app.oneshot(get_request("/api/analytics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(summary["totalTasks"], 2);
        assert_eq!(summary["completionRate"], 0);
    }

    #[tokio::test]
    async fn test_assistant_offline_is_bad_gateway() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/assistant", serde_json::json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = app
            .oneshot(json_request("POST", "/api/assistant", serde_json::json!({"message": " "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_board_error_mapping() {
        let id = Uuid::new_v4();
        assert!(matches!(
            ApiError::from(BoardError::NotFound { id }),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(BoardError::validation("x")),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(BoardError::Create(anyhow::anyhow!("down"))),
            ApiError::BadGateway(_)
        ));
    }

    #[tokio::test]
    async fn test_board_serves_stale_columns_when_reload_fails() {
        use crate::board::store::tests::FlakyBackend;
        use std::sync::atomic::Ordering;

        let tasks = Arc::new(FlakyBackend::default());
        let functions = Arc::new(OfflineFunctions::new());
        let state = AppState::new(
            session(),
            TaskStore::new(tasks.clone()),
            TeamStore::new(Arc::new(MemoryBackend::new()), functions.clone()),
            EventStore::new(Arc::new(MemoryBackend::new())),
            AccountStore::new(Arc::new(MemoryBackend::new())),
            functions,
        );
        let app = api_router().with_state(state);
        create(&app, "Survives outage").await;
        let response = app.clone().oneshot(get_request("/api/board")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tasks.offline.store(true, Ordering::SeqCst);
        let response = app.oneshot(get_request("/api/board")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let board: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(board["columns"][0]["tasks"][0]["title"], "Survives outage");
        let notices = board["notices"].as_array().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0]["level"], "error");
        assert_eq!(notices[0]["message"], "Failed to load tasks");
    }

    #[tokio::test]
    async fn test_events_create_then_list() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/events",
                serde_json::json!({
                    "title": "Launch review",
                    "startDate": "2030-05-02T15:00:00Z",
                    "endDate": "2030-05-02T16:00:00Z",
                    "priority": "high"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let event: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(event["priority"], "high");

        let response = app.oneshot(get_request("/api/events")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let events: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(events[0]["title"], "Launch review");
    }

    #[tokio::test]
    async fn test_event_ending_before_start_is_bad_request() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/events",
                serde_json::json!({
                    "title": "Backwards",
                    "startDate": "2030-05-02T15:00:00Z",
                    "endDate": "2030-05-02T14:00:00Z"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_settings_default_then_patch() {
        let app = test_app();
        let response = app.clone().oneshot(get_request("/api/settings")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let settings: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(settings["push_notifications"]["mobilePush"], false);

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                "/api/settings",
                serde_json::json!({"push_notifications": {"mobilePush": true}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let settings: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(settings["push_notifications"]["mobilePush"], true);
        assert_eq!(settings["push_notifications"]["soundAlerts"], true);

        let response = app
            .oneshot(json_request("PATCH", "/api/settings", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_profile_is_bad_gateway() {
        let app = test_app();
        let response = app.oneshot(get_request("/api/profile")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
