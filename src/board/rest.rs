//! Client for the hosted backend: PostgREST-style tables under
//! `/rest/v1`, password sign-in under `/auth/v1` and serverless functions
//! under `/functions/v1`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::backend::{
    AccountBackend, EventBackend, EventInsert, MemberInsert, TaskBackend, TeamBackend,
};
use super::functions::{
    ASSISTANT_FUNCTION, ChatReply, ChatRequest, EdgeFunctions, INVITATION_FUNCTION,
    InvitationRequest,
};
use super::mapper::{TaskChanges, TaskInsert, TaskRecord};
use super::models::{Event, Profile, ProfilePatch, Session, SettingsPatch, TeamMember, UserSettings};

const TASKS_TABLE: &str = "tasks";
const MEMBERS_TABLE: &str = "team_members";
const EVENTS_TABLE: &str = "events";
const PROFILES_TABLE: &str = "profiles";
const SETTINGS_TABLE: &str = "user_settings";

/// Error body PostgREST and the auth server send with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "error_description", alias = "msg")]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }

    /// Request with the project key and the user's bearer token.
    fn request(
        &self,
        method: reqwest::Method,
        url: String,
        session: &Session,
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
    }

    /// Exchange email and password for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let resp = self
            .http
            .post(format!("{}/auth/v1/token", self.base_url))
            .header("apikey", &self.anon_key)
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to send sign-in request")?;
        let token: TokenResponse = read_json(resp, "sign in").await?;
        Ok(Session {
            access_token: token.access_token,
            user_id: token.user.id,
            email: token.user.email.or_else(|| Some(email.to_string())),
            expires_at: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }

    async fn invoke<B, R>(&self, session: &Session, name: &str, body: &B) -> Result<R>
    where
        B: serde::Serialize + ?Sized + Sync,
        R: DeserializeOwned + Send,
    {
        debug!(function = name, "invoking function");
        let resp = self
            .request(reqwest::Method::POST, self.function_url(name), session)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to call function {}", name))?;
        read_json(resp, name).await
    }
}

/// Decode a success body, or turn an error status into an error carrying
/// the server's message.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response, what: &str) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or(text);
        anyhow::bail!("{} failed with {}: {}", what, status, message);
    }
    resp.json::<T>()
        .await
        .with_context(|| format!("Failed to parse {} response", what))
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl TaskBackend for RestBackend {
    async fn select_tasks(&self, session: &Session) -> Result<Vec<TaskRecord>> {
        let resp = self
            .request(reqwest::Method::GET, self.table_url(TASKS_TABLE), session)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(session.user_id)),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await
            .context("Failed to send tasks request")?;
        read_json(resp, "select tasks").await
    }

    async fn select_task(&self, session: &Session, id: Uuid) -> Result<Option<TaskRecord>> {
        let resp = self
            .request(reqwest::Method::GET, self.table_url(TASKS_TABLE), session)
            .query(&[
                ("select", "*".to_string()),
                ("id", eq(id)),
                ("user_id", eq(session.user_id)),
            ])
            .send()
            .await
            .context("Failed to send task request")?;
        let rows: Vec<TaskRecord> = read_json(resp, "select task").await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_task(&self, session: &Session, row: TaskInsert) -> Result<TaskRecord> {
        let resp = self
            .request(reqwest::Method::POST, self.table_url(TASKS_TABLE), session)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .context("Failed to send task insert")?;
        let rows: Vec<TaskRecord> = read_json(resp, "insert task").await?;
        rows.into_iter()
            .next()
            .context("Task insert returned no row")
    }

    async fn update_task(
        &self,
        session: &Session,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<TaskRecord>> {
        let resp = self
            .request(reqwest::Method::PATCH, self.table_url(TASKS_TABLE), session)
            .header("Prefer", "return=representation")
            .query(&[("id", eq(id)), ("user_id", eq(session.user_id))])
            .json(&changes)
            .send()
            .await
            .context("Failed to send task update")?;
        let rows: Vec<TaskRecord> = read_json(resp, "update task").await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_task(&self, session: &Session, id: Uuid) -> Result<bool> {
        let resp = self
            .request(reqwest::Method::DELETE, self.table_url(TASKS_TABLE), session)
            .header("Prefer", "return=representation")
            .query(&[("id", eq(id)), ("user_id", eq(session.user_id))])
            .send()
            .await
            .context("Failed to send task delete")?;
        let rows: Vec<TaskRecord> = read_json(resp, "delete task").await?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl TeamBackend for RestBackend {
    async fn select_members(&self, session: &Session) -> Result<Vec<TeamMember>> {
        let resp = self
            .request(reqwest::Method::GET, self.table_url(MEMBERS_TABLE), session)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await
            .context("Failed to send team members request")?;
        read_json(resp, "select team members").await
    }

    async fn insert_member(&self, session: &Session, row: MemberInsert) -> Result<TeamMember> {
        let resp = self
            .request(reqwest::Method::POST, self.table_url(MEMBERS_TABLE), session)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .context("Failed to send team member insert")?;
        let rows: Vec<TeamMember> = read_json(resp, "insert team member").await?;
        rows.into_iter()
            .next()
            .context("Team member insert returned no row")
    }
}

#[async_trait]
impl EventBackend for RestBackend {
    async fn select_events(&self, session: &Session) -> Result<Vec<Event>> {
        let resp = self
            .request(reqwest::Method::GET, self.table_url(EVENTS_TABLE), session)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(session.user_id)),
                ("order", "start_date.asc".to_string()),
            ])
            .send()
            .await
            .context("Failed to send events request")?;
        read_json(resp, "select events").await
    }

    async fn insert_event(&self, session: &Session, row: EventInsert) -> Result<Event> {
        let resp = self
            .request(reqwest::Method::POST, self.table_url(EVENTS_TABLE), session)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .context("Failed to send event insert")?;
        let rows: Vec<Event> = read_json(resp, "insert event").await?;
        rows.into_iter()
            .next()
            .context("Event insert returned no row")
    }
}

#[async_trait]
impl AccountBackend for RestBackend {
    async fn select_profile(&self, session: &Session) -> Result<Option<Profile>> {
        let resp = self
            .request(reqwest::Method::GET, self.table_url(PROFILES_TABLE), session)
            .query(&[("select", "*".to_string()), ("id", eq(session.user_id))])
            .send()
            .await
            .context("Failed to send profile request")?;
        let rows: Vec<Profile> = read_json(resp, "select profile").await?;
        Ok(rows.into_iter().next())
    }

    async fn update_profile(
        &self,
        session: &Session,
        patch: &ProfilePatch,
    ) -> Result<Option<Profile>> {
        let resp = self
            .request(reqwest::Method::PATCH, self.table_url(PROFILES_TABLE), session)
            .header("Prefer", "return=representation")
            .query(&[("id", eq(session.user_id))])
            .json(patch)
            .send()
            .await
            .context("Failed to send profile update")?;
        let rows: Vec<Profile> = read_json(resp, "update profile").await?;
        Ok(rows.into_iter().next())
    }

    async fn select_settings(&self, session: &Session) -> Result<Option<UserSettings>> {
        let resp = self
            .request(reqwest::Method::GET, self.table_url(SETTINGS_TABLE), session)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(session.user_id)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .context("Failed to send settings request")?;
        let rows: Vec<UserSettings> = read_json(resp, "select settings").await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_settings(&self, session: &Session, row: &UserSettings) -> Result<UserSettings> {
        let resp = self
            .request(reqwest::Method::POST, self.table_url(SETTINGS_TABLE), session)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .context("Failed to send settings insert")?;
        let rows: Vec<UserSettings> = read_json(resp, "insert settings").await?;
        rows.into_iter()
            .next()
            .context("Settings insert returned no row")
    }

    async fn update_settings(
        &self,
        session: &Session,
        patch: &SettingsPatch,
    ) -> Result<Option<UserSettings>> {
        let resp = self
            .request(reqwest::Method::PATCH, self.table_url(SETTINGS_TABLE), session)
            .header("Prefer", "return=representation")
            .query(&[("user_id", eq(session.user_id))])
            .json(patch)
            .send()
            .await
            .context("Failed to send settings update")?;
        let rows: Vec<UserSettings> = read_json(resp, "update settings").await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl EdgeFunctions for RestBackend {
    async fn ask_assistant(&self, session: &Session, request: &ChatRequest) -> Result<ChatReply> {
        self.invoke(session, ASSISTANT_FUNCTION, request).await
    }

    async fn send_invitation(
        &self,
        session: &Session,
        request: &InvitationRequest,
    ) -> Result<serde_json::Value> {
        self.invoke(session, INVITATION_FUNCTION, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// What the stub saw, for assertions.
    #[derive(Default)]
    struct Seen {
        queries: Vec<HashMap<String, String>>,
        bodies: Vec<Value>,
        headers: Vec<(Option<String>, Option<String>, Option<String>)>,
    }

    type Shared = Arc<Mutex<Seen>>;

    fn record(seen: &Shared, headers: &HeaderMap, query: HashMap<String, String>, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let mut seen = seen.lock().unwrap();
        seen.headers
            .push((header("apikey"), header("authorization"), header("prefer")));
        seen.queries.push(query);
        seen.bodies.push(body);
    }

    fn row(id: Uuid, owner: Uuid, status: i32) -> Value {
        json!({
            "id": id,
            "title": "Stubbed",
            "priority": 1,
            "status": status,
            "custom_fields": {"description": "from stub", "assignee": null},
            "user_id": owner,
            "created_at": "2025-01-02T03:04:05Z"
        })
    }

    async fn stub(owner: Uuid, task_id: Uuid) -> (String, Shared) {
        let seen: Shared = Arc::default();
        let app = Router::new()
            .route(
                "/rest/v1/tasks",
                get(
                    move |State(seen): State<Shared>,
                          headers: HeaderMap,
                          Query(q): Query<HashMap<String, String>>| async move {
                        record(&seen, &headers, q, Value::Null);
                        Json(json!([row(task_id, owner, 2)]))
                    },
                )
                .post(
                    move |State(seen): State<Shared>,
                          headers: HeaderMap,
                          Query(q): Query<HashMap<String, String>>,
                          Json(body): Json<Value>| async move {
                        record(&seen, &headers, q, body);
                        (StatusCode::CREATED, Json(json!([row(task_id, owner, 0)])))
                    },
                )
                .patch(
                    move |State(seen): State<Shared>,
                          headers: HeaderMap,
                          Query(q): Query<HashMap<String, String>>,
                          Json(body): Json<Value>| async move {
                        let hit = q.get("id") == Some(&format!("eq.{}", task_id));
                        record(&seen, &headers, q, body);
                        if hit {
                            Json(json!([row(task_id, owner, 3)]))
                        } else {
                            Json(json!([]))
                        }
                    },
                )
                .delete(
                    |State(seen): State<Shared>,
                     headers: HeaderMap,
                     Query(q): Query<HashMap<String, String>>| async move {
                        record(&seen, &headers, q, Value::Null);
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"message": "JWT expired", "code": "PGRST301"})),
                        )
                    },
                ),
            )
            .route(
                "/auth/v1/token",
                post(
                    move |Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                        if q.get("grant_type").map(String::as_str) != Some("password")
                            || body["password"] != "hunter2"
                        {
                            return (
                                StatusCode::BAD_REQUEST,
                                Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
                            );
                        }
                        (
                            StatusCode::OK,
                            Json(json!({
                                "access_token": "jwt-abc",
                                "token_type": "bearer",
                                "expires_in": 3600,
                                "user": {"id": owner, "email": body["email"]}
                            })),
                        )
                    },
                ),
            )
            .route(
                "/functions/v1/ai-assistant",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({"response": format!("echo: {}", body["message"].as_str().unwrap_or(""))}))
                }),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/", addr), seen)
    }

    fn session_for(owner: Uuid) -> Session {
        Session {
            access_token: "jwt-abc".into(),
            user_id: owner,
            email: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_select_tasks_sends_owner_filter_and_headers() {
        let owner = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let (url, seen) = stub(owner, task_id).await;
        let backend = RestBackend::new(url, "anon-key");

        let rows = backend.select_tasks(&session_for(owner)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, task_id);
        assert_eq!(rows[0].status, Some(2));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.queries[0]["user_id"], format!("eq.{}", owner));
        assert_eq!(seen.queries[0]["order"], "created_at.desc");
        assert_eq!(seen.headers[0].0.as_deref(), Some("anon-key"));
        assert_eq!(seen.headers[0].1.as_deref(), Some("Bearer jwt-abc"));
    }

    #[tokio::test]
    async fn test_insert_asks_for_representation() {
        let owner = Uuid::new_v4();
        let (url, seen) = stub(owner, Uuid::new_v4()).await;
        let backend = RestBackend::new(url, "anon-key");
        let row = TaskInsert {
            title: "New".into(),
            user_id: owner,
            priority: 2,
            status: 0,
            custom_fields: Default::default(),
        };
        let record = backend.insert_task(&session_for(owner), row).await.unwrap();
        assert_eq!(record.user_id, Some(owner));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.headers[0].2.as_deref(), Some("return=representation"));
        assert_eq!(seen.bodies[0][0]["title"], "New");
    }

    #[tokio::test]
    async fn test_move_patch_carries_status_only() {
        let owner = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let (url, seen) = stub(owner, task_id).await;
        let backend = RestBackend::new(url, "anon-key");
        let s = session_for(owner);

        let updated = backend
            .update_task(&s, task_id, TaskChanges::status_only(3))
            .await
            .unwrap();
        assert_eq!(updated.unwrap().status, Some(3));
        let missing = backend
            .update_task(&s, Uuid::new_v4(), TaskChanges::status_only(3))
            .await
            .unwrap();
        assert!(missing.is_none());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.bodies[0], json!({"status": 3}));
        assert_eq!(seen.queries[0]["user_id"], format!("eq.{}", owner));
    }

    #[tokio::test]
    async fn test_error_status_surfaces_server_message() {
        let owner = Uuid::new_v4();
        let (url, _seen) = stub(owner, Uuid::new_v4()).await;
        let backend = RestBackend::new(url, "anon-key");
        let err = backend
            .delete_task(&session_for(owner), Uuid::new_v4())
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"), "{msg}");
        assert!(msg.contains("JWT expired"), "{msg}");
    }

    #[tokio::test]
    async fn test_sign_in() {
        let owner = Uuid::new_v4();
        let (url, _seen) = stub(owner, Uuid::new_v4()).await;
        let backend = RestBackend::new(url, "anon-key");

        let session = backend.sign_in("ana@example.com", "hunter2").await.unwrap();
        assert_eq!(session.user_id, owner);
        assert_eq!(session.access_token, "jwt-abc");
        assert_eq!(session.email.as_deref(), Some("ana@example.com"));
        assert!(session.expires_at.is_some());

        let err = backend.sign_in("ana@example.com", "wrong").await.unwrap_err();
        assert!(err.to_string().contains("Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_assistant_function() {
        let owner = Uuid::new_v4();
        let (url, _seen) = stub(owner, Uuid::new_v4()).await;
        let backend = RestBackend::new(url, "anon-key");
        let reply = backend
            .ask_assistant(
                &session_for(owner),
                &ChatRequest {
                    message: "hello".into(),
                    context: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(reply.response, "echo: hello");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = RestBackend::new("https://example.test/", "k");
        assert_eq!(backend.base_url(), "https://example.test");
        assert_eq!(
            backend.table_url(TASKS_TABLE),
            "https://example.test/rest/v1/tasks"
        );
    }

    async fn calendar_stub(owner: Uuid) -> (String, Shared) {
        let seen: Shared = Arc::default();
        let app = Router::new()
            .route(
                "/rest/v1/events",
                get(
                    move |State(seen): State<Shared>,
                          headers: HeaderMap,
                          Query(q): Query<HashMap<String, String>>| async move {
                        record(&seen, &headers, q, Value::Null);
                        Json(json!([{
                            "id": Uuid::new_v4(),
                            "title": "Sprint Planning",
                            "description": null,
                            "start_date": "2026-01-22T09:00:00+00:00",
                            "end_date": null,
                            "priority": "high",
                            "user_id": owner,
                            "created_at": "2026-01-01T00:00:00+00:00",
                            "updated_at": null
                        }]))
                    },
                ),
            )
            .route(
                "/rest/v1/user_settings",
                get(
                    |State(seen): State<Shared>,
                     headers: HeaderMap,
                     Query(q): Query<HashMap<String, String>>| async move {
                        record(&seen, &headers, q, Value::Null);
                        Json(json!([]))
                    },
                )
                .patch(
                    move |State(seen): State<Shared>,
                          headers: HeaderMap,
                          Query(q): Query<HashMap<String, String>>,
                          Json(body): Json<Value>| async move {
                        record(&seen, &headers, q, body.clone());
                        Json(json!([{
                            "id": Uuid::new_v4(),
                            "user_id": owner,
                            "email_notifications": null,
                            "push_notifications": body["push_notifications"],
                            "privacy_settings": null
                        }]))
                    },
                ),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), seen)
    }

    #[tokio::test]
    async fn test_select_events_orders_by_start() {
        let owner = Uuid::new_v4();
        let (url, seen) = calendar_stub(owner).await;
        let backend = RestBackend::new(url, "anon-key");

        let events = backend.select_events(&session_for(owner)).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Sprint Planning");
        assert_eq!(events[0].priority.as_deref(), Some("high"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.queries[0]["order"], "start_date.asc");
        assert_eq!(seen.queries[0]["user_id"], format!("eq.{}", owner));
    }

    #[tokio::test]
    async fn test_settings_missing_row_and_group_patch() {
        use crate::board::models::SettingKey;

        let owner = Uuid::new_v4();
        let (url, seen) = calendar_stub(owner).await;
        let backend = RestBackend::new(url, "anon-key");
        let session = session_for(owner);

        assert!(backend.select_settings(&session).await.unwrap().is_none());

        let patch = UserSettings::defaults_for(owner).patch_for(SettingKey::PushSound, false);
        let updated = backend
            .update_settings(&session, &patch)
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.push_notifications.sound_alerts);
        assert!(updated.email_notifications.task_updates);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.queries[1]["user_id"], format!("eq.{}", owner));
        assert_eq!(seen.headers[1].2.as_deref(), Some("return=representation"));
        let body = seen.bodies[1].as_object().unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body["push_notifications"]["soundAlerts"], false);
    }
}
