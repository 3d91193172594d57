use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mapper::{CustomFields, TaskChanges, TaskInsert, TaskRecord};
use super::models::{
    Event, Profile, ProfilePatch, Session, SettingsPatch, TeamMember, UserSettings,
};

/// Row-scoped CRUD over the `tasks` table.
/// Real implementation: `RestBackend`. In-process: `MemoryBackend`.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// All rows owned by the session user, newest first.
    async fn select_tasks(&self, session: &Session) -> Result<Vec<TaskRecord>>;

    async fn select_task(&self, session: &Session, id: Uuid) -> Result<Option<TaskRecord>>;

    async fn insert_task(&self, session: &Session, row: TaskInsert) -> Result<TaskRecord>;

    /// Returns `None` when no row with `id` is owned by the session user.
    async fn update_task(
        &self,
        session: &Session,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<TaskRecord>>;

    /// Returns whether an owned row was removed.
    async fn delete_task(&self, session: &Session, id: Uuid) -> Result<bool>;
}

/// Insert body for the `team_members` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberInsert {
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub status: String,
    pub invited_by: Uuid,
}

#[async_trait]
pub trait TeamBackend: Send + Sync {
    /// Members visible to the session user, newest first.
    async fn select_members(&self, session: &Session) -> Result<Vec<TeamMember>>;

    async fn insert_member(&self, session: &Session, row: MemberInsert) -> Result<TeamMember>;
}

/// Insert body for the `events` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventInsert {
    pub title: String,
    pub description: Option<String>,
    pub start_date: chrono::DateTime<Utc>,
    pub end_date: Option<chrono::DateTime<Utc>>,
    pub priority: String,
    pub user_id: Uuid,
}

#[async_trait]
pub trait EventBackend: Send + Sync {
    /// Events owned by the session user, earliest start first.
    async fn select_events(&self, session: &Session) -> Result<Vec<Event>>;

    async fn insert_event(&self, session: &Session, row: EventInsert) -> Result<Event>;
}

/// The signed-in user's own `profiles` and `user_settings` rows.
#[async_trait]
pub trait AccountBackend: Send + Sync {
    async fn select_profile(&self, session: &Session) -> Result<Option<Profile>>;

    /// Returns `None` when the user has no profile row.
    async fn update_profile(
        &self,
        session: &Session,
        patch: &ProfilePatch,
    ) -> Result<Option<Profile>>;

    async fn select_settings(&self, session: &Session) -> Result<Option<UserSettings>>;

    async fn insert_settings(&self, session: &Session, row: &UserSettings) -> Result<UserSettings>;

    /// Returns `None` when the user has no settings row.
    async fn update_settings(
        &self,
        session: &Session,
        patch: &SettingsPatch,
    ) -> Result<Option<UserSettings>>;
}

// ── In-process backend ────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    tasks: Vec<TaskRecord>,
    members: Vec<TeamMember>,
    events: Vec<Event>,
    profiles: Vec<Profile>,
    settings: Vec<UserSettings>,
}

/// Owner-scoped tables held in memory. Backs `--offline` mode and tests.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend pre-filled for `owner`: one sample task per column, two
    /// upcoming events and a profile.
    pub fn seeded(owner: Uuid) -> Self {
        let backend = Self::new();
        let samples = [
            ("Review pull requests", 2, 3, Some("Check the open PRs before standup")),
            ("Plan next sprint", 3, 2, None),
            ("Write onboarding guide", 2, 1, Some("Cover local setup and conventions")),
            ("Set up CI pipeline", 1, 0, None),
        ];
        if let Ok(mut tables) = backend.tables.lock() {
            for (title, priority, status, description) in samples {
                tables.tasks.push(TaskRecord {
                    id: Uuid::new_v4(),
                    title: title.to_string(),
                    priority: Some(priority),
                    status: Some(status),
                    custom_fields: Some(CustomFields {
                        description: description.map(str::to_string),
                        assignee: None,
                    }),
                    user_id: Some(owner),
                    created_at: Some(Utc::now()),
                });
            }

            let now = Utc::now();
            let events = [
                ("Sprint Planning", Duration::days(1), Some(Duration::hours(2)), "high"),
                ("Team Meeting", Duration::days(3), None, "medium"),
            ];
            for (title, starts_in, length, priority) in events {
                let start = now + starts_in;
                tables.events.push(Event {
                    id: Uuid::new_v4(),
                    title: title.to_string(),
                    description: None,
                    start_date: start,
                    end_date: length.map(|len| start + len),
                    priority: Some(priority.to_string()),
                    user_id: owner,
                    created_at: Some(now),
                });
            }

            tables.profiles.push(Profile {
                id: owner,
                email: None,
                full_name: Some("Sample User".to_string()),
                avatar_url: None,
            });
        }
        backend
    }

    /// Add a profile row, as the hosted backend does on sign-up.
    pub fn with_profile(self, profile: Profile) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            tables.profiles.retain(|p| p.id != profile.id);
            tables.profiles.push(profile);
        }
        self
    }

    fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> Result<R> {
        let mut guard = self
            .tables
            .lock()
            .map_err(|e| anyhow!("Memory backend lock poisoned: {}", e))?;
        Ok(f(&mut guard))
    }
}

fn owned_by(row: &TaskRecord, session: &Session) -> bool {
    row.user_id == Some(session.user_id)
}

#[async_trait]
impl TaskBackend for MemoryBackend {
    async fn select_tasks(&self, session: &Session) -> Result<Vec<TaskRecord>> {
        self.with_tables(|t| {
            let mut rows: Vec<TaskRecord> = t
                .tasks
                .iter()
                .filter(|row| owned_by(row, session))
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            rows
        })
    }

    async fn select_task(&self, session: &Session, id: Uuid) -> Result<Option<TaskRecord>> {
        self.with_tables(|t| {
            t.tasks
                .iter()
                .find(|row| row.id == id && owned_by(row, session))
                .cloned()
        })
    }

    async fn insert_task(&self, session: &Session, row: TaskInsert) -> Result<TaskRecord> {
        if row.user_id != session.user_id {
            anyhow::bail!("row-level policy violation: user_id does not match session");
        }
        self.with_tables(|t| {
            let record = TaskRecord {
                id: Uuid::new_v4(),
                title: row.title,
                priority: Some(row.priority),
                status: Some(row.status),
                custom_fields: Some(row.custom_fields),
                user_id: Some(row.user_id),
                created_at: Some(Utc::now()),
            };
            // Newest at the front so equal timestamps still sort newest first.
            t.tasks.insert(0, record.clone());
            record
        })
    }

    async fn update_task(
        &self,
        session: &Session,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<TaskRecord>> {
        self.with_tables(|t| {
            let row = t
                .tasks
                .iter_mut()
                .find(|row| row.id == id && owned_by(row, session))?;
            if let Some(title) = changes.title {
                row.title = title;
            }
            if let Some(priority) = changes.priority {
                row.priority = Some(priority);
            }
            if let Some(status) = changes.status {
                row.status = Some(status);
            }
            if let Some(fields) = changes.custom_fields {
                row.custom_fields = Some(fields);
            }
            Some(row.clone())
        })
    }

    async fn delete_task(&self, session: &Session, id: Uuid) -> Result<bool> {
        self.with_tables(|t| {
            let before = t.tasks.len();
            t.tasks.retain(|row| !(row.id == id && owned_by(row, session)));
            t.tasks.len() != before
        })
    }
}

#[async_trait]
impl TeamBackend for MemoryBackend {
    async fn select_members(&self, session: &Session) -> Result<Vec<TeamMember>> {
        self.with_tables(|t| {
            t.members
                .iter()
                .filter(|m| m.invited_by == Some(session.user_id))
                .cloned()
                .collect()
        })
    }

    async fn insert_member(&self, session: &Session, row: MemberInsert) -> Result<TeamMember> {
        if row.invited_by != session.user_id {
            anyhow::bail!("row-level policy violation: invited_by does not match session");
        }
        self.with_tables(|t| {
            if t
                .members
                .iter()
                .any(|m| m.email.eq_ignore_ascii_case(&row.email) && m.invited_by == Some(row.invited_by))
            {
                return Err(anyhow!("duplicate key value: {} is already invited", row.email));
            }
            let now = Utc::now();
            let member = TeamMember {
                id: Uuid::new_v4(),
                email: row.email,
                full_name: Some(row.full_name),
                role: Some(row.role),
                status: Some(row.status),
                invited_by: Some(row.invited_by),
                invited_at: Some(now),
                created_at: Some(now),
            };
            t.members.insert(0, member.clone());
            Ok(member)
        })?
    }
}

#[async_trait]
impl EventBackend for MemoryBackend {
    async fn select_events(&self, session: &Session) -> Result<Vec<Event>> {
        self.with_tables(|t| {
            let mut rows: Vec<Event> = t
                .events
                .iter()
                .filter(|e| e.user_id == session.user_id)
                .cloned()
                .collect();
            rows.sort_by_key(|e| e.start_date);
            rows
        })
    }

    async fn insert_event(&self, session: &Session, row: EventInsert) -> Result<Event> {
        if row.user_id != session.user_id {
            anyhow::bail!("row-level policy violation: user_id does not match session");
        }
        self.with_tables(|t| {
            let event = Event {
                id: Uuid::new_v4(),
                title: row.title,
                description: row.description,
                start_date: row.start_date,
                end_date: row.end_date,
                priority: Some(row.priority),
                user_id: row.user_id,
                created_at: Some(Utc::now()),
            };
            t.events.push(event.clone());
            event
        })
    }
}

#[async_trait]
impl AccountBackend for MemoryBackend {
    async fn select_profile(&self, session: &Session) -> Result<Option<Profile>> {
        self.with_tables(|t| t.profiles.iter().find(|p| p.id == session.user_id).cloned())
    }

    async fn update_profile(
        &self,
        session: &Session,
        patch: &ProfilePatch,
    ) -> Result<Option<Profile>> {
        self.with_tables(|t| {
            let profile = t.profiles.iter_mut().find(|p| p.id == session.user_id)?;
            profile.apply(patch);
            Some(profile.clone())
        })
    }

    async fn select_settings(&self, session: &Session) -> Result<Option<UserSettings>> {
        self.with_tables(|t| {
            t.settings
                .iter()
                .find(|s| s.user_id == session.user_id)
                .cloned()
        })
    }

    async fn insert_settings(&self, session: &Session, row: &UserSettings) -> Result<UserSettings> {
        if row.user_id != session.user_id {
            anyhow::bail!("row-level policy violation: user_id does not match session");
        }
        self.with_tables(|t| {
            if t.settings.iter().any(|s| s.user_id == row.user_id) {
                return Err(anyhow!("duplicate key value: settings already exist for user"));
            }
            let mut stored = row.clone();
            stored.id = Some(Uuid::new_v4());
            t.settings.push(stored.clone());
            Ok(stored)
        })?
    }

    async fn update_settings(
        &self,
        session: &Session,
        patch: &SettingsPatch,
    ) -> Result<Option<UserSettings>> {
        self.with_tables(|t| {
            let settings = t
                .settings
                .iter_mut()
                .find(|s| s.user_id == session.user_id)?;
            settings.apply(patch);
            Some(settings.clone())
        })
    }
}
