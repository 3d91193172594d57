use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Board columns ─────────────────────────────────────────────────────

/// The four fixed board columns. The discriminant order is the stored
/// status code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnId {
    Todo,
    InProgress,
    Review,
    Done,
}

impl ColumnId {
    pub const ALL: [ColumnId; 4] = [
        ColumnId::Todo,
        ColumnId::InProgress,
        ColumnId::Review,
        ColumnId::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inprogress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Review => "Review",
            Self::Done => "Done",
        }
    }

    pub fn status_code(&self) -> i32 {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::Review => 2,
            Self::Done => 3,
        }
    }

    pub fn from_status(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Todo),
            1 => Some(Self::InProgress),
            2 => Some(Self::Review),
            3 => Some(Self::Done),
            _ => None,
        }
    }
}

impl FromStr for ColumnId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "inprogress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            _ => Err(format!("Invalid column: {}", s)),
        }
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Priority ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Storage code: 1 = low, 2 = medium, 3 = high.
    pub fn code(&self) -> i32 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub assignee: Option<String>,
    /// Raw status code. Rows written by other clients may carry codes
    /// outside the four board columns.
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub owner_id: Uuid,
}

impl Task {
    pub fn column(&self) -> Option<ColumnId> {
        ColumnId::from_status(self.status)
    }

    /// Overwrite the patched fields in place. `id`, `created_at` and
    /// `owner_id` are never touched.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description = non_empty(description);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(assignee) = &patch.assignee {
            self.assignee = non_empty(assignee);
        }
        if let Some(column) = patch.column {
            self.status = column.status_code();
        }
    }
}

/// Input for the add-task command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default = "default_column")]
    pub column: ColumnId,
}

fn default_column() -> ColumnId {
    ColumnId::Todo
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            assignee: None,
            column: ColumnId::Todo,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn in_column(mut self, column: ColumnId) -> Self {
        self.column = column;
        self
    }
}

/// Partial update for the edit-task command. `Some("")` clears
/// description/assignee.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub column: Option<ColumnId>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.column.is_none()
    }
}

/// Trim and map an empty string to "unset".
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ── Board view ────────────────────────────────────────────────────────

/// Static column configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub id: ColumnId,
    pub title: &'static str,
}

/// A derived swim-lane. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    pub columns: Vec<Column>,
    pub notices: Vec<Notice>,
}

// ── Team ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Admin,
    Manager,
}

impl MemberRole {
    pub const ALL: [MemberRole; 3] = [MemberRole::Member, MemberRole::Admin, MemberRole::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Manager => "manager",
        }
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `team_members` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub invited_by: Option<Uuid>,
    #[serde(default)]
    pub invited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for the invite-member command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub role: MemberRole,
}

// ── Calendar ──────────────────────────────────────────────────────────

/// An `events` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Free text in storage; `low`, `medium` or `high` when written here.
    #[serde(default)]
    pub priority: Option<String>,
    pub user_id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Stored priority, `medium` when missing or unrecognised.
    pub fn priority(&self) -> Priority {
        self.priority
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or_default()
    }

    /// The instant the event is over: its end, or its start when it has none.
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.end_date.unwrap_or(self.start_date)
    }
}

/// Input for the add-event command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
}

// ── Profile & settings ────────────────────────────────────────────────

/// A `profiles` row, keyed by the user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.email.is_none() && self.avatar_url.is_none()
    }
}

impl Profile {
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(name) = &patch.full_name {
            self.full_name = non_empty(name);
        }
        if let Some(email) = &patch.email {
            self.email = non_empty(email);
        }
        if let Some(url) = &patch.avatar_url {
            self.avatar_url = non_empty(url);
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailNotifications {
    pub task_updates: bool,
    pub team_mentions: bool,
    pub deadline_reminders: bool,
}

impl Default for EmailNotifications {
    fn default() -> Self {
        Self {
            task_updates: true,
            team_mentions: true,
            deadline_reminders: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PushNotifications {
    pub browser_push: bool,
    pub mobile_push: bool,
    pub sound_alerts: bool,
}

impl Default for PushNotifications {
    fn default() -> Self {
        Self {
            browser_push: true,
            mobile_push: false,
            sound_alerts: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivacySettings {
    pub profile_visibility: bool,
    pub activity_status: bool,
    pub analytics_tracking: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visibility: true,
            activity_status: true,
            analytics_tracking: false,
        }
    }
}

/// A `user_settings` row. The three JSON columns may be null in storage;
/// null reads as the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email_notifications: EmailNotifications,
    #[serde(default, deserialize_with = "null_as_default")]
    pub push_notifications: PushNotifications,
    #[serde(default, deserialize_with = "null_as_default")]
    pub privacy_settings: PrivacySettings,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial settings update. Each group is written whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<EmailNotifications>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<PushNotifications>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_settings: Option<PrivacySettings>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.email_notifications.is_none()
            && self.push_notifications.is_none()
            && self.privacy_settings.is_none()
    }
}

/// One switch on the settings page, addressed as `group.name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    EmailTaskUpdates,
    EmailTeamMentions,
    EmailDeadlineReminders,
    PushBrowser,
    PushMobile,
    PushSound,
    PrivacyProfileVisibility,
    PrivacyActivityStatus,
    PrivacyAnalytics,
}

impl SettingKey {
    pub const ALL: [SettingKey; 9] = [
        SettingKey::EmailTaskUpdates,
        SettingKey::EmailTeamMentions,
        SettingKey::EmailDeadlineReminders,
        SettingKey::PushBrowser,
        SettingKey::PushMobile,
        SettingKey::PushSound,
        SettingKey::PrivacyProfileVisibility,
        SettingKey::PrivacyActivityStatus,
        SettingKey::PrivacyAnalytics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailTaskUpdates => "email.task-updates",
            Self::EmailTeamMentions => "email.team-mentions",
            Self::EmailDeadlineReminders => "email.deadline-reminders",
            Self::PushBrowser => "push.browser",
            Self::PushMobile => "push.mobile",
            Self::PushSound => "push.sound",
            Self::PrivacyProfileVisibility => "privacy.profile-visibility",
            Self::PrivacyActivityStatus => "privacy.activity-status",
            Self::PrivacyAnalytics => "privacy.analytics",
        }
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| format!("Invalid setting: {}", s))
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl UserSettings {
    pub fn defaults_for(user_id: Uuid) -> Self {
        Self {
            id: None,
            user_id,
            email_notifications: EmailNotifications::default(),
            push_notifications: PushNotifications::default(),
            privacy_settings: PrivacySettings::default(),
        }
    }

    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::EmailTaskUpdates => self.email_notifications.task_updates,
            SettingKey::EmailTeamMentions => self.email_notifications.team_mentions,
            SettingKey::EmailDeadlineReminders => self.email_notifications.deadline_reminders,
            SettingKey::PushBrowser => self.push_notifications.browser_push,
            SettingKey::PushMobile => self.push_notifications.mobile_push,
            SettingKey::PushSound => self.push_notifications.sound_alerts,
            SettingKey::PrivacyProfileVisibility => self.privacy_settings.profile_visibility,
            SettingKey::PrivacyActivityStatus => self.privacy_settings.activity_status,
            SettingKey::PrivacyAnalytics => self.privacy_settings.analytics_tracking,
        }
    }

    fn flag_mut(&mut self, key: SettingKey) -> &mut bool {
        match key {
            SettingKey::EmailTaskUpdates => &mut self.email_notifications.task_updates,
            SettingKey::EmailTeamMentions => &mut self.email_notifications.team_mentions,
            SettingKey::EmailDeadlineReminders => &mut self.email_notifications.deadline_reminders,
            SettingKey::PushBrowser => &mut self.push_notifications.browser_push,
            SettingKey::PushMobile => &mut self.push_notifications.mobile_push,
            SettingKey::PushSound => &mut self.push_notifications.sound_alerts,
            SettingKey::PrivacyProfileVisibility => &mut self.privacy_settings.profile_visibility,
            SettingKey::PrivacyActivityStatus => &mut self.privacy_settings.activity_status,
            SettingKey::PrivacyAnalytics => &mut self.privacy_settings.analytics_tracking,
        }
    }

    /// The patch that flips one switch, carrying the rest of its group
    /// unchanged.
    pub fn patch_for(&self, key: SettingKey, value: bool) -> SettingsPatch {
        let mut next = self.clone();
        *next.flag_mut(key) = value;
        match key {
            SettingKey::EmailTaskUpdates
            | SettingKey::EmailTeamMentions
            | SettingKey::EmailDeadlineReminders => SettingsPatch {
                email_notifications: Some(next.email_notifications),
                ..Default::default()
            },
            SettingKey::PushBrowser | SettingKey::PushMobile | SettingKey::PushSound => {
                SettingsPatch {
                    push_notifications: Some(next.push_notifications),
                    ..Default::default()
                }
            }
            SettingKey::PrivacyProfileVisibility
            | SettingKey::PrivacyActivityStatus
            | SettingKey::PrivacyAnalytics => SettingsPatch {
                privacy_settings: Some(next.privacy_settings),
                ..Default::default()
            },
        }
    }

    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(email) = patch.email_notifications {
            self.email_notifications = email;
        }
        if let Some(push) = patch.push_notifications {
            self.push_notifications = push;
        }
        if let Some(privacy) = patch.privacy_settings {
            self.privacy_settings = privacy;
        }
    }
}

// ── Session & notices ─────────────────────────────────────────────────

/// Authenticated caller. Every store operation takes one explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub user_id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient user-visible message (the toast of a UI).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Write docs".into(),
            description: Some("first draft".into()),
            priority: Priority::High,
            assignee: Some("sam".into()),
            status: 0,
            created_at: Utc::now(),
            owner_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_column_status_codes() {
        for (code, column) in ColumnId::ALL.iter().enumerate() {
            assert_eq!(column.status_code(), code as i32);
            assert_eq!(ColumnId::from_status(code as i32), Some(*column));
        }
        assert_eq!(ColumnId::from_status(4), None);
        assert_eq!(ColumnId::from_status(-1), None);
    }

    #[test]
    fn test_column_from_str() {
        assert_eq!("inprogress".parse::<ColumnId>(), Ok(ColumnId::InProgress));
        assert!("in_progress".parse::<ColumnId>().is_err());
        assert_eq!(ColumnId::Review.title(), "Review");
    }

    #[test]
    fn test_priority_codes() {
        assert_eq!(Priority::Low.code(), 1);
        assert_eq!(Priority::Medium.code(), 2);
        assert_eq!(Priority::High.code(), 3);
        for p in Priority::ALL {
            assert_eq!(Priority::from_code(p.code()), Some(p));
        }
        assert_eq!(Priority::from_code(0), None);
        assert_eq!(Priority::from_code(7), None);
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
    }

    #[test]
    fn test_task_apply_patch_keeps_identity() {
        let mut task = sample_task();
        let before = task.clone();
        task.apply(&TaskPatch {
            title: Some("  Ship it ".into()),
            assignee: Some("   ".into()),
            column: Some(ColumnId::Done),
            ..Default::default()
        });
        assert_eq!(task.title, "Ship it");
        assert_eq!(task.assignee, None);
        assert_eq!(task.status, 3);
        assert_eq!(task.description, before.description);
        assert_eq!(task.priority, before.priority);
        assert_eq!(task.id, before.id);
        assert_eq!(task.created_at, before.created_at);
        assert_eq!(task.owner_id, before.owner_id);
    }

    #[test]
    fn test_task_patch_is_empty() {
        assert!(TaskPatch::default().is_empty());
        let patch = TaskPatch {
            priority: Some(Priority::Low),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_new_task_json_defaults() {
        let task: NewTask = serde_json::from_str(r#"{"title": "Plan sprint"}"#).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.column, ColumnId::Todo);
        assert!(task.description.is_none());
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let mut session = Session {
            access_token: "tok".into(),
            user_id: Uuid::new_v4(),
            email: None,
            expires_at: None,
        };
        assert!(!session.is_expired(now));
        session.expires_at = Some(now - chrono::Duration::seconds(1));
        assert!(session.is_expired(now));
    }

    #[test]
    fn test_member_role_round_trip_names() {
        for role in MemberRole::ALL {
            assert_eq!(role.as_str().parse::<MemberRole>(), Ok(role));
        }
        assert_eq!(MemberRole::default(), MemberRole::Member);
    }

    #[test]
    fn test_event_priority_falls_back_to_medium() {
        let mut event = Event {
            id: Uuid::new_v4(),
            title: "Standup".into(),
            description: None,
            start_date: Utc::now(),
            end_date: None,
            priority: Some("high".into()),
            user_id: Uuid::new_v4(),
            created_at: None,
        };
        assert_eq!(event.priority(), Priority::High);
        event.priority = Some("urgent".into());
        assert_eq!(event.priority(), Priority::Medium);
        event.priority = None;
        assert_eq!(event.priority(), Priority::Medium);
        assert_eq!(event.ends_at(), event.start_date);
    }

    #[test]
    fn test_settings_null_columns_read_as_defaults() {
        let user = Uuid::new_v4();
        let raw = format!(
            r#"{{"id": "{}", "user_id": "{}", "email_notifications": null,
                "push_notifications": {{"mobilePush": true}}, "created_at": null}}"#,
            Uuid::new_v4(),
            user
        );
        let settings: UserSettings = serde_json::from_str(&raw).unwrap();
        assert_eq!(settings.email_notifications, EmailNotifications::default());
        assert!(settings.push_notifications.mobile_push);
        assert!(settings.push_notifications.browser_push);
        assert!(!settings.privacy_settings.analytics_tracking);
    }

    #[test]
    fn test_settings_patch_for_keeps_rest_of_group() {
        let settings = UserSettings::defaults_for(Uuid::new_v4());
        let patch = settings.patch_for(SettingKey::PushMobile, true);
        assert!(patch.email_notifications.is_none());
        assert!(patch.privacy_settings.is_none());
        let push = patch.push_notifications.unwrap();
        assert!(push.mobile_push);
        assert!(push.browser_push);
        assert!(push.sound_alerts);

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({
            "push_notifications": {"browserPush": true, "mobilePush": true, "soundAlerts": true}
        }));

        let mut updated = settings.clone();
        updated.apply(&patch);
        assert!(updated.get(SettingKey::PushMobile));
        assert!(!settings.get(SettingKey::PushMobile));
    }

    #[test]
    fn test_setting_key_names() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>(), Ok(key));
        }
        assert_eq!("PUSH.Sound".parse::<SettingKey>(), Ok(SettingKey::PushSound));
        assert!("push".parse::<SettingKey>().is_err());
    }

    #[test]
    fn test_profile_patch_clears_blank_fields() {
        let mut profile = Profile {
            id: Uuid::new_v4(),
            email: Some("ada@example.com".into()),
            full_name: Some("Ada".into()),
            avatar_url: Some("https://img.example/a.png".into()),
        };
        let patch = ProfilePatch {
            full_name: Some(" Ada Lovelace ".into()),
            avatar_url: Some("".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        profile.apply(&patch);
        assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.avatar_url, None);
        assert_eq!(profile.email.as_deref(), Some("ada@example.com"));
        assert!(ProfilePatch::default().is_empty());
    }
}
