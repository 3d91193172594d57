//! Profile and notification/privacy settings for the signed-in user.
//!
//! Settings are fetch-or-create: a user without a `user_settings` row gets
//! one with the defaults on first load. Updates are merged into the cached
//! copy once the backend accepts them.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{error, info};

use super::backend::AccountBackend;
use super::models::{Notice, Profile, ProfilePatch, Session, SettingKey, SettingsPatch, UserSettings};
use super::team::is_valid_email;
use crate::errors::BoardError;

pub struct AccountStore {
    backend: Arc<dyn AccountBackend>,
    profile: Option<Profile>,
    settings: Option<UserSettings>,
    notices: Vec<Notice>,
}

impl AccountStore {
    pub fn new(backend: Arc<dyn AccountBackend>) -> Self {
        Self {
            backend,
            profile: None,
            settings: None,
            notices: Vec::new(),
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn settings(&self) -> Option<&UserSettings> {
        self.settings.as_ref()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub async fn load_profile(&mut self, session: &Session) -> Result<&Profile, BoardError> {
        let result = match self.backend.select_profile(session).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(anyhow!("no profile for user {}", session.user_id)),
            Err(e) => Err(e),
        };
        match result {
            Ok(profile) => Ok(&*self.profile.insert(profile)),
            Err(e) => {
                error!(error = %e, "failed to load profile");
                self.notices.push(Notice::error("Error", "Failed to load profile"));
                Err(BoardError::Fetch {
                    what: "profile",
                    source: e,
                })
            }
        }
    }

    pub async fn update_profile(
        &mut self,
        session: &Session,
        patch: ProfilePatch,
    ) -> Result<&Profile, BoardError> {
        if patch.is_empty() {
            return Err(BoardError::validation("No profile fields to update"));
        }
        let email = patch.email.as_deref().map(str::trim).unwrap_or_default();
        if !email.is_empty() && !is_valid_email(email) {
            return Err(BoardError::validation(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        let result = match self.backend.update_profile(session, &patch).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(anyhow!("no profile for user {}", session.user_id)),
            Err(e) => Err(e),
        };
        match result {
            Ok(profile) => {
                info!(user_id = %session.user_id, "profile updated");
                self.notices
                    .push(Notice::info("Profile updated", "Your profile has been saved"));
                Ok(&*self.profile.insert(profile))
            }
            Err(e) => {
                error!(error = %e, "failed to update profile");
                self.notices
                    .push(Notice::error("Error", "Failed to update profile"));
                Err(BoardError::Save {
                    what: "profile",
                    source: e,
                })
            }
        }
    }

    /// The user's settings, creating the default row when none exists.
    pub async fn load_settings(&mut self, session: &Session) -> Result<&UserSettings, BoardError> {
        match self.fetch_or_create(session).await {
            Ok(settings) => Ok(&*self.settings.insert(settings)),
            Err(e) => {
                error!(error = %e, "failed to load settings");
                self.notices
                    .push(Notice::error("Error", "Failed to load settings"));
                Err(BoardError::Fetch {
                    what: "settings",
                    source: e,
                })
            }
        }
    }

    async fn fetch_or_create(&self, session: &Session) -> anyhow::Result<UserSettings> {
        if let Some(settings) = self.backend.select_settings(session).await? {
            return Ok(settings);
        }
        let defaults = UserSettings::defaults_for(session.user_id);
        let created = self.backend.insert_settings(session, &defaults).await?;
        info!(user_id = %session.user_id, "created default settings");
        Ok(created)
    }

    /// Write a partial update. Settings are loaded first when they have not
    /// been yet, so the row exists.
    pub async fn update_settings(
        &mut self,
        session: &Session,
        patch: SettingsPatch,
    ) -> Result<&UserSettings, BoardError> {
        if patch.is_empty() {
            return Err(BoardError::validation("No settings to update"));
        }
        if self.settings.is_none() {
            self.load_settings(session).await?;
        }

        let result = match self.backend.update_settings(session, &patch).await {
            Ok(Some(settings)) => Ok(settings),
            Ok(None) => Err(anyhow!("no settings for user {}", session.user_id)),
            Err(e) => Err(e),
        };
        match result {
            Ok(settings) => {
                info!(user_id = %session.user_id, "settings updated");
                self.notices.push(Notice::info(
                    "Settings updated",
                    "Your preferences have been saved",
                ));
                Ok(&*self.settings.insert(settings))
            }
            Err(e) => {
                error!(error = %e, "failed to update settings");
                self.notices
                    .push(Notice::error("Error", "Failed to update settings"));
                Err(BoardError::Save {
                    what: "settings",
                    source: e,
                })
            }
        }
    }

    /// Flip one switch, leaving the rest of its group as it is.
    pub async fn set(
        &mut self,
        session: &Session,
        key: SettingKey,
        value: bool,
    ) -> Result<&UserSettings, BoardError> {
        if self.settings.is_none() {
            self.load_settings(session).await?;
        }
        let patch = self
            .settings
            .as_ref()
            .map(|settings| settings.patch_for(key, value))
            .ok_or_else(|| BoardError::validation("Settings are not loaded"))?;
        self.update_settings(session, patch).await
    }
}
