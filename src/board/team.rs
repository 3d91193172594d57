use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{error, info, warn};

use super::backend::{MemberInsert, TeamBackend};
use super::functions::{EdgeFunctions, InvitationRequest};
use super::models::{Invite, Notice, Session, TeamMember};
use crate::errors::BoardError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Status given to freshly invited members.
pub const PENDING: &str = "pending";

/// `local@domain.tld` with no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Client-side checks for an invite; no remote call is made when this fails.
pub fn validate_invite(invite: &Invite) -> Result<(), BoardError> {
    let email = invite.email.trim();
    if email.is_empty() || invite.full_name.trim().is_empty() {
        return Err(BoardError::validation("Email and full name are required"));
    }
    if !is_valid_email(email) {
        return Err(BoardError::validation(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(())
}

/// The team directory for one signed-in user.
pub struct TeamStore {
    backend: Arc<dyn TeamBackend>,
    functions: Arc<dyn EdgeFunctions>,
    members: Vec<TeamMember>,
    notices: Vec<Notice>,
}

impl TeamStore {
    pub fn new(backend: Arc<dyn TeamBackend>, functions: Arc<dyn EdgeFunctions>) -> Self {
        Self {
            backend,
            functions,
            members: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub async fn load(&mut self, session: &Session) -> Result<&[TeamMember], BoardError> {
        match self.backend.select_members(session).await {
            Ok(members) => {
                self.members = members;
                Ok(&self.members)
            }
            Err(e) => {
                error!(error = %e, "failed to load team members");
                self.notices
                    .push(Notice::error("Error", "Failed to load team members"));
                Err(BoardError::Fetch {
                    what: "team members",
                    source: e,
                })
            }
        }
    }

    /// Record a pending member, then email them. The email is best-effort:
    /// a failure is logged and the member stays recorded.
    pub async fn invite(
        &mut self,
        session: &Session,
        invite: Invite,
    ) -> Result<TeamMember, BoardError> {
        validate_invite(&invite)?;
        let email = invite.email.trim().to_string();
        let full_name = invite.full_name.trim().to_string();

        let row = MemberInsert {
            email: email.clone(),
            full_name: full_name.clone(),
            role: invite.role.as_str().to_string(),
            status: PENDING.to_string(),
            invited_by: session.user_id,
        };
        let member = match self.backend.insert_member(session, row).await {
            Ok(member) => member,
            Err(e) => {
                error!(email = %email, error = %e, "failed to invite team member");
                self.notices.push(Notice::error("Error", e.to_string()));
                return Err(BoardError::Invite(e));
            }
        };

        let request = InvitationRequest {
            email: email.clone(),
            full_name,
            role: invite.role.as_str().to_string(),
            inviter_name: session
                .email
                .clone()
                .unwrap_or_else(|| "Someone".to_string()),
        };
        match self.functions.send_invitation(session, &request).await {
            Ok(status) => info!(email = %email, %status, "invitation email sent"),
            Err(e) => warn!(
                email = %email,
                error = %e,
                "failed to send invitation email, but member was added"
            ),
        }

        self.notices.push(Notice::info(
            "Invitation sent!",
            format!("Invitation sent to {}", email),
        ));
        let _ = self.load(session).await;
        Ok(member)
    }
}
