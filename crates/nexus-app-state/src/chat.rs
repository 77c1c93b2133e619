use nexus_api_client::{ApiClient, ChatMessage, ChatSession};

use crate::agent_status::ActivityState;
use crate::errors::PanelError;

pub const PRIMARY_SESSION_TITLE: &str = "Primary Session";

/// Session list with the selected session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSessions {
    pub sessions: Vec<ChatSession>,
    pub active_session_id: Option<String>,
}

impl ChatSessions {
    /// Lists sessions and selects the first; when none exist, creates
    /// `Session 1` and selects it.
    pub async fn load(client: &ApiClient) -> Result<Self, PanelError> {
        let sessions = client.list_chat_sessions().await?;
        if let Some(first) = sessions.first() {
            let active_session_id = Some(first.id.clone());
            return Ok(Self {
                sessions,
                active_session_id,
            });
        }

        let mut loaded = Self::default();
        loaded.create_session(client).await?;
        Ok(loaded)
    }

    #[must_use]
    pub fn next_session_title(&self) -> String {
        format!("Session {}", self.sessions.len() + 1)
    }

    /// Creates the next numbered session, puts it first and selects it.
    pub async fn create_session(&mut self, client: &ApiClient) -> Result<ChatSession, PanelError> {
        let created = client
            .create_chat_session(&self.next_session_title())
            .await?;
        self.sessions.insert(0, created.clone());
        self.active_session_id = Some(created.id.clone());
        Ok(created)
    }

    /// Selects a known session; unknown ids leave the selection unchanged.
    pub fn select(&mut self, session_id: &str) -> bool {
        if self.sessions.iter().any(|session| session.id == session_id) {
            self.active_session_id = Some(session_id.to_string());
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn active(&self) -> Option<&ChatSession> {
        let active_id = self.active_session_id.as_deref()?;
        self.sessions.iter().find(|session| session.id == active_id)
    }
}

/// Message log for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatConversation {
    pub session_id: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl ChatConversation {
    /// Opens `session_id`, or with no session either creates
    /// [`PRIMARY_SESSION_TITLE`] (`auto_create`) or stays empty. A blank id
    /// counts as no session.
    pub async fn open(
        client: &ApiClient,
        session_id: Option<&str>,
        auto_create: bool,
    ) -> Result<Self, PanelError> {
        let session_id = session_id.filter(|id| !id.trim().is_empty());
        if let Some(session_id) = session_id {
            let messages = client.list_chat_messages(session_id).await?;
            return Ok(Self {
                session_id: Some(session_id.to_string()),
                messages,
            });
        }

        if !auto_create {
            return Ok(Self::default());
        }

        let created = client.create_chat_session(PRIMARY_SESSION_TITLE).await?;
        let messages = client.list_chat_messages(&created.id).await?;
        Ok(Self {
            session_id: Some(created.id),
            messages,
        })
    }

    /// Posts the trimmed input and reloads the log. Blank input or a missing
    /// session is ignored and returns `false`. `on_activity` sees
    /// [`ActivityState::Working`] before the post and
    /// [`ActivityState::Idle`] afterwards, success or not.
    pub async fn send(
        &mut self,
        client: &ApiClient,
        input: &str,
        mut on_activity: impl FnMut(ActivityState),
    ) -> Result<bool, PanelError> {
        let content = input.trim();
        let Some(session_id) = self.session_id.clone() else {
            return Ok(false);
        };
        if content.is_empty() {
            return Ok(false);
        }

        on_activity(ActivityState::Working);
        let outcome = async {
            client.send_chat_message(&session_id, content).await?;
            client.list_chat_messages(&session_id).await
        }
        .await;
        on_activity(ActivityState::Idle);

        self.messages = outcome?;
        Ok(true)
    }
}
