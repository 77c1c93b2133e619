#![cfg_attr(test, allow(clippy::expect_used))]

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

mod types;

pub use reqwest::StatusCode;
pub use types::*;

pub const API_PREFIX: &str = "/api/v1";
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub token: String,
}

impl ApiClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

/// Authenticated JSON client for the Nexus REST surface.
///
/// Each call is a single round trip: no retries, no timeout, no caching.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("request failed: {message}")]
    Request { message: String },
    #[error("response read failed: {message}")]
    Read { message: String },
    #[error("{message}")]
    Http { status: StatusCode, message: String },
    #[error("response decode failed: {message}")]
    Decode { message: String },
    #[error("request encode failed: {message}")]
    Encode { message: String },
    #[error("invalid header value for {name}")]
    InvalidHeader { name: String },
}

impl ApiClientError {
    /// Numeric HTTP status for failures reported by the server.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct RequestOptions {
    method: Method,
    body: Option<Vec<u8>>,
    // Merged over the defaults; every public operation currently leaves this empty.
    headers: HeaderMap,
}

impl RequestOptions {
    fn with_json<B>(method: Method, payload: &B) -> Result<Self, ApiClientError>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload).map_err(|error| ApiClientError::Encode {
            message: error.to_string(),
        })?;
        Ok(Self {
            method,
            body: Some(body),
            headers: HeaderMap::new(),
        })
    }
}

impl ApiClient {
    #[must_use]
    pub fn new(config: ApiClientConfig) -> Self {
        Self {
            base_url: normalize_base_url(&config.base_url),
            token: config.token,
            http: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[must_use]
    pub fn me_path() -> String {
        format!("{API_PREFIX}/me")
    }

    #[must_use]
    pub fn health_path() -> String {
        format!("{API_PREFIX}/health")
    }

    #[must_use]
    pub fn ready_path() -> String {
        format!("{API_PREFIX}/ready")
    }

    #[must_use]
    pub fn agent_status_path() -> String {
        format!("{API_PREFIX}/agent/status")
    }

    #[must_use]
    pub fn boards_path() -> String {
        format!("{API_PREFIX}/boards")
    }

    #[must_use]
    pub fn board_path(board_id: &str) -> String {
        format!("{API_PREFIX}/boards/{board_id}")
    }

    #[must_use]
    pub fn board_tasks_path(board_id: &str) -> String {
        format!("{API_PREFIX}/boards/{board_id}/tasks")
    }

    #[must_use]
    pub fn tasks_path() -> String {
        format!("{API_PREFIX}/tasks")
    }

    #[must_use]
    pub fn task_path(task_id: &str) -> String {
        format!("{API_PREFIX}/tasks/{task_id}")
    }

    #[must_use]
    pub fn task_move_path(task_id: &str) -> String {
        format!("{API_PREFIX}/tasks/{task_id}/move")
    }

    #[must_use]
    pub fn task_history_path(task_id: &str) -> String {
        format!("{API_PREFIX}/tasks/{task_id}/history")
    }

    #[must_use]
    pub fn chat_sessions_path() -> String {
        format!("{API_PREFIX}/chat/sessions")
    }

    #[must_use]
    pub fn chat_messages_path(session_id: &str) -> String {
        format!("{API_PREFIX}/chat/sessions/{session_id}/messages")
    }

    #[must_use]
    pub fn memory_documents_path() -> String {
        format!("{API_PREFIX}/memory/documents")
    }

    #[must_use]
    pub fn memory_document_path(document_id: &str) -> String {
        format!("{API_PREFIX}/memory/documents/{document_id}")
    }

    #[must_use]
    pub fn memory_search_path() -> String {
        format!("{API_PREFIX}/memory/search")
    }

    pub async fn get_me(&self) -> Result<CurrentUser, ApiClientError> {
        self.get_json(&Self::me_path()).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiClientError> {
        self.get_json(&Self::health_path()).await
    }

    pub async fn ready(&self) -> Result<HealthStatus, ApiClientError> {
        self.get_json(&Self::ready_path()).await
    }

    pub async fn agent_status(&self) -> Result<AgentStatus, ApiClientError> {
        self.get_json(&Self::agent_status_path()).await
    }

    pub async fn list_boards(&self) -> Result<Vec<Board>, ApiClientError> {
        self.get_json(&Self::boards_path()).await
    }

    pub async fn create_board(&self, name: &str) -> Result<Board, ApiClientError> {
        let payload = BoardNameRequest {
            name: name.to_string(),
        };
        self.send_json(Method::POST, &Self::boards_path(), &payload)
            .await
    }

    pub async fn rename_board(&self, board_id: &str, name: &str) -> Result<Board, ApiClientError> {
        let payload = BoardNameRequest {
            name: name.to_string(),
        };
        self.send_json(Method::PATCH, &Self::board_path(board_id), &payload)
            .await
    }

    pub async fn get_board(&self, board_id: &str) -> Result<BoardDetail, ApiClientError> {
        self.get_json(&Self::board_path(board_id)).await
    }

    pub async fn list_tasks(&self, board_id: &str) -> Result<Vec<Task>, ApiClientError> {
        self.get_json(&Self::board_tasks_path(board_id)).await
    }

    pub async fn create_task(&self, payload: &CreateTaskRequest) -> Result<Task, ApiClientError> {
        self.send_json(Method::POST, &Self::tasks_path(), payload)
            .await
    }

    pub async fn update_task(
        &self,
        task_id: &str,
        payload: &UpdateTaskRequest,
    ) -> Result<Task, ApiClientError> {
        self.send_json(Method::PATCH, &Self::task_path(task_id), payload)
            .await
    }

    pub async fn move_task(
        &self,
        task_id: &str,
        payload: &MoveTaskRequest,
    ) -> Result<Task, ApiClientError> {
        self.send_json(Method::POST, &Self::task_move_path(task_id), payload)
            .await
    }

    pub async fn task_history(&self, task_id: &str) -> Result<Vec<TaskEvent>, ApiClientError> {
        self.get_json(&Self::task_history_path(task_id)).await
    }

    pub async fn create_chat_session(&self, title: &str) -> Result<ChatSession, ApiClientError> {
        let payload = ChatSessionRequest {
            title: title.to_string(),
        };
        self.send_json(Method::POST, &Self::chat_sessions_path(), &payload)
            .await
    }

    pub async fn list_chat_sessions(&self) -> Result<Vec<ChatSession>, ApiClientError> {
        self.get_json(&Self::chat_sessions_path()).await
    }

    pub async fn send_chat_message(
        &self,
        session_id: &str,
        content: &str,
    ) -> Result<ChatMessage, ApiClientError> {
        let payload = ChatMessageRequest {
            role: ChatRole::User,
            content: content.to_string(),
        };
        self.send_json(
            Method::POST,
            &Self::chat_messages_path(session_id),
            &payload,
        )
        .await
    }

    pub async fn list_chat_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, ApiClientError> {
        self.get_json(&Self::chat_messages_path(session_id)).await
    }

    pub async fn ingest_memory(
        &self,
        payload: &IngestMemoryRequest,
    ) -> Result<MemoryDocument, ApiClientError> {
        self.send_json(Method::POST, &Self::memory_documents_path(), payload)
            .await
    }

    /// Searches memory chunks; `limit` falls back to [`DEFAULT_SEARCH_LIMIT`].
    pub async fn search_memory(
        &self,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<MemorySearchResult>, ApiClientError> {
        let payload = MemorySearchRequest {
            query: query.to_string(),
            limit: limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        };
        self.send_json(Method::POST, &Self::memory_search_path(), &payload)
            .await
    }

    pub async fn get_memory_document(
        &self,
        document_id: &str,
    ) -> Result<MemoryDocumentDetail, ApiClientError> {
        self.get_json(&Self::memory_document_path(document_id))
            .await
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        self.request(path, RequestOptions::default()).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, payload: &B) -> Result<T, ApiClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let options = RequestOptions::with_json(method, payload)?;
        self.request(path, options).await
    }

    async fn request<T>(&self, path: &str, options: RequestOptions) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        let RequestOptions {
            method,
            body,
            headers,
        } = options;
        let request_id = format!("req_{}", Uuid::new_v4().simple());
        let headers = merge_headers(default_headers(&self.token, &request_id)?, headers);

        tracing::debug!(%method, path, request_id = %request_id, "nexus api request");

        let mut request = self
            .http
            .request(method.clone(), self.endpoint(path))
            .headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|error| ApiClientError::Request {
                message: error.to_string(),
            })?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| ApiClientError::Read {
                message: error.to_string(),
            })?;

        if !status.is_success() {
            tracing::warn!(%method, path, status = status.as_u16(), "nexus api request rejected");
            return Err(format_http_error(status, &bytes));
        }

        serde_json::from_slice::<T>(&bytes).map_err(|error| ApiClientError::Decode {
            message: error.to_string(),
        })
    }
}

/// Maps a non-success response into [`ApiClientError::Http`], using the
/// status reason phrase when the body is empty.
pub fn format_http_error(status: StatusCode, body: &[u8]) -> ApiClientError {
    let text = String::from_utf8_lossy(body).into_owned();
    let message = if text.is_empty() {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_str().to_string())
    } else {
        text
    };
    ApiClientError::Http { status, message }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url
        .strip_suffix('/')
        .unwrap_or(base_url)
        .to_string()
}

fn default_headers(token: &str, request_id: &str) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let bearer = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        ApiClientError::InvalidHeader {
            name: AUTHORIZATION.to_string(),
        }
    })?;
    headers.insert(AUTHORIZATION, bearer);
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    Ok(headers)
}

// Caller headers replace defaults of the same name.
fn merge_headers(mut defaults: HeaderMap, overrides: HeaderMap) -> HeaderMap {
    defaults.extend(overrides);
    defaults
}
