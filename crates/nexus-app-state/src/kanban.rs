use std::collections::HashMap;

use nexus_api_client::{
    ApiClient, ApiClientError, Board, BoardDetail, Column, CreateTaskRequest, MoveTaskRequest,
    Task, TaskPriority, TaskStatus, UpdateTaskRequest,
};

use crate::errors::PanelError;

pub const DEFAULT_BOARD_NAME: &str = "Default Board";

/// Lanes the composer files new tasks into, in order of preference.
pub const COMPOSER_TARGETS: [TaskStatus; 2] = [TaskStatus::Todo, TaskStatus::Backlog];

/// The first listed board, creating [`DEFAULT_BOARD_NAME`] when there is none.
pub async fn resolve_active_board(client: &ApiClient) -> Result<Board, ApiClientError> {
    let boards = client.list_boards().await?;
    match boards.into_iter().next() {
        Some(board) => Ok(board),
        None => {
            tracing::info!(name = DEFAULT_BOARD_NAME, "no boards yet; creating default");
            client.create_board(DEFAULT_BOARD_NAME).await
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
}

impl TaskDraft {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn into_request(self, board_id: &str, column: &Column) -> CreateTaskRequest {
        CreateTaskRequest {
            board_id: board_id.to_string(),
            column_id: column.id.clone(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            priority: self.priority,
            status: column.key,
        }
    }
}

/// Loaded board with its tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanbanBoard {
    pub board: BoardDetail,
    pub tasks: Vec<Task>,
}

impl KanbanBoard {
    pub async fn load(client: &ApiClient) -> Result<Self, PanelError> {
        let active = resolve_active_board(client).await?;
        let board = client.get_board(&active.id).await?;
        let tasks = client.list_tasks(&active.id).await?;
        Ok(Self { board, tasks })
    }

    /// Tasks keyed by column id, each list in load order.
    #[must_use]
    pub fn tasks_by_column(&self) -> HashMap<&str, Vec<&Task>> {
        let mut grouped: HashMap<&str, Vec<&Task>> = HashMap::new();
        for task in &self.tasks {
            grouped.entry(task.column_id.as_str()).or_default().push(task);
        }
        grouped
    }

    #[must_use]
    pub fn column_count(&self, column_id: &str) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.column_id == column_id)
            .count()
    }

    /// Creates `draft` in the `todo` lane. Returns `None` without calling the
    /// API when the board has no such lane or the title is blank.
    pub async fn add_task(
        &mut self,
        client: &ApiClient,
        draft: TaskDraft,
    ) -> Result<Option<Task>, PanelError> {
        let Some(column) = self.board.column_for_status(TaskStatus::Todo) else {
            return Ok(None);
        };
        if draft.title.trim().is_empty() {
            return Ok(None);
        }
        let request = draft.into_request(&self.board.id, column);
        let created = client.create_task(&request).await?;
        self.tasks.push(created.clone());
        Ok(Some(created))
    }

    /// Moves a task into the lane for `status`; no-op when the board has no
    /// such lane.
    pub async fn move_task(
        &mut self,
        client: &ApiClient,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Option<Task>, PanelError> {
        let Some(column) = self.board.column_for_status(status) else {
            return Ok(None);
        };
        let request = MoveTaskRequest {
            column_id: column.id.clone(),
            status,
        };
        let updated = client.move_task(task_id, &request).await?;
        self.replace_task(updated.clone());
        Ok(Some(updated))
    }

    pub fn replace_task(&mut self, updated: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|task| task.id == updated.id) {
            *slot = updated;
        }
    }
}

#[must_use]
pub fn composer_target(board: &BoardDetail) -> Option<&Column> {
    COMPOSER_TARGETS
        .iter()
        .find_map(|status| board.column_for_status(*status))
}

/// Files a new task on the active board without loading the full kanban.
/// Returns `None` for a blank title.
pub async fn compose_task(client: &ApiClient, draft: TaskDraft) -> Result<Option<Task>, PanelError> {
    if draft.title.trim().is_empty() {
        return Ok(None);
    }
    let active = resolve_active_board(client).await?;
    let detail = client.get_board(&active.id).await?;
    let column = composer_target(&detail).ok_or(PanelError::BacklogLaneUnavailable)?;
    let request = draft.into_request(&active.id, column);
    let created = client.create_task(&request).await?;
    Ok(Some(created))
}

/// Editable copy of a task for the detail dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEdit {
    original: Task,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
}

impl TaskEdit {
    #[must_use]
    pub fn new(task: Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            status: task.status,
            original: task,
        }
    }

    #[must_use]
    pub fn original(&self) -> &Task {
        &self.original
    }

    #[must_use]
    pub fn fields_dirty(&self) -> bool {
        self.title != self.original.title
            || self.description != self.original.description
            || self.priority != self.original.priority
    }

    #[must_use]
    pub fn status_changed(&self) -> bool {
        self.status != self.original.status
    }

    #[must_use]
    pub fn can_save(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Patches changed fields, then moves the task when its status changed
    /// and `board` has a lane for the new status. Returns the final task.
    pub async fn save(&self, client: &ApiClient, board: &BoardDetail) -> Result<Task, PanelError> {
        if !self.can_save() {
            return Err(PanelError::MissingTitle);
        }

        let mut updated = self.original.clone();
        if self.fields_dirty() {
            let patch = UpdateTaskRequest {
                title: Some(self.title.trim().to_string()),
                description: Some(self.description.trim().to_string()),
                priority: Some(self.priority),
            };
            updated = client.update_task(&self.original.id, &patch).await?;
        }

        if self.status_changed()
            && let Some(column) = board.column_for_status(self.status)
        {
            let request = MoveTaskRequest {
                column_id: column.id.clone(),
                status: self.status,
            };
            updated = client.move_task(&updated.id, &request).await?;
        }

        Ok(updated)
    }
}
