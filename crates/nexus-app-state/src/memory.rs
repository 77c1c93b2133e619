use nexus_api_client::{
    ApiClient, DEFAULT_SEARCH_LIMIT, IngestMemoryRequest, MemoryDocument, MemorySearchResult,
};

use crate::errors::PanelError;

/// Source reference recorded for documents ingested by an operator.
pub const UI_SOURCE_REF: &str = "ui";

/// Ingests a document typed by the operator. Blank title or content is
/// ignored and returns `None`.
pub async fn ingest_document(
    client: &ApiClient,
    title: &str,
    content: &str,
) -> Result<Option<MemoryDocument>, PanelError> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() || content.is_empty() {
        return Ok(None);
    }
    let request = IngestMemoryRequest {
        title: title.to_string(),
        content: content.to_string(),
        source_ref: UI_SOURCE_REF.to_string(),
    };
    Ok(Some(client.ingest_memory(&request).await?))
}

/// Searches with the trimmed query; a blank query is ignored and returns
/// `None` so callers keep their previous results.
pub async fn search(
    client: &ApiClient,
    query: &str,
) -> Result<Option<Vec<MemorySearchResult>>, PanelError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        client.search_memory(query, Some(DEFAULT_SEARCH_LIMIT)).await?,
    ))
}
