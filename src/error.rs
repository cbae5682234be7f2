use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{url} returned {status}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{parent} id is empty, {entity} cannot be created")]
    MissingParent {
        entity: &'static str,
        parent: &'static str,
    },

    #[error("not authenticated, call login first")]
    MissingToken,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::NotFound { .. } => true,
            ApiError::Http(e) => e.status().is_some_and(|s| s.as_u16() == 404),
            _ => false,
        }
    }
}

/// Stored without the URL: Trello credentials live in its query string.
impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Http(e.without_url())
    }
}

/// Endpoint of a response with the query (and any credentials in it) removed.
fn redacted_url(response: &reqwest::Response) -> String {
    let mut url = response.url().clone();
    url.set_query(None);
    url.to_string()
}

/// Map a non-success response to an `ApiError`, keeping the body for the log.
pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = redacted_url(&response);
    if status.as_u16() == 404 {
        return Err(ApiError::NotFound { url });
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        url,
        body,
    })
}

/// Creating a child under an empty parent id is a sequencing bug, not a
/// recoverable condition.
pub fn require_parent(
    id: &str,
    entity: &'static str,
    parent: &'static str,
) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::MissingParent { entity, parent });
    }
    Ok(())
}
