use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum HttpStoreError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("remote URL cannot be a base: {0}")]
    InvalidRemote(String),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
}
