use thiserror::Error;

#[derive(Error, Debug)]
pub enum AulasError {
    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error("M3u8 fetch error")]
    M3u8FetchError,

    #[error("Invalid m3u8 file: {0}")]
    M3u8ParseError(String),

    #[error("Empty playlist: {0}")]
    EmptyPlaylist(String),

    #[error("Invalid variant choice: {0}")]
    InvalidVariantChoice(usize),

    #[error("Remux failed: {0}")]
    RemuxError(String),

    #[error("Invalid header {0}")]
    InvalidHeader(String),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    MissingExecutable(#[from] which::Error),
}

impl AulasError {
    /// Whether the error means the manifest of an origin is unusable.
    pub fn is_manifest_error(&self) -> bool {
        matches!(
            self,
            Self::M3u8FetchError
                | Self::M3u8ParseError(_)
                | Self::EmptyPlaylist(_)
                | Self::InvalidVariantChoice(_)
        )
    }
}

pub type AulasResult<T> = Result<T, AulasError>;
