use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeadlessError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Headless service error ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, HeadlessError>;
