use thiserror::Error;

pub type CiteResult<T> = Result<T, CiteError>;

#[derive(Debug, Error)]
pub enum CiteError {
    #[error("invalid citation pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
}
