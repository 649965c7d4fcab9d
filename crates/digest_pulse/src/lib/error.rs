#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid ISO-8601 duration: {0}")]
    InvalidDuration(String),
}
