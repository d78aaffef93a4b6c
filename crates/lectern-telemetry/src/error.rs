use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("resource probe failed: {0}")]
    Probe(String),

    #[error("resource probe task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("failed to persist sample: {0}")]
    Store(#[from] sqlx::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("metrics hub has stopped")]
    Closed,
}
