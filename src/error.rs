use thiserror::Error;

/// Startup configuration problems. Any of these aborts the process before the
/// bot connects to anything.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

/// Problems loading the question file at startup.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read the questions file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse the questions file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("the question bank is empty")]
    Empty,
    #[error("question {question}: correct answer {correct} is out of range for {options} options")]
    BadCorrectIndex {
        question: usize,
        correct: usize,
        options: usize,
    },
}

/// Failures talking to durable storage. Fatal during schema setup at startup,
/// otherwise surfaced to the user as a generic "try again" reply.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Everything that can go wrong while answering a quiz. The first two are
/// user-input problems and get a corrective chat reply; storage failures are
/// logged and get the generic failure reply.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("no quiz in progress")]
    NoActiveSession,
    #[error("option {chosen} is out of range, the question has {available} options")]
    InvalidOption { chosen: usize, available: usize },
    #[error(transparent)]
    Storage(#[from] StorageError),
}
