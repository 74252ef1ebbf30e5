use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    UsageLog(#[from] UsageLogError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rig description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate room name: {name}")]
    DuplicateRoom { name: String },

    #[error("Minimap copy refers to unknown room: {name}")]
    UnknownRoom { name: String },

    #[error("Duplicate redirector name: {name}")]
    DuplicateRedirector { name: String },
}

#[derive(Error, Debug)]
pub enum UsageLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(
        "A usage logger is already installed ({}); {} was not used",
        existing.display(),
        rejected.display()
    )]
    AlreadyInstalled { existing: PathBuf, rejected: PathBuf },
}
