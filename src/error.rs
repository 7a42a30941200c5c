use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SSError {
    #[error("Cannot determine the key owner, set `$USER` or pass `--user`")]
    MissingUser,

    #[error("The file `{0}` already exists, pass `--force` to overwrite it")]
    FileExists(String),

    #[error("{0}")]
    NotSupport(String),
}
