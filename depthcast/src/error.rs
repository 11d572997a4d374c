use std::io;

/// Session-level errors the outer CLI loop reacts to by re-prompting for a
/// fresh port. Neither variant carries raw socket text onto the wire; these
/// only ever surface through logging.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("fatal socket error: {0}")]
    FatalSocket(#[from] io::Error),

    #[error("session bootstrap failed: {0}")]
    SessionAbort(String),
}
