use crate::net;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed address: {0:?}")]
    MalformedAddress(String),
    #[error("Could not install script {name:?}: {source}")]
    ScriptInstallFailed {
        name: String,
        #[source]
        source: net::Error,
    },
    #[error("Could not create mailbox {mailbox:?}: {source}")]
    MailboxCreateFailed {
        mailbox: String,
        #[source]
        source: net::Error,
    },
    #[error("Could not subscribe to mailbox {mailbox:?}: {source}")]
    MailboxSubscribeFailed {
        mailbox: String,
        #[source]
        source: net::Error,
    },
    #[error("Script {0:?} does not end with a closing brace")]
    UnrecognizedTrailer(String),
    #[error("A previous commit failed; reset before starting a new cycle")]
    CycleFailed,
    #[error(transparent)]
    Session(#[from] net::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
