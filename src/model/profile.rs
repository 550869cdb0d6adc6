use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_SIEVE_PORT: u16 = 4190;

/// IMAP account. Always spoken over implicit TLS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImapProfile {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Folder that gets scanned for senders.
    pub mailbox: String,
}

impl Default for ImapProfile {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_IMAP_PORT,
            username: String::new(),
            mailbox: "INBOX".to_string(),
        }
    }
}

/// ManageSieve account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SieveProfile {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub use_starttls: bool,
}

impl Default for SieveProfile {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SIEVE_PORT,
            username: String::new(),
            use_starttls: true,
        }
    }
}

impl SieveProfile {
    /// Same server and user as the IMAP account, on the ManageSieve port.
    pub fn from_imap(imap: &ImapProfile) -> Self {
        Self {
            host: imap.host.clone(),
            username: imap.username.clone(),
            ..Default::default()
        }
    }
}
