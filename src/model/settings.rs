use serde::{Deserialize, Serialize};

use crate::sieve::header::HeaderTrim;

pub const DEFAULT_SCRIPT_NAME: &str = "autosieve";
pub const DEFAULT_REQUIRES: [&str; 4] = ["fileinto", "variables", "mailbox", "envelope"];
/// Lets editors such as Roundcube show the generated block as a named rule.
pub const DEFAULT_RULE_MARKER: &str = "Autosieve-Do-Not-Touch";

/// What to do when several inbox messages come from the same sender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// One rule and one mailbox entry per message.
    #[default]
    KeepAll,
    /// One rule and one mailbox entry per (localpart, domain).
    PerSender,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    pub name: String,
    pub requires: Vec<String>,
    pub rule_marker: Option<String>,
    pub header_trim: HeaderTrim,
    pub dedup: DedupPolicy,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_SCRIPT_NAME.to_string(),
            requires: DEFAULT_REQUIRES.iter().map(|s| s.to_string()).collect(),
            rule_marker: Some(DEFAULT_RULE_MARKER.to_string()),
            header_trim: HeaderTrim::default(),
            dedup: DedupPolicy::default(),
        }
    }
}
