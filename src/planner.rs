/// Scan the inbox, plan one folder and one rule per sender, then commit.
///
/// A cycle is `scan_senders()` followed by `commit()`. Commit installs the
/// script first and only touches mailboxes once that succeeded. Nothing is
/// rolled back: when a later step fails, everything before it stays applied.
use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::Error;
use crate::model::address::{derive_mailbox_name, MailboxName};
use crate::model::settings::{DedupPolicy, ScriptSettings};
use crate::session::{FilterScripts, MailStore, MessageRef};
use crate::sieve::ast::Rule;
use crate::sieve::builder::{ScriptBuilder, LINE_ENDING};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    /// Rules or mailbox moves are waiting for `commit()`.
    Planned,
    ScriptCommitting,
    ScriptCommitted,
    MailboxCommitting,
    /// A commit failed. Only `reset()` leaves this state.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitSummary {
    pub script: String,
    pub rules: usize,
    pub created: Vec<MailboxName>,
    pub moved: usize,
    pub failed_moves: usize,
}

pub struct AutoSieve<'a, M: MailStore, F: FilterScripts> {
    mail: &'a mut M,
    scripts: &'a mut F,
    settings: ScriptSettings,
    builder: ScriptBuilder,
    /// Duplicates allowed; one entry per planned rule.
    mailboxes: Vec<MailboxName>,
    messages: HashMap<MailboxName, Vec<M::Message>>,
    /// First folder planned for each (localpart, domain).
    senders: HashMap<(String, String), MailboxName>,
    phase: Phase,
}

impl<'a, M: MailStore, F: FilterScripts> AutoSieve<'a, M, F> {
    pub fn new(mail: &'a mut M, scripts: &'a mut F, settings: ScriptSettings) -> Self {
        Self {
            mail,
            scripts,
            builder: ScriptBuilder::from_settings(&settings),
            settings,
            mailboxes: Vec::new(),
            messages: HashMap::new(),
            senders: HashMap::new(),
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn script_name(&self) -> &str {
        &self.settings.name
    }

    pub fn settings(&self) -> &ScriptSettings {
        &self.settings
    }

    pub fn builder(&self) -> &ScriptBuilder {
        &self.builder
    }

    pub fn render(&self) -> String {
        self.builder.render()
    }

    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        self.builder.add_rule(rule);
        self.mark_planned();
        self
    }

    pub fn add_mailbox(&mut self, mailbox: MailboxName) -> &mut Self {
        self.mailboxes.push(mailbox);
        self.mark_planned();
        self
    }

    pub fn pending_mailboxes(&self) -> &[MailboxName] {
        &self.mailboxes
    }

    pub fn add_message_to_mailbox(&mut self, message: M::Message, mailbox: MailboxName) {
        self.messages.entry(mailbox).or_default().push(message);
        self.mark_planned();
    }

    pub fn pending_messages(&self, mailbox: &MailboxName) -> &[M::Message] {
        self.messages.get(mailbox).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Walk the scanned folder in listing order and plan a rule, a mailbox
    /// and a move for every message. Talks to the mail store read-only.
    pub async fn scan_senders(&mut self) -> Result<(), Error> {
        self.ensure_usable()?;
        self.phase = Phase::Scanning;
        let result = self.plan_messages().await;
        self.phase = if self.has_pending() {
            Phase::Planned
        } else {
            Phase::Idle
        };
        result
    }

    async fn plan_messages(&mut self) -> Result<(), Error> {
        let messages = self.mail.list_messages().await?;
        info!(count = messages.len(), "scanning messages for senders");

        for message in messages {
            let Some(from) = message.from_address() else {
                warn!("skipping message without a sender address");
                continue;
            };
            let mailbox = derive_mailbox_name(from)?;
            let (localpart, domain) = from.parts()?;

            let sender = (localpart.to_string(), domain.to_string());
            // Under PerSender a known address keeps its first folder, even if
            // the display name changed since.
            let known = match self.settings.dedup {
                DedupPolicy::PerSender => self.senders.get(&sender).cloned(),
                DedupPolicy::KeepAll => None,
            };
            let mailbox = match known {
                Some(first) => first,
                None => {
                    debug!(sender = %from, mailbox = %mailbox, "planning rule");
                    self.builder
                        .add_rule(Rule::sender_folder(localpart, domain, &mailbox));
                    self.mailboxes.push(mailbox.clone());
                    self.senders.entry(sender).or_insert_with(|| mailbox.clone());
                    mailbox
                }
            };
            self.messages.entry(mailbox).or_default().push(message);
        }

        Ok(())
    }

    /// If the script is already installed, continue it: fetch it, trim its
    /// trailer and use the rest as header.
    pub async fn load_header(&mut self) -> Result<(), Error> {
        let name = self.settings.name.clone();
        let installed = self.scripts.list_scripts().await?;
        if installed.iter().any(|s| *s == name) {
            let source = self.scripts.fetch_script(&name).await?;
            let header = self.settings.header_trim.apply(&name, &source)?;
            debug!(script = %name, lines = header.len(), "continuing installed script");
            self.builder.set_header(header);
        }
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<CommitSummary, Error> {
        self.ensure_usable()?;

        self.phase = Phase::ScriptCommitting;
        let rules = match self.commit_script().await {
            Ok(rules) => rules,
            Err(err) => return Err(self.fail(err)),
        };
        self.phase = Phase::ScriptCommitted;
        debug!(rules, "script committed, applying mailbox changes");

        self.phase = Phase::MailboxCommitting;
        let mut summary = match self.commit_mailboxes().await {
            Ok(summary) => summary,
            Err(err) => return Err(self.fail(err)),
        };
        summary.rules = rules;

        self.phase = Phase::Idle;
        info!(
            script = %summary.script,
            rules = summary.rules,
            created = summary.created.len(),
            moved = summary.moved,
            failed_moves = summary.failed_moves,
            "commit finished"
        );
        Ok(summary)
    }

    /// Forget everything planned and leave a failed state.
    pub fn reset(&mut self) {
        self.builder.clear();
        self.mailboxes.clear();
        self.messages.clear();
        self.senders.clear();
        self.phase = Phase::Idle;
    }

    async fn commit_script(&mut self) -> Result<usize, Error> {
        self.load_header().await?;

        let rules = self.builder.rules().len();
        // The trailing line ending is the padding `HeaderTrim::TrailingLines` drops next time.
        let text = format!("{}{LINE_ENDING}", self.builder.render());
        let name = self.settings.name.as_str();
        self.scripts
            .install_script(name, &text, true)
            .await
            .map_err(|source| Error::ScriptInstallFailed {
                name: name.to_string(),
                source,
            })?;
        info!(script = %name, rules, "installed and activated script");

        self.builder.clear();
        Ok(rules)
    }

    async fn commit_mailboxes(&mut self) -> Result<CommitSummary, Error> {
        let mut summary = CommitSummary {
            script: self.settings.name.clone(),
            rules: 0,
            created: Vec::new(),
            moved: 0,
            failed_moves: 0,
        };

        let mailboxes = std::mem::take(&mut self.mailboxes);
        for mailbox in &mailboxes {
            let name = mailbox.as_str();
            if !self.mail.mailbox_exists(name).await? {
                self.mail
                    .create_mailbox(name)
                    .await
                    .map_err(|source| Error::MailboxCreateFailed {
                        mailbox: name.to_string(),
                        source,
                    })?;
                self.mail
                    .subscribe_mailbox(name)
                    .await
                    .map_err(|source| Error::MailboxSubscribeFailed {
                        mailbox: name.to_string(),
                        source,
                    })?;
                info!(mailbox = name, "created and subscribed mailbox");
                summary.created.push(mailbox.clone());
            }

            // Repeated entries find their queue already drained.
            for message in self.messages.remove(mailbox).unwrap_or_default() {
                match self.mail.move_message(&message, name).await {
                    Ok(()) => summary.moved += 1,
                    Err(err) => {
                        warn!(mailbox = name, error = %err, "could not move message");
                        summary.failed_moves += 1;
                    }
                }
            }
        }

        self.messages.clear();
        self.senders.clear();
        Ok(summary)
    }

    fn ensure_usable(&self) -> Result<(), Error> {
        if self.phase == Phase::Failed {
            return Err(Error::CycleFailed);
        }
        Ok(())
    }

    fn fail(&mut self, err: Error) -> Error {
        warn!(error = %err, phase = ?self.phase, "commit failed");
        self.phase = Phase::Failed;
        err
    }

    fn has_pending(&self) -> bool {
        !self.mailboxes.is_empty() || !self.messages.is_empty() || !self.builder.rules().is_empty()
    }

    fn mark_planned(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Planned;
        }
    }
}
