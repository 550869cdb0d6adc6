//! The two servers the planner talks to. `net` has the real implementations;
//! tests substitute in-memory doubles.
//!
//! A collaborator that refuses an operation reports it as `Err`.
#![allow(async_fn_in_trait)]

use crate::model::address::Address;
use crate::net::Error;

/// A message sitting in the scanned folder.
pub trait MessageRef {
    /// `None` when the message carries no usable `From`.
    fn from_address(&self) -> Option<&Address>;
}

pub trait MailStore {
    type Message: MessageRef;

    async fn list_messages(&mut self) -> Result<Vec<Self::Message>, Error>;
    async fn mailbox_exists(&mut self, name: &str) -> Result<bool, Error>;
    async fn create_mailbox(&mut self, name: &str) -> Result<(), Error>;
    async fn subscribe_mailbox(&mut self, name: &str) -> Result<(), Error>;
    async fn move_message(&mut self, message: &Self::Message, mailbox: &str) -> Result<(), Error>;
}

pub trait FilterScripts {
    async fn list_scripts(&mut self) -> Result<Vec<String>, Error>;
    async fn fetch_script(&mut self, name: &str) -> Result<String, Error>;
    async fn install_script(&mut self, name: &str, text: &str, activate: bool)
        -> Result<(), Error>;
}
