//! IMAP mail store over implicit TLS, backed by `async-imap`.
use async_imap::Session;
use futures::TryStreamExt;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::{debug, info};
use utf7_imap::{decode_utf7_imap as decode_utf7, encode_utf7_imap as encode_utf7};

use crate::model::address::Address;
use crate::model::profile::ImapProfile;
use crate::net::{server_name, tls_connector, Error};
use crate::session::{MailStore, MessageRef};

type ImapStream = TlsStream<TcpStream>;

#[derive(Debug, Clone, PartialEq)]
pub struct ImapMessage {
    pub uid: u32,
    pub from: Option<Address>,
}

impl MessageRef for ImapMessage {
    fn from_address(&self) -> Option<&Address> {
        self.from.as_ref()
    }
}

pub struct ImapClient {
    session: Session<ImapStream>,
    mailbox: String,
}

impl ImapClient {
    pub async fn connect(profile: &ImapProfile, password: &str) -> Result<Self, Error> {
        debug!(host = %profile.host, port = profile.port, "connecting to IMAP");
        let tcp = TcpStream::connect((&*profile.host, profile.port)).await?;
        let tls = tls_connector()
            .connect(server_name(&profile.host)?, tcp)
            .await?;

        let mut client = async_imap::Client::new(tls);
        client
            .read_response()
            .await
            .ok_or_else(|| Error::Protocol("Connection closed before greeting".into()))??;

        let mut session = client
            .login(&profile.username, password)
            .await
            .map_err(|(err, _client)| err)?;
        session.select(&profile.mailbox).await?;

        info!(host = %profile.host, user = %profile.username, mailbox = %profile.mailbox, "IMAP session ready");
        Ok(Self {
            session,
            mailbox: profile.mailbox.clone(),
        })
    }

    pub async fn logout(&mut self) -> Result<(), Error> {
        self.session.logout().await?;
        Ok(())
    }
}

impl MailStore for ImapClient {
    type Message = ImapMessage;

    async fn list_messages(&mut self) -> Result<Vec<ImapMessage>, Error> {
        let fetches: Vec<_> = self
            .session
            .uid_fetch("1:*", "(UID ENVELOPE)")
            .await?
            .try_collect()
            .await?;

        let mut messages = Vec::with_capacity(fetches.len());
        for fetch in &fetches {
            let Some(uid) = fetch.uid else {
                continue;
            };
            let from = fetch
                .envelope()
                .and_then(|env| env.from.as_ref())
                .and_then(|addrs| addrs.first())
                .and_then(|addr| {
                    sender_address(
                        addr.name.as_deref(),
                        addr.mailbox.as_deref(),
                        addr.host.as_deref(),
                    )
                });
            messages.push(ImapMessage { uid, from });
        }
        debug!(mailbox = %self.mailbox, count = messages.len(), "fetched envelopes");
        Ok(messages)
    }

    async fn mailbox_exists(&mut self, name: &str) -> Result<bool, Error> {
        let pattern = encode_utf7(name.to_owned());
        let names: Vec<_> = self
            .session
            .list(Some(""), Some(pattern.as_str()))
            .await?
            .try_collect()
            .await?;
        Ok(names.iter().any(|n| decode_utf7(n.name().into()) == name))
    }

    async fn create_mailbox(&mut self, name: &str) -> Result<(), Error> {
        self.session.create(encode_utf7(name.to_owned())).await?;
        Ok(())
    }

    async fn subscribe_mailbox(&mut self, name: &str) -> Result<(), Error> {
        self.session.subscribe(encode_utf7(name.to_owned())).await?;
        Ok(())
    }

    async fn move_message(&mut self, message: &ImapMessage, mailbox: &str) -> Result<(), Error> {
        self.session
            .uid_mv(message.uid.to_string(), encode_utf7(mailbox.to_owned()))
            .await?;
        debug!(uid = message.uid, mailbox, "moved message");
        Ok(())
    }
}

/// Build a sender from the raw ENVELOPE address fields.
fn sender_address(
    name: Option<&[u8]>,
    mailbox: Option<&[u8]>,
    host: Option<&[u8]>,
) -> Option<Address> {
    let mailbox = String::from_utf8_lossy(mailbox?);
    let host = String::from_utf8_lossy(host?);
    let display_name = name
        .map(decode_display_name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    Some(Address::new(display_name, format!("{mailbox}@{host}")))
}

/// ENVELOPE names arrive as RFC 2047 encoded words when not plain ASCII.
fn decode_display_name(raw: &[u8]) -> String {
    let mut header = b"From: ".to_vec();
    header.extend_from_slice(raw);
    match mailparse::parse_header(&header) {
        Ok((parsed, _)) => parsed.get_value(),
        Err(_) => String::from_utf8_lossy(raw).into_owned(),
    }
}
