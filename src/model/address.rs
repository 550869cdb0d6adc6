/// Sender addresses and the folder names derived from them.
///
/// `name <localpart@domain.tld>` maps to `INBOX.Domain.name`; without a display
/// name the local part is used with every `.` turned into `-`.
use std::fmt;

use crate::error::Error;

const MAILBOX_ROOT: &str = "INBOX";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub display_name: Option<String>,
    /// Raw `localpart@domain` value.
    pub value: String,
}

impl Address {
    pub fn new(display_name: Option<String>, value: impl Into<String>) -> Self {
        Self {
            display_name,
            value: value.into(),
        }
    }

    /// Split the address at its single `@` into `(localpart, domain)`.
    pub fn parts(&self) -> Result<(&str, &str), Error> {
        let mut split = self.value.split('@');
        match (split.next(), split.next(), split.next()) {
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => {
                Ok((local, domain))
            }
            _ => Err(Error::MalformedAddress(self.value.clone())),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => write!(f, "{name} <{}>", self.value),
            None => f.write_str(&self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MailboxName(String);

impl MailboxName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MailboxName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MailboxName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn derive_mailbox_name(address: &Address) -> Result<MailboxName, Error> {
    let (local, domain) = address.parts()?;

    let name = match address.display_name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => local.replace('.', "-"),
    };

    // Strip the top-level label
    let stem = match domain.rfind('.') {
        Some(dot) => &domain[..dot],
        None => domain,
    };
    let stem = capitalize_first(&stem.replace('.', "-"));

    Ok(MailboxName(format!("{MAILBOX_ROOT}.{stem}.{name}")))
}

/// ASCII-only uppercase of the first character; the rest is left untouched.
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(name: Option<&str>, value: &str) -> String {
        derive_mailbox_name(&Address::new(name.map(str::to_string), value))
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_display_name_is_kept_verbatim() {
        assert_eq!(
            derive(Some("Test Tester"), "test@example.com"),
            "INBOX.Example.Test Tester"
        );
        assert_eq!(
            derive(Some("dr. no.body"), "x@example.com"),
            "INBOX.Example.dr. no.body"
        );
    }

    #[test]
    fn test_local_part_dots_become_dashes() {
        assert_eq!(
            derive(Some(""), "tester.test@example.com"),
            "INBOX.Example.tester-test"
        );
        assert_eq!(derive(None, "a.b.c@example.com"), "INBOX.Example.a-b-c");
    }

    #[test]
    fn test_subdomains_are_joined_with_dashes() {
        assert_eq!(
            derive(None, "news@mail.example.co.uk"),
            "INBOX.Mail-example-co.news"
        );
    }

    #[test]
    fn test_domain_without_tld() {
        assert_eq!(derive(None, "root@localhost"), "INBOX.Localhost.root");
    }

    #[test]
    fn test_only_first_character_is_uppercased() {
        assert_eq!(derive(None, "x@eXAMPLE.org"), "INBOX.EXAMPLE.x");
        assert_eq!(derive(None, "x@1und1.de"), "INBOX.1und1.x");
    }

    #[test]
    fn test_malformed_addresses() {
        for value in ["no-at-sign", "two@at@signs", "@example.com", "local@"] {
            let err = derive_mailbox_name(&Address::new(None, value)).unwrap_err();
            assert!(matches!(err, Error::MalformedAddress(v) if v == value));
        }
    }

    #[test]
    fn test_parts() {
        let address = Address::new(None, "test@example.com");
        assert_eq!(address.parts().unwrap(), ("test", "example.com"));
    }

    #[test]
    fn test_address_display() {
        let address = Address::new(Some("Test Tester".into()), "test@example.com");
        assert_eq!(address.to_string(), "Test Tester <test@example.com>");
        assert_eq!(
            Address::new(None, "test@example.com").to_string(),
            "test@example.com"
        );
    }
}
