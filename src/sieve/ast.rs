//! Structured filter rules appended to the generated script.
use crate::model::address::MailboxName;
use crate::model::enums::AddressPartType;
use crate::sieve::emitter;

/// One block of the generated script.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// `if <test> { ... }`, possibly with nested blocks
    If(IfBlock),
    /// Lines taken over as-is
    Raw(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub condition: EnvelopeTest,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    If(IfBlock),
    /// `fileinto "<mailbox>";`
    Fileinto(String),
}

/// `envelope :matches <address_part> "Header" "key"`
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeTest {
    pub address_part: AddressPartType,
    pub header: String,
    pub key: String,
}

impl Rule {
    /// Domain match, then local-part match, then `fileinto` the sender's folder.
    pub fn sender_folder(localpart: &str, domain: &str, mailbox: &MailboxName) -> Self {
        let localpart_block = IfBlock {
            condition: EnvelopeTest::from_header(AddressPartType::Localpart, localpart),
            body: vec![Node::Fileinto(mailbox.to_string())],
        };
        Rule::If(IfBlock {
            condition: EnvelopeTest::from_header(AddressPartType::Domain, domain),
            body: vec![Node::If(localpart_block)],
        })
    }

    pub fn raw<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::Raw(lines.into_iter().map(Into::into).collect())
    }

    pub fn lines(&self) -> Vec<String> {
        emitter::emit_rule(self)
    }

    /// The folder this rule files into, if it is a generated sender rule.
    pub fn target_mailbox(&self) -> Option<&str> {
        fn find(block: &IfBlock) -> Option<&str> {
            block.body.iter().find_map(|node| match node {
                Node::If(inner) => find(inner),
                Node::Fileinto(mailbox) => Some(mailbox.as_str()),
            })
        }
        match self {
            Rule::If(block) => find(block),
            Rule::Raw(_) => None,
        }
    }
}

impl EnvelopeTest {
    fn from_header(address_part: AddressPartType, key: &str) -> Self {
        EnvelopeTest {
            address_part,
            header: "From".to_string(),
            key: key.to_string(),
        }
    }
}
