use std::fmt;

/// Address part compared by an `envelope` test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPartType {
    Localpart,
    Domain,
}

impl AddressPartType {
    pub fn as_sieve(&self) -> &'static str {
        match self {
            Self::Localpart => ":localpart",
            Self::Domain => ":domain",
        }
    }
}

impl fmt::Display for AddressPartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sieve())
    }
}
