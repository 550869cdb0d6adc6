/// Turning a previously installed script back into a header that new rules
/// can be appended to.
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderTrim {
    /// Drop the last two lines: the closing `}` and the blank padding after it.
    /// Assumes the script was last written by us and not edited since.
    #[default]
    TrailingLines,
    /// Drop trailing blank lines, then the final `}` line. Fails if there is none.
    ClosingBrace,
}

const TRAILER_LINES: usize = 2;

impl HeaderTrim {
    pub fn apply(&self, name: &str, source: &str) -> Result<Vec<String>, Error> {
        let mut lines: Vec<String> = source
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();

        match self {
            Self::TrailingLines => {
                lines.truncate(lines.len().saturating_sub(TRAILER_LINES));
            }
            Self::ClosingBrace => {
                while lines.last().is_some_and(|l| l.trim().is_empty()) {
                    lines.pop();
                }
                match lines.last() {
                    Some(last) if last.trim() == "}" => {
                        lines.pop();
                    }
                    _ => return Err(Error::UnrecognizedTrailer(name.to_string())),
                }
            }
        }

        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTALLED: &str = "require [\"fileinto\"];\nif true {\nif envelope :matches :domain \"From\" \"a.com\" {\n}\n}\n";

    #[test]
    fn test_trailing_lines_drops_brace_and_padding() {
        let header = HeaderTrim::TrailingLines.apply("s", INSTALLED).unwrap();
        assert_eq!(
            header,
            vec![
                "require [\"fileinto\"];",
                "if true {",
                "if envelope :matches :domain \"From\" \"a.com\" {",
                "}",
            ]
        );
    }

    #[test]
    fn test_trailing_lines_is_blind_to_content() {
        // Without the blank padding the last rule loses its brace.
        let header = HeaderTrim::TrailingLines
            .apply("s", "if true {\nkeep;\n}")
            .unwrap();
        assert_eq!(header, vec!["if true {"]);
        assert!(HeaderTrim::TrailingLines.apply("s", "}").unwrap().is_empty());
    }

    #[test]
    fn test_closing_brace_matches_trailing_lines_on_our_output() {
        assert_eq!(
            HeaderTrim::ClosingBrace.apply("s", INSTALLED).unwrap(),
            HeaderTrim::TrailingLines.apply("s", INSTALLED).unwrap()
        );
    }

    #[test]
    fn test_closing_brace_handles_missing_padding_and_crlf() {
        let header = HeaderTrim::ClosingBrace
            .apply("s", "if true {\r\nkeep;\r\n}\r\n\r\n")
            .unwrap();
        assert_eq!(header, vec!["if true {", "keep;"]);
    }

    #[test]
    fn test_closing_brace_rejects_foreign_trailer() {
        let err = HeaderTrim::ClosingBrace
            .apply("mine", "require \"fileinto\";\nkeep;\n")
            .unwrap_err();
        assert!(matches!(err, Error::UnrecognizedTrailer(name) if name == "mine"));
    }
}
