/// Accumulates rules and renders the complete script.
///
/// Without a header the script starts with a generated preamble:
///
/// ```text
/// require ["fileinto","variables","mailbox","envelope"];
/// # rule:[Autosieve-Do-Not-Touch]
/// if true {
/// ```
///
/// With a header (the previously installed script minus its trailer) the
/// header lines are emitted instead, so new rules continue inside the old
/// outer block. The rules follow in append order and a single `}` closes it.
use crate::model::settings::ScriptSettings;
use crate::sieve::ast::Rule;
use crate::sieve::emitter;

pub const LINE_ENDING: &str = "\n";

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptBuilder {
    requires: Vec<String>,
    rule_marker: Option<String>,
    header: Vec<String>,
    rules: Vec<Rule>,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::from_settings(&ScriptSettings::default())
    }
}

impl ScriptBuilder {
    pub fn new(requires: Vec<String>, rule_marker: Option<String>) -> Self {
        Self {
            requires,
            rule_marker,
            header: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn from_settings(settings: &ScriptSettings) -> Self {
        Self::new(settings.requires.clone(), settings.rule_marker.clone())
    }

    /// An empty header switches back to the generated preamble.
    pub fn set_header(&mut self, lines: Vec<String>) {
        self.header = lines;
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn has_header(&self) -> bool {
        !self.header.is_empty()
    }

    /// Duplicates are kept.
    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Forget rules and header after a successful install.
    pub fn clear(&mut self) {
        self.rules.clear();
        self.header.clear();
    }

    pub fn render(&self) -> String {
        let mut script: Vec<String> = if self.header.is_empty() {
            self.preamble()
        } else {
            self.header.clone()
        };

        // Zero rules still leave one (empty) line here.
        let rules = self
            .rules
            .iter()
            .map(|rule| rule.lines().join(LINE_ENDING))
            .collect::<Vec<_>>()
            .join(LINE_ENDING);
        script.push(rules);
        script.push("}".to_string());

        script.join(LINE_ENDING)
    }

    fn preamble(&self) -> Vec<String> {
        let mut lines = vec![emitter::emit_require(&self.requires)];
        if let Some(marker) = self.rule_marker.as_deref().filter(|m| !m.is_empty()) {
            lines.push(format!("# rule:[{marker}]"));
        }
        lines.push("if true {".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::address::MailboxName;

    const REQUIRE: &str = r#"require ["fileinto","variables","mailbox","envelope"];"#;
    const MARKER: &str = "# rule:[Autosieve-Do-Not-Touch]";

    #[test]
    fn test_empty_skeleton() {
        let builder = ScriptBuilder::default();
        assert_eq!(
            builder.render(),
            [REQUIRE, MARKER, "if true {", "", "}"].join("\n")
        );
    }

    #[test]
    fn test_rule_is_nested_in_outer_block() {
        let mut builder = ScriptBuilder::default();
        builder.add_rule(Rule::raw(["if true {", "}"]));
        assert_eq!(
            builder.render(),
            [REQUIRE, MARKER, "if true {", "if true {", "}", "}"].join("\n")
        );
    }

    #[test]
    fn test_rules_keep_append_order_and_duplicates() {
        let mut builder = ScriptBuilder::default();
        builder
            .add_rule(Rule::raw(["# first"]))
            .add_rule(Rule::raw(["# second"]))
            .add_rule(Rule::raw(["# first"]));
        assert_eq!(builder.rules().len(), 3);
        assert_eq!(
            builder.render(),
            [REQUIRE, MARKER, "if true {", "# first", "# second", "# first", "}"].join("\n")
        );
    }

    #[test]
    fn test_without_marker() {
        let builder = ScriptBuilder::new(vec!["fileinto".into()], None);
        assert_eq!(
            builder.render(),
            [r#"require ["fileinto"];"#, "if true {", "", "}"].join("\n")
        );
    }

    #[test]
    fn test_header_replaces_preamble() {
        let mut builder = ScriptBuilder::default();
        builder.set_header(vec!["# old".into(), "if true {".into(), "  keep;".into()]);
        builder.add_rule(Rule::sender_folder("a", "b.org", &MailboxName::new("INBOX.B.a")));
        let text = builder.render();
        assert!(!text.contains("require"));
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "# old",
                "if true {",
                "  keep;",
                r#"if envelope :matches :domain "From" "b.org" {"#,
                r#"  if envelope :matches :localpart "From" "a" {"#,
                r#"    fileinto "INBOX.B.a";"#,
                "  }",
                "}",
                "}",
            ]
        );
    }

    #[test]
    fn test_render_is_repeatable() {
        let mut builder = ScriptBuilder::default();
        builder.add_rule(Rule::raw(["if true {", "}"]));
        assert_eq!(builder.render(), builder.render());
    }

    #[test]
    fn test_clear_returns_to_fresh_state() {
        let mut builder = ScriptBuilder::default();
        builder.set_header(vec!["x".into()]);
        builder.add_rule(Rule::raw(["y"]));
        builder.clear();
        assert!(!builder.has_header());
        assert!(builder.rules().is_empty());
        assert_eq!(builder.render(), ScriptBuilder::default().render());
    }
}
