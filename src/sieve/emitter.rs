//! Emit SIEVE text lines from rules. Each nesting level indents by two spaces.
use crate::sieve::ast::*;

const INDENT: &str = "  ";

pub fn emit_rule(rule: &Rule) -> Vec<String> {
    match rule {
        Rule::If(block) => {
            let mut out = Vec::new();
            emit_if_block(&mut out, block, 0);
            out
        }
        Rule::Raw(lines) => lines.clone(),
    }
}

/// `require ["a","b"];` in the given order, duplicates dropped.
pub fn emit_require(extensions: &[String]) -> String {
    let mut unique: Vec<&str> = Vec::new();
    for ext in extensions {
        if !unique.contains(&ext.as_str()) {
            unique.push(ext);
        }
    }
    let list = unique
        .iter()
        .map(|e| format!("\"{}\"", escape_sieve_string(e)))
        .collect::<Vec<_>>()
        .join(",");
    format!("require [{list}];")
}

fn emit_if_block(out: &mut Vec<String>, block: &IfBlock, depth: usize) {
    let prefix = INDENT.repeat(depth);
    let mut line = format!("{prefix}if ");
    emit_test_expr(&mut line, &block.condition);
    line.push_str(" {");
    out.push(line);

    for node in &block.body {
        match node {
            Node::If(inner) => emit_if_block(out, inner, depth + 1),
            Node::Fileinto(mailbox) => out.push(emit_fileinto(mailbox, depth + 1)),
        }
    }

    out.push(format!("{prefix}}}"));
}

fn emit_test_expr(out: &mut String, test: &EnvelopeTest) {
    out.push_str(&format!(
        "envelope :matches {} \"{}\" \"{}\"",
        test.address_part.as_sieve(),
        escape_sieve_string(&test.header),
        escape_sieve_string(&test.key)
    ));
}

fn emit_fileinto(mailbox: &str, depth: usize) -> String {
    format!(
        "{}fileinto \"{}\";",
        INDENT.repeat(depth),
        escape_sieve_string(mailbox)
    )
}

pub fn escape_sieve_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
