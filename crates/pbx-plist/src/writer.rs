use std::fmt::Write as _;

use crate::node::{DictItem, Node};

/// First line of every encoded project file.
pub const UTF8_HEADER: &str = "// !$*UTF8*$!";

/// Renders a [`Node`] tree as old-style property-list text.
///
/// Layout follows the usual tooling: tab indentation, `key = value;` lines,
/// `item,` lines with a trailing comma, and inline containers written as
/// `{a = b; }` / `(a, b, )`. Containers nested inside an inline container are
/// always inline.
#[derive(Debug)]
pub struct Writer {
    out: String,
    comments: bool,
}

impl Writer {
    /// Create a writer that emits annotation comments.
    pub fn new() -> Self {
        Self {
            out: String::new(),
            comments: true,
        }
    }

    /// Toggle `/* comment */` annotations and section markers.
    pub fn with_comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }

    /// Render a complete document: header line, root node, trailing newline.
    pub fn write_document(mut self, root: &Node) -> String {
        self.out.push_str(UTF8_HEADER);
        self.out.push('\n');
        self.node(root, 0, false);
        self.out.push('\n');
        self.out
    }

    /// Render a single node without the document header.
    pub fn write_node(mut self, node: &Node) -> String {
        self.node(node, 0, false);
        self.out
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push('\t');
        }
    }

    fn node(&mut self, node: &Node, depth: usize, inline_ctx: bool) {
        match node {
            Node::Scalar { text, comment } => {
                self.scalar(text);
                if let (true, Some(comment)) = (self.comments, comment) {
                    let _ = write!(self.out, " /* {} */", comment.replace("*/", "* /"));
                }
            }
            Node::Data(bytes) => {
                self.out.push('<');
                self.out.push_str(&hex::encode(bytes));
                self.out.push('>');
            }
            Node::Array { items, inline } if *inline || inline_ctx => {
                self.out.push('(');
                for item in items {
                    self.node(item, depth, true);
                    self.out.push_str(", ");
                }
                self.out.push(')');
            }
            Node::Array { items, .. } => {
                self.out.push_str("(\n");
                for item in items {
                    self.indent(depth + 1);
                    self.node(item, depth + 1, false);
                    self.out.push_str(",\n");
                }
                self.indent(depth);
                self.out.push(')');
            }
            Node::Dictionary { items, inline } if *inline || inline_ctx => {
                self.out.push('{');
                for item in items {
                    if let DictItem::Entry { key, value } = item {
                        self.node(key, depth, true);
                        self.out.push_str(" = ");
                        self.node(value, depth, true);
                        self.out.push_str("; ");
                    }
                }
                self.out.push('}');
            }
            Node::Dictionary { items, .. } => {
                self.out.push_str("{\n");
                for item in items {
                    match item {
                        DictItem::Entry { key, value } => {
                            self.indent(depth + 1);
                            self.node(key, depth + 1, false);
                            self.out.push_str(" = ");
                            self.node(value, depth + 1, false);
                            self.out.push_str(";\n");
                        }
                        DictItem::SectionBegin(name) if self.comments => {
                            let _ = writeln!(self.out, "\n/* Begin {name} section */");
                        }
                        DictItem::SectionEnd(name) if self.comments => {
                            let _ = writeln!(self.out, "/* End {name} section */");
                        }
                        DictItem::SectionBegin(_) | DictItem::SectionEnd(_) => {}
                    }
                }
                self.indent(depth);
                self.out.push('}');
            }
        }
    }

    fn scalar(&mut self, text: &str) {
        if !needs_quotes(text) {
            self.out.push_str(text);
            return;
        }
        self.out.push('"');
        for c in text.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\t' => self.out.push_str("\\t"),
                '\r' => self.out.push_str("\\r"),
                c if c.is_control() => {
                    let _ = write!(self.out, "\\U{:04x}", c as u32);
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `true` if `text` must be written inside double quotes.
///
/// Bare strings are limited to `[A-Za-z0-9_$/:.]` and may not contain `//`
/// or `___`, which older readers treat specially.
pub fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text.contains("//")
        || text.contains("___")
        || !text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.'))
}
