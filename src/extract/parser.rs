//! extract/parser.rs
//!
//! Go declaration scanning on top of tree-sitter.

use tree_sitter::{Node, Parser};

/// One top-level function or method as reported by the parser.
/// Lines are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub exported: bool,
    pub body_statements: usize,
    pub start_line: usize,
    pub end_line: usize,
    /// First line of the doc comment directly above, if any.
    pub doc_start_line: Option<usize>,
}

/// Source parser collaborator.
pub trait SourceParser {
    fn declarations(&self, source: &str) -> Result<Vec<Declaration>, String>;
}

pub struct GoParser;

impl SourceParser for GoParser {
    fn declarations(&self, source: &str) -> Result<Vec<Declaration>, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::language())
            .map_err(|e| e.to_string())?;

        let tree = parser
            .parse(source, None)
            .ok_or("parser returned no tree")?;
        let root = tree.root_node();

        if root.has_error() {
            return Err(first_error_location(root)
                .map(|(line, col)| format!("syntax error at {line}:{col}"))
                .unwrap_or_else(|| "syntax error".into()));
        }

        let mut cursor = root.walk();
        let top: Vec<Node> = root.children(&mut cursor).collect();

        let mut out = Vec::new();
        for (i, node) in top.iter().enumerate() {
            if !matches!(node.kind(), "function_declaration" | "method_declaration") {
                continue;
            }

            let Some(name) = node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source.as_bytes()).ok())
            else {
                continue;
            };

            out.push(Declaration {
                name: name.to_owned(),
                exported: is_exported(name),
                body_statements: node
                    .child_by_field_name("body")
                    .map(count_statements)
                    .unwrap_or(0),
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
                doc_start_line: doc_start(&top[..i], node.start_position().row),
            });
        }

        Ok(out)
    }
}

/// Go's visibility rule: the first rune is an uppercase letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn count_statements(block: Node) -> usize {
    let mut cursor = block.walk();
    let named: Vec<Node> = block
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();

    // Newer grammars wrap block contents in a statement_list.
    match named.as_slice() {
        [list] if list.kind() == "statement_list" => {
            let mut cursor = list.walk();
            list.named_children(&mut cursor)
                .filter(|n| n.kind() != "comment")
                .count()
        }
        _ => named.len(),
    }
}

/// Walks back over a contiguous run of comments ending on the line above `row`.
fn doc_start(preceding: &[Node], row: usize) -> Option<usize> {
    let mut expected_end = row.checked_sub(1)?;
    let mut start = None;

    for node in preceding.iter().rev() {
        if node.kind() != "comment" || node.end_position().row != expected_end {
            break;
        }
        let comment_start = node.start_position().row;
        start = Some(comment_start + 1);
        match comment_start.checked_sub(1) {
            Some(prev) => expected_end = prev,
            None => break,
        }
    }

    start
}

fn first_error_location(node: Node) -> Option<(usize, usize)> {
    if node.is_error() || node.is_missing() {
        let p = node.start_position();
        return Some((p.row + 1, p.column + 1));
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(loc) = first_error_location(child) {
                return Some(loc);
            }
        }
    }

    None
}
