pub mod error;

use tree_sitter::{Node, Parser, Tree};

use self::error::{ParseError, Result};

/// Node kinds that count as a markup element. Fragments parse as
/// `jsx_element` with an unnamed opening tag.
const MARKUP_KINDS: [&str; 2] = ["jsx_element", "jsx_self_closing_element"];

/// What a parsed source fragment turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionKind {
    /// A single expression whose root is a markup element
    Markup,
    /// Anything else, carrying the kind of the offending root node
    Other(String),
}

/// TSX parser using tree-sitter
pub struct TsxParser {
    parser: Parser,
}

impl TsxParser {
    /// Create a new TSX parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
            .map_err(|e| ParseError::LanguageSetupFailed(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Parse TSX source code
    pub fn parse(&mut self, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or(ParseError::ParseFailed)
    }

    /// Parse `source` and reject it if it contains any syntax error
    pub fn parse_strict(&mut self, source: &str) -> Result<Tree> {
        let tree = self.parse(source)?;
        if let Some(node) = first_error(tree.root_node()) {
            return Err(ParseError::SyntaxError {
                line: node.start_position().row + 1,
                message: describe_error(node, source),
            });
        }
        Ok(tree)
    }

    /// Parse `source` as a lone expression and classify its root
    ///
    /// Fails only on syntax errors. Text that parses but is not exactly one
    /// expression statement is `Other`.
    pub fn classify_expression(&mut self, source: &str) -> Result<ExpressionKind> {
        let tree = self.parse_strict(source)?;
        let root = tree.root_node();

        let mut cursor = root.walk();
        let statements: Vec<Node> = root
            .named_children(&mut cursor)
            .filter(|node| node.kind() != "comment")
            .collect();

        let [statement] = statements.as_slice() else {
            return Ok(ExpressionKind::Other(format!(
                "{} statements",
                statements.len()
            )));
        };

        if statement.kind() != "expression_statement" {
            return Ok(ExpressionKind::Other(statement.kind().to_string()));
        }

        let Some(expression) = statement.named_child(0).map(unwrap_parens) else {
            return Ok(ExpressionKind::Other(statement.kind().to_string()));
        };

        if MARKUP_KINDS.contains(&expression.kind()) {
            Ok(ExpressionKind::Markup)
        } else {
            Ok(ExpressionKind::Other(expression.kind().to_string()))
        }
    }
}

fn unwrap_parens(node: Node<'_>) -> Node<'_> {
    let mut node = node;
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// First error or missing node in document order
pub(crate) fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(first_error)
        .or(Some(node))
}

fn describe_error(node: Node<'_>, source: &str) -> String {
    if node.is_missing() {
        return format!("missing {}", node.kind());
    }
    let text = node.utf8_text(source.as_bytes()).unwrap_or_default();
    let text: String = text.chars().take(40).collect();
    format!("unexpected `{}`", text)
}
