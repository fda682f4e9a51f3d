use tree_sitter::Node;

use super::error::{Result, StubError};
use crate::config::StubBody;
use crate::parser::TsxParser;

const INDENT_WIDTH: usize = 4;

/// Preferred string quote; the other one is used when it needs fewer escapes
const QUOTE: char = '\'';

/// Format the no-op component declaration for `name`
pub fn render_component_stub(name: &str, body: StubBody) -> Result<String> {
    let template = match body {
        StubBody::Null => format!("function {name}(){{ return null }}"),
        StubBody::Fragment => format!("function {name}(){{ return(<></>) }}"),
    };
    Formatter::new()?.format(&template)
}

/// Pretty-printer for stub templates
///
/// The source is parsed with the TSX grammar and re-printed node by node in
/// a fixed style: semicolons, single quotes, four-space indentation. Only
/// function declarations, blocks, returns, literals, identifiers,
/// parentheses, empty fragments and self-closing tags are printed; anything
/// else is `StubError::Unsupported`.
pub struct Formatter {
    parser: TsxParser,
}

impl Formatter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: TsxParser::new()?,
        })
    }

    /// Format a whole program; every statement ends with a newline
    pub fn format(&mut self, source: &str) -> Result<String> {
        let tree = self.parser.parse_strict(source)?;
        let mut printer = Printer::new(source);
        printer.program(tree.root_node())?;
        Ok(printer.finish())
    }
}

struct Printer<'a> {
    source: &'a str,
    out: String,
    indent: usize,
}

impl<'a> Printer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            out: String::new(),
            indent: 0,
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn write(&mut self, text: &str) {
        if !text.is_empty() && (self.out.is_empty() || self.out.ends_with('\n')) {
            self.out.push_str(&" ".repeat(self.indent * INDENT_WIDTH));
        }
        self.out.push_str(text);
    }

    fn write_line(&mut self) {
        self.out.push('\n');
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn program(&mut self, node: Node<'_>) -> Result<()> {
        for statement in named_children(node) {
            self.statement(statement)?;
            self.write_line();
        }
        Ok(())
    }

    fn statement(&mut self, node: Node<'_>) -> Result<()> {
        match node.kind() {
            "function_declaration" => self.function_declaration(node),
            "statement_block" => self.block(node),
            "return_statement" => {
                self.write("return");
                if let Some(argument) = named_children(node).first() {
                    self.write(" ");
                    self.expression(*argument)?;
                }
                self.write(";");
                Ok(())
            }
            "expression_statement" => {
                let expression = first_named(node)?;
                self.expression(expression)?;
                self.write(";");
                Ok(())
            }
            _ => Err(unsupported(node)),
        }
    }

    fn function_declaration(&mut self, node: Node<'_>) -> Result<()> {
        if let Some(extra) = node
            .child_by_field_name("type_parameters")
            .or_else(|| node.child_by_field_name("return_type"))
        {
            return Err(unsupported(extra));
        }

        let name = field(node, "name")?;
        self.write("function ");
        self.write(self.text(name));

        self.write("(");
        for (i, parameter) in named_children(field(node, "parameters")?).into_iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.parameter(parameter)?;
        }
        self.write(") ");

        self.block(field(node, "body")?)
    }

    fn parameter(&mut self, node: Node<'_>) -> Result<()> {
        let pattern = match node.kind() {
            "identifier" => node,
            "required_parameter" => {
                if let Some(extra) = node
                    .child_by_field_name("type")
                    .or_else(|| node.child_by_field_name("value"))
                {
                    return Err(unsupported(extra));
                }
                field(node, "pattern")?
            }
            _ => return Err(unsupported(node)),
        };

        if pattern.kind() != "identifier" {
            return Err(unsupported(pattern));
        }
        self.write(self.text(pattern));
        Ok(())
    }

    fn block(&mut self, node: Node<'_>) -> Result<()> {
        let statements = named_children(node);
        if statements.is_empty() {
            self.write("{}");
            return Ok(());
        }

        self.write("{");
        self.write_line();
        self.indent += 1;
        for statement in statements {
            self.statement(statement)?;
            self.write_line();
        }
        self.indent -= 1;
        self.write("}");
        Ok(())
    }

    fn expression(&mut self, node: Node<'_>) -> Result<()> {
        match node.kind() {
            "identifier" | "number" | "true" | "false" | "null" | "undefined" => {
                self.write(self.text(node));
                Ok(())
            }
            "string" => {
                let quoted = requote(self.text(node));
                self.write(&quoted);
                Ok(())
            }
            // Redundant around a single expression
            "parenthesized_expression" => self.expression(first_named(node)?),
            "jsx_self_closing_element" => {
                if let Some(attribute) = node.child_by_field_name("attribute") {
                    return Err(unsupported(attribute));
                }
                self.write("<");
                self.write(self.text(field(node, "name")?));
                self.write(" />");
                Ok(())
            }
            "jsx_element" => self.fragment(node),
            _ => Err(unsupported(node)),
        }
    }

    /// `<></>`, the only paired markup a stub contains
    fn fragment(&mut self, node: Node<'_>) -> Result<()> {
        let open = field(node, "open_tag")?;
        if let Some(name) = open.child_by_field_name("name") {
            return Err(unsupported(name));
        }

        let close = field(node, "close_tag")?;
        let child = named_children(node).into_iter().find(|child| {
            child.id() != open.id()
                && child.id() != close.id()
                && !(child.kind() == "jsx_text" && self.text(*child).trim().is_empty())
        });
        if let Some(child) = child {
            return Err(unsupported(child));
        }

        self.write("<></>");
        Ok(())
    }
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn first_named(node: Node<'_>) -> Result<Node<'_>> {
    named_children(node)
        .first()
        .copied()
        .ok_or_else(|| unsupported(node))
}

fn field<'t>(node: Node<'t>, name: &str) -> Result<Node<'t>> {
    node.child_by_field_name(name)
        .ok_or_else(|| unsupported(node))
}

fn unsupported(node: Node<'_>) -> StubError {
    StubError::Unsupported {
        kind: node.kind().to_string(),
        line: node.start_position().row + 1,
    }
}

/// Re-quote a string literal with `QUOTE`, unless the content holds more
/// of it than of the alternative
fn requote(raw: &str) -> String {
    let Some(content) = strip_quotes(raw) else {
        return raw.to_string();
    };

    let quote = choose_quote(content);
    let mut out = String::with_capacity(raw.len());
    out.push(quote);

    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) if (next == '\'' || next == '"') && next != quote => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else if c == quote {
            out.push('\\');
            out.push(c);
        } else {
            out.push(c);
        }
    }

    out.push(quote);
    out
}

fn strip_quotes(raw: &str) -> Option<&str> {
    let first = raw.chars().next()?;
    if raw.len() < 2 || !(first == '\'' || first == '"') || !raw.ends_with(first) {
        return None;
    }
    Some(&raw[1..raw.len() - 1])
}

fn choose_quote(content: &str) -> char {
    let alternate = if QUOTE == '\'' { '"' } else { '\'' };
    let count = |quote: char| content.chars().filter(|c| *c == quote).count();
    if count(QUOTE) > count(alternate) {
        alternate
    } else {
        QUOTE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(source: &str) -> Result<String> {
        Formatter::new()?.format(source)
    }

    #[test]
    fn test_null_stub() {
        let stub = render_component_stub("Widget", StubBody::Null).unwrap();
        assert_eq!(stub, "function Widget() {\n    return null;\n}\n");
    }

    #[test]
    fn test_fragment_stub() {
        let stub = render_component_stub("Panel", StubBody::Fragment).unwrap();
        assert_eq!(stub, "function Panel() {\n    return <></>;\n}\n");
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        let result = render_component_stub("2fast", StubBody::Null);
        assert!(matches!(result, Err(StubError::Template(_))));
    }

    #[test]
    fn test_parameters_and_nesting() {
        assert_eq!(
            format("function Card(props,ref){ { return (('x')) } }").unwrap(),
            "function Card(props, ref) {\n    {\n        return 'x';\n    }\n}\n"
        );
        assert_eq!(format("function Empty(){}").unwrap(), "function Empty() {}\n");
    }

    #[test]
    fn test_markup_subset() {
        assert_eq!(format("<Spinner/>").unwrap(), "<Spinner />;\n");
        assert_eq!(format("(<>\n</>)").unwrap(), "<></>;\n");
    }

    #[test]
    fn test_string_quotes() {
        assert_eq!(format(r#""a""#).unwrap(), "'a';\n");
        assert_eq!(format(r#"'b\'c'"#).unwrap(), "\"b'c\";\n");
    }

    #[test]
    fn test_unsupported_construct() {
        assert!(matches!(
            format("class A {}"),
            Err(StubError::Unsupported { ref kind, line: 1 }) if kind == "class_declaration"
        ));
        assert!(matches!(
            format("function Card(props: Props){ return null }"),
            Err(StubError::Unsupported { .. })
        ));
        assert!(matches!(
            format("<Button label='Save' />"),
            Err(StubError::Unsupported { ref kind, .. }) if kind == "jsx_attribute"
        ));
        assert!(matches!(
            format("<Panel>text</Panel>"),
            Err(StubError::Unsupported { .. })
        ));
        assert!(matches!(
            format("f(x)"),
            Err(StubError::Unsupported { ref kind, .. }) if kind == "call_expression"
        ));
    }

    #[test]
    fn test_requote_escapes() {
        assert_eq!(requote(r#""say \"hi\"""#), r#"'say "hi"'"#);
        assert_eq!(requote(r#""it's""#), r#""it's""#);
        assert_eq!(requote(r#"'a\nb'"#), r#"'a\nb'"#);
    }
}
