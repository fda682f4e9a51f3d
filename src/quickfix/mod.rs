use lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Command, Diagnostic, NumberOrString, Position,
    Range,
};
use tracing::debug;

use crate::config::constants::{
    DECLARE_COMPONENT_TITLE, DECLARE_UNDEFINED_COMPONENT, UNDEFINED_NAME_CODE,
};
use crate::document::DocumentSnapshot;
use crate::locator;
use crate::parser::error::Result;
use crate::parser::{ExpressionKind, TsxParser};

/// Produces the quick-fix for undefined components used as markup
pub struct QuickFixProvider {
    parser: TsxParser,
}

impl QuickFixProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: TsxParser::new()?,
        })
    }

    /// Return zero or one actions for the diagnostic under `caret`
    ///
    /// Every failure along the way means "no action"; nothing is surfaced
    /// to the caller.
    pub fn provide_code_actions(
        &mut self,
        snapshot: &DocumentSnapshot,
        caret: Position,
        diagnostics: &[Diagnostic],
    ) -> Vec<CodeActionOrCommand> {
        let Some(diagnostic) = select_diagnostic(diagnostics, caret) else {
            debug!("No diagnostic at {}:{}", caret.line, caret.character);
            return Vec::new();
        };

        if !is_undefined_name(diagnostic) {
            debug!("Diagnostic at caret has code {:?}", diagnostic.code);
            return Vec::new();
        }

        let component_name = snapshot.text_in(diagnostic.range);
        if !is_identifier(&component_name) {
            debug!("Flagged text {:?} is not an identifier", component_name);
            return Vec::new();
        }

        let text = snapshot.text();
        let Some(span) = locator::locate(&text, &component_name) else {
            debug!("No markup usage of {}", component_name);
            return Vec::new();
        };

        let element_text = snapshot.text_in_span(span);
        match self.parser.classify_expression(&element_text) {
            Ok(ExpressionKind::Markup) => {}
            Ok(ExpressionKind::Other(kind)) => {
                debug!("Usage of {} parsed as {}, not markup", component_name, kind);
                return Vec::new();
            }
            Err(e) => {
                debug!("Usage of {} does not parse: {}", component_name, e);
                return Vec::new();
            }
        }

        vec![CodeActionOrCommand::CodeAction(declare_component_action(
            &component_name,
            diagnostic,
        ))]
    }
}

/// First diagnostic whose range contains `caret`, ends inclusive
pub fn select_diagnostic(diagnostics: &[Diagnostic], caret: Position) -> Option<&Diagnostic> {
    diagnostics
        .iter()
        .find(|diagnostic| range_contains(&diagnostic.range, caret))
}

pub fn is_undefined_name(diagnostic: &Diagnostic) -> bool {
    matches!(diagnostic.code, Some(NumberOrString::Number(code)) if code == UNDEFINED_NAME_CODE)
}

/// The quick-fix offered for `component_name`
pub fn declare_component_action(component_name: &str, diagnostic: &Diagnostic) -> CodeAction {
    CodeAction {
        title: DECLARE_COMPONENT_TITLE.to_string(),
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: Some(vec![diagnostic.clone()]),
        command: Some(Command {
            title: DECLARE_COMPONENT_TITLE.to_string(),
            command: DECLARE_UNDEFINED_COMPONENT.to_string(),
            arguments: Some(vec![serde_json::Value::String(component_name.to_string())]),
        }),
        ..Default::default()
    }
}

fn range_contains(range: &Range, position: Position) -> bool {
    range.start <= position && position <= range.end
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
