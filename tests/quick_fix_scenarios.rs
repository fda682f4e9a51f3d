use anyhow::Result;
use lsp_types::{
    CodeActionOrCommand, Diagnostic, NumberOrString, Position, Range, TextEdit, Uri,
};
use react_refactor::config::{LineSource, StubBody};
use react_refactor::document::DocumentSnapshot;
use react_refactor::locator;
use react_refactor::quickfix::QuickFixProvider;
use react_refactor::stub::plan_stub_edit;
use tempfile::TempDir;

fn undefined_name(range: Range) -> Diagnostic {
    Diagnostic {
        range,
        code: Some(NumberOrString::Number(2304)),
        message: "Cannot find name".to_string(),
        ..Default::default()
    }
}

fn command_argument(action: &CodeActionOrCommand) -> Option<String> {
    let CodeActionOrCommand::CodeAction(action) = action else {
        return None;
    };
    action.command.as_ref()?.arguments.as_ref()?.first()?.as_str().map(str::to_string)
}

fn file_uri(path: &std::path::Path) -> Result<Uri> {
    let url = url::Url::from_file_path(path).map_err(|_| anyhow::anyhow!("not absolute"))?;
    Ok(url.as_str().parse()?)
}

/// Self-closing usage: the action is offered and accepting it appends the stub
#[tokio::test]
async fn test_self_closing_component_is_declared() -> Result<()> {
    let text = "const x = <Widget />;";
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("App.tsx");
    std::fs::write(&path, text)?;
    let uri = file_uri(&path)?;

    let snapshot = DocumentSnapshot::new(text, 1);
    let diagnostics = vec![undefined_name(Range::new(
        Position::new(0, 11),
        Position::new(0, 17),
    ))];

    let mut provider = QuickFixProvider::new()?;
    let actions = provider.provide_code_actions(&snapshot, Position::new(0, 14), &diagnostics);
    assert_eq!(actions.len(), 1);

    let name = command_argument(&actions[0]).expect("command argument");
    assert_eq!(name, "Widget");

    let edit = plan_stub_edit(&uri, &snapshot, &name, LineSource::Disk, StubBody::Null).await?;
    let changes = edit.changes.expect("changes");
    assert_eq!(
        changes[&uri],
        vec![TextEdit::new(
            Range::new(Position::new(0, 0), Position::new(0, 0)),
            "\nfunction Widget() {\n    return null;\n}\n\n".to_string(),
        )]
    );
    Ok(())
}

/// A paired usage spans the whole element including nested markup
#[test]
fn test_paired_element_span() {
    let text = "<Panel>\n  <span>hi</span>\n</Panel>";
    let span = locator::locate(text, "Panel").expect("span");

    assert_eq!(span.start, 0);
    assert_eq!(span.end, text.len());
    assert_eq!(span.slice(text), Some(text));
}

/// A paired usage inside a file also gets the quick-fix
#[test]
fn test_paired_element_offers_action() -> Result<()> {
    let text = "export const view = (\n    <Panel>\n        <span>hi</span>\n    </Panel>\n);\n";
    let snapshot = DocumentSnapshot::new(text, 1);
    let diagnostics = vec![undefined_name(Range::new(
        Position::new(1, 5),
        Position::new(1, 10),
    ))];

    let mut provider = QuickFixProvider::new()?;
    let actions = provider.provide_code_actions(&snapshot, Position::new(1, 7), &diagnostics);

    assert_eq!(actions.len(), 1);
    assert_eq!(command_argument(&actions[0]).as_deref(), Some("Panel"));
    Ok(())
}

/// A comparison operand is never treated as a component
#[test]
fn test_comparison_operand_is_not_a_component() -> Result<()> {
    let text = "if (a < b) { foo() }";
    let snapshot = DocumentSnapshot::new(text, 1);
    let diagnostics = vec![undefined_name(Range::new(
        Position::new(0, 8),
        Position::new(0, 9),
    ))];

    assert_eq!(locator::locate(text, "b"), None);

    let mut provider = QuickFixProvider::new()?;
    let actions = provider.provide_code_actions(&snapshot, Position::new(0, 8), &diagnostics);
    assert!(actions.is_empty());
    Ok(())
}

#[test]
fn test_repeated_requests_give_the_same_action() -> Result<()> {
    let snapshot = DocumentSnapshot::new("const x = <Widget />;", 1);
    let diagnostics = vec![undefined_name(Range::new(
        Position::new(0, 11),
        Position::new(0, 17),
    ))];

    let mut provider = QuickFixProvider::new()?;
    let first = provider.provide_code_actions(&snapshot, Position::new(0, 12), &diagnostics);
    let second = provider.provide_code_actions(&snapshot, Position::new(0, 12), &diagnostics);

    assert_eq!(first, second);
    Ok(())
}

/// The stub lands after the last line of a multi-line file on disk
#[tokio::test]
async fn test_stub_goes_after_last_saved_line() -> Result<()> {
    let text = "import React from 'react';\n\nexport function App() {\n    return <Widget />;\n}\n";
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("App.jsx");
    std::fs::write(&path, text)?;
    let uri = file_uri(&path)?;

    let snapshot = DocumentSnapshot::new(text, 1);
    let edit =
        plan_stub_edit(&uri, &snapshot, "Widget", LineSource::Disk, StubBody::Fragment).await?;
    let edits = &edit.changes.expect("changes")[&uri];

    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].range.start, Position::new(5, 0));
    assert_eq!(
        edits[0].new_text,
        "\nfunction Widget() {\n    return <></>;\n}\n\n"
    );
    Ok(())
}
