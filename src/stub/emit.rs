use lsp_types::{Position, Range, TextEdit, Uri, WorkspaceEdit};
use std::collections::HashMap;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::error::{Result, StubError};
use super::format::render_component_stub;
use crate::config::{LineSource, StubBody};
use crate::document::{uri_to_file_path, DocumentSnapshot};

const READ_CHUNK: usize = 64 * 1024;

/// Count line-feed bytes in a file as it is on disk
pub async fn count_line_feeds(path: &Path) -> Result<usize> {
    let read_failed = |source| StubError::ReadFailed {
        path: path.display().to_string(),
        source,
    };

    let mut file = tokio::fs::File::open(path).await.map_err(read_failed)?;
    let mut buffer = vec![0u8; READ_CHUNK];
    let mut count = 0;

    loop {
        let read = file.read(&mut buffer).await.map_err(read_failed)?;
        if read == 0 {
            break;
        }
        count += buffer[..read].iter().filter(|b| **b == b'\n').count();
    }

    Ok(count)
}

/// Edit that inserts `stub` on its own, surrounded by blank lines, at `line`
pub fn insertion_edit(line: u32, stub: &str) -> TextEdit {
    let position = Position::new(line, 0);
    TextEdit::new(Range::new(position, position), format!("\n{stub}\n"))
}

/// Format the stub for `component_name` and place it after the last line
/// of the document
///
/// With `LineSource::Disk` the line count comes from the saved file and can
/// lag behind unsaved edits.
pub async fn plan_stub_edit(
    uri: &Uri,
    snapshot: &DocumentSnapshot,
    component_name: &str,
    line_source: LineSource,
    stub_body: StubBody,
) -> Result<WorkspaceEdit> {
    let stub = render_component_stub(component_name, stub_body)?;

    let line_count = match line_source {
        LineSource::Disk => {
            let path = uri_to_file_path(uri)
                .ok_or_else(|| StubError::NotAFile(uri.as_str().to_string()))?;
            count_line_feeds(&path).await?
        }
        LineSource::Buffer => snapshot.line_feed_count(),
    };

    debug!(
        "Appending stub for {} at line {} of {} ({:?})",
        component_name,
        line_count,
        uri.as_str(),
        line_source
    );

    let edit = insertion_edit(line_count as u32, &stub);
    Ok(WorkspaceEdit {
        changes: Some(HashMap::from([(uri.clone(), vec![edit])])),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_uri(path: &Path) -> Uri {
        url::Url::from_file_path(path)
            .unwrap()
            .as_str()
            .parse()
            .unwrap()
    }

    fn single_edit(edit: &WorkspaceEdit, uri: &Uri) -> TextEdit {
        edit.changes.as_ref().unwrap()[uri][0].clone()
    }

    #[tokio::test]
    async fn test_count_line_feeds() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("App.tsx");

        std::fs::write(&path, "")?;
        assert_eq!(count_line_feeds(&path).await?, 0);

        std::fs::write(&path, "a\nb\r\nc\n")?;
        assert_eq!(count_line_feeds(&path).await?, 3);

        // Spans several read chunks
        std::fs::write(&path, "x\n".repeat(READ_CHUNK))?;
        assert_eq!(count_line_feeds(&path).await?, READ_CHUNK);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = count_line_feeds(Path::new("/nonexistent/react-refactor/App.tsx")).await;
        assert!(matches!(result, Err(StubError::ReadFailed { .. })));
    }

    #[test]
    fn test_insertion_edit() {
        let edit = insertion_edit(3, "function Widget() {\n    return null;\n}\n");
        assert_eq!(edit.range, Range::new(Position::new(3, 0), Position::new(3, 0)));
        assert_eq!(edit.new_text, "\nfunction Widget() {\n    return null;\n}\n\n");
    }

    #[tokio::test]
    async fn test_disk_line_count_ignores_unsaved_text() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("App.tsx");
        std::fs::write(&path, "const x = <Widget />;\n")?;
        let uri = file_uri(&path);

        // The buffer has two more lines than the saved file
        let snapshot = DocumentSnapshot::new("const x = <Widget />;\n\n\n", 2);

        let edit = plan_stub_edit(&uri, &snapshot, "Widget", LineSource::Disk, StubBody::Null).await?;
        assert_eq!(single_edit(&edit, &uri).range.start, Position::new(1, 0));

        let edit =
            plan_stub_edit(&uri, &snapshot, "Widget", LineSource::Buffer, StubBody::Null).await?;
        assert_eq!(single_edit(&edit, &uri).range.start, Position::new(3, 0));
        Ok(())
    }

    #[tokio::test]
    async fn test_non_file_uri_with_disk_source() {
        let uri: Uri = "untitled:Untitled-1".parse().unwrap();
        let snapshot = DocumentSnapshot::new("<Widget />", 1);

        let result =
            plan_stub_edit(&uri, &snapshot, "Widget", LineSource::Disk, StubBody::Null).await;
        assert!(matches!(result, Err(StubError::NotAFile(_))));
    }
}
