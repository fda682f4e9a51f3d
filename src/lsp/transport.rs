use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
    BufReader as AsyncBufReader,
};
use tracing::trace;

use crate::lsp::error::{LspError, Result};

/// Reads `Content-Length` framed messages
pub struct MessageReader<R> {
    reader: AsyncBufReader<R>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: AsyncBufReader::new(reader),
        }
    }

    /// Read the next message body, or `None` once the stream ends cleanly
    pub async fn read_message(&mut self) -> Result<Option<String>> {
        // Read headers
        let mut content_length = None;
        let mut saw_header = false;
        loop {
            let mut line = String::new();
            let read = self.reader.read_line(&mut line).await?;

            if read == 0 {
                if saw_header {
                    return Err(LspError::Transport(
                        "Stream ended inside message headers".to_string(),
                    ));
                }
                return Ok(None);
            }

            if line == "\r\n" || line == "\n" {
                break;
            }
            saw_header = true;

            let Some((name, value)) = line.split_once(':') else {
                return Err(LspError::Transport(format!(
                    "Malformed header: {}",
                    line.trim_end()
                )));
            };
            if name.trim().eq_ignore_ascii_case("Content-Length") {
                let len = value.trim().parse::<usize>().map_err(|e| {
                    LspError::Transport(format!("Failed to parse content length: {}", e))
                })?;
                content_length = Some(len);
            }
        }

        let content_length = content_length
            .ok_or_else(|| LspError::Transport("Missing Content-Length header".to_string()))?;

        // Read the message body
        let mut buffer = vec![0u8; content_length];
        self.reader.read_exact(&mut buffer).await?;

        let body = String::from_utf8(buffer)
            .map_err(|e| LspError::Transport(format!("Message body is not UTF-8: {}", e)))?;
        trace!("Received LSP message: {}", body);
        Ok(Some(body))
    }
}

/// Writes `Content-Length` framed messages
pub struct MessageWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_message(&mut self, msg: &str) -> Result<()> {
        let header = format!("Content-Length: {}\r\n\r\n", msg.len());

        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(msg.as_bytes()).await?;
        self.writer.flush().await?;

        trace!("Sent LSP message: {}", msg);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_over_duplex() -> Result<()> {
        let (client, server) = tokio::io::duplex(1024);
        let mut writer = MessageWriter::new(client);
        let mut reader = MessageReader::new(server);

        writer
            .write_message(r#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#)
            .await?;
        writer.write_message(r#"{"jsonrpc":"2.0","method":"exit"}"#).await?;
        drop(writer);

        assert_eq!(
            reader.read_message().await?.as_deref(),
            Some(r#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#)
        );
        assert_eq!(
            reader.read_message().await?.as_deref(),
            Some(r#"{"jsonrpc":"2.0","method":"exit"}"#)
        );
        assert_eq!(reader.read_message().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_extra_headers_and_multibyte_body() -> Result<()> {
        let body = r#"{"text":"é"}"#;
        let raw = format!(
            "Content-Type: application/vscode-jsonrpc; charset=utf-8\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let mut reader = MessageReader::new(raw.as_bytes());

        assert_eq!(reader.read_message().await?.as_deref(), Some(body));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_content_length() {
        let mut reader = MessageReader::new("Content-Type: x\r\n\r\n{}".as_bytes());
        assert!(matches!(
            reader.read_message().await,
            Err(LspError::Transport(_))
        ));
    }
}
