use lsp_types::request::ApplyWorkspaceEdit;
use lsp_types::{
    ApplyWorkspaceEditParams, CodeActionKind, CodeActionOptions, CodeActionOrCommand,
    CodeActionParams, CodeActionProviderCapability, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, ExecuteCommandOptions,
    ExecuteCommandParams, InitializeParams, InitializeResult, MessageType, ServerCapabilities,
    ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind, Uri,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::config::constants::{DECLARE_COMPONENT_TITLE, DECLARE_UNDEFINED_COMPONENT, SERVER_NAME};
use crate::config::Config;
use crate::core::Result;
use crate::document::{DocumentSnapshot, DocumentStore};
use crate::lsp::client::ClientHandle;
use crate::lsp::error::LspError;
use crate::lsp::transport::{MessageReader, MessageWriter};
use crate::lsp::types::{
    Message, NotificationMessage, RequestMessage, ResponseError, ResponseMessage, INVALID_REQUEST,
    PARSE_ERROR, SERVER_NOT_INITIALIZED,
};
use crate::quickfix::QuickFixProvider;
use crate::stub::plan_stub_edit;

/// How long queued output may take to drain after `exit`
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Running,
    ShuttingDown,
}

/// Whether the message loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Serve LSP over the given streams until the client sends `exit` or
/// closes the input
///
/// Returns whether `shutdown` was received first, which decides the exit
/// status.
pub async fn run<R, W>(input: R, output: W, config: Config) -> Result<bool>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_loop(MessageWriter::new(output), rx));

    let client = ClientHandle::new(tx);
    let mut server = Server::new(config, client.clone())?;
    let mut reader = MessageReader::new(input);

    info!("{} {} started", SERVER_NAME, env!("CARGO_PKG_VERSION"));

    while let Some(raw) = reader.read_message().await? {
        if server.handle_raw(&raw) == Flow::Exit {
            break;
        }
    }

    let clean = server.state == State::ShuttingDown;
    drop(server);
    drop(client);

    // Emission tasks still holding a client handle keep the writer alive
    if tokio::time::timeout(DRAIN_TIMEOUT, writer_task).await.is_err() {
        debug!("Writer still busy after exit, dropping remaining output");
    }

    info!("{} stopped", SERVER_NAME);
    Ok(clean)
}

async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: MessageWriter<W>,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(message) = rx.recv().await {
        if let Err(e) = writer.write_message(&message).await {
            error!("Failed to write to client: {}", e);
            break;
        }
    }
}

/// Per-connection server state
pub struct Server {
    config: Config,
    client: ClientHandle,
    documents: DocumentStore,
    quick_fix: QuickFixProvider,
    state: State,
}

impl Server {
    pub fn new(config: Config, client: ClientHandle) -> Result<Self> {
        Ok(Self {
            config,
            client,
            documents: DocumentStore::new(),
            quick_fix: QuickFixProvider::new()?,
            state: State::Uninitialized,
        })
    }

    fn handle_raw(&mut self, raw: &str) -> Flow {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable message from client: {}", e);
                self.reply_error(None, ResponseError::new(PARSE_ERROR, e.to_string()));
                return Flow::Continue;
            }
        };

        match serde_json::from_value::<Message>(value) {
            Ok(Message::Request(request)) => {
                self.handle_request(request);
                Flow::Continue
            }
            Ok(Message::Notification(notification)) => self.handle_notification(notification),
            Ok(Message::Response(response)) => {
                self.client.complete(response);
                Flow::Continue
            }
            Err(e) => {
                warn!("Invalid JSON-RPC message: {}", e);
                self.reply_error(None, ResponseError::new(INVALID_REQUEST, e.to_string()));
                Flow::Continue
            }
        }
    }

    fn handle_request(&mut self, request: RequestMessage) {
        debug!("Request {:?}: {}", request.id, request.method);

        if self.state == State::Uninitialized && request.method != "initialize" {
            let error = ResponseError::new(SERVER_NOT_INITIALIZED, "Server not initialized");
            self.reply_error(Some(request.id), error);
            return;
        }
        if self.state == State::ShuttingDown {
            let error = ResponseError::new(INVALID_REQUEST, "Server is shutting down");
            self.reply_error(Some(request.id), error);
            return;
        }

        let result = match request.method.as_str() {
            "initialize" => {
                parse_params(request.params).map(|params| self.initialize(params))
            }
            "shutdown" => {
                self.state = State::ShuttingDown;
                Ok(Value::Null)
            }
            "textDocument/codeAction" => {
                parse_params(request.params).map(|params| self.code_actions(params))
            }
            "workspace/executeCommand" => parse_params(request.params)
                .and_then(|params| self.execute_command(params))
                .map(|()| Value::Null),
            method => Err(ResponseError::method_not_found(method)),
        };

        let response = match result {
            Ok(value) => ResponseMessage::success(request.id, value),
            Err(error) => ResponseMessage::failure(Some(request.id), error),
        };
        self.reply(response);
    }

    fn handle_notification(&mut self, notification: NotificationMessage) -> Flow {
        match notification.method.as_str() {
            "initialized" => info!("Client initialized"),
            "exit" => return Flow::Exit,
            "textDocument/didOpen" => {
                if let Ok(params) = parse_params::<DidOpenTextDocumentParams>(notification.params) {
                    self.documents.open(params.text_document);
                }
            }
            "textDocument/didChange" => {
                if let Ok(params) = parse_params::<DidChangeTextDocumentParams>(notification.params) {
                    self.documents.change(
                        &params.text_document.uri,
                        params.text_document.version,
                        params.content_changes,
                    );
                }
            }
            "textDocument/didClose" => {
                if let Ok(params) = parse_params::<DidCloseTextDocumentParams>(notification.params) {
                    self.documents.close(&params.text_document.uri);
                }
            }
            method => trace!("Unhandled notification: {}", method),
        }
        Flow::Continue
    }

    fn initialize(&mut self, params: InitializeParams) -> Value {
        if let Some(info) = &params.client_info {
            info!(
                "Initializing for {} {}",
                info.name,
                info.version.as_deref().unwrap_or("")
            );
        }
        self.state = State::Running;

        let result = InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                code_action_provider: Some(CodeActionProviderCapability::Options(
                    CodeActionOptions {
                        code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                        ..Default::default()
                    },
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![DECLARE_UNDEFINED_COMPONENT.to_string()],
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: SERVER_NAME.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        };
        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    fn code_actions(&mut self, params: CodeActionParams) -> Value {
        let uri = params.text_document.uri;
        self.documents.focus(&uri);

        let actions: Vec<CodeActionOrCommand> = match self.documents.get(&uri) {
            Some(document) => self.quick_fix.provide_code_actions(
                &document.snapshot,
                params.range.end,
                &params.context.diagnostics,
            ),
            None => {
                debug!("Code actions for untracked document {}", uri.as_str());
                Vec::new()
            }
        };

        serde_json::to_value(actions).unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    fn execute_command(&mut self, params: ExecuteCommandParams) -> std::result::Result<(), ResponseError> {
        if params.command != DECLARE_UNDEFINED_COMPONENT {
            return Err(ResponseError::invalid_params(format!(
                "Unknown command: {}",
                params.command
            )));
        }

        let Some(component_name) = params.arguments.first().and_then(Value::as_str) else {
            return Err(ResponseError::invalid_params(
                "Expected the component name as the only argument",
            ));
        };

        let Some(document) = self.documents.active() else {
            warn!("No active document to declare {} in", component_name);
            return Ok(());
        };

        tokio::spawn(declare_component(
            self.client.clone(),
            document.uri.clone(),
            document.snapshot.clone(),
            component_name.to_string(),
            self.config.clone(),
        ));
        Ok(())
    }

    fn reply(&self, response: ResponseMessage) {
        if let Err(e) = self.client.send_response(response) {
            error!("Failed to queue response: {}", e);
        }
    }

    fn reply_error(&self, id: Option<crate::lsp::types::RequestId>, error: ResponseError) {
        self.reply(ResponseMessage::failure(id, error));
    }
}

/// Append the stub for `component_name` to the document at `uri`
async fn declare_component(
    client: ClientHandle,
    uri: Uri,
    snapshot: DocumentSnapshot,
    component_name: String,
    config: Config,
) {
    let edit = match plan_stub_edit(
        &uri,
        &snapshot,
        &component_name,
        config.insert_line,
        config.stub_body,
    )
    .await
    {
        Ok(edit) => edit,
        Err(e) => {
            error!("Failed to declare {}: {}", component_name, e);
            let message = format!("Could not declare component {}: {}", component_name, e);
            if let Err(e) = client.show_message(MessageType::ERROR, message) {
                error!("Failed to notify client: {}", e);
            }
            return;
        }
    };

    let params = ApplyWorkspaceEditParams {
        label: Some(DECLARE_COMPONENT_TITLE.to_string()),
        edit,
    };
    match client.send_request::<ApplyWorkspaceEdit>(params).await {
        Ok(response) if response.applied => info!("Declared {}", component_name),
        Ok(response) => warn!(
            "Client did not apply stub for {}: {}",
            component_name,
            response.failure_reason.as_deref().unwrap_or("no reason given")
        ),
        Err(LspError::ConnectionClosed) => debug!("Connection closed before stub was applied"),
        Err(e) => warn!("applyEdit for {} failed: {}", component_name, e),
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> std::result::Result<T, ResponseError> {
    serde_json::from_value(params).map_err(|e| {
        debug!("Invalid params: {}", e);
        ResponseError::invalid_params(e.to_string())
    })
}
