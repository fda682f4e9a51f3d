use lsp_types::notification::{Notification, ShowMessage};
use lsp_types::request::Request;
use lsp_types::{MessageType, ShowMessageParams};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::lsp::error::{LspError, Result};
use crate::lsp::types::{NotificationMessage, RequestId, RequestMessage, ResponseMessage};

type PendingRequests = Arc<Mutex<FxHashMap<RequestId, oneshot::Sender<ResponseMessage>>>>;

/// Handle for talking back to the connected client
///
/// Outgoing messages go through a channel to the writer task. Responses to
/// server-initiated requests are matched by id in the pending table.
#[derive(Clone)]
pub struct ClientHandle {
    outgoing: mpsc::UnboundedSender<String>,
    pending: PendingRequests,
    next_id: Arc<AtomicI64>,
}

impl ClientHandle {
    pub fn new(outgoing: mpsc::UnboundedSender<String>) -> Self {
        Self {
            outgoing,
            pending: Arc::new(Mutex::new(FxHashMap::default())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    fn send<T: Serialize>(&self, message: &T) -> Result<()> {
        let text = serde_json::to_string(message)?;
        self.outgoing
            .send(text)
            .map_err(|_| LspError::ConnectionClosed)
    }

    pub fn send_response(&self, response: ResponseMessage) -> Result<()> {
        self.send(&response)
    }

    pub fn send_notification<N: Notification>(&self, params: N::Params) -> Result<()> {
        let message = NotificationMessage::new(N::METHOD, serde_json::to_value(params)?);
        self.send(&message)
    }

    /// Show a message in the client's UI
    pub fn show_message(&self, typ: MessageType, message: impl Into<String>) -> Result<()> {
        self.send_notification::<ShowMessage>(ShowMessageParams {
            typ,
            message: message.into(),
        })
    }

    /// Send a request to the client and wait for its response
    pub async fn send_request<R: Request>(&self, params: R::Params) -> Result<R::Result> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.pending_requests().insert(id.clone(), tx);

        let message = RequestMessage::new(id.clone(), R::METHOD, serde_json::to_value(params)?);
        if let Err(e) = self.send(&message) {
            self.pending_requests().remove(&id);
            return Err(e);
        }
        debug!("Sent {} request {:?}", R::METHOD, id);

        let response = rx.await.map_err(|_| LspError::ConnectionClosed)?;
        if let Some(error) = response.error {
            return Err(LspError::ClientError {
                code: error.code,
                message: error.message,
            });
        }

        let result = response.result.unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(result)?)
    }

    /// Route a response from the client to the request waiting for it
    pub fn complete(&self, response: ResponseMessage) {
        let Some(id) = response.id.clone() else {
            warn!("Client sent a response without an id: {:?}", response.error);
            return;
        };

        match self.pending_requests().remove(&id) {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => warn!("Response for unknown request {:?}", id),
        }
    }

    fn pending_requests(
        &self,
    ) -> std::sync::MutexGuard<'_, FxHashMap<RequestId, oneshot::Sender<ResponseMessage>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
