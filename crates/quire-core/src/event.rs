//! Event system for session notifications.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! The session never calls back into the UI. It publishes values on a
//! `tokio::sync::broadcast` channel and whoever cares subscribes:
//! toolbars re-read active marks on `SelectionChanged`, the gallery panel
//! re-renders on `AssetsRefreshed`, a status line shows `UploadFailed`.

use quire_model::Selection;
use tokio::sync::broadcast;

use crate::draft::FieldName;

/// Events published by an editing session.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    // Document events
    /// A transaction produced a new document version
    DocumentChanged { version: u64 },
    /// The selection moved without changing the document
    SelectionChanged(Selection),
    /// A transaction was rejected and nothing changed
    TransactionFailed { reason: String },

    // Gallery events
    /// The asset list was fetched
    AssetsRefreshed { count: usize },
    /// Fetching the asset list failed; the cached list is still served
    AssetListFailed { reason: String },
    /// An upload started
    UploadStarted { name: String },
    /// An upload finished and the asset is in the gallery
    UploadFinished { src: String },
    /// An upload failed
    UploadFailed { name: String, reason: String },

    // Draft events
    /// A metadata field was edited
    DraftFieldChanged(FieldName),
    /// The draft was loaded from a saved post
    DraftHydrated,
    /// Saved content could not be parsed; the editor started empty
    ContentFallback { reason: String },
}

/// Event bus for broadcasting session events.
///
/// Lagged receivers never block the sender; they skip ahead.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: EditorEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

/// Helper for processing events asynchronously.
///
/// ## Example
///
/// ```ignore
/// let mut handler = EventHandler::new(session.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = handler.next().await {
///         if let EditorEvent::UploadFailed { name, reason } = event {
///             status.show(format!("{name}: {reason}"));
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<EditorEvent>,
}

impl EventHandler {
    pub fn new(receiver: broadcast::Receiver<EditorEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event. Returns `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<EditorEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
