//! The editing session.
//!
//! ## Learning: The Facade Pattern
//!
//! `EditorSession` is the one type a UI talks to. It owns the live
//! document, the selection, the undo history and the post metadata, and
//! routes toolbar names, key chords and gallery choices to the engine and
//! the asset coordinator underneath.
//!
//! ## Apply, Then Re-derive
//!
//! Every mutation goes through [`EditorSession::apply_chain`]. Derived
//! state such as [`EditorSession::active_marks`] or
//! [`EditorSession::link_at`] is computed on demand from the current
//! document, so it can never go stale between transactions.

use std::sync::Arc;

use quire_model::{
    ChangeKind, Document, History, Mark, MarkRange, MarkSet, MarkType, Schema, Selection,
    Snapshot, mark_around,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::assets::{Asset, AssetCoordinator, GalleryClient, UploadLimits, asset_node};
use crate::command::{Command, ToolbarAction};
use crate::config::Config;
use crate::draft::{self, DraftField, DraftFields, FieldName, PostDraft, SavedPost};
use crate::event::{EditorEvent, EventBus};
use crate::keymap::{KeyPress, Keymap};
use crate::transaction::Engine;
use crate::{CoreError, CoreResult};

/// A link under the caret, ready for the link dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdit {
    pub range: MarkRange,
    pub href: String,
    pub label: Option<String>,
}

/// An editing session for one post.
///
/// ## Thread Safety
///
/// The session is owned by one task. Gallery work can run elsewhere on a
/// clone of [`EditorSession::assets`]; its results land in the shared
/// asset cache and are picked up on the next insert.
pub struct EditorSession {
    engine: Engine,
    document: Document,
    selection: Selection,
    history: History,
    keymap: Keymap,
    assets: AssetCoordinator,
    fields: DraftFields,
    events: EventBus,
}

impl EditorSession {
    /// Creates a session for a new, empty post.
    pub fn new(config: &Config, client: Arc<dyn GalleryClient>) -> Self {
        let events = EventBus::new();
        let engine = Engine::new(Schema::new(config.editor.max_heading_level));
        let history = History::new(config.editor.undo_limit)
            .with_coalesce_threshold(config.editor.coalesce_window());
        let assets = AssetCoordinator::new(
            client,
            UploadLimits::from(&config.gallery),
            events.clone(),
        );
        let document = Document::empty();
        let selection = start_of(&document);

        Self {
            engine,
            document,
            selection,
            history,
            keymap: Keymap::from_config(config),
            assets,
            fields: DraftFields::default(),
            events,
        }
    }

    // ==================== Transactions ====================

    /// Applies one command.
    pub fn apply(&mut self, command: Command) -> CoreResult<()> {
        self.apply_chain(&[command])
    }

    /// Applies commands as one transaction and one undo step.
    ///
    /// On failure the document and selection are unchanged.
    pub fn apply_chain(&mut self, commands: &[Command]) -> CoreResult<()> {
        let applied = match self
            .engine
            .apply_chain(&self.document, &self.selection, commands)
        {
            Ok(applied) => applied,
            Err(e) => {
                warn!("Transaction rejected: {}", e);
                self.events.emit(EditorEvent::TransactionFailed {
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        if applied.changed(&self.document) {
            let before = Snapshot::new(self.document.clone(), self.selection);
            self.history
                .record(before, change_kind(commands, &self.selection), applied.selection);
            self.document = applied.document;
            self.events.emit(EditorEvent::DocumentChanged {
                version: self.document.version(),
            });
        } else if commands.iter().all(Command::is_selection_only)
            && applied.selection != self.selection
        {
            // Moving the caret away ends the typing step even if it comes back.
            self.history.seal();
        }
        self.move_selection(applied.selection);
        Ok(())
    }

    /// Runs a toolbar command by name.
    pub fn run_command(&mut self, name: &str) -> CoreResult<()> {
        let action =
            ToolbarAction::from_name(name).ok_or_else(|| CoreError::UnknownCommand(name.into()))?;
        self.run_action(action)
    }

    /// Runs a toolbar action.
    pub fn run_action(&mut self, action: ToolbarAction) -> CoreResult<()> {
        debug!("Running {}", action);
        match action {
            ToolbarAction::Undo => self.undo(),
            ToolbarAction::Redo => self.redo(),
            _ => match action.command() {
                Some(command) => self.apply(command),
                None => Err(CoreError::UnknownCommand(action.to_string())),
            },
        }
    }

    /// Dispatches a key chord. Returns false if nothing is bound to it.
    pub fn handle_key(&mut self, key: &KeyPress) -> CoreResult<bool> {
        match self.keymap.lookup(key) {
            Some(action) => {
                self.run_action(action)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Moves the selection without touching the document.
    pub fn set_selection(&mut self, selection: Selection) -> CoreResult<()> {
        self.apply(Command::SetSelection(selection))
    }

    // ==================== History ====================

    pub fn undo(&mut self) -> CoreResult<()> {
        let current = Snapshot::new(self.document.clone(), self.selection);
        let snapshot = self.history.undo(current).ok_or(CoreError::NothingToUndo)?;
        self.restore(snapshot);
        info!("Undo to version {}", self.document.version());
        Ok(())
    }

    pub fn redo(&mut self) -> CoreResult<()> {
        let current = Snapshot::new(self.document.clone(), self.selection);
        let snapshot = self.history.redo(current).ok_or(CoreError::NothingToRedo)?;
        self.restore(snapshot);
        info!("Redo to version {}", self.document.version());
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Installs a history snapshot as a fresh document version.
    fn restore(&mut self, snapshot: Snapshot) {
        self.document = self.document.successor(snapshot.document.root().clone());
        self.events.emit(EditorEvent::DocumentChanged {
            version: self.document.version(),
        });
        self.move_selection(snapshot.selection);
    }

    fn move_selection(&mut self, selection: Selection) {
        if selection != self.selection {
            self.selection = selection;
            self.events.emit(EditorEvent::SelectionChanged(selection));
        }
    }

    // ==================== Queries ====================

    /// Marks active across the selection, for toolbar state.
    pub fn active_marks(&self) -> MarkSet {
        quire_model::active_marks(&self.document, &self.selection)
    }

    /// Returns true if the whole selection carries the mark.
    pub fn is_active(&self, mark_type: MarkType) -> bool {
        self.active_marks().has(mark_type)
    }

    /// Words in the live document.
    pub fn word_count(&self) -> usize {
        draft::word_count(&self.document.text())
    }

    // ==================== Links ====================

    /// Finds the link strictly around `pos`.
    pub fn link_at(&self, pos: usize) -> Option<LinkEdit> {
        match mark_around(&self.document, pos, MarkType::Link)? {
            (Mark::Link { href, label }, range) => Some(LinkEdit { range, href, label }),
            _ => None,
        }
    }

    /// Selects the link around `pos` for editing.
    pub fn begin_link_edit(&mut self, pos: usize) -> CoreResult<Option<LinkEdit>> {
        let Some(edit) = self.link_at(pos) else {
            return Ok(None);
        };
        self.set_selection(edit.range.into())?;
        Ok(Some(edit))
    }

    /// Links the selection, or replaces the link around the caret.
    pub fn apply_link(&mut self, href: impl Into<String>, label: Option<String>) -> CoreResult<()> {
        self.apply(Command::SetLink {
            href: href.into(),
            label,
        })
    }

    pub fn remove_link(&mut self) -> CoreResult<()> {
        self.apply(Command::UnsetLink)
    }

    // ==================== Assets ====================

    /// The asset coordinator; clone it to run gallery work in another task.
    pub fn assets(&self) -> &AssetCoordinator {
        &self.assets
    }

    /// Inserts a gallery asset at the selection, replacing selected content.
    ///
    /// Only assets in the gallery cache can be inserted.
    pub async fn insert_asset(&mut self, asset: &Asset) -> CoreResult<()> {
        let asset = self.assets.select(&asset.src).await?;
        debug!("Inserting asset {}", asset.src);
        self.apply(Command::InsertNode(asset_node(&asset)))
    }

    // ==================== Draft ====================

    /// Loads a saved post into the session.
    ///
    /// Metadata is always taken over. If the content does not parse, the
    /// document falls back to empty and the parse error is returned.
    pub fn hydrate(&mut self, post: &SavedPost) -> CoreResult<()> {
        self.fields = DraftFields::from_saved(post);
        self.history.clear();

        let result = self.engine.set_content(&post.content);
        let parsed = match &result {
            Ok(doc) => doc.clone(),
            Err(e) => {
                warn!("Saved content is unreadable, starting empty: {}", e);
                self.events.emit(EditorEvent::ContentFallback {
                    reason: e.to_string(),
                });
                Document::empty()
            }
        };
        self.document = self.document.successor(parsed.root().clone());
        self.events.emit(EditorEvent::DocumentChanged {
            version: self.document.version(),
        });
        self.move_selection(start_of(&self.document));

        result?;
        info!("Hydrated post {:?}", self.fields.slug);
        self.events.emit(EditorEvent::DraftHydrated);
        Ok(())
    }

    /// Sets one metadata field.
    pub fn update_field(&mut self, field: DraftField) {
        let name = field.name();
        self.fields.apply(field);
        self.events.emit(EditorEvent::DraftFieldChanged(name));
    }

    /// Sets one metadata field by name.
    pub fn update_field_named(&mut self, name: &str, value: impl Into<String>) -> CoreResult<()> {
        let field = FieldName::from_name(name).ok_or_else(|| CoreError::UnknownField(name.into()))?;
        self.update_field(DraftField::from_named(field, value));
        Ok(())
    }

    /// Packages the live document and metadata for submission.
    pub fn finalize(&self) -> PostDraft {
        PostDraft::new(&self.fields, self.serialized_content())
    }

    /// A slug derived from the current title.
    pub fn suggest_slug(&self) -> String {
        draft::slugify(&self.fields.title)
    }

    pub fn fields(&self) -> &DraftFields {
        &self.fields
    }

    // ==================== Accessors ====================

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn serialized_content(&self) -> String {
        self.engine.serialized_content(&self.document)
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("version", &self.document.version())
            .field("selection", &self.selection)
            .field("undo", &self.history.undo_count())
            .field("redo", &self.history.redo_count())
            .finish()
    }
}

/// The caret at the start of the first textblock, or 0.
fn start_of(doc: &Document) -> Selection {
    let pos = doc
        .textblocks()
        .first()
        .map(|tb| tb.content_start)
        .unwrap_or(0);
    Selection::caret(pos)
}

/// Plain typing at a caret coalesces in the history.
fn change_kind(commands: &[Command], before: &Selection) -> ChangeKind {
    match commands {
        [Command::InsertText(_)] if before.is_caret() => ChangeKind::Typing,
        _ => ChangeKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetError, LocalFile};
    use async_trait::async_trait;
    use quire_model::NodeType;

    struct NoGallery;

    #[async_trait]
    impl GalleryClient for NoGallery {
        async fn list(&self) -> Result<Vec<Asset>, AssetError> {
            Ok(vec![Asset::new("https://youtu.be/abc123", None)])
        }

        async fn upload(&self, file: &LocalFile) -> Result<Asset, AssetError> {
            Err(AssetError::Upload {
                name: file.name.clone(),
                reason: "read-only".into(),
            })
        }
    }

    fn session() -> EditorSession {
        EditorSession::new(&Config::default(), Arc::new(NoGallery))
    }

    #[test]
    fn test_new_session_starts_in_first_paragraph() {
        let s = session();
        assert_eq!(s.selection(), Selection::caret(1));
        assert_eq!(s.serialized_content(), "<p></p>");
        assert!(!s.can_undo());
    }

    #[test]
    fn test_typing_and_toolbar() {
        let mut s = session();
        s.apply(Command::InsertText("Hello".into())).unwrap();
        s.apply(Command::SelectAll).unwrap();
        s.run_command("bold").unwrap();
        assert!(s.is_active(MarkType::Bold));
        assert_eq!(s.serialized_content(), "<p><strong>Hello</strong></p>");

        assert!(matches!(
            s.run_command("strikethrough"),
            Err(CoreError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_failed_transaction_leaves_state() {
        let mut s = session();
        s.apply(Command::InsertText("Hi".into())).unwrap();
        let version = s.document().version();
        let selection = s.selection();
        let mut rx = s.subscribe();

        let err = s.run_command("heading6").unwrap_err();
        assert!(matches!(err, CoreError::Model(_)));
        assert_eq!(s.document().version(), version);
        assert_eq!(s.selection(), selection);
        assert!(matches!(
            rx.try_recv(),
            Ok(EditorEvent::TransactionFailed { .. })
        ));
    }

    #[test]
    fn test_undo_redo() {
        let mut s = session();
        s.apply(Command::InsertText("Hi".into())).unwrap();
        s.run_command("heading1").unwrap();
        assert_eq!(s.document().blocks()[0].node_type(), NodeType::Heading);

        s.run_command("undo").unwrap();
        assert_eq!(s.serialized_content(), "<p>Hi</p>");
        s.run_command("redo").unwrap();
        assert_eq!(s.serialized_content(), "<h1>Hi</h1>");

        s.undo().unwrap();
        s.undo().unwrap();
        assert_eq!(s.serialized_content(), "<p></p>");
        assert!(matches!(s.undo(), Err(CoreError::NothingToUndo)));
    }

    #[test]
    fn test_select_all_then_type() {
        let mut s = session();
        s.apply(Command::InsertText("Hello".into())).unwrap();
        s.run_command("selectAll").unwrap();
        s.apply(Command::InsertText("Bye".into())).unwrap();
        assert_eq!(s.serialized_content(), "<p>Bye</p>");
        assert_eq!(s.selection(), Selection::caret(4));
    }

    #[test]
    fn test_moving_the_caret_ends_typing_step() {
        let mut s = session();
        s.apply(Command::InsertText("a".into())).unwrap();
        s.apply(Command::InsertText("b".into())).unwrap();
        assert_eq!(s.history.undo_count(), 1);

        s.set_selection(Selection::caret(1)).unwrap();
        s.set_selection(Selection::caret(3)).unwrap();
        s.apply(Command::InsertText("c".into())).unwrap();
        assert_eq!(s.history.undo_count(), 2);

        s.undo().unwrap();
        assert_eq!(s.serialized_content(), "<p>ab</p>");
    }

    #[test]
    fn test_handle_key() {
        let mut s = session();
        s.apply(Command::InsertText("Hi".into())).unwrap();
        assert!(s.handle_key(&KeyPress::parse("ctrl+a").unwrap()).unwrap());
        assert!(s.handle_key(&KeyPress::parse("ctrl+i").unwrap()).unwrap());
        assert!(!s.handle_key(&KeyPress::parse("ctrl+q").unwrap()).unwrap());
        assert_eq!(s.serialized_content(), "<p><em>Hi</em></p>");
    }

    #[test]
    fn test_link_editing() {
        let mut s = session();
        s.hydrate(&SavedPost {
            content: r#"<p>ab<a href="https://x.dev">cdef</a>g</p>"#.into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(s.link_at(3), None);
        assert_eq!(s.link_at(7), None);
        let edit = s.begin_link_edit(5).unwrap().unwrap();
        assert_eq!(edit.range, MarkRange::new(3, 7));
        assert_eq!(edit.href, "https://x.dev");
        assert_eq!(s.selection(), Selection::range(3, 7));

        s.apply_link("https://y.dev", Some("Y".into())).unwrap();
        assert_eq!(
            s.serialized_content(),
            r#"<p>ab<a href="https://y.dev" title="Y">cdef</a>g</p>"#
        );
        s.remove_link().unwrap();
        assert_eq!(s.serialized_content(), "<p>abcdefg</p>");
    }

    #[tokio::test]
    async fn test_insert_asset_requires_gallery_choice() {
        let mut s = session();
        let stranger = Asset::new("https://youtu.be/abc123", None);
        assert!(matches!(
            s.insert_asset(&stranger).await,
            Err(CoreError::Asset(AssetError::NotInGallery(_)))
        ));

        let listed = s.assets().list_assets().await.unwrap();
        s.insert_asset(&listed[0]).await.unwrap();
        assert!(s.serialized_content().contains(r#"data-video-id="abc123""#));
    }

    #[test]
    fn test_update_field_named() {
        let mut s = session();
        s.update_field_named("title", "Hello World").unwrap();
        assert_eq!(s.suggest_slug(), "hello-world");
        assert!(matches!(
            s.update_field_named("content", "x"),
            Err(CoreError::UnknownField(_))
        ));
    }
}
