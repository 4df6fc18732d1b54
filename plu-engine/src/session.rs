//! Editing session
//!
//!     The single owner of the mutable document. Components never share
//!     ambient state: the session is passed where it is needed, and it is
//!     the only place that sequences capture-before-mutate, applies the
//!     mutation, and leaves re-derivation (flatten, re-render) to the
//!     caller.
//!
//! Edit-state machine
//!
//!     Idle → Editing on begin_edit, Editing → Idle on save or cancel.
//!     While a content edit is in flight, structural reorders (titre moves,
//!     contenu moves) are rejected before touching anything. This is the one
//!     cross-component invariant this engine enforces.

use crate::error::EngineError;
use crate::history::History;
use crate::tree::{self, ExpandedSet, FlatTitre, TitrePath};
use plu_model::ast::document::DocType;
use plu_model::{ids, validation, Contenu, HtmlNode, PluDocument};

/// Content-editing state of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum EditState {
    Idle,
    Editing {
        titre_path: TitrePath,
        /// None when composing a new contenu, Some for an existing one.
        contenu_index: Option<usize>,
    },
}

/// New metadata for [`Session::update_metadata`].
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub nom: String,
    pub id_urba: String,
    pub type_doc: DocType,
    pub insee_commune: Vec<String>,
    pub siren_epci: Option<String>,
}

/// The running editing session: one document, its history, and the
/// presentation state that never enters snapshots.
#[derive(Debug)]
pub struct Session {
    document: Option<PluDocument>,
    pub history: History,
    pub expanded: ExpandedSet,
    edit_state: EditState,
}

impl Session {
    pub fn new() -> Self {
        Self {
            document: None,
            history: History::new(),
            expanded: ExpandedSet::new(),
            edit_state: EditState::Idle,
        }
    }

    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            history: History::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// Load a document, dropping any previous history and view state.
    pub fn load(&mut self, document: PluDocument) {
        self.document = Some(document);
        self.history.clear();
        self.expanded.clear();
        self.edit_state = EditState::Idle;
    }

    pub fn document(&self) -> Option<&PluDocument> {
        self.document.as_ref()
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit_state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.edit_state, EditState::Editing { .. })
    }

    /// Full flat rendering of the tree (the addressing scheme).
    pub fn flat(&self) -> Result<Vec<FlatTitre>, EngineError> {
        let doc = self.require_document()?;
        Ok(tree::flatten(&doc.titres))
    }

    /// Rows currently visible given the expand/collapse state.
    pub fn visible(&self) -> Result<Vec<FlatTitre>, EngineError> {
        let doc = self.require_document()?;
        Ok(tree::flatten_visible(&doc.titres, &self.expanded))
    }

    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        self.expanded.toggle(id)
    }

    // ------------------------------------------------------------------
    // Titre operations
    // ------------------------------------------------------------------

    /// Append a titre under the titre at `parent` (None = root) and return
    /// its id.
    pub fn add_titre(
        &mut self,
        parent: Option<usize>,
        intitule: &str,
        niveau: Option<u8>,
    ) -> Result<String, EngineError> {
        let parent_path = match parent {
            None => None,
            Some(index) => Some(self.path_at(index)?),
        };
        self.mutate("Ajout d'un titre", |next| {
            tree::add_titre(next, parent_path.as_deref(), intitule, niveau)
        })
    }

    /// Move the titre at flat index `from` to sit right after the one at
    /// `to`.
    pub fn move_titre(&mut self, from: usize, to: usize) -> Result<(), EngineError> {
        self.require_idle()?;
        if from == to {
            return Ok(());
        }
        let from_path = self.path_at(from)?;
        let to_path = self.path_at(to)?;
        self.mutate("Déplacement d'un titre", |next| {
            tree::move_titre(&mut next.titres, &from_path, &to_path)
        })
    }

    /// Delete the titre at a flat index, subtree included. Confirmation is
    /// the caller's business.
    pub fn delete_titre(&mut self, index: usize) -> Result<(), EngineError> {
        let path = self.path_at(index)?;
        self.mutate("Suppression d'un titre", |next| {
            tree::remove_at(&mut next.titres, &path).map(|_| ())
        })
    }

    /// Change the document identity and propagate it through the tree.
    pub fn update_metadata(&mut self, meta: DocumentMeta) -> Result<(), EngineError> {
        self.mutate("Modification des métadonnées", |next| {
            let old_prefix = next.id_reglement.clone();
            next.nom = meta.nom.clone();
            next.id_urba = meta.id_urba.clone();
            next.id_reglement = ids::reglement_id(&meta.id_urba);
            next.type_doc = meta.type_doc;
            next.insee_commune = meta.insee_commune.clone();
            next.siren_epci = meta.siren_epci.clone();
            validation::validate_document(next)?;
            tree::cascade_rename(next, &old_prefix);
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Content operations
    // ------------------------------------------------------------------

    /// Enter content editing on the titre at a flat index.
    pub fn begin_edit(
        &mut self,
        titre_index: usize,
        contenu_index: Option<usize>,
    ) -> Result<(), EngineError> {
        if self.is_editing() {
            return Err(EngineError::EditInProgress);
        }
        let path = self.path_at(titre_index)?;
        if let Some(index) = contenu_index {
            let doc = self.require_document()?;
            let titre = tree::titre_at(&doc.titres, &path).ok_or(EngineError::InvalidPath)?;
            if index >= titre.contenu.len() {
                return Err(EngineError::InvalidIndex(index));
            }
        }
        self.edit_state = EditState::Editing {
            titre_path: path,
            contenu_index,
        };
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.edit_state = EditState::Idle;
    }

    /// Save the edit in flight. `parts` is the (already split) list of
    /// structured-HTML payloads: one contenu each. Saving an existing
    /// contenu with zero parts deletes it.
    pub fn save_content(&mut self, parts: Vec<Vec<HtmlNode>>) -> Result<(), EngineError> {
        let EditState::Editing {
            titre_path,
            contenu_index,
        } = self.edit_state.clone()
        else {
            return Err(EngineError::NotEditing);
        };

        self.mutate("Enregistrement du contenu", |next| {
            let titre =
                tree::titre_at_mut(&mut next.titres, &titre_path).ok_or(EngineError::InvalidPath)?;
            let blocks: Vec<Contenu> = parts
                .iter()
                .map(|html| {
                    Contenu::new(String::new(), html.clone())
                        .with_tags(titre.id_zone.clone(), titre.id_prescription.clone())
                })
                .collect();
            match contenu_index {
                Some(index) => {
                    if index >= titre.contenu.len() {
                        return Err(EngineError::InvalidIndex(index));
                    }
                    titre.contenu.splice(index..=index, blocks);
                }
                None => titre.contenu.extend(blocks),
            }
            tree::renumber_contenus(titre);
            Ok(())
        })?;
        self.edit_state = EditState::Idle;
        Ok(())
    }

    /// Reorder a titre's content list: remove `from`, reinsert at `to`.
    pub fn move_contenu(
        &mut self,
        titre_index: usize,
        from: usize,
        to: usize,
    ) -> Result<(), EngineError> {
        self.require_idle()?;
        if from == to {
            return Ok(());
        }
        let path = self.path_at(titre_index)?;
        self.mutate("Déplacement d'un contenu", |next| {
            let titre =
                tree::titre_at_mut(&mut next.titres, &path).ok_or(EngineError::InvalidPath)?;
            if from >= titre.contenu.len() {
                return Err(EngineError::InvalidIndex(from));
            }
            let block = titre.contenu.remove(from);
            let insert_at = to.min(titre.contenu.len());
            titre.contenu.insert(insert_at, block);
            tree::renumber_contenus(titre);
            Ok(())
        })
    }

    /// Delete one contenu and renumber the rest.
    pub fn delete_contenu(&mut self, titre_index: usize, index: usize) -> Result<(), EngineError> {
        let path = self.path_at(titre_index)?;
        self.mutate("Suppression d'un contenu", |next| {
            let titre =
                tree::titre_at_mut(&mut next.titres, &path).ok_or(EngineError::InvalidPath)?;
            if index >= titre.contenu.len() {
                return Err(EngineError::InvalidIndex(index));
            }
            titre.contenu.remove(index);
            tree::renumber_contenus(titre);
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<String, EngineError> {
        let document = self.document.as_mut().ok_or(EngineError::NoDocument)?;
        self.history.undo(document)
    }

    pub fn redo(&mut self) -> Result<String, EngineError> {
        let document = self.document.as_mut().ok_or(EngineError::NoDocument)?;
        self.history.redo(document)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_document(&self) -> Result<&PluDocument, EngineError> {
        self.document.as_ref().ok_or(EngineError::NoDocument)
    }

    fn require_idle(&self) -> Result<(), EngineError> {
        if self.is_editing() {
            return Err(EngineError::EditInProgress);
        }
        Ok(())
    }

    fn path_at(&self, index: usize) -> Result<TitrePath, EngineError> {
        let doc = self.require_document()?;
        tree::flatten(&doc.titres)
            .get(index)
            .map(|entry| entry.path.clone())
            .ok_or(EngineError::InvalidIndex(index))
    }

    /// Build-then-swap: run the mutation on a copy, capture the previous
    /// state only once it succeeded, then swap the copy in.
    fn mutate<R>(
        &mut self,
        label: &str,
        build: impl FnOnce(&mut PluDocument) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let document = self.document.as_ref().ok_or(EngineError::NoDocument)?;
        let mut next = document.clone();
        let result = build(&mut next)?;
        self.history.capture(label, document);
        self.document = Some(next);
        Ok(result)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
