//! Tree engine
//!
//! # Addressing
//!
//! The sidebar shows the titre tree as a flat, pre-order list, and every
//! operation (selection, move, delete) addresses nodes by their index in
//! that list. A flat entry carries the path of 0-based indices from the
//! root list down to the node; paths are recomputed from the live tree on
//! every use and are only valid until the next mutation.
//!
//! # Move semantics
//!
//! A move is strictly "insert after the target": the source is removed
//! from its parent array, the target's path is adjusted for the removal,
//! and the source is reinserted as the target's next sibling, whether or
//! not the two shared a parent. Dropping a node into its own subtree is
//! rejected before anything is touched. There is deliberately no way to
//! make a node the *first* child of a branch; the source system only ever
//! inserts after, and that gap is kept as-is.

use crate::error::EngineError;
use plu_model::ast::titre::MAX_NIVEAU;
use plu_model::{ids, PluDocument, Titre};
use std::collections::HashSet;

/// Path of 0-based indices from the root list to a titre.
pub type TitrePath = Vec<usize>;

/// One row of the flattened tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTitre {
    pub path: TitrePath,
    pub id_titre: String,
    pub intitule: String,
    pub niveau: u8,
    pub has_children: bool,
}

/// Presentation-only set of expanded titre ids. Collapsed nodes keep their
/// children in the data; they are merely not rendered. Excluded from
/// history snapshots.
#[derive(Debug, Clone, Default)]
pub struct ExpandedSet {
    ids: HashSet<String>,
}

impl ExpandedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Toggle an id; returns whether it is expanded afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn expand(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// Flatten the whole tree, pre-order: a node precedes its descendants and
/// siblings appear in list order.
pub fn flatten(titres: &[Titre]) -> Vec<FlatTitre> {
    let mut flat = Vec::new();
    flatten_into(titres, &mut Vec::new(), None, &mut flat);
    flat
}

/// Flatten only the visible rows: children of a collapsed titre are
/// suppressed.
pub fn flatten_visible(titres: &[Titre], expanded: &ExpandedSet) -> Vec<FlatTitre> {
    let mut flat = Vec::new();
    flatten_into(titres, &mut Vec::new(), Some(expanded), &mut flat);
    flat
}

fn flatten_into(
    titres: &[Titre],
    prefix: &mut TitrePath,
    expanded: Option<&ExpandedSet>,
    out: &mut Vec<FlatTitre>,
) {
    for (index, titre) in titres.iter().enumerate() {
        prefix.push(index);
        out.push(FlatTitre {
            path: prefix.clone(),
            id_titre: titre.id_titre.clone(),
            intitule: titre.intitule.clone(),
            niveau: titre.niveau,
            has_children: !titre.titres.is_empty(),
        });
        let descend = expanded.map_or(true, |set| set.contains(&titre.id_titre));
        if descend {
            flatten_into(&titre.titres, prefix, expanded, out);
        }
        prefix.pop();
    }
}

/// Resolve a path to a titre.
pub fn titre_at<'a>(titres: &'a [Titre], path: &[usize]) -> Option<&'a Titre> {
    let (&first, rest) = path.split_first()?;
    let titre = titres.get(first)?;
    if rest.is_empty() {
        Some(titre)
    } else {
        titre_at(&titre.titres, rest)
    }
}

/// Resolve a path to a mutable titre.
pub fn titre_at_mut<'a>(titres: &'a mut [Titre], path: &[usize]) -> Option<&'a mut Titre> {
    let (&first, rest) = path.split_first()?;
    let titre = titres.get_mut(first)?;
    if rest.is_empty() {
        Some(titre)
    } else {
        titre_at_mut(&mut titre.titres, rest)
    }
}

/// The sibling list a path points into.
fn sibling_list_mut<'a>(
    titres: &'a mut Vec<Titre>,
    path: &[usize],
) -> Result<&'a mut Vec<Titre>, EngineError> {
    match path.split_last() {
        None => Err(EngineError::InvalidPath),
        Some((_, parent_path)) => {
            if parent_path.is_empty() {
                Ok(titres)
            } else {
                titre_at_mut(titres, parent_path)
                    .map(|parent| &mut parent.titres)
                    .ok_or(EngineError::InvalidPath)
            }
        }
    }
}

/// Remove the titre at `path` (with its entire subtree).
pub fn remove_at(titres: &mut Vec<Titre>, path: &[usize]) -> Result<Titre, EngineError> {
    let index = *path.last().ok_or(EngineError::InvalidPath)?;
    let list = sibling_list_mut(titres, path)?;
    if index >= list.len() {
        return Err(EngineError::InvalidPath);
    }
    Ok(list.remove(index))
}

/// Move the titre at `from` to sit immediately after the titre at `to`.
/// Self-moves are a no-op.
pub fn move_titre(titres: &mut Vec<Titre>, from: &[usize], to: &[usize]) -> Result<(), EngineError> {
    if from == to {
        return Ok(());
    }
    if to.len() >= from.len() && to[..from.len()] == *from {
        return Err(EngineError::InvalidMove(
            "cannot move a titre into its own subtree".to_string(),
        ));
    }
    if titre_at(titres, from).is_none() || titre_at(titres, to).is_none() {
        return Err(EngineError::InvalidPath);
    }

    let node = remove_at(titres, from)?;
    let adjusted = adjust_for_removal(to, from);
    let index = *adjusted.last().expect("target path is never empty");
    let list = sibling_list_mut(titres, &adjusted)?;
    let insert_at = (index + 1).min(list.len());
    list.insert(insert_at, node);
    Ok(())
}

/// Shift a path after the node at `removed` left the tree: if both sit
/// under the same parent prefix and the target's component at that depth
/// came after the removed node, it moved down by one.
fn adjust_for_removal(target: &[usize], removed: &[usize]) -> TitrePath {
    let mut adjusted = target.to_vec();
    let depth = removed.len() - 1;
    if adjusted.len() > depth && adjusted[..depth] == removed[..depth] && adjusted[depth] > removed[depth]
    {
        adjusted[depth] -= 1;
    }
    adjusted
}

/// Append a fresh titre under `parent` (None = root list) and return its id.
pub fn add_titre(
    doc: &mut PluDocument,
    parent: Option<&[usize]>,
    intitule: &str,
    niveau: Option<u8>,
) -> Result<String, EngineError> {
    let (parent_id, default_niveau) = match parent {
        None => (doc.id_reglement.clone(), 1),
        Some(path) => {
            let titre = titre_at(&doc.titres, path).ok_or(EngineError::InvalidPath)?;
            (titre.id_titre.clone(), (titre.niveau + 1).min(MAX_NIVEAU))
        }
    };
    let niveau = niveau.unwrap_or(default_niveau);
    if niveau == 0 || niveau > MAX_NIVEAU {
        return Err(EngineError::Validation(
            plu_model::ValidationError::InvalidNiveau {
                id_titre: parent_id,
                niveau,
            },
        ));
    }

    let insee = doc.insee_commune.clone();
    let list = match parent {
        None => &mut doc.titres,
        Some(path) => {
            &mut titre_at_mut(&mut doc.titres, path)
                .ok_or(EngineError::InvalidPath)?
                .titres
        }
    };
    let id = ids::titre_id(&parent_id, intitule, list.len() + 1);
    list.push(Titre::new(id.clone(), intitule, niveau).with_communes(insee));
    Ok(id)
}

/// Regenerate every contenu id of a titre from its position. Runs after
/// any splice of the content list; idempotent on an already-contiguous
/// list.
pub fn renumber_contenus(titre: &mut Titre) {
    for (position, contenu) in titre.contenu.iter_mut().enumerate() {
        contenu.id_contenu = ids::contenu_id(&titre.id_titre, position + 1);
    }
}

/// Rewrite every id carrying `old_prefix` to the document's current
/// règlement id, and overwrite every titre's commune list with the
/// document-level one. Runs after a metadata edit changed the identity.
pub fn cascade_rename(doc: &mut PluDocument, old_prefix: &str) {
    let new_prefix = doc.id_reglement.clone();
    let insee = doc.insee_commune.clone();
    for titre in &mut doc.titres {
        rename_subtree(titre, old_prefix, &new_prefix, &insee);
    }
}

fn rename_subtree(titre: &mut Titre, old_prefix: &str, new_prefix: &str, insee: &[String]) {
    if let Some(rest) = titre.id_titre.strip_prefix(old_prefix) {
        titre.id_titre = format!("{}{}", new_prefix, rest);
    }
    titre.insee_commune = insee.to_vec();
    for contenu in &mut titre.contenu {
        if let Some(rest) = contenu.id_contenu.strip_prefix(old_prefix) {
            contenu.id_contenu = format!("{}{}", new_prefix, rest);
        }
    }
    for child in &mut titre.titres {
        rename_subtree(child, old_prefix, new_prefix, insee);
    }
}
