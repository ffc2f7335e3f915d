//! Section list state machine.
//!
//! A draft's markdown blob round-trips through here: `parse` splits on
//! `##` headings and classifies each against the catalogue, `compile`
//! re-emits the blob in display order. In between, the list supports the
//! editor operations: content/title edits, locking, a single editing
//! cursor, custom sections, removal, and drag reordering.
//!
//! CRITICAL: known kinds are unique per list, orders are unique, and at
//! most one section is in editing state. Every mutation preserves all
//! three.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::drafting::catalogue::{self, SectionKind, CATALOGUE};

/// Sort base for sections the catalogue does not know. Keeps customs after
/// every known kind until a reorder renumbers the whole list.
const CUSTOM_ORDER_BASE: i32 = 100;

const CUSTOM_ICON: &str = "puzzle";
const CUSTOM_TITLE: &str = "New Section";
const CUSTOM_PLACEHOLDER: &str = "Add your content here";

#[derive(Debug, Error, PartialEq)]
pub enum SectionError {
    #[error("section {0} does not exist")]
    NotFound(Uuid),

    #[error("section {0} is locked; unlock it before editing")]
    Locked(Uuid),

    #[error("section {0} is part of the standard structure and cannot be removed")]
    Permanent(Uuid),
}

/// One section of a draft. Identity is the `id`; `order` is its position
/// in the compiled document.
#[derive(Debug, Clone)]
pub struct DraftSection {
    pub id: Uuid,
    pub kind: SectionKind,
    pub title: String,
    pub content: String,
    pub locked: bool,
    pub order: i32,
    pub icon: &'static str,
}

/// A section as serialized to the client, with the aggregate editing
/// cursor flattened onto the row it points at.
#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub id: Uuid,
    pub kind: SectionKind,
    pub title: String,
    pub content: String,
    pub locked: bool,
    pub editing: bool,
    pub order: i32,
    pub icon: &'static str,
}

/// The sections of one draft plus the editing cursor. The cursor lives
/// here, not on the sections, so "at most one section editing" holds by
/// construction.
#[derive(Debug, Clone)]
pub struct SectionList {
    sections: Vec<DraftSection>,
    editing: Option<Uuid>,
}

impl SectionList {
    /// Splits a markdown blob on `#` headings and classifies each block.
    ///
    /// Every known kind missing from the text is synthesized with its
    /// placeholder, so the result always contains the full catalogue.
    /// Text before the first heading is dropped (assistant preamble).
    /// A heading that matches an already-seen known kind is kept as a
    /// custom section rather than violating kind uniqueness.
    pub fn parse(text: &str) -> SectionList {
        let mut blocks: Vec<(String, String)> = Vec::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in text.lines() {
            if let Some(heading) = heading_text(line) {
                if let Some((title, body)) = current.take() {
                    blocks.push((title, body.join("\n").trim().to_string()));
                }
                current = Some((heading.to_string(), Vec::new()));
            } else if let Some((_, body)) = current.as_mut() {
                body.push(line);
            }
        }
        if let Some((title, body)) = current.take() {
            blocks.push((title, body.join("\n").trim().to_string()));
        }

        let mut sections = Vec::with_capacity(blocks.len().max(CATALOGUE.len()));
        let mut seen = std::collections::HashSet::new();
        let mut custom_index: i32 = 0;

        for (heading, content) in blocks {
            let entry = catalogue::match_heading(&heading).filter(|e| !seen.contains(&e.kind));
            match entry {
                Some(entry) => {
                    seen.insert(entry.kind);
                    sections.push(DraftSection {
                        id: Uuid::new_v4(),
                        kind: entry.kind,
                        title: entry.title.to_string(),
                        content,
                        locked: false,
                        order: entry.order,
                        icon: entry.icon,
                    });
                }
                None => {
                    sections.push(DraftSection {
                        id: Uuid::new_v4(),
                        kind: SectionKind::Custom,
                        title: heading,
                        content,
                        locked: false,
                        order: CUSTOM_ORDER_BASE + custom_index,
                        icon: CUSTOM_ICON,
                    });
                    custom_index += 1;
                }
            }
        }

        for entry in CATALOGUE.iter() {
            if !seen.contains(&entry.kind) {
                sections.push(DraftSection {
                    id: Uuid::new_v4(),
                    kind: entry.kind,
                    title: entry.title.to_string(),
                    content: entry.placeholder.to_string(),
                    locked: false,
                    order: entry.order,
                    icon: entry.icon,
                });
            }
        }

        sections.sort_by_key(|s| s.order);
        SectionList {
            sections,
            editing: None,
        }
    }

    /// The twelve known sections with placeholder content, for drafts
    /// started from scratch.
    pub fn skeleton() -> SectionList {
        SectionList::parse("")
    }

    pub fn sections(&self) -> &[DraftSection] {
        &self.sections
    }

    /// Client-facing projection, in display order.
    pub fn views(&self) -> Vec<SectionView> {
        let mut views: Vec<SectionView> = self
            .sections
            .iter()
            .map(|s| SectionView {
                id: s.id,
                kind: s.kind,
                title: s.title.clone(),
                content: s.content.clone(),
                locked: s.locked,
                editing: self.editing == Some(s.id),
                order: s.order,
                icon: s.icon,
            })
            .collect();
        views.sort_by_key(|v| v.order);
        views
    }

    /// First section of a known kind, if present.
    pub fn by_kind(&self, kind: SectionKind) -> Option<&DraftSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Re-emits the markdown blob: `## title`, blank line, content, with
    /// blank lines between sections, in ascending order.
    pub fn compile(&self) -> String {
        let mut ordered: Vec<&DraftSection> = self.sections.iter().collect();
        ordered.sort_by_key(|s| s.order);
        ordered
            .iter()
            .map(|s| format!("## {}\n\n{}", s.title, s.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Replaces a section's content. Locked sections reject the edit.
    pub fn set_content(&mut self, id: Uuid, content: String) -> Result<(), SectionError> {
        let section = self.get_mut(id)?;
        if section.locked {
            return Err(SectionError::Locked(id));
        }
        section.content = content;
        Ok(())
    }

    /// Replaces a section's display title. Titles stay editable while the
    /// body is locked.
    pub fn set_title(&mut self, id: Uuid, title: String) -> Result<(), SectionError> {
        self.get_mut(id)?.title = title;
        Ok(())
    }

    /// Locks or unlocks a section. Does not touch the editing cursor.
    pub fn set_locked(&mut self, id: Uuid, locked: bool) -> Result<(), SectionError> {
        self.get_mut(id)?.locked = locked;
        Ok(())
    }

    /// Toggles the editing cursor. Entering edit force-unlocks the target
    /// and moves the cursor off any other section; toggling the current
    /// target clears the cursor.
    pub fn toggle_editing(&mut self, id: Uuid) -> Result<(), SectionError> {
        if self.editing == Some(id) {
            // Target exists because the cursor pointed at it.
            self.editing = None;
            return Ok(());
        }
        let section = self.get_mut(id)?;
        section.locked = false;
        self.editing = Some(id);
        Ok(())
    }

    /// Appends a custom section with placeholder title and content, and
    /// puts it straight into editing.
    pub fn add_custom(&mut self) -> Uuid {
        let id = Uuid::new_v4();
        let order = self.sections.len() as i32;
        self.sections.push(DraftSection {
            id,
            kind: SectionKind::Custom,
            title: CUSTOM_TITLE.to_string(),
            content: CUSTOM_PLACEHOLDER.to_string(),
            locked: false,
            order,
            icon: CUSTOM_ICON,
        });
        self.editing = Some(id);
        id
    }

    /// Removes a custom section. Known kinds are the standard structure
    /// and cannot be removed. Orders are renumbered to stay contiguous.
    pub fn remove(&mut self, id: Uuid) -> Result<(), SectionError> {
        let pos = self
            .sections
            .iter()
            .position(|s| s.id == id)
            .ok_or(SectionError::NotFound(id))?;
        if !self.sections[pos].kind.is_custom() {
            return Err(SectionError::Permanent(id));
        }

        self.sections.remove(pos);
        if self.editing == Some(id) {
            self.editing = None;
        }
        self.renumber();
        Ok(())
    }

    /// Moves `source_id` to the display position `target_id` currently
    /// occupies, then renumbers so orders are contiguous from zero.
    pub fn reorder(&mut self, source_id: Uuid, target_id: Uuid) -> Result<(), SectionError> {
        if !self.sections.iter().any(|s| s.id == target_id) {
            return Err(SectionError::NotFound(target_id));
        }

        // Work on display order so positions mean what the client sees.
        self.sections.sort_by_key(|s| s.order);
        let source_pos = self
            .sections
            .iter()
            .position(|s| s.id == source_id)
            .ok_or(SectionError::NotFound(source_id))?;
        let target_pos = self
            .sections
            .iter()
            .position(|s| s.id == target_id)
            .ok_or(SectionError::NotFound(target_id))?;

        let moved = self.sections.remove(source_pos);
        self.sections.insert(target_pos, moved);

        for (i, section) in self.sections.iter_mut().enumerate() {
            section.order = i as i32;
        }
        Ok(())
    }

    fn renumber(&mut self) {
        self.sections.sort_by_key(|s| s.order);
        for (i, section) in self.sections.iter_mut().enumerate() {
            section.order = i as i32;
        }
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut DraftSection, SectionError> {
        self.sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SectionError::NotFound(id))
    }
}

/// Heading text of a markdown heading line, any `#` depth, or None for a
/// body line. Bare runs of `#` with no text count as body.
fn heading_text(line: &str) -> Option<&str> {
    if !line.starts_with('#') {
        return None;
    }
    let text = line.trim_start_matches('#').trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
