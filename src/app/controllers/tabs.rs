use crate::app::domain::document::{Document, DocumentId};
use crate::app::services::note_store::names_match;

/// Open documents in tab order plus the active one.
pub struct TabManager {
    documents: Vec<Document>,
    active_id: Option<DocumentId>,
    next_id: u64,
}

impl TabManager {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            active_id: None,
            next_id: 1,
        }
    }

    fn next_document_id(&mut self) -> DocumentId {
        let id = DocumentId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_untitled(&mut self) -> DocumentId {
        let id = self.next_document_id();
        self.documents.push(Document::new_untitled(id));
        self.active_id = Some(id);
        id
    }

    pub fn add_from_file(&mut self, name: String, content: &str) -> DocumentId {
        let id = self.next_document_id();
        self.documents.push(Document::new_from_file(id, name, content));
        self.active_id = Some(id);
        id
    }

    pub fn active_doc(&self) -> Option<&Document> {
        let active_id = self.active_id?;
        self.doc_by_id(active_id)
    }

    pub fn active_doc_mut(&mut self) -> Option<&mut Document> {
        let active_id = self.active_id?;
        self.doc_by_id_mut(active_id)
    }

    pub fn set_active(&mut self, id: DocumentId) -> bool {
        if self.documents.iter().any(|d| d.id == id) {
            self.active_id = Some(id);
            true
        } else {
            false
        }
    }

    /// Remove a document by id. Activates the nearest neighbor.
    pub fn remove(&mut self, id: DocumentId) -> Option<Document> {
        let idx = self.documents.iter().position(|d| d.id == id)?;
        let doc = self.documents.remove(idx);

        if self.active_id == Some(id) {
            self.active_id = if self.documents.is_empty() {
                None
            } else {
                let new_idx = idx.min(self.documents.len() - 1);
                Some(self.documents[new_idx].id)
            };
        }

        Some(doc)
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.active_id = None;
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn count(&self) -> usize {
        self.documents.len()
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.active_id
    }

    /// Find a document by its persisted name, ignoring case
    pub fn find_by_name(&self, name: &str) -> Option<DocumentId> {
        self.documents
            .iter()
            .find(|d| d.name().is_some_and(|n| names_match(n, name)))
            .map(|d| d.id)
    }

    pub fn dirty_ids(&self) -> Vec<DocumentId> {
        self.documents
            .iter()
            .filter(|d| d.is_dirty())
            .map(|d| d.id)
            .collect()
    }

    pub fn doc_by_id(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn doc_by_id_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == id)
    }

    /// Get the next document id (for tab cycling)
    pub fn next_doc_id(&self) -> Option<DocumentId> {
        let active_id = self.active_id?;
        let idx = self.documents.iter().position(|d| d.id == active_id)?;
        let next_idx = (idx + 1) % self.documents.len();
        Some(self.documents[next_idx].id)
    }

    /// Get the previous document id (for tab cycling)
    pub fn prev_doc_id(&self) -> Option<DocumentId> {
        let active_id = self.active_id?;
        let idx = self.documents.iter().position(|d| d.id == active_id)?;
        let prev_idx = if idx == 0 {
            self.documents.len() - 1
        } else {
            idx - 1
        };
        Some(self.documents[prev_idx].id)
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}
