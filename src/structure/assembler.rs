//! Collects page templates into a document template.

use super::types::{DocumentTemplate, PageTemplate, TemplateMetadata};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Accumulates page templates in strict page order.
///
/// Pages must arrive as 1, 2, 3, ... with no gaps. Once [`finalize`] has been
/// called the template is frozen; later calls return the same snapshot.
///
/// [`finalize`]: DocumentTemplateAssembler::finalize
#[derive(Debug)]
pub struct DocumentTemplateAssembler {
    pending: Option<DocumentTemplate>,
    finalized: Option<Arc<DocumentTemplate>>,
}

impl DocumentTemplateAssembler {
    /// Start an empty template.
    pub fn new(metadata: TemplateMetadata) -> Self {
        Self {
            pending: Some(DocumentTemplate::new(metadata)),
            finalized: None,
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        match (&self.pending, &self.finalized) {
            (Some(t), _) => t.pages.len(),
            (None, Some(t)) => t.pages.len(),
            (None, None) => 0,
        }
    }

    /// True once [`finalize`](Self::finalize) has been called.
    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Append the next page.
    ///
    /// # Errors
    ///
    /// - [`Error::TemplateFinalized`] after `finalize`
    /// - [`Error::SequencingViolation`] when `page.page_number` is not the
    ///   next page number
    pub fn add_page(&mut self, page: PageTemplate) -> Result<()> {
        let template = self.pending.as_mut().ok_or(Error::TemplateFinalized)?;
        let expected = template.pages.len() as u32 + 1;
        if page.page_number != expected {
            return Err(Error::SequencingViolation {
                expected,
                found: page.page_number,
            });
        }
        log::debug!(
            "Page {} added to template ({} elements)",
            page.page_number,
            page.elements.len()
        );
        template.pages.push(page);
        Ok(())
    }

    /// Freeze the template and return it.
    ///
    /// Idempotent: every call returns the same shared snapshot.
    pub fn finalize(&mut self) -> Arc<DocumentTemplate> {
        if let Some(template) = self.pending.take() {
            self.finalized = Some(Arc::new(template));
        }
        match &self.finalized {
            Some(template) => Arc::clone(template),
            // `pending` and `finalized` are never both empty
            None => Arc::new(DocumentTemplate::new(TemplateMetadata::new("", 0.0))),
        }
    }
}
