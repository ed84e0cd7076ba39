//! Tagging orchestrator: drives one document from open to save.
//!
//! ```text
//! Idle → Authorizing → DocumentOpen → PerPage(1..n) → TemplateBuilt → Tagged → Saved → Done
//!                      (any step) → Failed
//! ```
//!
//! Page, view and document handles are held in [`Scoped`] guards, so they are
//! released on success and on every error path. Nothing is written to the
//! output path unless every step before `save` succeeded.

use crate::config::{Credentials, TaggingConfig};
use crate::detection::LayoutDetector;
use crate::engine::{DocumentEngine, EngineDocument, EnginePage, PageView, Scoped};
use crate::error::{Error, Result};
use crate::structure::{
    DocumentTemplate, DocumentTemplateAssembler, PageElementBuilder, PageTemplate,
    TemplateMetadata, TemplateSerializer,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Suffix of template dumps written to [`TaggingConfig::template_dir`].
pub const TEMPLATE_DUMP_SUFFIX: &str = "-template_json.json";

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run started
    Idle,
    /// Licensing the engine
    Authorizing,
    /// Document opened
    DocumentOpen,
    /// Processing a page
    PerPage {
        /// 1-based page number
        page_number: u32,
    },
    /// Template assembled and serialized
    TemplateBuilt,
    /// Structure tree written
    Tagged,
    /// Output saved
    Saved,
    /// Run finished
    Done,
    /// Run aborted
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::PerPage { page_number } => write!(f, "PerPage({})", page_number),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct TaggingReport {
    /// Input document
    pub input: PathBuf,
    /// Tagged output document
    pub output: PathBuf,
    /// Number of pages processed
    pub pages: usize,
    /// Pages whose sub-elements were capped
    pub truncated_pages: Vec<u32>,
    /// The template applied
    pub template: Arc<DocumentTemplate>,
}

/// Runs the detect → template → tag pipeline over documents.
pub struct TaggingOrchestrator<E: DocumentEngine, D: LayoutDetector> {
    engine: E,
    detector: D,
    config: TaggingConfig,
    credentials: Credentials,
    builder: PageElementBuilder,
    state: RunState,
}

impl<E: DocumentEngine, D: LayoutDetector> TaggingOrchestrator<E, D> {
    /// Create an orchestrator. Fails on an invalid configuration.
    pub fn new(engine: E, detector: D, config: TaggingConfig) -> Result<Self> {
        config.validate()?;
        let builder = PageElementBuilder::from_config(&config);
        Ok(Self {
            engine,
            detector,
            config,
            credentials: Credentials::Trial,
            builder,
            state: RunState::Idle,
        })
    }

    /// Credentials passed to the engine at the start of each run.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &TaggingConfig {
        &self.config
    }

    /// The document engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Tag `input` and save the result to `output`.
    pub fn run(&mut self, input: &Path, output: &Path) -> Result<TaggingReport> {
        match self.state {
            RunState::Idle | RunState::Done | RunState::Failed => {},
            busy => {
                return Err(Error::InvalidState(format!("cannot start a run while in {}", busy)));
            },
        }

        log::info!("Tagging {} -> {}", input.display(), output.display());
        match self.execute(input, output) {
            Ok(report) => {
                self.transition(RunState::Done);
                log::info!(
                    "Tagged {} ({} pages, {} elements)",
                    output.display(),
                    report.pages,
                    report.template.element_count()
                );
                Ok(report)
            },
            Err(e) => {
                log::error!("Tagging {} failed in {}: {}", input.display(), self.state, e);
                self.transition(RunState::Failed);
                Err(e)
            },
        }
    }

    /// Tag every `*.pdf` in `input_dir` into `output_dir` under the same name.
    ///
    /// Documents are processed in file-name order; the first failure stops
    /// the batch.
    pub fn run_folder(&mut self, input_dir: &Path, output_dir: &Path) -> Result<Vec<TaggingReport>> {
        let mut inputs: Vec<PathBuf> = std::fs::read_dir(input_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_pdf(path))
            .collect();
        inputs.sort();

        if inputs.is_empty() {
            log::warn!("No PDF files found in {}", input_dir.display());
        }
        std::fs::create_dir_all(output_dir)?;

        let mut reports = Vec::with_capacity(inputs.len());
        for input in inputs {
            let Some(name) = input.file_name() else {
                continue;
            };
            let output = output_dir.join(name);
            reports.push(self.run(&input, &output)?);
        }
        Ok(reports)
    }

    fn execute(&mut self, input: &Path, output: &Path) -> Result<TaggingReport> {
        self.transition(RunState::Authorizing);
        self.engine.authorize(&self.credentials)?;

        let mut document = Scoped::new(self.engine.open(input)?);
        self.transition(RunState::DocumentOpen);

        let metadata = TemplateMetadata::new(self.config.model.clone(), self.config.zoom);
        let mut assembler = DocumentTemplateAssembler::new(metadata);
        let mut truncated_pages = Vec::new();

        let page_count = document.page_count();
        for index in 0..page_count {
            let page_number = index as u32 + 1;
            self.transition(RunState::PerPage { page_number });

            let page = self.process_page(&*document, index, page_number)?;
            log::debug!("Page {}: {} elements", page_number, page.elements.len());
            if page.truncated {
                truncated_pages.push(page_number);
            }
            assembler.add_page(page)?;
        }

        let template = assembler.finalize();
        template.validate()?;
        let bytes = TemplateSerializer::serialize(&template)?;
        self.transition(RunState::TemplateBuilt);

        if let Some(dir) = &self.config.template_dir {
            let path = dir.join(template_dump_name(input));
            TemplateSerializer::write_to_file(&template, &path)?;
            log::info!("Template saved to {}", path.display());
        }

        document.remove_tags()?;
        document.load_template(&bytes)?;
        document.add_tags()?;
        self.transition(RunState::Tagged);

        document.save(output)?;
        self.transition(RunState::Saved);

        Ok(TaggingReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            pages: page_count,
            truncated_pages,
            template,
        })
    }

    fn process_page(
        &mut self,
        document: &E::Document,
        index: usize,
        page_number: u32,
    ) -> Result<PageTemplate> {
        let page = Scoped::new(document.acquire_page(index)?);
        let geometry = page.geometry();

        let view = Scoped::new(page.acquire_view(self.config.zoom, geometry.rotation)?);
        let rendered = view.render()?;
        log::debug!(
            "Page {} rendered at {}x{} for {}",
            page_number,
            rendered.width,
            rendered.height,
            self.detector.name()
        );
        let detections = self.detector.detect(&rendered, page_number)?;

        // View before page; both before the next page is acquired
        drop(view);
        drop(page);

        self.builder
            .build_page(&detections, page_number, self.config.zoom, &geometry)
    }

    fn transition(&mut self, next: RunState) {
        log::debug!("State {} -> {}", self.state, next);
        self.state = next;
    }
}

/// File name of the template dump for `input`.
pub fn template_dump_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    format!("{}{}", stem, TEMPLATE_DUMP_SUFFIX)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
}
