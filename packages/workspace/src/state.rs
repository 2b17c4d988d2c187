use crate::serializer;
use sitekit_common::{CommonError, FileSystem, PageId};
use sitekit_editor::{
    Document, DocumentStore, Page, PagePatch, PageStore, Project, SectionOrder, StoreError,
    Structure, StructureMirror, VisibilityMap,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Project file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported project format version {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] CommonError),
}

/// One project file, shared by the editor as its document store, page store
/// and persisted structure.
pub struct WorkspaceState {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    project: RwLock<Project>,
    dirty: AtomicBool,
}

impl WorkspaceState {
    /// Wrap a project that has not been saved yet
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>, project: Project) -> Self {
        Self {
            path: path.into(),
            fs,
            project: RwLock::new(project),
            dirty: AtomicBool::new(true),
        }
    }

    /// Read a project file
    pub fn load(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let path = path.into();
        if !fs.exists(&path) {
            return Err(WorkspaceError::NotFound(path));
        }

        let text = fs.read_to_string(&path)?;
        let project = serializer::decode(&text)?;
        tracing::info!(
            "[Workspace] loaded '{}' ({} pages) from {}",
            project.name,
            project.pages.len(),
            path.display()
        );

        Ok(Self {
            path,
            fs,
            project: RwLock::new(project),
            dirty: AtomicBool::new(false),
        })
    }

    /// Write the project file if anything changed since the last save
    pub fn save(&self) -> Result<bool, WorkspaceError> {
        if !self.is_dirty() {
            return Ok(false);
        }

        let text = serializer::encode(&self.read())?;
        self.fs.write(&self.path, &text)?;
        self.dirty.store(false, Ordering::SeqCst);
        tracing::info!("[Workspace] saved {}", self.path.display());
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Snapshot of the whole project
    pub fn project(&self) -> Project {
        self.read().clone()
    }

    /// Project-wide order and visibility
    pub fn structure(&self) -> Structure {
        let project = self.read();
        Structure::new(project.order.clone(), project.visibility.clone())
    }

    fn read(&self) -> RwLockReadGuard<'_, Project> {
        self.project.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Project> {
        self.dirty.store(true, Ordering::SeqCst);
        self.project.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for WorkspaceState {
    fn document(&self) -> Document {
        self.read().document.clone()
    }

    fn update_document(&self, updater: &mut dyn FnMut(&Document) -> Document) -> Document {
        let mut project = self.write();
        let next = updater(&project.document);
        project.document = next.clone();
        next
    }
}

impl PageStore for WorkspaceState {
    fn list_pages(&self) -> Vec<Page> {
        self.read().pages.clone()
    }

    fn active_page(&self) -> Option<Page> {
        self.read().active_page().cloned()
    }

    fn activate_page(&self, id: &PageId) -> Result<Page, StoreError> {
        let mut project = self.write();
        let page = project
            .page(id)
            .cloned()
            .ok_or_else(|| StoreError::PageNotFound(id.clone()))?;
        project.active_page = Some(id.clone());
        Ok(page)
    }

    fn update_page(&self, id: &PageId, patch: PagePatch) -> Result<Page, StoreError> {
        let mut project = self.write();
        let page = project
            .page_mut(id)
            .ok_or_else(|| StoreError::PageNotFound(id.clone()))?;
        page.apply_patch(patch);
        Ok(page.clone())
    }

    fn add_page(&self, page: Page) -> Result<(), StoreError> {
        let mut project = self.write();
        if project.page(&page.id).is_some() {
            return Err(StoreError::DuplicatePage(page.id));
        }
        project.pages.push(page);
        Ok(())
    }

    fn remove_page(&self, id: &PageId) -> Result<Page, StoreError> {
        let mut project = self.write();
        let index = project
            .pages
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| StoreError::PageNotFound(id.clone()))?;
        if project.active_page.as_ref() == Some(id) {
            project.active_page = None;
        }
        Ok(project.pages.remove(index))
    }
}

/// The project keeps the global order for pages without their own and the
/// visibility for all of them.
impl StructureMirror for WorkspaceState {
    fn name(&self) -> &str {
        "project"
    }

    fn mirror_order(&self, order: &SectionOrder) -> Result<(), StoreError> {
        if self.read().active_page.is_some() {
            return Ok(());
        }
        self.write().order = order.clone();
        Ok(())
    }

    fn mirror_visibility(&self, visibility: &VisibilityMap) -> Result<(), StoreError> {
        self.write().visibility = visibility.clone();
        Ok(())
    }
}
