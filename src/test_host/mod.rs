//! In-memory host collaborators for tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use url::Url;

use crate::archive::Manifest;
use crate::error::{HostError, TransferError};
use crate::host::{
    AnnotationStore, AnnotationValue, ErrorSink, Expiration, ExportSources, ImportTargets, Link,
    LinkSource, PrefType, PrefValue, PreferenceStore, ThumbnailCache,
};
use crate::pipeline::{Direction, FilePicker, FileRequest, Prompt};
use crate::transfer::TransferOptions;

/// Preference store backed by a map. Counts reads.
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    pub values: BTreeMap<String, PrefValue>,
    /// Keys whose setters always fail
    pub locked: HashSet<String>,
    pub reads: Cell<usize>,
}

impl MemoryPrefs {
    pub fn with(mut self, key: &str, value: PrefValue) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    fn get(&self, key: &str, expected: PrefType) -> Result<PrefValue, HostError> {
        self.reads.set(self.reads.get() + 1);
        let value = self
            .values
            .get(key)
            .ok_or_else(|| HostError::no_such_key(key))?;
        if value.pref_type() != expected {
            return Err(HostError::TypeMismatch {
                key: key.to_string(),
                expected: expected.name(),
                found: value.pref_type().name(),
            });
        }
        Ok(value.clone())
    }

    fn set(&mut self, key: &str, value: PrefValue) -> Result<(), HostError> {
        if self.locked.contains(key) {
            return Err(HostError::malformed(key, "preference is locked"));
        }
        if let Some(existing) = self.values.get(key) {
            if existing.pref_type() != value.pref_type() {
                return Err(HostError::TypeMismatch {
                    key: key.to_string(),
                    expected: existing.pref_type().name(),
                    found: value.pref_type().name(),
                });
            }
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

impl PreferenceStore for MemoryPrefs {
    fn pref_type(&self, key: &str) -> PrefType {
        self.reads.set(self.reads.get() + 1);
        self.values
            .get(key)
            .map(PrefValue::pref_type)
            .unwrap_or(PrefType::Invalid)
    }

    fn get_string(&self, key: &str) -> Result<String, HostError> {
        match self.get(key, PrefType::String)? {
            PrefValue::String(s) => Ok(s),
            _ => unreachable!(),
        }
    }

    fn get_int(&self, key: &str) -> Result<i32, HostError> {
        match self.get(key, PrefType::Int)? {
            PrefValue::Int(i) => Ok(i),
            _ => unreachable!(),
        }
    }

    fn get_bool(&self, key: &str) -> Result<bool, HostError> {
        match self.get(key, PrefType::Bool)? {
            PrefValue::Bool(b) => Ok(b),
            _ => unreachable!(),
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), HostError> {
        self.set(key, PrefValue::String(value.to_string()))
    }

    fn set_int(&mut self, key: &str, value: i32) -> Result<(), HostError> {
        self.set(key, PrefValue::Int(value))
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), HostError> {
        self.set(key, PrefValue::Bool(value))
    }
}

/// Annotation store keyed by (name, page). Counts reads.
#[derive(Debug, Default)]
pub struct MemoryAnnotations {
    pub values: BTreeMap<(String, String), (AnnotationValue, Expiration)>,
    pub reads: Cell<usize>,
}

impl MemoryAnnotations {
    pub fn with(mut self, name: &str, page: &str, value: &str) -> Self {
        self.values.insert(
            (name.to_string(), page.to_string()),
            (AnnotationValue::from(value), Expiration::Never),
        );
        self
    }

    pub fn get(&self, name: &str, page: &str) -> Option<&AnnotationValue> {
        self.values
            .get(&(name.to_string(), page.to_string()))
            .map(|(value, _)| value)
    }
}

impl AnnotationStore for MemoryAnnotations {
    fn pages_with_annotation(&self, name: &str) -> Result<Vec<Url>, HostError> {
        self.reads.set(self.reads.get() + 1);
        self.values
            .keys()
            .filter(|(n, _)| n == name)
            .map(|(_, page)| {
                Url::parse(page).map_err(|source| HostError::InvalidUrl {
                    url: page.clone(),
                    source,
                })
            })
            .collect()
    }

    fn page_annotation(&self, page: &Url, name: &str) -> Result<AnnotationValue, HostError> {
        self.reads.set(self.reads.get() + 1);
        self.get(name, page.as_str())
            .cloned()
            .ok_or_else(|| HostError::no_such_key(format!("{name} on {page}")))
    }

    fn set_page_annotation(
        &mut self,
        page: &Url,
        name: &str,
        value: &AnnotationValue,
        expiration: Expiration,
    ) -> Result<(), HostError> {
        self.values.insert(
            (name.to_string(), page.to_string()),
            (value.clone(), expiration),
        );
        Ok(())
    }
}

/// Thumbnail cache in a directory; leaf name derived from the URL host.
#[derive(Debug)]
pub struct DirThumbnails {
    pub dir: PathBuf,
}

impl ThumbnailCache for DirThumbnails {
    fn path_for_url(&self, url: &str) -> PathBuf {
        let leaf: String = url
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{leaf}.png"))
    }

    fn directory(&self) -> &Path {
        &self.dir
    }
}

/// Fixed ranked link list.
#[derive(Debug, Default)]
pub struct StaticLinks {
    pub links: Vec<Link>,
    pub cells: usize,
}

impl LinkSource for StaticLinks {
    fn links(&self) -> Result<Vec<Link>, HostError> {
        Ok(self.links.clone())
    }

    fn grid_cell_count(&self) -> usize {
        self.cells
    }
}

/// Error sink that remembers every message.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub errors: RefCell<Vec<String>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.errors.borrow().len()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, error: &TransferError) {
        self.errors.borrow_mut().push(error.to_string());
    }
}

/// File picker answering with a preset path, or cancelling when `None`.
#[derive(Debug, Default)]
pub struct ScriptedPicker {
    pub path: Option<PathBuf>,
    pub requests: RefCell<Vec<FileRequest>>,
}

impl ScriptedPicker {
    pub fn answering(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn cancelling() -> Self {
        Self::default()
    }
}

impl FilePicker for ScriptedPicker {
    async fn pick_save(&self, request: &FileRequest) -> Option<PathBuf> {
        self.requests.borrow_mut().push(request.clone());
        self.path.clone()
    }

    async fn pick_open(&self, request: &FileRequest) -> Option<PathBuf> {
        self.requests.borrow_mut().push(request.clone());
        self.path.clone()
    }
}

/// Prompt answering each dialog with a preset choice (`None` cancels).
#[derive(Debug)]
pub struct ScriptedPrompt {
    pub export: Option<TransferOptions>,
    pub import: Option<TransferOptions>,
    pub manifests: RefCell<Vec<Manifest>>,
    pub notices: RefCell<Vec<Direction>>,
}

impl ScriptedPrompt {
    pub fn accepting() -> Self {
        Self {
            export: Some(TransferOptions::default()),
            import: Some(TransferOptions::default()),
            manifests: RefCell::new(Vec::new()),
            notices: RefCell::new(Vec::new()),
        }
    }

    pub fn cancelling() -> Self {
        Self {
            export: None,
            import: None,
            ..Self::accepting()
        }
    }
}

impl Prompt for ScriptedPrompt {
    async fn export_options(&self, _defaults: TransferOptions) -> Option<TransferOptions> {
        self.export
    }

    async fn confirm_import(&self, manifest: &Manifest) -> Option<TransferOptions> {
        self.manifests.borrow_mut().push(manifest.clone());
        self.import
    }

    fn notify_cancelled(&self, direction: Direction) {
        self.notices.borrow_mut().push(direction);
    }
}

/// A complete fake host rooted in a temporary profile directory.
pub struct TestHost {
    pub dir: TempDir,
    pub prefs: MemoryPrefs,
    pub annotations: MemoryAnnotations,
    pub thumbnails: DirThumbnails,
    pub links: StaticLinks,
}

impl TestHost {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let thumbnails = DirThumbnails {
            dir: dir.path().join("thumbnails"),
        };
        std::fs::create_dir_all(&thumbnails.dir).unwrap();
        Self {
            dir,
            prefs: MemoryPrefs::default(),
            annotations: MemoryAnnotations::default(),
            thumbnails,
            links: StaticLinks {
                links: Vec::new(),
                cells: 9,
            },
        }
    }

    pub fn profile_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn sources(&self) -> ExportSources<'_> {
        ExportSources {
            prefs: &self.prefs,
            annotations: &self.annotations,
            thumbnails: &self.thumbnails,
            links: &self.links,
            profile_dir: self.dir.path(),
        }
    }

    pub fn targets(&mut self) -> ImportTargets<'_> {
        ImportTargets {
            prefs: &mut self.prefs,
            annotations: &mut self.annotations,
            thumbnails: &self.thumbnails,
            profile_dir: self.dir.path(),
        }
    }

    /// Write a thumbnail for `url` and set its writability.
    pub fn add_thumbnail(&mut self, url: &str, data: &[u8], readonly: bool) -> PathBuf {
        let path = self.thumbnails.path_for_url(url);
        std::fs::write(&path, data).unwrap();
        if readonly {
            let mut permissions = std::fs::metadata(&path).unwrap().permissions();
            permissions.set_readonly(true);
            std::fs::set_permissions(&path, permissions).unwrap();
        }
        self.links.links.push(Link::new(url));
        path
    }

    pub fn write_background(&self, data: &[u8]) {
        std::fs::write(self.dir.path().join("newtab-background"), data).unwrap();
    }

    /// Path for an archive inside the temporary directory.
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
