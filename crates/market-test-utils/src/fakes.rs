//! In-memory fakes for injected collaborators.
//!
//! All fakes use interior mutability so they can be shared as `Arc`s between
//! the code under test and the assertions.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use market_catalog::{CatalogError, HttpClient, HttpResponse};
use market_core::{ConflictDecision, ConflictResolver, NoticeLevel, Notifier, TrackingStore};
use market_fs::{ContentStore, EntryKind, NormalizedPath};
use market_meta::TrackingFileData;

/// Content store backed by a map of path to bytes.
///
/// Folders exist implicitly above every file, or explicitly via
/// [`MemoryContentStore::with_folder`].
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    folders: Mutex<BTreeSet<String>>,
    failing_writes: Mutex<BTreeSet<String>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.put(path, content);
        self
    }

    pub fn with_folder(self, path: &str) -> Self {
        self.folders
            .lock()
            .unwrap()
            .insert(NormalizedPath::new(path).to_string());
        self
    }

    /// Make every write to `path` fail.
    pub fn fail_writes_to(&self, path: &str) {
        self.failing_writes
            .lock()
            .unwrap()
            .insert(NormalizedPath::new(path).to_string());
    }

    /// Write directly, bypassing the trait.
    pub fn put(&self, path: &str, content: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .unwrap()
            .insert(NormalizedPath::new(path).to_string(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(&NormalizedPath::new(path).to_string())
            .cloned()
    }

    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Every file path, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    fn is_folder(&self, path: &str) -> bool {
        let prefix = format!("{path}/");
        let explicit = {
            let folders = self.folders.lock().unwrap();
            folders.contains(path) || folders.iter().any(|f| f.starts_with(&prefix))
        };
        explicit
            || self
                .files
                .lock()
                .unwrap()
                .keys()
                .any(|f| f.starts_with(&prefix))
    }
}

impl ContentStore for MemoryContentStore {
    fn stat(&self, path: &NormalizedPath) -> market_fs::Result<Option<EntryKind>> {
        if self.files.lock().unwrap().contains_key(path.as_str()) {
            Ok(Some(EntryKind::File))
        } else if self.is_folder(path.as_str()) {
            Ok(Some(EntryKind::Folder))
        } else {
            Ok(None)
        }
    }

    fn read(&self, path: &NormalizedPath) -> market_fs::Result<Vec<u8>> {
        self.get(path.as_str()).ok_or_else(|| {
            market_fs::Error::io(
                path.to_native(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )
        })
    }

    fn write(&self, path: &NormalizedPath, content: &[u8]) -> market_fs::Result<()> {
        if self.failing_writes.lock().unwrap().contains(path.as_str()) {
            return Err(market_fs::Error::io(
                path.to_native(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "write refused"),
            ));
        }
        if self.is_folder(path.as_str()) {
            return Err(market_fs::Error::NotAFile {
                path: path.to_string(),
            });
        }
        self.put(path.as_str(), content.to_vec());
        Ok(())
    }

    fn delete(&self, path: &NormalizedPath) -> market_fs::Result<bool> {
        Ok(self.files.lock().unwrap().remove(path.as_str()).is_some())
    }

    fn list_children(&self, path: &NormalizedPath) -> market_fs::Result<Vec<NormalizedPath>> {
        let prefix = if path.as_str().is_empty() {
            String::new()
        } else {
            format!("{}/", path.as_str())
        };
        let files = self.files.lock().unwrap();
        let folders = self.folders.lock().unwrap();
        let children: BTreeSet<String> = files
            .keys()
            .chain(folders.iter())
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(|name| format!("{prefix}{name}"))
            .collect();
        Ok(children.into_iter().map(NormalizedPath::new).collect())
    }
}

#[derive(Debug, Clone)]
enum Route {
    Respond(HttpResponse),
    Fail(String),
}

/// HTTP client answering from a table of routes and recording every call.
/// Unknown URLs get a 404.
#[derive(Debug, Default)]
pub struct FakeHttpClient {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
}

impl FakeHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: HttpResponse) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Respond(response));
    }

    /// 200 with `body`.
    pub fn ok(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.respond(url, HttpResponse::ok(body));
    }

    pub fn status(&self, url: &str, status: u16) {
        self.respond(url, HttpResponse::with_status(status, Vec::new()));
    }

    /// Fail without a response, like a timeout or refused connection.
    pub fn fail(&self, url: &str, reason: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Fail(reason.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn get(&self, url: &str) -> market_catalog::Result<HttpResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        let route = self.routes.lock().unwrap().get(url).cloned();
        match route {
            Some(Route::Respond(response)) => Ok(response),
            Some(Route::Fail(reason)) => Err(CatalogError::request(url, reason)),
            None => Ok(HttpResponse::with_status(404, Vec::new())),
        }
    }
}

/// Tracking store held in memory.
#[derive(Debug, Default)]
pub struct MemoryTrackingStore {
    data: Mutex<Option<TrackingFileData>>,
    corrupt: Mutex<bool>,
    fail_saves: Mutex<bool>,
    saves: Mutex<usize>,
}

impl MemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: TrackingFileData) -> Self {
        let store = Self::default();
        *store.data.lock().unwrap() = Some(data);
        store
    }

    /// Make `load` report unreadable content.
    pub fn corrupted() -> Self {
        let store = Self::default();
        *store.corrupt.lock().unwrap() = true;
        store
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().unwrap() = fail;
    }

    pub fn saved(&self) -> Option<TrackingFileData> {
        self.data.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl TrackingStore for MemoryTrackingStore {
    fn load(&self) -> market_core::Result<Option<TrackingFileData>> {
        if *self.corrupt.lock().unwrap() {
            return Err(market_core::Error::tracking("memory", "unparseable"));
        }
        Ok(self.data.lock().unwrap().clone())
    }

    fn save(&self, data: &TrackingFileData) -> market_core::Result<()> {
        if *self.fail_saves.lock().unwrap() {
            return Err(market_core::Error::tracking("memory", "disk full"));
        }
        *self.data.lock().unwrap() = Some(data.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Resolver that replays queued decisions and records each prompt.
///
/// An exhausted script answers `None`, as if the prompt were closed.
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    script: Mutex<VecDeque<Option<ConflictDecision>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, decision: ConflictDecision) {
        self.script.lock().unwrap().push_back(Some(decision));
    }

    /// Queue a closed prompt.
    pub fn push_closed(&self) {
        self.script.lock().unwrap().push_back(None);
    }

    /// Paths the resolver was asked about, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConflictResolver for ScriptedResolver {
    async fn resolve_conflict(&self, existing_path: &str) -> Option<ConflictDecision> {
        self.prompts.lock().unwrap().push(existing_path.to_string());
        self.script.lock().unwrap().pop_front().flatten()
    }
}

/// Notifier that keeps every notice.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn messages_at(&self, level: NoticeLevel) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
