//! File watcher for discovered plugins and marketplaces.
//!
//! # Architecture
//!
//! ```text
//! filesystem events (notify, one watcher per item)
//!   → unbounded channel → per-item pump task
//!   → keep Create/Modify/Remove under a watched entry
//!   → drop node_modules, .git, dist
//!   → debounce 300ms per item
//!   → on_change(item, changed_path)
//! ```
//!
//! A pattern that does not exist yet cannot be watched directly, so the
//! item root is also watched non-recursively and events are filtered to
//! paths under a pattern.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::types::DiscoveredItem;

/// Default debounce interval for file change events.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Entries under an item root that trigger a sync.
pub const WATCHED_ENTRIES: &[&str] = &[
    ".claude-plugin",
    "skills",
    "commands",
    "agents",
    "hooks",
    ".mcp.json",
    ".lsp.json",
];

/// Directory names to ignore during file watching.
pub const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "dist"];

/// Paths watched for `item`, whether or not they exist yet
pub fn watch_patterns(item: &DiscoveredItem) -> Vec<PathBuf> {
    patterns_under(&item.path)
}

fn patterns_under(root: &Path) -> Vec<PathBuf> {
    WATCHED_ENTRIES.iter().map(|entry| root.join(entry)).collect()
}

type Timers<K> = Arc<Mutex<HashMap<K, (u64, JoinHandle<()>)>>>;

/// Keyed trailing-edge debounce. Each trigger replaces the key's pending
/// timer, so an action runs once per quiet period.
pub struct Debouncer<K> {
    delay: Duration,
    timers: Timers<K>,
    generation: AtomicU64,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timers: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `action` to run after the delay, cancelling any action
    /// still pending for `key`. Must be called within a tokio runtime.
    pub fn trigger<F>(&self, key: K, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let timers = Arc::clone(&self.timers);
        let delay = self.delay;
        let task_key = key.clone();

        // Held across spawn so the new task cannot check its slot before
        // it is inserted.
        let mut guard = lock(&self.timers);
        if let Some((_, previous)) = guard.remove(&key) {
            previous.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut guard = lock(&timers);
                match guard.get(&task_key) {
                    Some((current, _)) if *current == generation => {
                        guard.remove(&task_key);
                    }
                    _ => return,
                }
            }
            action();
        });
        guard.insert(key, (generation, handle));
    }

    /// Abort every pending action
    pub fn cancel_all(&self) {
        for (_, (_, handle)) in lock(&self.timers).drain() {
            handle.abort();
        }
    }

    /// Number of actions waiting to fire
    pub fn pending(&self) -> usize {
        lock(&self.timers).len()
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for (_, (_, handle)) in lock(&self.timers).drain() {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Watches items and reports debounced changes.
///
/// Dropping the watcher stops it; [`stop`](Self::stop) does the same and
/// waits for the pump tasks to finish.
pub struct Watcher {
    debouncer: Arc<Debouncer<PathBuf>>,
    pumps: Vec<JoinHandle<()>>,
}

impl Default for Watcher {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Watcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debouncer: Arc::new(Debouncer::new(debounce)),
            pumps: Vec::new(),
        }
    }

    /// Start watching `items`. Returns how many items are being watched;
    /// an item whose watch cannot be set up is logged and skipped.
    pub fn watch<F>(&mut self, items: &[DiscoveredItem], on_change: F) -> usize
    where
        F: Fn(DiscoveredItem, PathBuf) + Send + Sync + 'static,
    {
        let on_change = Arc::new(on_change);
        let mut watched = 0;

        for item in items {
            match self.watch_item(item, Arc::clone(&on_change)) {
                Ok(pump) => {
                    self.pumps.push(pump);
                    watched += 1;
                }
                Err(e) => warn!(
                    item = %item.name,
                    path = %item.path.display(),
                    error = %e,
                    "Failed to watch item"
                ),
            }
        }

        watched
    }

    fn watch_item<F>(&self, item: &DiscoveredItem, on_change: Arc<F>) -> notify::Result<JoinHandle<()>>
    where
        F: Fn(DiscoveredItem, PathBuf) + Send + Sync + 'static,
    {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = raw_tx.send(res);
            },
            notify::Config::default(),
        )?;

        let root = item.path.canonicalize().unwrap_or_else(|_| item.path.clone());
        watcher.watch(&root, RecursiveMode::NonRecursive)?;

        for pattern in patterns_under(&root) {
            let mode = if pattern.is_dir() {
                RecursiveMode::Recursive
            } else if pattern.exists() {
                RecursiveMode::NonRecursive
            } else {
                continue;
            };
            if let Err(e) = watcher.watch(&pattern, mode) {
                warn!(path = %pattern.display(), error = %e, "Failed to watch path");
            }
        }

        info!(item = %item.name, path = %item.path.display(), "Watching");

        let pump = Pump {
            item: item.clone(),
            root,
            debouncer: Arc::clone(&self.debouncer),
        };
        Ok(tokio::spawn(pump.run(watcher, raw_rx, on_change)))
    }

    pub fn watched(&self) -> usize {
        self.pumps.len()
    }

    /// Cancel pending callbacks and release all watches. Safe to call
    /// more than once.
    pub async fn stop(&mut self) {
        self.debouncer.cancel_all();
        for pump in self.pumps.drain(..) {
            pump.abort();
            let _ = pump.await;
        }
        debug!("Watcher stopped");
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.debouncer.cancel_all();
        for pump in &self.pumps {
            pump.abort();
        }
    }
}

/// Moves raw events for one item into the debouncer
struct Pump {
    item: DiscoveredItem,
    root: PathBuf,
    debouncer: Arc<Debouncer<PathBuf>>,
}

impl Pump {
    async fn run<F>(
        self,
        watcher: RecommendedWatcher,
        mut raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
        on_change: Arc<F>,
    ) where
        F: Fn(DiscoveredItem, PathBuf) + Send + Sync + 'static,
    {
        // Dropping the notify watcher releases its watches.
        let _watcher = watcher;

        while let Some(event) = raw_rx.recv().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    warn!(item = %self.item.name, error = %e, "Filesystem watcher error");
                    continue;
                }
            };

            let Some(relative) = relevant_path(&self.root, &event) else {
                continue;
            };
            debug!(item = %self.item.name, path = %relative.display(), kind = ?event.kind, "File change detected");

            let item = self.item.clone();
            let changed = self.item.path.join(relative);
            let on_change = Arc::clone(&on_change);
            self.debouncer
                .trigger(self.item.path.clone(), move || on_change(item, changed));
        }
    }
}

/// First path in `event` that should trigger a sync, relative to `root`
pub fn relevant_path(root: &Path, event: &Event) -> Option<PathBuf> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any => {}
        _ => return None,
    }

    event
        .paths
        .iter()
        .filter_map(|path| path.strip_prefix(root).ok())
        .find(|relative| is_watched(relative))
        .map(Path::to_path_buf)
}

fn is_watched(relative: &Path) -> bool {
    let mut components = relative.components();
    let first = match components.next() {
        Some(Component::Normal(name)) => name,
        _ => return false,
    };
    if !WATCHED_ENTRIES.iter().any(|entry| first == *entry) {
        return false;
    }
    !relative.components().any(|c| match c {
        Component::Normal(name) => IGNORED_DIRS.iter().any(|dir| name == *dir),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKind;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use std::fs;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let make = {
            let count = Arc::clone(&count);
            move || {
                let count = Arc::clone(&count);
                Box::new(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                }) as Box<dyn FnOnce() + Send>
            }
        };
        (count, make)
    }

    fn item(path: &Path) -> DiscoveredItem {
        DiscoveredItem {
            kind: ItemKind::Plugin,
            name: "my-plugin".into(),
            path: path.to_path_buf(),
            manifest_path: path.join(".claude-plugin/plugin.json"),
        }
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once() {
        let debouncer = Debouncer::new(DEFAULT_DEBOUNCE);
        let (count, action) = counter();

        for _ in 0..5 {
            debouncer.trigger("a", action());
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(debouncer.pending(), 1);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_events_fire_twice() {
        let debouncer = Debouncer::new(DEFAULT_DEBOUNCE);
        let (count, action) = counter();

        debouncer.trigger("a", action());
        tokio::time::sleep(Duration::from_millis(500)).await;
        debouncer.trigger("a", action());
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let debouncer = Debouncer::new(DEFAULT_DEBOUNCE);
        let (count, action) = counter();

        debouncer.trigger("a", action());
        debouncer.trigger("b", action());
        assert_eq!(debouncer.pending(), 2);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_prevents_firing() {
        let debouncer = Debouncer::new(DEFAULT_DEBOUNCE);
        let (count, action) = counter();

        debouncer.trigger("a", action());
        debouncer.trigger("b", action());
        debouncer.cancel_all();
        assert_eq!(debouncer.pending(), 0);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn patterns_cover_component_entries() {
        let patterns = watch_patterns(&item(Path::new("/work/p")));

        assert_eq!(patterns.len(), WATCHED_ENTRIES.len());
        assert!(patterns.contains(&PathBuf::from("/work/p/.claude-plugin")));
        assert!(patterns.contains(&PathBuf::from("/work/p/skills")));
        assert!(patterns.contains(&PathBuf::from("/work/p/.lsp.json")));
    }

    #[test]
    fn relevance_filter() {
        let root = Path::new("/work/p");
        let create = EventKind::Create(CreateKind::File);
        let modify = EventKind::Modify(ModifyKind::Any);

        assert_eq!(
            relevant_path(root, &event(create, "/work/p/skills/a/SKILL.md")),
            Some(PathBuf::from("skills/a/SKILL.md"))
        );
        assert_eq!(
            relevant_path(root, &event(modify, "/work/p/.mcp.json")),
            Some(PathBuf::from(".mcp.json"))
        );
        assert!(relevant_path(root, &event(modify, "/work/p/README.md")).is_none());
        assert!(relevant_path(root, &event(modify, "/work/p/hooks/node_modules/x.js")).is_none());
        assert!(relevant_path(root, &event(modify, "/work/p/skills/.git/HEAD")).is_none());
        assert!(relevant_path(root, &event(modify, "/elsewhere/skills/x")).is_none());
        assert!(relevant_path(
            root,
            &event(EventKind::Access(AccessKind::Any), "/work/p/skills/x")
        )
        .is_none());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("skills")).unwrap();

        let mut watcher = Watcher::new(Duration::from_millis(50));
        let watched = watcher.watch(&[item(tmp.path())], |_, _| {});
        assert_eq!(watched, 1);
        assert_eq!(watcher.watched(), 1);

        watcher.stop().await;
        watcher.stop().await;
        assert_eq!(watcher.watched(), 0);
    }

    #[tokio::test]
    async fn missing_item_root_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let mut watcher = Watcher::default();

        let watched = watcher.watch(&[item(&tmp.path().join("gone"))], |_, _| {});
        assert_eq!(watched, 0);
    }

    #[tokio::test]
    async fn reports_file_changes() {
        let tmp = TempDir::new().unwrap();
        let skills = tmp.path().join("skills");
        fs::create_dir_all(&skills).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = Watcher::new(Duration::from_millis(50));
        watcher.watch(&[item(tmp.path())], move |item, changed| {
            let _ = tx.send((item.name, changed));
        });

        fs::write(skills.join("SKILL.md"), "# changed").unwrap();

        let (name, changed) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no change reported")
            .unwrap();
        assert_eq!(name, "my-plugin");
        assert!(changed.starts_with(tmp.path().join("skills")));

        watcher.stop().await;
    }
}
