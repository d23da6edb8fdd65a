use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval};
use tracing::{debug, info, warn};

use super::{KnowledgeNode, KnowledgeTree};

const SAVE_POLL_INTERVAL: Duration = Duration::from_millis(100);
const MIN_SAVE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Durable storage for the whole tree as one JSON document at `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeStore {
    path: PathBuf,
}

impl TreeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored tree, or returns the seed tree when nothing has been saved yet.
    pub fn load_or_seed(&self) -> Result<KnowledgeTree> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no stored tree found; using seed tree");
            return Ok(KnowledgeTree::seeded());
        }
        self.load()
    }

    pub fn load(&self) -> Result<KnowledgeTree> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read tree from `{}`", self.path.display()))?;
        let root = serde_json::from_str::<KnowledgeNode>(&raw)
            .with_context(|| format!("failed to parse tree in `{}`", self.path.display()))?;
        KnowledgeTree::new(root)
            .with_context(|| format!("stored tree in `{}` is invalid", self.path.display()))
    }

    pub fn save(&self, tree: &KnowledgeTree) -> Result<()> {
        self.save_root(tree.root())
    }

    fn save_root(&self, root: &KnowledgeNode) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }

        let payload =
            serde_json::to_string_pretty(root).context("failed to serialize knowledge tree")?;
        let staging = self.staging_path();
        fs::write(&staging, payload)
            .with_context(|| format!("failed to write `{}`", staging.display()))?;
        fs::rename(&staging, &self.path).with_context(|| {
            format!(
                "failed to move `{}` into `{}`",
                staging.display(),
                self.path.display()
            )
        })?;

        debug!(path = %self.path.display(), "knowledge tree saved");
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Reads a seed document (JSON, or YAML for `.yaml`/`.yml` files) into a validated tree.
pub fn import_tree(path: &Path) -> Result<KnowledgeTree> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed document `{}`", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );

    let root = if is_yaml {
        serde_yaml::from_str::<KnowledgeNode>(&raw)
            .with_context(|| format!("failed to parse YAML seed `{}`", path.display()))?
    } else {
        serde_json::from_str::<KnowledgeNode>(&raw)
            .with_context(|| format!("failed to parse JSON seed `{}`", path.display()))?
    };

    KnowledgeTree::new(root)
        .with_context(|| format!("seed document `{}` is not a valid tree", path.display()))
}

#[derive(Debug, Clone)]
pub struct TreeSaveHandle {
    command_tx: UnboundedSender<TreeSaveCommand>,
}

impl TreeSaveHandle {
    /// Queues a snapshot; only the latest snapshot inside a debounce window is written.
    pub fn request_save(&self, tree: &KnowledgeTree) {
        if self
            .command_tx
            .send(TreeSaveCommand::Save(tree.root().clone()))
            .is_err()
        {
            warn!(
                revision = tree.revision(),
                "tree save worker is gone; snapshot dropped"
            );
        }
    }

    fn shutdown(&self) {
        if self.command_tx.send(TreeSaveCommand::Shutdown).is_err() {
            warn!("tree save worker already stopped before shutdown");
        }
    }
}

/// Owns the spawned save task. Dropping it without [`TreeSaveWorker::shutdown`] leaves
/// pending snapshots at the mercy of the runtime.
#[derive(Debug)]
pub struct TreeSaveWorker {
    handle: TreeSaveHandle,
    task: JoinHandle<()>,
}

impl TreeSaveWorker {
    pub fn handle(&self) -> TreeSaveHandle {
        self.handle.clone()
    }

    /// Flushes the pending snapshot and waits for the worker to exit.
    pub async fn shutdown(self) {
        self.handle.shutdown();
        if let Err(error) = self.task.await {
            warn!(error = %error, "tree save worker did not exit cleanly");
        }
    }
}

#[derive(Debug)]
enum TreeSaveCommand {
    Save(KnowledgeNode),
    Shutdown,
}

pub fn spawn_tree_save_worker(
    handle: &Handle,
    store: TreeStore,
    debounce: Duration,
) -> TreeSaveWorker {
    let (command_tx, command_rx) = unbounded_channel();
    let task = handle.spawn(run_tree_save_loop(store, debounce, command_rx));
    TreeSaveWorker {
        handle: TreeSaveHandle { command_tx },
        task,
    }
}

async fn run_tree_save_loop(
    store: TreeStore,
    debounce: Duration,
    mut command_rx: UnboundedReceiver<TreeSaveCommand>,
) {
    let mut ticker = interval(SAVE_POLL_INTERVAL.min(debounce).max(MIN_SAVE_POLL_INTERVAL));
    let mut pending: Option<KnowledgeNode> = None;
    let mut save_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            maybe_command = command_rx.recv() => {
                match maybe_command {
                    Some(TreeSaveCommand::Save(root)) => {
                        pending = Some(root);
                        save_deadline = Some(Instant::now() + debounce);
                    }
                    Some(TreeSaveCommand::Shutdown) | None => {
                        if let Some(root) = pending.take() {
                            write_snapshot(&store, &root);
                        }
                        break;
                    }
                }
            }
            _ = ticker.tick() => {}
        }

        if let Some(deadline) = save_deadline
            && Instant::now() >= deadline
        {
            if let Some(root) = pending.take() {
                write_snapshot(&store, &root);
            }
            save_deadline = None;
        }
    }
}

fn write_snapshot(store: &TreeStore, root: &KnowledgeNode) {
    if let Err(error) = store.save_root(root) {
        warn!(
            path = %store.path().display(),
            error = %format!("{error:#}"),
            "failed to persist knowledge tree"
        );
    }
}
