use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Watches `trend.toml` and sends a notification whenever it is written.
///
/// The parent directory is watched rather than the file itself, so editors
/// that save by replacing the file are still picked up.
///
/// # Example
/// ```no_run
/// # async fn demo() {
/// let (_, mut rx) = trend_config::ConfigWatcher::spawn("/home/user/.config/trend/trend.toml");
/// while rx.recv().await.is_some() {
///     println!("config changed, reloading");
/// }
/// # }
/// ```
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path`.
    /// Returns the watcher handle and a receiver that fires on every detected change.
    pub fn spawn(path: impl AsRef<Path>) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        let path = path.as_ref().to_path_buf();
        let watcher = Self { path: path.clone() };

        tokio::spawn(watch_loop(path, tx));

        (watcher, rx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn watch_loop(path: PathBuf, tx: mpsc::Sender<()>) {
    use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
    use std::time::Duration;

    let Some(dir) = path.parent().map(Path::to_path_buf) else {
        error!("Config path '{}' has no parent directory", path.display());
        return;
    };
    if !dir.exists() {
        warn!("Config directory '{}' does not exist; not watching", dir.display());
        return;
    }

    let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = event_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        error!("Failed to watch '{}': {e}", dir.display());
        return;
    }

    info!("Watching config file: {}", path.display());

    while let Some(event) = event_rx.recv().await {
        match event {
            Ok(e) if touches_config(&e, &path) => {
                debug!(kind = ?e.kind, "config file changed");
                // A full channel already has a pending reload queued.
                match tx.try_send(()) {
                    Ok(()) | Err(mpsc::error::TrySendError::Full(())) => {}
                    Err(mpsc::error::TrySendError::Closed(())) => break,
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Watcher error: {e}"),
        }
    }
}

fn touches_config(event: &notify::Event, path: &Path) -> bool {
    use notify::EventKind::{Create, Modify};
    matches!(event.kind, Modify(_) | Create(_))
        && event.paths.iter().any(|p| p.file_name() == path.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, EventKind, ModifyKind, RemoveKind};
    use notify::Event;

    #[test]
    fn only_writes_to_the_config_file_count() {
        let path = Path::new("/tmp/trend/trend.toml");

        let write = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path.to_path_buf());
        assert!(touches_config(&write, path));

        let create = Event::new(EventKind::Create(CreateKind::File)).add_path(path.to_path_buf());
        assert!(touches_config(&create, path));

        let other = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/tmp/trend/other.toml"));
        assert!(!touches_config(&other, path));

        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(path.to_path_buf());
        assert!(!touches_config(&removed, path));
    }
}
