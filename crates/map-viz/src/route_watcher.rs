//! Route watching.
//!
//! The host application reports its current route by writing it to a file.
//! This plugin watches that file and forwards each new route to the
//! scheduler, which re-targets the camera.

use bevy::prelude::*;
use notify::{Event as NotifyEvent, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

use crate::runner::{MapRunner, MapSet};

/// Plugin for following the host's navigation route.
pub struct RouteWatcherPlugin;

impl Plugin for RouteWatcherPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RouteSource>()
            .add_event::<RouteChanged>()
            .add_systems(
                Update,
                (check_route_file, apply_route_changes)
                    .chain()
                    .before(MapSet::Simulate),
            );
    }
}

/// File the host writes its current route to.
#[derive(Resource, Default, Debug, Clone)]
pub struct RouteSource {
    pub path: Option<PathBuf>,
    /// Last route forwarded, so rewrites of the same route are ignored.
    pub last_route: Option<String>,
}

impl RouteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            last_route: None,
        }
    }
}

/// Emitted when the host navigates.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct RouteChanged {
    pub route: String,
}

/// File watching state stored in Local (doesn't need Send+Sync).
#[derive(Default)]
struct RouteWatcherState {
    watcher: Option<RecommendedWatcher>,
    rx: Option<Receiver<Result<NotifyEvent, notify::Error>>>,
    initialized: bool,
}

impl RouteWatcherState {
    fn ensure_initialized(&mut self, path: &Path) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let watch_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = channel();
        match RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        ) {
            Ok(mut watcher) => {
                if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
                    tracing::warn!("Failed to watch directory {:?}: {}", watch_dir, e);
                } else {
                    tracing::info!("Watching route file: {:?}", path);
                }
                self.watcher = Some(watcher);
                self.rx = Some(rx);
            }
            Err(e) => {
                tracing::error!("Failed to create route watcher: {}", e);
            }
        }
    }
}

/// Current route from a route file: the first non-empty line, trimmed.
pub fn read_route(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Whether a file system event touches the route file.
pub fn affects(event: &NotifyEvent, route_file: &Path) -> bool {
    let Some(name) = route_file.file_name() else {
        return false;
    };
    (event.kind.is_create() || event.kind.is_modify())
        && event.paths.iter().any(|p| p.file_name() == Some(name))
}

fn check_route_file(
    mut watcher_state: Local<RouteWatcherState>,
    mut source: ResMut<RouteSource>,
    mut routes: EventWriter<RouteChanged>,
) {
    let Some(path) = source.path.clone() else {
        return;
    };

    let first_run = !watcher_state.initialized;
    watcher_state.ensure_initialized(&path);

    let mut changed = first_run;
    if let Some(rx) = &watcher_state.rx {
        while let Ok(result) = rx.try_recv() {
            match result {
                Ok(event) => changed |= affects(&event, &path),
                Err(e) => tracing::warn!("Route watcher error: {}", e),
            }
        }
    }
    if !changed {
        return;
    }

    let Some(route) = read_route(&path) else {
        return;
    };
    if source.last_route.as_deref() == Some(route.as_str()) {
        return;
    }
    source.last_route = Some(route.clone());
    routes.send(RouteChanged { route });
}

fn apply_route_changes(mut routes: EventReader<RouteChanged>, mut runner: ResMut<MapRunner>) {
    for change in routes.read() {
        tracing::info!("Host navigated to '{}'", change.route);
        runner.scheduler.set_route(&change.route);
    }
}
