//! App state persistence: JSON save/load across restarts.

use std::path::Path;

use bearscan_runner::SortKey;
use serde::{Deserialize, Serialize};

use crate::app::{AppState, Panel};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub active_panel: Panel,
    pub sort: Option<SortKey>,
    pub show_all: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            active_panel: Panel::Candidates,
            sort: None,
            show_all: false,
        }
    }
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Extract persisted state from AppState.
pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        active_panel: app.active_panel,
        sort: Some(app.candidates.sort),
        show_all: app.candidates.show_all,
    }
}

/// Apply persisted state to AppState. A saved sort key only wins when the
/// configuration left the default.
pub fn apply(app: &mut AppState, state: PersistedState) {
    app.active_panel = state.active_panel;
    if app.candidates.sort == SortKey::default() {
        if let Some(sort) = state.sort {
            app.candidates.sort = sort;
        }
    }
    app.candidates.show_all = state.show_all;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let state = PersistedState {
            active_panel: Panel::Universe,
            sort: Some(SortKey::Score),
            show_all: true,
        };
        save(&path, &state).unwrap();

        let (mut app, _rx) = test_app();
        apply(&mut app, load(&path));
        assert_eq!(app.active_panel, Panel::Universe);
        assert_eq!(app.candidates.sort, SortKey::Score);
        assert!(app.candidates.show_all);

        let again = extract(&app);
        assert_eq!(again.sort, Some(SortKey::Score));
    }

    #[test]
    fn missing_file_returns_defaults() {
        let loaded = load(Path::new("/nonexistent/path/state.json"));
        assert_eq!(loaded.active_panel, Panel::Candidates);
        assert!(loaded.sort.is_none());
    }

    #[test]
    fn corrupt_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not valid json {{{").unwrap();
        assert!(!load(&path).show_all);
    }

    #[test]
    fn configured_sort_beats_saved_sort() {
        let (mut app, _rx) = test_app();
        app.candidates.sort = SortKey::Deviation;
        apply(
            &mut app,
            PersistedState {
                sort: Some(SortKey::Score),
                ..PersistedState::default()
            },
        );
        assert_eq!(app.candidates.sort, SortKey::Deviation);
    }
}
