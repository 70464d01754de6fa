//! Everything a command or the interactive view needs, opened from one data directory.

use std::path::{Path, PathBuf};

use crate::category::CategoryStore;
use crate::config::Config;
use crate::db::TaskStore;
use crate::fields::ThemeMode;
use crate::storage::DirStore;
use crate::theme;

pub struct Session {
    pub dir: PathBuf,
    pub config: Config,
    pub tasks: TaskStore<DirStore>,
    pub categories: CategoryStore<DirStore>,
    prefs: DirStore,
}

impl Session {
    pub fn open(dir: &Path) -> Self {
        let config = Config::load_from_dir(dir);
        tracing::debug!(dir = %dir.display(), ?config, "opening session");
        let tasks = TaskStore::load(DirStore::new(dir)).with_due_date_required(config.require_due_date);
        let categories = CategoryStore::load(DirStore::new(dir));
        Session {
            dir: dir.to_path_buf(),
            config,
            tasks,
            categories,
            prefs: DirStore::new(dir),
        }
    }

    pub fn theme(&self) -> ThemeMode {
        theme::load(&self.prefs)
    }

    pub fn set_theme(&mut self, mode: ThemeMode) {
        theme::save(&mut self.prefs, mode);
    }
}
