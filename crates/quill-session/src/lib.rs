pub mod guard;
pub mod migrations;
pub mod queries;
pub mod routes;

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

use quill_types::models::{Theme, User};

pub use guard::{Guard, Navigation, navigate};
pub use routes::{Route, WorkspaceView};

pub const USER_KEY: &str = "user";
pub const THEME_KEY: &str = "theme";

/// Typed access to the persisted session. Guards and workflows only go
/// through this trait, never through the storage underneath.
pub trait Session: Send + Sync {
    /// The stored user record. Missing or malformed records read as `None`.
    fn user(&self) -> Option<User>;

    /// Overwrite the stored user record wholesale.
    fn replace_user(&self, user: &User) -> Result<()>;

    /// Remove every persisted session entry.
    fn clear(&self) -> Result<()>;

    fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    fn is_onboarded(&self) -> bool {
        self.user().is_some_and(|user| user.is_onboarded)
    }
}

/// Client-local key/value store backed by SQLite.
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrations::run(&conn)?;

        info!("Session store opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Session store lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Stored theme preference, light when unset or unreadable.
    pub fn theme(&self) -> Theme {
        match self.get_value(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                warn!("Ignoring stored theme: {}", e);
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!("Failed to read theme: {}", e);
                Theme::default()
            }
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.put_value(THEME_KEY, theme.as_str())
    }
}

impl Session for SessionStore {
    fn user(&self) -> Option<User> {
        let raw = match self.get_value(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read session record: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Discarding malformed session record: {}", e);
                None
            }
        }
    }

    fn replace_user(&self, user: &User) -> Result<()> {
        let raw = serde_json::to_string(user)?;
        self.put_value(USER_KEY, &raw)
    }

    fn clear(&self) -> Result<()> {
        let removed = self.clear_all()?;
        info!("Session cleared ({} entries)", removed);
        Ok(())
    }
}
