//! `SessionManager`: file-per-session persistence under `sessions_dir`.

use std::path::{Path, PathBuf};

use crate::error::{SessionError, SessionResult};
use crate::types::{validate_session_id, Session};

/// Manages session persistence as one JSON file per session under
/// `sessions_dir/<id>.json`. Every path derived from a session id is
/// validated first (spec.md §4.15), so a caller-supplied id can never
/// escape the directory.
pub struct SessionManager {
    sessions_dir: PathBuf,
}

impl SessionManager {
    /// Create a manager rooted at `sessions_dir`. The directory is created
    /// lazily, on first write.
    #[must_use]
    pub fn new(sessions_dir: PathBuf) -> Self {
        Self { sessions_dir }
    }

    fn ensure_dir(&self) -> SessionResult<()> {
        std::fs::create_dir_all(&self.sessions_dir).map_err(|source| SessionError::Io {
            id: String::new(),
            source,
        })
    }

    fn session_path(&self, session_id: &str) -> SessionResult<PathBuf> {
        let validated = validate_session_id(session_id)?;
        Ok(self.sessions_dir.join(format!("{validated}.json")))
    }

    /// Whether a session file exists for `session_id`. An invalid id is
    /// simply reported as not existing, rather than erroring.
    #[must_use]
    pub fn exists(&self, session_id: &str) -> bool {
        self.session_path(session_id)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Save `session` to `<sessions_dir>/<id>.json`, creating the
    /// directory if needed.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidId`], [`SessionError::Io`], or
    /// [`SessionError::Serialize`].
    pub fn save(&self, session: &Session) -> SessionResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.session_path(&session.id)?;
        let body = serde_json::to_string_pretty(session).map_err(|source| SessionError::Serialize {
            id: session.id.clone(),
            source,
        })?;
        std::fs::write(&path, body).map_err(|source| SessionError::Io {
            id: session.id.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Load a session by id. A missing or corrupt file both return
    /// `Ok(None)`.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidId`] for a malformed id.
    pub fn load(&self, session_id: &str) -> SessionResult<Option<Session>> {
        let path = self.session_path(session_id)?;
        if !path.is_file() {
            return Ok(None);
        }
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&text).ok())
    }

    /// Delete a session's file. Returns whether a file was actually
    /// removed.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidId`] or [`SessionError::Io`].
    pub fn delete(&self, session_id: &str) -> SessionResult<bool> {
        let path = self.session_path(session_id)?;
        if !path.is_file() {
            return Ok(false);
        }
        std::fs::remove_file(&path).map_err(|source| SessionError::Io {
            id: session_id.to_string(),
            source,
        })?;
        Ok(true)
    }

    /// List every parseable session, sorted by `updated_at` descending.
    /// Unparseable files are silently skipped.
    ///
    /// # Errors
    /// Returns [`SessionError::Io`] if the sessions directory can't be
    /// read.
    pub fn list_sessions(&self) -> SessionResult<Vec<Session>> {
        self.ensure_dir()?;
        let entries = std::fs::read_dir(&self.sessions_dir).map_err(|source| SessionError::Io {
            id: String::new(),
            source,
        })?;

        let mut sessions = Vec::new();
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().and_then(std::ffi::OsStr::to_str) != Some("json") {
                continue;
            }
            if let Ok(text) = std::fs::read_to_string(&path) {
                if let Ok(session) = serde_json::from_str::<Session>(&text) {
                    sessions.push(session);
                }
            }
        }

        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    /// Rename a session: load under `old_id`, re-id it, save under
    /// `new_id`, then delete the old file. Atomic in the sense that the
    /// new file exists before the old one is removed — a crash between
    /// the two leaves both present rather than losing the session.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if `old_id` has no session,
    /// [`SessionError::AlreadyExists`] if `new_id` is already taken, or
    /// the usual id/IO/serialize errors.
    pub fn rename(&self, old_id: &str, new_id: &str) -> SessionResult<()> {
        validate_session_id(new_id)?;
        if self.exists(new_id) {
            return Err(SessionError::AlreadyExists(new_id.to_string()));
        }
        let mut session = self
            .load(old_id)?
            .ok_or_else(|| SessionError::NotFound(old_id.to_string()))?;

        session.id = new_id.to_string();
        session.updated_at = chrono::Utc::now();
        self.save(&session)?;
        self.delete(old_id)?;
        Ok(())
    }

    /// Load `session_id` if given and it exists, otherwise create a fresh
    /// session with the given `cwd`/`model`/`provider`.
    #[must_use]
    pub fn get_or_create(
        &self,
        session_id: Option<&str>,
        cwd: &str,
        model: &str,
        provider: &str,
    ) -> Session {
        if let Some(id) = session_id {
            if let Ok(Some(session)) = self.load(id) {
                return session;
            }
        }
        Session::create(cwd, model, provider)
    }

    /// The sessions directory this manager is rooted at.
    #[must_use]
    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (tempfile::TempDir, SessionManager) {
        let dir = tempfile::tempdir().unwrap();
        let mgr = SessionManager::new(dir.path().join("sessions"));
        (dir, mgr)
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, mgr) = manager();
        let session = Session::create("/work", "gpt-oss-120b", "openrouter");
        mgr.save(&session).unwrap();
        let loaded = mgr.load(&session.id).unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.model, session.model);
    }

    #[test]
    fn load_missing_session_returns_none() {
        let (_dir, mgr) = manager();
        assert!(mgr.load("abcdefgh").unwrap().is_none());
    }

    #[test]
    fn load_rejects_path_traversal_id() {
        let (_dir, mgr) = manager();
        let err = mgr.load("../../etc/passwd").unwrap_err();
        assert!(matches!(err, SessionError::InvalidId(_)));
    }

    #[test]
    fn corrupt_session_file_loads_as_none() {
        let (_dir, mgr) = manager();
        std::fs::create_dir_all(mgr.sessions_dir()).unwrap();
        std::fs::write(mgr.sessions_dir().join("broken12.json"), "{not valid json").unwrap();
        assert!(mgr.load("broken12").unwrap().is_none());
    }

    #[test]
    fn delete_removes_existing_session() {
        let (_dir, mgr) = manager();
        let session = Session::create("/work", "m", "p");
        mgr.save(&session).unwrap();
        assert!(mgr.delete(&session.id).unwrap());
        assert!(!mgr.exists(&session.id));
        assert!(!mgr.delete(&session.id).unwrap());
    }

    #[test]
    fn list_sessions_sorts_by_updated_at_descending_and_skips_corrupt() {
        let (_dir, mgr) = manager();
        let mut older = Session::create("/work", "m", "p");
        older.updated_at = chrono::Utc::now() - chrono::Duration::hours(2);
        let newer = Session::create("/work", "m", "p");
        mgr.save(&older).unwrap();
        mgr.save(&newer).unwrap();
        std::fs::write(mgr.sessions_dir().join("zzcorrupt.json"), "nope").unwrap();

        let listed = mgr.list_sessions().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[test]
    fn rename_moves_session_to_new_id_and_removes_old() {
        let (_dir, mgr) = manager();
        let session = Session::create("/work", "m", "p");
        let old_id = session.id.clone();
        mgr.save(&session).unwrap();

        mgr.rename(&old_id, "renamed-session").unwrap();
        assert!(!mgr.exists(&old_id));
        let renamed = mgr.load("renamed-session").unwrap().unwrap();
        assert_eq!(renamed.id, "renamed-session");
    }

    #[test]
    fn rename_fails_when_new_id_already_taken() {
        let (_dir, mgr) = manager();
        let a = Session::create("/work", "m", "p");
        let b = Session::create("/work", "m", "p");
        mgr.save(&a).unwrap();
        mgr.save(&b).unwrap();

        let err = mgr.rename(&a.id, &b.id).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyExists(_)));
    }

    #[test]
    fn rename_fails_when_old_id_missing() {
        let (_dir, mgr) = manager();
        let err = mgr.rename("nosuchid", "newid").unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[test]
    fn get_or_create_loads_existing_or_creates_fresh() {
        let (_dir, mgr) = manager();
        let session = Session::create("/work", "m", "p");
        mgr.save(&session).unwrap();

        let loaded = mgr.get_or_create(Some(&session.id), "/other", "m2", "p2");
        assert_eq!(loaded.id, session.id);

        let created = mgr.get_or_create(None, "/other", "m2", "p2");
        assert_ne!(created.id, session.id);
        assert_eq!(created.model, "m2");
    }
}
