//! Durable JSON ledger
//!
//! The whole ledger is rewritten with a temp-file and rename, so a crash
//! leaves either the old or the new file. Each operation holds an exclusive
//! advisory lock on a sibling `.lock` file and reloads the ledger under it,
//! so several processes can share one ledger without losing attempts.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lockout::{PinAttempt, PinLockout};
use crate::store::PinAttemptStore;
use crate::{PinError, Result};

/// Ledger file format version
const LEDGER_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    #[serde(default)]
    attempts: BTreeMap<String, Vec<PinAttempt>>,
    #[serde(default)]
    lockouts: BTreeMap<String, PinLockout>,
}

impl LedgerFile {
    fn empty() -> Self {
        Self {
            version: LEDGER_VERSION,
            ..Default::default()
        }
    }

    fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::empty());
        }

        let contents = fs::read_to_string(path)?;
        let ledger: Self = serde_json::from_str(&contents)?;
        if ledger.version != LEDGER_VERSION {
            return Err(PinError::Store(format!(
                "unsupported ledger version {} in {}",
                ledger.version,
                path.display()
            )));
        }
        Ok(ledger)
    }
}

/// Attempt store persisted to a JSON file
///
/// Outside a `begin`/`commit` bracket, reads see the state as of the last
/// load and each write locks, reloads, applies and saves on its own.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    ledger: LedgerFile,
    lock: Option<File>,
    dirty: bool,
}

impl JsonFileStore {
    /// Open the ledger at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let ledger = LedgerFile::read(&path)?;
        debug!(path = %path.display(), users = ledger.attempts.len(), "opened ledger");

        Ok(Self {
            path,
            ledger,
            lock: None,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file carrying the advisory lock
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    fn acquire_lock(&self) -> Result<File> {
        let mut options = OpenOptions::new();
        options.create(true).read(true).write(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(self.lock_path())?;

        fs2::FileExt::lock_exclusive(&file).map_err(|e| {
            PinError::Store(format!(
                "cannot lock ledger {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(file)
    }

    /// Apply a change inside the current bracket, or in one of its own
    fn mutate(&mut self, change: impl FnOnce(&mut LedgerFile) -> bool) -> Result<()> {
        if self.lock.is_some() {
            self.dirty |= change(&mut self.ledger);
            return Ok(());
        }

        self.begin()?;
        self.dirty |= change(&mut self.ledger);
        self.commit()
    }

    fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.ledger)?;
        let temp_path = self.path.with_extension("json.tmp");

        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&temp_path)?;

        // mode() only applies on creation; tighten a leftover temp file too
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl PinAttemptStore for JsonFileStore {
    fn begin(&mut self) -> Result<()> {
        let lock = self.acquire_lock()?;
        match LedgerFile::read(&self.path) {
            Ok(ledger) => {
                self.ledger = ledger;
                self.lock = Some(lock);
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                let _ = fs2::FileExt::unlock(&lock);
                Err(e)
            }
        }
    }

    fn commit(&mut self) -> Result<()> {
        let saved = if self.dirty { self.save() } else { Ok(()) };
        self.dirty = false;

        if let Some(lock) = self.lock.take() {
            fs2::FileExt::unlock(&lock)?;
        }
        saved
    }

    fn rollback(&mut self) {
        self.dirty = false;
        if let Some(lock) = self.lock.take() {
            let _ = fs2::FileExt::unlock(&lock);
        }
    }

    fn attempts(&self, user_id: &str) -> Result<Vec<PinAttempt>> {
        Ok(self.ledger.attempts.get(user_id).cloned().unwrap_or_default())
    }

    fn put_attempts(&mut self, user_id: &str, attempts: Vec<PinAttempt>) -> Result<()> {
        self.mutate(|ledger| {
            if attempts.is_empty() {
                ledger.attempts.remove(user_id).is_some()
            } else {
                ledger.attempts.insert(user_id.to_string(), attempts);
                true
            }
        })
    }

    fn delete_attempts(&mut self, user_id: &str) -> Result<()> {
        self.mutate(|ledger| ledger.attempts.remove(user_id).is_some())
    }

    fn lockout(&self, user_id: &str) -> Result<Option<PinLockout>> {
        Ok(self.ledger.lockouts.get(user_id).cloned())
    }

    fn put_lockout(&mut self, lockout: PinLockout) -> Result<()> {
        self.mutate(|ledger| {
            ledger.lockouts.insert(lockout.user_id.clone(), lockout);
            true
        })
    }

    fn delete_lockout(&mut self, user_id: &str) -> Result<()> {
        self.mutate(|ledger| ledger.lockouts.remove(user_id).is_some())
    }

    fn users(&self) -> Result<Vec<String>> {
        let users: BTreeSet<&String> = self
            .ledger
            .attempts
            .keys()
            .chain(self.ledger.lockouts.keys())
            .collect();
        Ok(users.into_iter().cloned().collect())
    }
}
