//! Cross-process reference counting through a shared lock record.
//!
//! Every mutation is one read-modify-write performed while holding an OS
//! exclusive lock on the record file itself (`flock` on Unix, `LockFileEx`
//! on Windows). Readers take a shared lock. Two launches racing on an
//! empty record therefore always end at `count == 2`.

use crate::{LOCK_FILENAME, LockRecord, SERVER_LOG_EXTENSION, SupervisorError, SupervisorResult};

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

#[cfg(unix)]
const LOCK_FILE_MODE: u32 = 0o600; // Owner read/write only

/// Result of [`LockFileCoordinator::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquisition {
    /// Reference count after this acquisition.
    pub count: u32,
    /// Whether a live server was already recorded. Exactly one of any
    /// number of concurrent acquirers on a non-running record sees `false`.
    pub was_running: bool,
}

/// Result of [`LockFileCoordinator::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    /// Reference count after this release, floored at zero.
    pub remaining: u32,
    /// Server pid recorded before the release.
    pub server_pid: Option<u32>,
}

/// Shared lock record at a path every cooperating process agrees on.
#[derive(Debug, Clone)]
pub struct LockFileCoordinator {
    path: PathBuf,
}

impl LockFileCoordinator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<temp_dir>/youhost-server-lock.json`
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(LOCK_FILENAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File the spawned server writes its stdout and stderr to, next to the
    /// record (`youhost-server-lock.log` for the default record).
    pub fn server_log_path(&self) -> PathBuf {
        self.path.with_extension(SERVER_LOG_EXTENSION)
    }

    /// Read the record under a shared lock.
    ///
    /// Returns `Ok(None)` if the record does not exist yet.
    pub fn read(&self) -> SupervisorResult<Option<LockRecord>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SupervisorError::lock_io(self.path.clone(), e)),
        };

        FileExt::lock_shared(&file).map_err(|e| SupervisorError::lock_io(self.path.clone(), e))?;
        let contents = Self::read_contents(&mut file);
        let _ = FileExt::unlock(&file);

        let contents = contents.map_err(|e| SupervisorError::lock_io(self.path.clone(), e))?;
        if contents.trim_ascii().is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(|e| SupervisorError::lock_io(self.path.clone(), e.into()))
    }

    /// Whether a live server is recorded. Absent or unreadable records count
    /// as not running.
    pub fn is_running(&self) -> bool {
        match self.read() {
            Ok(Some(record)) => record.is_live(),
            Ok(None) => false,
            Err(e) => {
                debug!("Treating unreadable lock record as not running: {e}");
                false
            }
        }
    }

    /// Take one reference, marking the server as running.
    ///
    /// The caller that gets `was_running == false` is responsible for
    /// spawning the server.
    pub fn acquire(&self) -> SupervisorResult<Acquisition> {
        self.transact(|record| {
            let was_running = record.is_live();
            if record.is_stale() {
                warn!(
                    "Lock record names dead server process {:?}, treating it as stopped",
                    record.pid
                );
            }
            if !was_running {
                record.pid = None;
                record.spawning_since = Some(chrono::Utc::now().to_rfc3339());
            }

            record.running = true;
            record.count = record.count.saturating_add(1);

            Acquisition {
                count: record.count,
                was_running,
            }
        })
    }

    /// Drop one reference. The count never goes below zero, and `running`
    /// is never turned back on by a release.
    pub fn release(&self) -> SupervisorResult<Release> {
        self.transact(|record| {
            let server_pid = record.pid;

            if record.count == 0 {
                warn!("Release with reference count already at zero");
            }
            record.count = record.count.saturating_sub(1);
            record.running = record.running && record.count > 0;
            if record.count == 0 {
                record.pid = None;
                record.spawning_since = None;
            }

            Release {
                remaining: record.count,
                server_pid,
            }
        })
    }

    /// Record the pid of the freshly spawned server.
    pub fn record_pid(&self, pid: u32) -> SupervisorResult<()> {
        self.transact(|record| {
            record.pid = Some(pid);
            record.spawning_since = None;
        })
    }

    /// Force `running = false` after the server died, leaving the count as is.
    ///
    /// With `Some(pid)` this only applies if the record still names that
    /// pid, so a late notification cannot clobber a newer server. Returns
    /// whether the record changed.
    pub fn mark_stopped(&self, pid: Option<u32>) -> SupervisorResult<bool> {
        self.transact(|record| {
            if pid.is_some() && record.pid != pid {
                return false;
            }
            record.running = false;
            record.pid = None;
            record.spawning_since = None;
            true
        })
    }

    /// Undo an acquisition whose spawn failed: drop the reference and
    /// clear the running flag so the next starter can try again.
    pub fn abandon(&self) -> SupervisorResult<u32> {
        self.transact(|record| {
            record.count = record.count.saturating_sub(1);
            record.running = false;
            record.pid = None;
            record.spawning_since = None;
            record.count
        })
    }

    /// Rewrite the record as `{running: false, count: 0}`.
    pub fn reset(&self) -> SupervisorResult<()> {
        self.transact(|record| *record = LockRecord::default())
    }

    /// Run one serialized read-modify-write cycle on the record.
    fn transact<T>(&self, mutate: impl FnOnce(&mut LockRecord) -> T) -> SupervisorResult<T> {
        let mut file = self.open_for_update()?;

        FileExt::lock_exclusive(&file)
            .map_err(|e| SupervisorError::lock_io(self.path.clone(), e))?;

        let result = self.update_locked(&mut file, mutate);

        // Closing the handle releases the lock as well.
        let _ = FileExt::unlock(&file);

        result
    }

    fn update_locked<T>(
        &self,
        file: &mut File,
        mutate: impl FnOnce(&mut LockRecord) -> T,
    ) -> SupervisorResult<T> {
        let contents =
            Self::read_contents(file).map_err(|e| SupervisorError::lock_io(self.path.clone(), e))?;

        let mut record = if contents.trim_ascii().is_empty() {
            LockRecord::default()
        } else {
            serde_json::from_slice(&contents).unwrap_or_else(|e| {
                warn!(
                    "Corrupt lock record at {}, reinitializing: {e}",
                    self.path.display()
                );
                LockRecord::default()
            })
        };

        let output = mutate(&mut record);
        record.updated_at = Some(chrono::Utc::now().to_rfc3339());

        let bytes = serde_json::to_vec(&record)
            .map_err(|e| SupervisorError::lock_io(self.path.clone(), e.into()))?;

        file.set_len(0)
            .and_then(|()| file.seek(SeekFrom::Start(0)))
            .and_then(|_| file.write_all(&bytes))
            .and_then(|()| file.sync_all())
            .map_err(|e| SupervisorError::lock_io(self.path.clone(), e))?;

        debug!(
            running = record.running,
            count = record.count,
            "Lock record updated"
        );

        Ok(output)
    }

    fn open_for_update(&self) -> SupervisorResult<File> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            std::fs::create_dir_all(dir).map_err(|e| SupervisorError::lock_io(dir.into(), e))?;
        }

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(false);

        #[cfg(unix)]
        options.mode(LOCK_FILE_MODE);

        options
            .open(&self.path)
            .map_err(|e| SupervisorError::lock_io(self.path.clone(), e))
    }

    fn read_contents(file: &mut File) -> std::io::Result<Vec<u8>> {
        let mut contents = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }
}
