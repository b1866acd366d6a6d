//! Optional persistent tier.
//!
//! [`PersistentBackend`] is the seam for anything slower than memory. The
//! bundled [`DirectoryBackend`] keeps one JSON record per key in a
//! directory. Every backend call made by the tiered cache goes through a
//! [`TimeoutBackend`], which hands the call to a single worker thread and
//! stops waiting after a fixed limit, so a slow or hung backend never
//! stalls a lookup for longer than that.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::key::CacheKey;

pub trait PersistentBackend: Send + Sync {
    fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    fn store(&self, entry: &CacheEntry) -> Result<(), CacheError>;

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError>;

    /// Remove all records, or only those of one operation. Returns the count.
    fn clear(&self, operation: Option<&str>) -> Result<usize, CacheError>;

    fn len(&self) -> Result<usize, CacheError>;
}

// ---------------------------------------------------------------------------
// Directory backend
// ---------------------------------------------------------------------------

/// On-disk form of a [`CacheEntry`].
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    operation: String,
    digest: String,
    /// Hex-encoded value bytes.
    value: String,
    created_at_us: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ttl_us: Option<u64>,
}

impl Record {
    fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            operation: entry.key.operation().to_owned(),
            digest: entry.key.digest().to_owned(),
            value: hex::encode(&entry.value),
            created_at_us: entry.created_at.as_micros() as u64,
            ttl_us: entry.ttl.map(|t| t.as_micros() as u64),
        }
    }

    fn into_entry(self) -> Result<CacheEntry, CacheError> {
        let bytes = hex::decode(&self.value)
            .map_err(|e| CacheError::Unavailable(format!("corrupt record value: {e}")))?;
        let created_at = Duration::from_micros(self.created_at_us);
        Ok(CacheEntry {
            key: CacheKey::from_parts(self.operation, self.digest),
            value: Arc::from(bytes),
            created_at,
            ttl: self.ttl_us.map(Duration::from_micros),
            access_count: 0,
            last_accessed: created_at,
        })
    }
}

/// One `<digest>.json` file per key under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {
    /// Open (creating if needed) a cache directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, digest: &str) -> PathBuf {
        self.root.join(format!("{digest}.json"))
    }

    fn record_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut paths = Vec::new();
        for dirent in fs::read_dir(&self.root)? {
            let path = dirent?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

impl PersistentBackend for DirectoryBackend {
    fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let text = match fs::read_to_string(self.path_for(key.digest())) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: Record = serde_json::from_str(&text)?;
        if record.operation != key.operation() {
            return Ok(None);
        }
        record.into_entry().map(Some)
    }

    fn store(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let json = serde_json::to_vec(&Record::from_entry(entry))?;
        let path = self.path_for(entry.key.digest());
        // Write-then-rename so readers never see a half-written record.
        let tmp = path.with_extension("json.tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(&json)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        match fs::remove_file(self.path_for(key.digest())) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self, operation: Option<&str>) -> Result<usize, CacheError> {
        let mut removed = 0;
        for path in self.record_paths()? {
            if let Some(op) = operation {
                let text = fs::read_to_string(&path)?;
                let record: Record = serde_json::from_str(&text)?;
                if record.operation != op {
                    continue;
                }
            }
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }

    fn len(&self) -> Result<usize, CacheError> {
        Ok(self.record_paths()?.len())
    }
}

// ---------------------------------------------------------------------------
// Timeout guard
// ---------------------------------------------------------------------------

/// Pending calls the worker may hold before callers are turned away.
const QUEUE_DEPTH: usize = 64;

type Job = Box<dyn FnOnce(&dyn PersistentBackend) + Send>;

/// Runs backend calls one at a time on a dedicated worker thread and waits
/// at most `timeout` for each.
///
/// Once the worker has been stuck on a single call for longer than
/// `timeout`, further calls fail at once instead of queueing behind it.
/// A queued call whose caller already gave up is skipped by the worker.
#[derive(Clone)]
pub struct TimeoutBackend {
    jobs: Sender<Job>,
    busy_since: Arc<Mutex<Option<Instant>>>,
    timeout: Duration,
}

impl TimeoutBackend {
    /// Start the worker thread for `inner`.
    pub fn new(inner: Arc<dyn PersistentBackend>, timeout: Duration) -> Result<Self, CacheError> {
        let (jobs, queue) = crossbeam_channel::bounded::<Job>(QUEUE_DEPTH);
        let busy_since = Arc::new(Mutex::new(None));
        let worker_busy = Arc::clone(&busy_since);
        std::thread::Builder::new()
            .name("kairos-cache-io".into())
            .spawn(move || run_worker(inner.as_ref(), &queue, &worker_busy))?;
        Ok(Self {
            jobs,
            busy_since,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timed_out(&self) -> CacheError {
        CacheError::Timeout {
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }

    fn call<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn PersistentBackend) -> Result<T, CacheError> + Send + 'static,
    {
        if let Some(started) = *self.busy_since.lock()
            && started.elapsed() > self.timeout
        {
            return Err(self.timed_out());
        }
        let given_up_at = Instant::now() + self.timeout;
        let (tx, rx) = crossbeam_channel::bounded(1);
        let job: Job = Box::new(move |backend| {
            if Instant::now() >= given_up_at {
                return;
            }
            // The receiver may have given up; nothing to do then.
            let _ = tx.send(f(backend));
        });
        match self.jobs.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => return Err(self.timed_out()),
            Err(TrySendError::Disconnected(_)) => {
                return Err(CacheError::Unavailable(
                    "persistent backend worker stopped".into(),
                ));
            }
        }
        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out()),
            Err(RecvTimeoutError::Disconnected) => Err(CacheError::Unavailable(
                "persistent backend call panicked".into(),
            )),
        }
    }

    pub fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let key = key.clone();
        self.call(move |b| b.load(&key))
    }

    pub fn store(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let entry = entry.clone();
        self.call(move |b| b.store(&entry))
    }

    pub fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        let key = key.clone();
        self.call(move |b| b.remove(&key))
    }

    pub fn clear(&self, operation: Option<&str>) -> Result<usize, CacheError> {
        let operation = operation.map(str::to_owned);
        self.call(move |b| b.clear(operation.as_deref()))
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        self.call(|b| b.len())
    }
}

/// Drain `queue` until every [`TimeoutBackend`] handle is dropped.
fn run_worker(
    backend: &dyn PersistentBackend,
    queue: &Receiver<Job>,
    busy_since: &Mutex<Option<Instant>>,
) {
    for job in queue.iter() {
        *busy_since.lock() = Some(Instant::now());
        // A panicking backend drops the reply sender, which the caller
        // reports; the worker keeps serving.
        let _ = panic::catch_unwind(AssertUnwindSafe(|| job(backend)));
        *busy_since.lock() = None;
    }
}
