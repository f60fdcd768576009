use anyhow::{Context, Result};
use base64::Engine;
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
        mpsc::{self, Receiver, Sender},
    },
    time::{Duration, Instant},
};

/// Process-unique job handle. Titles are display data; two jobs with the same
/// title never collide in the registry.
pub type JobId = u64;

/// How long terminal entries stay visible to pollers before [`JobTracker::list`]
/// prunes them.
const RETAIN_TERMINAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Starting,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Read-only projection of a job's state. Taking a snapshot never affects the
/// job itself.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub id: JobId,
    pub name: String,
    pub total_count: usize,
    pub current_index: usize,
    pub encrypted: bool,
    pub current_url: String,
    pub status: JobStatus,
    /// Base64 of the title, a filesystem/DOM-safe handle for front ends.
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    finished_at: Option<Instant>,
}

impl ProgressSnapshot {
    fn new(id: JobId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            total_count: 0,
            current_index: 0,
            encrypted: false,
            current_url: String::new(),
            status: JobStatus::Starting,
            tag: base64::engine::general_purpose::STANDARD.encode(name),
            error: None,
            finished_at: None,
        }
    }
}

/// Registry of live downloads. Every worker writes its own job's entry and
/// any number of pollers read snapshots concurrently; the map lock is held
/// only for the duration of a single insert or copy, so tracker contention
/// never blocks a worker's network i/o.
#[derive(Default)]
pub struct JobTracker {
    next_id: AtomicU64,
    jobs: Mutex<HashMap<JobId, ProgressSnapshot>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> JobId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Inserts a zero-progress entry as soon as the segment count is known,
    /// so a poll issued right after submission observes the job.
    pub fn publish_start(&self, id: JobId, title: &str, total_count: usize, encrypted: bool) {
        let mut snapshot = ProgressSnapshot::new(id, title);
        snapshot.total_count = total_count;
        snapshot.encrypted = encrypted;
        self.jobs.lock().unwrap().insert(id, snapshot);
    }

    /// Called once per completed segment. Observed `current_index` values are
    /// monotonically non-decreasing because each job has exactly one writer.
    pub fn publish_progress(&self, id: JobId, current_index: usize, current_url: &str) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&id) {
            job.current_index = current_index;
            job.current_url = current_url.to_owned();
            job.status = JobStatus::Running;
        }
    }

    pub fn publish_completed(&self, id: JobId) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&id) {
            job.status = JobStatus::Completed;
            job.finished_at = Some(Instant::now());
        }
    }

    /// Records a terminal failure. Jobs that die before `publish_start` (for
    /// example while resolving the playlist) still get an entry, named after
    /// `name`, so pollers can tell failure from absence.
    pub fn publish_failed(&self, id: JobId, name: &str, reason: &str) {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.entry(id).or_insert_with(|| ProgressSnapshot::new(id, name));
        job.status = JobStatus::Failed;
        job.error = Some(reason.to_owned());
        job.finished_at = Some(Instant::now());
    }

    pub fn get(&self, id: JobId) -> Option<ProgressSnapshot> {
        self.jobs.lock().unwrap().get(&id).cloned()
    }

    /// Drops terminal entries older than `max_age`. [`JobTracker::list`] calls
    /// this with the default retain window, so a poller always gets at least
    /// one look at a job's final status before it disappears.
    pub fn prune_settled(&self, max_age: Duration) {
        self.jobs.lock().unwrap().retain(|_, job| match job.finished_at {
            Some(at) => at.elapsed() < max_age,
            None => true,
        });
    }

    /// Stable snapshot of all live entries, sorted by title then id.
    pub fn list(&self) -> Vec<ProgressSnapshot> {
        self.prune_settled(RETAIN_TERMINAL);

        let mut snapshots = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect::<Vec<_>>();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        snapshots
    }
}

/// One-shot rendezvous between a submitter and its job's worker: the worker
/// publishes the resolved title exactly once and the submitter blocks on
/// [`TitlePromise::wait`] until it lands. Resolution happens right after
/// playlist extraction, long before the download finishes.
pub fn title_rendezvous() -> (TitleSender, TitlePromise) {
    let (tx, rx) = mpsc::channel();
    (TitleSender(tx), TitlePromise(rx))
}

pub struct TitleSender(Sender<String>);

impl TitleSender {
    /// Never blocks; a dropped promise is not an error, the download proceeds
    /// whether or not anyone is waiting.
    pub fn send(self, title: &str) {
        let _ = self.0.send(title.to_owned());
    }
}

pub struct TitlePromise(Receiver<String>);

impl TitlePromise {
    /// Blocks until the worker has resolved the title, erroring if the worker
    /// exited first.
    pub fn wait(self) -> Result<String> {
        self.0.recv().context("worker exited before resolving a title")
    }
}
