//! Conversion task management.
//!
//! [`ConversionManager`] owns the task registry. Requests are validated and
//! registered synchronously; the actual conversion runs on a spawned tokio
//! task so callers get an id back immediately and poll for the outcome.
//!
//! The registry lock is never held across an await: each transition takes
//! the write lock, mutates one record, and releases it before the codec tool
//! runs.

use super::executor::Transcoder;
use super::library::MediaLibrary;
use super::task::{ConversionTask, TaskEvent, TaskState};
use mediaforge_common::{Error, MediaKind, Result, TaskId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, error, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Engine that accepts, runs, and tracks conversion tasks.
///
/// Cloning is cheap and every clone shares the same registry.
#[derive(Clone)]
pub struct ConversionManager {
    tasks: Arc<RwLock<HashMap<TaskId, ConversionTask>>>,
    library: Arc<MediaLibrary>,
    transcoder: Arc<dyn Transcoder>,
    limiter: Option<Arc<Semaphore>>,
    event_tx: broadcast::Sender<TaskEvent>,
}

impl ConversionManager {
    /// Create a new conversion manager with no concurrency cap.
    pub fn new(library: MediaLibrary, transcoder: Arc<dyn Transcoder>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            library: Arc::new(library),
            transcoder,
            limiter: None,
            event_tx,
        }
    }

    /// Allow at most `limit` conversions to run the codec tool at once.
    ///
    /// Waiting tasks stay in `preparing`; `start_conversion` never blocks.
    pub fn with_max_concurrent(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit.map(|n| Arc::new(Semaphore::new(n.max(1))));
        self
    }

    pub fn library(&self) -> &MediaLibrary {
        &self.library
    }

    /// Receive a [`TaskEvent`] for every committed state, creation included.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.event_tx.subscribe()
    }

    /// Start converting `filename` from the `kind` library into `format`.
    ///
    /// Returns as soon as the source is checked and the task is registered;
    /// the conversion itself runs on a background tokio task.
    ///
    /// # Errors
    ///
    /// * [`Error::NotFound`] if the source file does not exist
    /// * [`Error::InvalidInput`] for unsafe file names or format tokens
    ///
    /// No task is created when an error is returned.
    pub async fn start_conversion(
        &self,
        filename: &str,
        format: &str,
        kind: MediaKind,
    ) -> Result<TaskId> {
        let input = self.library.source_path(kind, filename).await?;
        let output = self.library.output_path(&input, format)?;

        let task = ConversionTask::new(kind, filename.to_string(), format.to_string());
        let task_id = task.id;

        self.tasks.write().insert(task_id, task);
        self.publish(task_id, TaskState::Preparing);

        info!(
            task_id = %task_id,
            kind = %kind,
            source = %filename,
            format = %format,
            "Conversion task created"
        );

        let manager = self.clone();
        tokio::spawn(async move {
            manager.run_task(task_id, input, output).await;
        });

        Ok(task_id)
    }

    /// Snapshot of a single task.
    pub fn get_task(&self, task_id: TaskId) -> Result<ConversionTask> {
        self.tasks
            .read()
            .get(&task_id)
            .cloned()
            .ok_or_else(|| Error::not_found("task", task_id))
    }

    /// Snapshot of every task.
    pub fn list_tasks(&self) -> HashMap<TaskId, ConversionTask> {
        self.tasks.read().clone()
    }

    /// Background execution unit for one task.
    ///
    /// Always leaves the task in a terminal state, including when the
    /// transcoder panics.
    async fn run_task(&self, task_id: TaskId, input: PathBuf, output: PathBuf) {
        let _permit = match &self.limiter {
            Some(limiter) => match Arc::clone(limiter).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(e) => {
                    self.commit(task_id, |t| {
                        t.begin_processing()?;
                        t.fail(format!("Internal error: {e}"))
                    });
                    return;
                }
            },
            None => None,
        };

        if !self.commit(task_id, |t| t.begin_processing()) {
            return;
        }
        debug!(task_id = %task_id, input = %input.display(), "Conversion processing");

        let transcoder = Arc::clone(&self.transcoder);
        let (job_input, job_output) = (input.clone(), output.clone());
        let work = tokio::spawn(async move { transcoder.transcode(&job_input, &job_output).await });

        let outcome = match work.await {
            Ok(result) => result,
            Err(join_err) => Err(Error::internal(format!(
                "conversion worker aborted: {join_err}"
            ))),
        };

        match outcome {
            Ok(()) => {
                if self.commit(task_id, |t| t.complete(output.clone())) {
                    info!(task_id = %task_id, output = %output.display(), "Conversion completed");
                }
            }
            Err(e) => {
                let detail = e.to_string();
                error!(task_id = %task_id, error = %detail, "Conversion failed");
                self.commit(task_id, |t| t.fail(detail));
            }
        }
    }

    /// Apply one transition under the write lock and publish it.
    ///
    /// Returns `false` (and changes nothing) if the task is gone or the
    /// transition is illegal.
    fn commit<F>(&self, task_id: TaskId, apply: F) -> bool
    where
        F: FnOnce(&mut ConversionTask) -> std::result::Result<(), super::task::IllegalTransition>,
    {
        let state = {
            let mut tasks = self.tasks.write();
            let Some(task) = tasks.get_mut(&task_id) else {
                warn!(task_id = %task_id, "Transition for unknown task ignored");
                return false;
            };

            // Work on a copy so a half-applied closure never becomes visible.
            let mut next = task.clone();
            if let Err(e) = apply(&mut next) {
                warn!(task_id = %task_id, error = %e, "Refused task transition");
                return false;
            }
            let state = next.state();
            *task = next;
            state
        };

        self.publish(task_id, state);
        true
    }

    fn publish(&self, task_id: TaskId, state: TaskState) {
        if self.event_tx.send(TaskEvent { task_id, state }).is_err() {
            debug!("No subscribers for task event");
        }
    }
}
