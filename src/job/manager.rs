//! Job scheduling
//!
//! The manager owns the shared repository and installed store, spawns one
//! worker thread per submitted request, and serializes jobs touching the
//! same namespace behind a per-namespace lock. Jobs on different namespaces
//! run concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::job::JobHandle;
use crate::repository::Repository;
use crate::resolver::Request;
use crate::store::InstalledStore;

pub struct JobManager {
    repository: Arc<dyn Repository>,
    store: Arc<dyn InstalledStore>,
    namespace_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,

    /// How long a job waits in WAITING_FOR_ANSWER before failing the step.
    /// `None` waits indefinitely, which is the default: an unanswered
    /// question should stay visible rather than silently expire.
    question_timeout: Option<Duration>,
}

impl JobManager {
    pub fn new(repository: Arc<dyn Repository>, store: Arc<dyn InstalledStore>) -> Self {
        JobManager {
            repository,
            store,
            namespace_locks: Mutex::new(HashMap::new()),
            question_timeout: None,
        }
    }

    pub fn with_question_timeout(mut self, timeout: Duration) -> Self {
        self.question_timeout = Some(timeout);
        self
    }

    fn namespace_lock(&self, namespace: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .namespace_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            locks
                .entry(namespace.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Submit a request as a background job, returning its handle
    /// immediately. The worker waits for the namespace lock before planning,
    /// so two jobs on the same namespace never interleave.
    pub fn submit(&self, request: Request) -> JobHandle {
        let handle = JobHandle::new();
        let worker = handle.clone();
        let lock = self.namespace_lock(request.namespace());
        let repository = Arc::clone(&self.repository);
        let store = Arc::clone(&self.store);
        let timeout = self.question_timeout;

        thread::spawn(move || {
            let _namespace = lock.lock().unwrap_or_else(PoisonError::into_inner);
            worker.run(&request, repository.as_ref(), store.as_ref(), timeout);
        });

        handle
    }

    /// Submit and block until the job terminates.
    pub fn run(&self, request: Request) -> JobHandle {
        let handle = self.submit(request);
        handle.wait();
        handle
    }
}
