//! Bounded worker pool for concurrent resolutions.
//!
//! [`Resolver::resolve`] is synchronous and never blocks. When a caller has
//! many independent targets, `ResolverRuntime` fans requests out over a fixed
//! set of threads fed by a bounded queue. A full queue is reported at once
//! rather than blocking the submitter; timeouts are the caller's choice via
//! [`ResolutionHandle::join_timeout`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::engine::{ResolveRequest, Resolver};
use crate::error::{ResolveError, ResolveResult, RuntimeError, ValidationError};
use crate::result::ClusteringResult;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum queued requests.
    pub queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 256,
        }
    }
}

impl RuntimeConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.workers == 0 {
            return Err(ValidationError::InvalidRuntimeConfig {
                reason: "workers must be > 0".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidRuntimeConfig {
                reason: "queue_capacity must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

enum Job {
    Resolve {
        request: Box<ResolveRequest>,
        reply: Sender<ClusteringResult>,
    },

    #[cfg(test)]
    Sleep {
        duration: Duration,
        reply: Sender<()>,
    },
}

/// Handle to one submitted resolution.
pub struct ResolutionHandle {
    rx: Receiver<ClusteringResult>,
}

impl ResolutionHandle {
    /// Waits for the result.
    pub fn join(self) -> ResolveResult<ClusteringResult> {
        self.rx
            .recv()
            .map_err(|_| ResolveError::from(RuntimeError::Disconnected))
    }

    /// Waits for the result, giving up after `timeout`.
    pub fn join_timeout(self, timeout: Duration) -> ResolveResult<ClusteringResult> {
        self.rx.recv_timeout(timeout).map_err(|err| {
            let cause = match err {
                RecvTimeoutError::Timeout => RuntimeError::Timeout {
                    duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
                },
                RecvTimeoutError::Disconnected => RuntimeError::Disconnected,
            };
            ResolveError::from(cause)
        })
    }
}

/// Runs independent resolutions on a bounded thread pool.
pub struct ResolverRuntime {
    resolver: Arc<Resolver>,
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl ResolverRuntime {
    /// Starts the worker threads.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad configuration, or
    /// `RuntimeError::Spawn` if a worker thread cannot be started.
    pub fn new(resolver: Resolver, config: RuntimeConfig) -> ResolveResult<Self> {
        config.validate()?;
        let resolver = Arc::new(resolver);
        let (tx, rx) = bounded::<Job>(config.queue_capacity);

        let mut runtime = Self {
            resolver,
            tx: Some(tx),
            workers: Vec::with_capacity(config.workers),
            queue_capacity: config.queue_capacity,
        };

        for idx in 0..config.workers {
            let rx: Receiver<Job> = rx.clone();
            let resolver = Arc::clone(&runtime.resolver);
            let handle = thread::Builder::new()
                .name(format!("personlink-worker-{idx}"))
                .spawn(move || worker_loop(&rx, &resolver))
                .map_err(|e| RuntimeError::Spawn { message: e.to_string() })?;
            runtime.workers.push(handle);
        }
        debug!(workers = config.workers, queue_capacity = config.queue_capacity, "resolver runtime started");

        Ok(runtime)
    }

    fn try_submit(&self, job: Job) -> ResolveResult<()> {
        let tx = self.tx.as_ref().ok_or(RuntimeError::Disconnected)?;
        match tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(RuntimeError::QueueFull {
                capacity: self.queue_capacity,
            }
            .into()),
            Err(TrySendError::Disconnected(_)) => Err(RuntimeError::Disconnected.into()),
        }
    }

    /// Queues a request.
    ///
    /// # Errors
    ///
    /// `RuntimeError::QueueFull` when the queue is at capacity.
    pub fn submit(&self, request: ResolveRequest) -> ResolveResult<ResolutionHandle> {
        let (reply, rx) = bounded::<ClusteringResult>(1);
        self.try_submit(Job::Resolve {
            request: Box::new(request),
            reply,
        })?;
        Ok(ResolutionHandle { rx })
    }

    /// Queues a request and waits for its result.
    pub fn resolve(&self, request: ResolveRequest) -> ResolveResult<ClusteringResult> {
        self.submit(request)?.join()
    }

    /// The shared resolver.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    #[cfg(test)]
    fn submit_sleep(&self, duration: Duration) -> ResolveResult<Receiver<()>> {
        let (reply, rx) = bounded::<()>(1);
        self.try_submit(Job::Sleep { duration, reply })?;
        Ok(rx)
    }
}

fn worker_loop(rx: &Receiver<Job>, resolver: &Resolver) {
    while let Ok(job) = rx.recv() {
        match job {
            Job::Resolve { request, reply } => {
                let result = resolver.resolve(&request);
                if reply.send(result).is_err() {
                    trace!("resolution handle dropped before completion");
                }
            }

            #[cfg(test)]
            Job::Sleep { duration, reply } => {
                thread::sleep(duration);
                let _ = reply.send(());
            }
        }
    }
}

impl Drop for ResolverRuntime {
    fn drop(&mut self) {
        // Closing the channel lets workers drain queued jobs and exit.
        self.tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::identity::TargetIdentity;

    fn runtime(workers: usize, queue_capacity: usize) -> ResolverRuntime {
        let resolver = Resolver::new(ResolverConfig::default()).unwrap();
        ResolverRuntime::new(
            resolver,
            RuntimeConfig {
                workers,
                queue_capacity,
            },
        )
        .unwrap()
    }

    fn request() -> ResolveRequest {
        ResolveRequest::new(TargetIdentity::new("Jane", "Doe", "jane@acme.com").unwrap(), Vec::new())
    }

    #[test]
    fn resolves_through_the_pool() {
        let rt = runtime(2, 8);
        let result = rt.resolve(request()).unwrap();
        assert!(result.clusters.is_empty());
    }

    #[test]
    fn full_queue_is_reported_immediately() {
        let rt = runtime(1, 1);
        let busy = rt.submit_sleep(Duration::from_millis(200)).unwrap();
        // Give the worker time to pick up the sleep job.
        thread::sleep(Duration::from_millis(50));
        let _queued = rt.submit(request()).unwrap();
        let err = rt.submit(request()).err().unwrap();
        assert!(matches!(err, ResolveError::Runtime(RuntimeError::QueueFull { capacity: 1 })));
        assert!(err.is_retryable());
        busy.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn join_timeout_reports_timeout() {
        let rt = runtime(1, 4);
        let _busy = rt.submit_sleep(Duration::from_millis(200)).unwrap();
        let handle = rt.submit(request()).unwrap();
        let err = handle.join_timeout(Duration::from_millis(10)).err().unwrap();
        assert!(matches!(err, ResolveError::Runtime(RuntimeError::Timeout { duration_ms: 10 })));
    }

    #[test]
    fn join_reports_disconnected_when_reply_dropped() {
        let (tx, rx) = bounded::<ClusteringResult>(1);
        drop(tx);
        let err = ResolutionHandle { rx }.join().err().unwrap();
        assert!(matches!(err, ResolveError::Runtime(RuntimeError::Disconnected)));
    }

    #[test]
    fn rejects_zero_workers() {
        let resolver = Resolver::new(ResolverConfig::default()).unwrap();
        let err = ResolverRuntime::new(
            resolver,
            RuntimeConfig {
                workers: 0,
                queue_capacity: 1,
            },
        )
        .err()
        .unwrap();
        assert!(err.is_validation());
    }
}
