//! Per-job overlap protection.
//!
//! A job that does not allow concurrent runs is "busy" while a [`RunGuard`]
//! for it is alive. Triggers that arrive while busy are dropped, never queued.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::job::Job;

/// Proof that a run of `job` is in flight. Dropping it ends the run.
#[derive(Debug)]
pub struct RunGuard {
    job: Arc<Job>,
}

impl Job {
    /// Claim a run slot for this job without blocking.
    ///
    /// Returns `None` when the job disallows concurrency and a run is
    /// already in flight.
    pub fn try_acquire(self: &Arc<Self>) -> Option<RunGuard> {
        if self.concurrent() {
            self.running.fetch_add(1, Ordering::AcqRel);
        } else if self
            .running
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        Some(RunGuard {
            job: Arc::clone(self),
        })
    }
}

impl RunGuard {
    pub fn job(&self) -> &Arc<Job> {
        &self.job
    }

    pub fn release(self) {}
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.job.running.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webcron_models::core::TaskConfig;

    fn job(concurrent: bool) -> Arc<Job> {
        let mut task = TaskConfig::new(1, "t", "true");
        task.concurrent = concurrent;
        Arc::new(Job::from_task(task).unwrap())
    }

    #[test]
    fn exclusive_job_admits_one_run() {
        let job = job(false);

        let first = job.try_acquire();
        assert!(first.is_some());
        assert_eq!(job.running(), 1);

        assert!(job.try_acquire().is_none());
        assert_eq!(job.running(), 1);

        drop(first);
        assert_eq!(job.running(), 0);
        assert!(job.try_acquire().is_some());
    }

    #[test]
    fn concurrent_job_always_admits() {
        let job = job(true);

        let guards: Vec<_> = (0..5).map(|_| job.try_acquire().unwrap()).collect();
        assert_eq!(job.running(), 5);

        drop(guards);
        assert_eq!(job.running(), 0);
    }

    #[test]
    fn release_restores_counter() {
        let job = job(false);
        let guard = job.try_acquire().unwrap();
        assert!(Arc::ptr_eq(guard.job(), &job));
        guard.release();
        assert_eq!(job.running(), 0);
    }

    #[test]
    fn guard_released_when_run_panics() {
        let job = job(false);
        let panicking = Arc::clone(&job);

        let result = std::thread::spawn(move || {
            let _guard = panicking.try_acquire().unwrap();
            panic!("run blew up");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(job.running(), 0);
    }
}
