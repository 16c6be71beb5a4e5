//! `ThreadPool`: fixed-size worker pool (§6, §12).
//!
//! No teacher analogue — the teacher is single-threaded-per-request and
//! never schedules background jobs — so this is the idiomatic minimal
//! shape for a fixed worker pool: a shared `Mutex<VecDeque<Job>>` plus a
//! `Condvar` workers block on, matching §12's own description ("the
//! idiomatic minimal pool shape... no work-stealing, no priorities").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JobStatus {
    Deferred,
    Queued,
    Running,
    Completed,
    Stopped,
}

struct Shared {
    queue: Mutex<std::collections::VecDeque<Job>>,
    condvar: Condvar,
    stopping: AtomicBool,
}

/// A fixed-size pool of worker threads pulling jobs off one shared queue.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    pub fn new(thread_count: usize) -> Self {
        let thread_count = thread_count.max(1);
        let shared = Arc::new(Shared {
            queue: Mutex::new(std::collections::VecDeque::new()),
            condvar: Condvar::new(),
            stopping: AtomicBool::new(false),
        });

        let workers = (0..thread_count)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || worker_loop(shared))
            })
            .collect();

        Self { shared, workers }
    }

    /// Enqueues `job` unconditionally. Matches §6's `push`.
    pub fn push(&self, job: Job) {
        let mut queue = self.shared.queue.lock().expect("thread pool queue poisoned");
        queue.push_back(job);
        self.shared.condvar.notify_one();
    }

    pub fn push_multiple(&self, jobs: impl IntoIterator<Item = Job>) {
        let mut queue = self.shared.queue.lock().expect("thread pool queue poisoned");
        for job in jobs {
            queue.push_back(job);
        }
        self.shared.condvar.notify_all();
    }

    /// Enqueues `job` unless the pool is stopping. Returns whether it was
    /// accepted — the non-blocking counterpart to `push` (§6).
    pub fn try_schedule(&self, job: Job) -> bool {
        if self.shared.stopping.load(Ordering::Acquire) {
            return false;
        }
        self.push(job);
        true
    }

    pub fn is_busy(&self) -> bool {
        !self.shared.queue.lock().expect("thread pool queue poisoned").is_empty()
    }

    /// Signals workers to stop once the queue drains, then joins them.
    pub fn stop(&mut self) {
        self.shared.stopping.store(true, Ordering::Release);
        self.shared.condvar.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut queue = shared.queue.lock().expect("thread pool queue poisoned");
            loop {
                if let Some(job) = queue.pop_front() {
                    break Some(job);
                }
                if shared.stopping.load(Ordering::Acquire) {
                    break None;
                }
                queue = shared.condvar.wait(queue).expect("thread pool queue poisoned");
            }
        };
        match job {
            Some(job) => job(),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn pushed_jobs_run() {
        let pool = ThreadPool::new(2);
        let (tx, rx) = mpsc::channel();
        for i in 0..4 {
            let tx = tx.clone();
            pool.push(Box::new(move || tx.send(i).unwrap()));
        }
        let mut received: Vec<i32> = (0..4).map(|_| rx.recv_timeout(Duration::from_secs(1)).unwrap()).collect();
        received.sort();
        assert_eq!(received, vec![0, 1, 2, 3]);
    }

    #[test]
    fn stop_joins_workers_after_queue_drains() {
        let mut pool = ThreadPool::new(1);
        let (tx, rx) = mpsc::channel();
        pool.push(Box::new(move || tx.send(()).unwrap()));
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        pool.stop();
        assert!(!pool.try_schedule(Box::new(|| {})));
    }
}
