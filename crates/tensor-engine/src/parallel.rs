// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-size worker pool and disjoint output writes.
//!
//! Parallel operations split their output into regions no two tasks share,
//! submit one task per region with [`WorkerPool::run_all`] and block until
//! every task has finished.

use crate::EngineError;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tensor_core::{TaskCause, TensorError, WorkerPanic};

/// A rayon pool with a fixed number of named workers.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl WorkerPool {
    /// Starts `threads` workers named `tensor-worker-{i}`.
    pub fn new(threads: usize) -> Result<Self, EngineError> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tensor-worker-{i}"))
            .build()?;
        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Runs every task on the pool and waits for all of them.
    ///
    /// A task's error or panic does not stop its siblings. Once every task
    /// has returned, the failure of the earliest submitted failing task is
    /// reported as [`TensorError::ParallelTaskFailure`].
    pub fn run_all<'a, F>(&self, op: &'static str, tasks: Vec<F>) -> Result<(), TensorError>
    where
        F: FnOnce() -> Result<(), TensorError> + Send + 'a,
    {
        let count = tasks.len();
        let failure: Mutex<Option<(usize, TaskCause)>> = Mutex::new(None);
        self.pool.scope(|scope| {
            for (index, task) in tasks.into_iter().enumerate() {
                let failure = &failure;
                scope.spawn(move |_| {
                    let cause: TaskCause = match catch_unwind(AssertUnwindSafe(task)) {
                        Ok(Ok(())) => return,
                        Ok(Err(e)) => Box::new(e),
                        Err(payload) => Box::new(WorkerPanic::from_payload(payload)),
                    };
                    let mut slot = failure.lock();
                    if slot.as_ref().map_or(true, |(first, _)| index < *first) {
                        *slot = Some((index, cause));
                    }
                });
            }
        });
        tracing::debug!("{op}: joined {count} tasks on {} workers", self.threads);
        match failure.into_inner() {
            Some((_, source)) => Err(TensorError::ParallelTaskFailure { op, source }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}

/// Shares one output buffer between tasks that write disjoint positions.
pub struct DisjointWriter<'a, T> {
    ptr: *mut T,
    len: usize,
    _buffer: PhantomData<&'a mut [T]>,
}

// Tasks only write through `write`, whose contract forbids two tasks touching
// the same position; the buffer outlives the writer through `'a`.
unsafe impl<T: Send> Send for DisjointWriter<'_, T> {}
unsafe impl<T: Send> Sync for DisjointWriter<'_, T> {}

impl<'a, T> DisjointWriter<'a, T> {
    pub fn new(buffer: &'a mut [T]) -> Self {
        Self {
            ptr: buffer.as_mut_ptr(),
            len: buffer.len(),
            _buffer: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Writes `value` at `index`.
    ///
    /// # Safety
    /// No other thread may read or write `index` while the writer is alive.
    /// `index` must be below [`len`](Self::len).
    pub unsafe fn write(&self, index: usize, value: T) {
        debug_assert!(index < self.len, "index {index} out of {}", self.len);
        // SAFETY: in bounds per the caller's contract, and no other task
        // aliases this position.
        unsafe { *self.ptr.add(index) = value };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_thread_names() {
        let pool = WorkerPool::new(2).unwrap();
        let name = pool.pool.install(|| std::thread::current().name().map(String::from));
        assert!(name.unwrap().starts_with("tensor-worker-"));
        assert_eq!(pool.threads(), 2);
    }

    #[test]
    fn test_run_all_success() {
        let pool = WorkerPool::new(3).unwrap();
        let counter = AtomicUsize::new(0);
        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let counter = &counter;
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .collect();
        pool.run_all("count", tasks).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_failure_drains_all_tasks() {
        let pool = WorkerPool::new(2).unwrap();
        let counter = AtomicUsize::new(0);
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let counter = &counter;
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if i == 3 {
                        return Err(TensorError::invalid("task", "bad block"));
                    }
                    Ok(())
                }
            })
            .collect();
        let err = pool.run_all("copy", tasks).unwrap_err();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
        assert!(matches!(err, TensorError::ParallelTaskFailure { op: "copy", .. }));
    }

    #[test]
    fn test_earliest_failing_task_is_reported() {
        let pool = WorkerPool::new(4).unwrap();
        let tasks: Vec<_> = (0..4)
            .map(|i| {
                move || {
                    if i == 1 {
                        // let the later tasks fail first
                        std::thread::sleep(std::time::Duration::from_millis(50));
                    }
                    if i == 0 {
                        return Ok(());
                    }
                    Err(TensorError::invalid("task", format!("block {i}")))
                }
            })
            .collect();
        let err = pool.run_all("copy", tasks).unwrap_err();
        let text = format!("{}", std::error::Error::source(&err).unwrap());
        assert!(text.contains("block 1"), "{text}");
    }

    #[test]
    fn test_panic_is_captured() {
        let pool = WorkerPool::new(2).unwrap();
        let tasks: Vec<Box<dyn FnOnce() -> Result<(), TensorError> + Send>> = vec![
            Box::new(|| Ok(())),
            Box::new(|| panic!("worker blew up")),
        ];
        let err = pool.run_all("mm", tasks).unwrap_err();
        let text = format!("{}", std::error::Error::source(&err).unwrap());
        assert!(text.contains("worker blew up"), "{text}");
    }

    #[test]
    fn test_disjoint_writer() {
        let pool = WorkerPool::new(4).unwrap();
        let mut out = vec![0usize; 100];
        let writer = DisjointWriter::new(&mut out);
        let writer = &writer;
        let tasks: Vec<_> = (0..4)
            .map(|t| {
                move || {
                    for i in (t..100).step_by(4) {
                        // SAFETY: task t owns the positions congruent to t mod 4.
                        unsafe { writer.write(i, i * 2) };
                    }
                    Ok(())
                }
            })
            .collect();
        pool.run_all("write", tasks).unwrap();
        assert!(out.iter().enumerate().all(|(i, &v)| v == i * 2));
    }
}
