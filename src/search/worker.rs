//! Worker-thread management for asynchronous searches.
//!
//! At most one worker runs at a time. The worker takes ownership of the
//! transposition table for the duration of the search and hands it back
//! through the join handle, so no other thread can touch the table while
//! a search is in flight. The shared `running` flag, guarded by a mutex,
//! is the sole cross-thread channel: clearing it makes every search frame
//! unwind within one node visit.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::search::search::{run_search, SearchArgument};
use crate::search::transposition_table::TranspositionTable;

pub struct SearchWorker {
    handle: Option<JoinHandle<TranspositionTable>>,
    running: Arc<Mutex<bool>>,
}

impl SearchWorker {
    pub fn new() -> Self {
        Self {
            handle: None,
            running: Arc::new(Mutex::new(false)),
        }
    }

    /// Shared flag handed to [`SearchArgument::running`].
    pub fn running_flag(&self) -> Arc<Mutex<bool>> {
        Arc::clone(&self.running)
    }

    /// True while a search is executing. A finished worker whose handle
    /// has not been collected yet reports false.
    pub fn is_running(&self) -> bool {
        *self.running.lock().expect("running flag mutex poisoned")
    }

    /// Spawn the worker. The caller must pass the flag obtained from
    /// [`SearchWorker::running_flag`] inside `argument` and must have
    /// collected any previous worker first.
    pub fn start(&mut self, argument: SearchArgument, tt: TranspositionTable) {
        debug_assert!(self.handle.is_none(), "previous worker was not collected");
        *self.running.lock().expect("running flag mutex poisoned") = true;
        self.handle = Some(std::thread::spawn(move || run_search(argument, tt)));
    }

    /// Request cancellation and wait for the worker to exit, recovering
    /// the transposition table. Returns `None` when no worker was spawned.
    pub fn stop(&mut self) -> Option<TranspositionTable> {
        *self.running.lock().expect("running flag mutex poisoned") = false;
        self.collect()
    }

    /// Join a worker without requesting cancellation. Blocks until the
    /// search finishes on its own limits; used when the caller knows the
    /// worker has terminated or wants to wait for it.
    pub fn collect(&mut self) -> Option<TranspositionTable> {
        self.handle
            .take()
            .map(|handle| handle.join().expect("search worker panicked"))
    }
}

impl Default for SearchWorker {
    fn default() -> Self {
        Self::new()
    }
}
