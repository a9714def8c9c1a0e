//! Writer-preferring, reentrant reader/writer guard for the shared store
//! connection.
//!
//! Every acquisition passes an admission step. Readers pass it just long
//! enough to register themselves; a writer claims admission and keeps it
//! until its outermost scope ends, then waits for the registered readers to
//! drain. Once a writer has claimed admission no new reader gets in, so a
//! steady stream of readers cannot starve writers.
//!
//! Exclusive access is reentrant on the thread that holds it. A thread
//! holding shared access must not request exclusive access: the writer would
//! wait for its own read to drain.

use std::{
    fmt,
    marker::PhantomData,
    thread::{self, ThreadId},
};

use log::trace;
use parking_lot::{Condvar, Mutex};

/// How a scope holds the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Concurrent read access.
    Shared,
    /// Sole access, reentrant on the holding thread.
    Exclusive,
}

/// Observable state of an [`AccessLock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    /// Nobody holds or awaits the lock.
    Unlocked,
    /// Readers hold the lock and no writer has claimed admission.
    Shared {
        /// Active readers.
        readers: usize,
    },
    /// A writer holds admission and waits for readers to finish.
    Draining {
        /// Readers still active.
        readers: usize,
    },
    /// A writer holds the lock.
    Exclusive {
        /// Nesting depth on the holding thread.
        depth: usize,
    },
}

#[derive(Debug, Default)]
struct LockState {
    readers: usize,
    owner: Option<ThreadId>,
    depth: usize,
}

/// The guard serialising logical units of work against one connection.
///
/// # Examples
/// ```
/// use seamark_core::{AccessLock, LockStatus};
///
/// let lock = AccessLock::new();
/// {
///     let _outer = lock.exclusive();
///     let _inner = lock.exclusive();
///     assert_eq!(lock.status(), LockStatus::Exclusive { depth: 2 });
/// }
/// assert_eq!(lock.status(), LockStatus::Unlocked);
/// ```
#[derive(Default)]
pub struct AccessLock {
    state: Mutex<LockState>,
    admission: Condvar,
    drained: Condvar,
}

impl fmt::Debug for AccessLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessLock")
            .field("status", &self.status())
            .finish()
    }
}

impl AccessLock {
    /// Create an unlocked guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire shared access for the lifetime of the returned scope.
    ///
    /// On a thread that already holds exclusive access this nests another
    /// exclusive level instead of blocking.
    pub fn shared(&self) -> AccessScope<'_> {
        let mode = self.lock_shared();
        AccessScope::new(self, mode)
    }

    /// Acquire exclusive access for the lifetime of the returned scope.
    pub fn exclusive(&self) -> AccessScope<'_> {
        self.lock_exclusive();
        AccessScope::new(self, AccessMode::Exclusive)
    }

    /// Acquire access in the requested mode.
    pub fn scope(&self, mode: AccessMode) -> AccessScope<'_> {
        match mode {
            AccessMode::Shared => self.shared(),
            AccessMode::Exclusive => self.exclusive(),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn status(&self) -> LockStatus {
        let state = self.state.lock();
        match (state.owner, state.readers) {
            (None, 0) => LockStatus::Unlocked,
            (None, readers) => LockStatus::Shared { readers },
            (Some(_), 0) => LockStatus::Exclusive { depth: state.depth },
            (Some(_), readers) => LockStatus::Draining { readers },
        }
    }

    fn lock_shared(&self) -> AccessMode {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.owner == Some(me) {
            state.depth += 1;
            return AccessMode::Exclusive;
        }
        while state.owner.is_some() {
            self.admission.wait(&mut state);
        }
        state.readers += 1;
        AccessMode::Shared
    }

    fn lock_exclusive(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.owner == Some(me) {
            state.depth += 1;
            return;
        }
        while state.owner.is_some() {
            self.admission.wait(&mut state);
        }
        state.owner = Some(me);
        state.depth = 1;
        if state.readers > 0 {
            trace!("writer waiting for {} reader(s) to drain", state.readers);
        }
        while state.readers > 0 {
            self.drained.wait(&mut state);
        }
    }

    fn unlock(&self, mode: AccessMode) {
        let mut state = self.state.lock();
        match mode {
            AccessMode::Exclusive => {
                state.depth = state.depth.saturating_sub(1);
                if state.depth == 0 {
                    state.owner = None;
                    self.admission.notify_all();
                }
            }
            AccessMode::Shared => {
                state.readers = state.readers.saturating_sub(1);
                if state.readers == 0 {
                    // Only the admission holder ever waits here.
                    self.drained.notify_one();
                }
            }
        }
    }
}

/// Held access, released when dropped.
///
/// Scopes are tied to the acquiring thread and cannot be copied or sent.
#[must_use = "access is released as soon as the scope is dropped"]
pub struct AccessScope<'a> {
    lock: &'a AccessLock,
    mode: AccessMode,
    _not_send: PhantomData<*const ()>,
}

impl<'a> AccessScope<'a> {
    const fn new(lock: &'a AccessLock, mode: AccessMode) -> Self {
        Self {
            lock,
            mode,
            _not_send: PhantomData,
        }
    }

    /// Mode actually held. A shared request nested inside exclusive access
    /// reports [`AccessMode::Exclusive`].
    #[must_use]
    pub const fn mode(&self) -> AccessMode {
        self.mode
    }
}

impl fmt::Debug for AccessScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessScope")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Drop for AccessScope<'_> {
    fn drop(&mut self) {
        self.lock.unlock(self.mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::{sync::Arc, time::Duration};

    #[rstest]
    fn readers_share_the_lock() {
        let lock = AccessLock::new();
        let first = lock.shared();
        let second = lock.shared();
        assert_eq!(lock.status(), LockStatus::Shared { readers: 2 });
        drop(first);
        drop(second);
        assert_eq!(lock.status(), LockStatus::Unlocked);
    }

    #[rstest]
    fn exclusive_is_reentrant() {
        let lock = AccessLock::new();
        let outer = lock.exclusive();
        {
            let _inner = lock.exclusive();
            assert_eq!(lock.status(), LockStatus::Exclusive { depth: 2 });
        }
        assert_eq!(lock.status(), LockStatus::Exclusive { depth: 1 });
        drop(outer);
        assert_eq!(lock.status(), LockStatus::Unlocked);
    }

    #[rstest]
    fn shared_inside_exclusive_nests() {
        let lock = AccessLock::new();
        let _outer = lock.exclusive();
        let inner = lock.shared();
        assert_eq!(inner.mode(), AccessMode::Exclusive);
        assert_eq!(lock.status(), LockStatus::Exclusive { depth: 2 });
    }

    #[rstest]
    fn scope_releases_on_panic() {
        let lock = Arc::new(AccessLock::new());
        let inner = Arc::clone(&lock);
        let result = thread::spawn(move || {
            let _scope = inner.exclusive();
            panic!("abandon the unit of work");
        })
        .join();
        assert!(result.is_err());
        assert_eq!(lock.status(), LockStatus::Unlocked);
    }

    #[rstest]
    fn writer_blocks_until_reader_leaves() {
        let lock = Arc::new(AccessLock::new());
        let reader = lock.shared();

        let writer_lock = Arc::clone(&lock);
        let writer = thread::spawn(move || {
            let _scope = writer_lock.exclusive();
        });

        while lock.status() != (LockStatus::Draining { readers: 1 }) {
            thread::sleep(Duration::from_millis(1));
        }
        drop(reader);
        writer.join().expect("writer thread");
        assert_eq!(lock.status(), LockStatus::Unlocked);
    }
}
