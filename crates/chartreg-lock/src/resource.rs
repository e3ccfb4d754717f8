//! Hierarchical resource lock tree.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::raw::{Deadline, RawRwLock};

/// Acquisition mode of a granted path lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

struct LockNode {
    lock: Arc<RawRwLock>,
    children: HashMap<String, LockNode>,
}

impl LockNode {
    fn new() -> Self {
        Self {
            lock: Arc::new(RawRwLock::new()),
            children: HashMap::new(),
        }
    }
}

// Request ids are only for diagnostic logging; semantics depend solely on
// node identities.
static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Manager of the hierarchical lock tree.
///
/// Nodes are created lazily on first [`get`](Self::get) and are never
/// removed while the manager lives.
// TODO: evict nodes that have not been used for a while; today the tree only
// ever grows until close().
pub struct ResourceLocker {
    nodes: Mutex<HashMap<String, LockNode>>,
}

impl ResourceLocker {
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(HashMap::new()),
        }
    }

    /// Get a lock handle for a resource path, creating missing nodes.
    ///
    /// The handle references one lock per path level, parent first.
    pub fn get(&self, path: &[&str]) -> ResourceLock {
        let mut nodes = self.nodes.lock().expect("lock poisoned");
        let mut locks = Vec::with_capacity(path.len());
        let mut children = &mut *nodes;
        for segment in path {
            let node = children
                .entry((*segment).to_string())
                .or_insert_with(LockNode::new);
            locks.push(Arc::clone(&node.lock));
            children = &mut node.children;
        }
        let handle = ResourceLock {
            name: path.join("/"),
            id: REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed) + 1,
            locks,
        };
        tracing::debug!(lock = %handle.name(), "get locks");
        handle
    }

    /// Drop every node wholesale. Only safe while the manager is quiescing;
    /// outstanding guards keep their own references and release harmlessly.
    pub fn close(&self) {
        self.nodes.lock().expect("lock poisoned").clear();
    }
}

impl Default for ResourceLocker {
    fn default() -> Self {
        Self::new()
    }
}

/// A lock handle over one resource path, parent locks first.
pub struct ResourceLock {
    name: String,
    id: u64,
    locks: Vec<Arc<RawRwLock>>,
}

impl ResourceLock {
    /// Diagnostic name of this request.
    pub fn name(&self) -> String {
        format!("{}({})", self.name, self.id)
    }

    /// Acquire for writing: read-lock every ancestor in order, then
    /// write-lock the final node. The budget is shared across all steps; on
    /// any failure every earlier acquisition is rolled back in reverse order.
    pub fn lock(&self, timeout: Duration) -> Option<ResourceGuard<'_>> {
        tracing::debug!(lock = %self.name(), "lock");
        let Some((last, ancestors)) = self.locks.split_last() else {
            tracing::debug!(lock = %self.name(), "failed to lock: no underlying lock");
            return None;
        };
        let deadline = Deadline::after(timeout);
        for (held, ancestor) in ancestors.iter().enumerate() {
            if !ancestor.read(deadline) {
                self.release_reads(held);
                tracing::debug!(lock = %self.name(), "failed to lock, rollback");
                return None;
            }
        }
        if !last.write(deadline) {
            self.release_reads(ancestors.len());
            tracing::debug!(lock = %self.name(), "failed to lock, rollback");
            return None;
        }
        tracing::debug!(lock = %self.name(), "lock successfully");
        Some(ResourceGuard {
            owner: self,
            mode: LockMode::Write,
        })
    }

    /// Acquire for reading: read-lock every node in order. Same budget and
    /// rollback discipline as [`lock`](Self::lock).
    pub fn rlock(&self, timeout: Duration) -> Option<ResourceGuard<'_>> {
        tracing::debug!(lock = %self.name(), "rlock");
        if self.locks.is_empty() {
            tracing::debug!(lock = %self.name(), "failed to rlock: no underlying lock");
            return None;
        }
        let deadline = Deadline::after(timeout);
        for (held, node) in self.locks.iter().enumerate() {
            if !node.read(deadline) {
                self.release_reads(held);
                tracing::debug!(lock = %self.name(), "failed to rlock, rollback");
                return None;
            }
        }
        tracing::debug!(lock = %self.name(), "rlock successfully");
        Some(ResourceGuard {
            owner: self,
            mode: LockMode::Read,
        })
    }

    /// Release the first `held` read acquisitions, child side first.
    fn release_reads(&self, held: usize) {
        for node in self.locks[..held].iter().rev() {
            node.unlock_read();
        }
    }
}

/// RAII release of a granted path acquisition.
///
/// Dropping the guard releases the final node in its acquisition mode, then
/// the ancestors' read locks in reverse order.
pub struct ResourceGuard<'a> {
    owner: &'a ResourceLock,
    mode: LockMode,
}

impl ResourceGuard<'_> {
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for ResourceGuard<'_> {
    fn drop(&mut self) {
        tracing::debug!(lock = %self.owner.name(), mode = ?self.mode, "unlock");
        match self.mode {
            LockMode::Write => {
                let (last, _) = self
                    .owner
                    .locks
                    .split_last()
                    .expect("write guard over empty path");
                last.unlock_write();
                self.owner.release_reads(self.owner.locks.len() - 1);
            }
            LockMode::Read => {
                self.owner.release_reads(self.owner.locks.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::TIMEOUT_IMMEDIATE;
    use std::thread;

    fn locker() -> ResourceLocker {
        ResourceLocker::new()
    }

    // -----------------------------------------------------------------------
    // Conflict matrix on a single path
    // -----------------------------------------------------------------------

    #[test]
    fn write_conflicts_with_write() {
        let rl = locker();
        let path = rl.get(&["a", "b", "c"]);
        let guard = path.lock(TIMEOUT_IMMEDIATE).expect("can't lock");
        assert!(path.lock(TIMEOUT_IMMEDIATE).is_none());
        drop(guard);
        assert!(path.lock(TIMEOUT_IMMEDIATE).is_some());
    }

    #[test]
    fn write_conflicts_with_read() {
        let rl = locker();
        let path = rl.get(&["a", "b", "c"]);
        let guard = path.lock(TIMEOUT_IMMEDIATE).expect("can't lock");
        assert!(path.rlock(TIMEOUT_IMMEDIATE).is_none());
        drop(guard);
    }

    #[test]
    fn read_conflicts_with_write() {
        let rl = locker();
        let path = rl.get(&["a", "b", "c"]);
        let guard = path.rlock(TIMEOUT_IMMEDIATE).expect("can't rlock");
        assert!(path.lock(TIMEOUT_IMMEDIATE).is_none());
        drop(guard);
    }

    #[test]
    fn read_shares_with_read() {
        let rl = locker();
        let path = rl.get(&["a", "b", "c"]);
        let g1 = path.rlock(TIMEOUT_IMMEDIATE).expect("can't rlock");
        let g2 = path.rlock(TIMEOUT_IMMEDIATE).expect("locks error");
        drop(g2);
        drop(g1);
        assert!(path.lock(TIMEOUT_IMMEDIATE).is_some());
    }

    // -----------------------------------------------------------------------
    // Hierarchy
    // -----------------------------------------------------------------------

    #[test]
    fn child_writer_blocks_parent_writer() {
        let rl = locker();
        let child = rl.get(&["a", "b", "c"]);
        let parent = rl.get(&["a", "b"]);
        let guard = child.lock(TIMEOUT_IMMEDIATE).expect("can't lock child");
        // The child holds a read lock on "b", so a write on "b" must wait.
        assert!(parent.lock(TIMEOUT_IMMEDIATE).is_none());
        drop(guard);
        assert!(parent.lock(TIMEOUT_IMMEDIATE).is_some());
    }

    #[test]
    fn parent_writer_blocks_child_operations() {
        let rl = locker();
        let parent = rl.get(&["a", "b"]);
        let child = rl.get(&["a", "b", "c"]);
        let guard = parent.lock(TIMEOUT_IMMEDIATE).expect("can't lock parent");
        assert!(child.lock(TIMEOUT_IMMEDIATE).is_none());
        assert!(child.rlock(TIMEOUT_IMMEDIATE).is_none());
        drop(guard);
    }

    #[test]
    fn sibling_writers_proceed_in_parallel() {
        let rl = locker();
        let v1 = rl.get(&["s", "c", "1.0.0"]);
        let v2 = rl.get(&["s", "c", "2.0.0"]);
        let g1 = v1.lock(TIMEOUT_IMMEDIATE).expect("can't lock v1");
        let g2 = v2.lock(TIMEOUT_IMMEDIATE).expect("can't lock v2");
        drop(g1);
        drop(g2);
    }

    #[test]
    fn sibling_charts_are_independent() {
        let rl = locker();
        let c1 = rl.get(&["s", "c1"]);
        let c2 = rl.get(&["s", "c2"]);
        let g1 = c1.lock(TIMEOUT_IMMEDIATE).expect("can't lock c1");
        let g2 = c2.lock(TIMEOUT_IMMEDIATE).expect("can't lock c2");
        drop(g1);
        drop(g2);
    }

    #[test]
    fn same_segments_resolve_to_same_nodes() {
        let rl = locker();
        let first = rl.get(&["x", "y"]);
        let second = rl.get(&["x", "y"]);
        let guard = first.lock(TIMEOUT_IMMEDIATE).expect("can't lock");
        assert!(second.lock(TIMEOUT_IMMEDIATE).is_none());
        drop(guard);
    }

    #[test]
    fn rollback_releases_ancestors_on_failure() {
        let rl = locker();
        let blocker = rl.get(&["a", "b", "c"]);
        let guard = blocker.lock(TIMEOUT_IMMEDIATE).expect("can't lock");
        // This request read-locks "a" and "b" and then fails on "c"; the
        // rollback must leave "a" and "b" free for a writer.
        let loser = rl.get(&["a", "b", "c"]);
        assert!(loser.lock(TIMEOUT_IMMEDIATE).is_none());
        drop(guard);
        let parent = rl.get(&["a", "b"]);
        assert!(parent.lock(TIMEOUT_IMMEDIATE).is_some());
    }

    #[test]
    fn empty_path_never_locks() {
        let rl = locker();
        let empty = rl.get(&[]);
        assert!(empty.lock(TIMEOUT_IMMEDIATE).is_none());
        assert!(empty.rlock(TIMEOUT_IMMEDIATE).is_none());
    }

    // -----------------------------------------------------------------------
    // Reader/writer interplay across threads
    // -----------------------------------------------------------------------

    #[test]
    fn readers_and_parent_writer() {
        let rl = Arc::new(ResourceLocker::new());
        let readers = 64;
        let mut handles = Vec::new();
        for _ in 0..readers {
            let rl = Arc::clone(&rl);
            handles.push(thread::spawn(move || {
                let path = rl.get(&["a", "b", "c"]);
                if let Some(_g) = path.rlock(Duration::from_millis(200)) {
                    thread::sleep(Duration::from_millis(1));
                };
            }));
        }
        {
            let rl = Arc::clone(&rl);
            handles.push(thread::spawn(move || {
                let path = rl.get(&["a", "b"]);
                if let Some(_g) = path.lock(Duration::from_millis(500)) {
                    thread::sleep(Duration::from_millis(5));
                };
            }));
        }
        for h in handles {
            h.join().expect("thread should not panic");
        }
        // All guards are gone; the whole subtree must be writable again.
        let path = rl.get(&["a", "b", "c"]);
        assert!(path.lock(TIMEOUT_IMMEDIATE).is_some());
    }

    #[test]
    fn close_resets_the_tree() {
        let rl = locker();
        let before = rl.get(&["a", "b"]);
        let guard = before.lock(TIMEOUT_IMMEDIATE).expect("can't lock");
        rl.close();
        // Fresh nodes after close: the old guard refers to orphaned locks.
        let after = rl.get(&["a", "b"]);
        assert!(after.lock(TIMEOUT_IMMEDIATE).is_some());
        drop(guard);
    }

    #[test]
    fn request_names_are_diagnostic() {
        let rl = locker();
        let a = rl.get(&["s", "c", "1.0.0"]);
        let b = rl.get(&["s", "c", "1.0.0"]);
        assert!(a.name().starts_with("s/c/1.0.0("));
        assert_ne!(a.name(), b.name());
    }
}
