use crate::component::ComponentId;
use crate::config::Config;
use crate::store::Snapshot;
use crate::tree::ComponentTree;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// A component tree shared between threads.
///
/// Mutations take the write lock; queries and snapshots take the read lock, so any number of
/// readers can look at the tree at once. Child lists handed out by
/// [`children_snapshot`](Self::children_snapshot) stay valid (and unchanged) after the lock is
/// released.
#[derive(Clone)]
pub struct Session {
    tree: Arc<RwLock<ComponentTree>>,
}

impl Session {
    /// Creates a new session with a fresh tree.
    pub fn new(config: Config) -> Session {
        Session::from_tree(ComponentTree::with_config(config))
    }

    pub fn from_tree(tree: ComponentTree) -> Session {
        Session {
            tree: Arc::new(RwLock::new(tree)),
        }
    }

    /// The shared tree itself, for callers that manage locking on their own.
    pub fn handle(&self) -> Arc<RwLock<ComponentTree>> {
        Arc::clone(&self.tree)
    }

    pub fn read(&self) -> RwLockReadGuard<ComponentTree> {
        self.tree.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<ComponentTree> {
        self.tree.write()
    }

    /// Delivers all queued events.
    ///
    /// Handlers run while the session is read-locked, so they must not try to lock the session
    /// for writing; record what needs doing and apply it after `poll` returns.
    pub fn poll(&self) -> usize {
        let count = self.tree.read().dispatch_events();
        if count > 0 {
            log::trace!("dispatched {} events", count);
        }
        count
    }

    pub fn children_snapshot(&self, id: ComponentId) -> Snapshot {
        self.tree.read().children(id)
    }
}

#[test]
fn test_session_snapshots() {
    use crate::component::Component;
    use std::thread;

    let session = Session::new(Config::default());
    let app = session.read().application_frame();
    let first = {
        let mut tree = session.write();
        let a = tree.create(Component::new("a"));
        tree.add(app, a).unwrap();
        a
    };
    let before = session.children_snapshot(app);

    let writer = {
        let session = session.clone();
        thread::spawn(move || {
            for i in 0..16 {
                let mut tree = session.write();
                let c = tree.create(Component::new(format!("c{}", i)));
                tree.add(app, c).unwrap();
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let session = session.clone();
            thread::spawn(move || {
                for _ in 0..16 {
                    let children = session.children_snapshot(app);
                    assert_eq!(children.first(), Some(&first), "first child never moves");
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(*before, vec![first], "old snapshot is unchanged");
    assert_eq!(session.children_snapshot(app).len(), 17);
}
