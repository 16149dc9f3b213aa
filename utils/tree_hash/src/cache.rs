use crate::{HashFn, TreeHash};
use ethereum_types::H256;
use std::cell::RefCell;

/// A carrier that opts a value into per-value hash caching.
///
/// The cached root is invalidated whenever the value is reached through
/// [`Cached::get_mut`]; reading through [`Cached::get`] never invalidates it.
pub struct Cached<T: TreeHash> {
    value: T,
    cached_root: RefCell<Option<H256>>,
}

impl<T: TreeHash> Cached<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            cached_root: RefCell::new(None),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.cached_root.get_mut().take();
        &mut self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Returns the tree-hash root, recomputing it only if it was invalidated
    /// since the last call.
    pub fn root(&self, hash_fn: &dyn HashFn) -> H256 {
        if let Some(root) = *self.cached_root.borrow() {
            return root;
        }

        let root = self.value.tree_hash_root(hash_fn);
        *self.cached_root.borrow_mut() = Some(root);
        root
    }
}
