//! Item registry: identifier → mounted element handle.
//!
//! View code receives an [`ElementSetter`] per item and calls it whenever the
//! item's root element mounts (`Some`) or unmounts (`None`). The setter holds
//! a weak handle, so it can be kept across re-renders and outlive the
//! controller without keeping anything alive.
//!
//! Every touched identifier is recorded in a dirty set; the controller drains
//! it to reconcile the host observer incrementally.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::{AHashMap, AHashSet};
use scrollspy_core::ItemId;

struct RegistryState<E> {
    entries: AHashMap<ItemId, E>,
    dirty: AHashSet<ItemId>,
    closed: bool,
}

/// Identifier → element map shared with the setters handed to views.
pub struct ItemRegistry<E> {
    state: Rc<RefCell<RegistryState<E>>>,
}

impl<E: Clone> ItemRegistry<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(RegistryState {
                entries: AHashMap::new(),
                dirty: AHashSet::new(),
                closed: false,
            })),
        }
    }

    /// Setter for `id`'s element.
    ///
    /// Setters for the same id are interchangeable; asking again on every
    /// render is fine.
    #[must_use]
    pub fn setter(&self, id: impl Into<ItemId>) -> ElementSetter<E> {
        ElementSetter {
            id: id.into(),
            state: Rc::downgrade(&self.state),
        }
    }

    /// Element currently mounted for `id`.
    #[must_use]
    pub fn lookup(&self, id: &ItemId) -> Option<E> {
        self.state.borrow().entries.get(id).cloned()
    }

    /// Whether `id` has a mounted element.
    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.state.borrow().entries.contains_key(id)
    }

    /// Number of mounted elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Whether no element is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    /// Copy of all entries, in no particular order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(ItemId, E)> {
        self.state
            .borrow()
            .entries
            .iter()
            .map(|(id, element)| (id.clone(), element.clone()))
            .collect()
    }

    /// Drain identifiers touched since the last call.
    pub fn take_dirty(&self) -> Vec<ItemId> {
        self.state.borrow_mut().dirty.drain().collect()
    }

    /// Drop every entry and turn all outstanding setters into no-ops.
    pub fn close(&self) {
        let mut state = self.state.borrow_mut();
        state.entries.clear();
        state.dirty.clear();
        state.closed = true;
    }

    /// Whether [`Self::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }
}

impl<E: Clone> Default for ItemRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ItemRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ItemRegistry")
            .field("len", &state.entries.len())
            .field("dirty", &state.dirty.len())
            .field("closed", &state.closed)
            .finish()
    }
}

/// Per-item element setter handed to view code.
pub struct ElementSetter<E> {
    id: ItemId,
    state: Weak<RefCell<RegistryState<E>>>,
}

impl<E> ElementSetter<E> {
    /// Identifier this setter registers.
    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Record the item's element: `Some` inserts or overwrites, `None`
    /// removes. No-op once the registry is closed or dropped.
    pub fn set(&self, element: Option<E>) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.borrow_mut();
        if state.closed {
            return;
        }
        match element {
            Some(element) => {
                state.entries.insert(self.id.clone(), element);
            }
            None => {
                if state.entries.remove(&self.id).is_none() {
                    return;
                }
            }
        }
        state.dirty.insert(self.id.clone());
    }

    /// Whether the owning registry is still live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        match self.state.upgrade() {
            Some(state) => {
                let closed = state.borrow().closed;
                !closed
            }
            None => false,
        }
    }
}

impl<E> Clone for ElementSetter<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            state: Weak::clone(&self.state),
        }
    }
}

impl<E> fmt::Debug for ElementSetter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementSetter")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}
