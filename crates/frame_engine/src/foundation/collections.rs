//! Handle types for the engine's arenas
//!
//! Game objects, components, physics actors and physics shapes live in
//! `SlotMap`s. Back-references between them are these typed keys, so a
//! destroyed object turns into a failed lookup instead of a dangling pointer.

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Handle to a game object owned by a `Scene`
    pub struct GameObjectId;

    /// Handle to a component owned by a `Scene`
    pub struct ComponentId;

    /// Handle to a simulated body owned by `Physics`
    pub struct ActorId;

    /// Handle to a collision shape owned by `Physics`
    pub struct ShapeId;
}

/// Unordered pair of keys stored in canonical (ascending) order
///
/// `OrderedPair::new(a, b) == OrderedPair::new(b, a)` for every `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderedPair<K: Ord + Copy> {
    first: K,
    second: K,
}

impl<K: Ord + Copy> OrderedPair<K> {
    /// Build the canonical pair
    pub fn new(a: K, b: K) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Lower key of the pair
    pub fn first(&self) -> K {
        self.first
    }

    /// Higher key of the pair
    pub fn second(&self) -> K {
        self.second
    }

    /// True if `key` is either member
    pub fn contains(&self, key: K) -> bool {
        self.first == key || self.second == key
    }

    /// The member that is not `key`
    pub fn other(&self, key: K) -> Option<K> {
        if self.first == key {
            Some(self.second)
        } else if self.second == key {
            Some(self.first)
        } else {
            None
        }
    }
}
