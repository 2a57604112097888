use crate::id::IdRef;
use std::collections::BTreeSet;

/// Cycle guard for the recursive shading builders.
///
/// An entity is entered when its builder starts and left when it returns.
/// While entered, any nested attempt to build it again is refused, so shared
/// or self-referencing materials, textures and node trees cannot recurse
/// forever. The set lives for one build pass only and is empty between
/// top-level builder calls.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    entered: BTreeSet<IdRef>,
}

impl VisitedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as being built. Returns `false` if it already is, in which
    /// case the caller must return immediately.
    pub fn enter(&mut self, id: IdRef) -> bool {
        self.entered.insert(id)
    }

    /// Clear the mark set by [`enter`](VisitedSet::enter).
    pub fn leave(&mut self, id: IdRef) {
        self.entered.remove(&id);
    }

    /// Returns `true` if `id` is currently being built.
    pub fn is_entered(&self, id: IdRef) -> bool {
        self.entered.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.entered.is_empty()
    }

    /// Drop every mark.
    pub fn clear(&mut self) {
        self.entered.clear();
    }
}
