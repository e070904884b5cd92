//! The cycle-collection hook for reference-counted objects.

use crate::vanilla::ObjectRef;

/// Usage counters reported by [`Basket::statistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasketStatistics {
    pub current_residents: usize,
    pub total_taken: usize,
    pub total_collected: usize,
}

/// An opaque collection of objects that may participate in reference
/// cycles.
///
/// The basket holds one hard reference per resident. `collect`
/// reclaims residents for which the basket's reference is the last one
/// standing; `purge` reclaims everything. Collection only runs when
/// explicitly requested.
#[derive(Default)]
pub struct Basket {
    residents: Vec<ObjectRef>,
    total_taken: usize,
    total_collected: usize,
}

impl Basket {
    pub fn new() -> Self {
        Basket::default()
    }

    /// Register an object with the basket. Re-taking an object the
    /// basket already owns is a no-op.
    pub fn take(&mut self, object: ObjectRef) {
        if self.residents.iter().any(|r| r.same_object(&object)) {
            return;
        }
        self.residents.push(object);
        self.total_taken += 1;
    }

    /// Release an object from the basket without reclaiming it.
    pub fn drop_object(&mut self, object: &ObjectRef) -> bool {
        let before = self.residents.len();
        self.residents.retain(|r| !r.same_object(object));
        self.residents.len() != before
    }

    /// Reclaim residents whose only remaining owner is the basket.
    /// Returns the number reclaimed. Repeats until a pass frees
    /// nothing, so chains whose owners were themselves reclaimed fall
    /// out in one call.
    pub fn collect(&mut self) -> usize {
        let mut reclaimed = 0;
        loop {
            let before = self.residents.len();
            self.residents.retain(|r| r.handle_count() > 1);
            let freed = before - self.residents.len();
            if freed == 0 {
                break;
            }
            reclaimed += freed;
        }
        self.total_collected += reclaimed;
        reclaimed
    }

    /// Release every resident. Returns the number released.
    pub fn purge(&mut self) -> usize {
        let purged = self.residents.len();
        self.residents.clear();
        self.total_collected += purged;
        purged
    }

    pub fn statistics(&self) -> BasketStatistics {
        BasketStatistics {
            current_residents: self.residents.len(),
            total_taken: self.total_taken,
            total_collected: self.total_collected,
        }
    }
}
