use std::collections::HashSet;

/// Session-lifetime set of promotional item ids already shown.
///
/// Grows only; bounded by how many distinct items one user can see in a
/// session, which is small next to the catalog. Reset when the owning
/// controller's session ends.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    seen: HashSet<u32>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, id: u32) -> bool {
        self.seen.contains(&id)
    }

    /// Ids must be positive; zero is the "no id" sentinel upstream and is
    /// never registered.
    pub fn mark_seen(&mut self, id: u32) {
        if id == 0 {
            return;
        }

        self.seen.insert(id);
    }

    /// Exclusion list for server-side picks.
    pub fn snapshot(&self) -> Vec<u32> {
        self.seen.iter().copied().collect()
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_lookup() {
        let mut registry = DedupRegistry::new();

        assert!(!registry.has_seen(5));
        registry.mark_seen(5);
        assert!(registry.has_seen(5));
    }

    #[test]
    fn test_zero_is_never_registered() {
        let mut registry = DedupRegistry::new();

        registry.mark_seen(0);

        assert!(!registry.has_seen(0));
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_reset_clears() {
        let mut registry = DedupRegistry::new();

        registry.mark_seen(1);
        registry.mark_seen(2);
        registry.reset();

        assert!(!registry.has_seen(1));
        assert!(registry.snapshot().is_empty());
    }
}
