use std::collections::HashSet;

/// Deduplicated, insertion-ordered set of detected class names.
///
/// First-seen order is display order. Membership is exact string equality.
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name`. Returns `false` if it was already present.
    pub fn add(&mut self, name: &str) -> bool {
        if self.seen.contains(name) {
            return false;
        }
        self.seen.insert(name.to_string());
        self.order.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_twice_grows_by_one() {
        let mut reg = ClassRegistry::new();
        assert!(reg.add("stop"));
        assert!(!reg.add("stop"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_preserves_first_seen_order() {
        let mut reg = ClassRegistry::new();
        for name in ["yield", "stop", "yield", "no entry", "stop"] {
            reg.add(name);
        }
        let names: Vec<_> = reg.iter().collect();
        assert_eq!(names, vec!["yield", "stop", "no entry"]);
    }

    #[test]
    fn test_membership_is_exact() {
        let mut reg = ClassRegistry::new();
        reg.add("Stop");
        assert!(reg.contains("Stop"));
        assert!(!reg.contains("stop"));
        assert!(!reg.contains("Stop "));
        assert!(reg.add("stop"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_clear_empties_and_allows_readding() {
        let mut reg = ClassRegistry::new();
        reg.add("stop");
        reg.clear();
        assert!(reg.is_empty());
        assert!(!reg.contains("stop"));
        assert!(reg.add("stop"));
    }
}
