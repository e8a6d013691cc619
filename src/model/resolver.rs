//! Identity resolution across renames.
//!
//! Entity identity is always the *current* path. Historical paths are
//! resolved by following the rename map until a known current entity is
//! reached. The map is not transitive by construction, so resolution
//! follows chains hop by hop, bounded to tolerate cyclic renames
//! (A -> B -> A) that occur in real histories.

use std::collections::{HashMap, HashSet};

pub struct IdentityResolver {
    current_entities: HashSet<String>,
    rename_map: HashMap<String, String>,
    hop_bound: usize,
}

impl IdentityResolver {
    pub fn new(current_entities: impl IntoIterator<Item = String>, hop_bound: usize) -> Self {
        Self {
            current_entities: current_entities.into_iter().collect(),
            rename_map: HashMap::new(),
            hop_bound,
        }
    }

    /// Records `old_path -> new_path`. Called once per commit modification
    /// whose old and new paths differ.
    pub fn record_rename(&mut self, old_path: &str, new_path: &str) {
        self.rename_map
            .insert(old_path.to_string(), new_path.to_string());
    }

    /// Resolves a historical path to its current path, or `None` when the
    /// path can never be mapped to a current entity (deleted and never
    /// resurrected, or trapped in a rename cycle). `None` means "exclude
    /// this modification from the model", not an error.
    pub fn resolve<'a>(&'a self, historical_path: &'a str) -> Option<&'a str> {
        let mut path = historical_path;
        let mut hops = 0;

        while !self.current_entities.contains(path) {
            if hops >= self.hop_bound {
                return None;
            }
            path = self.rename_map.get(path)?;
            hops += 1;
        }
        Some(path)
    }

    pub fn is_current(&self, path: &str) -> bool {
        self.current_entities.contains(path)
    }

    pub fn current_entities(&self) -> impl Iterator<Item = &str> {
        self.current_entities.iter().map(String::as_str)
    }

    pub fn rename_count(&self) -> usize {
        self.rename_map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(entities: &[&str]) -> IdentityResolver {
        IdentityResolver::new(entities.iter().map(|s| s.to_string()), 50)
    }

    #[test]
    fn current_path_resolves_to_itself() {
        let r = resolver(&["src/app.py"]);
        assert_eq!(r.resolve("src/app.py"), Some("src/app.py"));
    }

    #[test]
    fn follows_rename_chain_to_terminal_path() {
        let mut r = resolver(&["new.py"]);
        r.record_rename("old.py", "mid.py");
        r.record_rename("mid.py", "new.py");
        assert_eq!(r.resolve("old.py"), Some("new.py"));
        assert_eq!(r.resolve("mid.py"), Some("new.py"));
    }

    #[test]
    fn deleted_path_is_absent() {
        let mut r = resolver(&["kept.py"]);
        r.record_rename("old.py", "gone.py");
        assert_eq!(r.resolve("gone.py"), None);
        assert_eq!(r.resolve("old.py"), None);
        assert_eq!(r.resolve("never_existed.py"), None);
    }

    #[test]
    fn cyclic_chain_terminates_within_hop_bound() {
        let mut r = resolver(&["unrelated.py"]);
        r.record_rename("a.py", "b.py");
        r.record_rename("b.py", "a.py");
        assert_eq!(r.resolve("a.py"), None);
        assert_eq!(r.resolve("b.py"), None);
    }

    #[test]
    fn chain_longer_than_bound_is_absent() {
        let mut r = IdentityResolver::new(["end.py".to_string()], 3);
        r.record_rename("p0.py", "p1.py");
        r.record_rename("p1.py", "p2.py");
        r.record_rename("p2.py", "p3.py");
        r.record_rename("p3.py", "end.py");
        // Four hops needed, only three allowed.
        assert_eq!(r.resolve("p0.py"), None);
        assert_eq!(r.resolve("p1.py"), Some("end.py"));
    }
}
