//! Session wardrobe: the garments available to apply.
//!
//! The default collection is defined in `default_wardrobe.toml` and embedded
//! in the binary at compile time. Garments applied during a session are
//! appended after it, and "start over" restores the defaults.

use serde::Deserialize;

use crate::model::Garment;

/// Container for deserializing the embedded TOML file.
#[derive(Debug, Deserialize)]
struct WardrobeFile {
    garments: Vec<Garment>,
}

/// The embedded default wardrobe TOML.
static DEFAULT_WARDROBE_TOML: &str = include_str!("default_wardrobe.toml");

/// Load the default garment collection from the embedded library.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed. The file is compiled into the
/// binary, so a build that passes its tests cannot hit this.
pub fn default_wardrobe() -> Vec<Garment> {
    let file: WardrobeFile =
        toml::from_str(DEFAULT_WARDROBE_TOML).expect("embedded default_wardrobe.toml is invalid");
    file.garments
}

/// Ordered garment collection, unique by id. First-seen wins.
#[derive(Debug, Clone)]
pub struct WardrobeSet {
    items: Vec<Garment>,
    defaults: Vec<Garment>,
}

impl WardrobeSet {
    /// A wardrobe seeded with `defaults`. Duplicate ids among the defaults
    /// collapse to the first occurrence.
    pub fn new(defaults: Vec<Garment>) -> Self {
        let mut set = Self {
            items: Vec::with_capacity(defaults.len()),
            defaults: Vec::new(),
        };
        for garment in defaults {
            set.add(garment);
        }
        set.defaults = set.items.clone();
        set
    }

    /// A wardrobe seeded with the embedded default collection.
    pub fn with_defaults() -> Self {
        Self::new(default_wardrobe())
    }

    /// Insert `garment` unless a garment with the same id is present.
    /// Returns `true` when it was inserted.
    pub fn add(&mut self, garment: Garment) -> bool {
        if self.contains(&garment.id) {
            return false;
        }
        self.items.push(garment);
        true
    }

    /// Drop session additions, restoring the initial collection.
    pub fn reset(&mut self) {
        self.items = self.defaults.clone();
    }

    pub fn items(&self) -> &[Garment] {
        &self.items
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Garment> {
        self.items.iter().find(|g| g.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for WardrobeSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn garment(id: &str, name: &str) -> Garment {
        Garment::new(id, name, format!("https://img/{id}.png"))
    }

    #[test]
    fn embedded_defaults_parse_with_unique_ids() {
        let defaults = default_wardrobe();
        assert!(!defaults.is_empty());

        let set = WardrobeSet::new(defaults.clone());
        assert_eq!(set.len(), defaults.len());
    }

    #[test]
    fn add_is_first_seen_wins() {
        let mut set = WardrobeSet::new(vec![]);
        assert!(set.add(garment("tee", "Tee")));
        assert!(!set.add(garment("tee", "Renamed Tee")));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("tee").unwrap().name, "Tee");
    }

    #[test]
    fn add_preserves_insertion_order() {
        let mut set = WardrobeSet::new(vec![garment("a", "A")]);
        set.add(garment("c", "C"));
        set.add(garment("b", "B"));

        let ids: Vec<_> = set.items().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn reset_discards_session_additions() {
        let mut set = WardrobeSet::new(vec![garment("a", "A")]);
        set.add(garment("b", "B"));

        set.reset();

        assert_eq!(set.len(), 1);
        assert!(set.contains("a"));
        assert!(!set.contains("b"));
    }

    #[test]
    fn duplicate_defaults_collapse() {
        let set = WardrobeSet::new(vec![garment("a", "First"), garment("a", "Second")]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").unwrap().name, "First");
    }
}
