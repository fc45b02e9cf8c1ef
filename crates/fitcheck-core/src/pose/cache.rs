use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::ImageRef;

/// Generated images for one outfit state, keyed by pose instruction.
///
/// Iteration follows insertion order, not catalog order: the "first
/// available" image used as a reference for new poses is the one cached
/// earliest. Serialized as a JSON object whose key order is preserved in
/// both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoseCache {
    entries: Vec<(String, ImageRef)>,
}

impl PoseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding a single entry.
    pub fn with_entry(pose: impl Into<String>, image: ImageRef) -> Self {
        Self {
            entries: vec![(pose.into(), image)],
        }
    }

    pub fn get(&self, pose: &str) -> Option<&ImageRef> {
        self.entries
            .iter()
            .find(|(key, _)| key == pose)
            .map(|(_, image)| image)
    }

    pub fn contains(&self, pose: &str) -> bool {
        self.get(pose).is_some()
    }

    /// Cache `image` under `pose`.
    ///
    /// A new pose is appended; an existing pose keeps its position and its
    /// previous image is returned.
    pub fn insert(&mut self, pose: impl Into<String>, image: ImageRef) -> Option<ImageRef> {
        let pose = pose.into();
        match self.entries.iter_mut().find(|(key, _)| *key == pose) {
            Some((_, slot)) => Some(std::mem::replace(slot, image)),
            None => {
                self.entries.push((pose, image));
                None
            }
        }
    }

    /// The earliest cached entry.
    pub fn first(&self) -> Option<(&str, &ImageRef)> {
        self.entries
            .first()
            .map(|(pose, image)| (pose.as_str(), image))
    }

    /// Cached pose keys in insertion order.
    pub fn poses(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(pose, _)| pose.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageRef)> {
        self.entries.iter().map(|(pose, image)| (pose.as_str(), image))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PoseCache {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (pose, image) in &self.entries {
            map.serialize_entry(pose, image)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PoseCache {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PoseCacheVisitor;

        impl<'de> Visitor<'de> for PoseCacheVisitor {
            type Value = PoseCache;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of pose instruction to image reference")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PoseCache, A::Error> {
                let mut cache = PoseCache::new();
                while let Some((pose, image)) = access.next_entry::<String, ImageRef>()? {
                    cache.insert(pose, image);
                }
                Ok(cache)
            }
        }

        deserializer.deserialize_map(PoseCacheVisitor)
    }
}
