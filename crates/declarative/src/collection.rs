//! Ordered collections of named definitions

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Named definitions in document order.
///
/// Deserialises from a mapping and rejects duplicate names.
#[derive(Debug, Clone, PartialEq)]
pub struct Definitions<D> {
    entries: Vec<(String, D)>,
}

impl<D> Default for Definitions<D> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<D> Definitions<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition, keeping its position when replacing.
    pub fn insert(&mut self, name: impl Into<String>, definition: D) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = definition,
            None => self.entries.push((name, definition)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&D> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &D)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D> FromIterator<(String, D)> for Definitions<D> {
    fn from_iter<I: IntoIterator<Item = (String, D)>>(iter: I) -> Self {
        let mut definitions = Self::new();
        for (name, definition) in iter {
            definitions.insert(name, definition);
        }
        definitions
    }
}

impl<D: Serialize> Serialize for Definitions<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, definition) in &self.entries {
            map.serialize_entry(name, definition)?;
        }
        map.end()
    }
}

impl<'de, D: Deserialize<'de>> Deserialize<'de> for Definitions<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        struct DefinitionsVisitor<D>(PhantomData<D>);

        impl<'de, D: Deserialize<'de>> Visitor<'de> for DefinitionsVisitor<D> {
            type Value = Definitions<D>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of names to definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut definitions = Definitions::new();
                while let Some(name) = access.next_key::<String>()? {
                    if definitions.contains(&name) {
                        return Err(de::Error::custom(format!(
                            "duplicate definition name '{name}'"
                        )));
                    }
                    let definition = access.next_value()?;
                    definitions.entries.push((name, definition));
                }
                Ok(definitions)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Definitions::new())
            }
        }

        deserializer.deserialize_map(DefinitionsVisitor(PhantomData))
    }
}

/// A managed collection: definitions plus the unmanaged-deletion switch.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(bound(deserialize = "D: serde::Deserialize<'de>"))]
pub struct Collection<D> {
    /// Delete remote objects with no local definition.
    #[serde(default)]
    pub delete_unmanaged: bool,
    #[serde(default)]
    pub definitions: Definitions<D>,
}

impl<D> Default for Collection<D> {
    fn default() -> Self {
        Self {
            delete_unmanaged: false,
            definitions: Definitions::new(),
        }
    }
}
