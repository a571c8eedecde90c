//! The table of source filenames and the filenames they're copied to.

use crate::filename::target_filename;
use serde::{de, ser, Deserialize, Serialize};
use std::{fmt, fs::File, io, path::Path};

/// A single file to copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub original: String,
    pub target: String,
}

impl Entry {
    pub fn new<T, U>(original: T, target: U) -> Self
    where
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            original: original.into(),
            target: target.into(),
        }
    }

    /// Create an entry whose target is derived from the original filename.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use namecopy::mapping::Entry;
    /// let entry = Entry::derived("Donát_Bali-papp.jpeg");
    /// assert_eq!("donat_bali_papp.jpg", entry.target);
    /// ```
    pub fn derived<T: Into<String>>(original: T) -> Self {
        let original = original.into();
        let target = target_filename(&original);
        Self { original, target }
    }
}

/// An ordered mapping of source filenames to target filenames.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameMapping {
    entries: Vec<Entry>,
}

impl NameMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference images that ship with the site.
    pub fn builtin() -> Self {
        Self::new()
            .with_entry(Entry::new("András_Barasits.jpeg", "andras_barasits.jpg"))
            .with_entry(Entry::new("Donát_Bali-papp.jpeg", "donat_bali_papp.jpg"))
    }

    /// Load a mapping from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MappingError> {
        let file = File::open(path).map_err(MappingError::Io)?;
        serde_yaml::from_reader(file).map_err(MappingError::Yaml)
    }

    pub fn with_entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains(&self, original: &str) -> bool {
        self.entries.iter().any(|e| e.original == original)
    }
}

impl Serialize for NameMapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        use ser::SerializeMap;

        let mut state = serializer.serialize_map(Some(self.len()))?;
        for entry in self.entries() {
            state.serialize_entry(&entry.original, &entry.target)?;
        }
        state.end()
    }
}

impl<'de> Deserialize<'de> for NameMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = NameMapping;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of source filenames to target filenames")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: de::MapAccess<'de>,
            {
                let mut mapping = NameMapping::new();

                while let Some((original, target)) = map.next_entry::<String, Option<String>>()? {
                    if mapping.contains(&original) {
                        return Err(de::Error::custom(format!(
                            "duplicate source filename `{}`",
                            original
                        )));
                    }
                    let entry = match target {
                        Some(target) => Entry::new(original, target),
                        None => Entry::derived(original),
                    };
                    mapping.entries.push(entry);
                }

                Ok(mapping)
            }
        }

        deserializer.deserialize_map(Visitor)
    }
}

#[derive(Debug)]
pub enum MappingError {
    Io(io::Error),
    Yaml(serde_yaml::Error),
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MappingError::Io(e) => write!(f, "couldn't read mapping: {}", e),
            MappingError::Yaml(e) => write!(f, "invalid mapping: {}", e),
        }
    }
}

impl std::error::Error for MappingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MappingError::Io(e) => Some(e),
            MappingError::Yaml(e) => Some(e),
        }
    }
}
