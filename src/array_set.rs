use std::collections::HashMap;

/// An ordered table of strings with O(1) membership and index lookup.
///
/// Each distinct string resolves to the index of its first occurrence.
/// Duplicates can be admitted explicitly; they take their own slot in the
/// table but never become the index a lookup resolves to, which keeps the
/// slots aligned with tables read from an existing source map.
#[derive(Debug, Clone, Default)]
pub struct ArraySet {
    indices: HashMap<String, u32>,
    array: Vec<String>,
}

impl ArraySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `values`, applying one duplicate policy to all of them.
    pub fn from_array<I, S>(values: I, allow_duplicates: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for value in values {
            set.add(value.as_ref(), allow_duplicates);
        }
        set
    }

    /// Adds `value` and returns the index it resolves to.
    pub fn add(&mut self, value: &str, allow_duplicates: bool) -> u32 {
        match self.indices.get(value) {
            Some(&idx) => {
                if allow_duplicates {
                    self.array.push(value.to_owned());
                }
                idx
            }
            None => {
                let idx = self.array.len() as u32;
                self.array.push(value.to_owned());
                self.indices.insert(value.to_owned(), idx);
                idx
            }
        }
    }

    #[inline]
    pub fn has(&self, value: &str) -> bool {
        self.indices.contains_key(value)
    }

    /// Returns the index of the first occurrence of `value`.
    #[inline]
    pub fn index_of(&self, value: &str) -> Option<u32> {
        self.indices.get(value).copied()
    }

    #[inline]
    pub fn at(&self, idx: u32) -> Option<&str> {
        self.array.get(idx as usize).map(String::as_str)
    }

    /// Number of slots, duplicates included.
    #[inline]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
        self.array.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.array.clone()
    }
}
