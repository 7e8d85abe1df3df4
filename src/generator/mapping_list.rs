use crate::mapping::Mapping;
use std::borrow::Cow;

/// Mappings in insertion order, which remembers whether they are already
/// ordered by generated position so that serializing can skip the sort.
#[derive(Debug, Clone)]
pub(crate) struct MappingList {
    array: Vec<Mapping>,
    sorted: bool,
}

impl Default for MappingList {
    fn default() -> Self {
        Self {
            array: Vec::new(),
            sorted: true,
        }
    }
}

impl MappingList {
    pub fn add(&mut self, mapping: Mapping) {
        if let Some(last) = self.array.last() {
            if mapping.generated < last.generated {
                self.sorted = false;
            }
        }
        self.array.push(mapping);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Mappings in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Mapping> {
        self.array.iter()
    }

    /// Mappings in insertion order, for in-place rewrites that keep every
    /// generated position unchanged.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Mapping> {
        self.array.iter_mut()
    }

    /// Mappings ordered by generated position.
    pub fn sorted(&self) -> Cow<'_, [Mapping]> {
        if self.sorted {
            Cow::Borrowed(&self.array)
        } else {
            let mut sorted = self.array.clone();
            sorted.sort();
            Cow::Owned(sorted)
        }
    }
}
