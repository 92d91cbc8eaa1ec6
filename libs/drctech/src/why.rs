//! Interned rule explanations.

use arcstr::ArcStr;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A handle to an explanation stored in a [`WhyTable`].
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct WhyId(u32);

impl WhyId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The distinct explanation strings of a style.
///
/// Each string is stored once no matter how many rules refer to it.
#[derive(Clone, Debug, Default)]
pub struct WhyTable {
    strings: IndexSet<ArcStr>,
}

impl WhyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `why`, adding it if it is new.
    pub fn intern(&mut self, why: &str) -> WhyId {
        if let Some(idx) = self.strings.get_index_of(why) {
            return WhyId(idx as u32);
        }
        let (idx, _) = self.strings.insert_full(ArcStr::from(why));
        WhyId(idx as u32)
    }

    /// The explanation for `id`.
    ///
    /// Returns an empty string for a handle from another table.
    pub fn get(&self, id: WhyId) -> &str {
        self.strings
            .get_index(id.index())
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// The number of distinct explanations.
    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArcStr> {
        self.strings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let mut whys = WhyTable::new();
        let a = whys.intern("m1 width < 3");
        let b = whys.intern("m1 spacing < 3");
        assert_eq!(whys.intern("m1 width < 3"), a);
        assert_ne!(a, b);
        assert_eq!(whys.len(), 2);
        assert_eq!(whys.get(b), "m1 spacing < 3");
    }
}
