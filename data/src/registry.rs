use rustc_hash::FxHashMap;
use std::sync::Arc;

use wire::Sample;

/// Tracks the dynamically discovered series keys of one stream.
///
/// Keys are appended in first-seen order and never reordered or
/// removed: slot index doubles as the render/legend position, so a
/// key's visual style stays stable for the stream's lifetime.
#[derive(Debug, Default)]
pub struct SeriesRegistry {
    keys: Vec<Arc<str>>,
    index: FxHashMap<Arc<str>, usize>,
}

impl SeriesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Known keys in first-seen order.
    pub fn keys(&self) -> &[Arc<str>] {
        &self.keys
    }

    pub fn slot_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Intern `key`, returning its slot and whether it was new.
    pub fn intern(&mut self, key: &str) -> (usize, bool) {
        if let Some(&slot) = self.index.get(key) {
            return (slot, false);
        }

        let interned: Arc<str> = Arc::from(key);
        let slot = self.keys.len();
        self.keys.push(Arc::clone(&interned));
        self.index.insert(interned, slot);

        (slot, true)
    }

    /// Map a sample's keyed values onto per-slot positions, interning
    /// any keys seen for the first time. `slots` is a reusable scratch
    /// vector; on return its length equals `self.len()` and holds the
    /// sample's value per slot (`None` for keys absent this sample).
    ///
    /// Returns whether the sample introduced any new key, so consumers
    /// deriving render options from the key list know to rebuild them.
    pub fn resolve(&mut self, sample: &Sample, slots: &mut Vec<Option<f64>>) -> bool {
        let mut introduced = false;
        for (key, _) in &sample.values {
            let (_, new) = self.intern(key);
            introduced |= new;
        }

        slots.clear();
        slots.resize(self.keys.len(), None);
        for (key, value) in &sample.values {
            if let Some(&slot) = self.index.get(key.as_str()) {
                slots[slot] = Some(*value);
            }
        }

        introduced
    }
}
