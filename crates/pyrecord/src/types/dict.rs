use ahash::AHashMap;
use smallvec::SmallVec;

use crate::{exception::RunResult, value::Value};

/// Python dict type preserving insertion order.
///
/// # Storage Strategy
/// A dense `Vec` of `(key, value)` entries preserves insertion order (matching
/// Python 3.7+ behavior). An index maps each key's Python hash to the positions
/// of the entries sharing that hash, so lookups hash once and then compare with
/// Python equality only against colliding keys.
///
/// Keys must be hashable: inserting a list or a record with `__hash__ = None`
/// fails with `TypeError: unhashable type`.
#[derive(Debug, Default, Clone)]
pub struct Dict {
    /// Dense entries in insertion order.
    entries: Vec<(Value, Value)>,
    /// Key hash -> indices into `entries`.
    index: AHashMap<i64, SmallVec<[usize; 2]>>,
}

impl Dict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dict from pairs; later duplicates overwrite earlier values in place.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> RunResult<Self> {
        let mut dict = Self::new();
        for (key, value) in pairs {
            dict.set(key, value)?;
        }
        Ok(dict)
    }

    fn find(&self, key: &Value, hash: i64) -> RunResult<Option<usize>> {
        let Some(slots) = self.index.get(&hash) else {
            return Ok(None);
        };
        for &slot in slots {
            let existing = &self.entries[slot].0;
            if existing.is(key) || existing.py_eq(key)? {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }

    /// Looks up `key`, returning a clone of the stored value.
    pub fn get(&self, key: &Value) -> RunResult<Option<Value>> {
        let hash = key.py_hash()?;
        Ok(self.find(key, hash)?.map(|slot| self.entries[slot].1.clone()))
    }

    /// Inserts or replaces `key`, returning the previous value.
    pub fn set(&mut self, key: Value, value: Value) -> RunResult<Option<Value>> {
        let hash = key.py_hash()?;
        if let Some(slot) = self.find(&key, hash)? {
            return Ok(Some(std::mem::replace(&mut self.entries[slot].1, value)));
        }
        self.index.entry(hash).or_default().push(self.entries.len());
        self.entries.push((key, value));
        Ok(None)
    }

    /// Removes `key`, returning its value. Later entries keep their relative order.
    pub fn pop(&mut self, key: &Value) -> RunResult<Option<Value>> {
        let hash = key.py_hash()?;
        let Some(slot) = self.find(key, hash)? else {
            return Ok(None);
        };
        let (_, value) = self.entries.remove(slot);
        self.index.retain(|_, slots| {
            slots.retain(|i| *i != slot);
            for i in slots.iter_mut() {
                if *i > slot {
                    *i -= 1;
                }
            }
            !slots.is_empty()
        });
        Ok(Some(value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Python dict equality: same keys mapping to equal values, order ignored.
    pub fn py_eq(&self, other: &Self) -> RunResult<bool> {
        if self.len() != other.len() {
            return Ok(false);
        }
        for (key, value) in &self.entries {
            match other.get(key)? {
                Some(theirs) if value.is(&theirs) || value.py_eq(&theirs)? => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }
}
