//! Fixed-capacity set of borrowed names.
//!
//! Used while merging to remember which names were already written. The set
//! never owns a name: every slot borrows bytes that live inside one of the
//! source containers for the duration of the merge.
//!
//! Open addressing with FNV-1a hashing and linear probing. The slot count is
//! a power of two fixed at construction; the set never grows.

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 14695981039346656037;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 1099511628211;

/// Default slot count.
pub const DEFAULT_CAPACITY: usize = 1024;

/// FNV-1a hash of `bytes`.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Outcome of probing for a name.
enum Probe {
    /// The name sits in this slot.
    Found,
    /// The name is absent; this is the first free slot on its probe path.
    Vacant(usize),
    /// The name is absent and every slot is taken.
    Full,
}

/// A bounded open-addressing set of borrowed byte strings.
#[derive(Debug, Clone)]
pub struct NameSet<'a> {
    slots: Box<[Option<&'a [u8]>]>,
    len: usize,
}

impl<'a> NameSet<'a> {
    /// Create a set with at least `capacity` slots, rounded up to a power
    /// of two.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            slots: vec![None; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of names stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no name is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `name` is in the set.
    pub fn contains(&self, name: &[u8]) -> bool {
        matches!(self.probe(name), Probe::Found)
    }

    /// Add `name`, returning `false` if it was already present.
    ///
    /// # Panics
    ///
    /// Panics if the set is full and `name` is not in it.
    pub fn insert(&mut self, name: &'a [u8]) -> bool {
        match self.probe(name) {
            Probe::Found => false,
            Probe::Vacant(slot) => {
                self.slots[slot] = Some(name);
                self.len += 1;
                true
            }
            Probe::Full => panic!(
                "name set full: all {} slots taken; raise the name capacity",
                self.capacity()
            ),
        }
    }

    fn probe(&self, name: &[u8]) -> Probe {
        let mask = self.slots.len() - 1;
        let mut slot = fnv1a(name) as usize & mask;

        for _ in 0..self.slots.len() {
            match self.slots[slot] {
                None => return Probe::Vacant(slot),
                Some(stored) if stored == name => return Probe::Found,
                Some(_) => slot = (slot + 1) & mask,
            }
        }
        Probe::Full
    }
}

impl Default for NameSet<'_> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a(b""), FNV_OFFSET_BASIS);
        assert_eq!(fnv1a(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_insert_and_contains() {
        let mut set = NameSet::with_capacity(8);
        assert!(set.insert(b"area03_gimmickset.set.xml"));
        assert!(set.insert(b"system.set.xml"));
        assert!(!set.insert(b"system.set.xml"));
        assert_eq!(set.len(), 2);
        assert!(set.contains(b"area03_gimmickset.set.xml"));
        assert!(!set.contains(b"area03_gimmickset.set"));
    }

    #[test]
    fn test_capacity_rounds_up() {
        assert_eq!(NameSet::with_capacity(1000).capacity(), 1024);
        assert_eq!(NameSet::with_capacity(0).capacity(), 1);
        assert_eq!(NameSet::default().capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_fills_every_slot_with_wraparound() {
        let names: Vec<Vec<u8>> = (0..16).map(|i| format!("name{}", i).into_bytes()).collect();
        let mut set = NameSet::with_capacity(16);
        for name in &names {
            assert!(set.insert(name));
        }
        assert_eq!(set.len(), 16);
        for name in &names {
            assert!(set.contains(name));
        }
        assert!(!set.contains(b"absent"));
    }

    #[test]
    #[should_panic(expected = "name set full")]
    fn test_full_set_panics() {
        let mut set = NameSet::with_capacity(2);
        set.insert(b"a");
        set.insert(b"b");
        set.insert(b"c");
    }
}
