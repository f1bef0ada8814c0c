// RustCanvas
// copyright zipxing@hotmail.com 2022~2024

//! This module implements a generational handle table
//! It hands out opaque ids for pooled records (textures, surfaces)
//! and detects use-after-free: a stale handle left over from a removed
//! record never resolves to the slot's new occupant
//!
//! render::gl::graphics keeps one table per resource kind

/// opaque id packing (slot index, generation)
/// generation lives in the low 7 bits and wraps mod 128,
/// the slot index is stored off by one so the raw value 0
/// never denotes a live record
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct Handle(u32);

const GENERATION_BITS: u32 = 7;
const GENERATION_MASK: u32 = (1 << GENERATION_BITS) - 1;

impl Handle {
    /// the null handle, invalid forever
    pub const NONE: Handle = Handle(0);

    fn pack(index: usize, generation: u8) -> Self {
        Handle(((index as u32 + 1) << GENERATION_BITS) | (generation as u32 & GENERATION_MASK))
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    pub fn index(&self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some((self.0 >> GENERATION_BITS) as usize - 1)
        }
    }

    pub fn generation(&self) -> u8 {
        (self.0 & GENERATION_MASK) as u8
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn from_raw(raw: u32) -> Self {
        Handle(raw)
    }
}

struct Slot<T> {
    value: Option<T>,
    generation: u8,
}

/// pooled records addressed by generational handles
/// removal bumps the slot generation and pushes the slot on a
/// last-in-first-out free list, so the freshest hole is reused first
/// and stale handles are caught by the generation check
pub struct ResTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> ResTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(16),
            free: vec![],
        }
    }

    /// put a record in the table, returns its handle
    pub fn add(&mut self, value: T) -> Handle {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.value = Some(value);
                Handle::pack(index, slot.generation)
            }
            None => {
                let index = self.slots.len();
                self.slots.push(Slot {
                    value: Some(value),
                    generation: 0,
                });
                Handle::pack(index, 0)
            }
        }
    }

    /// take a record out of the table
    /// a null or stale handle is a no-op returning None,
    /// the caller can not tell "never existed" from "already deleted"
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let index = handle.index()?;
        let slot = self.slots.get_mut(index)?;
        if slot.value.is_none() || slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take();
        slot.generation = (slot.generation + 1) & GENERATION_MASK as u8;
        self.free.push(index);
        value
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let index = handle.index()?;
        let slot = self.slots.get(index)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let index = handle.index()?;
        let slot = self.slots.get_mut(index)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// empty the table, handing every live record back for teardown
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = vec![];
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(v) = slot.value.take() {
                slot.generation = (slot.generation + 1) & GENERATION_MASK as u8;
                self.free.push(index);
                values.push(v);
            }
        }
        values
    }
}

impl<T> Default for ResTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_round_trips_records() {
        let mut table: ResTable<u64> = ResTable::new();
        let h = table.add(77);
        assert!(!h.is_none());
        assert_eq!(table.get(h), Some(&77));
        assert_eq!(table.remove(h), Some(77));
        assert_eq!(table.get(h), None);
        assert_eq!(table.remove(h), None);
    }

    #[test]
    fn it_rejects_the_null_handle() {
        let mut table: ResTable<u64> = ResTable::new();
        table.add(1);
        assert_eq!(table.get(Handle::NONE), None);
        assert_eq!(table.remove(Handle::NONE), None);
    }

    #[test]
    fn it_reuses_the_freshest_slot_first() {
        let mut table: ResTable<u64> = ResTable::new();
        let a = table.add(1);
        let b = table.add(2);
        table.remove(a);
        table.remove(b);
        let c = table.add(3);
        // b's slot was freed last, so c takes it
        assert_eq!(c.index(), b.index());
        assert_ne!(c.generation(), b.generation());
    }

    #[test]
    fn stale_handles_never_resolve_to_a_new_occupant() {
        let mut table: ResTable<u64> = ResTable::new();
        let a = table.add(1);
        table.remove(a);
        let b = table.add(2);
        assert_eq!(a.index(), b.index());
        assert_eq!(table.get(a), None);
        assert_eq!(table.get(b), Some(&2));
    }

    #[test]
    fn generation_wraps_mod_128() {
        let mut table: ResTable<u64> = ResTable::new();
        let first = table.add(0);
        table.remove(first);
        for i in 0..127 {
            let h = table.add(i);
            assert_eq!(h.index(), first.index());
            table.remove(h);
        }
        let wrapped = table.add(9);
        assert_eq!(wrapped.generation(), first.generation());
        // the raw ids collide after 128 reuses
        assert_eq!(wrapped.raw(), first.raw());
    }

    #[test]
    fn drain_empties_and_invalidates() {
        let mut table: ResTable<u64> = ResTable::new();
        let a = table.add(1);
        let b = table.add(2);
        let mut vs = table.drain();
        vs.sort();
        assert_eq!(vs, vec![1, 2]);
        assert!(table.is_empty());
        assert_eq!(table.get(a), None);
        assert_eq!(table.get(b), None);
    }
}
