//! Bounded heap arena.
//!
//! The heap is a fixed budget of slots handed out by bump allocation. Each
//! allocation gets an entry in the object table and is addressed through a
//! [`HeapRef`] handle into that table, never through a pointer. Allocation is
//! monotonic: nothing is reclaimed while the VM runs.

use core_types::{HeapRef, Value, VmConfig, VmError, WordWidth};

use crate::object::{ArrayKind, ObjectHeader, ObjectKind};

/// Slot arena using bump allocation.
#[derive(Debug, Clone)]
pub struct Arena {
    /// Backing storage, sized to the capacity up front
    slots: Vec<Value>,
    /// Next free slot (bump pointer)
    top: usize,
}

impl Arena {
    /// Creates an arena of `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Arena {
            slots: vec![Value::Null; capacity],
            top: 0,
        }
    }

    /// Reserves `count` contiguous slots and returns the first offset, or
    /// `None` if the arena cannot hold them. Nothing is reserved on failure.
    pub fn allocate(&mut self, count: usize) -> Option<usize> {
        if count > self.remaining() {
            return None;
        }
        let offset = self.top;
        self.top += count;
        Some(offset)
    }

    /// Number of slots handed out.
    pub fn used(&self) -> usize {
        self.top
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots still available.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.top
    }
}

/// Allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Successful allocations
    pub allocations: usize,
    /// Allocation requests that were refused
    pub failed_allocations: usize,
    /// Slots handed out so far
    pub slots_in_use: usize,
    /// Size of the largest single allocation
    pub largest_allocation: usize,
}

/// The VM heap: slot arena plus object table.
///
/// # Examples
///
/// ```
/// use memory_manager::Heap;
///
/// let mut heap = Heap::with_slot_capacity(4);
/// let a = heap.allocate(true, 3).unwrap();
/// assert_eq!(heap.free_slots(), 1);
/// assert!(heap.allocate(true, 2).is_err());
/// assert_eq!(heap.len(a).unwrap(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Heap {
    arena: Arena,
    objects: Vec<ObjectHeader>,
    slot_bytes: usize,
    stats: HeapStats,
}

/// Object table size is bounded by the 16-bit handle.
const MAX_OBJECTS: usize = u16::MAX as usize + 1;

impl Heap {
    /// Creates a heap of `heap_size` bytes with slots of one `word`.
    pub fn new(heap_size: usize, word: WordWidth) -> Self {
        Heap {
            arena: Arena::new(heap_size / word.bytes()),
            objects: Vec::new(),
            slot_bytes: word.bytes(),
            stats: HeapStats::default(),
        }
    }

    /// Creates a heap sized by the configuration.
    pub fn for_config(config: &VmConfig) -> Self {
        Self::new(config.heap_size, config.word)
    }

    /// Creates a heap holding exactly `slots` slots of 32-bit words.
    pub fn with_slot_capacity(slots: usize) -> Self {
        Self::new(slots * WordWidth::Word32.bytes(), WordWidth::Word32)
    }

    /// Reserves `slot_count` contiguous slots as an untyped block.
    ///
    /// With `zero_init` every slot reads as null/zero; otherwise the contents
    /// are unspecified until written. Fails without side effects when the
    /// remaining budget is too small.
    pub fn allocate(&mut self, zero_init: bool, slot_count: usize) -> Result<HeapRef, VmError> {
        self.allocate_kind(ObjectKind::Chunk, zero_init, slot_count)
    }

    /// Allocates a zero-initialised instance of a user class.
    pub fn allocate_object(&mut self, class_id: u16, fields: usize) -> Result<HeapRef, VmError> {
        self.allocate_kind(ObjectKind::Object { class_id }, true, fields)
    }

    /// Allocates a zero-initialised array.
    pub fn allocate_array(&mut self, kind: ArrayKind, len: usize) -> Result<HeapRef, VmError> {
        self.allocate_kind(ObjectKind::Array(kind), true, len)
    }

    fn allocate_kind(
        &mut self,
        kind: ObjectKind,
        zero_init: bool,
        slot_count: usize,
    ) -> Result<HeapRef, VmError> {
        let exhausted = |heap: &mut Heap| {
            heap.stats.failed_allocations += 1;
            VmError::HeapExhausted {
                requested: slot_count,
                available: heap.arena.remaining(),
            }
        };

        if self.objects.len() >= MAX_OBJECTS {
            return Err(exhausted(self));
        }
        let offset = match self.arena.allocate(slot_count) {
            Some(offset) => offset,
            None => return Err(exhausted(self)),
        };

        if zero_init {
            self.arena.slots[offset..offset + slot_count].fill(kind.zero_value());
        }

        let handle = HeapRef(self.objects.len() as u16);
        self.objects.push(ObjectHeader {
            offset,
            len: slot_count,
            kind,
        });

        self.stats.allocations += 1;
        self.stats.slots_in_use = self.arena.used();
        self.stats.largest_allocation = self.stats.largest_allocation.max(slot_count);
        Ok(handle)
    }

    /// Header of an allocated object.
    pub fn header(&self, r: HeapRef) -> Result<&ObjectHeader, VmError> {
        self.objects
            .get(r.index())
            .ok_or(VmError::InvalidReference { handle: r.0 })
    }

    /// Slot count of an object (element count for arrays).
    pub fn len(&self, r: HeapRef) -> Result<usize, VmError> {
        Ok(self.header(r)?.len)
    }

    /// Returns true if the handle was handed out by this heap.
    pub fn contains(&self, r: HeapRef) -> bool {
        r.index() < self.objects.len()
    }

    /// All slots of an object.
    pub fn slots(&self, r: HeapRef) -> Result<&[Value], VmError> {
        let h = *self.header(r)?;
        Ok(&self.arena.slots[h.offset..h.offset + h.len])
    }

    /// Reads one slot, bounds-checked against the object's slot count.
    pub fn load(&self, r: HeapRef, index: usize) -> Result<Value, VmError> {
        let h = self.header(r)?;
        if index >= h.len {
            return Err(VmError::SlotOutOfBounds { index, len: h.len });
        }
        Ok(self.arena.slots[h.offset + index])
    }

    /// Writes one slot, bounds-checked against the object's slot count.
    pub fn store(&mut self, r: HeapRef, index: usize, value: Value) -> Result<(), VmError> {
        let h = *self.header(r)?;
        if index >= h.len {
            return Err(VmError::SlotOutOfBounds { index, len: h.len });
        }
        self.arena.slots[h.offset + index] = value;
        Ok(())
    }

    /// Total capacity in slots.
    pub fn capacity_slots(&self) -> usize {
        self.arena.capacity()
    }

    /// Slots handed out.
    pub fn used_slots(&self) -> usize {
        self.arena.used()
    }

    /// Slots still available.
    pub fn free_slots(&self) -> usize {
        self.arena.remaining()
    }

    /// Bytes still available.
    pub fn free_bytes(&self) -> usize {
        self.free_slots() * self.slot_bytes
    }

    /// Size of one slot in bytes.
    pub fn slot_bytes(&self) -> usize {
        self.slot_bytes
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Allocation counters.
    pub fn stats(&self) -> HeapStats {
        self.stats
    }
}
