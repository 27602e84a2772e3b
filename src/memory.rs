use crate::error::{VmError, VmResult};

/// Simulated RAM, addressed in words and carved into fixed-size frames.
pub struct PhysicalMemory {
    page_size: usize,
    data: Vec<u32>,
}

impl PhysicalMemory {
    /// Create a physical memory of `frames` frames, initialized to all zeros.
    pub fn new(frames: usize, page_size: usize) -> Self {
        PhysicalMemory {
            page_size,
            data: vec![0u32; frames * page_size],
        }
    }

    /// Read a word from physical memory.
    #[inline]
    pub fn read(&self, address: usize) -> u32 {
        self.data[address]
    }

    /// Write a word to physical memory.
    #[inline]
    pub fn write(&mut self, address: usize, value: u32) {
        self.data[address] = value;
    }

    /// The words of one frame.
    #[inline]
    pub fn frame(&self, frame: usize) -> &[u32] {
        let base = frame * self.page_size;
        &self.data[base..base + self.page_size]
    }

    /// The words of one frame, mutably (for bulk transfers from swap).
    #[inline]
    pub fn frame_mut(&mut self, frame: usize) -> &mut [u32] {
        let base = frame * self.page_size;
        &mut self.data[base..base + self.page_size]
    }

    /// Total size in words.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Simulated backing store: a bump allocator over fixed-size slots.
///
/// Slots are handed out in increasing order and never reclaimed; a page that
/// has been assigned a slot keeps it for the rest of the run, and reuse
/// happens only through the core map's cached-slot association.
pub struct SwapStore {
    page_size: usize,
    capacity: usize,
    next_slot: usize,
    data: Vec<u32>,
}

impl SwapStore {
    /// Create a swap store with room for `slots` slots, initialized to zeros.
    pub fn new(slots: usize, page_size: usize) -> Self {
        SwapStore {
            page_size,
            capacity: slots,
            next_slot: 0,
            data: vec![0u32; slots * page_size],
        }
    }

    /// Hand out the next unused slot.
    pub fn allocate(&mut self) -> VmResult<usize> {
        if self.next_slot == self.capacity {
            return Err(VmError::ResourceExhausted {
                capacity: self.capacity,
            });
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        Ok(slot)
    }

    /// Number of slots handed out so far.
    pub fn allocated(&self) -> usize {
        self.next_slot
    }

    /// Total slot capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The words stored in one slot.
    pub fn read_slot(&self, slot: usize) -> &[u32] {
        debug_assert!(slot < self.next_slot, "read of unallocated slot {slot}");
        let base = slot * self.page_size;
        &self.data[base..base + self.page_size]
    }

    /// Overwrite one slot with the given words (one frame's worth).
    pub fn write_slot(&mut self, slot: usize, words: &[u32]) {
        debug_assert!(slot < self.next_slot, "write to unallocated slot {slot}");
        debug_assert_eq!(words.len(), self.page_size);
        let base = slot * self.page_size;
        self.data[base..base + self.page_size].copy_from_slice(words);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_initialization() {
        let pm = PhysicalMemory::new(8, 4);
        assert_eq!(pm.len(), 32);
        // All memory starts zeroed
        assert_eq!(pm.read(0), 0);
        assert_eq!(pm.read(31), 0);
    }

    #[test]
    fn test_memory_read_write() {
        let mut pm = PhysicalMemory::new(8, 4);
        pm.write(13, 42);
        assert_eq!(pm.read(13), 42);

        pm.write(13, 0xffff_ffff);
        assert_eq!(pm.read(13), 0xffff_ffff);
    }

    #[test]
    fn test_frame_slices() {
        let mut pm = PhysicalMemory::new(4, 4);

        // Fill frame 2 through the slice view
        pm.frame_mut(2).copy_from_slice(&[10, 11, 12, 13]);

        // Visible word by word: frame 2 starts at address 8
        assert_eq!(pm.read(8), 10);
        assert_eq!(pm.read(11), 13);
        assert_eq!(pm.frame(2), &[10, 11, 12, 13]);

        // Neighboring frames untouched
        assert_eq!(pm.frame(1), &[0, 0, 0, 0]);
        assert_eq!(pm.frame(3), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_swap_allocates_in_order() {
        let mut swap = SwapStore::new(4, 4);
        assert_eq!(swap.allocated(), 0);
        assert_eq!(swap.capacity(), 4);

        assert_eq!(swap.allocate().unwrap(), 0);
        assert_eq!(swap.allocate().unwrap(), 1);
        assert_eq!(swap.allocate().unwrap(), 2);
        assert_eq!(swap.allocated(), 3);
    }

    #[test]
    fn test_swap_exhaustion() {
        let mut swap = SwapStore::new(2, 4);
        swap.allocate().unwrap();
        swap.allocate().unwrap();

        let err = swap.allocate().unwrap_err();
        assert_eq!(err, VmError::ResourceExhausted { capacity: 2 });

        // Still exhausted on a second attempt; no slot was leaked
        assert_eq!(swap.allocate().unwrap_err(), err);
        assert_eq!(swap.allocated(), 2);
    }

    #[test]
    fn test_swap_slot_roundtrip() {
        let mut swap = SwapStore::new(4, 4);
        let a = swap.allocate().unwrap();
        let b = swap.allocate().unwrap();

        swap.write_slot(a, &[1, 2, 3, 4]);
        swap.write_slot(b, &[5, 6, 7, 8]);

        assert_eq!(swap.read_slot(a), &[1, 2, 3, 4]);
        assert_eq!(swap.read_slot(b), &[5, 6, 7, 8]);

        // Overwriting a slot replaces its contents
        swap.write_slot(a, &[9, 9, 9, 9]);
        assert_eq!(swap.read_slot(a), &[9, 9, 9, 9]);
    }

    #[test]
    fn test_zero_capacity_swap() {
        let mut swap = SwapStore::new(0, 4);
        assert_eq!(
            swap.allocate().unwrap_err(),
            VmError::ResourceExhausted { capacity: 0 }
        );
    }
}
