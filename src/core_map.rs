/// Reverse-map entry for one physical frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreMapEntry {
    owner: Option<usize>,
    cached_slot: Option<usize>,
}

impl CoreMapEntry {
    /// Virtual page currently occupying the frame, if any.
    pub fn owner(&self) -> Option<usize> {
        self.owner
    }

    /// Swap slot belonging to the current occupant, if it has one.
    pub fn cached_slot(&self) -> Option<usize> {
        self.cached_slot
    }
}

/// Reverse map from physical frame to its occupant.
///
/// Besides the owner, each entry caches the swap slot assigned to that owner
/// so an unmodified page can be evicted again without a redundant write-back.
/// Both fields are replaced together whenever a frame changes hands; a frame
/// must never keep a previous occupant's slot.
pub struct CoreMap {
    entries: Vec<CoreMapEntry>,
}

impl CoreMap {
    /// Create a map of `frames` entries, all unowned with no cached slot.
    pub fn new(frames: usize) -> Self {
        CoreMap {
            entries: vec![CoreMapEntry::default(); frames],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, frame: usize) -> &CoreMapEntry {
        &self.entries[frame]
    }

    #[inline]
    pub fn owner(&self, frame: usize) -> Option<usize> {
        self.entries[frame].owner
    }

    #[inline]
    pub fn cached_slot(&self, frame: usize) -> Option<usize> {
        self.entries[frame].cached_slot
    }

    /// Hand a frame to a new occupant.
    ///
    /// `slot` is the incoming page's own swap slot (`Some` when it was just
    /// read back from swap, `None` for a page that has never been evicted).
    pub fn place(&mut self, frame: usize, page: usize, slot: Option<usize>) {
        self.entries[frame] = CoreMapEntry {
            owner: Some(page),
            cached_slot: slot,
        };
    }
}
