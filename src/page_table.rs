/// Where a virtual page currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Never been resident; no frame, no swap slot.
    Unused,
    /// Occupying the given physical frame.
    Resident { frame: usize },
    /// Swapped out to the given slot.
    Evicted { slot: usize },
}

/// Residency and access metadata for one virtual page.
///
/// `frame_or_slot` holds a frame index while the page is resident and a swap
/// slot index while it is evicted; `state()` resolves the meaning. `on_disk`
/// is sticky: it is set at the page's first eviction and never cleared, even
/// while the page is resident again.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageTableEntry {
    frame_or_slot: usize,
    in_memory: bool,
    on_disk: bool,
    modified: bool,
    referenced: bool,
    read_only: bool,
}

impl PageTableEntry {
    /// Resolve the three-state residency of this page.
    pub fn state(&self) -> PageState {
        if self.in_memory {
            PageState::Resident {
                frame: self.frame_or_slot,
            }
        } else if self.on_disk {
            PageState::Evicted {
                slot: self.frame_or_slot,
            }
        } else {
            PageState::Unused
        }
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn referenced(&self) -> bool {
        self.referenced
    }

    pub fn on_disk(&self) -> bool {
        self.on_disk
    }

    /// Stored for completeness; no access path ever checks it.
    pub fn read_only(&self) -> bool {
        self.read_only
    }
}

/// Forward map from virtual page index to residency metadata.
pub struct PageTable {
    entries: Vec<PageTableEntry>,
}

impl PageTable {
    /// Create a table of `pages` entries, all in the unused state.
    pub fn new(pages: usize) -> Self {
        PageTable {
            entries: vec![PageTableEntry::default(); pages],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, page: usize) -> &PageTableEntry {
        &self.entries[page]
    }

    pub fn state(&self, page: usize) -> PageState {
        self.entries[page].state()
    }

    #[inline]
    pub fn is_resident(&self, page: usize) -> bool {
        self.entries[page].in_memory
    }

    pub fn modified(&self, page: usize) -> bool {
        self.entries[page].modified
    }

    pub fn referenced(&self, page: usize) -> bool {
        self.entries[page].referenced
    }

    /// Move a page into a frame. The modified bit starts clear; the
    /// referenced bit is left for the access that triggered the fault to set.
    pub fn set_resident(&mut self, page: usize, frame: usize) {
        let entry = &mut self.entries[page];
        entry.frame_or_slot = frame;
        entry.in_memory = true;
        entry.modified = false;
    }

    /// Move a page out to a swap slot, clearing its access bits.
    pub fn set_evicted(&mut self, page: usize, slot: usize) {
        let entry = &mut self.entries[page];
        entry.frame_or_slot = slot;
        entry.in_memory = false;
        entry.on_disk = true;
        entry.modified = false;
        entry.referenced = false;
    }

    /// Record an access to a resident page.
    pub fn mark_accessed(&mut self, page: usize, is_write: bool) {
        let entry = &mut self.entries[page];
        entry.referenced = true;
        if is_write {
            entry.modified = true;
        }
    }

    /// Take away a page's second chance.
    pub fn clear_referenced(&mut self, page: usize) {
        self.entries[page].referenced = false;
    }

    pub fn set_read_only(&mut self, page: usize, read_only: bool) {
        self.entries[page].read_only = read_only;
    }
}
