/// Words per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 4;
/// Physical frames unless configured otherwise.
pub const DEFAULT_FRAMES: usize = 8;
/// Virtual pages unless configured otherwise.
pub const DEFAULT_PAGES: usize = 2048;
/// Swap slots unless configured otherwise.
pub const DEFAULT_SWAP_SLOTS: usize = 128;

/// Which replacement policy the manager runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Strict round-robin over the frames.
    Fifo,
    /// Uniform draws after the cold fill, reproducible from the seed.
    Random { seed: u64 },
    /// Clock hand that spares recently referenced pages once.
    SecondChance,
}

/// Dimensions and policy of a virtual-memory manager, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Words per page (and per frame and per swap slot).
    pub page_size: usize,
    /// Number of physical frames.
    pub frames: usize,
    /// Number of virtual pages.
    pub pages: usize,
    /// Swap capacity in slots.
    pub swap_slots: usize,
    /// Replacement policy variant.
    pub policy: PolicyKind,
}

impl VmConfig {
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_frames(mut self, frames: usize) -> Self {
        self.frames = frames;
        self
    }

    #[must_use]
    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages;
        self
    }

    #[must_use]
    pub fn with_swap_slots(mut self, swap_slots: usize) -> Self {
        self.swap_slots = swap_slots;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            page_size: DEFAULT_PAGE_SIZE,
            frames: DEFAULT_FRAMES,
            pages: DEFAULT_PAGES,
            swap_slots: DEFAULT_SWAP_SLOTS,
            policy: PolicyKind::Fifo,
        }
    }
}
