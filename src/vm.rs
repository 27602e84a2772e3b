use crate::config::VmConfig;
use crate::core_map::CoreMap;
use crate::error::{VmError, VmResult};
use crate::memory::{PhysicalMemory, SwapStore};
use crate::page_table::{PageState, PageTable};
use crate::policy::{self, ReplacementPolicy};

/// Running totals of paging activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmStats {
    /// Faults resolved (including those triggered while loading a program).
    pub page_faults: u64,
    /// Pages written back to the swap store.
    pub disk_writes: u64,
    /// Pages read back in from the swap store.
    pub disk_reads: u64,
}

/// A demand-paged virtual memory: page table, core map, swap store, and a
/// replacement policy behind one translation boundary.
///
/// Every table is fully initialized at construction; a page's life cycle is
/// unused, then resident, then alternating between evicted and resident until
/// the manager is dropped.
pub struct VmManager {
    page_size: usize,
    memory: PhysicalMemory,
    swap: SwapStore,
    page_table: PageTable,
    core_map: CoreMap,
    policy: Box<dyn ReplacementPolicy>,
    ram_full: bool,
    stats: VmStats,
}

impl VmManager {
    /// Build a manager with the policy named by the config.
    ///
    /// Panics if any dimension other than the swap capacity is zero.
    pub fn new(config: VmConfig) -> Self {
        let policy = policy::from_kind(&config.policy);
        Self::with_policy(config, policy)
    }

    /// Build a manager around a caller-supplied policy, e.g. one driven by a
    /// scripted random source.
    pub fn with_policy(config: VmConfig, policy: Box<dyn ReplacementPolicy>) -> Self {
        assert!(config.page_size > 0, "page size must be nonzero");
        assert!(config.frames > 0, "frame count must be nonzero");
        assert!(config.pages > 0, "page count must be nonzero");

        log::info!(
            "{} policy, {} frames of {} words, {} virtual pages, {} swap slots",
            policy.name(),
            config.frames,
            config.page_size,
            config.pages,
            config.swap_slots
        );

        VmManager {
            page_size: config.page_size,
            memory: PhysicalMemory::new(config.frames, config.page_size),
            swap: SwapStore::new(config.swap_slots, config.page_size),
            page_table: PageTable::new(config.pages),
            core_map: CoreMap::new(config.frames),
            policy,
            ram_full: false,
            stats: VmStats::default(),
        }
    }

    /// Translate a virtual address, faulting the page in if necessary, and
    /// record the access in the page's reference/dirty bits.
    pub fn translate(&mut self, virt_addr: usize, is_write: bool) -> VmResult<usize> {
        let page = virt_addr / self.page_size;
        let offset = virt_addr % self.page_size;

        if page >= self.page_table.len() {
            return Err(VmError::OutOfRange {
                page,
                pages: self.page_table.len(),
            });
        }

        let frame = match self.page_table.state(page) {
            PageState::Resident { frame } => frame,
            _ => self.handle_fault(page)?,
        };

        self.page_table.mark_accessed(page, is_write);

        Ok(frame * self.page_size + offset)
    }

    /// Make a non-resident page resident and return the frame it landed in.
    ///
    /// Evicts the current occupant of the victim frame once physical memory
    /// has filled up, reusing the occupant's swap slot where one is cached
    /// and writing back only when it was modified; a first-ever eviction
    /// allocates a fresh slot and always writes.
    pub fn handle_fault(&mut self, page: usize) -> VmResult<usize> {
        if page >= self.page_table.len() {
            return Err(VmError::OutOfRange {
                page,
                pages: self.page_table.len(),
            });
        }
        if self.page_table.is_resident(page) {
            return Err(VmError::invariant(format!(
                "fault requested for resident page {page}"
            )));
        }

        self.stats.page_faults += 1;

        let victim = self.policy.select_victim(&self.core_map, &mut self.page_table);
        debug_assert!(
            victim < self.core_map.len(),
            "policy chose frame {victim} of {}",
            self.core_map.len()
        );

        if self.ram_full {
            self.evict_frame(victim)?;
        } else {
            // Cold start: the policy is still handing out untouched frames.
            debug_assert!(
                self.core_map.owner(victim).is_none(),
                "cold-start victim frame {victim} already owned"
            );
            if victim == self.core_map.len() - 1 {
                self.ram_full = true;
                log::debug!("physical memory full after frame {victim}");
            }
        }

        let slot = match self.page_table.state(page) {
            PageState::Evicted { slot } => {
                self.memory
                    .frame_mut(victim)
                    .copy_from_slice(self.swap.read_slot(slot));
                self.stats.disk_reads += 1;
                log::debug!("swap in: slot {slot} -> frame {victim}");
                Some(slot)
            }
            // A never-resident page starts over whatever the frame holds.
            _ => None,
        };

        self.core_map.place(victim, page, slot);
        self.page_table.set_resident(page, victim);

        log::debug!(
            "page fault {}: page {page} now in frame {victim}",
            self.stats.page_faults
        );

        Ok(victim)
    }

    /// Push the current occupant of `victim` out to the swap store.
    fn evict_frame(&mut self, victim: usize) -> VmResult<()> {
        let owner = self
            .core_map
            .owner(victim)
            .ok_or_else(|| VmError::invariant(format!("no page to evict from frame {victim}")))?;

        let slot = match self.core_map.cached_slot(victim) {
            Some(slot) => {
                // The page already has a slot; skip the write if it is clean.
                if self.page_table.modified(owner) {
                    self.swap.write_slot(slot, self.memory.frame(victim));
                    self.stats.disk_writes += 1;
                    log::debug!("write back: page {owner} -> slot {slot}");
                } else {
                    log::debug!("evict clean: page {owner} keeps slot {slot}");
                }
                slot
            }
            None => {
                // First eviction ever: persist the page regardless of bits.
                let slot = self.swap.allocate()?;
                self.swap.write_slot(slot, self.memory.frame(victim));
                self.stats.disk_writes += 1;
                log::debug!("write back: page {owner} -> new slot {slot}");
                slot
            }
        };

        self.page_table.set_evicted(owner, slot);
        Ok(())
    }

    /// Read one word of virtual memory.
    pub fn read(&mut self, virt_addr: usize) -> VmResult<u32> {
        let phys = self.translate(virt_addr, false)?;
        Ok(self.memory.read(phys))
    }

    /// Write one word of virtual memory.
    pub fn write(&mut self, virt_addr: usize, value: u32) -> VmResult<()> {
        let phys = self.translate(virt_addr, true)?;
        self.memory.write(phys, value);
        Ok(())
    }

    /// Residency of one page.
    pub fn page_state(&self, page: usize) -> PageState {
        self.page_table.state(page)
    }

    /// Paging counters so far.
    pub fn stats(&self) -> VmStats {
        self.stats
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn frame_count(&self) -> usize {
        self.core_map.len()
    }

    pub fn page_count(&self) -> usize {
        self.page_table.len()
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }
}
