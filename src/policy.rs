use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::PolicyKind;
use crate::core_map::CoreMap;
use crate::page_table::PageTable;

/// Strategy for choosing which frame the next faulting page will occupy.
///
/// Implementations keep their own cursor state across calls and consult only
/// residency and reference metadata, never page contents. From a fresh start
/// every policy hands out frames `0, 1, …` in order until each frame has been
/// used once.
pub trait ReplacementPolicy {
    /// Pick the victim frame for the next fault.
    fn select_victim(&mut self, core_map: &CoreMap, pages: &mut PageTable) -> usize;

    /// Short policy name for logs and reports.
    fn name(&self) -> &'static str;
}

/// Build the policy a config names.
pub fn from_kind(kind: &PolicyKind) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyKind::Fifo => Box::new(Fifo::new()),
        PolicyKind::Random { seed } => Box::new(Random::seeded(*seed)),
        PolicyKind::SecondChance => Box::new(SecondChance::new()),
    }
}

/// Round-robin over the frames, ignoring access history entirely.
pub struct Fifo {
    cursor: usize,
}

impl Fifo {
    pub fn new() -> Self {
        Fifo { cursor: 0 }
    }
}

impl Default for Fifo {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplacementPolicy for Fifo {
    fn select_victim(&mut self, core_map: &CoreMap, _pages: &mut PageTable) -> usize {
        let victim = self.cursor;
        self.cursor = (self.cursor + 1) % core_map.len();
        victim
    }

    fn name(&self) -> &'static str {
        "fifo"
    }
}

/// Uniform draws once every frame has been handed out.
///
/// The first `frames` calls return `0, 1, …, frames-1` so that no page is
/// evicted before every frame has been used. After that each call draws one
/// frame; a draw equal to the previously chosen victim slides to the next
/// frame instead of repeating. The comparison target starts at frame 0 and is
/// not maintained during the fill, so the first post-fill draw is only ever
/// checked against frame 0.
pub struct Random {
    rng: Box<dyn RngCore>,
    filled: usize,
    last: usize,
}

impl Random {
    /// A reproducible policy driven by a seeded standard generator.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(Box::new(StdRng::seed_from_u64(seed)))
    }

    /// A policy driven by any generator, e.g. a scripted one in tests.
    pub fn with_rng(rng: Box<dyn RngCore>) -> Self {
        Random {
            rng,
            filled: 0,
            last: 0,
        }
    }
}

impl ReplacementPolicy for Random {
    fn select_victim(&mut self, core_map: &CoreMap, _pages: &mut PageTable) -> usize {
        let frames = core_map.len();

        if self.filled < frames {
            let victim = self.filled;
            self.filled += 1;
            return victim;
        }

        let mut victim = (self.rng.next_u32() as usize) % frames;
        if victim == self.last {
            victim = (victim + 1) % frames;
            log::trace!("random: draw repeated previous victim, sliding to frame {victim}");
        }
        self.last = victim;
        victim
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Clock algorithm: pages referenced since the hand last passed are spared
/// once; the hand advances past every frame it examines, including the one
/// it returns.
pub struct SecondChance {
    hand: usize,
}

impl SecondChance {
    pub fn new() -> Self {
        SecondChance { hand: 0 }
    }
}

impl Default for SecondChance {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplacementPolicy for SecondChance {
    fn select_victim(&mut self, core_map: &CoreMap, pages: &mut PageTable) -> usize {
        let frames = core_map.len();

        // Terminates: a full sweep leaves no referenced bit standing.
        loop {
            let frame = self.hand;
            self.hand = (self.hand + 1) % frames;

            match core_map.owner(frame) {
                None => return frame,
                Some(page) => {
                    if pages.referenced(page) {
                        pages.clear_referenced(page);
                        log::trace!("second chance: page {page} spared in frame {frame}");
                    } else {
                        return frame;
                    }
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "second-chance"
    }
}
