/*
 * Mailbox Type Definitions
 *
 * This module defines the small, Copy-able types shared by every layer of the
 * mailbox subsystem:
 *
 * - CoreId:    which hart an operation is issued by or addressed to
 * - Message:   the opaque 64-bit payload carried between harts
 * - Channel:   an ordered (source, destination) pair owning one FIFO
 * - ReadyMask: the per-destination readiness bitmask returned by POLL
 */

use core::fmt;

use crate::config::MAX_CORES;

/// Payload carried by a single PUT/GET. The subsystem never interprets it.
pub type Message = u64;

/// Hart identifier
///
/// Supplied by the caller on every operation (on real hardware it is read
/// from `mhartid`); the mailbox never derives it from ambient state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreId(pub u32);

impl CoreId {
    /// Get the core ID as a usize for indexing
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hart({})", self.0)
    }
}

impl From<u32> for CoreId {
    fn from(value: u32) -> Self {
        CoreId(value)
    }
}

/// Ordered (source, destination) pair
///
/// Every destination has exactly one inbound channel from every core,
/// itself included. Channels are independent: FIFO order holds within one
/// channel and nowhere else.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    pub source: CoreId,
    pub destination: CoreId,
}

impl Channel {
    pub fn new(source: CoreId, destination: CoreId) -> Self {
        Self { source, destination }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source.0, self.destination.0)
    }
}

/// Readiness bitmask of one destination
///
/// Bit `i` is set iff the queue from source `i` into the destination is
/// non-empty at the moment the mask was taken. It is always derived from
/// queue contents, never stored on its own.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ReadyMask(pub u64);

impl ReadyMask {
    pub const EMPTY: ReadyMask = ReadyMask(0);

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, source: CoreId) -> bool {
        source.as_usize() < MAX_CORES && self.0 & (1u64 << source.0) != 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Lowest-indexed ready source, i.e. `ffs(mask) - 1`
    pub fn lowest(self) -> Option<CoreId> {
        if self.0 == 0 {
            None
        } else {
            Some(CoreId(self.0.trailing_zeros()))
        }
    }

    pub(crate) fn with(self, source: CoreId) -> ReadyMask {
        ReadyMask(self.0 | (1u64 << source.0))
    }

    /// Ready sources in ascending order
    pub fn iter(self) -> ReadySources {
        ReadySources { remaining: self.0 }
    }

    /// Ready sources collected without touching the heap
    pub fn sources(self) -> heapless::Vec<CoreId, MAX_CORES> {
        // A u64 mask never holds more than MAX_CORES bits, so push cannot fail.
        let mut out = heapless::Vec::new();
        for source in self.iter() {
            let _ = out.push(source);
        }
        out
    }
}

impl fmt::Display for ReadyMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Iterator over the set bits of a `ReadyMask`, lowest first
pub struct ReadySources {
    remaining: u64,
}

impl Iterator for ReadySources {
    type Item = CoreId;

    fn next(&mut self) -> Option<CoreId> {
        if self.remaining == 0 {
            return None;
        }
        let bit = self.remaining.trailing_zeros();
        self.remaining &= self.remaining - 1;
        Some(CoreId(bit))
    }
}
