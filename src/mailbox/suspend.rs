/*
 * Core Suspension Strategies
 *
 * A blocking operation (PUT on a full queue, WAIT, MWAIT, MPUT on a full
 * slot) never parks a thread itself. It retries the operation atomically
 * under the inbox lock, and between attempts hands control to a Suspend
 * implementation chosen by the caller.
 *
 * The strategy decides what "stalled" means on the platform:
 * - SpinWait:  busy-wait with a CPU relax hint (bare core, no scheduler)
 * - YieldWait: give the host thread's timeslice back to the OS (std)
 * - Deadline:  like YieldWait, but abandon the wait after a timeout (std)
 * - closures:  anything `FnMut(CoreId, WaitReason) -> ControlFlow<()>`
 *
 * Returning `ControlFlow::Break(())` cancels the operation. Cancellation is
 * only ever observed between attempts, so no queue is left half-updated.
 */

use core::fmt;
use core::ops::ControlFlow;

use crate::types::{Channel, CoreId};

/// What a suspended core is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// PUT blocked on a full channel queue
    Space { channel: Channel },
    /// WAIT_ANY blocked until any source is ready
    AnySource,
    /// WAIT(source) blocked on one channel
    Source { channel: Channel },
    /// MWAIT blocked until the core's memory slot is filled
    Slot { core: CoreId },
    /// MPUT blocked on an occupied memory slot
    SlotSpace { core: CoreId },
}

impl fmt::Display for WaitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitReason::Space { channel } => write!(f, "space on {}", channel),
            WaitReason::AnySource => write!(f, "any source"),
            WaitReason::Source { channel } => write!(f, "message on {}", channel),
            WaitReason::Slot { core } => write!(f, "memory slot of {}", core),
            WaitReason::SlotSpace { core } => write!(f, "free memory slot of {}", core),
        }
    }
}

/// How a core stalls while a blocking operation cannot make progress
pub trait Suspend {
    /// Called once per failed attempt
    ///
    /// `Continue` retries the operation, `Break` abandons it with
    /// `MailboxError::Cancelled`.
    fn suspend(&mut self, core: CoreId, reason: WaitReason) -> ControlFlow<()>;
}

impl<F> Suspend for F
where
    F: FnMut(CoreId, WaitReason) -> ControlFlow<()>,
{
    fn suspend(&mut self, core: CoreId, reason: WaitReason) -> ControlFlow<()> {
        self(core, reason)
    }
}

/// Busy-wait forever, the way a stalled hart spins on its coprocessor
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinWait;

impl Suspend for SpinWait {
    fn suspend(&mut self, _core: CoreId, _reason: WaitReason) -> ControlFlow<()> {
        core::hint::spin_loop();
        ControlFlow::Continue(())
    }
}

/// Yield the host thread between attempts; never gives up
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldWait;

#[cfg(feature = "std")]
impl Suspend for YieldWait {
    fn suspend(&mut self, _core: CoreId, _reason: WaitReason) -> ControlFlow<()> {
        std::thread::yield_now();
        ControlFlow::Continue(())
    }
}

/// Yield between attempts until a deadline passes, then cancel
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    until: std::time::Instant,
}

#[cfg(feature = "std")]
impl Deadline {
    pub fn after(timeout: std::time::Duration) -> Self {
        Self {
            until: std::time::Instant::now() + timeout,
        }
    }
}

#[cfg(feature = "std")]
impl Suspend for Deadline {
    fn suspend(&mut self, core: CoreId, reason: WaitReason) -> ControlFlow<()> {
        if std::time::Instant::now() >= self.until {
            log::debug!("{} gave up waiting for {}", core, reason);
            return ControlFlow::Break(());
        }
        std::thread::yield_now();
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_strategy() {
        let mut calls = 0;
        let mut strategy = |_core: CoreId, _reason: WaitReason| -> ControlFlow<()> {
            calls += 1;
            if calls < 3 {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        };
        let mut attempts = 0;
        while strategy.suspend(CoreId(0), WaitReason::AnySource).is_continue() {
            attempts += 1;
        }
        assert_eq!(attempts, 2);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_deadline_expires() {
        let mut deadline = Deadline::after(std::time::Duration::from_millis(0));
        assert!(deadline.suspend(CoreId(1), WaitReason::AnySource).is_break());
    }

    #[test]
    fn test_spin_wait_never_cancels() {
        let mut spin = SpinWait;
        for _ in 0..16 {
            assert!(spin.suspend(CoreId(0), WaitReason::Slot { core: CoreId(0) }).is_continue());
        }
    }
}
