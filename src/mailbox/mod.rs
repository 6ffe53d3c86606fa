/*
 * Inter-Core Mailbox
 *
 * This module implements the core-facing operation set behind the SAGE
 * custom instructions:
 *
 * - PUT(dest, data):  enqueue on (caller -> dest); stalls while that queue is full
 * - WAIT_ANY():       stall until any source is ready; returns the source chosen
 * - WAIT(source):     stall until (source -> caller) is non-empty; echoes source
 * - GET_ANY():        dequeue from the source the last WAIT selected
 * - GET(source):      dequeue from a named source
 * - POLL_ANY():       readiness bitmask of the caller's inbox
 * - POLL(source):     readiness bit of one channel
 *
 * Design:
 * - WAIT and GET stay separate operations. WAIT only commits the caller to a
 *   source (the pending selection); GET moves the payload
 * - Blocking operations loop over an atomic attempt and a caller-supplied
 *   Suspend strategy; cancellation happens only between attempts
 * - The calling core is always an explicit argument, never ambient state
 * - GET and POLL never block
 */

pub mod arbiter;
pub mod fifo;
pub mod matrix;
pub mod memory;
pub mod suspend;

use core::ops::ControlFlow;

use crate::config::{MailboxConfig, MAX_CORES, MEMORY_SLOT_DEPTH};
use crate::error::MailboxError;
use crate::types::{Channel, CoreId, Message, ReadyMask};
use matrix::MailboxMatrix;
use suspend::{Suspend, WaitReason};

/// Occupancy of one channel feeding an inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStats {
    pub channel: Channel,
    pub queued: usize,
    pub capacity: usize,
}

/// Snapshot of one destination's inbox (for debugging)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxStats {
    pub core: CoreId,
    pub ready: ReadyMask,
    pub pending: Option<CoreId>,
    pub channels: heapless::Vec<ChannelStats, MAX_CORES>,
}

/// The whole mailbox subsystem shared by every core
pub struct Mailbox {
    queues: MailboxMatrix,
    slots: MailboxMatrix,
}

impl Mailbox {
    /// Build the queue matrix and the memory slots for `config`
    pub fn new(config: MailboxConfig) -> Self {
        // Depth 1 is always a valid configuration for an accepted core count.
        let slot_config = MailboxConfig::new(config.cores(), MEMORY_SLOT_DEPTH).unwrap_or(config);
        log::info!(
            "Mailbox initialized: {} cores, queue depth {}",
            config.cores(),
            config.queue_depth()
        );
        Self {
            queues: MailboxMatrix::new(config),
            slots: MailboxMatrix::new(slot_config),
        }
    }

    pub fn config(&self) -> &MailboxConfig {
        self.queues.config()
    }

    /// Direct access to the channel queues
    pub fn matrix(&self) -> &MailboxMatrix {
        &self.queues
    }

    /// PUT: enqueue `data` on (core -> dest), stalling while the queue is full
    pub fn put<S>(
        &self,
        core: CoreId,
        dest: CoreId,
        data: Message,
        suspend: &mut S,
    ) -> Result<(), MailboxError>
    where
        S: Suspend + ?Sized,
    {
        let channel = Channel::new(core, dest);
        self.queues.check_channel(channel).inspect_err(|e| log::warn!("put: {}", e))?;
        loop {
            match self.queues.enqueue(channel, data) {
                Ok(()) => {
                    log::debug!("put: {} sent {:#x} to {}", core, data, dest);
                    return Ok(());
                }
                Err(MailboxError::QueueFull { .. }) => {
                    log::trace!("put: {} stalled on full channel {}", core, channel);
                    stall(suspend, core, WaitReason::Space { channel })?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// PUT without stalling; a full queue is reported as `QueueFull`
    pub fn try_put(&self, core: CoreId, dest: CoreId, data: Message) -> Result<(), MailboxError> {
        let channel = Channel::new(core, dest);
        self.queues
            .enqueue(channel, data)
            .inspect_err(|e| log::warn!("try_put: {}", e))?;
        log::debug!("try_put: {} sent {:#x} to {}", core, data, dest);
        Ok(())
    }

    /// WAIT_ANY: stall until some source is ready and commit to the lowest one
    ///
    /// Returns the selected source. Nothing is dequeued; follow with
    /// `get_any`.
    pub fn wait_any<S>(&self, core: CoreId, suspend: &mut S) -> Result<CoreId, MailboxError>
    where
        S: Suspend + ?Sized,
    {
        loop {
            if let Some(source) = self.try_wait_any(core)? {
                return Ok(source);
            }
            stall(suspend, core, WaitReason::AnySource)?;
        }
    }

    /// WAIT_ANY without stalling; `None` when no source is ready
    pub fn try_wait_any(&self, core: CoreId) -> Result<Option<CoreId>, MailboxError> {
        let selected = self
            .queues
            .with_inbox(core, arbiter::select_any)
            .inspect_err(|e| log::warn!("wait_any: {}", e))?;
        if let Some(source) = selected {
            log::debug!("wait_any: {} selected source {}", core, source.0);
        }
        Ok(selected)
    }

    /// WAIT(source): stall until (source -> core) is non-empty and commit to it
    pub fn wait<S>(
        &self,
        core: CoreId,
        source: CoreId,
        suspend: &mut S,
    ) -> Result<CoreId, MailboxError>
    where
        S: Suspend + ?Sized,
    {
        loop {
            match self.try_wait(core, source) {
                Err(MailboxError::QueueEmpty { channel }) => {
                    stall(suspend, core, WaitReason::Source { channel })?;
                }
                result => return result,
            }
        }
    }

    /// WAIT(source) without stalling
    ///
    /// An empty channel is reported as `QueueEmpty`; the pending selection
    /// is left as it was.
    pub fn try_wait(&self, core: CoreId, source: CoreId) -> Result<CoreId, MailboxError> {
        let channel = Channel::new(source, core);
        self.queues
            .check_channel(channel)
            .inspect_err(|e| log::warn!("wait: {}", e))?;
        let ready = self
            .queues
            .with_inbox(core, |inbox| arbiter::select_source(inbox, source))?;
        if !ready {
            return Err(MailboxError::QueueEmpty { channel });
        }
        log::debug!("wait: {} selected source {}", core, source.0);
        Ok(source)
    }

    /// GET_ANY: dequeue from the source the last WAIT committed to
    pub fn get_any(&self, core: CoreId) -> Result<Message, MailboxError> {
        let taken = self
            .queues
            .with_inbox(core, |inbox| arbiter::take_selected(inbox, core))
            .inspect_err(|e| log::warn!("get_any: {}", e))?;
        match taken {
            Ok((source, data)) => {
                log::debug!("get_any: {} received {:#x} from {}", core, data, source.0);
                Ok(data)
            }
            Err(e) => {
                report_get_error("get_any", &e);
                Err(e)
            }
        }
    }

    /// GET(source): dequeue the oldest message on (source -> core)
    pub fn get(&self, core: CoreId, source: CoreId) -> Result<Message, MailboxError> {
        let channel = Channel::new(source, core);
        self.queues
            .check_channel(channel)
            .inspect_err(|e| log::warn!("get: {}", e))?;
        let taken = self
            .queues
            .with_inbox(core, |inbox| arbiter::take_from(inbox, source, core))?;
        match taken {
            Ok(data) => {
                log::debug!("get: {} received {:#x} from {}", core, data, source.0);
                Ok(data)
            }
            Err(e) => {
                report_get_error("get", &e);
                Err(e)
            }
        }
    }

    /// POLL_ANY: readiness bitmask of `core`'s inbox
    pub fn poll_any(&self, core: CoreId) -> Result<ReadyMask, MailboxError> {
        let mask = self
            .queues
            .readiness(core)
            .inspect_err(|e| log::warn!("poll_any: {}", e))?;
        log::trace!("poll_any: {} mask {}", core, mask);
        Ok(mask)
    }

    /// POLL(source): whether (source -> core) holds a message
    pub fn poll(&self, core: CoreId, source: CoreId) -> Result<bool, MailboxError> {
        let channel = Channel::new(source, core);
        let queued = self
            .queues
            .queued(channel)
            .inspect_err(|e| log::warn!("poll: {}", e))?;
        Ok(queued > 0)
    }

    /// Messages currently queued on `channel`
    pub fn queued(&self, channel: Channel) -> Result<usize, MailboxError> {
        self.queues.queued(channel)
    }

    /// Per-channel occupancy and pending selection of `core`'s inbox
    pub fn inbox_stats(&self, core: CoreId) -> Result<InboxStats, MailboxError> {
        let cores = self.config().cores();
        self.queues.with_inbox(core, |inbox| {
            let mut channels = heapless::Vec::new();
            for source in 0..cores {
                let queue = inbox.queue(source);
                // cores <= MAX_CORES, so the vector never overflows.
                let _ = channels.push(ChannelStats {
                    channel: Channel::new(CoreId(source as u32), core),
                    queued: queue.len(),
                    capacity: queue.capacity(),
                });
            }
            InboxStats {
                core,
                ready: inbox.ready_mask(),
                pending: inbox.pending(),
                channels,
            }
        })
    }
}

/// Hand control to the suspension strategy between two attempts
pub(crate) fn stall<S>(
    suspend: &mut S,
    core: CoreId,
    reason: WaitReason,
) -> Result<(), MailboxError>
where
    S: Suspend + ?Sized,
{
    match suspend.suspend(core, reason) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(()) => {
            log::debug!("{} cancelled wait for {}", core, reason);
            Err(MailboxError::Cancelled { core, reason })
        }
    }
}

fn report_get_error(op: &str, error: &MailboxError) {
    match error {
        // A GET that finds its committed queue empty means the
        // WAIT/GET pairing was broken by the caller.
        MailboxError::QueueEmpty { .. } => log::error!("{}: {}", op, error),
        _ => log::warn!("{}: {}", op, error),
    }
}
