/*
 * Mailbox Matrix
 *
 * Owns the N x N channel queues. Queues are grouped by destination: each
 * destination core has one Inbox holding the N queues that feed it (one per
 * source, itself included) plus that core's pending selection.
 *
 * Locking:
 * - One spin::Mutex per inbox, never more than one held at a time
 * - Enqueue, dequeue, readiness snapshot and arbitration for a destination
 *   all run under that inbox's lock, so a readiness bit observed under the
 *   lock always refers to a message that can be consumed under the same lock
 * - Core indices are validated before any lock is taken; an InvalidCore
 *   error never touches queue state
 */

use alloc::vec::Vec;
use spin::Mutex;

use super::fifo::{ChannelQueue, Full};
use crate::config::MailboxConfig;
use crate::error::MailboxError;
use crate::types::{Channel, CoreId, Message, ReadyMask};

/// All queues feeding one destination core
pub struct Inbox {
    queues: Vec<ChannelQueue>,
    pending: Option<CoreId>,
}

impl Inbox {
    fn new(cores: usize, depth: usize) -> Self {
        Self {
            queues: (0..cores).map(|_| ChannelQueue::new(depth)).collect(),
            pending: None,
        }
    }

    /// Readiness bitmask, derived from queue contents on every call
    pub fn ready_mask(&self) -> ReadyMask {
        self.queues
            .iter()
            .enumerate()
            .filter(|(_, queue)| !queue.is_empty())
            .fold(ReadyMask::EMPTY, |mask, (source, _)| mask.with(CoreId(source as u32)))
    }

    pub fn queue(&self, source: usize) -> &ChannelQueue {
        &self.queues[source]
    }

    pub fn queue_mut(&mut self, source: usize) -> &mut ChannelQueue {
        &mut self.queues[source]
    }

    pub fn pending(&self) -> Option<CoreId> {
        self.pending
    }

    pub fn set_pending(&mut self, source: Option<CoreId>) {
        self.pending = source;
    }
}

pub struct MailboxMatrix {
    config: MailboxConfig,
    inboxes: Vec<Mutex<Inbox>>,
}

impl MailboxMatrix {
    /// Create every channel queue up front; none are added or removed later
    pub fn new(config: MailboxConfig) -> Self {
        let inboxes = (0..config.cores())
            .map(|_| Mutex::new(Inbox::new(config.cores(), config.queue_depth())))
            .collect();
        Self { config, inboxes }
    }

    pub fn config(&self) -> &MailboxConfig {
        &self.config
    }

    /// Run `f` with exclusive access to `destination`'s inbox
    pub fn with_inbox<R>(
        &self,
        destination: CoreId,
        f: impl FnOnce(&mut Inbox) -> R,
    ) -> Result<R, MailboxError> {
        let index = self.config.check_core(destination)?;
        let mut inbox = self.inboxes[index].lock();
        Ok(f(&mut *inbox))
    }

    /// Validate both ends of a channel, returning (source, destination) indices
    pub fn check_channel(&self, channel: Channel) -> Result<(usize, usize), MailboxError> {
        let source = self.config.check_core(channel.source)?;
        let destination = self.config.check_core(channel.destination)?;
        Ok((source, destination))
    }

    /// Append to the channel's queue, failing with `QueueFull` at capacity
    pub fn enqueue(&self, channel: Channel, message: Message) -> Result<(), MailboxError> {
        let (source, destination) = self.check_channel(channel)?;
        let mut inbox = self.inboxes[destination].lock();
        match inbox.queue_mut(source).push(message) {
            Ok(()) => {
                log::trace!("enqueue {:#x} on {}", message, channel);
                Ok(())
            }
            Err(Full(_)) => Err(MailboxError::QueueFull { channel }),
        }
    }

    /// Remove the oldest message of the channel, failing with `QueueEmpty`
    pub fn dequeue(&self, channel: Channel) -> Result<Message, MailboxError> {
        let (source, destination) = self.check_channel(channel)?;
        let mut inbox = self.inboxes[destination].lock();
        let message = inbox
            .queue_mut(source)
            .pop()
            .ok_or(MailboxError::QueueEmpty { channel })?;
        log::trace!("dequeue {:#x} from {}", message, channel);
        Ok(message)
    }

    /// Oldest message of the channel without removing it
    pub fn peek(&self, channel: Channel) -> Result<Option<Message>, MailboxError> {
        let (source, destination) = self.check_channel(channel)?;
        let inbox = self.inboxes[destination].lock();
        Ok(inbox.queue(source).front())
    }

    /// Side-effect free snapshot of `destination`'s readiness bitmask
    pub fn readiness(&self, destination: CoreId) -> Result<ReadyMask, MailboxError> {
        self.with_inbox(destination, |inbox| inbox.ready_mask())
    }

    /// Number of messages currently queued on the channel
    pub fn queued(&self, channel: Channel) -> Result<usize, MailboxError> {
        let (source, destination) = self.check_channel(channel)?;
        let inbox = self.inboxes[destination].lock();
        Ok(inbox.queue(source).len())
    }
}
