/*
 * MEMORY (M*) Operations
 *
 * The memory-style variant gives every core a single one-word slot. There
 * is no source addressing: a producer names only the destination, and the
 * destination reads "its" slot. Internally the slots reuse the matrix with
 * a depth of one, each slot being the destination's channel to itself.
 *
 * - MPUT(dest, data): fill dest's slot; stalls while it is occupied
 * - MWAIT():          stall until the own slot is filled; returns the word
 *                     without emptying the slot
 * - MGET():           empty the own slot and return the word
 * - MPOLL():          whether the own slot is filled
 */

use super::suspend::{Suspend, WaitReason};
use super::{stall, Mailbox};
use crate::error::MailboxError;
use crate::types::{Channel, CoreId, Message};

fn slot(core: CoreId) -> Channel {
    Channel::new(core, core)
}

impl Mailbox {
    /// MPUT: store `data` in `dest`'s slot, stalling while it is occupied
    pub fn m_put<S>(
        &self,
        core: CoreId,
        dest: CoreId,
        data: Message,
        suspend: &mut S,
    ) -> Result<(), MailboxError>
    where
        S: Suspend + ?Sized,
    {
        self.slots.config().check_core(core)?;
        loop {
            match self.slots.enqueue(slot(dest), data) {
                Ok(()) => {
                    log::debug!("m_put: {} stored {:#x} for {}", core, data, dest);
                    return Ok(());
                }
                Err(MailboxError::QueueFull { .. }) => {
                    stall(suspend, core, WaitReason::SlotSpace { core: dest })?;
                }
                Err(e) => {
                    log::warn!("m_put: {}", e);
                    return Err(e);
                }
            }
        }
    }

    /// MPUT without stalling; an occupied slot is reported as `QueueFull`
    pub fn m_try_put(&self, core: CoreId, dest: CoreId, data: Message) -> Result<(), MailboxError> {
        self.slots.config().check_core(core)?;
        self.slots
            .enqueue(slot(dest), data)
            .inspect_err(|e| log::warn!("m_try_put: {}", e))
    }

    /// MWAIT: stall until the caller's slot is filled, then return its word
    pub fn m_wait<S>(&self, core: CoreId, suspend: &mut S) -> Result<Message, MailboxError>
    where
        S: Suspend + ?Sized,
    {
        loop {
            if let Some(data) = self.slots.peek(slot(core))? {
                log::debug!("m_wait: {} sees {:#x}", core, data);
                return Ok(data);
            }
            stall(suspend, core, WaitReason::Slot { core })?;
        }
    }

    /// MGET: empty the caller's slot
    pub fn m_get(&self, core: CoreId) -> Result<Message, MailboxError> {
        let data = self
            .slots
            .dequeue(slot(core))
            .inspect_err(|e| log::warn!("m_get: {}", e))?;
        log::debug!("m_get: {} took {:#x}", core, data);
        Ok(data)
    }

    /// MPOLL: whether the caller's slot is filled
    pub fn m_poll(&self, core: CoreId) -> Result<bool, MailboxError> {
        Ok(self.slots.queued(slot(core))? > 0)
    }
}
