/*
 * Instruction Binding Layer
 *
 * Names every SAGE instruction as an Operation and dispatches it against a
 * Mailbox on behalf of one core, the way a simulator's execute stage would.
 * The raw funct7 encoding is confined to the `funct` submodule; the
 * mailbox itself only ever sees named operations.
 */

pub mod funct;

use core::fmt;

use crate::error::MailboxError;
use crate::mailbox::suspend::Suspend;
use crate::mailbox::Mailbox;
use crate::types::{CoreId, Message, ReadyMask};

/// One SAGE instruction with its operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    QPut { dest: CoreId, data: Message },
    QWaitAny,
    QWait { source: CoreId },
    QGetAny,
    QGet { source: CoreId },
    QPollAny,
    QPoll { source: CoreId },
    MPut { dest: CoreId, data: Message },
    MWait,
    MGet,
    MPoll,
}

impl Operation {
    /// Get a short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Operation::QPut { .. } => "QPUT",
            Operation::QWaitAny => "QWAIT_ANY",
            Operation::QWait { .. } => "QWAIT",
            Operation::QGetAny => "QGET_ANY",
            Operation::QGet { .. } => "QGET",
            Operation::QPollAny => "QPOLL_ANY",
            Operation::QPoll { .. } => "QPOLL",
            Operation::MPut { .. } => "MPUT",
            Operation::MWait => "MWAIT",
            Operation::MGet => "MGET",
            Operation::MPoll => "MPOLL",
        }
    }

    /// Whether the operation can stall the issuing core
    pub fn may_block(&self) -> bool {
        matches!(
            self,
            Operation::QPut { .. }
                | Operation::QWaitAny
                | Operation::QWait { .. }
                | Operation::MPut { .. }
                | Operation::MWait
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value an operation writes back to the issuing core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// PUT forms: nothing is returned
    Done,
    /// Queue WAIT forms: the selected source
    Source(CoreId),
    /// GET forms and MWAIT: the payload
    Data(Message),
    /// QPOLL_ANY: the readiness bitmask
    Ready(ReadyMask),
    /// QPOLL(source) and MPOLL: one readiness bit
    Flag(bool),
}

impl Outcome {
    /// The value as it would land in the destination register
    pub fn to_register(self) -> u64 {
        match self {
            Outcome::Done => 0,
            Outcome::Source(core) => u64::from(core.0),
            Outcome::Data(data) => data,
            Outcome::Ready(mask) => mask.bits(),
            Outcome::Flag(flag) => u64::from(flag),
        }
    }
}

impl Mailbox {
    /// Execute `op` as issued by `core`
    pub fn execute<S>(
        &self,
        core: CoreId,
        op: Operation,
        suspend: &mut S,
    ) -> Result<Outcome, MailboxError>
    where
        S: Suspend + ?Sized,
    {
        log::trace!("{} issues {}", core, op);
        let outcome = match op {
            Operation::QPut { dest, data } => {
                self.put(core, dest, data, suspend)?;
                Outcome::Done
            }
            Operation::QWaitAny => Outcome::Source(self.wait_any(core, suspend)?),
            Operation::QWait { source } => Outcome::Source(self.wait(core, source, suspend)?),
            Operation::QGetAny => Outcome::Data(self.get_any(core)?),
            Operation::QGet { source } => Outcome::Data(self.get(core, source)?),
            Operation::QPollAny => Outcome::Ready(self.poll_any(core)?),
            Operation::QPoll { source } => Outcome::Flag(self.poll(core, source)?),
            Operation::MPut { dest, data } => {
                self.m_put(core, dest, data, suspend)?;
                Outcome::Done
            }
            Operation::MWait => Outcome::Data(self.m_wait(core, suspend)?),
            Operation::MGet => Outcome::Data(self.m_get(core)?),
            Operation::MPoll => Outcome::Flag(self.m_poll(core)?),
        };
        Ok(outcome)
    }
}
