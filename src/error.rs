/*
 * Mailbox Error Types
 *
 * Every error is a synchronous return value at the call site that issued the
 * offending operation. None of them poison shared state: a misuse by one
 * core leaves every other core's queues exactly as they were.
 */

use core::fmt;

use crate::mailbox::suspend::WaitReason;
use crate::types::{Channel, CoreId};

/// Errors reported by the core-facing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxError {
    /// Source or destination outside `[0, cores)`
    InvalidCore { core: CoreId, cores: usize },
    /// Non-blocking PUT into a queue at capacity
    QueueFull { channel: Channel },
    /// GET (or a non-blocking WAIT) found nothing to consume
    QueueEmpty { channel: Channel },
    /// GET_ANY issued with no WAIT having selected a source
    NoPendingSelection { core: CoreId },
    /// The suspension strategy abandoned a blocking operation
    Cancelled { core: CoreId, reason: WaitReason },
}

impl fmt::Display for MailboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailboxError::InvalidCore { core, cores } => {
                write!(f, "Invalid core {} (configured cores: {})", core.0, cores)
            }
            MailboxError::QueueFull { channel } => write!(f, "Queue full on channel {}", channel),
            MailboxError::QueueEmpty { channel } => write!(f, "Queue empty on channel {}", channel),
            MailboxError::NoPendingSelection { core } => {
                write!(f, "No pending selection on {}", core)
            }
            MailboxError::Cancelled { core, reason } => {
                write!(f, "Wait cancelled on {} ({})", core, reason)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MailboxError {}

/// Errors raised while validating a `MailboxConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A mailbox needs at least one core
    NoCores,
    /// The readiness bitmask cannot represent this many sources
    TooManyCores { requested: usize, max: usize },
    /// Queue depth must be at least 1
    ZeroDepth,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoCores => write!(f, "Core count must be at least 1"),
            ConfigError::TooManyCores { requested, max } => {
                write!(f, "Core count {} exceeds maximum of {}", requested, max)
            }
            ConfigError::ZeroDepth => write!(f, "Queue depth must be at least 1"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Errors raised while turning a raw funct7 + operands into an `Operation`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Reserved bits set, or not exactly one of PUT/WAIT/GET/POLL
    UnknownFunct(u8),
    /// A register operand the operation needs was not supplied
    MissingOperand(&'static str),
    /// A core operand does not fit a core index
    OperandOutOfRange(u64),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownFunct(funct) => write!(f, "Unknown funct7 {:#09b}", funct),
            DecodeError::MissingOperand(name) => write!(f, "Missing operand {}", name),
            DecodeError::OperandOutOfRange(value) => {
                write!(f, "Operand {:#x} is not a core index", value)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}
