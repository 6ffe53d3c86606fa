/*
 * SAGE Inter-Core Mailbox
 *
 * This crate models the mailbox coprocessor behind the SAGE custom
 * instructions (PUT/WAIT/GET/POLL in QUEUE and MEMORY forms) used by harts to
 * pass 64-bit messages to each other. It is meant to behave exactly like the
 * hardware as seen from software, so it can back a full-system simulator, a
 * verification model, or a software fallback.
 *
 * Layering (leaves first):
 * - mailbox::fifo:    bounded FIFO for one (source, destination) channel
 * - mailbox::matrix:  the N x N channel queues, one lock per destination
 * - mailbox::arbiter: lowest-index source selection and pending selection
 * - mailbox:          core-facing operation set (+ memory forms)
 * - instr:            named operations, funct7 decoding, dispatch
 *
 * Without the default `std` feature the crate is no_std + alloc.
 */

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod config;
pub mod error;
pub mod instr;
#[cfg(feature = "std")]
pub mod logger;
pub mod mailbox;
pub mod types;

pub use config::{MailboxConfig, DEFAULT_CORES, DEFAULT_QUEUE_DEPTH, MAX_CORES};
pub use error::{ConfigError, DecodeError, MailboxError};
pub use instr::{funct::Funct, Operation, Outcome};
pub use mailbox::suspend::{SpinWait, Suspend, WaitReason};
#[cfg(feature = "std")]
pub use mailbox::suspend::{Deadline, YieldWait};
pub use mailbox::{ChannelStats, InboxStats, Mailbox};
pub use types::{Channel, CoreId, Message, ReadyMask};
