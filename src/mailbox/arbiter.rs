/*
 * Source Arbitration and Pending Selection
 *
 * When a destination asks for "any" source, exactly one ready source is
 * chosen: the lowest-indexed one. The rule is fixed because it is visible
 * to software, which relies on it the same way it relies on ffs() over a
 * POLL_ANY mask.
 *
 * Per-destination receive state machine:
 *
 *   IDLE --WAIT--> SUSPENDED --source ready--> HAS_PENDING_SELECTION
 *     ^                                                |
 *     +----------------------GET-----------------------+
 *
 * The pending selection lives inside the destination's inbox, so selecting
 * it and consuming it are both atomic with respect to producers.
 */

use super::matrix::Inbox;
use crate::error::MailboxError;
use crate::types::{Channel, CoreId, Message, ReadyMask};

/// Pick the source a WAIT_ANY commits to, if any queue is ready
pub fn arbitrate(ready: ReadyMask) -> Option<CoreId> {
    ready.lowest()
}

/// Try to satisfy a WAIT_ANY on `inbox`
///
/// On success the chosen source becomes the pending selection. On failure
/// the inbox is left untouched, including any older selection.
pub fn select_any(inbox: &mut Inbox) -> Option<CoreId> {
    let source = arbitrate(inbox.ready_mask())?;
    inbox.set_pending(Some(source));
    Some(source)
}

/// Try to satisfy a WAIT(source) on `inbox`
pub fn select_source(inbox: &mut Inbox, source: CoreId) -> bool {
    if inbox.queue(source.as_usize()).is_empty() {
        return false;
    }
    inbox.set_pending(Some(source));
    true
}

/// Consume the message a previous WAIT committed `destination` to
///
/// The selection is cleared only when a message is actually dequeued; an
/// empty queue leaves it in place for the caller to inspect or retry.
pub fn take_selected(
    inbox: &mut Inbox,
    destination: CoreId,
) -> Result<(CoreId, Message), MailboxError> {
    let source = inbox
        .pending()
        .ok_or(MailboxError::NoPendingSelection { core: destination })?;
    let message = inbox
        .queue_mut(source.as_usize())
        .pop()
        .ok_or(MailboxError::QueueEmpty {
            channel: Channel::new(source, destination),
        })?;
    inbox.set_pending(None);
    Ok((source, message))
}

/// Consume the oldest message from a named source
///
/// A pending selection naming the same source is the WAIT this GET matches,
/// so it is retired as well.
pub fn take_from(
    inbox: &mut Inbox,
    source: CoreId,
    destination: CoreId,
) -> Result<Message, MailboxError> {
    let message = inbox
        .queue_mut(source.as_usize())
        .pop()
        .ok_or(MailboxError::QueueEmpty {
            channel: Channel::new(source, destination),
        })?;
    if inbox.pending() == Some(source) {
        inbox.set_pending(None);
    }
    Ok(message)
}
