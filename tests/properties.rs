//! Single-threaded properties of the mailbox: FIFO order and readiness
//! consistency over random operation sequences, arbitration, the two-step
//! receive and error isolation.

use std::collections::VecDeque;

use proptest::prelude::*;
use sage_mailbox::{
    Channel, CoreId, InboxStats, Mailbox, MailboxConfig, MailboxError, ReadyMask, SpinWait,
};

fn mailbox(cores: usize, depth: usize) -> Mailbox {
    Mailbox::new(MailboxConfig::new(cores, depth).unwrap())
}

fn snapshot(mb: &Mailbox) -> Vec<InboxStats> {
    (0..mb.config().cores() as u32)
        .map(|core| mb.inbox_stats(CoreId(core)).unwrap())
        .collect()
}

fn assert_invalid<T: std::fmt::Debug>(result: Result<T, MailboxError>) {
    assert!(
        matches!(result, Err(MailboxError::InvalidCore { .. })),
        "expected InvalidCore, got {:?}",
        result
    );
}

/// One step of the random walk: a PUT or a GET on (source -> dest)
#[derive(Debug, Clone, Copy)]
enum Step {
    Put { source: u32, dest: u32 },
    Get { source: u32, dest: u32 },
}

fn arb_step(cores: u32) -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..cores, 0..cores).prop_map(|(source, dest)| Step::Put { source, dest }),
        (0..cores, 0..cores).prop_map(|(source, dest)| Step::Get { source, dest }),
    ]
}

const WALK_CORES: u32 = 5;
const WALK_DEPTH: usize = 3;

proptest! {
    #[test]
    fn fifo_order_per_channel(senders in prop::collection::vec(0u32..3, 0..48)) {
        // Interleaved traffic from three sources into one inbox
        let mb = mailbox(3, 64);
        for (seq, &source) in senders.iter().enumerate() {
            mb.try_put(CoreId(source), CoreId(1), seq as u64).unwrap();
        }
        for source in 0..3u32 {
            let expected: Vec<u64> = senders
                .iter()
                .enumerate()
                .filter(|&(_, &s)| s == source)
                .map(|(seq, _)| seq as u64)
                .collect();
            let received: Vec<u64> = expected
                .iter()
                .map(|_| mb.get(CoreId(1), CoreId(source)).unwrap())
                .collect();
            prop_assert_eq!(received, expected);
            prop_assert!(!mb.poll(CoreId(1), CoreId(source)).unwrap());
        }
    }

    #[test]
    fn readiness_matches_queue_contents_in_every_state(
        steps in prop::collection::vec(arb_step(WALK_CORES), 1..300)
    ) {
        let cores = WALK_CORES as usize;
        let mb = mailbox(cores, WALK_DEPTH);
        let mut model = vec![vec![VecDeque::new(); cores]; cores];

        for (seq, step) in steps.into_iter().enumerate() {
            let seq = seq as u64;
            match step {
                Step::Put { source, dest } => {
                    let result = mb.try_put(CoreId(source), CoreId(dest), seq);
                    let queue = &mut model[dest as usize][source as usize];
                    if queue.len() < WALK_DEPTH {
                        prop_assert_eq!(result, Ok(()));
                        queue.push_back(seq);
                    } else {
                        let full = matches!(result, Err(MailboxError::QueueFull { .. }));
                        prop_assert!(full);
                    }
                }
                Step::Get { source, dest } => {
                    let result = mb.get(CoreId(dest), CoreId(source));
                    match model[dest as usize][source as usize].pop_front() {
                        Some(expected) => {
                            prop_assert_eq!(result, Ok(expected));
                        }
                        None => {
                            let empty = matches!(result, Err(MailboxError::QueueEmpty { .. }));
                            prop_assert!(empty);
                        }
                    }
                }
            }

            for (dest, inbox) in model.iter().enumerate() {
                let expected = inbox
                    .iter()
                    .enumerate()
                    .filter(|(_, queue)| !queue.is_empty())
                    .fold(0u64, |mask, (source, _)| mask | 1 << source);
                prop_assert_eq!(mb.poll_any(CoreId(dest as u32)).unwrap(), ReadyMask(expected));
                for (source, queue) in inbox.iter().enumerate() {
                    prop_assert_eq!(
                        mb.poll(CoreId(dest as u32), CoreId(source as u32)).unwrap(),
                        !queue.is_empty()
                    );
                }
            }
        }
    }
}

#[test]
fn wait_any_prefers_lowest_source() {
    let mb = mailbox(4, 4);
    mb.try_put(CoreId(3), CoreId(0), 3).unwrap();
    mb.try_put(CoreId(1), CoreId(0), 1).unwrap();
    for _ in 0..10 {
        // Never source 3 while source 1 is ready
        assert_eq!(mb.wait_any(CoreId(0), &mut SpinWait).unwrap(), CoreId(1));
    }
    assert_eq!(mb.get_any(CoreId(0)).unwrap(), 1);
    assert_eq!(mb.wait_any(CoreId(0), &mut SpinWait).unwrap(), CoreId(3));
    assert_eq!(mb.get_any(CoreId(0)).unwrap(), 3);
}

#[test]
fn get_any_after_wait_any_returns_oldest() {
    let mb = mailbox(4, 4);
    mb.try_put(CoreId(2), CoreId(3), 20).unwrap();
    mb.try_put(CoreId(2), CoreId(3), 21).unwrap();
    assert_eq!(mb.wait_any(CoreId(3), &mut SpinWait).unwrap(), CoreId(2));
    assert_eq!(mb.get_any(CoreId(3)).unwrap(), 20);

    let fresh = mailbox(4, 4);
    fresh.try_put(CoreId(2), CoreId(3), 20).unwrap();
    assert_eq!(
        fresh.get_any(CoreId(3)),
        Err(MailboxError::NoPendingSelection { core: CoreId(3) })
    );
}

#[test]
fn get_on_drained_channel_is_queue_empty() {
    let mb = mailbox(2, 2);
    mb.try_put(CoreId(0), CoreId(1), 9).unwrap();
    assert_eq!(mb.wait(CoreId(1), CoreId(0), &mut SpinWait).unwrap(), CoreId(0));
    assert_eq!(mb.get(CoreId(1), CoreId(0)).unwrap(), 9);
    // A second GET after a single positive WAIT is a caller error, not a stall
    assert_eq!(
        mb.get(CoreId(1), CoreId(0)),
        Err(MailboxError::QueueEmpty {
            channel: Channel::new(CoreId(0), CoreId(1))
        })
    );
    // and the mailbox keeps working afterwards
    mb.try_put(CoreId(0), CoreId(1), 10).unwrap();
    assert_eq!(mb.wait_any(CoreId(1), &mut SpinWait).unwrap(), CoreId(0));
    assert_eq!(mb.get_any(CoreId(1)).unwrap(), 10);
}

#[test]
fn specific_wait_and_get_end_to_end() {
    let mb = mailbox(4, 4);
    mb.try_put(CoreId(1), CoreId(0), 10).unwrap();
    mb.try_put(CoreId(2), CoreId(0), 20).unwrap();
    mb.try_put(CoreId(2), CoreId(0), 21).unwrap();

    let source = mb.wait_any(CoreId(0), &mut SpinWait).unwrap();
    assert_eq!(source, CoreId(1));
    assert_eq!(mb.get(CoreId(0), source).unwrap(), 10);

    // WAIT on a specific source skips arbitration entirely
    assert_eq!(mb.wait(CoreId(0), CoreId(2), &mut SpinWait).unwrap(), CoreId(2));
    assert_eq!(mb.get(CoreId(0), CoreId(2)).unwrap(), 20);
    assert_eq!(mb.wait(CoreId(0), CoreId(2), &mut SpinWait).unwrap(), CoreId(2));
    assert_eq!(mb.get_any(CoreId(0)).unwrap(), 21);
    assert_eq!(mb.poll_any(CoreId(0)).unwrap(), ReadyMask::EMPTY);
    assert_eq!(mb.inbox_stats(CoreId(0)).unwrap().pending, None);
}

#[test]
fn invalid_core_leaves_everyone_untouched() {
    let mb = mailbox(4, 2);
    mb.try_put(CoreId(1), CoreId(0), 1).unwrap();
    mb.try_put(CoreId(2), CoreId(3), 2).unwrap();
    mb.try_put(CoreId(3), CoreId(3), 3).unwrap();
    mb.wait_any(CoreId(3), &mut SpinWait).unwrap();
    let before = snapshot(&mb);

    assert_invalid(mb.try_put(CoreId(2), CoreId(4), 9));
    assert_invalid(mb.try_put(CoreId(7), CoreId(0), 9));
    assert_invalid(mb.put(CoreId(1), CoreId(64), 9, &mut SpinWait));
    assert_invalid(mb.get(CoreId(0), CoreId(5)));
    assert_invalid(mb.get_any(CoreId(4)));
    assert_invalid(mb.wait(CoreId(3), CoreId(9), &mut SpinWait));
    assert_invalid(mb.wait_any(CoreId(4), &mut SpinWait));
    assert_invalid(mb.poll_any(CoreId(4)));
    assert_invalid(mb.poll(CoreId(0), CoreId(4)));
    assert_invalid(mb.m_try_put(CoreId(0), CoreId(4), 1));

    assert_eq!(snapshot(&mb), before);
}
