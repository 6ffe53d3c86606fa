/*
 * Broadcast to Hart 0
 *
 * Every hart other than 0 sends eight words to hart 0, encoding its own id
 * and a sequence number as 100*hart + i. Hart 0 waits for the first message,
 * then drains its inbox with POLL_ANY: the lowest set bit names the source
 * to GET from, until the readiness mask comes back empty.
 *
 * Usage: sage-broadcast [CORES] [DEPTH] [-v|-vv]
 */

use std::process::ExitCode;
use std::thread;

use clap::{ArgAction, Parser};
use sage_mailbox::{
    logger, CoreId, Mailbox, MailboxConfig, MailboxError, YieldWait, DEFAULT_CORES,
    DEFAULT_QUEUE_DEPTH, MAX_CORES,
};

const MESSAGES_PER_HART: u64 = 8;

fn send_all(mb: &Mailbox, hart: u32) -> Result<(), MailboxError> {
    for i in 0..MESSAGES_PER_HART {
        mb.put(CoreId(hart), CoreId(0), 100 * u64::from(hart) + i, &mut YieldWait)?;
    }
    Ok(())
}

/// Hart 0: drain until every sender's words have arrived
fn receive_all(mb: &Mailbox) -> Result<u64, MailboxError> {
    let me = CoreId(0);
    let expected = (mb.config().cores() as u64 - 1) * MESSAGES_PER_HART;
    let mut received = 0;

    while received < expected {
        mb.wait_any(me, &mut YieldWait)?;
        let mut poll_bits = mb.poll_any(me)?;
        while let Some(source) = poll_bits.lowest() {
            let message = mb.get(me, source)?;
            println!(
                "Received message from hart {}: {}, pollBits={}",
                source.0, message, poll_bits
            );
            received += 1;
            poll_bits = mb.poll_any(me)?;
        }
    }
    Ok(received)
}

/// Every hart sends eight words to hart 0, which drains them by polling
#[derive(Parser, Debug)]
#[command(name = "sage-broadcast", version, about)]
struct Args {
    /// Number of harts, hart 0 included
    #[arg(
        default_value_t = DEFAULT_CORES as u32,
        value_parser = clap::value_parser!(u32).range(1..=MAX_CORES as i64)
    )]
    cores: u32,

    /// Per-channel queue depth
    #[arg(
        default_value_t = DEFAULT_QUEUE_DEPTH as u32,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    depth: u32,

    /// More output per occurrence (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if logger::init(logger::level_from_verbosity(usize::from(args.verbose))).is_err() {
        eprintln!("logger already installed");
    }

    let config = match MailboxConfig::new(args.cores as usize, args.depth as usize) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Bad configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mb = Mailbox::new(config);

    let outcome = thread::scope(|s| {
        for hart in 1..config.cores() as u32 {
            let mb = &mb;
            s.spawn(move || {
                if let Err(e) = send_all(mb, hart) {
                    log::error!("Hart {} failed to send: {}", hart, e);
                }
            });
        }
        receive_all(&mb)
    });

    match outcome {
        Ok(received) => {
            log::info!("Hart 0 received {} messages", received);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Hart 0 failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
