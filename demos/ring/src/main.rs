/*
 * Ball-Passing Ring
 *
 * Every hart runs on its own host thread. Hart 0 starts a ball with value 100
 * and sends it to its next neighbour; each hart WAITs for any source, checks
 * the ball came from its previous neighbour, GETs it and passes it on
 * incremented by one.
 *
 * A ball arriving from the wrong hart ends the run with a recognizable exit
 * code: 100*source + 10*expected (+ hart, for harts other than 0).
 *
 * Usage: sage-ring [CORES] [LAPS] [-v|-vv]
 */

use std::process::ExitCode;
use std::thread;

use clap::{ArgAction, Parser};
use sage_mailbox::{
    logger, CoreId, Mailbox, MailboxConfig, MailboxError, YieldWait, DEFAULT_CORES, MAX_CORES,
};

const DEFAULT_LAPS: u64 = 100;
const START_VALUE: u64 = 100;

/// Clockwise neighbours on the ring
fn next_neighbor(hart: u32, cores: u32) -> CoreId {
    CoreId(if hart == cores - 1 { 0 } else { hart + 1 })
}

fn prev_neighbor(hart: u32, cores: u32) -> CoreId {
    CoreId(if hart == 0 { cores - 1 } else { hart - 1 })
}

/// Loop run by every hart except 0
fn pass_ball(mb: &Mailbox, hart: u32, laps: u64) -> Result<Option<u8>, MailboxError> {
    let cores = mb.config().cores() as u32;
    let me = CoreId(hart);
    let prev = prev_neighbor(hart, cores);

    for _ in 0..laps {
        let source = mb.wait_any(me, &mut YieldWait)?;
        if source != prev {
            return Ok(Some(wrong_source_code(source, prev, hart)));
        }
        let ball = mb.get_any(me)?;
        mb.put(me, next_neighbor(hart, cores), ball + 1, &mut YieldWait)?;
    }
    Ok(None)
}

/// Loop run by hart 0: start the ball and report every lap
fn start_ball(mb: &Mailbox, laps: u64) -> Result<Option<u8>, MailboxError> {
    let cores = mb.config().cores() as u32;
    let me = CoreId(0);
    let next = next_neighbor(0, cores);
    let prev = prev_neighbor(0, cores);

    log::info!("Started the ball rolling with value {} sent to core {}", START_VALUE, next.0);
    mb.put(me, next, START_VALUE, &mut YieldWait)?;

    for lap in 0..laps {
        let source = mb.wait_any(me, &mut YieldWait)?;
        if source != prev {
            return Ok(Some(wrong_source_code(source, prev, 0)));
        }
        let ball = mb.get_any(me)?;
        log::info!("Received ball value {} from core {}", ball, source.0);
        // The other harts stop after `laps` passes; don't feed a ball nobody takes
        if lap + 1 < laps {
            mb.put(me, next, ball + 1, &mut YieldWait)?;
        }
    }
    Ok(None)
}

fn wrong_source_code(source: CoreId, expected: CoreId, hart: u32) -> u8 {
    (100 * source.0 + 10 * expected.0 + hart) as u8
}

/// Pass a ball around a ring of harts
#[derive(Parser, Debug)]
#[command(name = "sage-ring", version, about)]
struct Args {
    /// Number of harts on the ring (a ring needs at least two)
    #[arg(
        default_value_t = DEFAULT_CORES as u32,
        value_parser = clap::value_parser!(u32).range(2..=MAX_CORES as i64)
    )]
    cores: u32,

    /// Laps hart 0 waits for before stopping
    #[arg(default_value_t = DEFAULT_LAPS)]
    laps: u64,

    /// More output per occurrence (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if logger::init(logger::level_from_verbosity(usize::from(args.verbose))).is_err() {
        eprintln!("logger already installed");
    }
    let laps = args.laps;

    // Depth 1: every hart holds at most one ball in flight
    let config = match MailboxConfig::new(args.cores as usize, 1) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Bad configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mb = Mailbox::new(config);

    let results: Vec<Result<Option<u8>, MailboxError>> = thread::scope(|s| {
        let handles: Vec<_> = (1..config.cores() as u32)
            .map(|hart| {
                let mb = &mb;
                s.spawn(move || pass_ball(mb, hart, laps))
            })
            .collect();
        let mut results = vec![start_ball(&mb, laps)];
        results.extend(handles.into_iter().map(|h| h.join().unwrap_or(Ok(Some(1)))));
        results
    });

    for (hart, result) in results.into_iter().enumerate() {
        match result {
            Ok(None) => {}
            Ok(Some(code)) => {
                log::error!("Hart {} received the ball from the wrong neighbour", hart);
                return ExitCode::from(code);
            }
            Err(e) => {
                log::error!("Hart {} failed: {}", hart, e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
