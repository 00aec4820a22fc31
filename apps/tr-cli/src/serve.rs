//! Real-time regulator loop with the JSON command interface on stdio.
//!
//! A reader thread forwards raw stdin bytes; the main loop waits for input
//! until the next tick is due, so commands are answered between ticks and
//! never delay one.

use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use tr_controls::SampleClock;
use tr_io::RecordingSink;
use tr_protocol::CommandSession;

use crate::error::CliResult;
use crate::simulate;

pub fn run(config_path: &Path) -> CliResult<()> {
    let mut engine = simulate::load_engine(config_path)?;

    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    thread::spawn(move || {
        let mut stdin = io::stdin().lock();
        let mut buf = [0u8; 256];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
    });

    let start = Instant::now();
    let now_ms = || start.elapsed().as_millis() as u64;
    let mut clock = SampleClock::new(engine.sample_config(), now_ms());
    let mut session = CommandSession::new();
    let mut sink = RecordingSink::default();
    let mut out = io::stdout().lock();

    info!(period_ms = engine.sample_config().period_ms, "regulator running");
    loop {
        let wait = clock.time_until_sample(now_ms());
        match rx.recv_timeout(Duration::from_millis(wait)) {
            Ok(bytes) => {
                for response in session.feed(&bytes, &mut engine, now_ms()) {
                    writeln!(out, "{}", response.to_json())?;
                }
                out.flush()?;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("input closed, stopping");
                break;
            }
        }

        let now = now_ms();
        if clock.should_sample(now) {
            simulate::step(&mut engine, &mut sink, now);
            clock.advance(now);
        }
    }
    Ok(())
}
