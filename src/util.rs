use std::thread;
use std::time;

use failure;
use slog;

use controller;

/// Milliseconds since the clock was created.
pub struct MonotonicClock {
    start: time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            start: time::Instant::now(),
        }
    }
}

impl controller::Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        let elapsed = self.start.elapsed();
        elapsed.as_secs() * 1000 + u64::from(elapsed.subsec_millis())
    }

    fn sleep_ms(&self, ms: u64) {
        thread::sleep(time::Duration::from_millis(ms));
    }
}

/// Fixed-rate tick source.  Ticks that are missed because the caller
/// overran are skipped rather than bunched up.
pub struct Ticker {
    interval: time::Duration,
    next: time::Instant,
}

impl Ticker {
    pub fn new(interval: time::Duration) -> Self {
        Ticker {
            interval,
            next: time::Instant::now(),
        }
    }

    /// Blocks until the next tick is due.
    pub fn wait(&mut self) {
        self.next = advance(self.next, self.interval, time::Instant::now());
        let now = time::Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
        }
    }
}

fn advance(next: time::Instant, interval: time::Duration, now: time::Instant) -> time::Instant {
    let next = next + interval;
    if next > now {
        next
    } else {
        now
    }
}

/// Runs `job` once per `interval`, forever.  A failing job is logged and
/// retried on the next tick.
pub fn every<F>(log: &slog::Logger, name: &str, interval: time::Duration, mut job: F) -> !
where
    F: FnMut() -> Result<(), failure::Error>,
{
    debug!(log, "starting timer {:?}", name);

    let mut ticker = Ticker::new(interval);
    loop {
        tick(log, name, &mut job);
        ticker.wait();
    }
}

fn tick<F>(log: &slog::Logger, name: &str, job: &mut F)
where
    F: FnMut() -> Result<(), failure::Error>,
{
    debug!(log, "timer tick {:?}", name);
    if let Err(e) = job() {
        warn!(log, "{} failed, will retry later: {}", name, e);
    }
}
