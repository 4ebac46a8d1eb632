// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::time::{Duration, Instant};

use tracing::debug;

/// If a tick is this many periods late, the ticker gives up on catching up and starts
/// counting from now.
const MAX_LAG_PERIODS: u32 = 64;

/// Ticker drives a periodic task at a fixed rate. Each deadline is computed from the previous
/// deadline rather than from when the task finished, so time spent in the task does not
/// accumulate as drift.
pub struct Ticker {
    period: Duration,
    next: Option<Instant>,
}

impl Ticker {
    /// Creates a ticker that fires `rate_hz` times per second.
    pub fn new(rate_hz: u32) -> Ticker {
        Ticker {
            period: Duration::from_secs(1) / rate_hz.max(1),
            next: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleeps until the next deadline. The first call returns immediately.
    pub fn wait(&mut self) {
        let now = Instant::now();
        let deadline = match self.next {
            Some(deadline) => deadline,
            None => {
                self.next = Some(now + self.period);
                return;
            }
        };

        if deadline > now {
            spin_sleep::sleep(deadline - now);
            self.next = Some(deadline + self.period);
        } else if now - deadline > self.period * MAX_LAG_PERIODS {
            debug!(
                behind = ?(now - deadline),
                "Ticker fell too far behind, resynchronizing."
            );
            self.next = Some(now + self.period);
        } else {
            self.next = Some(deadline + self.period);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period() {
        assert_eq!(Ticker::new(1000).period(), Duration::from_millis(1));
        assert_eq!(Ticker::new(20_000).period(), Duration::from_micros(50));
        assert_eq!(Ticker::new(0).period(), Duration::from_secs(1));
    }

    #[test]
    fn test_wait_paces_ticks() {
        let mut ticker = Ticker::new(200);
        let start = Instant::now();
        for _ in 0..11 {
            ticker.wait();
        }
        // Ten full periods of 5ms.
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
