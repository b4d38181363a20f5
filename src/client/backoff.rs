// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Exponential backoff for the retry loop.

use std::time::Duration;

use tokio::time::Instant;

use super::RetryOptions;

/// Per-loop backoff state.
#[derive(Debug)]
pub struct Backoff {
    opts: RetryOptions,
    current: Duration,
    retries: usize,
    started: Instant,
}

impl Backoff {
    pub fn new(opts: &RetryOptions) -> Self {
        Self {
            opts: opts.clone(),
            current: opts.initial_backoff.min(opts.max_backoff),
            retries: 0,
            started: Instant::now(),
        }
    }

    /// Number of retries granted so far.
    #[inline]
    pub fn retries(&self) -> usize {
        self.retries
    }

    /// Returns the delay before the next retry, or `None` once the retry
    /// budget (count or elapsed time) is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(max) = self.opts.max_retries {
            if self.retries >= max {
                return None;
            }
        }
        if let Some(max) = self.opts.max_elapsed {
            if self.started.elapsed() >= max {
                return None;
            }
        }

        let delay = self.jittered(self.current);
        self.retries += 1;
        let grown = (self.current.as_nanos() as f64 * self.opts.multiplier.max(1.0)) as u64;
        self.current = Duration::from_nanos(grown).min(self.opts.max_backoff);
        Some(delay)
    }

    fn jittered(&self, base: Duration) -> Duration {
        let factor = self.opts.randomization_factor.clamp(0.0, 1.0);
        if factor == 0.0 {
            return base.min(self.opts.max_backoff);
        }
        let delta = base.as_secs_f64() * factor;
        let low = base.as_secs_f64() - delta;
        let jitter = rand::random::<f64>() * 2.0 * delta;
        Duration::try_from_secs_f64((low + jitter).max(0.0))
            .map_or(self.opts.max_backoff, |d| d.min(self.opts.max_backoff))
    }
}
