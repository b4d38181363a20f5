// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the transaction client.

use std::time::Duration;

use crate::api::IsolationLevel;

/// Backoff parameters for transaction retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOptions {
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Growth factor applied after each retry.
    pub multiplier: f64,
    /// Fraction of each delay that is randomized (0 disables jitter).
    pub randomization_factor: f64,
    /// Maximum number of retries (None = unlimited).
    pub max_retries: Option<usize>,
    /// Maximum total time spent retrying (None = unlimited).
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
            randomization_factor: 0.15,
            max_retries: None,
            max_elapsed: None,
        }
    }
}

impl RetryOptions {
    /// Sets the initial backoff.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Sets the maximum backoff.
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the jitter fraction.
    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor;
        self
    }

    /// Limits the number of retries.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Limits the total time spent retrying.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }
}

/// Client-wide settings copied into every transaction a [`super::Db`] starts.
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub retry: RetryOptions,
    /// User priority; see [`crate::api::Transaction::make_priority`].
    pub user_priority: i32,
    pub isolation: IsolationLevel,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            retry: RetryOptions::default(),
            user_priority: 1,
            isolation: IsolationLevel::default(),
        }
    }
}

impl DbConfig {
    /// Sets the retry options.
    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the user priority.
    pub fn with_user_priority(mut self, user_priority: i32) -> Self {
        self.user_priority = user_priority;
        self
    }

    /// Sets the default isolation level.
    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }
}
