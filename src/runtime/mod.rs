// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime utilities for resilience.
//!
//! This module provides the retry policies and backoff strategies the AMT
//! client uses to survive the intermittent connectivity typical of
//! out-of-band management interfaces.

mod retry;

pub use retry::{
    is_transient, BackoffStrategy, ExponentialBackoff, FixedBackoff, NoBackoff, RetryConfig,
};
