// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    first   = { 1, 500 },
    second  = { 2, 1000 },
    third   = { 3, 2000 },
    capped  = { 7, 30000 },
    huge    = { 64, 30000 },
)]
fn delay_doubles_and_caps(attempt: u32, expected_ms: u64) {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_for(attempt), Duration::from_millis(expected_ms));
}

#[test]
fn backoff_gives_up_at_ceiling() {
    let mut backoff = RetryPolicy::default().max_attempts(3).backoff();
    assert!(backoff.fail().is_some());
    assert!(backoff.fail().is_some());
    assert_eq!(backoff.fail(), None);
    assert_eq!(backoff.attempts(), 3);
}

#[test]
fn reset_restarts_the_sequence() {
    let policy = RetryPolicy::default().base_delay(Duration::from_millis(10));
    let mut backoff = policy.backoff();
    backoff.fail();
    backoff.fail();
    backoff.reset();
    assert_eq!(backoff.attempts(), 0);
    assert_eq!(backoff.fail(), Some(Duration::from_millis(10)));
}

#[test]
fn single_attempt_never_retries() {
    let mut backoff = RetryPolicy::default().max_attempts(1).backoff();
    assert_eq!(backoff.fail(), None);
}
