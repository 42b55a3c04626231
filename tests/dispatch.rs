//! Dispatcher integration tests.
//!
//! Drives the full validate, frame, attempt and aggregate sequence against a
//! scripted transport.

mod common;

use common::{assert_err, assert_ok, FixedPool, ScriptedTransport, Step};
use memshard::config::MAX_REPLICAS;
use memshard::dispatch::AsciiKeyValidator;
use memshard::{ClientError, Dispatcher, Distribution, Host, Pool, PoolView, ReturnCode, Verb};

fn three_hosts() -> Vec<Host> {
    vec![
        Host::new("cache0", 11211),
        Host::new("cache1", 11211),
        Host::new("cache2", 11211),
    ]
}

// =============================================================================
// Preconditions
// =============================================================================

#[test]
fn test_empty_key_makes_no_transport_calls() {
    let pool = FixedPool::new(3, 0, 3, Distribution::Consistent);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"1\r\n", 3));

    let err = assert_err(dispatcher.increment(&pool, b"", 1));
    assert!(matches!(err, ClientError::NoKeyProvided));
    assert_eq!(err.code(), ReturnCode::NoKeyProvided);
    assert_eq!(dispatcher.transport().call_count(), 0);
    assert_eq!(pool.hash_calls.get(), 0);
}

#[test]
fn test_empty_pool_skips_hashing() {
    let pool = FixedPool::new(0, 0, 1, Distribution::Modula);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::default());

    let err = assert_err(dispatcher.increment(&pool, b"counter", 1));
    assert_eq!(err.code(), ReturnCode::NoServers);
    assert_eq!(pool.hash_calls.get(), 0);
    assert_eq!(dispatcher.transport().call_count(), 0);
}

#[test]
fn test_empty_real_pool_reports_no_servers() {
    let pool = Pool::new(Vec::new(), Distribution::Consistent);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::default());

    let err = assert_err(dispatcher.decrement(&pool, b"counter", 1));
    assert!(matches!(err, ClientError::NoServers));
}

#[test]
fn test_verify_key_rejects_bad_keys() {
    let pool = FixedPool::new(1, 0, 1, Distribution::Modula).with_verify_key();
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"1\r\n", 1));

    let err = assert_err(dispatcher.increment(&pool, b"has space", 1));
    assert_eq!(err.code(), ReturnCode::BadKeyProvided);
    assert_eq!(dispatcher.transport().call_count(), 0);

    let long_key = vec![b'k'; 251];
    let err = assert_err(dispatcher.increment(&pool, &long_key, 1));
    assert_eq!(err.code(), ReturnCode::BadKeyProvided);

    assert_eq!(assert_ok(dispatcher.increment(&pool, b"fine", 1)), 1);
}

#[test]
fn test_verify_key_off_passes_keys_through() {
    let pool = FixedPool::new(1, 0, 1, Distribution::Modula);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"5\r\n", 1));

    assert_eq!(assert_ok(dispatcher.increment(&pool, b"has space", 1)), 5);
    assert_eq!(
        dispatcher.transport().sends[0].1,
        b"incr has space 1\r\n".to_vec()
    );
}

#[test]
fn test_custom_validator() {
    let pool = FixedPool::new(1, 0, 1, Distribution::Modula).with_verify_key();
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"1\r\n", 1))
        .with_validator(|key: &[u8]| key.starts_with(b"app:"));

    let err = assert_err(dispatcher.increment(&pool, b"other", 1));
    assert_eq!(err.code(), ReturnCode::BadKeyProvided);
    assert_eq!(assert_ok(dispatcher.increment(&pool, b"app:hits", 1)), 1);
}

#[test]
fn test_oversized_command_makes_no_transport_calls() {
    let pool = FixedPool::new(1, 0, 1, Distribution::Modula);
    let mut dispatcher =
        Dispatcher::with_command_size(ScriptedTransport::replying(b"1\r\n", 1), 16);

    let err = assert_err(dispatcher.increment(&pool, b"a-rather-long-key", 1));
    assert!(matches!(err, ClientError::CommandTooLong(_)));
    assert_eq!(err.code(), ReturnCode::WriteFailure);
    assert_eq!(dispatcher.transport().call_count(), 0);
}

// =============================================================================
// Framing
// =============================================================================

#[test]
fn test_frames_are_sent_verbatim() {
    let pool = FixedPool::new(2, 1, 1, Distribution::Modula);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"9\r\n", 2));

    assert_ok(dispatcher.increment(&pool, b"hits", 4));
    assert_ok(dispatcher.dispatch(&pool, Verb::Decr, b"hits", 4_294_967_295));

    let sends = &dispatcher.transport().sends;
    assert_eq!(sends[0], (1, b"incr hits 4\r\n".to_vec()));
    assert_eq!(sends[1], (1, b"decr hits 4294967295\r\n".to_vec()));
}

// =============================================================================
// Replica fail-over
// =============================================================================

#[test]
fn test_single_replica_is_one_round_trip() {
    let pool = FixedPool::new(3, 2, 1, Distribution::Consistent);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"42\r\n", 1));

    assert_eq!(assert_ok(dispatcher.increment(&pool, b"counter", 1)), 42);
    let transport = dispatcher.transport();
    assert_eq!(transport.visited(), vec![2]);
    assert_eq!(transport.receives, vec![2]);
    assert_eq!(dispatcher.stats().snapshot().ring_advances, 0);
}

#[test]
fn test_zero_replicas_still_attempts_once() {
    let pool = FixedPool::new(2, 0, 0, Distribution::Modula);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"3\r\n", 1));

    assert_eq!(assert_ok(dispatcher.increment(&pool, b"counter", 1)), 3);
    assert_eq!(dispatcher.transport().sends.len(), 1);
}

#[test]
fn test_consistent_ring_walk_order() {
    let pool = FixedPool::new(5, 1, 3, Distribution::Consistent);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"NOT_FOUND\r\n", 3));

    assert_err(dispatcher.increment(&pool, b"counter", 1));
    assert_eq!(dispatcher.transport().visited(), vec![1, 1, 2]);
}

#[test]
fn test_consistent_ring_walk_wraps() {
    let pool = FixedPool::new(3, 2, 5, Distribution::Consistent);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"ERROR\r\n", 5));

    assert_err(dispatcher.increment(&pool, b"counter", 1));
    assert_eq!(dispatcher.transport().visited(), vec![2, 2, 0, 1, 2]);
    assert_eq!(dispatcher.stats().snapshot().ring_advances, 3);
}

#[test]
fn test_modula_never_advances() {
    let pool = FixedPool::new(3, 1, 4, Distribution::Modula);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"NOT_FOUND\r\n", 4));

    assert_err(dispatcher.increment(&pool, b"counter", 1));
    assert_eq!(dispatcher.transport().visited(), vec![1, 1, 1, 1]);
    assert_eq!(dispatcher.stats().snapshot().ring_advances, 0);
}

#[test]
fn test_every_replica_is_attempted_after_success() {
    let pool = FixedPool::new(3, 0, 3, Distribution::Consistent);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"1\r\n", 3));

    assert_eq!(assert_ok(dispatcher.increment(&pool, b"counter", 1)), 1);
    assert_eq!(dispatcher.transport().sends.len(), 3);
}

#[test]
fn test_send_failure_skips_receive() {
    let pool = FixedPool::new(3, 0, 2, Distribution::Consistent);
    let script = [Step::SendFails, Step::Reply(b"11\r\n")];
    let mut dispatcher = Dispatcher::new(ScriptedTransport::new(script));

    assert_eq!(assert_ok(dispatcher.increment(&pool, b"counter", 1)), 11);
    let transport = dispatcher.transport();
    assert_eq!(transport.sends.len(), 2);
    assert_eq!(transport.receives.len(), 1);
}

// =============================================================================
// Classification and aggregation
// =============================================================================

#[test]
fn test_error_reply_is_protocol_error() {
    let pool = FixedPool::new(1, 0, 1, Distribution::Modula);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"ERROR\r\n", 1));

    let err = assert_err(dispatcher.increment(&pool, b"counter", 1));
    assert!(matches!(err, ClientError::ProtocolError));
    assert_eq!(err.code(), ReturnCode::ProtocolError);
}

#[test]
fn test_not_found_reply() {
    let pool = FixedPool::new(1, 0, 1, Distribution::Modula);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"NOT_FOUND\r\n", 1));

    let err = assert_err(dispatcher.decrement(&pool, b"counter", 1));
    assert_eq!(err.code(), ReturnCode::NotFound);
}

#[test]
fn test_numeric_reply() {
    let pool = FixedPool::new(1, 0, 1, Distribution::Modula);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"42\r\n", 1));

    assert_eq!(assert_ok(dispatcher.increment(&pool, b"counter", 1)), 42);
}

#[test]
fn test_success_after_failures_wins() {
    let pool = FixedPool::new(3, 0, 3, Distribution::Consistent);
    let script = [
        Step::Reply(b"ERROR\r\n"),
        Step::Reply(b"NOT_FOUND\r\n"),
        Step::Reply(b"7\r\n"),
    ];
    let mut dispatcher = Dispatcher::new(ScriptedTransport::new(script));

    assert_eq!(assert_ok(dispatcher.increment(&pool, b"counter", 1)), 7);
}

#[test]
fn test_early_success_survives_later_failures() {
    let pool = FixedPool::new(3, 0, 3, Distribution::Consistent);
    let script = [
        Step::Reply(b"8\r\n"),
        Step::ReadTimeout,
        Step::Reply(b"NOT_FOUND\r\n"),
    ];
    let mut dispatcher = Dispatcher::new(ScriptedTransport::new(script));

    assert_eq!(assert_ok(dispatcher.increment(&pool, b"counter", 1)), 8);
}

#[test]
fn test_all_failures_report_first_attempt() {
    let pool = FixedPool::new(3, 0, 3, Distribution::Consistent);
    let script = [
        Step::ReadTimeout,
        Step::Reply(b"NOT_FOUND\r\n"),
        Step::Reply(b"ERROR\r\n"),
    ];
    let mut dispatcher = Dispatcher::new(ScriptedTransport::new(script));

    let err = assert_err(dispatcher.increment(&pool, b"counter", 1));
    assert_eq!(err.code(), ReturnCode::Timeout);

    let script = [Step::Reply(b"NOT_FOUND\r\n"), Step::SendFails, Step::ReadTimeout];
    let mut dispatcher = Dispatcher::new(ScriptedTransport::new(script));
    let err = assert_err(dispatcher.increment(&pool, b"counter", 1));
    assert_eq!(err.code(), ReturnCode::NotFound);
}

#[test]
fn test_send_failure_reports_write_failure() {
    let pool = FixedPool::new(1, 0, 1, Distribution::Modula);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::new([Step::SendFails]));

    let err = assert_err(dispatcher.increment(&pool, b"counter", 1));
    assert_eq!(err.code(), ReturnCode::WriteFailure);
}

#[test]
fn test_reply_buffer_is_cleared_between_attempts() {
    let pool = FixedPool::new(2, 0, 2, Distribution::Modula);
    let script = [Step::Reply(b"ERROR\r\n"), Step::Reply(b"5\r\n")];
    let mut dispatcher = Dispatcher::new(ScriptedTransport::new(script));

    // Left over, the first reply would turn the second into "ERROR\r\n5\r\n".
    assert_eq!(assert_ok(dispatcher.increment(&pool, b"counter", 1)), 5);
}

#[test]
fn test_replica_count_is_capped() {
    let pool = FixedPool::new(3, 0, u32::MAX, Distribution::Consistent);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"2\r\n", 1));

    // Attempts past the script fail at send; the first one's value still wins.
    assert_eq!(assert_ok(dispatcher.increment(&pool, b"counter", 1)), 2);
    assert_eq!(dispatcher.transport().sends.len(), MAX_REPLICAS as usize);
    assert_eq!(dispatcher.transport().receives.len(), 1);
    assert_eq!(
        dispatcher.stats().snapshot().attempts,
        u64::from(MAX_REPLICAS)
    );
}

// =============================================================================
// Stats
// =============================================================================

#[test]
fn test_stats_follow_dispatch() {
    let pool = FixedPool::new(3, 0, 3, Distribution::Consistent);
    let script = [
        Step::Reply(b"ERROR\r\n"),
        Step::Reply(b"NOT_FOUND\r\n"),
        Step::ReadTimeout,
    ];
    let mut dispatcher = Dispatcher::new(ScriptedTransport::new(script));

    assert_err(dispatcher.increment(&pool, b"counter", 1));
    assert_err(dispatcher.increment(&pool, b"", 1));

    let snap = dispatcher.stats().snapshot();
    assert_eq!(snap.requests, 2);
    assert_eq!(snap.rejected, 1);
    assert_eq!(snap.successes, 0);
    assert_eq!(snap.attempts, 3);
    assert_eq!(snap.ring_advances, 1);
    assert_eq!(snap.protocol_errors, 1);
    assert_eq!(snap.not_found, 1);
    assert_eq!(snap.transport_failures, 1);
}

// =============================================================================
// Real pool
// =============================================================================

#[test]
fn test_real_pool_routes_through_hasher() {
    let pool = Pool::new(three_hosts(), Distribution::Consistent).with_replicas(3);
    let start = pool.server_for_key(b"session:42");
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"NOT_FOUND\r\n", 3));

    assert_err(dispatcher.increment(&pool, b"session:42", 1));
    assert_eq!(
        dispatcher.transport().visited(),
        vec![start, start, (start + 1) % 3]
    );
}

#[test]
fn test_single_host_pool_always_uses_first_server() {
    let pool = Pool::new(vec![Host::new("cache0", 11211)], Distribution::Modula);
    let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(b"1\r\n", 3))
        .with_validator(AsciiKeyValidator);

    for key in [b"a", b"b", b"c"] {
        assert_ok(dispatcher.increment(&pool, key, 1));
    }
    assert_eq!(dispatcher.transport().visited(), vec![0, 0, 0]);
}
