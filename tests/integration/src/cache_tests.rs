//! Cache client integration tests
//!
//! TTL selection, the wire envelope, fallback behavior, capacity trimming,
//! and safe defaults on remote failure.

use crate::helpers::*;
use failover_core::{CacheConfig, Envelope, TtlContext};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

/// Prefix-inferred TTLs match the context table
#[tokio::test]
async fn test_ttl_selection_by_prefix() {
    let store = MockStore::up();
    let (client, _clock) = test_client(store.clone());

    let cases = [
        ("room:1", 300),
        ("session:1", 1800),
        ("chat:1", 3600),
        ("signaling:1", 120),
        ("presence:1", 600),
    ];

    for (key, expected_ttl) in cases {
        client.set_with_ttl(key, &json!("v"), None).await;
        assert_eq!(store.ttl_for(key), Some(expected_ttl), "key {key}");
    }
}

/// An explicit context overrides prefix inference
#[tokio::test]
async fn test_explicit_context_override() {
    let store = MockStore::up();
    let (client, _clock) = test_client(store.clone());

    client
        .set_with_ttl("room:1", &json!("v"), Some(TtlContext::Session))
        .await;

    assert_eq!(store.ttl_for("room:1"), Some(1800));
}

/// Small payloads are stored uncompressed, large ones compressed, and both
/// read back identical to the original
#[tokio::test]
async fn test_compression_threshold_and_round_trip() {
    let store = MockStore::up();
    let (client, _clock) = test_client(store.clone());

    let small = json!({"note": "short"});
    client.set_with_ttl("chat:small", &small, None).await;

    let raw = store.payload_for("chat:small").expect("written");
    let envelope: Envelope = serde_json::from_str(&raw).expect("envelope json");
    assert!(!envelope.compressed);

    let large = json!({"blob": "z".repeat(5000)});
    client.set_with_ttl("chat:large", &large, None).await;

    let raw = store.payload_for("chat:large").expect("written");
    let envelope: Envelope = serde_json::from_str(&raw).expect("envelope json");
    assert!(envelope.compressed);

    let got: Option<Value> = client.get_with_fallback("chat:small").await;
    assert_eq!(got, Some(small));
    let got: Option<Value> = client.get_with_fallback("chat:large").await;
    assert_eq!(got, Some(large));
}

/// With the remote forced unreachable, a write followed by a read returns a
/// value deep-equal to the original
#[tokio::test]
async fn test_fallback_round_trip_while_degraded() {
    let store = MockStore::up();
    let (client, _clock) = test_client(store.clone());
    force_degraded(&store, &client).await;

    let value = json!({"from": "a", "to": "b", "body": "hello"});
    client.set_with_ttl("chat:x", &value, None).await;

    let got: Option<Value> = client.get_with_fallback("chat:x").await;
    assert_eq!(got, Some(value));

    // Nothing reached the remote
    assert_eq!(store.call_count("set_ex"), 0);
    assert_eq!(store.call_count("get"), 0);
}

/// A fallback entry honors its TTL against the injected clock
#[tokio::test]
async fn test_fallback_expiry() {
    let store = MockStore::up();
    let (client, clock) = test_client(store.clone());
    force_degraded(&store, &client).await;

    // signaling context: 120 s
    client.set_with_ttl("signaling:s", &json!(1), None).await;

    clock.advance(119_999);
    let got: Option<Value> = client.get_with_fallback("signaling:s").await;
    assert_eq!(got, Some(json!(1)));

    clock.advance(1);
    let got: Option<Value> = client.get_with_fallback("signaling:s").await;
    assert_eq!(got, None);
}

/// Exceeding the fallback capacity trims the oldest entries by expiry
#[tokio::test]
async fn test_fallback_capacity_trim() {
    let store = MockStore::up();
    let config = CacheConfig::builder().fallback_capacity(5000).build();
    let (client, clock) = test_client_with_config(store.clone(), config);
    force_degraded(&store, &client).await;

    // Distinct expiries: each write lands one clock tick later
    for i in 0..5001u32 {
        client.set_with_ttl(&format!("chat:{i}"), &json!(i), None).await;
        clock.advance(1);
    }

    let snap = client.metrics();
    assert!(snap.cache_size <= 5000, "size {}", snap.cache_size);
    // ceil(5001 * 0.10) = 501 evicted
    assert_eq!(snap.cache_size, 4500);

    // Earliest expiries were removed first
    let got: Option<Value> = client.get_with_fallback("chat:0").await;
    assert_eq!(got, None);
    let got: Option<Value> = client.get_with_fallback("chat:500").await;
    assert_eq!(got, None);
    let got: Option<Value> = client.get_with_fallback("chat:501").await;
    assert_eq!(got, Some(json!(501)));
    let got: Option<Value> = client.get_with_fallback("chat:5000").await;
    assert_eq!(got, Some(json!(5000)));
}

/// Deleting a key removes it from the remote and the fallback map alike
#[tokio::test]
async fn test_del_busts_both_tiers() {
    let store = MockStore::up();
    let (client, _clock) = test_client(store.clone());

    client.set_with_ttl("user:1", &json!("cached"), None).await;

    // Park a fallback copy through a transient write failure
    store.set_available(false);
    client.set_with_ttl("user:1", &json!("parked"), None).await;
    store.set_available(true);

    assert_eq!(client.del(&["user:1"]).await, 1);

    let got: Option<Value> = client.get_with_fallback("user:1").await;
    assert_eq!(got, None);

    // Even degraded, the parked copy is gone
    force_degraded(&store, &client).await;
    let got: Option<Value> = client.get_with_fallback("user:1").await;
    assert_eq!(got, None);
}

/// Read-side operations return safe defaults when the remote fails while
/// the client still believes it is healthy
#[tokio::test]
async fn test_safe_defaults_on_remote_failure() {
    let store = MockStore::up();
    let (client, _clock) = test_client(store.clone());

    store.set_available(false);
    assert!(client.is_healthy());

    let got: Option<Value> = client.get_with_fallback("missing").await;
    assert_eq!(got, None);
    assert_eq!(client.del(&["missing"]).await, 0);
    assert_eq!(client.exists(&["missing"]).await, 0);
    assert!(!client.expire("missing", 60).await);
    assert_eq!(client.lpush("queue", &[json!(1)]).await, 0);
    assert_eq!(client.lrange("queue", 0, -1).await, Vec::<String>::new());
    assert_eq!(client.publish("events", "msg").await, 0);

    let snap = client.metrics();
    assert!(snap.total_errors >= 6);
    assert!(snap.error_rate > 0.0);
}

/// List operations work in both modes with Redis index semantics
#[tokio::test]
async fn test_list_operations_both_modes() {
    let store = MockStore::up();
    let (client, _clock) = test_client(store.clone());

    assert_eq!(client.lpush("log", &[json!("a"), json!("b")]).await, 2);
    assert_eq!(client.lrange("log", 0, -1).await, vec!["\"b\"", "\"a\""]);
    assert_eq!(client.lrange("log", 0, 0).await, vec!["\"b\""]);

    force_degraded(&store, &client).await;

    assert_eq!(client.lpush("offline", &[json!("x"), json!("y")]).await, 2);
    assert_eq!(
        client.lrange("offline", 0, -1).await,
        vec!["\"y\"", "\"x\""]
    );
    assert_eq!(client.lrange("offline", -1, -1).await, vec!["\"x\""]);
    assert_eq!(client.lrange("offline", 5, 9).await, Vec::<String>::new());
}

/// Publish is forwarded when healthy and dropped when degraded
#[tokio::test]
async fn test_publish_modes() {
    let store = MockStore::up();
    let (client, _clock) = test_client(store.clone());

    assert_eq!(client.publish("events", "up").await, 1);
    assert_eq!(store.call_count("publish"), 1);

    force_degraded(&store, &client).await;
    assert_eq!(client.publish("events", "down").await, 0);
    // No remote call was attempted
    assert_eq!(store.call_count("publish"), 1);
}

/// The compression-ratio metric reports retained samples over total
/// operations, as consumed by existing dashboards
#[tokio::test]
async fn test_compression_ratio_formula_pinned() {
    let store = MockStore::up();
    let config = CacheConfig::builder().latency_window(10).build();
    let (client, _clock) = test_client_with_config(store.clone(), config);

    for i in 0..40 {
        client.set_with_ttl(&format!("k{i}"), &json!(i), None).await;
    }

    let snap = client.metrics();
    assert_eq!(snap.total_operations, 40);
    assert!((snap.compression_ratio - 25.0).abs() < f64::EPSILON);
}
