//! Behavioral tests for the event broadcast store.

use parking_lot::Mutex;
use proptest::prelude::*;
use safe_relay::{
    DeliveryError, EventStore, NewEvent, SequentialIds, Snapshot, StoreConfig, SystemClock,
};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn test_store(max_events: usize) -> EventStore {
    EventStore::with_generators(
        StoreConfig {
            max_events,
            ..Default::default()
        },
        SequentialIds::new(),
        SystemClock,
    )
    .unwrap()
}

fn new_event(address: &str) -> NewEvent {
    NewEvent::new(
        address,
        "EXECUTED_MULTISIG_TRANSACTION",
        "11155111",
        json!({"address": address, "safeTxHash": "0x00"}),
    )
}

fn ids(snapshot: &Snapshot) -> Vec<String> {
    snapshot.iter().map(|e| e.id.to_string()).collect()
}

/// Callback that records the ids of every notification it receives.
fn recorder() -> (
    Arc<Mutex<Vec<Vec<String>>>>,
    impl Fn(&Snapshot) -> Result<(), DeliveryError> + Send + Sync + 'static,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |snapshot: &Snapshot| -> Result<(), DeliveryError> {
        sink.lock().push(ids(snapshot));
        Ok(())
    })
}

// --- Scenarios ---

#[test]
fn test_address_scenario() {
    let store = test_store(100);
    let (seen, callback) = recorder();

    let a = store.record(new_event("0xAA"));
    let _sub = store.subscribe(callback).unwrap();
    let b = store.record(new_event("0xBB"));
    let a2 = store.record(new_event("0xAA"));

    let all = store.query(None);
    assert_eq!(ids(&all), [&a2.id, &b.id, &a.id].map(|id| id.to_string()));

    let only_aa = store.query(Some("0xaa"));
    assert_eq!(ids(&only_aa), [&a2.id, &a.id].map(|id| id.to_string()));

    // Subscribed after A: notified after B and after A2, unfiltered.
    assert_eq!(
        *seen.lock(),
        vec![
            vec![b.id.to_string(), a.id.to_string()],
            vec![a2.id.to_string(), b.id.to_string(), a.id.to_string()],
        ]
    );
}

#[test]
fn test_capacity_two_scenario() {
    let store = test_store(2);
    store.record(new_event("A"));
    store.record(new_event("B"));
    store.record(new_event("C"));

    let log = store.query(None);
    let addresses: Vec<_> = log.iter().map(|e| e.address.as_str()).collect();
    assert_eq!(addresses, ["C", "B"]);
}

// --- Queries ---

#[test]
fn test_query_nonexistent_address() {
    let store = test_store(10);
    store.record(new_event("0xAA"));
    assert!(store.query(Some("nonexistent")).is_empty());
}

#[test]
fn test_query_on_empty_store() {
    let store = test_store(10);
    assert!(store.query(None).is_empty());
    assert!(store.query(Some("0xAA")).is_empty());
}

#[test]
fn test_address_stored_verbatim() {
    let store = test_store(10);
    store.record(new_event("0xAbCdEf"));
    let found = store.query(Some("0XABCDEF"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].address, "0xAbCdEf");
}

#[test]
fn test_no_dedup() {
    let store = test_store(10);
    store.record(new_event("0xAA"));
    store.record(new_event("0xAA"));
    assert_eq!(store.len(), 2);
}

// --- Notifications ---

#[test]
fn test_subscribe_does_not_replay() {
    let store = test_store(10);
    store.record(new_event("0xAA"));
    let (seen, callback) = recorder();
    let _sub = store.subscribe(callback).unwrap();
    assert!(seen.lock().is_empty());
}

#[test]
fn test_notifications_in_registration_order() {
    let store = test_store(10);
    let order = Arc::new(Mutex::new(Vec::new()));

    let subs: Vec<_> = (0..3)
        .map(|i| {
            let order = Arc::clone(&order);
            store
                .subscribe(move |_| {
                    order.lock().push(i);
                    Ok(())
                })
                .unwrap()
        })
        .collect();

    store.record(new_event("0xAA"));
    assert_eq!(*order.lock(), vec![0, 1, 2]);
    drop(subs);
}

#[test]
fn test_failing_subscribers_are_isolated() {
    let store = test_store(10);
    let (seen, callback) = recorder();

    let _erroring = store
        .subscribe(|_| Err(DeliveryError::Other("consumer went away".into())))
        .unwrap();
    let _panicking = store
        .subscribe(|_| -> Result<(), DeliveryError> { panic!("consumer bug") })
        .unwrap();
    let _healthy = store.subscribe(callback).unwrap();

    let event = store.record(new_event("0xAA"));

    assert_eq!(*seen.lock(), vec![vec![event.id.to_string()]]);
    assert_eq!(store.len(), 1);
    // Failing subscribers stay registered; removal is the consumer's job.
    assert_eq!(store.subscriber_count(), 3);
}

#[test]
fn test_unsubscribe_is_idempotent() {
    let store = test_store(10);
    let (seen_a, callback_a) = recorder();
    let (seen_b, callback_b) = recorder();
    let sub_a = store.subscribe(callback_a).unwrap();
    let _sub_b = store.subscribe(callback_b).unwrap();

    store.record(new_event("0xAA"));
    sub_a.unsubscribe();
    sub_a.unsubscribe();
    store.unsubscribe(sub_a.id());
    store.record(new_event("0xBB"));

    assert_eq!(seen_a.lock().len(), 1);
    assert_eq!(seen_b.lock().len(), 2);
    assert_eq!(store.subscriber_count(), 1);
}

#[test]
fn test_clear_notifies_with_empty_log() {
    let store = test_store(10);
    store.record(new_event("0xAA"));
    let (seen, callback) = recorder();
    let _sub = store.subscribe(callback).unwrap();

    store.clear();
    assert!(store.query(None).is_empty());
    assert_eq!(*seen.lock(), vec![Vec::<String>::new()]);

    // Idempotent, still notifies
    store.clear();
    assert!(store.is_empty());
    assert_eq!(seen.lock().len(), 2);
}

// --- Concurrency ---

#[test]
fn test_concurrent_writers_and_readers() {
    let store = test_store(50);
    let sub = store.subscribe_channel(10_000).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    store.record(new_event(&format!("0x{w}")));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    let log = store.query(None);
                    assert!(log.len() <= 50);
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 50);
    assert_eq!(store.stats().total_recorded, 1000);
    assert_eq!(store.stats().total_evicted, 950);

    // One notification per record, each consistent and newer than the last.
    let notifications = sub.drain();
    assert_eq!(notifications.len(), 1000);
    let mut last_newest: Option<u64> = None;
    for snapshot in &notifications {
        assert!(snapshot.len() <= 50);
        let newest = snapshot.newest().unwrap().id.as_str()["evt-".len()..]
            .parse::<u64>()
            .unwrap();
        if let Some(prev) = last_newest {
            assert!(newest > prev);
        }
        last_newest = Some(newest);
    }
}

#[test]
fn test_channel_subscriber_on_other_thread() {
    let store = test_store(10);
    let sub = store.subscribe_channel(16).unwrap();

    let consumer = thread::spawn(move || {
        let first = sub.recv_timeout(Duration::from_secs(1)).unwrap();
        let second = sub.recv_timeout(Duration::from_secs(1)).unwrap();
        (first.len(), second.len())
    });

    store.record(new_event("0xAA"));
    store.record(new_event("0xBB"));

    assert_eq!(consumer.join().unwrap(), (1, 2));
}

// --- Properties ---

proptest! {
    #[test]
    fn prop_log_bounded_and_newest_first(
        capacity in 1usize..20,
        addresses in prop::collection::vec("0x[a-fA-F]{2}", 0..60),
    ) {
        let store = test_store(capacity);
        let mut recorded = Vec::new();

        for address in &addresses {
            let event = store.record(new_event(address));
            let log = store.query(None);
            prop_assert!(log.len() <= capacity);
            prop_assert_eq!(&log[0].id, &event.id);
            recorded.push(event.id);
        }

        // Exactly the newest `capacity` events remain, newest first.
        let expected: Vec<String> = recorded
            .iter()
            .rev()
            .take(capacity)
            .map(|id| id.to_string())
            .collect();
        prop_assert_eq!(ids(&store.query(None)), expected);
    }

    #[test]
    fn prop_filter_is_case_insensitive_subset(
        addresses in prop::collection::vec(prop::sample::select(vec!["0xAA", "0xaa", "0xBB", "0xCc"]), 0..30),
        needle in prop::sample::select(vec!["0xaa", "0XAA", "0xbb", "0xcc", "0xdd"]),
    ) {
        let store = test_store(100);
        for address in &addresses {
            store.record(new_event(address));
        }

        let all = store.query(None);
        let filtered = store.query(Some(needle));
        let expected: Vec<String> = all
            .iter()
            .filter(|e| e.address.to_lowercase() == needle.to_lowercase())
            .map(|e| e.id.to_string())
            .collect();
        prop_assert_eq!(ids(&filtered), expected);
    }
}
