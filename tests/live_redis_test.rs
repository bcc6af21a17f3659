//! Tests against a live Redis server (skipped unless `REDIS_HOST` is set)

mod common;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use common::{cleanup, live_config, live_redishaus};
use redishaus::prelude::*;

#[tokio::test]
async fn test_prefix_is_applied_on_the_server() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    let client = redishaus.client();
    let prefix = client.prefix().as_str().to_string();

    client.set("test1", "1", KeyOptions::default()).await.unwrap();

    let raw = RedisClient::new(live_config(None).unwrap().redis).unwrap();
    assert!(raw.exists(&format!("{prefix}test1")).await.unwrap());
    assert!(!raw.exists("test1").await.unwrap());
    raw.dispose().await.unwrap();

    cleanup(&redishaus).await;
}

#[tokio::test]
async fn test_string_and_counter_commands() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    let client = redishaus.client();

    client.set("name", "redishaus", KeyOptions::default()).await.unwrap();
    let name: String = client.get("name").await.unwrap();
    assert_eq!(name, "redishaus");
    let missing: Option<String> = client.get("missing").await.unwrap();
    assert_eq!(missing, None);

    assert_eq!(client.incrby("counter", 5, KeyOptions::default()).await.unwrap(), 5);
    assert_eq!(client.incrby("counter", -2, KeyOptions::default()).await.unwrap(), 3);

    client.set("float", "3", KeyOptions::default()).await.unwrap();
    let value = client
        .incrbyfloat("float", 0.1, KeyOptions::default())
        .await
        .unwrap();
    assert_eq!(value, 3.1);

    assert!(client.del("name").await.unwrap());
    assert!(!client.del("name").await.unwrap());
    assert!(!client.exists("name").await.unwrap());

    cleanup(&redishaus).await;
}

#[tokio::test]
async fn test_hash_and_set_commands() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    let client = redishaus.client();

    client
        .hmset("hash", &[("a", "1"), ("b", "2")], KeyOptions::default())
        .await
        .unwrap();
    client.hincrby("hash", "a", 4, KeyOptions::default()).await.unwrap();
    client
        .hincrbyfloat("hash", "b", 0.5, KeyOptions::default())
        .await
        .unwrap();
    let hash: HashMap<String, String> = client.hgetall("hash").await.unwrap();
    assert_eq!(hash.get("a").map(String::as_str), Some("5"));
    assert_eq!(hash.get("b").map(String::as_str), Some("2.5"));

    assert_eq!(client.sadd("set", &["x", "y", "z"], KeyOptions::default()).await.unwrap(), 3);
    assert_eq!(client.srem("set", "y").await.unwrap(), 1);
    let members: HashSet<String> = client.smembers("set").await.unwrap();
    assert_eq!(members, HashSet::from(["x".to_string(), "z".to_string()]));

    cleanup(&redishaus).await;
}

#[tokio::test]
async fn test_expire_option_sets_ttl() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    let client = redishaus.client();

    client.set("plain", "1", KeyOptions::default()).await.unwrap();
    client.set("volatile", "1", KeyOptions::expire(30)).await.unwrap();
    client.incrby("counter", 1, KeyOptions::expire(30)).await.unwrap();

    assert_eq!(client.ttl("plain").await.unwrap(), -1);
    assert!((1..=30).contains(&client.ttl("volatile").await.unwrap()));
    assert!((1..=30).contains(&client.ttl("counter").await.unwrap()));
    assert_eq!(client.ttl("missing").await.unwrap(), -2);

    cleanup(&redishaus).await;
}

#[tokio::test]
async fn test_scan_then_delete_two_thousand_keys() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    let client = redishaus.client();

    let mut tx = client.transaction().await.unwrap();
    for i in 0..2001 {
        tx.set(&format!("test{i}"), i, KeyOptions::default());
    }
    tx.set("other", "x", KeyOptions::default());
    tx.commit().await.unwrap();

    let seen = Arc::new(Mutex::new(HashSet::new()));
    let sink = seen.clone();
    let summary = client
        .scan("test*", Some(100), move |keys| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().extend(keys);
                Ok::<(), ClientError>(())
            }
        })
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2001);
    assert!(seen.contains("test0"));
    assert!(seen.contains("test2000"));
    assert!(!seen.contains("other"));
    assert!(summary.keys_seen >= 2001);

    let deleted = client.scan_and_delete("test*", None).await.unwrap();
    assert_eq!(deleted.keys_deleted, 2001);

    let rescan = client
        .scan("test*", None, |_| async { Ok::<(), ClientError>(()) })
        .await
        .unwrap();
    assert_eq!(rescan.keys_seen, 0);
    assert!(client.exists("other").await.unwrap());

    cleanup(&redishaus).await;
}

#[tokio::test]
async fn test_scan_events_reach_subscribers() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    redishaus.on_event(move |event| sink.lock().unwrap().push(event.event_type));

    let client = redishaus.client();
    client.set("key", "1", KeyOptions::default()).await.unwrap();
    client.scan_and_delete("*", None).await.unwrap();

    let events = events.lock().unwrap().clone();
    assert_eq!(events.first(), Some(&EventType::Connected));
    assert!(events.contains(&EventType::ScanDelete));
    assert!(events.contains(&EventType::ScanProgress));

    cleanup(&redishaus).await;
}

#[tokio::test]
async fn test_batch_reads() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    let client = redishaus.client();

    client.set("test1", "1", KeyOptions::default()).await.unwrap();
    client.set("test2", "2", KeyOptions::default()).await.unwrap();
    client.sadd("set", "m", KeyOptions::default()).await.unwrap();

    let mut batch = client.batch().await.unwrap();
    batch.get("test1").get("test2").exists("missing").smembers("set");
    assert_eq!(batch.len(), 4);
    let (one, two, missing, set): (String, String, bool, Vec<String>) =
        batch.exec().await.unwrap();

    assert_eq!((one.as_str(), two.as_str()), ("1", "2"));
    assert!(!missing);
    assert_eq!(set, vec!["m".to_string()]);

    cleanup(&redishaus).await;
}

#[tokio::test]
async fn test_transaction_commit_and_rollback() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    let client = redishaus.client();

    let mut tx = client.transaction().await.unwrap();
    tx.set("a", "1", KeyOptions::expire(30))
        .incrby("b", 2, KeyOptions::default())
        .sadd("s", &["x", "y"], KeyOptions::default());
    assert!(!client.exists("a").await.unwrap());
    tx.commit().await.unwrap();

    let a: String = client.get("a").await.unwrap();
    assert_eq!(a, "1");
    assert!((1..=30).contains(&client.ttl("a").await.unwrap()));
    let b: i64 = client.get("b").await.unwrap();
    assert_eq!(b, 2);

    let mut tx = client.transaction().await.unwrap();
    tx.del("a").set("c", "3", KeyOptions::default());
    tx.rollback().await.unwrap();
    assert!(client.exists("a").await.unwrap());
    assert!(!client.exists("c").await.unwrap());

    cleanup(&redishaus).await;
}

#[tokio::test]
async fn test_watched_transaction_aborts_on_conflict() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    let client = redishaus.client();
    client.set("balance", "10", KeyOptions::default()).await.unwrap();

    let mut tx = client.watch(&["balance"]).await.unwrap();
    assert!(tx.is_watching());
    tx.incrby("balance", -5, KeyOptions::default());

    client.set("balance", "100", KeyOptions::default()).await.unwrap();

    assert!(matches!(
        tx.commit().await,
        Err(ClientError::TransactionAborted)
    ));
    let balance: i64 = client.get("balance").await.unwrap();
    assert_eq!(balance, 100);

    let mut tx = client.watch(&["balance"]).await.unwrap();
    tx.incrby("balance", -5, KeyOptions::default());
    tx.commit().await.unwrap();
    let balance: i64 = client.get("balance").await.unwrap();
    assert_eq!(balance, 95);

    cleanup(&redishaus).await;
}

#[tokio::test]
async fn test_health_check_and_dispose() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    redishaus.health_check().await.unwrap();
    redishaus.dispose().await.unwrap();
    redishaus.dispose().await.unwrap();

    assert!(matches!(
        redishaus.client().get::<Option<String>>("key").await,
        Err(ClientError::Disposed)
    ));
}

#[tokio::test]
async fn test_dispose_stops_running_walk_and_open_handles() {
    let Some(redishaus) = live_redishaus() else {
        return;
    };
    let client = redishaus.client().clone();
    for i in 0..50 {
        client.set(&format!("doomed{i}"), i, KeyOptions::default()).await.unwrap();
    }

    let mut batch = client.batch().await.unwrap();
    batch.get("doomed0");
    let mut tx = client.transaction().await.unwrap();
    tx.del("doomed0");

    let disposer = client.clone();
    let result = client
        .scan_and_delete_with("doomed*", Some(10), move |_| {
            let disposer = disposer.clone();
            async move { disposer.dispose().await }
        })
        .await;

    assert!(matches!(result, Err(ClientError::Disposed)));
    assert!(matches!(batch.exec::<String>().await, Err(ClientError::Disposed)));
    assert!(matches!(tx.commit().await, Err(ClientError::Disposed)));

    let check = RedisHaus::new(live_config(Some(client.prefix().as_str())).unwrap()).unwrap();
    assert!(check.client().exists("doomed0").await.unwrap());
    cleanup(&check).await;
}
