//! # RedisHaus Demo
//!
//! This example walks through the main RedisHaus features:
//! - Prefix-scoped reads and writes with optional expiry
//! - Subscribing to client events
//! - Scanning a namespace page by page
//! - Batches, transactions and optimistic locking with WATCH
//! - Bulk delete with scan_and_delete

use redishaus::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 RedisHaus Demo");
    println!("=================");

    // 1. Setup
    let config = AppConfig {
        redis: RedisConfig::new("localhost".to_string(), 6379)
            .with_prefix("redishaus-demo:")
            .with_connection_timeout(3000),
        scan: ScanConfig::new(100),
        signal: SignalConfig::new(true),
    };
    let redishaus = RedisHaus::new(config)?;

    redishaus.on_event(|event| match event.event_type {
        EventType::ScanProgress => {}
        _ => println!("   📡 {} {}", event.message, event.data),
    });

    match redishaus.health_check().await {
        Ok(()) => println!("✅ Redis connection healthy"),
        Err(e) => {
            println!("❌ Redis connection failed: {}", e);
            println!("💡 Please start Redis: docker run -d --name redis -p 6379:6379 redis:7-alpine");
            return Ok(());
        }
    }
    let client = redishaus.client();

    // 2. Basic commands
    println!("\n🔑 Step 2: Basic commands");
    println!("-------------------------");

    client.set("greeting", "hello", KeyOptions::expire(60)).await?;
    let greeting: String = client.get("greeting").await?;
    println!("greeting = {} (ttl {}s)", greeting, client.ttl("greeting").await?);

    client.set("price", "3", KeyOptions::default()).await?;
    println!("price + 0.1 = {}", client.incrbyfloat("price", 0.1, KeyOptions::default()).await?);

    client
        .hmset("user:1", &[("name", "Ada"), ("visits", "0")], KeyOptions::default())
        .await?;
    client.hincrby("user:1", "visits", 1, KeyOptions::default()).await?;
    let user: HashMap<String, String> = client.hgetall("user:1").await?;
    println!("user:1 = {:?}", user);

    // 3. Scan
    println!("\n🔍 Step 3: Scanning");
    println!("-------------------");

    let mut tx = client.transaction().await?;
    for i in 0..500 {
        tx.set(&format!("session:{i}"), i, KeyOptions::expire(300));
    }
    tx.commit().await?;

    let seen = Arc::new(AtomicU64::new(0));
    let counter = seen.clone();
    let summary = client
        .scan("session:*", None, move |keys| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(keys.len() as u64, Ordering::Relaxed);
                Ok::<(), ClientError>(())
            }
        })
        .await?;
    println!(
        "scanned {} keys in {} cycles",
        seen.load(Ordering::Relaxed),
        summary.cycles
    );

    // 4. Batch
    println!("\n📦 Step 4: Batch");
    println!("----------------");

    let mut batch = client.batch().await?;
    batch.get("greeting").exists("missing").hgetall("user:1");
    let (greeting, missing, user): (String, bool, HashMap<String, String>) = batch.exec().await?;
    println!("greeting = {}, missing exists = {}, user = {:?}", greeting, missing, user);

    // 5. Optimistic locking
    println!("\n🔒 Step 5: WATCH + transaction");
    println!("------------------------------");

    client.set("stock", 10, KeyOptions::default()).await?;
    let mut tx = client.watch(&["stock"]).await?;
    tx.incrby("stock", -1, KeyOptions::default());
    client.set("stock", 0, KeyOptions::default()).await?;
    match tx.commit().await {
        Err(ClientError::TransactionAborted) => println!("✅ concurrent write detected, nothing applied"),
        other => println!("unexpected outcome: {:?}", other),
    }

    // 6. Cleanup
    println!("\n🧹 Step 6: Cleanup");
    println!("------------------");

    let summary = client.scan_and_delete("*", None).await?;
    println!("deleted {} keys in {} cycles", summary.keys_deleted, summary.cycles);

    redishaus.dispose().await?;
    let stats = redishaus.signals().stats();
    println!("\n🎉 Done ({} events emitted)", stats.emitted);
    Ok(())
}
