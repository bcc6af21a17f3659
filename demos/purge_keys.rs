//! # Purge Keys
//!
//! Deletes every key matching a pattern inside the configured namespace.
//!
//! ```text
//! cargo run --example purge_keys -- 'session:*'
//! ```
//!
//! Connection settings come from `REDISHAUS_CONFIG` or `./redishaus.toml`.

use redishaus::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(pattern) = std::env::args().nth(1) else {
        eprintln!("usage: purge_keys <pattern>");
        std::process::exit(2);
    };

    let redishaus = RedisHaus::from_env()?;
    println!(
        "🧹 Purging '{}' under prefix '{}'",
        pattern,
        redishaus.client().prefix().as_str()
    );

    let summary = redishaus
        .client()
        .scan_and_delete_with(&pattern, None, |keys| async move {
            for key in &keys {
                println!("   - {}", key);
            }
            Ok::<(), ClientError>(())
        })
        .await?;

    println!(
        "✅ Deleted {} keys ({} seen, {} cycles)",
        summary.keys_deleted, summary.keys_seen, summary.cycles
    );

    redishaus.dispose().await?;
    Ok(())
}
