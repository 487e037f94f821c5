//! RecordKV Getting-Started Tour
//!
//! Walks through every client operation against a running store.

use std::thread;
use std::time::Duration;

use clap::Parser;
use recordkv::{Bin, ClientConfig, Expiration, Host, Key, Operation, Policy, Session};
use tracing_subscriber::{fmt, EnvFilter};

/// RecordKV demo
#[derive(Parser, Debug)]
#[command(name = "recordkv-demo")]
#[command(about = "Tour of the RecordKV client API")]
#[command(version)]
struct Args {
    /// Seed endpoints (host:port), tried in order
    #[arg(short = 's', long = "seed", default_value = "127.0.0.1:3000")]
    seeds: Vec<Host>,

    /// Namespace to write into
    #[arg(short, long, default_value = "test")]
    namespace: String,

    /// Write timeout in milliseconds
    #[arg(short, long, default_value = "1000")]
    timeout_ms: u64,

    /// Number of records for the bulk insert and batch read
    #[arg(short = 'c', long, default_value = "1024")]
    records: i64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recordkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    tracing::info!("RecordKV demo v{}", recordkv::VERSION);

    if let Err(e) = run(&args) {
        tracing::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> recordkv::Result<()> {
    let config = ClientConfig::builder()
        .seeds(args.seeds.iter().cloned())
        .build();
    let session = Session::connect(config)?;

    let policy = Policy::default();
    let write_policy = Policy::builder().timeout_ms(args.timeout_ms).build();
    let ns = args.namespace.as_str();
    let key = Key::new(ns, "myset", "mykey")?;

    // Single bin write
    session.put(&write_policy, &key, &[Bin::new("mybin", "myReadModifyWriteValue")])?;
    tracing::info!("Wrote a single bin to {}", key);

    // Counter
    let counter_key = Key::new(ns, "myAddSet", "myAddKey")?;
    session.add(&write_policy, &counter_key, &[Bin::new("mybin", 1)])?;
    tracing::info!("Incremented counter on {}", counter_key);

    // Several bins in one write
    let bins = [
        Bin::new("location", "Oslo"),
        Bin::new("name", "Lynn"),
        Bin::new("age", 42),
    ];
    session.put(&write_policy, &key, &bins)?;
    tracing::info!("Wrote {} bins to {}", bins.len(), key);

    write_with_ttl(&session, ns)?;

    // Reads
    let record = session.get(&policy, &key, None)?;
    tracing::info!("All bins: {}", describe(&record));
    tracing::info!("{} exists? {}", key, session.exists(&policy, &key)?);
    let record = session.get(&policy, &key, Some(&["name", "age"][..]))?;
    tracing::info!("Some bins: {}", describe(&record));

    // Deletes
    session.put(&write_policy, &key, &[Bin::null("mybin")])?;
    tracing::info!("Removed bin mybin from {}", key);
    let existed = session.delete(&write_policy, &key)?;
    tracing::info!(
        "Deleted {} (existed: {}), exists now? {}",
        key,
        existed,
        session.exists(&policy, &key)?
    );

    // Bulk insert, then read back in one batch
    let keys = (1..=args.records)
        .map(|i| Key::new(ns, "myset", i))
        .collect::<recordkv::Result<Vec<_>>>()?;
    for (i, k) in keys.iter().enumerate() {
        session.put(&write_policy, k, &[Bin::new("dots", format!("{} dots", i))])?;
    }
    tracing::info!("Added {} records", keys.len());

    let records = session.batch_get(&policy, &keys, None)?;
    for (i, record) in records.iter().enumerate() {
        tracing::info!("Record[{}]: {}", i, describe(record));
    }

    // Read-modify-write in one atomic request
    session.put(
        &write_policy,
        &key,
        &[Bin::new("optintbin", 7), Bin::new("optstringbin", "string value")],
    )?;
    let record = session.operate(
        &write_policy,
        &key,
        &[
            Operation::add(Bin::new("optintbin", 4)),
            Operation::put(Bin::new("optstringbin", "new string")),
            Operation::get(),
        ],
    )?;
    tracing::info!("Multiops record: {}", record);

    session.close();
    Ok(())
}

fn write_with_ttl(session: &Session, ns: &str) -> recordkv::Result<()> {
    let policy = Policy::builder().expiration(Expiration::from_secs(2)).build();
    let key = Key::new(ns, "myset", "mykey2")?;
    session.put(&policy, &key, &[Bin::new("gender", "female")])?;

    let read = Policy::default();
    tracing::info!("{} exists? {}", key, session.exists(&read, &key)?);
    tracing::info!("Sleeping for 4 seconds");
    thread::sleep(Duration::from_secs(4));
    tracing::info!("{} exists? {}", key, session.exists(&read, &key)?);
    Ok(())
}

fn describe(record: &Option<recordkv::Record>) -> String {
    match record {
        Some(record) => record.to_string(),
        None => "not found".to_string(),
    }
}
