use anyhow::{anyhow, Result};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Sized for a small firm's roster with plenty of headroom.
const FILTER_CAPACITY: usize = 10_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Approximate membership of known contractor names. A clock-in with a
/// name the filter rejects never reaches the database; false positives
/// fall through to the profile lookup, which is the authority.
static NAME_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(
        FILTER_CAPACITY,
        FALSE_POSITIVE_RATE,
    ))
});

#[inline]
fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check if a contractor name might exist (false positives possible)
pub fn might_exist(name: &str) -> bool {
    let name = normalize(name);
    NAME_FILTER
        .read()
        .expect("contractor name filter poisoned")
        .contains(&name)
}

/// Insert a single contractor name into the filter
pub fn insert(name: &str) {
    let name = normalize(name);
    NAME_FILTER
        .write()
        .expect("contractor name filter poisoned")
        .add(&name);
}

/// Remove a contractor name from the filter
pub fn remove(name: &str) {
    let name = normalize(name);
    NAME_FILTER
        .write()
        .expect("contractor name filter poisoned")
        .remove(&name);
}

/// Warm up the name filter using streaming + batching
pub async fn warmup_name_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String,)>("SELECT name FROM contractors").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (name,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&name));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Contractor name filter warmup complete: {} names", total);
    Ok(())
}

fn insert_batch(names: &[String]) {
    let mut filter = NAME_FILTER
        .write()
        .expect("contractor name filter poisoned");

    for name in names {
        filter.add(name);
    }
}
