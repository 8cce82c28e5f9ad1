use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::contractor::Contractor;

/// Pay profiles keyed by exact contractor name. Hit on every clock-in
/// and every report line, so reads must not go to the database.
pub static PROFILE_CACHE: Lazy<Cache<String, Contractor>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000) // a small firm; this is generous
        .time_to_live(Duration::from_secs(3600)) // 1h TTL, writes invalidate anyway
        .build()
});

pub async fn store(contractor: &Contractor) {
    PROFILE_CACHE
        .insert(contractor.name.clone(), contractor.clone())
        .await;
}

pub async fn get(name: &str) -> Option<Contractor> {
    PROFILE_CACHE.get(name).await
}

/// Drop a profile after a rate/CIS/name change so the next lookup
/// refetches the row.
pub async fn invalidate(name: &str) {
    PROFILE_CACHE.invalidate(name).await;
}

/// Read-through lookup: cache first, database on miss.
pub async fn lookup(pool: &MySqlPool, name: &str) -> Result<Option<Contractor>> {
    if let Some(profile) = get(name).await {
        return Ok(Some(profile));
    }

    let row = sqlx::query_as::<_, Contractor>(
        r#"
        SELECT id, name, email, trade, phone, hourly_rate, cis_registered, status
        FROM contractors
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    if let Some(ref profile) = row {
        store(profile).await;
    }

    Ok(row)
}

/// Load every active pay profile into the cache at startup (batched)
pub async fn warmup_profile_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, Contractor>(
        r#"
        SELECT id, name, email, trade, phone, hourly_rate, cis_registered, status
        FROM contractors
        "#,
    )
    .fetch(pool);

    let mut batch: Vec<Contractor> = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        batch.push(row?);
        total_count += 1;

        if batch.len() >= batch_size {
            store_batch(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        store_batch(&batch).await;
    }

    log::info!("Profile cache warmup complete: {} contractors", total_count);

    Ok(())
}

async fn store_batch(contractors: &[Contractor]) {
    let futures: Vec<_> = contractors
        .iter()
        .map(|c| PROFILE_CACHE.insert(c.name.clone(), c.clone()))
        .collect();

    futures::future::join_all(futures).await;
}
