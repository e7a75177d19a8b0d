//! The async side of the aggregator tick (§5): fetch every configured
//! upstream in parallel, await all to settle, merge, persist. Pure merge
//! rules live in `skyfusion_core::aggregator`; this module owns the
//! network fan-out, rate limiting, and database write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use skyfusion_core::aggregator::{merge_records, merged_to_position, reclassify, RegionOfInterest, SourceRecord};
use skyfusion_core::types::Icao;

use crate::db::Store;
use crate::ratelimit::TokenBucket;
use crate::sources::military::MilitaryFeedClient;
use crate::sources::opensky::OpenSkyClient;

fn now_unix() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

pub struct Aggregator {
    pub store: Arc<Store>,
    pub military: Option<MilitaryFeedClient>,
    pub opensky: Option<OpenSkyClient>,
    pub military_bucket: TokenBucket,
    pub opensky_bucket: TokenBucket,
    pub region: RegionOfInterest,
}

impl Aggregator {
    /// One aggregator tick (§5: ~30s interval, driven by the scheduler).
    /// Every upstream fetch is issued concurrently and awaited together;
    /// a single upstream failing never blocks or drops the others.
    pub async fn tick(&self) -> anyhow::Result<usize> {
        let now = now_unix();
        let cancel = tokio_util::sync::CancellationToken::new();

        let military_fut = async {
            if let Some(client) = &self.military {
                if !self.military_bucket.acquire(&cancel).await {
                    return Vec::new();
                }
                match client.fetch_bulk().await {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::warn!(error = %e, source = "military", "upstream fetch failed");
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            }
        };

        let opensky_fut = async {
            if let Some(client) = &self.opensky {
                if !self.opensky_bucket.acquire(&cancel).await {
                    return Vec::new();
                }
                let bbox = (self.region.min_lat, self.region.min_lon, self.region.max_lat, self.region.max_lon);
                match client.fetch_states(bbox, now).await {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::warn!(error = %e, source = "opensky", "upstream fetch failed");
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            }
        };

        let (military_records, opensky_records) = tokio::join!(military_fut, opensky_fut);

        let mut by_icao: HashMap<Icao, Vec<SourceRecord>> = HashMap::new();
        for r in military_records.into_iter().chain(opensky_records) {
            by_icao.entry(r.icao).or_default().push(r);
        }

        let merged_count = by_icao.len();
        for (icao, records) in by_icao {
            let Some(merged) = merge_records(icao, records) else { continue };
            let aircraft = reclassify(&merged, None);
            if let Err(e) = self.store.upsert_aircraft(&aircraft).await {
                tracing::error!(error = %e, icao = %skyfusion_core::types::icao_to_string(&icao), "aircraft upsert failed");
                continue;
            }
            if let Some(position) = merged_to_position(&merged, now) {
                if self.region.contains(position.lat, position.lon) {
                    if let Err(e) = self.store.insert_position(&position).await {
                        tracing::error!(error = %e, icao = %skyfusion_core::types::icao_to_string(&icao), "position insert failed");
                    }
                }
            }
        }

        tracing::info!(aircraft_merged = merged_count, "aggregator tick complete");
        Ok(merged_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_unix_is_monotonic_increasing_across_calls() {
        let a = now_unix();
        let b = now_unix();
        assert!(b >= a);
    }
}
