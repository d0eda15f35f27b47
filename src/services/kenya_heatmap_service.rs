use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{CountyHeat, CountyParticipantRow, KenyaHeatmap};

/// How long a computed heatmap stays fresh.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Build the heatmap from raw per-county counts. Intensity is normalized
/// against the busiest county; all-zero data stays all-zero.
pub fn build_heatmap(rows: Vec<CountyParticipantRow>) -> KenyaHeatmap {
    let max_participants = rows.iter().map(|r| r.participants).max().unwrap_or(0);

    let counties = rows
        .into_iter()
        .map(|row| {
            let intensity = if max_participants == 0 {
                0.0
            } else {
                row.participants as f64 / max_participants as f64 * 100.0
            };
            CountyHeat {
                county_id: row.county_id,
                code: row.county_code,
                name: row.county_name,
                participants: row.participants,
                intensity,
            }
        })
        .collect();

    KenyaHeatmap {
        generated_at: Utc::now(),
        max_participants,
        counties,
    }
}

struct CachedHeatmap {
    computed_at: Instant,
    heatmap: KenyaHeatmap,
}

/// County-level training coverage, aggregated from participant records and
/// cached in-process for five minutes.
#[derive(Clone)]
pub struct KenyaHeatmapService {
    db: PgPool,
    cache: Arc<RwLock<Option<CachedHeatmap>>>,
}

impl KenyaHeatmapService {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn county_heatmap(&self, force_refresh: bool) -> Result<KenyaHeatmap> {
        if !force_refresh {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.computed_at.elapsed() < CACHE_TTL {
                    debug!("serving heatmap from cache");
                    return Ok(cached.heatmap.clone());
                }
            }
        }

        let heatmap = self.compute_heatmap().await?;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedHeatmap {
            computed_at: Instant::now(),
            heatmap: heatmap.clone(),
        });

        Ok(heatmap)
    }

    /// Every county appears in the result, participants or not.
    async fn compute_heatmap(&self) -> Result<KenyaHeatmap> {
        let rows = sqlx::query_as::<_, CountyParticipantRow>(
            "SELECT c.id AS county_id,
                    c.code AS county_code,
                    c.name AS county_name,
                    COUNT(tp.id) AS participants
             FROM counties c
             LEFT JOIN subcounties sc ON sc.county_id = c.id
             LEFT JOIN facilities f ON f.subcounty_id = sc.id
             LEFT JOIN training_participants tp ON tp.facility_id = f.id
             GROUP BY c.id, c.code, c.name
             ORDER BY c.code",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(build_heatmap(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn row(code: i32, name: &str, participants: i64) -> CountyParticipantRow {
        CountyParticipantRow {
            county_id: Uuid::new_v4(),
            county_code: code,
            county_name: name.to_string(),
            participants,
        }
    }

    #[test]
    fn test_intensity_normalized_against_busiest_county() {
        let heatmap = build_heatmap(vec![
            row(1, "Mombasa", 20),
            row(22, "Kiambu", 50),
            row(47, "Nairobi", 10),
        ]);

        assert_eq!(heatmap.max_participants, 50);
        assert_eq!(heatmap.counties[0].intensity, 40.0);
        assert_eq!(heatmap.counties[1].intensity, 100.0);
        assert_eq!(heatmap.counties[2].intensity, 20.0);
    }

    #[test]
    fn test_zero_participants_everywhere() {
        let heatmap = build_heatmap(vec![row(1, "Mombasa", 0), row(2, "Kwale", 0)]);

        assert_eq!(heatmap.max_participants, 0);
        assert!(heatmap.counties.iter().all(|c| c.intensity == 0.0));
    }

    #[test]
    fn test_counties_without_participants_stay_in_the_map() {
        let heatmap = build_heatmap(vec![row(1, "Mombasa", 8), row(2, "Kwale", 0)]);

        assert_eq!(heatmap.counties.len(), 2);
        assert_eq!(heatmap.counties[1].participants, 0);
        assert_eq!(heatmap.counties[1].intensity, 0.0);
    }

    #[test]
    fn test_empty_input() {
        let heatmap = build_heatmap(Vec::new());
        assert_eq!(heatmap.max_participants, 0);
        assert!(heatmap.counties.is_empty());
    }
}
