use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Cadre, County, CreateFacility, Department, Facility, Subcounty, UpdateFacility};

/// Counties, subcounties, facilities and the classification lookups.
#[derive(Clone)]
pub struct GeoService {
    db: PgPool,
}

impl GeoService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_counties(&self) -> Result<Vec<County>> {
        let counties =
            sqlx::query_as::<_, County>("SELECT id, code, name FROM counties ORDER BY code")
                .fetch_all(&self.db)
                .await?;

        Ok(counties)
    }

    pub async fn list_subcounties(&self, county_id: Uuid) -> Result<Vec<Subcounty>> {
        let subcounties = sqlx::query_as::<_, Subcounty>(
            "SELECT id, county_id, name FROM subcounties WHERE county_id = $1 ORDER BY name",
        )
        .bind(county_id)
        .fetch_all(&self.db)
        .await?;

        Ok(subcounties)
    }

    pub async fn list_cadres(&self) -> Result<Vec<Cadre>> {
        let cadres = sqlx::query_as::<_, Cadre>("SELECT id, name FROM cadres ORDER BY name")
            .fetch_all(&self.db)
            .await?;

        Ok(cadres)
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>> {
        let departments =
            sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY name")
                .fetch_all(&self.db)
                .await?;

        Ok(departments)
    }

    pub async fn create_facility(&self, facility_data: CreateFacility) -> Result<Facility> {
        let facility = sqlx::query_as::<_, Facility>(
            "INSERT INTO facilities (id, subcounty_id, name, mfl_code, facility_type, is_central_store, contact_email, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING id, subcounty_id, name, mfl_code, facility_type, is_central_store, contact_email, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(facility_data.subcounty_id)
        .bind(&facility_data.name)
        .bind(&facility_data.mfl_code)
        .bind(&facility_data.facility_type)
        .bind(facility_data.is_central_store.unwrap_or(false))
        .bind(&facility_data.contact_email)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(facility)
    }

    pub async fn get_facility_by_id(&self, facility_id: Uuid) -> Result<Option<Facility>> {
        let facility = sqlx::query_as::<_, Facility>(
            "SELECT id, subcounty_id, name, mfl_code, facility_type, is_central_store, contact_email, created_at, updated_at
             FROM facilities WHERE id = $1",
        )
        .bind(facility_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(facility)
    }

    pub async fn list_facilities(
        &self,
        subcounty_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Facility>> {
        let facilities = match subcounty_id {
            Some(subcounty_id) => {
                sqlx::query_as::<_, Facility>(
                    "SELECT id, subcounty_id, name, mfl_code, facility_type, is_central_store, contact_email, created_at, updated_at
                     FROM facilities WHERE subcounty_id = $1 ORDER BY name LIMIT $2 OFFSET $3",
                )
                .bind(subcounty_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, Facility>(
                    "SELECT id, subcounty_id, name, mfl_code, facility_type, is_central_store, contact_email, created_at, updated_at
                     FROM facilities ORDER BY name LIMIT $1 OFFSET $2",
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(facilities)
    }

    pub async fn update_facility(
        &self,
        facility_id: Uuid,
        facility_data: UpdateFacility,
    ) -> Result<Option<Facility>> {
        let facility = sqlx::query_as::<_, Facility>(
            "UPDATE facilities
             SET name = COALESCE($2, name),
                 facility_type = COALESCE($3, facility_type),
                 is_central_store = COALESCE($4, is_central_store),
                 contact_email = COALESCE($5, contact_email),
                 updated_at = $6
             WHERE id = $1
             RETURNING id, subcounty_id, name, mfl_code, facility_type, is_central_store, contact_email, created_at, updated_at",
        )
        .bind(facility_id)
        .bind(facility_data.name)
        .bind(facility_data.facility_type)
        .bind(facility_data.is_central_store)
        .bind(facility_data.contact_email)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?;

        Ok(facility)
    }

    pub async fn delete_facility(&self, facility_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM facilities WHERE id = $1")
            .bind(facility_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Central store serving a facility: prefer one in the same county,
    /// fall back to any central store.
    pub async fn find_central_store_for(&self, facility_id: Uuid) -> Result<Option<Facility>> {
        let same_county = sqlx::query_as::<_, Facility>(
            "SELECT f2.id, f2.subcounty_id, f2.name, f2.mfl_code, f2.facility_type, f2.is_central_store, f2.contact_email, f2.created_at, f2.updated_at
             FROM facilities f1
             JOIN subcounties s1 ON s1.id = f1.subcounty_id
             JOIN subcounties s2 ON s2.county_id = s1.county_id
             JOIN facilities f2 ON f2.subcounty_id = s2.id
             WHERE f1.id = $1 AND f2.is_central_store = TRUE AND f2.id <> f1.id
             ORDER BY f2.name
             LIMIT 1",
        )
        .bind(facility_id)
        .fetch_optional(&self.db)
        .await?;

        if same_county.is_some() {
            return Ok(same_county);
        }

        let any_store = sqlx::query_as::<_, Facility>(
            "SELECT id, subcounty_id, name, mfl_code, facility_type, is_central_store, contact_email, created_at, updated_at
             FROM facilities WHERE is_central_store = TRUE AND id <> $1 ORDER BY name LIMIT 1",
        )
        .bind(facility_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(any_store)
    }
}
