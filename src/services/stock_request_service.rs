use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateStockRequest, Facility, StockRequest, StockRequestStatus};
use crate::services::GeoService;

const STOCK_REQUEST_COLUMNS: &str =
    "id, facility_id, central_store_id, item_name, quantity, status, requested_by, notes, created_at, updated_at";

#[derive(Clone)]
pub struct StockRequestService {
    db: PgPool,
    geo_service: GeoService,
}

impl StockRequestService {
    pub fn new(db: PgPool) -> Self {
        let geo_service = GeoService::new(db.clone());
        Self { db, geo_service }
    }

    pub async fn create_request(
        &self,
        requested_by: Uuid,
        request_data: CreateStockRequest,
    ) -> Result<StockRequest> {
        let request = sqlx::query_as::<_, StockRequest>(&format!(
            "INSERT INTO stock_requests (id, facility_id, central_store_id, item_name, quantity, status, requested_by, notes, created_at, updated_at)
             VALUES ($1, $2, NULL, $3, $4, 'pending', $5, $6, $7, $7)
             RETURNING {STOCK_REQUEST_COLUMNS}",
        ))
        .bind(Uuid::new_v4())
        .bind(request_data.facility_id)
        .bind(&request_data.item_name)
        .bind(request_data.quantity)
        .bind(requested_by)
        .bind(&request_data.notes)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(request)
    }

    pub async fn get_request_by_id(&self, request_id: Uuid) -> Result<Option<StockRequest>> {
        let request = sqlx::query_as::<_, StockRequest>(&format!(
            "SELECT {STOCK_REQUEST_COLUMNS} FROM stock_requests WHERE id = $1",
        ))
        .bind(request_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(request)
    }

    pub async fn list_requests(
        &self,
        facility_id: Option<Uuid>,
        status: Option<StockRequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StockRequest>> {
        let mut query = format!("SELECT {STOCK_REQUEST_COLUMNS} FROM stock_requests WHERE TRUE");
        let mut param_count = 1;

        if facility_id.is_some() {
            query.push_str(&format!(" AND facility_id = ${param_count}"));
            param_count += 1;
        }
        if status.is_some() {
            query.push_str(&format!(" AND status = ${param_count}"));
            param_count += 1;
        }
        query.push_str(&format!(
            " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            param_count,
            param_count + 1
        ));

        let mut query_builder = sqlx::query_as::<_, StockRequest>(&query);
        if let Some(facility_id) = facility_id {
            query_builder = query_builder.bind(facility_id);
        }
        if let Some(status) = status {
            query_builder = query_builder.bind(status);
        }
        let requests = query_builder
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        Ok(requests)
    }

    /// Approve a pending request and route it to a central store. Returns the
    /// updated request plus the store it was routed to, if one exists.
    pub async fn approve_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<(StockRequest, Option<Facility>)>> {
        let Some(request) = self.get_request_by_id(request_id).await? else {
            return Ok(None);
        };

        let central_store = self
            .geo_service
            .find_central_store_for(request.facility_id)
            .await?;

        let updated = sqlx::query_as::<_, StockRequest>(&format!(
            "UPDATE stock_requests
             SET status = 'approved', central_store_id = $2, updated_at = $3
             WHERE id = $1 AND status = 'pending'
             RETURNING {STOCK_REQUEST_COLUMNS}",
        ))
        .bind(request_id)
        .bind(central_store.as_ref().map(|f| f.id))
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?;

        Ok(updated.map(|request| (request, central_store)))
    }

    pub async fn dispatch_request(&self, request_id: Uuid) -> Result<Option<StockRequest>> {
        let request = sqlx::query_as::<_, StockRequest>(&format!(
            "UPDATE stock_requests
             SET status = 'dispatched', updated_at = $2
             WHERE id = $1 AND status = 'approved'
             RETURNING {STOCK_REQUEST_COLUMNS}",
        ))
        .bind(request_id)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?;

        Ok(request)
    }

    pub async fn reject_request(&self, request_id: Uuid) -> Result<Option<StockRequest>> {
        let request = sqlx::query_as::<_, StockRequest>(&format!(
            "UPDATE stock_requests
             SET status = 'rejected', updated_at = $2
             WHERE id = $1 AND status = 'pending'
             RETURNING {STOCK_REQUEST_COLUMNS}",
        ))
        .bind(request_id)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?;

        Ok(request)
    }
}
