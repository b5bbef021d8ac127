use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::farmer::FarmerResponse;
use super::shared::{validate_min_one, validate_required};
use crate::entity::batch;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBatchRequest {
    pub farmer_id: i32,
    pub crop_type: String,
    pub quantity: f64,
    pub collection_location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Partial update. `batch_code` and `gps_address` are deliberately absent:
/// both are assigned once at creation and never regenerated.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateBatchRequest {
    pub farmer_id: Option<i32>,
    pub crop_type: Option<String>,
    pub quantity: Option<f64>,
    pub collection_location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct BatchResponse {
    pub id: i32,
    pub crop_type: String,
    pub quantity: f64,
    pub collection_location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub gps_address: String,
    pub batch_code: String,
    pub farmer_id: i32,
    /// Source farmer, expanded on list/get.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farmer: Option<FarmerResponse>,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<batch::Model> for BatchResponse {
    fn from(m: batch::Model) -> Self {
        Self {
            id: m.id,
            crop_type: m.crop_type,
            quantity: m.quantity,
            collection_location: m.collection_location,
            latitude: m.latitude,
            longitude: m.longitude,
            gps_address: m.gps_address,
            batch_code: m.batch_code,
            farmer_id: m.farmer_id,
            farmer: None,
            user_id: m.user_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl BatchResponse {
    pub fn with_farmer(mut self, farmer: Option<crate::entity::farmer::Model>) -> Self {
        self.farmer = farmer.map(FarmerResponse::from);
        self
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BatchEnvelope {
    pub message: String,
    pub batch: BatchResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BatchesEnvelope {
    pub message: String,
    pub batches: Vec<BatchResponse>,
}

// ---------------------------------------------------------------------------
// Validation and column whitelist
// ---------------------------------------------------------------------------

pub fn validate_create_batch(req: &CreateBatchRequest) -> Result<(), AppError> {
    validate_required(&req.crop_type, "crop_type")?;
    validate_required(&req.collection_location, "collection_location")?;
    validate_min_one(req.quantity, "quantity")
}

pub fn validate_update_batch(req: &UpdateBatchRequest) -> Result<(), AppError> {
    if let Some(ref crop_type) = req.crop_type {
        validate_required(crop_type, "crop_type")?;
    }
    if let Some(ref location) = req.collection_location {
        validate_required(location, "collection_location")?;
    }
    if let Some(quantity) = req.quantity {
        validate_min_one(quantity, "quantity")?;
    }
    Ok(())
}

/// Fields exposed to list `filter`/`sort`.
pub fn batch_column(field: &str) -> Option<batch::Column> {
    match field {
        "crop_type" => Some(batch::Column::CropType),
        "quantity" => Some(batch::Column::Quantity),
        "collection_location" => Some(batch::Column::CollectionLocation),
        "gps_address" => Some(batch::Column::GpsAddress),
        "batch_code" => Some(batch::Column::BatchCode),
        "farmer_id" => Some(batch::Column::FarmerId),
        "user_id" => Some(batch::Column::UserId),
        "created_at" => Some(batch::Column::CreatedAt),
        "updated_at" => Some(batch::Column::UpdatedAt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_below_one_is_rejected() {
        let req = CreateBatchRequest {
            farmer_id: 1,
            crop_type: "Maize".into(),
            quantity: 0.0,
            collection_location: "Madina".into(),
            latitude: None,
            longitude: None,
        };
        assert!(matches!(
            validate_create_batch(&req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn derived_fields_are_not_filterable_nor_updatable() {
        // latitude/longitude are updatable but not filterable; the derived
        // code columns are filterable but absent from UpdateBatchRequest.
        assert!(batch_column("latitude").is_none());
        assert!(batch_column("batch_code").is_some());
    }
}
