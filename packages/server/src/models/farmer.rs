use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{validate_email, validate_required};
use super::user::UserResponse;
use crate::entity::farmer;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterFarmerRequest {
    pub first_name: String,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub id_number: Option<String>,
    pub address: String,
    pub gps_address: Option<String>,
    pub farm_size: String,
    pub crop_type: String,
    /// Stored path/URL returned by the upload sink.
    pub image: Option<String>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateFarmerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub id_number: Option<String>,
    pub address: Option<String>,
    pub gps_address: Option<String>,
    pub farm_size: Option<String>,
    pub crop_type: Option<String>,
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct FarmerResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub id_number: Option<String>,
    pub address: String,
    pub gps_address: Option<String>,
    pub farm_size: String,
    pub crop_type: String,
    pub image: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub user_id: i32,
    /// Owning user, expanded on list/get. Password excluded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<farmer::Model> for FarmerResponse {
    fn from(m: farmer::Model) -> Self {
        Self {
            id: m.id,
            first_name: m.first_name,
            last_name: m.last_name,
            gender: m.gender,
            phone: m.phone,
            email: m.email,
            id_number: m.id_number,
            address: m.address,
            gps_address: m.gps_address,
            farm_size: m.farm_size,
            crop_type: m.crop_type,
            image: m.image,
            registered_at: m.registered_at,
            user_id: m.user_id,
            user: None,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl FarmerResponse {
    pub fn with_user(mut self, user: Option<crate::entity::user::Model>) -> Self {
        self.user = user.map(UserResponse::from);
        self
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FarmerEnvelope {
    pub message: String,
    pub farmer: FarmerResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FarmersEnvelope {
    pub message: String,
    pub farmers: Vec<FarmerResponse>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

const GENDERS: [&str; 3] = ["male", "female", "other"];

pub fn validate_register_farmer(req: &RegisterFarmerRequest) -> Result<(), AppError> {
    validate_required(&req.first_name, "first_name")?;
    validate_required(&req.address, "address")?;
    validate_required(&req.farm_size, "farm_size")?;
    validate_required(&req.crop_type, "crop_type")?;
    if let Some(ref email) = req.email {
        validate_email(email)?;
    }
    validate_gender(req.gender.as_deref())
}

pub fn validate_update_farmer(req: &UpdateFarmerRequest) -> Result<(), AppError> {
    if let Some(ref first_name) = req.first_name {
        validate_required(first_name, "first_name")?;
    }
    if let Some(ref address) = req.address {
        validate_required(address, "address")?;
    }
    if let Some(ref email) = req.email {
        validate_email(email)?;
    }
    validate_gender(req.gender.as_deref())
}

/// Fields exposed to list `filter`/`sort`.
pub fn farmer_column(field: &str) -> Option<farmer::Column> {
    match field {
        "first_name" => Some(farmer::Column::FirstName),
        "last_name" => Some(farmer::Column::LastName),
        "gender" => Some(farmer::Column::Gender),
        "phone" => Some(farmer::Column::Phone),
        "email" => Some(farmer::Column::Email),
        "id_number" => Some(farmer::Column::IdNumber),
        "address" => Some(farmer::Column::Address),
        "gps_address" => Some(farmer::Column::GpsAddress),
        "farm_size" => Some(farmer::Column::FarmSize),
        "crop_type" => Some(farmer::Column::CropType),
        "user_id" => Some(farmer::Column::UserId),
        "registered_at" => Some(farmer::Column::RegisteredAt),
        "created_at" => Some(farmer::Column::CreatedAt),
        "updated_at" => Some(farmer::Column::UpdatedAt),
        _ => None,
    }
}

fn validate_gender(gender: Option<&str>) -> Result<(), AppError> {
    if let Some(g) = gender
        && !GENDERS.contains(&g)
    {
        return Err(AppError::Validation(
            "gender must be one of: male, female, other".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterFarmerRequest {
        RegisterFarmerRequest {
            first_name: "Kwame".into(),
            last_name: None,
            gender: None,
            phone: None,
            email: None,
            id_number: None,
            address: "Madina, Accra".into(),
            gps_address: None,
            farm_size: "5 acres".into(),
            crop_type: "Maize".into(),
            image: None,
        }
    }

    #[test]
    fn required_fields_are_enforced() {
        assert!(validate_register_farmer(&request()).is_ok());
        let mut req = request();
        req.farm_size = "  ".into();
        assert!(validate_register_farmer(&req).is_err());
    }

    #[test]
    fn gender_is_constrained() {
        let mut req = request();
        req.gender = Some("unknown".into());
        assert!(validate_register_farmer(&req).is_err());
        req.gender = Some("female".into());
        assert!(validate_register_farmer(&req).is_ok());
    }
}
