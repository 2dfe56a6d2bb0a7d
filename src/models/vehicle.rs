//! Vehicle model.

use serde::{Deserialize, Serialize};

use crate::filter::SortOrder;

/// A customer vehicle that quotations are raised for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub plate: String,
    pub brand: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis: Option<String>,
    pub created_at: String,
}

/// Request body for creating a new vehicle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub plate: String,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub chassis: Option<String>,
}

/// Request body for updating an existing vehicle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub year: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub color: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub chassis: Option<Option<String>>,
}

/// Query parameters accepted by the vehicle list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
}
