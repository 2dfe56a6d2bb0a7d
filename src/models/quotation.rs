//! Quotation model with its nested parts, supplier links and offers.

use serde::{Deserialize, Serialize};

use super::Vehicle;
use crate::filter::SortOrder;

/// Lifecycle of a quotation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    #[default]
    Pending,
    Quoted,
    Approved,
    Cancelled,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Pending => "pending",
            QuotationStatus::Quoted => "quoted",
            QuotationStatus::Approved => "approved",
            QuotationStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(QuotationStatus::Pending),
            "quoted" => Some(QuotationStatus::Quoted),
            "approved" => Some(QuotationStatus::Approved),
            "cancelled" => Some(QuotationStatus::Cancelled),
            _ => None,
        }
    }
}

/// A part line on a quotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationPart {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}

/// A priced proposal for vehicle parts tied to one vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: String,
    pub vehicle_id: String,
    /// The referenced vehicle, embedded on reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workshop_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_company_id: Option<String>,
    pub status: QuotationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub parts: Vec<QuotationPart>,
    pub total: f64,
    pub created_at: String,
}

impl Quotation {
    /// Sum of quantity times unit price over the priced parts.
    pub fn compute_total(parts: &[QuotationPart]) -> f64 {
        parts
            .iter()
            .filter_map(|p| p.unit_price.map(|price| price * p.quantity as f64))
            .sum()
    }
}

/// Part line as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationPartInput {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Option<f64>,
}

fn default_quantity() -> i64 {
    1
}

/// Request body for creating a new quotation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotationRequest {
    pub vehicle_id: String,
    #[serde(default)]
    pub workshop_id: Option<String>,
    #[serde(default)]
    pub billing_company_id: Option<String>,
    #[serde(default)]
    pub status: QuotationStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub parts: Vec<QuotationPartInput>,
}

/// Request body for updating an existing quotation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuotationRequest {
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub workshop_id: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub billing_company_id: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<QuotationStatus>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
    /// When present the part list is replaced wholesale.
    #[serde(default)]
    pub parts: Option<Vec<QuotationPartInput>>,
}

/// Query parameters accepted by the quotation list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub status: Option<QuotationStatus>,
    #[serde(default)]
    pub order: SortOrder,
}

/// A supplier invited to answer a quotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationSupplier {
    pub id: String,
    pub quotation_id: String,
    pub supplier_id: String,
    pub created_at: String,
}

/// Request body for inviting a supplier to a quotation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteSupplierRequest {
    pub supplier_id: String,
}

/// A supplier's price for one quotation part.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierOffer {
    pub id: String,
    pub quotation_id: String,
    pub supplier_id: String,
    pub part_id: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_days: Option<i64>,
    pub created_at: String,
}

/// Request body for recording a supplier offer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub supplier_id: String,
    pub part_id: String,
    pub price: f64,
    #[serde(default)]
    pub delivery_days: Option<i64>,
}
