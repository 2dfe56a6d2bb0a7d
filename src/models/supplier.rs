//! Supplier model and its classification enums.

use serde::{Deserialize, Serialize};

use crate::filter::SortOrder;

/// Which kind of parts a supplier sells.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartsType {
    Genuine,
    Aftermarket,
    #[default]
    Both,
}

impl PartsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartsType::Genuine => "genuine",
            PartsType::Aftermarket => "aftermarket",
            PartsType::Both => "both",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "genuine" => Some(PartsType::Genuine),
            "aftermarket" => Some(PartsType::Aftermarket),
            "both" => Some(PartsType::Both),
            _ => None,
        }
    }

    /// Accepts the internal name or the Portuguese label used in spreadsheets.
    /// Expects an already normalized (lower-case, unaccented) value.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "genuina" | "original" | "originais" | "genuinas" => Some(PartsType::Genuine),
            "paralela" | "paralelas" => Some(PartsType::Aftermarket),
            "ambos" | "ambas" => Some(PartsType::Both),
            other => Self::from_str(other),
        }
    }

    /// Portuguese label, indexed for search.
    pub fn label(&self) -> &'static str {
        match self {
            PartsType::Genuine => "genuina original",
            PartsType::Aftermarket => "paralela",
            PartsType::Both => "ambos",
        }
    }
}

/// The repair area a supplier focuses on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Specialization {
    Bodywork,
    Mechanical,
    Electrical,
    Glass,
    Painting,
    #[default]
    General,
}

impl Specialization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialization::Bodywork => "bodywork",
            Specialization::Mechanical => "mechanical",
            Specialization::Electrical => "electrical",
            Specialization::Glass => "glass",
            Specialization::Painting => "painting",
            Specialization::General => "general",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bodywork" => Some(Specialization::Bodywork),
            "mechanical" => Some(Specialization::Mechanical),
            "electrical" => Some(Specialization::Electrical),
            "glass" => Some(Specialization::Glass),
            "painting" => Some(Specialization::Painting),
            "general" => Some(Specialization::General),
            _ => None,
        }
    }

    /// Accepts the internal name or the Portuguese label used in spreadsheets.
    /// Expects an already normalized (lower-case, unaccented) value.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "funilaria" | "lataria" => Some(Specialization::Bodywork),
            "mecanica" => Some(Specialization::Mechanical),
            "eletrica" => Some(Specialization::Electrical),
            "vidros" | "vidracaria" => Some(Specialization::Glass),
            "pintura" => Some(Specialization::Painting),
            "geral" => Some(Specialization::General),
            other => Self::from_str(other),
        }
    }

    /// Portuguese label, indexed for search.
    pub fn label(&self) -> &'static str {
        match self {
            Specialization::Bodywork => "funilaria lataria",
            Specialization::Mechanical => "mecanica",
            Specialization::Electrical => "eletrica",
            Specialization::Glass => "vidros",
            Specialization::Painting => "pintura",
            Specialization::General => "geral",
        }
    }
}

/// Postal address of a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupplierAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

/// Address change in a supplier update; `null` or blank clears a field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierAddressPatch {
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub street: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub number: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub neighborhood: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub state: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub zip_code: Option<Option<String>>,
}

/// A parts vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    pub address: SupplierAddress,
    pub parts_type: PartsType,
    pub specialization: Specialization,
    pub created_at: String,
}

/// Request body for creating a new supplier.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierRequest {
    pub name: String,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub address: SupplierAddress,
    #[serde(default)]
    pub parts_type: PartsType,
    #[serde(default)]
    pub specialization: Specialization,
}

/// Request body for updating an existing supplier.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupplierRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub cnpj: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub contact_name: Option<Option<String>>,
    /// Address fields present here replace the stored ones individually.
    #[serde(default)]
    pub address: Option<SupplierAddressPatch>,
    #[serde(default)]
    pub parts_type: Option<PartsType>,
    #[serde(default)]
    pub specialization: Option<Specialization>,
}

/// Query parameters accepted by the supplier list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub parts_type: Option<PartsType>,
    #[serde(default)]
    pub specialization: Option<Specialization>,
    #[serde(default)]
    pub order: SortOrder,
}

/// Outcome of one dependent-table step of a supplier delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeStep {
    pub table: &'static str,
    pub rows_deleted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report returned after deleting a supplier and its dependents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDeleteReport {
    pub supplier_id: String,
    pub steps: Vec<CascadeStep>,
}
