//! List filtering helpers.
//!
//! Equality filters and ordering run in SQL; the free-text `q` filter is a
//! predicate applied to the fetched rows.

use serde::Deserialize;

use crate::models::{BillingCompany, Quotation, Supplier, Vehicle, Workshop};

/// Ordering of list results by creation time.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL keyword for an `ORDER BY` clause.
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Rows that can be matched by the free-text filter.
pub trait TextSearchable {
    /// Descriptive fields the filter looks at.
    fn text_fields(&self) -> Vec<&str>;
}

/// Lower-case and strip the diacritics common in Portuguese text.
pub fn fold_text(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Whether any descriptive field contains the query, ignoring case and accents.
pub fn matches_text<T: TextSearchable>(item: &T, query: &str) -> bool {
    let needle = fold_text(query.trim());
    if needle.is_empty() {
        return true;
    }
    item.text_fields()
        .into_iter()
        .any(|field| fold_text(field).contains(&needle))
}

/// Keep only the rows matching `query`; a missing or blank query keeps everything.
pub fn apply_text_filter<T: TextSearchable>(items: Vec<T>, query: Option<&str>) -> Vec<T> {
    match query.map(str::trim) {
        Some(q) if !q.is_empty() => items.into_iter().filter(|i| matches_text(i, q)).collect(),
        _ => items,
    }
}

fn push_opt<'a>(fields: &mut Vec<&'a str>, value: &'a Option<String>) {
    if let Some(v) = value {
        fields.push(v);
    }
}

impl TextSearchable for Vehicle {
    fn text_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.plate.as_str(), self.brand.as_str(), self.model.as_str()];
        push_opt(&mut fields, &self.color);
        push_opt(&mut fields, &self.chassis);
        fields
    }
}

impl TextSearchable for Supplier {
    fn text_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        push_opt(&mut fields, &self.cnpj);
        push_opt(&mut fields, &self.email);
        push_opt(&mut fields, &self.contact_name);
        push_opt(&mut fields, &self.address.neighborhood);
        push_opt(&mut fields, &self.address.city);
        fields
    }
}

impl TextSearchable for Workshop {
    fn text_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        push_opt(&mut fields, &self.cnpj);
        push_opt(&mut fields, &self.contact_name);
        push_opt(&mut fields, &self.city);
        fields
    }
}

impl TextSearchable for BillingCompany {
    fn text_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.cnpj.as_str()];
        push_opt(&mut fields, &self.email);
        push_opt(&mut fields, &self.city);
        fields
    }
}

impl TextSearchable for Quotation {
    fn text_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        push_opt(&mut fields, &self.notes);
        if let Some(vehicle) = &self.vehicle {
            fields.push(vehicle.plate.as_str());
            fields.push(vehicle.brand.as_str());
            fields.push(vehicle.model.as_str());
        }
        for part in &self.parts {
            fields.push(part.name.as_str());
            push_opt(&mut fields, &part.code);
        }
        fields
    }
}
