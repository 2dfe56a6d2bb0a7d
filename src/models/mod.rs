//! Data models for the parts-quotation backend.
//!
//! Field names serialize in camelCase to match the admin frontend.

mod billing_company;
mod quotation;
mod revision;
mod supplier;
mod vehicle;
mod workshop;

pub use billing_company::*;
pub use quotation::*;
pub use revision::*;
pub use supplier::*;
pub use vehicle::*;
pub use workshop::*;
