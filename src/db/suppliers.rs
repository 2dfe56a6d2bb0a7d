//! Supplier persistence, including the spreadsheet import and the
//! cascading delete over the tables that reference a supplier.

use sqlx::Row;

use super::repository::{new_id, now_timestamp, Repository};
use crate::errors::AppError;
use crate::import::{ParsedRow, RowError};
use crate::models::{
    CascadeStep, CreateSupplierRequest, PartsType, Specialization, Supplier, SupplierAddress,
    SupplierAddressPatch, SupplierDeleteReport, SupplierListQuery, UpdateSupplierRequest,
};
use crate::validation;

const SUPPLIER_COLUMNS: &str = "id, name, cnpj, phone, email, contact_name, street, number, neighborhood, city, state, zip_code, parts_type, specialization, created_at";

/// Dependent tables cleared before a supplier row is deleted, in order.
const SUPPLIER_DEPENDENTS: [&str; 2] = ["supplier_offers", "quotation_suppliers"];

impl Repository {
    /// List suppliers matching the equality filters.
    pub async fn list_suppliers(
        &self,
        query: &SupplierListQuery,
    ) -> Result<Vec<Supplier>, AppError> {
        let state = validation::optional(query.state.clone()).map(|s| s.to_uppercase());
        let city = validation::optional(query.city.clone());
        let parts_type = query.parts_type.map(|p| p.as_str());
        let specialization = query.specialization.map(|s| s.as_str());

        let sql = format!(
            r#"SELECT {} FROM suppliers
               WHERE (? IS NULL OR state = ?)
                 AND (? IS NULL OR LOWER(city) = LOWER(?))
                 AND (? IS NULL OR parts_type = ?)
                 AND (? IS NULL OR specialization = ?)
               ORDER BY created_at {order}, rowid {order}"#,
            SUPPLIER_COLUMNS,
            order = query.order.sql()
        );

        let rows = sqlx::query(&sql)
            .bind(&state)
            .bind(&state)
            .bind(&city)
            .bind(&city)
            .bind(parts_type)
            .bind(parts_type)
            .bind(specialization)
            .bind(specialization)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(supplier_from_row).collect())
    }

    /// Every supplier, for rebuilding the search index.
    pub async fn all_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        self.list_suppliers(&SupplierListQuery::default()).await
    }

    /// Get a supplier by ID.
    pub async fn get_supplier(&self, id: &str) -> Result<Option<Supplier>, AppError> {
        let sql = format!("SELECT {} FROM suppliers WHERE id = ?", SUPPLIER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(supplier_from_row))
    }

    /// Create a new supplier.
    pub async fn create_supplier(
        &self,
        request: &CreateSupplierRequest,
    ) -> Result<Supplier, AppError> {
        let supplier = self.insert_supplier(request).await?;
        self.increment_revision().await?;
        tracing::info!("Created supplier {} ({})", supplier.id, supplier.name);
        Ok(supplier)
    }

    /// Create one supplier per mapped CSV row. A row that fails validation
    /// or insertion is reported and the remaining rows are still attempted.
    pub async fn import_suppliers(&self, rows: Vec<ParsedRow>) -> (Vec<Supplier>, Vec<RowError>) {
        let mut imported = Vec::new();
        let mut skipped = Vec::new();

        for row in rows {
            match self.insert_supplier(&row.request).await {
                Ok(supplier) => imported.push(supplier),
                Err(e) => {
                    tracing::warn!("CSV line {} not imported: {}", row.line, e);
                    skipped.push(RowError {
                        line: row.line,
                        message: e.message().to_string(),
                    });
                }
            }
        }

        if !imported.is_empty() {
            if let Err(e) = self.increment_revision().await {
                tracing::warn!("Failed to bump revision after import: {}", e);
            }
        }

        tracing::info!(
            "Supplier import finished: {} imported, {} skipped",
            imported.len(),
            skipped.len()
        );
        (imported, skipped)
    }

    /// Validate and insert without touching the revision.
    async fn insert_supplier(&self, request: &CreateSupplierRequest) -> Result<Supplier, AppError> {
        let supplier = Supplier {
            id: new_id(),
            name: validation::required("Name", &request.name)?,
            cnpj: validation::optional_cnpj(request.cnpj.clone())?,
            phone: validation::optional(request.phone.clone()),
            email: validation::optional_email(request.email.clone())?,
            contact_name: validation::optional(request.contact_name.clone()),
            address: validate_address(request.address.clone())?,
            parts_type: request.parts_type,
            specialization: request.specialization,
            created_at: now_timestamp(),
        };

        let address = &supplier.address;
        sqlx::query(
            r#"INSERT INTO suppliers (
                id, name, cnpj, phone, email, contact_name,
                street, number, neighborhood, city, state, zip_code,
                parts_type, specialization, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.cnpj)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.contact_name)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.neighborhood)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(supplier.parts_type.as_str())
        .bind(supplier.specialization.as_str())
        .bind(&supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Update a supplier; absent fields keep their stored value.
    pub async fn update_supplier(
        &self,
        id: &str,
        request: &UpdateSupplierRequest,
    ) -> Result<Supplier, AppError> {
        let existing = self
            .get_supplier(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Supplier {} not found", id)))?;

        let name = match &request.name {
            Some(n) => validation::required("Name", n)?,
            None => existing.name,
        };
        let cnpj = validation::patch(request.cnpj.clone(), existing.cnpj, validation::optional_cnpj)?;
        let phone = validation::patch_text(&request.phone, existing.phone);
        let email =
            validation::patch(request.email.clone(), existing.email, validation::optional_email)?;
        let contact_name = validation::patch_text(&request.contact_name, existing.contact_name);
        let address = match &request.address {
            Some(changes) => merge_address(changes, existing.address)?,
            None => existing.address,
        };
        let parts_type = request.parts_type.unwrap_or(existing.parts_type);
        let specialization = request.specialization.unwrap_or(existing.specialization);

        sqlx::query(
            r#"UPDATE suppliers SET
                name = ?, cnpj = ?, phone = ?, email = ?, contact_name = ?,
                street = ?, number = ?, neighborhood = ?, city = ?, state = ?, zip_code = ?,
                parts_type = ?, specialization = ?
            WHERE id = ?"#,
        )
        .bind(&name)
        .bind(&cnpj)
        .bind(&phone)
        .bind(&email)
        .bind(&contact_name)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.neighborhood)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(parts_type.as_str())
        .bind(specialization.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Supplier {
            id: id.to_string(),
            name,
            cnpj,
            phone,
            email,
            contact_name,
            address,
            parts_type,
            specialization,
            created_at: existing.created_at,
        })
    }

    /// Delete a supplier after clearing the rows that reference it.
    ///
    /// Each dependent table is attempted in turn; a failing step is recorded
    /// in the report and the sequence moves on. Only the final delete of the
    /// supplier row decides the outcome.
    pub async fn delete_supplier(&self, id: &str) -> Result<SupplierDeleteReport, AppError> {
        if self.get_supplier(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Supplier {} not found", id)));
        }

        let mut steps = Vec::with_capacity(SUPPLIER_DEPENDENTS.len());
        for table in SUPPLIER_DEPENDENTS {
            let sql = format!("DELETE FROM {} WHERE supplier_id = ?", table);
            let step = match sqlx::query(&sql).bind(id).execute(&self.pool).await {
                Ok(result) => CascadeStep {
                    table,
                    rows_deleted: result.rows_affected(),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("Cascade step {} failed for supplier {}: {}", table, id, e);
                    CascadeStep {
                        table,
                        rows_deleted: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            steps.push(step);
        }

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Supplier {} not found", id)));
        }
        steps.push(CascadeStep {
            table: "suppliers",
            rows_deleted: result.rows_affected(),
            error: None,
        });

        self.increment_revision().await?;
        tracing::info!("Deleted supplier {} and its dependents", id);

        Ok(SupplierDeleteReport {
            supplier_id: id.to_string(),
            steps,
        })
    }
}

fn validate_address(address: SupplierAddress) -> Result<SupplierAddress, AppError> {
    Ok(SupplierAddress {
        street: validation::optional(address.street),
        number: validation::optional(address.number),
        neighborhood: validation::optional(address.neighborhood),
        city: validation::optional(address.city),
        state: validation::optional_state(address.state)?,
        zip_code: validation::optional_zip_code(address.zip_code)?,
    })
}

fn merge_address(
    changes: &SupplierAddressPatch,
    existing: SupplierAddress,
) -> Result<SupplierAddress, AppError> {
    Ok(SupplierAddress {
        street: validation::patch_text(&changes.street, existing.street),
        number: validation::patch_text(&changes.number, existing.number),
        neighborhood: validation::patch_text(&changes.neighborhood, existing.neighborhood),
        city: validation::patch_text(&changes.city, existing.city),
        state: validation::patch(
            changes.state.clone(),
            existing.state,
            validation::optional_state,
        )?,
        zip_code: validation::patch(
            changes.zip_code.clone(),
            existing.zip_code,
            validation::optional_zip_code,
        )?,
    })
}

fn supplier_from_row(row: &sqlx::sqlite::SqliteRow) -> Supplier {
    let parts_type: String = row.get("parts_type");
    let specialization: String = row.get("specialization");

    Supplier {
        id: row.get("id"),
        name: row.get("name"),
        cnpj: row.get("cnpj"),
        phone: row.get("phone"),
        email: row.get("email"),
        contact_name: row.get("contact_name"),
        address: SupplierAddress {
            street: row.get("street"),
            number: row.get("number"),
            neighborhood: row.get("neighborhood"),
            city: row.get("city"),
            state: row.get("state"),
            zip_code: row.get("zip_code"),
        },
        parts_type: PartsType::from_str(&parts_type).unwrap_or_default(),
        specialization: Specialization::from_str(&specialization).unwrap_or_default(),
        created_at: row.get("created_at"),
    }
}
