//! Quotation persistence: quotations with their part lines, the suppliers
//! invited to answer them and the offers those suppliers send back.

use sqlx::{Row, Sqlite, Transaction};

use super::repository::{increment_revision_tx, new_id, now_timestamp, Repository};
use crate::errors::AppError;
use crate::models::{
    CreateOfferRequest, CreateQuotationRequest, Quotation, QuotationListQuery, QuotationPart,
    QuotationPartInput, QuotationStatus, QuotationSupplier, Supplier, SupplierOffer,
    UpdateQuotationRequest, Vehicle,
};
use crate::validation;

const QUOTATION_SELECT: &str = r#"SELECT q.id AS id, q.vehicle_id, q.workshop_id, q.billing_company_id,
              q.status, q.notes, q.created_at AS created_at,
              v.plate AS v_plate, v.brand AS v_brand, v.model AS v_model, v.year AS v_year,
              v.color AS v_color, v.chassis AS v_chassis, v.created_at AS v_created_at
       FROM quotations q JOIN vehicles v ON v.id = q.vehicle_id"#;

impl Repository {
    /// List quotations with their vehicle and parts embedded.
    pub async fn list_quotations(
        &self,
        query: &QuotationListQuery,
    ) -> Result<Vec<Quotation>, AppError> {
        let vehicle_id = validation::optional(query.vehicle_id.clone());
        let status = query.status.map(|s| s.as_str());
        let sql = format!(
            r#"{}
               WHERE (? IS NULL OR q.vehicle_id = ?)
                 AND (? IS NULL OR q.status = ?)
               ORDER BY q.created_at {order}, q.rowid {order}"#,
            QUOTATION_SELECT,
            order = query.order.sql()
        );

        let rows = sqlx::query(&sql)
            .bind(&vehicle_id)
            .bind(&vehicle_id)
            .bind(status)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        let mut quotations = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut quotation = quotation_from_row(row);
            quotation.parts = self.load_parts(&quotation.id).await?;
            quotation.total = Quotation::compute_total(&quotation.parts);
            quotations.push(quotation);
        }
        Ok(quotations)
    }

    /// Get a quotation by ID.
    pub async fn get_quotation(&self, id: &str) -> Result<Option<Quotation>, AppError> {
        let sql = format!("{} WHERE q.id = ?", QUOTATION_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut quotation = quotation_from_row(&row);
        quotation.parts = self.load_parts(id).await?;
        quotation.total = Quotation::compute_total(&quotation.parts);
        Ok(Some(quotation))
    }

    async fn load_parts(&self, quotation_id: &str) -> Result<Vec<QuotationPart>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, code, quantity, unit_price FROM quotation_parts WHERE quotation_id = ? ORDER BY position",
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(part_from_row).collect())
    }

    /// Create a quotation and its parts in one transaction.
    pub async fn create_quotation(
        &self,
        request: &CreateQuotationRequest,
    ) -> Result<Quotation, AppError> {
        let vehicle_id = validation::required("Vehicle", &request.vehicle_id)?;
        let workshop_id = validation::optional(request.workshop_id.clone());
        let billing_company_id = validation::optional(request.billing_company_id.clone());
        self.check_quotation_references(&vehicle_id, &workshop_id, &billing_company_id)
            .await?;
        let parts = validate_parts(&request.parts)?;
        let notes = validation::optional(request.notes.clone());

        let id = new_id();
        let now = now_timestamp();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO quotations (id, vehicle_id, workshop_id, billing_company_id, status, notes, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&vehicle_id)
        .bind(&workshop_id)
        .bind(&billing_company_id)
        .bind(request.status.as_str())
        .bind(&notes)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        insert_parts(&mut tx, &id, &parts).await?;
        increment_revision_tx(&mut tx).await?;
        tx.commit().await?;

        tracing::info!("Created quotation {} with {} part(s)", id, parts.len());

        self.get_quotation(&id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Quotation {} vanished after insert", id)))
    }

    /// Update a quotation. A present part list replaces the stored one, and
    /// offers priced against the replaced parts are dropped with it.
    pub async fn update_quotation(
        &self,
        id: &str,
        request: &UpdateQuotationRequest,
    ) -> Result<Quotation, AppError> {
        let existing = self
            .get_quotation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quotation {} not found", id)))?;

        let vehicle_id = match &request.vehicle_id {
            Some(v) => validation::required("Vehicle", v)?,
            None => existing.vehicle_id,
        };
        let workshop_id = validation::patch_text(&request.workshop_id, existing.workshop_id);
        let billing_company_id =
            validation::patch_text(&request.billing_company_id, existing.billing_company_id);
        self.check_quotation_references(&vehicle_id, &workshop_id, &billing_company_id)
            .await?;
        let status = request.status.unwrap_or(existing.status);
        let notes = validation::patch_text(&request.notes, existing.notes);
        let parts = request.parts.as_deref().map(validate_parts).transpose()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE quotations SET vehicle_id = ?, workshop_id = ?, billing_company_id = ?, status = ?, notes = ? WHERE id = ?",
        )
        .bind(&vehicle_id)
        .bind(&workshop_id)
        .bind(&billing_company_id)
        .bind(status.as_str())
        .bind(&notes)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(parts) = &parts {
            sqlx::query("DELETE FROM supplier_offers WHERE quotation_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM quotation_parts WHERE quotation_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_parts(&mut tx, id, parts).await?;
        }

        increment_revision_tx(&mut tx).await?;
        tx.commit().await?;

        self.get_quotation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quotation {} not found", id)))
    }

    /// Delete a quotation with its parts, supplier links and offers.
    pub async fn delete_quotation(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for table in ["supplier_offers", "quotation_suppliers", "quotation_parts"] {
            let sql = format!("DELETE FROM {} WHERE quotation_id = ?", table);
            sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        }

        let result = sqlx::query("DELETE FROM quotations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the dependent deletes.
            return Err(AppError::NotFound(format!("Quotation {} not found", id)));
        }

        increment_revision_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Invite a supplier to answer a quotation. Inviting twice returns the
    /// existing link.
    pub async fn invite_supplier(
        &self,
        quotation_id: &str,
        supplier_id: &str,
    ) -> Result<QuotationSupplier, AppError> {
        self.require_quotation(quotation_id).await?;
        if self.get_supplier(supplier_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Supplier {} does not exist",
                supplier_id
            )));
        }

        if let Some(link) = self.find_link(quotation_id, supplier_id).await? {
            return Ok(link);
        }

        let link = QuotationSupplier {
            id: new_id(),
            quotation_id: quotation_id.to_string(),
            supplier_id: supplier_id.to_string(),
            created_at: now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO quotation_suppliers (id, quotation_id, supplier_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&link.id)
        .bind(&link.quotation_id)
        .bind(&link.supplier_id)
        .bind(&link.created_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(link)
    }

    /// Suppliers invited to a quotation, in invitation order.
    pub async fn list_quotation_suppliers(
        &self,
        quotation_id: &str,
    ) -> Result<Vec<Supplier>, AppError> {
        self.require_quotation(quotation_id).await?;

        let rows = sqlx::query(
            "SELECT supplier_id FROM quotation_suppliers WHERE quotation_id = ? ORDER BY created_at, rowid",
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        let mut suppliers = Vec::with_capacity(rows.len());
        for row in &rows {
            let supplier_id: String = row.get("supplier_id");
            if let Some(supplier) = self.get_supplier(&supplier_id).await? {
                suppliers.push(supplier);
            }
        }
        Ok(suppliers)
    }

    /// Record an invited supplier's price for one of the quotation's parts.
    pub async fn create_offer(
        &self,
        quotation_id: &str,
        request: &CreateOfferRequest,
    ) -> Result<SupplierOffer, AppError> {
        let quotation = self.require_quotation(quotation_id).await?;

        if self
            .find_link(quotation_id, &request.supplier_id)
            .await?
            .is_none()
        {
            return Err(AppError::Validation(format!(
                "Supplier {} was not invited to quotation {}",
                request.supplier_id, quotation_id
            )));
        }
        if !quotation.parts.iter().any(|p| p.id == request.part_id) {
            return Err(AppError::Validation(format!(
                "Part {} does not belong to quotation {}",
                request.part_id, quotation_id
            )));
        }
        if matches!(request.delivery_days, Some(days) if days < 0) {
            return Err(AppError::Validation(
                "Delivery days cannot be negative".to_string(),
            ));
        }

        let offer = SupplierOffer {
            id: new_id(),
            quotation_id: quotation_id.to_string(),
            supplier_id: request.supplier_id.clone(),
            part_id: request.part_id.clone(),
            price: validation::price("Price", request.price)?,
            delivery_days: request.delivery_days,
            created_at: now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO supplier_offers (id, quotation_id, supplier_id, part_id, price, delivery_days, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&offer.id)
        .bind(&offer.quotation_id)
        .bind(&offer.supplier_id)
        .bind(&offer.part_id)
        .bind(offer.price)
        .bind(offer.delivery_days)
        .bind(&offer.created_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(offer)
    }

    /// Offers on a quotation, cheapest first.
    pub async fn list_offers(&self, quotation_id: &str) -> Result<Vec<SupplierOffer>, AppError> {
        self.require_quotation(quotation_id).await?;

        let rows = sqlx::query(
            "SELECT id, quotation_id, supplier_id, part_id, price, delivery_days, created_at FROM supplier_offers WHERE quotation_id = ? ORDER BY price, created_at",
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(offer_from_row).collect())
    }

    async fn require_quotation(&self, id: &str) -> Result<Quotation, AppError> {
        self.get_quotation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quotation {} not found", id)))
    }

    async fn find_link(
        &self,
        quotation_id: &str,
        supplier_id: &str,
    ) -> Result<Option<QuotationSupplier>, AppError> {
        let row = sqlx::query(
            "SELECT id, quotation_id, supplier_id, created_at FROM quotation_suppliers WHERE quotation_id = ? AND supplier_id = ?",
        )
        .bind(quotation_id)
        .bind(supplier_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| QuotationSupplier {
            id: r.get("id"),
            quotation_id: r.get("quotation_id"),
            supplier_id: r.get("supplier_id"),
            created_at: r.get("created_at"),
        }))
    }

    async fn check_quotation_references(
        &self,
        vehicle_id: &str,
        workshop_id: &Option<String>,
        billing_company_id: &Option<String>,
    ) -> Result<(), AppError> {
        if self.get_vehicle(vehicle_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Vehicle {} does not exist",
                vehicle_id
            )));
        }
        if let Some(workshop_id) = workshop_id {
            if self.get_workshop(workshop_id).await?.is_none() {
                return Err(AppError::Validation(format!(
                    "Workshop {} does not exist",
                    workshop_id
                )));
            }
        }
        if let Some(company_id) = billing_company_id {
            if self.get_billing_company(company_id).await?.is_none() {
                return Err(AppError::Validation(format!(
                    "Billing company {} does not exist",
                    company_id
                )));
            }
        }
        Ok(())
    }
}

fn validate_parts(inputs: &[QuotationPartInput]) -> Result<Vec<QuotationPart>, AppError> {
    inputs
        .iter()
        .map(|input| {
            Ok(QuotationPart {
                id: new_id(),
                name: validation::required("Part name", &input.name)?,
                code: validation::optional(input.code.clone()),
                quantity: validation::quantity(input.quantity)?,
                unit_price: input
                    .unit_price
                    .map(|p| validation::price("Unit price", p))
                    .transpose()?,
            })
        })
        .collect()
}

async fn insert_parts(
    tx: &mut Transaction<'_, Sqlite>,
    quotation_id: &str,
    parts: &[QuotationPart],
) -> Result<(), AppError> {
    for (position, part) in parts.iter().enumerate() {
        sqlx::query(
            "INSERT INTO quotation_parts (id, quotation_id, position, name, code, quantity, unit_price) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&part.id)
        .bind(quotation_id)
        .bind(position as i64)
        .bind(&part.name)
        .bind(&part.code)
        .bind(part.quantity)
        .bind(part.unit_price)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn quotation_from_row(row: &sqlx::sqlite::SqliteRow) -> Quotation {
    let status: String = row.get("status");
    let vehicle_id: String = row.get("vehicle_id");

    Quotation {
        id: row.get("id"),
        vehicle: Some(Vehicle {
            id: vehicle_id.clone(),
            plate: row.get("v_plate"),
            brand: row.get("v_brand"),
            model: row.get("v_model"),
            year: row.get("v_year"),
            color: row.get("v_color"),
            chassis: row.get("v_chassis"),
            created_at: row.get("v_created_at"),
        }),
        vehicle_id,
        workshop_id: row.get("workshop_id"),
        billing_company_id: row.get("billing_company_id"),
        status: QuotationStatus::from_str(&status).unwrap_or_default(),
        notes: row.get("notes"),
        parts: Vec::new(),
        total: 0.0,
        created_at: row.get("created_at"),
    }
}

fn part_from_row(row: &sqlx::sqlite::SqliteRow) -> QuotationPart {
    QuotationPart {
        id: row.get("id"),
        name: row.get("name"),
        code: row.get("code"),
        quantity: row.get("quantity"),
        unit_price: row.get("unit_price"),
    }
}

fn offer_from_row(row: &sqlx::sqlite::SqliteRow) -> SupplierOffer {
    SupplierOffer {
        id: row.get("id"),
        quotation_id: row.get("quotation_id"),
        supplier_id: row.get("supplier_id"),
        part_id: row.get("part_id"),
        price: row.get("price"),
        delivery_days: row.get("delivery_days"),
        created_at: row.get("created_at"),
    }
}
