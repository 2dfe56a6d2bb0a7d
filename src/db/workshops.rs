//! Workshop persistence.

use sqlx::Row;

use super::repository::{new_id, now_timestamp, Repository};
use crate::errors::AppError;
use crate::models::{CompanyListQuery, CreateWorkshopRequest, UpdateWorkshopRequest, Workshop};
use crate::validation;

const WORKSHOP_COLUMNS: &str = "id, name, cnpj, phone, contact_name, city, state, created_at";

impl Repository {
    /// List workshops, optionally restricted to one state.
    pub async fn list_workshops(&self, query: &CompanyListQuery) -> Result<Vec<Workshop>, AppError> {
        let state = validation::optional(query.state.clone()).map(|s| s.to_uppercase());
        let sql = format!(
            "SELECT {} FROM workshops WHERE (? IS NULL OR state = ?) ORDER BY created_at {order}, rowid {order}",
            WORKSHOP_COLUMNS,
            order = query.order.sql()
        );

        let rows = sqlx::query(&sql)
            .bind(&state)
            .bind(&state)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(workshop_from_row).collect())
    }

    /// Get a workshop by ID.
    pub async fn get_workshop(&self, id: &str) -> Result<Option<Workshop>, AppError> {
        let sql = format!("SELECT {} FROM workshops WHERE id = ?", WORKSHOP_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(workshop_from_row))
    }

    /// Create a new workshop.
    pub async fn create_workshop(
        &self,
        request: &CreateWorkshopRequest,
    ) -> Result<Workshop, AppError> {
        let workshop = Workshop {
            id: new_id(),
            name: validation::required("Name", &request.name)?,
            cnpj: validation::optional_cnpj(request.cnpj.clone())?,
            phone: validation::optional(request.phone.clone()),
            contact_name: validation::optional(request.contact_name.clone()),
            city: validation::optional(request.city.clone()),
            state: validation::optional_state(request.state.clone())?,
            created_at: now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO workshops (id, name, cnpj, phone, contact_name, city, state, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&workshop.id)
        .bind(&workshop.name)
        .bind(&workshop.cnpj)
        .bind(&workshop.phone)
        .bind(&workshop.contact_name)
        .bind(&workshop.city)
        .bind(&workshop.state)
        .bind(&workshop.created_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(workshop)
    }

    /// Update a workshop; absent fields keep their stored value.
    pub async fn update_workshop(
        &self,
        id: &str,
        request: &UpdateWorkshopRequest,
    ) -> Result<Workshop, AppError> {
        let existing = self
            .get_workshop(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workshop {} not found", id)))?;

        let name = match &request.name {
            Some(n) => validation::required("Name", n)?,
            None => existing.name,
        };
        let cnpj = validation::patch(request.cnpj.clone(), existing.cnpj, validation::optional_cnpj)?;
        let phone = validation::patch_text(&request.phone, existing.phone);
        let contact_name = validation::patch_text(&request.contact_name, existing.contact_name);
        let city = validation::patch_text(&request.city, existing.city);
        let state =
            validation::patch(request.state.clone(), existing.state, validation::optional_state)?;

        sqlx::query(
            "UPDATE workshops SET name = ?, cnpj = ?, phone = ?, contact_name = ?, city = ?, state = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(&cnpj)
        .bind(&phone)
        .bind(&contact_name)
        .bind(&city)
        .bind(&state)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Workshop {
            id: id.to_string(),
            name,
            cnpj,
            phone,
            contact_name,
            city,
            state,
            created_at: existing.created_at,
        })
    }

    /// Delete a workshop that no quotation references.
    pub async fn delete_workshop(&self, id: &str) -> Result<(), AppError> {
        let quotations = self.count_references("quotations", "workshop_id", id).await?;
        if quotations > 0 {
            return Err(AppError::Conflict(format!(
                "Workshop {} is referenced by {} quotation(s)",
                id, quotations
            )));
        }

        let result = sqlx::query("DELETE FROM workshops WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Workshop {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }
}

fn workshop_from_row(row: &sqlx::sqlite::SqliteRow) -> Workshop {
    Workshop {
        id: row.get("id"),
        name: row.get("name"),
        cnpj: row.get("cnpj"),
        phone: row.get("phone"),
        contact_name: row.get("contact_name"),
        city: row.get("city"),
        state: row.get("state"),
        created_at: row.get("created_at"),
    }
}
