//! Billing company persistence.

use sqlx::Row;

use super::repository::{new_id, now_timestamp, Repository};
use crate::errors::AppError;
use crate::models::{
    BillingCompany, CompanyListQuery, CreateBillingCompanyRequest, UpdateBillingCompanyRequest,
};
use crate::validation;

const BILLING_COLUMNS: &str = "id, name, cnpj, email, phone, city, state, created_at";

impl Repository {
    /// List billing companies, optionally restricted to one state.
    pub async fn list_billing_companies(
        &self,
        query: &CompanyListQuery,
    ) -> Result<Vec<BillingCompany>, AppError> {
        let state = validation::optional(query.state.clone()).map(|s| s.to_uppercase());
        let sql = format!(
            "SELECT {} FROM billing_companies WHERE (? IS NULL OR state = ?) ORDER BY created_at {order}, rowid {order}",
            BILLING_COLUMNS,
            order = query.order.sql()
        );

        let rows = sqlx::query(&sql)
            .bind(&state)
            .bind(&state)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(billing_company_from_row).collect())
    }

    /// Get a billing company by ID.
    pub async fn get_billing_company(&self, id: &str) -> Result<Option<BillingCompany>, AppError> {
        let sql = format!("SELECT {} FROM billing_companies WHERE id = ?", BILLING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(billing_company_from_row))
    }

    /// Create a new billing company.
    pub async fn create_billing_company(
        &self,
        request: &CreateBillingCompanyRequest,
    ) -> Result<BillingCompany, AppError> {
        let company = BillingCompany {
            id: new_id(),
            name: validation::required("Name", &request.name)?,
            cnpj: validation::cnpj(&validation::required("CNPJ", &request.cnpj)?)?,
            email: validation::optional_email(request.email.clone())?,
            phone: validation::optional(request.phone.clone()),
            city: validation::optional(request.city.clone()),
            state: validation::optional_state(request.state.clone())?,
            created_at: now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO billing_companies (id, name, cnpj, email, phone, city, state, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.cnpj)
        .bind(&company.email)
        .bind(&company.phone)
        .bind(&company.city)
        .bind(&company.state)
        .bind(&company.created_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(company)
    }

    /// Update a billing company; absent fields keep their stored value.
    pub async fn update_billing_company(
        &self,
        id: &str,
        request: &UpdateBillingCompanyRequest,
    ) -> Result<BillingCompany, AppError> {
        let existing = self
            .get_billing_company(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Billing company {} not found", id)))?;

        let name = match &request.name {
            Some(n) => validation::required("Name", n)?,
            None => existing.name,
        };
        let cnpj = match &request.cnpj {
            Some(c) => validation::cnpj(c)?,
            None => existing.cnpj,
        };
        let email =
            validation::patch(request.email.clone(), existing.email, validation::optional_email)?;
        let phone = validation::patch_text(&request.phone, existing.phone);
        let city = validation::patch_text(&request.city, existing.city);
        let state =
            validation::patch(request.state.clone(), existing.state, validation::optional_state)?;

        sqlx::query(
            "UPDATE billing_companies SET name = ?, cnpj = ?, email = ?, phone = ?, city = ?, state = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(&cnpj)
        .bind(&email)
        .bind(&phone)
        .bind(&city)
        .bind(&state)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(BillingCompany {
            id: id.to_string(),
            name,
            cnpj,
            email,
            phone,
            city,
            state,
            created_at: existing.created_at,
        })
    }

    /// Delete a billing company that no quotation references.
    pub async fn delete_billing_company(&self, id: &str) -> Result<(), AppError> {
        let quotations = self
            .count_references("quotations", "billing_company_id", id)
            .await?;
        if quotations > 0 {
            return Err(AppError::Conflict(format!(
                "Billing company {} is referenced by {} quotation(s)",
                id, quotations
            )));
        }

        let result = sqlx::query("DELETE FROM billing_companies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Billing company {} not found",
                id
            )));
        }

        self.increment_revision().await?;
        Ok(())
    }
}

fn billing_company_from_row(row: &sqlx::sqlite::SqliteRow) -> BillingCompany {
    BillingCompany {
        id: row.get("id"),
        name: row.get("name"),
        cnpj: row.get("cnpj"),
        email: row.get("email"),
        phone: row.get("phone"),
        city: row.get("city"),
        state: row.get("state"),
        created_at: row.get("created_at"),
    }
}
