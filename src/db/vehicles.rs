//! Vehicle persistence.

use sqlx::Row;

use super::repository::{new_id, now_timestamp, Repository};
use crate::errors::AppError;
use crate::models::{CreateVehicleRequest, UpdateVehicleRequest, Vehicle, VehicleListQuery};
use crate::validation;

const VEHICLE_COLUMNS: &str = "id, plate, brand, model, year, color, chassis, created_at";

impl Repository {
    /// List vehicles, newest first unless asked otherwise.
    pub async fn list_vehicles(&self, query: &VehicleListQuery) -> Result<Vec<Vehicle>, AppError> {
        let brand = validation::optional(query.brand.clone());
        let sql = format!(
            "SELECT {} FROM vehicles WHERE (? IS NULL OR LOWER(brand) = LOWER(?)) ORDER BY created_at {order}, rowid {order}",
            VEHICLE_COLUMNS,
            order = query.order.sql()
        );

        let rows = sqlx::query(&sql)
            .bind(&brand)
            .bind(&brand)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(vehicle_from_row).collect())
    }

    /// Get a vehicle by ID.
    pub async fn get_vehicle(&self, id: &str) -> Result<Option<Vehicle>, AppError> {
        let sql = format!("SELECT {} FROM vehicles WHERE id = ?", VEHICLE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(vehicle_from_row))
    }

    /// Create a new vehicle.
    pub async fn create_vehicle(&self, request: &CreateVehicleRequest) -> Result<Vehicle, AppError> {
        let vehicle = Vehicle {
            id: new_id(),
            plate: validation::plate(&request.plate)?,
            brand: validation::required("Brand", &request.brand)?,
            model: validation::required("Model", &request.model)?,
            year: validation::optional_year(request.year)?,
            color: validation::optional(request.color.clone()),
            chassis: validation::optional_chassis(request.chassis.clone())?,
            created_at: now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO vehicles (id, plate, brand, model, year, color, chassis, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&vehicle.id)
        .bind(&vehicle.plate)
        .bind(&vehicle.brand)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.color)
        .bind(&vehicle.chassis)
        .bind(&vehicle.created_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        tracing::info!("Created vehicle {} ({})", vehicle.id, vehicle.plate);

        Ok(vehicle)
    }

    /// Update a vehicle; absent fields keep their stored value.
    pub async fn update_vehicle(
        &self,
        id: &str,
        request: &UpdateVehicleRequest,
    ) -> Result<Vehicle, AppError> {
        let existing = self
            .get_vehicle(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", id)))?;

        let plate = match &request.plate {
            Some(p) => validation::plate(p)?,
            None => existing.plate,
        };
        let brand = match &request.brand {
            Some(b) => validation::required("Brand", b)?,
            None => existing.brand,
        };
        let model = match &request.model {
            Some(m) => validation::required("Model", m)?,
            None => existing.model,
        };
        let year = validation::patch(request.year, existing.year, validation::optional_year)?;
        let color = validation::patch_text(&request.color, existing.color);
        let chassis = validation::patch(
            request.chassis.clone(),
            existing.chassis,
            validation::optional_chassis,
        )?;

        sqlx::query(
            "UPDATE vehicles SET plate = ?, brand = ?, model = ?, year = ?, color = ?, chassis = ? WHERE id = ?",
        )
        .bind(&plate)
        .bind(&brand)
        .bind(&model)
        .bind(year)
        .bind(&color)
        .bind(&chassis)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Vehicle {
            id: id.to_string(),
            plate,
            brand,
            model,
            year,
            color,
            chassis,
            created_at: existing.created_at,
        })
    }

    /// Delete a vehicle that no quotation references.
    pub async fn delete_vehicle(&self, id: &str) -> Result<(), AppError> {
        let quotations = self.count_references("quotations", "vehicle_id", id).await?;
        if quotations > 0 {
            return Err(AppError::Conflict(format!(
                "Vehicle {} is referenced by {} quotation(s)",
                id, quotations
            )));
        }

        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Vehicle {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }
}

fn vehicle_from_row(row: &sqlx::sqlite::SqliteRow) -> Vehicle {
    Vehicle {
        id: row.get("id"),
        plate: row.get("plate"),
        brand: row.get("brand"),
        model: row.get("model"),
        year: row.get("year"),
        color: row.get("color"),
        chassis: row.get("chassis"),
        created_at: row.get("created_at"),
    }
}
