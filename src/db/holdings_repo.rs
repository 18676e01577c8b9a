// src/db/holdings_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    access::{PropertyWithBuilding, ScopeLookup},
    common::error::AppError,
    models::holdings::{
        Building, CreateBuildingPayload, CreatePropertyPayload, Property, PropertyStatus,
        UpdateBuildingPayload, UpdatePropertyPayload,
    },
};

const DEFAULT_COUNTRY: &str = "Cameroun";

// Prédios e unidades. Toda leitura ignora linhas com soft delete.
#[derive(Clone)]
pub struct HoldingsRepository {
    pool: PgPool,
}

impl HoldingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PRÉDIOS
    // =========================================================================

    pub async fn find_building<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
    ) -> Result<Option<Building>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building = sqlx::query_as::<_, Building>(
            "SELECT * FROM buildings WHERE id = $1 AND NOT is_deleted",
        )
            .bind(building_id)
            .fetch_optional(executor)
            .await?;

        Ok(building)
    }

    pub async fn create_building<'e, E>(
        &self,
        executor: E,
        workspace_id: Uuid,
        created_by: Uuid,
        payload: &CreateBuildingPayload,
    ) -> Result<Building, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building = sqlx::query_as::<_, Building>(
            r#"
            INSERT INTO buildings (
                id, workspace_id, name, street, city, postal_code, country,
                latitude, longitude, floor_count, description, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(workspace_id)
            .bind(&payload.name)
            .bind(&payload.street)
            .bind(&payload.city)
            .bind(&payload.postal_code)
            .bind(payload.country.as_deref().unwrap_or(DEFAULT_COUNTRY))
            .bind(payload.latitude)
            .bind(payload.longitude)
            .bind(payload.floor_count)
            .bind(&payload.description)
            .bind(created_by)
            .fetch_one(executor)
            .await?;

        Ok(building)
    }

    // Só os campos presentes no payload mudam (COALESCE mantém o resto)
    pub async fn update_building<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        payload: &UpdateBuildingPayload,
    ) -> Result<Building, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building = sqlx::query_as::<_, Building>(
            r#"
            UPDATE buildings SET
                name = COALESCE($2, name),
                street = COALESCE($3, street),
                city = COALESCE($4, city),
                postal_code = COALESCE($5, postal_code),
                country = COALESCE($6, country),
                floor_count = COALESCE($7, floor_count),
                description = COALESCE($8, description),
                updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            RETURNING *
            "#,
        )
            .bind(building_id)
            .bind(&payload.name)
            .bind(&payload.street)
            .bind(&payload.city)
            .bind(&payload.postal_code)
            .bind(&payload.country)
            .bind(payload.floor_count)
            .bind(&payload.description)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("Prédio"))?;

        Ok(building)
    }

    pub async fn soft_delete_building<'e, E>(&self, executor: E, building_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE buildings SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(building_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn list_buildings<'e, E>(
        &self,
        executor: E,
        workspace_id: Uuid,
    ) -> Result<Vec<Building>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let buildings = sqlx::query_as::<_, Building>(
            "SELECT * FROM buildings WHERE workspace_id = $1 AND NOT is_deleted ORDER BY name ASC",
        )
            .bind(workspace_id)
            .fetch_all(executor)
            .await?;

        Ok(buildings)
    }

    // =========================================================================
    //  UNIDADES
    // =========================================================================

    pub async fn find_property<'e, E>(
        &self,
        executor: E,
        property_id: Uuid,
    ) -> Result<Option<Property>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let property = sqlx::query_as::<_, Property>(
            "SELECT * FROM properties WHERE id = $1 AND NOT is_deleted",
        )
            .bind(property_id)
            .fetch_optional(executor)
            .await?;

        Ok(property)
    }

    pub async fn create_property<'e, E>(
        &self,
        executor: E,
        workspace_id: Uuid,
        reference_code: &str,
        payload: &CreatePropertyPayload,
    ) -> Result<Property, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let property = sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO properties (
                id, workspace_id, building_id, reference_code, name, type, status,
                floor, door_number, surface_area, room_count, bedroom_count, bathroom_count,
                has_parking, has_balcony, monthly_rent, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'AVAILABLE', $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(workspace_id)
            .bind(payload.building_id)
            .bind(reference_code)
            .bind(&payload.name)
            .bind(payload.property_type)
            .bind(payload.floor)
            .bind(&payload.door_number)
            .bind(payload.surface_area)
            .bind(payload.room_count)
            .bind(payload.bedroom_count)
            .bind(payload.bathroom_count)
            .bind(payload.has_parking)
            .bind(payload.has_balcony)
            .bind(payload.monthly_rent)
            .bind(&payload.description)
            .fetch_one(executor)
            .await?;

        Ok(property)
    }

    pub async fn update_property<'e, E>(
        &self,
        executor: E,
        property_id: Uuid,
        payload: &UpdatePropertyPayload,
    ) -> Result<Property, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let property = sqlx::query_as::<_, Property>(
            r#"
            UPDATE properties SET
                name = COALESCE($2, name),
                floor = COALESCE($3, floor),
                door_number = COALESCE($4, door_number),
                surface_area = COALESCE($5, surface_area),
                room_count = COALESCE($6, room_count),
                bedroom_count = COALESCE($7, bedroom_count),
                bathroom_count = COALESCE($8, bathroom_count),
                has_parking = COALESCE($9, has_parking),
                has_balcony = COALESCE($10, has_balcony),
                monthly_rent = COALESCE($11, monthly_rent),
                description = COALESCE($12, description),
                updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            RETURNING *
            "#,
        )
            .bind(property_id)
            .bind(&payload.name)
            .bind(payload.floor)
            .bind(&payload.door_number)
            .bind(payload.surface_area)
            .bind(payload.room_count)
            .bind(payload.bedroom_count)
            .bind(payload.bathroom_count)
            .bind(payload.has_parking)
            .bind(payload.has_balcony)
            .bind(payload.monthly_rent)
            .bind(&payload.description)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("Unidade"))?;

        Ok(property)
    }

    pub async fn set_property_status<'e, E>(
        &self,
        executor: E,
        property_id: Uuid,
        status: PropertyStatus,
    ) -> Result<Property, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let property = sqlx::query_as::<_, Property>(
            r#"
            UPDATE properties SET status = $2, updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            RETURNING *
            "#,
        )
            .bind(property_id)
            .bind(status)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("Unidade"))?;

        Ok(property)
    }

    pub async fn soft_delete_property<'e, E>(&self, executor: E, property_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE properties SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(property_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn list_properties_for_building<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
    ) -> Result<Vec<Property>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let properties = sqlx::query_as::<_, Property>(
            r#"
            SELECT * FROM properties
            WHERE building_id = $1 AND NOT is_deleted
            ORDER BY floor ASC NULLS FIRST, name ASC
            "#,
        )
            .bind(building_id)
            .fetch_all(executor)
            .await?;

        Ok(properties)
    }

    // Unidades cujo prédio pai foi removido ficam de fora
    pub async fn list_properties_for_workspace<'e, E>(
        &self,
        executor: E,
        workspace_id: Uuid,
    ) -> Result<Vec<Property>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let properties = sqlx::query_as::<_, Property>(
            r#"
            SELECT p.* FROM properties p
            LEFT JOIN buildings b ON b.id = p.building_id
            WHERE p.workspace_id = $1
              AND NOT p.is_deleted
              AND (p.building_id IS NULL OR NOT b.is_deleted)
            ORDER BY p.reference_code ASC
            "#,
        )
            .bind(workspace_id)
            .fetch_all(executor)
            .await?;

        Ok(properties)
    }
}

#[async_trait]
impl ScopeLookup for HoldingsRepository {
    async fn find_building_by_id(&self, building_id: Uuid) -> Result<Option<Building>, AppError> {
        self.find_building(&self.pool, building_id).await
    }

    async fn find_property_with_parent_building_by_id(
        &self,
        property_id: Uuid,
    ) -> Result<Option<PropertyWithBuilding>, AppError> {
        let Some(property) = self.find_property(&self.pool, property_id).await? else {
            return Ok(None);
        };

        let building = match property.building_id {
            Some(building_id) => self.find_building(&self.pool, building_id).await?,
            None => None,
        };

        Ok(Some(PropertyWithBuilding { property, building }))
    }
}
