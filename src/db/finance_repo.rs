// src/db/finance_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::finance::{
        Contract, ContractListing, ContractStatus, CreatePaymentPayload, CreateRenterPayload,
        Payment, PaymentFrequency, PaymentListing, Renter, UpdateContractPayload,
        UpdatePaymentPayload, UpdateRenterPayload,
    },
};

// Dados já resolvidos pelo serviço (número, datas, status inicial)
#[derive(Debug, Clone)]
pub struct NewContract<'a> {
    pub property_id: Uuid,
    pub renter_id: Uuid,
    pub contract_number: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub charges: Decimal,
    pub deposit: Decimal,
    pub payment_frequency: PaymentFrequency,
    pub status: ContractStatus,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct FinanceRepository {
    pool: PgPool,
}

impl FinanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  LOCATÁRIOS
    // =========================================================================

    pub async fn create_renter<'e, E>(
        &self,
        executor: E,
        workspace_id: Uuid,
        payload: &CreateRenterPayload,
        encrypted_id_number: &str,
    ) -> Result<Renter, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let renter = sqlx::query_as::<_, Renter>(
            r#"
            INSERT INTO renters (
                id, workspace_id, first_name, last_name, email, phone, address,
                emergency_contact_name, emergency_contact_phone, id_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(workspace_id)
            .bind(&payload.first_name)
            .bind(&payload.last_name)
            .bind(&payload.email)
            .bind(&payload.phone)
            .bind(&payload.address)
            .bind(&payload.emergency_contact_name)
            .bind(&payload.emergency_contact_phone)
            .bind(encrypted_id_number)
            .fetch_one(executor)
            .await?;

        Ok(renter)
    }

    pub async fn find_renter<'e, E>(&self, executor: E, renter_id: Uuid) -> Result<Option<Renter>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let renter = sqlx::query_as::<_, Renter>(
            "SELECT * FROM renters WHERE id = $1 AND NOT is_deleted",
        )
            .bind(renter_id)
            .fetch_optional(executor)
            .await?;

        Ok(renter)
    }

    pub async fn update_renter<'e, E>(
        &self,
        executor: E,
        renter_id: Uuid,
        payload: &UpdateRenterPayload,
        encrypted_id_number: Option<&str>,
    ) -> Result<Renter, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let renter = sqlx::query_as::<_, Renter>(
            r#"
            UPDATE renters SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                emergency_contact_name = COALESCE($7, emergency_contact_name),
                emergency_contact_phone = COALESCE($8, emergency_contact_phone),
                id_number = COALESCE($9, id_number),
                updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            RETURNING *
            "#,
        )
            .bind(renter_id)
            .bind(&payload.first_name)
            .bind(&payload.last_name)
            .bind(&payload.email)
            .bind(&payload.phone)
            .bind(&payload.address)
            .bind(&payload.emergency_contact_name)
            .bind(&payload.emergency_contact_phone)
            .bind(encrypted_id_number)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("Locatário"))?;

        Ok(renter)
    }

    pub async fn soft_delete_renter<'e, E>(&self, executor: E, renter_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE renters SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(renter_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn list_renters<'e, E>(&self, executor: E, workspace_id: Uuid) -> Result<Vec<Renter>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let renters = sqlx::query_as::<_, Renter>(
            r#"
            SELECT * FROM renters
            WHERE workspace_id = $1 AND NOT is_deleted
            ORDER BY last_name ASC, first_name ASC
            "#,
        )
            .bind(workspace_id)
            .fetch_all(executor)
            .await?;

        Ok(renters)
    }

    pub async fn count_active_contracts_for_renter<'e, E>(
        &self,
        executor: E,
        renter_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM contracts
            WHERE renter_id = $1 AND status = 'ACTIVE' AND NOT is_deleted
            "#,
        )
            .bind(renter_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    // =========================================================================
    //  CONTRATOS
    // =========================================================================

    pub async fn create_contract<'e, E>(
        &self,
        executor: E,
        workspace_id: Uuid,
        created_by: Uuid,
        contract: &NewContract<'_>,
    ) -> Result<Contract, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contract = sqlx::query_as::<_, Contract>(
            r#"
            INSERT INTO contracts (
                id, workspace_id, property_id, renter_id, contract_number,
                start_date, end_date, monthly_rent, charges, deposit,
                payment_frequency, status, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(workspace_id)
            .bind(contract.property_id)
            .bind(contract.renter_id)
            .bind(contract.contract_number)
            .bind(contract.start_date)
            .bind(contract.end_date)
            .bind(contract.monthly_rent)
            .bind(contract.charges)
            .bind(contract.deposit)
            .bind(contract.payment_frequency)
            .bind(contract.status)
            .bind(contract.notes)
            .bind(created_by)
            .fetch_one(executor)
            .await?;

        Ok(contract)
    }

    pub async fn find_contract<'e, E>(&self, executor: E, contract_id: Uuid) -> Result<Option<Contract>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contract = sqlx::query_as::<_, Contract>(
            "SELECT * FROM contracts WHERE id = $1 AND NOT is_deleted",
        )
            .bind(contract_id)
            .fetch_optional(executor)
            .await?;

        Ok(contract)
    }

    pub async fn update_contract<'e, E>(
        &self,
        executor: E,
        contract_id: Uuid,
        payload: &UpdateContractPayload,
    ) -> Result<Contract, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contract = sqlx::query_as::<_, Contract>(
            r#"
            UPDATE contracts SET
                monthly_rent = COALESCE($2, monthly_rent),
                charges = COALESCE($3, charges),
                deposit = COALESCE($4, deposit),
                end_date = COALESCE($5, end_date),
                payment_frequency = COALESCE($6, payment_frequency),
                notes = COALESCE($7, notes),
                updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            RETURNING *
            "#,
        )
            .bind(contract_id)
            .bind(payload.monthly_rent)
            .bind(payload.charges)
            .bind(payload.deposit)
            .bind(payload.end_date)
            .bind(payload.payment_frequency)
            .bind(&payload.notes)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("Contrato"))?;

        Ok(contract)
    }

    pub async fn set_contract_status<'e, E>(
        &self,
        executor: E,
        contract_id: Uuid,
        status: ContractStatus,
    ) -> Result<Contract, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contract = sqlx::query_as::<_, Contract>(
            r#"
            UPDATE contracts SET status = $2, updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            RETURNING *
            "#,
        )
            .bind(contract_id)
            .bind(status)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("Contrato"))?;

        Ok(contract)
    }

    pub async fn soft_delete_contract<'e, E>(&self, executor: E, contract_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE contracts SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(contract_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn list_contracts_for_property<'e, E>(
        &self,
        executor: E,
        property_id: Uuid,
    ) -> Result<Vec<Contract>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contracts = sqlx::query_as::<_, Contract>(
            r#"
            SELECT * FROM contracts
            WHERE property_id = $1 AND NOT is_deleted
            ORDER BY start_date DESC
            "#,
        )
            .bind(property_id)
            .fetch_all(executor)
            .await?;

        Ok(contracts)
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    // Contratos do workspace + o prédio da unidade (para a anotação de acesso).
    // Unidade removida ou prédio removido tiram o contrato da listagem.
    pub async fn list_contracts_for_workspace<'e, E>(
        &self,
        executor: E,
        workspace_id: Uuid,
    ) -> Result<Vec<ContractListing>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contracts = sqlx::query_as::<_, ContractListing>(
            r#"
            SELECT c.*, p.building_id
            FROM contracts c
            JOIN properties p ON p.id = c.property_id
            LEFT JOIN buildings b ON b.id = p.building_id
            WHERE c.workspace_id = $1
              AND NOT c.is_deleted
              AND NOT p.is_deleted
              AND (p.building_id IS NULL OR NOT b.is_deleted)
            ORDER BY c.start_date DESC
            "#,
        )
            .bind(workspace_id)
            .fetch_all(executor)
            .await?;

        Ok(contracts)
    }

    pub async fn create_payment<'e, E>(
        &self,
        executor: E,
        reference_number: &str,
        created_by: Uuid,
        payload: &CreatePaymentPayload,
        payment_date: Option<DateTime<Utc>>,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                id, contract_id, reference_number, amount, due_date, payment_date, status, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(payload.contract_id)
            .bind(reference_number)
            .bind(payload.amount)
            .bind(payload.due_date)
            .bind(payment_date)
            .bind(payload.status)
            .bind(created_by)
            .fetch_one(executor)
            .await?;

        Ok(payment)
    }

    pub async fn find_payment<'e, E>(&self, executor: E, payment_id: Uuid) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(payment_id)
            .fetch_optional(executor)
            .await?;

        Ok(payment)
    }

    pub async fn update_payment<'e, E>(
        &self,
        executor: E,
        payment_id: Uuid,
        payload: &UpdatePaymentPayload,
        payment_date: Option<DateTime<Utc>>,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET
                status = COALESCE($2, status),
                payment_method = COALESCE($3, payment_method),
                amount = COALESCE($4, amount),
                due_date = COALESCE($5, due_date),
                notes = COALESCE($6, notes),
                payment_date = COALESCE($7, payment_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(payment_id)
            .bind(payload.status)
            .bind(payload.payment_method)
            .bind(payload.amount)
            .bind(payload.due_date)
            .bind(&payload.notes)
            .bind(payment_date)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("Pagamento"))?;

        Ok(payment)
    }

    // Pagamento não tem soft delete
    pub async fn delete_payment<'e, E>(&self, executor: E, payment_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(payment_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn list_payments_for_contract<'e, E>(
        &self,
        executor: E,
        contract_id: Uuid,
    ) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE contract_id = $1 ORDER BY due_date ASC",
        )
            .bind(contract_id)
            .fetch_all(executor)
            .await?;

        Ok(payments)
    }

    // Pagamentos do workspace (pelo contrato) + o prédio da unidade alugada
    pub async fn list_payments_for_workspace<'e, E>(
        &self,
        executor: E,
        workspace_id: Uuid,
    ) -> Result<Vec<PaymentListing>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, PaymentListing>(
            r#"
            SELECT pay.*, p.building_id
            FROM payments pay
            JOIN contracts c ON c.id = pay.contract_id
            JOIN properties p ON p.id = c.property_id
            LEFT JOIN buildings b ON b.id = p.building_id
            WHERE c.workspace_id = $1
              AND NOT c.is_deleted
              AND NOT p.is_deleted
              AND (p.building_id IS NULL OR NOT b.is_deleted)
            ORDER BY pay.due_date DESC
            "#,
        )
            .bind(workspace_id)
            .fetch_all(executor)
            .await?;

        Ok(payments)
    }
}
