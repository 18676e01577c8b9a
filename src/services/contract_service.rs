// src/services/contract_service.rs

use chrono::{Months, NaiveDate};
use rand::Rng;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    access::{AccessGuard, Annotated, BulkPermissionAnnotator, PropertyWithBuilding},
    common::error::AppError,
    db::{AuditRepository, FinanceRepository, HoldingsRepository, NewContract},
    models::{
        audit::{field_changes, snapshot, AuditAction, AuditEntry, EntityType},
        auth::User,
        finance::{
            Contract, ContractListing, ContractStatus, CreateContractPayload, Renter,
            UpdateContractPayload,
        },
        holdings::PropertyStatus,
        permission::PermissionLevel,
    },
};

/// `CTR-20261019-0042`
pub fn contract_number<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> String {
    format!("CTR-{}-{:04}", today.format("%Y%m%d"), rng.gen_range(0..10_000))
}

/// Fim = início + N meses (dia ajustado para o fim do mês quando não existe, ex: 31/01 + 1 = 28/02).
pub fn contract_end_date(start: NaiveDate, months: u32) -> Result<NaiveDate, AppError> {
    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| AppError::BusinessRule("A data de término fica fora do calendário.".into()))
}

/// Contrato que já começou nasce ACTIVE; com início futuro, DRAFT.
pub fn initial_status(start: NaiveDate, today: NaiveDate) -> ContractStatus {
    if start <= today {
        ContractStatus::Active
    } else {
        ContractStatus::Draft
    }
}

/// Efeito de uma mudança de status do contrato sobre a unidade.
pub fn property_status_after(status: ContractStatus) -> Option<PropertyStatus> {
    match status {
        ContractStatus::Active => Some(PropertyStatus::Occupied),
        ContractStatus::Terminated => Some(PropertyStatus::Available),
        ContractStatus::Draft | ContractStatus::Expired => None,
    }
}

/// Contrato → unidade → prédio. `found` é o contrato como veio do banco.
///
/// Inexistente ou de outro workspace: negado e auditado como o próprio contrato.
/// Do mesmo workspace: vale o nível na unidade (e, por ela, no prédio).
pub async fn authorize_contract(
    guard: &AccessGuard,
    user: &User,
    contract_id: Uuid,
    found: Option<Contract>,
    required: PermissionLevel,
) -> Result<Contract, AppError> {
    let contract = match found {
        Some(contract) if contract.workspace_id == user.workspace_id => contract,
        _ => return guard.deny(user, EntityType::Contract, Some(contract_id)).await,
    };

    guard
        .require_property(user, contract.property_id, required)
        .await?;

    Ok(contract)
}

#[derive(Clone)]
pub struct ContractService {
    pool: PgPool,
    finance_repo: FinanceRepository,
    holdings_repo: HoldingsRepository,
    audit_repo: AuditRepository,
    guard: AccessGuard,
    annotator: BulkPermissionAnnotator,
}

impl ContractService {
    pub fn new(
        pool: PgPool,
        finance_repo: FinanceRepository,
        holdings_repo: HoldingsRepository,
        audit_repo: AuditRepository,
        guard: AccessGuard,
        annotator: BulkPermissionAnnotator,
    ) -> Self {
        Self {
            pool,
            finance_repo,
            holdings_repo,
            audit_repo,
            guard,
            annotator,
        }
    }

    /// Carrega o contrato e exige `required` na unidade dele.
    pub async fn authorize(
        &self,
        user: &User,
        contract_id: Uuid,
        required: PermissionLevel,
    ) -> Result<Contract, AppError> {
        let found = self.finance_repo.find_contract(&self.pool, contract_id).await?;
        authorize_contract(&self.guard, user, contract_id, found, required).await
    }

    async fn renter_in_workspace(&self, user: &User, renter_id: Uuid) -> Result<Renter, AppError> {
        match self.finance_repo.find_renter(&self.pool, renter_id).await? {
            Some(renter) if renter.workspace_id == user.workspace_id => Ok(renter),
            _ => self.guard.deny(user, EntityType::Renter, Some(renter_id)).await,
        }
    }

    pub async fn create(&self, user: &User, payload: CreateContractPayload) -> Result<Contract, AppError> {
        payload.validate()?;

        // 1. UPDATE na unidade (vincular contrato altera a unidade)
        let PropertyWithBuilding { property, .. } = self
            .guard
            .require_property(user, payload.property_id, PermissionLevel::Update)
            .await?;

        // 2. Locatário do mesmo workspace
        let renter = self.renter_in_workspace(user, payload.renter_id).await?;

        // 3. Unidade livre
        if property.status != PropertyStatus::Available {
            return Err(AppError::BusinessRule(
                "A unidade não está disponível para um novo contrato.".into(),
            ));
        }

        // 4. Datas, status e número
        let today = self.guard.resolver().now().date_naive();
        let end_date = contract_end_date(payload.start_date, payload.duration_in_months)?;
        let status = initial_status(payload.start_date, today);
        let number = contract_number(today, &mut rand::thread_rng());

        let new_contract = NewContract {
            property_id: property.id,
            renter_id: renter.id,
            contract_number: &number,
            start_date: payload.start_date,
            end_date,
            monthly_rent: payload.monthly_rent,
            charges: payload.charges,
            deposit: payload.deposit,
            payment_frequency: payload.payment_frequency,
            status,
            notes: payload.notes.as_deref(),
        };

        // 5. Contrato + efeito na unidade + auditoria, tudo ou nada
        let mut tx = self.pool.begin().await?;

        let contract = self
            .finance_repo
            .create_contract(&mut *tx, user.workspace_id, user.id, &new_contract)
            .await?;

        if let Some(property_status) = property_status_after(status) {
            self.holdings_repo
                .set_property_status(&mut *tx, property.id, property_status)
                .await?;
        }

        let entry = AuditEntry::new(user.id, AuditAction::Create, EntityType::Contract, contract.id)
            .with_new_values(snapshot(&contract));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(
            contract_id = %contract.id,
            number = %contract.contract_number,
            status = ?contract.status,
            "📝 Contrato criado"
        );
        Ok(contract)
    }

    pub async fn get(&self, user: &User, contract_id: Uuid) -> Result<Contract, AppError> {
        self.authorize(user, contract_id, PermissionLevel::View).await
    }

    pub async fn update(
        &self,
        user: &User,
        contract_id: Uuid,
        payload: UpdateContractPayload,
    ) -> Result<Contract, AppError> {
        payload.validate()?;

        let contract = self
            .authorize(user, contract_id, PermissionLevel::Update)
            .await?;

        if let Some(end_date) = payload.end_date {
            if end_date <= contract.start_date {
                return Err(AppError::BusinessRule(
                    "A data de término deve ser posterior à data de início.".into(),
                ));
            }
        }

        let Some((old_values, new_values)) = field_changes(&contract, &payload) else {
            return Ok(contract);
        };

        let mut tx = self.pool.begin().await?;

        let updated = self
            .finance_repo
            .update_contract(&mut *tx, contract_id, &payload)
            .await?;

        let entry = AuditEntry::new(user.id, AuditAction::Update, EntityType::Contract, contract_id)
            .with_old_values(old_values)
            .with_new_values(new_values);
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// ACTIVE ocupa a unidade; TERMINATED a libera.
    pub async fn change_status(
        &self,
        user: &User,
        contract_id: Uuid,
        status: ContractStatus,
    ) -> Result<Contract, AppError> {
        let contract = self
            .authorize(user, contract_id, PermissionLevel::Update)
            .await?;

        if contract.status == status {
            return Ok(contract);
        }

        let mut tx = self.pool.begin().await?;

        let updated = self
            .finance_repo
            .set_contract_status(&mut *tx, contract_id, status)
            .await?;

        if let Some(property_status) = property_status_after(status) {
            self.holdings_repo
                .set_property_status(&mut *tx, contract.property_id, property_status)
                .await?;
        }

        let entry = AuditEntry::new(user.id, AuditAction::Update, EntityType::Contract, contract_id)
            .with_old_values(json!({ "status": contract.status }))
            .with_new_values(json!({ "status": status }));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, user: &User, contract_id: Uuid) -> Result<(), AppError> {
        let contract = self
            .authorize(user, contract_id, PermissionLevel::Delete)
            .await?;

        if contract.status == ContractStatus::Active {
            return Err(AppError::BusinessRule(
                "Não é possível remover um contrato ativo. Encerre-o antes.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        self.finance_repo.soft_delete_contract(&mut *tx, contract_id).await?;

        let entry = AuditEntry::new(user.id, AuditAction::Delete, EntityType::Contract, contract_id)
            .with_old_values(snapshot(&contract));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Contratos do workspace cuja unidade o usuário enxerga, com o nível efetivo.
    pub async fn list_for_user(&self, user: &User) -> Result<Vec<Annotated<ContractListing>>, AppError> {
        let contracts = self
            .finance_repo
            .list_contracts_for_workspace(&self.pool, user.workspace_id)
            .await?;

        self.annotator.visible(user, contracts).await
    }

    pub async fn list_for_property(&self, user: &User, property_id: Uuid) -> Result<Vec<Contract>, AppError> {
        self.guard
            .require_property(user, property_id, PermissionLevel::View)
            .await?;

        self.finance_repo
            .list_contracts_for_property(&self.pool, property_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::testing::Fixture;
    use rand::{rngs::StdRng, SeedableRng};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn contract_number_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let number = contract_number(date(2026, 10, 19), &mut rng);

        assert!(number.starts_with("CTR-20261019-"), "{number}");
        assert_eq!(number.len(), "CTR-20261019-0000".len());
        assert!(number[13..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn end_date_adds_calendar_months() {
        assert_eq!(contract_end_date(date(2026, 1, 15), 12).unwrap(), date(2027, 1, 15));
        assert_eq!(contract_end_date(date(2026, 11, 1), 3).unwrap(), date(2027, 2, 1));
    }

    #[test]
    fn end_date_clamps_to_month_end() {
        assert_eq!(contract_end_date(date(2026, 1, 31), 1).unwrap(), date(2026, 2, 28));
        assert_eq!(contract_end_date(date(2027, 12, 31), 2).unwrap(), date(2028, 2, 29));
    }

    #[test]
    fn status_depends_on_start_date() {
        let today = date(2026, 10, 19);
        assert_eq!(initial_status(today, today), ContractStatus::Active);
        assert_eq!(initial_status(date(2026, 10, 1), today), ContractStatus::Active);
        assert_eq!(initial_status(date(2026, 10, 20), today), ContractStatus::Draft);
    }

    #[test]
    fn status_changes_drive_property_status() {
        assert_eq!(
            property_status_after(ContractStatus::Active),
            Some(PropertyStatus::Occupied)
        );
        assert_eq!(
            property_status_after(ContractStatus::Terminated),
            Some(PropertyStatus::Available)
        );
        assert_eq!(property_status_after(ContractStatus::Draft), None);
        assert_eq!(property_status_after(ContractStatus::Expired), None);
    }

    #[tokio::test]
    async fn contract_of_other_workspace_is_denied_as_contract() {
        let fx = Fixture::new();
        let owner = fx.owner();
        let property = fx.add_property(Some(fx.add_building().id));
        let mut contract = fx.contract_on(&property);
        contract.workspace_id = Uuid::new_v4();
        let contract_id = contract.id;

        let result = authorize_contract(
            &fx.guard(),
            &owner,
            contract_id,
            Some(contract),
            PermissionLevel::View,
        )
        .await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
        let entries = fx.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entity_type, EntityType::Contract);
        assert_eq!(entries[0].entity_id, contract_id);
    }

    #[tokio::test]
    async fn missing_contract_is_denied_as_contract() {
        let fx = Fixture::new();
        let missing = Uuid::new_v4();

        let result =
            authorize_contract(&fx.guard(), &fx.owner(), missing, None, PermissionLevel::View).await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
        assert_eq!(fx.audit.entries()[0].entity_id, missing);
    }

    #[tokio::test]
    async fn contract_access_follows_the_building_grant() {
        let fx = Fixture::new();
        let manager = fx.manager();
        let building = fx.add_building();
        let property = fx.add_property(Some(building.id));
        let contract = fx.contract_on(&property);
        let guard = fx.guard();

        // Sem concessão: a negação cai na unidade
        let denied = authorize_contract(
            &guard,
            &manager,
            contract.id,
            Some(contract.clone()),
            PermissionLevel::View,
        )
        .await;
        assert!(matches!(denied, Err(AppError::AccessDenied)));
        let entries = fx.audit.entries();
        assert_eq!(entries[0].entity_type, EntityType::Property);
        assert_eq!(entries[0].entity_id, property.id);

        // VIEW no prédio abre a leitura do contrato, não a edição
        fx.store.grant(manager.id, building.id, PermissionLevel::View, None);
        let viewed = authorize_contract(
            &guard,
            &manager,
            contract.id,
            Some(contract.clone()),
            PermissionLevel::View,
        )
        .await
        .unwrap();
        assert_eq!(viewed.id, contract.id);

        let update = authorize_contract(
            &guard,
            &manager,
            contract.id,
            Some(contract),
            PermissionLevel::Update,
        )
        .await;
        assert!(matches!(update, Err(AppError::AccessDenied)));
        assert_eq!(fx.audit.count(), 2);
    }
}
