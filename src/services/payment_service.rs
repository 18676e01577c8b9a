// src/services/payment_service.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    access::{AccessGuard, Annotated, BulkPermissionAnnotator},
    common::error::AppError,
    db::{AuditRepository, FinanceRepository},
    models::{
        audit::{field_changes, snapshot, AuditAction, AuditEntry, EntityType},
        auth::User,
        finance::{
            Contract, CreatePaymentPayload, Payment, PaymentListing, PaymentStatus,
            UpdatePaymentPayload,
        },
        permission::PermissionLevel,
    },
    services::contract_service::ContractService,
};

/// Referência de um pagamento lançado à mão: `MANUAL-CTR-20261019-0042-20261105`.
pub fn manual_reference(contract_number: &str, due_date: NaiveDate) -> String {
    format!("MANUAL-{}-{}", contract_number, due_date.format("%Y%m%d"))
}

/// Data de pagamento a gravar: carimbada só na transição para PAID.
pub fn payment_date_on_transition(
    current: PaymentStatus,
    next: Option<PaymentStatus>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match next {
        Some(PaymentStatus::Paid) if current != PaymentStatus::Paid => Some(now),
        _ => None,
    }
}

/// Pagamento → contrato → unidade → prédio.
///
/// `found` traz o pagamento e o contrato dele. O workspace do pagamento é o do
/// contrato; inexistente ou de outro workspace é negado e auditado como o próprio
/// pagamento, sem expor o contrato alheio.
pub async fn authorize_payment(
    guard: &AccessGuard,
    user: &User,
    payment_id: Uuid,
    found: Option<(Payment, Contract)>,
    required: PermissionLevel,
) -> Result<Payment, AppError> {
    let (payment, contract) = match found {
        Some((payment, contract)) if contract.workspace_id == user.workspace_id => (payment, contract),
        _ => return guard.deny(user, EntityType::Payment, Some(payment_id)).await,
    };

    guard
        .require_property(user, contract.property_id, required)
        .await?;

    Ok(payment)
}

/// Registro de criação: o pagamento como ficou gravado (id, referência, data).
pub fn creation_entry(actor_id: Uuid, payment: &Payment) -> AuditEntry {
    AuditEntry::new(actor_id, AuditAction::Create, EntityType::Payment, payment.id)
        .with_new_values(snapshot(payment))
}

#[derive(Clone)]
pub struct PaymentService {
    pool: PgPool,
    finance_repo: FinanceRepository,
    audit_repo: AuditRepository,
    guard: AccessGuard,
    annotator: BulkPermissionAnnotator,
    contracts: ContractService,
}

impl PaymentService {
    pub fn new(
        pool: PgPool,
        finance_repo: FinanceRepository,
        audit_repo: AuditRepository,
        guard: AccessGuard,
        annotator: BulkPermissionAnnotator,
        contracts: ContractService,
    ) -> Self {
        Self {
            pool,
            finance_repo,
            audit_repo,
            guard,
            annotator,
            contracts,
        }
    }

    async fn authorize(
        &self,
        user: &User,
        payment_id: Uuid,
        required: PermissionLevel,
    ) -> Result<Payment, AppError> {
        let found = match self.finance_repo.find_payment(&self.pool, payment_id).await? {
            Some(payment) => self
                .finance_repo
                .find_contract(&self.pool, payment.contract_id)
                .await?
                .map(|contract| (payment, contract)),
            None => None,
        };

        authorize_payment(&self.guard, user, payment_id, found, required).await
    }

    pub async fn create(&self, user: &User, payload: CreatePaymentPayload) -> Result<Payment, AppError> {
        payload.validate()?;

        let contract = self
            .contracts
            .authorize(user, payload.contract_id, PermissionLevel::Update)
            .await?;

        let reference = manual_reference(&contract.contract_number, payload.due_date);
        let payment_date = (payload.status == PaymentStatus::Paid).then(|| self.guard.resolver().now());

        let mut tx = self.pool.begin().await?;

        let payment = self
            .finance_repo
            .create_payment(&mut *tx, &reference, user.id, &payload, payment_date)
            .await?;

        let entry = creation_entry(user.id, &payment);
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(payment)
    }

    pub async fn get(&self, user: &User, payment_id: Uuid) -> Result<Payment, AppError> {
        self.authorize(user, payment_id, PermissionLevel::View).await
    }

    pub async fn update(
        &self,
        user: &User,
        payment_id: Uuid,
        payload: UpdatePaymentPayload,
    ) -> Result<Payment, AppError> {
        payload.validate()?;

        let payment = self
            .authorize(user, payment_id, PermissionLevel::Update)
            .await?;

        let Some((old_values, new_values)) = field_changes(&payment, &payload) else {
            return Ok(payment);
        };

        let payment_date =
            payment_date_on_transition(payment.status, payload.status, self.guard.resolver().now());

        let mut tx = self.pool.begin().await?;

        let updated = self
            .finance_repo
            .update_payment(&mut *tx, payment_id, &payload, payment_date)
            .await?;

        let entry = AuditEntry::new(user.id, AuditAction::Update, EntityType::Payment, payment_id)
            .with_old_values(old_values)
            .with_new_values(new_values);
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;

        if payment_date.is_some() {
            tracing::info!(payment_id = %payment_id, "💰 Pagamento quitado");
        }
        Ok(updated)
    }

    pub async fn delete(&self, user: &User, payment_id: Uuid) -> Result<(), AppError> {
        let payment = self
            .authorize(user, payment_id, PermissionLevel::Delete)
            .await?;

        if payment.status == PaymentStatus::Paid {
            return Err(AppError::BusinessRule(
                "Não é possível remover um pagamento já quitado.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        self.finance_repo.delete_payment(&mut *tx, payment_id).await?;

        let entry = AuditEntry::new(user.id, AuditAction::Delete, EntityType::Payment, payment_id)
            .with_old_values(snapshot(&payment));
        self.audit_repo.record_in(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Pagamentos do workspace cuja unidade o usuário enxerga, com o nível efetivo.
    pub async fn list_for_user(&self, user: &User) -> Result<Vec<Annotated<PaymentListing>>, AppError> {
        let payments = self
            .finance_repo
            .list_payments_for_workspace(&self.pool, user.workspace_id)
            .await?;

        self.annotator.visible(user, payments).await
    }

    pub async fn list_for_contract(&self, user: &User, contract_id: Uuid) -> Result<Vec<Payment>, AppError> {
        self.contracts
            .authorize(user, contract_id, PermissionLevel::View)
            .await?;

        self.finance_repo
            .list_payments_for_contract(&self.pool, contract_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::testing::Fixture;
    use chrono::TimeZone;

    #[test]
    fn manual_reference_embeds_contract_and_due_date() {
        let due = NaiveDate::from_ymd_opt(2026, 11, 5).unwrap();
        assert_eq!(
            manual_reference("CTR-20261019-0042", due),
            "MANUAL-CTR-20261019-0042-20261105"
        );
    }

    #[test]
    fn payment_date_is_stamped_only_when_becoming_paid() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

        assert_eq!(
            payment_date_on_transition(PaymentStatus::Pending, Some(PaymentStatus::Paid), now),
            Some(now)
        );
        assert_eq!(
            payment_date_on_transition(PaymentStatus::Late, Some(PaymentStatus::Paid), now),
            Some(now)
        );
        assert_eq!(
            payment_date_on_transition(PaymentStatus::Paid, Some(PaymentStatus::Paid), now),
            None
        );
        assert_eq!(
            payment_date_on_transition(PaymentStatus::Pending, Some(PaymentStatus::Late), now),
            None
        );
        assert_eq!(payment_date_on_transition(PaymentStatus::Pending, None, now), None);
    }

    #[tokio::test]
    async fn payment_of_other_workspace_is_denied_as_payment() {
        let fx = Fixture::new();
        let owner = fx.owner();
        let property = fx.add_property(Some(fx.add_building().id));
        let mut contract = fx.contract_on(&property);
        contract.workspace_id = Uuid::new_v4();
        let payment = fx.payment_on(&contract);
        let payment_id = payment.id;

        let result = authorize_payment(
            &fx.guard(),
            &owner,
            payment_id,
            Some((payment, contract)),
            PermissionLevel::View,
        )
        .await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
        let entries = fx.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entity_type, EntityType::Payment);
        assert_eq!(entries[0].entity_id, payment_id);
    }

    #[tokio::test]
    async fn payment_access_follows_the_building_grant() {
        let fx = Fixture::new();
        let manager = fx.manager();
        let building = fx.add_building();
        let property = fx.add_property(Some(building.id));
        let contract = fx.contract_on(&property);
        let payment = fx.payment_on(&contract);
        let guard = fx.guard();

        let denied = authorize_payment(
            &guard,
            &manager,
            payment.id,
            Some((payment.clone(), contract.clone())),
            PermissionLevel::View,
        )
        .await;
        assert!(matches!(denied, Err(AppError::AccessDenied)));
        assert_eq!(fx.audit.entries()[0].entity_type, EntityType::Property);

        fx.store.grant(manager.id, building.id, PermissionLevel::Delete, None);
        let allowed = authorize_payment(
            &guard,
            &manager,
            payment.id,
            Some((payment.clone(), contract)),
            PermissionLevel::Delete,
        )
        .await
        .unwrap();
        assert_eq!(allowed.id, payment.id);
    }

    #[test]
    fn creation_entry_snapshots_the_stored_payment() {
        let fx = Fixture::new();
        let contract = fx.contract_on(&fx.add_property(None));
        let payment = fx.payment_on(&contract);
        let actor = Uuid::new_v4();

        let entry = creation_entry(actor, &payment);

        assert_eq!(entry.action, AuditAction::Create);
        assert_eq!(entry.entity_type, EntityType::Payment);
        assert_eq!(entry.entity_id, payment.id);
        assert!(entry.old_values.is_none());
        let new_values = entry.new_values.unwrap();
        assert_eq!(new_values["id"], payment.id.to_string());
        assert_eq!(new_values["referenceNumber"], "PAY-202610-0001");
        assert_eq!(new_values["status"], "PENDING");
    }
}
