// src/access/testing.rs
//
// Dublês em memória para os testes do núcleo de acesso.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    access::{
        annotator::BulkPermissionAnnotator,
        guard::AccessGuard,
        resolver::ScopeResolver,
        traits::{AuditSink, Clock, GrantStore, PropertyWithBuilding, ScopeLookup},
    },
    common::error::AppError,
    models::{
        audit::AuditEntry,
        auth::{User, UserRole},
        finance::{Contract, ContractStatus, Payment, PaymentFrequency, PaymentStatus},
        holdings::{Building, Property, PropertyStatus, PropertyType},
        permission::{GrantLevel, PermissionGrant, PermissionLevel},
    },
};

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    grants: Mutex<Vec<PermissionGrant>>,
    buildings: Mutex<HashMap<Uuid, Building>>,
    properties: Mutex<HashMap<Uuid, Property>>,
    grant_queries: AtomicUsize,
    fail_next: AtomicBool,
}

impl InMemoryStore {
    pub fn grant(
        &self,
        user_id: Uuid,
        building_id: Uuid,
        level: PermissionLevel,
        expires_at: Option<DateTime<Utc>>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.grants.lock().unwrap().push(PermissionGrant {
            id,
            user_id,
            building_id,
            level,
            granted_by: None,
            granted_at: Utc::now(),
            expires_at,
            is_deleted: false,
        });
        id
    }

    pub fn soft_delete_grant(&self, grant_id: Uuid) {
        for grant in self.grants.lock().unwrap().iter_mut() {
            if grant.id == grant_id {
                grant.is_deleted = true;
            }
        }
    }

    pub fn insert_building(&self, building: Building) {
        self.buildings.lock().unwrap().insert(building.id, building);
    }

    pub fn insert_property(&self, property: Property) {
        self.properties.lock().unwrap().insert(property.id, property);
    }

    pub fn soft_delete_building(&self, building_id: Uuid) {
        if let Some(building) = self.buildings.lock().unwrap().get_mut(&building_id) {
            building.is_deleted = true;
        }
    }

    pub fn soft_delete_property(&self, property_id: Uuid) {
        if let Some(property) = self.properties.lock().unwrap().get_mut(&property_id) {
            property.is_deleted = true;
        }
    }

    /// Quantas consultas de concessão foram feitas (unitárias + em lote).
    pub fn grant_queries(&self) -> usize {
        self.grant_queries.load(Ordering::SeqCst)
    }

    /// A próxima consulta (de concessão ou de entidade) falha como se o banco caísse.
    pub fn fail_next_query(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), AppError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl GrantStore for InMemoryStore {
    async fn valid_grants_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<GrantLevel>, AppError> {
        self.grant_queries.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self
            .grants
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.user_id == user_id && g.is_valid_at(now))
            .map(|g| GrantLevel {
                building_id: g.building_id,
                level: g.level,
            })
            .collect())
    }

    async fn valid_grants_for_user_and_building(
        &self,
        user_id: Uuid,
        building_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<PermissionLevel>, AppError> {
        self.grant_queries.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self
            .grants
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.user_id == user_id && g.building_id == building_id && g.is_valid_at(now))
            .map(|g| g.level)
            .collect())
    }
}

#[async_trait]
impl ScopeLookup for InMemoryStore {
    async fn find_building_by_id(&self, building_id: Uuid) -> Result<Option<Building>, AppError> {
        self.check_failure()?;
        Ok(self
            .buildings
            .lock()
            .unwrap()
            .get(&building_id)
            .filter(|b| !b.is_deleted)
            .cloned())
    }

    async fn find_property_with_parent_building_by_id(
        &self,
        property_id: Uuid,
    ) -> Result<Option<PropertyWithBuilding>, AppError> {
        self.check_failure()?;
        let property = match self
            .properties
            .lock()
            .unwrap()
            .get(&property_id)
            .filter(|p| !p.is_deleted)
            .cloned()
        {
            Some(property) => property,
            None => return Ok(None),
        };

        let building = property.building_id.and_then(|id| {
            self.buildings
                .lock()
                .unwrap()
                .get(&id)
                .filter(|b| !b.is_deleted)
                .cloned()
        });

        Ok(Some(PropertyWithBuilding { property, building }))
    }
}

#[derive(Default)]
pub struct RecordingAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAuditSink {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AppError> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

/// Um workspace com seus dublês já ligados.
pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub audit: Arc<RecordingAuditSink>,
    pub clock: Arc<FixedClock>,
    pub workspace_id: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::default()),
            audit: Arc::new(RecordingAuditSink::default()),
            clock: Arc::new(FixedClock(fixed_now())),
            workspace_id: Uuid::new_v4(),
        }
    }

    pub fn resolver(&self) -> ScopeResolver {
        ScopeResolver::new(self.store.clone(), self.clock.clone())
    }

    pub fn guard(&self) -> AccessGuard {
        AccessGuard::new(self.store.clone(), self.resolver(), self.audit.clone())
    }

    pub fn annotator(&self) -> BulkPermissionAnnotator {
        BulkPermissionAnnotator::new(self.resolver())
    }

    pub fn user_in(&self, workspace_id: Uuid, role: UserRole) -> User {
        let id = Uuid::new_v4();
        User {
            id,
            workspace_id,
            email: format!("{}@immob.test", id.simple()),
            password_hash: String::new(),
            first_name: "Test".into(),
            last_name: format!("{:?}", role),
            phone: None,
            role,
            created_by: None,
            is_deleted: false,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    pub fn owner(&self) -> User {
        self.user_in(self.workspace_id, UserRole::Owner)
    }

    pub fn manager(&self) -> User {
        self.user_in(self.workspace_id, UserRole::Manager)
    }

    pub fn viewer(&self) -> User {
        self.user_in(self.workspace_id, UserRole::Viewer)
    }

    pub fn building_in(&self, workspace_id: Uuid) -> Building {
        let building = Building {
            id: Uuid::new_v4(),
            workspace_id,
            name: "Résidence Les Palmiers".into(),
            street: "Rue 1.234".into(),
            city: "Douala".into(),
            postal_code: "00237".into(),
            country: "Cameroun".into(),
            latitude: None,
            longitude: None,
            floor_count: 3,
            description: None,
            created_by: None,
            is_deleted: false,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        };
        self.store.insert_building(building.clone());
        building
    }

    pub fn add_building(&self) -> Building {
        self.building_in(self.workspace_id)
    }

    pub fn add_property(&self, building_id: Option<Uuid>) -> Property {
        let property = Property {
            id: Uuid::new_v4(),
            workspace_id: self.workspace_id,
            building_id,
            reference_code: "APT-2610001".into(),
            name: "Appartement A1".into(),
            property_type: PropertyType::Apartment,
            status: PropertyStatus::Available,
            floor: Some(1),
            door_number: Some("A1".into()),
            surface_area: 65.0,
            room_count: 3,
            bedroom_count: 2,
            bathroom_count: 1,
            has_parking: false,
            has_balcony: true,
            monthly_rent: Decimal::new(150_000, 0),
            description: None,
            is_deleted: false,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        };
        self.store.insert_property(property.clone());
        property
    }

    /// Contrato ativo sobre a unidade, no workspace dela (não passa pelo store).
    pub fn contract_on(&self, property: &Property) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            workspace_id: property.workspace_id,
            property_id: property.id,
            renter_id: Uuid::new_v4(),
            contract_number: "CTR-2026-0001".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            monthly_rent: property.monthly_rent,
            charges: Decimal::ZERO,
            deposit: Decimal::new(300_000, 0),
            payment_frequency: PaymentFrequency::Monthly,
            status: ContractStatus::Active,
            notes: None,
            created_by: None,
            is_deleted: false,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    pub fn payment_on(&self, contract: &Contract) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            contract_id: contract.id,
            reference_number: "PAY-202610-0001".into(),
            amount: contract.monthly_rent,
            due_date: NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
            payment_date: None,
            status: PaymentStatus::Pending,
            payment_method: None,
            notes: None,
            created_by: None,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }
}
