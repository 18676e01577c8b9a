// src/access/mod.rs
//
// Núcleo de controle de acesso: papel + concessões por prédio + cascata prédio → unidade.

pub mod annotator;
pub mod guard;
pub mod resolver;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use annotator::{Annotated, BulkPermissionAnnotator, ScopedRow};
pub use guard::{AccessGuard, Scope, ScopeRef};
pub use resolver::ScopeResolver;
pub use traits::{AuditSink, Clock, GrantStore, PropertyWithBuilding, ScopeLookup, SystemClock};
