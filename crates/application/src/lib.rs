//! Application services and ports.

#![forbid(unsafe_code)]

mod bootstrap_seeder;
mod connectivity_gate;
mod identity_ports;
mod migration_service;

pub use bootstrap_seeder::{BootstrapSeeder, SeedResult};
pub use connectivity_gate::{
    ConnectivityGate, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL, DatabaseProbe, GateOutcome,
    GatePolicy,
};
pub use identity_ports::{
    AdministratorProvisioning, IdentityRepository, IdentitySummary, PasswordHasher, UserRecord,
};
pub use migration_service::{
    DEFAULT_CONTENDED_ATTEMPTS, DEFAULT_CONTENDED_PAUSE, MigrationFailure, MigrationReport,
    MigrationRepository, MigrationService, MigrationUnitInfo,
};
