//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod postgres_connection_probe;
mod postgres_identity_repository;
mod postgres_migration_repository;

#[cfg(test)]
mod test_support;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use postgres_connection_probe::PostgresConnectionProbe;
pub use postgres_identity_repository::PostgresIdentityRepository;
pub use postgres_migration_repository::PostgresMigrationRepository;
