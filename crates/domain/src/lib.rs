//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod identity;
mod migration;
mod seed;

pub use identity::{PageDefinition, PermissionDefinition, RoleId, UserId};
pub use migration::MigrationVersion;
pub use seed::{AdministratorSeed, IdentitySeed, RoleSeed};
