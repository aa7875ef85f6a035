//! Identity persistence and password hashing ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mantia_core::AppResult;
use mantia_domain::{IdentitySeed, RoleId, UserId};

/// User row returned by repository queries.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Salted one-way password hash.
    pub password_hash: String,
    /// Display name.
    pub full_name: Option<String>,
    /// Whether the account is enabled.
    pub active: bool,
    /// Whether the account bypasses role checks.
    pub is_admin: bool,
    /// Assigned role, if any.
    pub role_id: Option<RoleId>,
    /// Whether the password must be rotated on next login.
    pub must_change_password: bool,
    /// Consecutive failed logins, owned by the authentication service.
    pub failed_attempts: i32,
    /// Lock expiry, owned by the authentication service.
    pub locked_until: Option<DateTime<Utc>>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Last password change.
    pub password_changed_at: Option<DateTime<Utc>>,
}

/// Outcome of provisioning the default administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdministratorProvisioning {
    /// The administrator row was inserted.
    Created {
        /// New user identifier.
        user_id: UserId,
        /// Role referenced by the new user.
        role_id: RoleId,
    },
    /// A row with the reserved username already exists. Nothing was changed.
    AlreadyExists,
}

/// Row counts reported after seeding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentitySummary {
    /// Number of users.
    pub users: i64,
    /// Number of roles.
    pub roles: i64,
    /// Number of permissions.
    pub permissions: i64,
    /// Number of pages.
    pub pages: i64,
}

/// Repository port for identity bootstrap persistence.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Finds a user by exact username.
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRecord>>;

    /// Inserts the seed role, permissions, pages and role grants that are
    /// still missing, in one transaction, and returns the seed role id.
    ///
    /// Existing rows are never overwritten. Rows inserted concurrently by
    /// another writer count as present.
    async fn ensure_reference_data(&self, seed: &IdentitySeed) -> AppResult<RoleId>;

    /// Creates the administrator with the given role plus the
    /// administrator's page grants, atomically.
    ///
    /// A username already taken, including by a concurrent writer, yields
    /// `AlreadyExists` and leaves nothing behind.
    async fn provision_administrator(
        &self,
        seed: &IdentitySeed,
        role_id: RoleId,
        password_hash: &str,
    ) -> AppResult<AdministratorProvisioning>;

    /// Counts identity rows.
    async fn summarize(&self) -> AppResult<IdentitySummary>;
}

/// Port for password hashing operations. Keeps domain/application free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password with a random salt.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}
