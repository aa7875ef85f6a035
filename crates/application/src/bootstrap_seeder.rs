//! Default identity seeding.
//!
//! Fills in whatever part of the default authorization catalog is missing on
//! every run, then creates the administrator account exactly once. An
//! existing administrator is never modified: the credential rotation flag,
//! lockout counters, and role assignment belong to the running application
//! after first boot.

use std::sync::Arc;

use tracing::{debug, info, warn};

use mantia_core::AppResult;
use mantia_domain::{IdentitySeed, RoleId};

use crate::{AdministratorProvisioning, IdentityRepository, PasswordHasher};

/// Outcome of [`BootstrapSeeder::ensure_default_identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct SeedResult {
    /// Whether this run inserted the administrator.
    pub created: bool,
}

/// Application service that seeds the default identity.
#[derive(Clone)]
pub struct BootstrapSeeder {
    repository: Arc<dyn IdentityRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    seed: IdentitySeed,
}

impl BootstrapSeeder {
    /// Creates a seeder for the given seed values.
    #[must_use]
    pub fn new(
        repository: Arc<dyn IdentityRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        seed: IdentitySeed,
    ) -> Self {
        Self {
            repository,
            password_hasher,
            seed,
        }
    }

    /// Ensures the default administrator and authorization data exist.
    pub async fn ensure_default_identity(&self) -> AppResult<SeedResult> {
        self.seed.validate()?;
        let administrator = self.seed.administrator();

        let role_id = self.repository.ensure_reference_data(&self.seed).await?;
        debug!(%role_id, role = %self.seed.role().name, "reference data present");

        let existing = self
            .repository
            .find_user_by_username(administrator.username.as_str())
            .await?;

        let result = match existing {
            Some(_) => {
                info!(
                    username = %administrator.username,
                    "default administrator already exists"
                );
                SeedResult { created: false }
            }
            None => self.create_administrator(role_id).await?,
        };

        match self.repository.summarize().await {
            Ok(summary) => info!(
                users = summary.users,
                roles = summary.roles,
                permissions = summary.permissions,
                pages = summary.pages,
                "identity bootstrap summary"
            ),
            Err(error) => warn!(error = %error, "failed to summarize identity tables"),
        }

        Ok(result)
    }

    async fn create_administrator(&self, role_id: RoleId) -> AppResult<SeedResult> {
        let administrator = self.seed.administrator();
        let password_hash = self
            .password_hasher
            .hash_password(administrator.initial_password())?;

        let result = match self
            .repository
            .provision_administrator(&self.seed, role_id, password_hash.as_str())
            .await?
        {
            AdministratorProvisioning::Created { user_id, role_id } => {
                info!(
                    username = %administrator.username,
                    %user_id,
                    %role_id,
                    role = %self.seed.role().name,
                    "default administrator created"
                );
                warn!(
                    username = %administrator.username,
                    "default administrator uses the initial credential, change it on first login"
                );
                SeedResult { created: true }
            }
            AdministratorProvisioning::AlreadyExists => {
                info!(
                    username = %administrator.username,
                    "default administrator was created concurrently"
                );
                SeedResult { created: false }
            }
        };

        Ok(result)
    }
}
