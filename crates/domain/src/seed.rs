//! Reserved seed values for the default identity.
//!
//! The reserved keys (administrator username and email, administrator role
//! name, catalog names and routes) must match on every environment: seeding
//! is insert-if-absent by unique key, so changing a key orphans the previous
//! row instead of updating it.

use std::collections::HashSet;
use std::fmt::{Debug, Formatter};

use mantia_core::{AppError, AppResult, NonEmptyString};

use crate::{PageDefinition, PermissionDefinition};

const RESERVED_ADMIN_USERNAME: &str = "admin";
const RESERVED_ADMIN_EMAIL: &str = "admin@mantia.com";
const RESERVED_ADMIN_FULL_NAME: &str = "Administrador del Sistema";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const RESERVED_ADMIN_ROLE_NAME: &str = "Administrador";
const RESERVED_ADMIN_ROLE_DESCRIPTION: &str = "Rol con acceso completo al sistema";

/// The administrator account created on first run.
#[derive(Clone)]
pub struct AdministratorSeed {
    /// Reserved username.
    pub username: String,
    /// Reserved email address.
    pub email: String,
    /// Display name.
    pub full_name: String,
    initial_password: String,
}

impl AdministratorSeed {
    /// Creates an administrator seed.
    #[must_use]
    pub fn new(username: &str, email: &str, full_name: &str, initial_password: &str) -> Self {
        Self {
            username: username.to_owned(),
            email: email.to_owned(),
            full_name: full_name.to_owned(),
            initial_password: initial_password.to_owned(),
        }
    }

    /// Returns the plaintext initial password. Only the password hasher may see it.
    #[must_use]
    pub fn initial_password(&self) -> &str {
        self.initial_password.as_str()
    }
}

impl Debug for AdministratorSeed {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AdministratorSeed")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("initial_password", &"<redacted>")
            .finish()
    }
}

/// The role assigned to the administrator account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSeed {
    /// Reserved role name.
    pub name: String,
    /// Fixed description.
    pub description: String,
}

/// Immutable seed configuration consumed by the bootstrap seeder.
#[derive(Debug, Clone)]
pub struct IdentitySeed {
    administrator: AdministratorSeed,
    role: RoleSeed,
    permissions: Vec<PermissionDefinition>,
    pages: Vec<PageDefinition>,
}

impl IdentitySeed {
    /// Creates a validated seed.
    pub fn new(
        administrator: AdministratorSeed,
        role: RoleSeed,
        permissions: Vec<PermissionDefinition>,
        pages: Vec<PageDefinition>,
    ) -> AppResult<Self> {
        let seed = Self {
            administrator,
            role,
            permissions,
            pages,
        };
        seed.validate()?;

        Ok(seed)
    }

    /// Returns the reserved production seed.
    #[must_use]
    pub fn reserved() -> Self {
        Self {
            administrator: AdministratorSeed::new(
                RESERVED_ADMIN_USERNAME,
                RESERVED_ADMIN_EMAIL,
                RESERVED_ADMIN_FULL_NAME,
                DEFAULT_ADMIN_PASSWORD,
            ),
            role: RoleSeed {
                name: RESERVED_ADMIN_ROLE_NAME.to_owned(),
                description: RESERVED_ADMIN_ROLE_DESCRIPTION.to_owned(),
            },
            permissions: reserved_permissions(),
            pages: reserved_pages(),
        }
    }

    /// Returns a copy with a different initial administrator password.
    ///
    /// Reserved keys are left untouched.
    pub fn with_initial_password(mut self, password: NonEmptyString) -> Self {
        self.administrator.initial_password = password.into();
        self
    }

    /// Returns the administrator account seed.
    #[must_use]
    pub fn administrator(&self) -> &AdministratorSeed {
        &self.administrator
    }

    /// Returns the administrator role seed.
    #[must_use]
    pub fn role(&self) -> &RoleSeed {
        &self.role
    }

    /// Returns the default permission catalog.
    #[must_use]
    pub fn permissions(&self) -> &[PermissionDefinition] {
        &self.permissions
    }

    /// Returns the default page catalog.
    #[must_use]
    pub fn pages(&self) -> &[PageDefinition] {
        &self.pages
    }

    /// Checks required fields and catalog key uniqueness.
    pub fn validate(&self) -> AppResult<()> {
        NonEmptyString::new(self.administrator.username.as_str())?;
        NonEmptyString::new(self.administrator.email.as_str())?;
        NonEmptyString::new(self.administrator.initial_password.as_str())?;
        NonEmptyString::new(self.role.name.as_str())?;

        if !self.administrator.email.contains('@') {
            return Err(AppError::Validation(format!(
                "administrator email '{}' must contain '@'",
                self.administrator.email
            )));
        }

        let mut permission_names = HashSet::new();
        for permission in &self.permissions {
            if !permission_names.insert(permission.name.as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate permission '{}' in seed catalog",
                    permission.name
                )));
            }
        }

        let mut page_names = HashSet::new();
        let mut page_routes = HashSet::new();
        for page in &self.pages {
            if !page_names.insert(page.name.as_str()) || !page_routes.insert(page.route.as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate page '{}' ({}) in seed catalog",
                    page.name, page.route
                )));
            }
        }

        Ok(())
    }
}

impl Default for IdentitySeed {
    fn default() -> Self {
        Self::reserved()
    }
}

fn reserved_permissions() -> Vec<PermissionDefinition> {
    [
        ("repuestos_leer", "Ver repuestos", "repuestos", "leer"),
        ("repuestos_crear", "Crear repuestos", "repuestos", "crear"),
        ("repuestos_editar", "Editar repuestos", "repuestos", "editar"),
        ("repuestos_eliminar", "Eliminar repuestos", "repuestos", "eliminar"),
        ("maquinas_leer", "Ver máquinas", "maquinas", "leer"),
        ("maquinas_crear", "Crear máquinas", "maquinas", "crear"),
        ("maquinas_editar", "Editar máquinas", "maquinas", "editar"),
        ("ordenes_trabajo_leer", "Ver órdenes de trabajo", "ordenes_trabajo", "leer"),
        ("ordenes_trabajo_crear", "Crear órdenes de trabajo", "ordenes_trabajo", "crear"),
        ("ordenes_trabajo_editar", "Editar órdenes de trabajo", "ordenes_trabajo", "editar"),
        ("ordenes_compra_leer", "Ver órdenes de compra", "ordenes_compra", "leer"),
        ("ordenes_compra_crear", "Crear órdenes de compra", "ordenes_compra", "crear"),
        ("ordenes_compra_editar", "Editar órdenes de compra", "ordenes_compra", "editar"),
        ("admin_usuarios", "Administrar usuarios", "administracion", "admin"),
        ("admin_sistema", "Administrar sistema", "administracion", "admin"),
    ]
    .into_iter()
    .map(|(name, description, resource, action)| {
        PermissionDefinition::new(name, description, resource, action)
    })
    .collect()
}

fn reserved_pages() -> Vec<PageDefinition> {
    [
        (
            "repuestos",
            "/repuestos",
            "Repuestos",
            "Gestión de inventario de repuestos",
            "Package",
            false,
        ),
        (
            "proveedores",
            "/proveedores",
            "Proveedores",
            "Administrar proveedores y contactos",
            "Users",
            false,
        ),
        (
            "ordenes_compra",
            "/ordenes-compra",
            "Órdenes de Compra",
            "Gestión de pedidos de repuestos",
            "ShoppingCart",
            false,
        ),
        (
            "maquinas",
            "/maquinas",
            "Máquinas",
            "Gestión de máquinas y equipos",
            "Cpu",
            false,
        ),
        (
            "modelos_maquinas",
            "/modelos-maquinas",
            "Modelos",
            "Gestión de modelos de máquinas",
            "Settings",
            false,
        ),
        (
            "plan_mantenimiento",
            "/plan-mantenimiento",
            "Plan de Mantenimiento",
            "Planificación de mantenimientos preventivos",
            "Calendar",
            false,
        ),
        (
            "ordenes_trabajo",
            "/ordenes-trabajo",
            "Generar OT",
            "Gestión de órdenes de trabajo",
            "Wrench",
            false,
        ),
        (
            "mis_ordenes_trabajo",
            "/mis-ordenes-trabajo",
            "OTs Asignadas",
            "Órdenes de trabajo asignadas al usuario",
            "ClipboardList",
            false,
        ),
        (
            "analytics_ia",
            "/analytics-ia",
            "Analytics IA",
            "Análisis predictivo con inteligencia artificial",
            "Brain",
            false,
        ),
        (
            "dashboard_metricas",
            "/dashboard-metricas",
            "Dashboard Métricas",
            "Métricas y KPIs del sistema",
            "BarChart3",
            false,
        ),
        (
            "historial",
            "/historial",
            "Historial de Consumo",
            "Historial de consumo de repuestos",
            "History",
            false,
        ),
        (
            "usuarios",
            "/admin/usuarios",
            "Usuarios",
            "Administración de usuarios del sistema",
            "Shield",
            true,
        ),
        (
            "admin",
            "/admin",
            "Administración",
            "Panel de administración del sistema",
            "Settings",
            true,
        ),
    ]
    .into_iter()
    .zip(1..)
    .map(
        |((name, route, title, description, icon, admin_only), order)| PageDefinition {
            name: name.to_owned(),
            route: route.to_owned(),
            title: title.to_owned(),
            description: Some(description.to_owned()),
            icon: Some(icon.to_owned()),
            order,
            admin_only,
        },
    )
    .collect()
}

#[cfg(test)]
mod tests {
    use mantia_core::NonEmptyString;
    use proptest::prelude::*;

    use super::{AdministratorSeed, IdentitySeed, RoleSeed};
    use crate::{PageDefinition, PermissionDefinition};

    fn page(name: &str, route: &str) -> PageDefinition {
        PageDefinition {
            name: name.to_owned(),
            route: route.to_owned(),
            title: name.to_owned(),
            description: None,
            icon: None,
            order: 1,
            admin_only: false,
        }
    }

    fn role() -> RoleSeed {
        RoleSeed {
            name: "Tester".to_owned(),
            description: "test role".to_owned(),
        }
    }

    #[test]
    fn reserved_seed_is_valid() {
        let seed = IdentitySeed::reserved();
        assert!(seed.validate().is_ok());
        assert_eq!(seed.administrator().username, "admin");
        assert_eq!(seed.role().name, "Administrador");
        assert_eq!(seed.permissions().len(), 15);
        assert_eq!(seed.pages().len(), 13);
    }

    #[test]
    fn reserved_pages_are_ordered_from_one() {
        let seed = IdentitySeed::reserved();
        let orders: Vec<i32> = seed.pages().iter().map(|page| page.order).collect();
        assert_eq!(orders, (1..=13).collect::<Vec<_>>());
        assert!(
            seed.pages()
                .iter()
                .filter(|page| page.admin_only)
                .all(|page| page.route.starts_with("/admin"))
        );
    }

    #[test]
    fn debug_output_redacts_initial_password() {
        let seed = IdentitySeed::reserved();
        let rendered = format!("{seed:?}");
        assert!(!rendered.contains("admin123"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn password_override_keeps_reserved_keys() {
        let password = NonEmptyString::new("rotate-me-now");
        assert!(password.is_ok());
        let seed = IdentitySeed::reserved()
            .with_initial_password(password.unwrap_or_else(|_| unreachable!()));

        assert_eq!(seed.administrator().initial_password(), "rotate-me-now");
        assert_eq!(seed.administrator().username, "admin");
        assert_eq!(seed.administrator().email, "admin@mantia.com");
    }

    #[test]
    fn duplicate_page_route_is_rejected() {
        let result = IdentitySeed::new(
            AdministratorSeed::new("root", "root@example.com", "Root", "secret"),
            role(),
            Vec::new(),
            vec![page("first", "/same"), page("second", "/same")],
        );
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_permission_is_rejected() {
        let permission = PermissionDefinition::new("parts_read", "Read parts", "parts", "read");
        let result = IdentitySeed::new(
            AdministratorSeed::new("root", "root@example.com", "Root", "secret"),
            role(),
            vec![permission.clone(), permission],
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn blank_username_and_malformed_email_are_rejected() {
        let blank_username = IdentitySeed::new(
            AdministratorSeed::new("  ", "root@example.com", "Root", "secret"),
            role(),
            Vec::new(),
            Vec::new(),
        );
        assert!(blank_username.is_err());

        let malformed_email = IdentitySeed::new(
            AdministratorSeed::new("root", "example.com", "Root", "secret"),
            role(),
            Vec::new(),
            Vec::new(),
        );
        assert!(malformed_email.is_err());
    }

    proptest! {
        #[test]
        fn any_repeated_permission_name_is_rejected(
            names in proptest::collection::hash_set("[a-z_]{1,24}", 1..24),
            pick in any::<proptest::sample::Index>()
        ) {
            let mut permissions: Vec<PermissionDefinition> = names
                .iter()
                .map(|name| PermissionDefinition::new(name, name, "recurso", "leer"))
                .collect();
            let administrator =
                AdministratorSeed::new("root", "root@example.com", "Root", "secret");

            let unique = IdentitySeed::new(
                administrator.clone(),
                role(),
                permissions.clone(),
                Vec::new(),
            );
            prop_assert!(unique.is_ok());

            let repeated = permissions[pick.index(permissions.len())].clone();
            permissions.push(repeated);
            let duplicated = IdentitySeed::new(administrator, role(), permissions, Vec::new());
            prop_assert!(duplicated.is_err());
        }
    }
}
