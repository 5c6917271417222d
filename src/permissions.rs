use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::types::{UserId, UserType};

/// permission names as stored in profile grants, e.g. `applications.approve`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "applications.create")]
    ApplicationsCreate,
    #[serde(rename = "applications.read")]
    ApplicationsRead,
    #[serde(rename = "applications.update")]
    ApplicationsUpdate,
    #[serde(rename = "applications.approve")]
    ApplicationsApprove,
    #[serde(rename = "applications.reject")]
    ApplicationsReject,
    #[serde(rename = "accounts.create")]
    AccountsCreate,
    #[serde(rename = "accounts.read")]
    AccountsRead,
    #[serde(rename = "accounts.update")]
    AccountsUpdate,
    #[serde(rename = "payments.create")]
    PaymentsCreate,
    #[serde(rename = "payments.read")]
    PaymentsRead,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::ApplicationsCreate,
        Permission::ApplicationsRead,
        Permission::ApplicationsUpdate,
        Permission::ApplicationsApprove,
        Permission::ApplicationsReject,
        Permission::AccountsCreate,
        Permission::AccountsRead,
        Permission::AccountsUpdate,
        Permission::PaymentsCreate,
        Permission::PaymentsRead,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Permission::ApplicationsCreate => "applications.create",
            Permission::ApplicationsRead => "applications.read",
            Permission::ApplicationsUpdate => "applications.update",
            Permission::ApplicationsApprove => "applications.approve",
            Permission::ApplicationsReject => "applications.reject",
            Permission::AccountsCreate => "accounts.create",
            Permission::AccountsRead => "accounts.read",
            Permission::AccountsUpdate => "accounts.update",
            Permission::PaymentsCreate => "payments.create",
            Permission::PaymentsRead => "payments.read",
        }
    }

    /// grants of the built-in profile for each user type
    pub fn defaults_for(user_type: UserType) -> BTreeSet<Permission> {
        use Permission::*;

        let grants: &[Permission] = match user_type {
            UserType::Admin => &Permission::ALL,
            UserType::FinancialInstitution => &[
                ApplicationsRead,
                ApplicationsApprove,
                ApplicationsReject,
                AccountsCreate,
                AccountsRead,
                AccountsUpdate,
                PaymentsRead,
            ],
            UserType::Farmer => &[ApplicationsCreate, ApplicationsRead, AccountsRead, PaymentsRead],
            UserType::Company | UserType::Cooperative => &[
                ApplicationsCreate,
                ApplicationsRead,
                ApplicationsUpdate,
                AccountsRead,
                PaymentsCreate,
                PaymentsRead,
            ],
        };

        grants.iter().copied().collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// the user performing an operation, as resolved by the authentication layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub user_type: UserType,
    pub permissions: BTreeSet<Permission>,
}

impl Actor {
    /// actor holding the default profile of its user type
    pub fn new(id: UserId, user_type: UserType) -> Self {
        Self {
            id,
            user_type,
            permissions: Permission::defaults_for(user_type),
        }
    }

    /// actor with an explicit, possibly customised, profile
    pub fn with_permissions(
        id: UserId,
        user_type: UserType,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            id,
            user_type,
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn institution(id: UserId) -> Self {
        Actor::new(id, UserType::FinancialInstitution)
    }

    pub fn admin(id: UserId) -> Self {
        Actor::new(id, UserType::Admin)
    }

    pub fn farmer(id: UserId) -> Self {
        Actor::new(id, UserType::Farmer)
    }

    /// admins pass every check regardless of profile
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.user_type == UserType::Admin || self.permissions.contains(&permission)
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }

    /// institutions and admins may claim applications for review
    pub fn can_review(&self) -> bool {
        matches!(self.user_type, UserType::FinancialInstitution | UserType::Admin)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_type, self.id)
    }
}
