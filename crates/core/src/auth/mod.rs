//! Roles, actors, and capability checks.
//!
//! Authentication happens outside this crate. The engine receives an
//! [`Actor`] that the auth layer has already verified and trusts its id and
//! role as given.

use quetzal_shared::types::UserId;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// User roles recognised by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Back-office administrator.
    #[serde(rename = "ADMIN_ROLE")]
    Admin,
    /// Account holder.
    #[serde(rename = "CLIENT_ROLE")]
    Client,
    /// Back-office supervisor.
    #[serde(rename = "SUPERVISOR_ROLE")]
    Supervisor,
}

impl Role {
    /// Roles allowed to act on accounts they do not own.
    pub const PRIVILEGED: &'static [Self] = &[Self::Admin, Self::Supervisor];

    /// Roles allowed to move money out of their own accounts.
    pub const ACCOUNT_HOLDER: &'static [Self] = &[Self::Client];

    /// Returns true for back-office roles.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::Supervisor)
    }

    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN_ROLE",
            Self::Client => "CLIENT_ROLE",
            Self::Supervisor => "SUPERVISOR_ROLE",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN_ROLE" => Ok(Self::Admin),
            "CLIENT_ROLE" => Ok(Self::Client),
            "SUPERVISOR_ROLE" => Ok(Self::Supervisor),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The user's id.
    pub id: UserId,
    /// The user's role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Shorthand for a client actor.
    #[must_use]
    pub const fn client(id: UserId) -> Self {
        Self::new(id, Role::Client)
    }

    /// Returns true if the actor may act on resources owned by `owner`.
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        self.id == owner || self.role.is_privileged()
    }
}

/// Capability check: the actor's role must be one of `allowed`.
pub fn require_role(actor: &Actor, allowed: &[Role]) -> Result<(), LedgerError> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(format!(
            "role {} may not perform this operation",
            actor.role
        )))
    }
}

/// The actor must own the resource or hold a privileged role.
pub fn require_owner_or_privileged(actor: &Actor, owner: UserId) -> Result<(), LedgerError> {
    if actor.can_access(owner) {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(
            "resource belongs to another user".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(Role::Admin, true)]
    #[case(Role::Supervisor, true)]
    #[case(Role::Client, false)]
    fn test_privileged_roles(#[case] role: Role, #[case] privileged: bool) {
        assert_eq!(role.is_privileged(), privileged);
        let actor = Actor::new(UserId::new(), role);
        assert_eq!(require_role(&actor, Role::PRIVILEGED).is_ok(), privileged);
    }

    #[test]
    fn test_require_role_reports_forbidden() {
        let actor = Actor::client(UserId::new());
        let err = require_role(&actor, Role::PRIVILEGED).unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden(_)));
        assert!(require_role(&actor, Role::ACCOUNT_HOLDER).is_ok());
    }

    #[test]
    fn test_owner_or_privileged() {
        let owner = UserId::new();
        assert!(require_owner_or_privileged(&Actor::client(owner), owner).is_ok());
        assert!(require_owner_or_privileged(&Actor::client(UserId::new()), owner).is_err());
        assert!(
            require_owner_or_privileged(&Actor::new(UserId::new(), Role::Supervisor), owner)
                .is_ok()
        );
    }

    #[test]
    fn test_role_wire_names() {
        for role in [Role::Admin, Role::Client, Role::Supervisor] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("OWNER").is_err());
    }
}
