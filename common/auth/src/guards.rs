use tracing::warn;

use crate::error::{AuthError, AuthResult};
use crate::roles::Role;
use crate::verifier::AuthenticatedUser;

/// Capabilities the gate inspects.
pub trait Principal {
    fn name(&self) -> &str;
    fn is_active(&self) -> bool;
    fn role(&self) -> Option<Role>;

    fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }
}

impl Principal for AuthenticatedUser {
    fn name(&self) -> &str {
        &self.username
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn role(&self) -> Option<Role> {
        self.role
    }
}

pub fn require_active<P: Principal + ?Sized>(principal: &P) -> AuthResult<()> {
    if principal.is_active() {
        Ok(())
    } else {
        warn!(username = principal.name(), "inactive account rejected");
        Err(AuthError::AccountDisabled)
    }
}

pub fn require_admin<P: Principal + ?Sized>(principal: &P) -> AuthResult<()> {
    match principal.role() {
        Some(Role::Admin) => Ok(()),
        Some(Role::Requester) | None => {
            warn!(username = principal.name(), role = ?principal.role(), "admin_check_failed");
            Err(AuthError::InsufficientRole)
        }
    }
}

pub fn require_admin_or_requester<P: Principal + ?Sized>(principal: &P) -> AuthResult<()> {
    match principal.role() {
        Some(Role::Admin) | Some(Role::Requester) => Ok(()),
        None => {
            warn!(username = principal.name(), "role_check_failed");
            Err(AuthError::InsufficientRole)
        }
    }
}

/// Route-level policy evaluated by [`crate::Authorized`] on every request.
pub trait AccessPolicy {
    fn check<P: Principal + ?Sized>(principal: &P) -> AuthResult<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct ActiveOnly;

#[derive(Debug, Clone, Copy)]
pub struct AdminOnly;

#[derive(Debug, Clone, Copy)]
pub struct AdminOrRequester;

impl AccessPolicy for ActiveOnly {
    fn check<P: Principal + ?Sized>(principal: &P) -> AuthResult<()> {
        require_active(principal)
    }
}

impl AccessPolicy for AdminOnly {
    fn check<P: Principal + ?Sized>(principal: &P) -> AuthResult<()> {
        require_active(principal)?;
        require_admin(principal)
    }
}

impl AccessPolicy for AdminOrRequester {
    fn check<P: Principal + ?Sized>(principal: &P) -> AuthResult<()> {
        require_active(principal)?;
        require_admin_or_requester(principal)
    }
}
