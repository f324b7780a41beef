//! Role-based access control
//!
//! A [`RolePolicy`] names the roles allowed to invoke an operation. One
//! policy exists per tier; routes pick the tier they need.

use uuid::Uuid;

use crate::models::{User, UserRole};

use super::AuthError;

/// Set of roles permitted to invoke an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePolicy {
    allowed: &'static [UserRole],
}

impl RolePolicy {
    pub const ADMIN_ONLY: RolePolicy = RolePolicy {
        allowed: &[UserRole::Admin],
    };

    pub const SELLER_OR_ADMIN: RolePolicy = RolePolicy {
        allowed: &[UserRole::Seller, UserRole::Admin],
    };

    pub const ANY_ROLE: RolePolicy = RolePolicy {
        allowed: &[UserRole::Buyer, UserRole::Seller, UserRole::Admin],
    };

    pub const fn new(allowed: &'static [UserRole]) -> Self {
        Self { allowed }
    }

    pub fn allows(&self, role: UserRole) -> bool {
        self.allowed.contains(&role)
    }

    /// Pass the principal through when its role is in the policy
    pub fn authorize(&self, user: User) -> Result<User, AuthError> {
        authorize(user, self.allowed)
    }
}

/// Membership test of the principal's role against `allowed`
pub fn authorize(user: User, allowed: &[UserRole]) -> Result<User, AuthError> {
    if allowed.contains(&user.role) {
        Ok(user)
    } else {
        tracing::debug!(username = %user.username, role = %user.role, "Role not permitted");
        Err(AuthError::Forbidden)
    }
}

/// Owners may act on their own resources; admins on any
pub fn require_owner_or_admin(user: &User, owner_id: Uuid) -> Result<(), AuthError> {
    if user.id == owner_id || user.role == UserRole::Admin {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            username: format!("{}-user", role),
            email: format!("{}@example.com", role),
            phone_number: "+15550100".to_string(),
            role,
            password_hash: String::new(),
            created_at: Utc::now(),
            refresh_token: None,
            refresh_token_expires_at: None,
        }
    }

    #[test]
    fn test_role_tiers() {
        // Admin passes every tier
        let admin = user_with_role(UserRole::Admin);
        assert!(RolePolicy::ADMIN_ONLY.authorize(admin.clone()).is_ok());
        assert!(RolePolicy::SELLER_OR_ADMIN.authorize(admin.clone()).is_ok());
        assert!(RolePolicy::ANY_ROLE.authorize(admin).is_ok());

        let seller = user_with_role(UserRole::Seller);
        assert!(matches!(
            RolePolicy::ADMIN_ONLY.authorize(seller.clone()),
            Err(AuthError::Forbidden)
        ));
        assert!(RolePolicy::SELLER_OR_ADMIN.authorize(seller.clone()).is_ok());
        assert!(RolePolicy::ANY_ROLE.authorize(seller).is_ok());

        let buyer = user_with_role(UserRole::Buyer);
        assert!(matches!(
            RolePolicy::ADMIN_ONLY.authorize(buyer.clone()),
            Err(AuthError::Forbidden)
        ));
        assert!(matches!(
            RolePolicy::SELLER_OR_ADMIN.authorize(buyer.clone()),
            Err(AuthError::Forbidden)
        ));
        assert!(RolePolicy::ANY_ROLE.authorize(buyer).is_ok());
    }

    #[test]
    fn test_authorize_with_ad_hoc_role_set() {
        let buyer = user_with_role(UserRole::Buyer);
        assert!(authorize(buyer.clone(), &[UserRole::Buyer]).is_ok());
        assert!(authorize(buyer, &[]).is_err());
    }

    #[test]
    fn test_custom_policy() {
        const BUYER_ONLY: RolePolicy = RolePolicy::new(&[UserRole::Buyer]);
        assert!(BUYER_ONLY.allows(UserRole::Buyer));
        assert!(!BUYER_ONLY.allows(UserRole::Admin));
    }

    #[test]
    fn test_owner_or_admin() {
        let owner = user_with_role(UserRole::Seller);
        let other = user_with_role(UserRole::Seller);
        let admin = user_with_role(UserRole::Admin);

        assert!(require_owner_or_admin(&owner, owner.id).is_ok());
        assert!(require_owner_or_admin(&admin, owner.id).is_ok());
        assert!(matches!(
            require_owner_or_admin(&other, owner.id),
            Err(AuthError::Forbidden)
        ));
    }
}
