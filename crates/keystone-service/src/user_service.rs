//! User service trait definition.

use crate::crud_service::Service;
use crate::dto::{CreateUserRequest, UserDto};
use async_trait::async_trait;
use keystone_core::{Interface, KeystoneResult, User};

/// User service trait.
///
/// Extends the generic [`Service`] with the rules specific to users: the
/// email address is unique among live users, ignoring case.
#[async_trait]
pub trait UserService: Interface + Service<User> {
    /// Validates the request, enforces email uniqueness, hashes the password
    /// and stores the new user.
    async fn create_user(&self, request: CreateUserRequest) -> KeystoneResult<UserDto>;

    /// Finds a user by email, ignoring case.
    async fn get_user_by_email(&self, email: &str) -> KeystoneResult<Option<UserDto>>;

    /// Returns true if no live user has this email.
    async fn is_email_unique(&self, email: &str) -> KeystoneResult<bool>;
}
