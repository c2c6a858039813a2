//! User service implementation.

use crate::cache::{CacheInterface, NoopCache, DEFAULT_TTL};
use crate::crud_service::{CrudService, Service};
use crate::dto::{CreateUserRequest, UserDto};
use crate::user_service::UserService;
use async_trait::async_trait;
use keystone_core::{rules, Entity, EntityId, KeystoneError, KeystoneResult, User, ValidateExt};
use keystone_repository::{Op, Repository};
use keystone_security::PasswordHasherInterface;
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use validator::ValidateEmail;

/// Status carried by the duplicate-email rule.
const EMAIL_CONFLICT_STATUS: u16 = 409;

const DEFAULT_CACHE_TTL: Option<Duration> = Some(DEFAULT_TTL);

/// User service built on the generic [`CrudService`].
///
/// Registered in the application module with its repository, hasher and
/// cache injected.
#[derive(Component)]
#[shaku(interface = UserService)]
pub struct UserServiceImpl {
    #[shaku(inject)]
    user_repository: Arc<dyn Repository<User>>,
    #[shaku(inject)]
    password_hasher: Arc<dyn PasswordHasherInterface>,
    #[shaku(inject)]
    cache: Arc<dyn CacheInterface>,
    #[shaku(default = DEFAULT_CACHE_TTL)]
    cache_ttl: Option<Duration>,
}

impl UserServiceImpl {
    /// Creates a user service without caching.
    pub fn new(
        user_repository: Arc<dyn Repository<User>>,
        password_hasher: Arc<dyn PasswordHasherInterface>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            cache: Arc::new(NoopCache),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Caches users in `cache` for `ttl`.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheInterface>, ttl: Option<Duration>) -> Self {
        self.cache = cache;
        self.cache_ttl = ttl;
        self
    }

    /// Module parameters for a service whose cache entries live for `cache_ttl`.
    #[must_use]
    pub fn parameters(cache_ttl: Option<Duration>) -> UserServiceImplParameters {
        UserServiceImplParameters { cache_ttl }
    }

    fn crud(&self) -> CrudService<User> {
        CrudService::new(Arc::clone(&self.user_repository))
            .with_cache(Arc::clone(&self.cache), self.cache_ttl)
    }

    /// Rejects the email if a live user other than `owner` already has it.
    async fn ensure_email_available(&self, email: &str, owner: Option<EntityId>) -> KeystoneResult<()> {
        let mut query = self.user_repository.query().eq_ignore_case("email", email);
        if let Some(id) = owner {
            query = query.filter("id", Op::Ne, id);
        }

        if query.count().await? > 0 {
            debug!("Rejecting duplicate email: {}", email);
            return Err(KeystoneError::business_rule_with_status(
                "Email already exists",
                EMAIL_CONFLICT_STATUS,
            ));
        }
        Ok(())
    }
}

/// Field rules every stored user satisfies, however it reaches the store.
fn check_user_fields(username: &str, email: &str) -> KeystoneResult<()> {
    rules::not_blank(username)
        .map_err(|_| KeystoneError::validation("username: Username must not be blank"))?;
    if !email.validate_email() {
        return Err(KeystoneError::validation("email: Invalid email address"));
    }
    Ok(())
}

#[async_trait]
impl Service<User> for UserServiceImpl {
    async fn get_by_id(&self, id: EntityId) -> KeystoneResult<Option<User>> {
        self.crud().get_by_id(id).await
    }

    async fn get_all(&self) -> KeystoneResult<Vec<User>> {
        self.crud().get_all().await
    }

    async fn create(&self, entity: User) -> KeystoneResult<User> {
        check_user_fields(&entity.username, &entity.email)?;
        self.ensure_email_available(&entity.email, None).await?;
        self.crud().create(entity).await
    }

    async fn update(&self, entity: User) -> KeystoneResult<()> {
        check_user_fields(&entity.username, &entity.email)?;
        self.ensure_email_available(&entity.email, Some(entity.id()))
            .await?;
        self.crud().update(entity).await
    }

    async fn delete(&self, id: EntityId) -> KeystoneResult<()> {
        self.crud().delete(id).await?;
        info!("User deleted: {}", id);
        Ok(())
    }

    async fn exists(&self, id: EntityId) -> KeystoneResult<bool> {
        self.crud().exists(id).await
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create_user(&self, request: CreateUserRequest) -> KeystoneResult<UserDto> {
        debug!("Creating user: {}", request.username);

        request.validate_request()?;
        check_user_fields(&request.username, &request.email)?;

        self.ensure_email_available(&request.email, None).await?;

        let password_hash = self.password_hasher.hash(&request.password)?;
        let user = User::new(request.username, request.email, password_hash);

        let saved = self.crud().create(user).await?;

        info!("User created: {}", saved.record.id);
        Ok(UserDto::from(saved))
    }

    async fn get_user_by_email(&self, email: &str) -> KeystoneResult<Option<UserDto>> {
        let user = self
            .user_repository
            .query()
            .eq_ignore_case("email", email)
            .fetch_optional()
            .await?;

        Ok(user.map(UserDto::from))
    }

    async fn is_email_unique(&self, email: &str) -> KeystoneResult<bool> {
        let matches = self
            .user_repository
            .query()
            .eq_ignore_case("email", email)
            .count()
            .await?;

        Ok(matches == 0)
    }
}

impl std::fmt::Debug for UserServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserServiceImpl")
            .field("cache_enabled", &self.cache.is_enabled())
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{cache_keys, CacheExt, InMemoryCache};
    use keystone_core::Entity;
    use keystone_repository::{DeletePolicy, Filter, InMemoryRepository};
    use keystone_security::PasswordHasher;

    fn create_user_service() -> (UserServiceImpl, Arc<InMemoryRepository<User>>) {
        create_user_service_with_policy(DeletePolicy::Hard)
    }

    fn create_user_service_with_policy(
        policy: DeletePolicy,
    ) -> (UserServiceImpl, Arc<InMemoryRepository<User>>) {
        let repository = Arc::new(InMemoryRepository::<User>::with_delete_policy(policy));
        let service = UserServiceImpl::new(
            repository.clone() as Arc<dyn Repository<User>>,
            Arc::new(PasswordHasher::fast()),
        );
        (service, repository)
    }

    fn request(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "Password123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let (service, _) = create_user_service();

        let user = service.create_user(request("alice", "alice@x.com")).await.unwrap();

        assert_eq!(user.id, EntityId::new(1));
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@x.com");
        assert!(!user.is_active);
        assert!(user.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let (service, repository) = create_user_service();

        let dto = service.create_user(request("alice", "alice@x.com")).await.unwrap();
        let stored = repository.get_by_id(dto.id).await.unwrap().unwrap();

        assert_ne!(stored.password_hash, "Password123");
        assert!(PasswordHasher::fast()
            .verify("Password123", &stored.password_hash)
            .unwrap());
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let (service, repository) = create_user_service();
        service.create_user(request("alice", "alice@x.com")).await.unwrap();

        let err = service
            .create_user(request("alice2", "ALICE@x.com"))
            .await
            .unwrap_err();

        match err {
            KeystoneError::BusinessRule { message, status } => {
                assert_eq!(message, "Email already exists");
                assert_eq!(status, 409);
            }
            other => panic!("Expected BusinessRule error, got {other:?}"),
        }
        assert_eq!(repository.stored_rows(), 1);
    }

    #[tokio::test]
    async fn test_raw_create_enforces_email_rule() {
        let (service, _) = create_user_service();
        service.create_user(request("alice", "alice@x.com")).await.unwrap();

        let err = service
            .create(User::new("other", "alice@x.com", "hash"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_raw_create_applies_field_rules() {
        let (service, repository) = create_user_service();

        let blank = service.create(User::new("  ", "blank@x.com", "hash")).await;
        assert!(matches!(blank, Err(KeystoneError::Validation(_))));

        let malformed = service.create(User::new("bob", "x", "hash")).await;
        assert!(matches!(malformed, Err(KeystoneError::Validation(_))));

        assert_eq!(repository.stored_rows(), 0);
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_rejected() {
        let (service, _) = create_user_service();
        service.create_user(request("alice", "alice@x.com")).await.unwrap();
        let bob = service.create_user(request("bob", "bob@x.com")).await.unwrap();

        let mut changed = service.get_by_id(bob.id).await.unwrap().unwrap();
        changed.email = "Alice@X.com".to_string();
        let err = service.update(changed).await.unwrap_err();

        match err {
            KeystoneError::BusinessRule { message, status } => {
                assert_eq!(message, "Email already exists");
                assert_eq!(status, 409);
            }
            other => panic!("Expected BusinessRule error, got {other:?}"),
        }
        let owners = service
            .user_repository
            .find(Filter::new().eq_ignore_case("email", "alice@x.com"))
            .await
            .unwrap();
        assert_eq!(owners.len(), 1);
        let unchanged = service.get_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(unchanged.email, "bob@x.com");
    }

    #[tokio::test]
    async fn test_update_keeping_own_email_is_allowed() {
        let (service, _) = create_user_service();
        let alice = service.create_user(request("alice", "alice@x.com")).await.unwrap();

        let mut changed = service.get_by_id(alice.id).await.unwrap().unwrap();
        changed.username = "alice2".to_string();
        changed.email = "ALICE@x.com".to_string();
        service.update(changed).await.unwrap();

        let reloaded = service.get_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(reloaded.username, "alice2");
        assert_eq!(reloaded.email, "ALICE@x.com");
    }

    #[tokio::test]
    async fn test_update_with_malformed_email_is_rejected() {
        let (service, _) = create_user_service();
        let alice = service.create_user(request("alice", "alice@x.com")).await.unwrap();

        let mut changed = service.get_by_id(alice.id).await.unwrap().unwrap();
        changed.email = "nope".to_string();

        assert!(matches!(
            service.update(changed).await,
            Err(KeystoneError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_user_invalid_email() {
        let (service, repository) = create_user_service();

        let err = service
            .create_user(request("alice", "not-an-email"))
            .await
            .unwrap_err();

        assert!(matches!(err, KeystoneError::Validation(_)));
        assert_eq!(repository.stored_rows(), 0);
    }

    #[tokio::test]
    async fn test_create_user_blank_username() {
        let (service, _) = create_user_service();

        let err = service
            .create_user(request("   ", "alice@x.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, KeystoneError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_user_by_email_ignores_case() {
        let (service, _) = create_user_service();
        let created = service.create_user(request("alice", "Alice@X.com")).await.unwrap();

        let found = service.get_user_by_email("alice@x.com").await.unwrap();
        assert_eq!(found, Some(created));

        assert_eq!(service.get_user_by_email("bob@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_is_email_unique() {
        let (service, _) = create_user_service();
        assert!(service.is_email_unique("alice@x.com").await.unwrap());

        service.create_user(request("alice", "alice@x.com")).await.unwrap();
        assert!(!service.is_email_unique("alice@x.com").await.unwrap());
        assert!(!service.is_email_unique("ALICE@X.COM").await.unwrap());
    }

    #[tokio::test]
    async fn test_soft_deleted_email_can_be_reused() {
        let (service, _) = create_user_service_with_policy(DeletePolicy::Soft);
        let first = service.create_user(request("alice", "alice@x.com")).await.unwrap();

        service.delete(first.id).await.unwrap();

        assert!(!service.exists(first.id).await.unwrap());
        assert!(service.is_email_unique("alice@x.com").await.unwrap());
        let second = service.create_user(request("alice", "alice@x.com")).await.unwrap();
        assert_ne!(second.id, first.id);
    }

    #[tokio::test]
    async fn test_update_and_read_back() {
        let (service, _) = create_user_service();
        let dto = service.create_user(request("alice", "alice@x.com")).await.unwrap();

        let mut user = service.get_by_id(dto.id).await.unwrap().unwrap();
        user.activate();
        service.update(user).await.unwrap();

        let reloaded = service.get_by_id(dto.id).await.unwrap().unwrap();
        assert!(reloaded.is_active);
        assert!(reloaded.record.updated_at.is_some());
        assert_eq!(reloaded.record.created_at, dto.created_at);
    }

    #[tokio::test]
    async fn test_cached_user_is_evicted_on_delete() {
        let repository = Arc::new(InMemoryRepository::<User>::new());
        let cache = Arc::new(InMemoryCache::new());
        let service = UserServiceImpl::new(repository, Arc::new(PasswordHasher::fast()))
            .with_cache(cache.clone(), Some(Duration::from_secs(60)));

        let dto = service.create_user(request("alice", "alice@x.com")).await.unwrap();
        let key = cache_keys::entity_by_id::<User>(dto.id);
        let cached = cache.get::<User>(&key).await.unwrap();
        assert_eq!(cached.id(), dto.id);

        service.delete(dto.id).await.unwrap();
        assert!(!cache.exists(&key).await);
        assert_eq!(service.get_by_id(dto.id).await.unwrap(), None);
    }
}
