use uuid::Uuid;

use crate::domain::user::{normalize_email, Actor, AdminUserUpdate, NewUser, ProfileUpdate, User};
use crate::repository::errors::RepositoryError;
use crate::usecase::contracts::UserRepository;
use crate::usecase::error::UsecaseError;
use crate::usecase::jwt::JwtService;
use crate::usecase::password::{hash_password, verify_password};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const PLEASE_AUTHENTICATE: &str = "Please authenticate.";

pub struct AuthSession {
    pub user: User,
    pub token: String,
}

pub struct AuthUseCase<U>
where
    U: UserRepository,
{
    user_repository: U,
    jwt_service: JwtService,
}

impl<U> AuthUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repository: U, jwt_service: JwtService) -> Self {
        Self {
            user_repository,
            jwt_service,
        }
    }

    #[tracing::instrument(skip(self, new_user, password), fields(email = %new_user.email))]
    pub async fn register(&self, new_user: NewUser, password: String) -> Result<AuthSession, UsecaseError> {
        tracing::debug!("registering user");

        self.ensure_email_free(&new_user.email, None).await?;

        let password_hash =
            hash_password(&password).map_err(|e| UsecaseError::Internal(e.to_string()))?;
        let user = User::new(new_user, password_hash);
        self.user_repository.create(&user).await?;

        let token = self.issue_token(&user)?;
        metrics::counter!("rental_registrations_total").increment(1);

        tracing::info!(user_id = %user.id, "user registered");
        Ok(AuthSession { user, token })
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, UsecaseError> {
        tracing::debug!("logging in");

        let user = self
            .user_repository
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| UsecaseError::Unauthenticated(INVALID_CREDENTIALS.to_string()))?;

        let matches = verify_password(password, &user.password_hash)
            .map_err(|e| UsecaseError::Internal(e.to_string()))?;
        if !matches {
            tracing::warn!(user_id = %user.id, "wrong password");
            return Err(UsecaseError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.issue_token(&user)?;
        metrics::counter!("rental_logins_total").increment(1);

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(AuthSession { user, token })
    }

    /// Resolves a bearer token into the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, UsecaseError> {
        let claims = self.jwt_service.validate_token(token).map_err(|e| {
            tracing::warn!(error = %e, "invalid token");
            UsecaseError::Unauthenticated(PLEASE_AUTHENTICATE.to_string())
        })?;
        let user_id = claims
            .user_id()
            .map_err(|_| UsecaseError::Unauthenticated(PLEASE_AUTHENTICATE.to_string()))?;

        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(%user_id, "token for unknown user");
                UsecaseError::Unauthenticated(PLEASE_AUTHENTICATE.to_string())
            })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<User, UsecaseError> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("User".to_string()))
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User, UsecaseError> {
        tracing::debug!("updating profile");

        let mut user = self.get_profile(user_id).await?;
        if let Some(email) = &update.email {
            self.ensure_email_free(email, Some(user_id)).await?;
        }

        user.update_profile(update);
        self.user_repository.update(&user).await?;

        tracing::debug!(%user_id, "profile updated");
        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn list_users(&self, actor: &Actor) -> Result<Vec<User>, UsecaseError> {
        require_admin(actor)?;

        let users = self.user_repository.find_all().await?;

        tracing::debug!(count = users.len(), "users listed");
        Ok(users)
    }

    #[tracing::instrument(skip(self, update), fields(actor_id = %actor.id))]
    pub async fn update_user(
        &self,
        actor: &Actor,
        user_id: Uuid,
        update: AdminUserUpdate,
    ) -> Result<User, UsecaseError> {
        require_admin(actor)?;

        if update.role.is_some() && user_id == actor.id {
            tracing::warn!("admin attempted to change own role");
            return Err(UsecaseError::Validation("Cannot change your own role".to_string()));
        }

        let mut user = self.get_profile(user_id).await?;
        if let Some(email) = &update.email {
            self.ensure_email_free(email, Some(user_id)).await?;
        }

        user.apply_admin_update(update);
        self.user_repository.update(&user).await?;

        tracing::info!(%user_id, role = user.role.as_str(), "user updated by admin");
        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete_user(&self, actor: &Actor, user_id: Uuid) -> Result<(), UsecaseError> {
        require_admin(actor)?;

        self.user_repository.delete(user_id).await.map_err(|e| match e {
            RepositoryError::NotFound => UsecaseError::NotFound("User".to_string()),
            other => other.into(),
        })?;

        tracing::info!(%user_id, "user deleted");
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> Result<(), UsecaseError> {
        let existing = self.user_repository.find_by_email(&normalize_email(email)).await?;
        match existing {
            Some(user) if Some(user.id) != owner => {
                Err(UsecaseError::Validation("Email is already registered".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn issue_token(&self, user: &User) -> Result<String, UsecaseError> {
        self.jwt_service
            .generate_token(user.id, &user.email)
            .map_err(|e| UsecaseError::Internal(e.to_string()))
    }
}

pub(crate) fn require_admin(actor: &Actor) -> Result<(), UsecaseError> {
    if !actor.is_admin() {
        tracing::warn!(actor_id = %actor.id, "non-admin access attempt to admin operation");
        return Err(UsecaseError::access_denied());
    }
    Ok(())
}
