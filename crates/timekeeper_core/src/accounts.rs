//! crates/timekeeper_core/src/accounts.rs
//!
//! Registration, login and "who am I". Token issuance is left to the caller;
//! this module only decides who the user is.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, CredentialHasher, DatabaseService, StoreTx};
use crate::validation::{check_email, check_full_name, check_password};
use crate::viewer::Viewer;

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Fields needed to create a user, already validated.
pub(crate) struct UserDraft {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
}

/// Lower-cases an email after checking its shape.
pub(crate) fn normalize_email(email: &str) -> CoreResult<String> {
    let email = email.trim().to_lowercase();
    check_email(&email)?;
    Ok(email)
}

pub(crate) async fn ensure_email_free(
    tx: &mut dyn StoreTx,
    email: &str,
    exclude: Option<Uuid>,
) -> CoreResult<()> {
    match tx.get_credentials_by_email(email).await? {
        Some(existing) if Some(existing.user.id) != exclude => {
            Err(CoreError::conflict("Email already registered"))
        }
        _ => Ok(()),
    }
}

pub(crate) async fn insert_user(
    tx: &mut dyn StoreTx,
    hasher: &dyn CredentialHasher,
    clock: &dyn Clock,
    draft: UserDraft,
) -> CoreResult<User> {
    ensure_email_free(tx, &draft.email, None).await?;
    let password_hash = hasher.hash(&draft.password)?;
    let now = clock.now();
    let user = User {
        id: Uuid::new_v4(),
        email: draft.email,
        full_name: draft.full_name.trim().to_string(),
        role: draft.role,
        is_active: draft.is_active,
        created_at: now,
        updated_at: now,
    };
    tx.insert_user(&user, &password_hash).await?;
    Ok(user)
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn CredentialHasher>,
}

impl AccountService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        clock: Arc<dyn Clock>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self { db, clock, hasher }
    }

    /// Creates an account. The very first account becomes an admin.
    pub async fn register(&self, input: Registration) -> CoreResult<User> {
        let email = normalize_email(&input.email)?;
        check_password(&input.password)?;
        check_full_name(&input.full_name)?;

        let mut tx = self.db.begin().await?;
        let role = if tx.count_users().await? == 0 {
            Role::Admin
        } else {
            Role::Employee
        };
        let user = insert_user(
            tx.as_mut(),
            self.hasher.as_ref(),
            self.clock.as_ref(),
            UserDraft {
                email,
                password: input.password,
                full_name: input.full_name,
                role,
                is_active: true,
            },
        )
        .await?;
        tx.commit().await?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Checks a password and returns the matching active user.
    pub async fn login(&self, email: &str, password: &str) -> CoreResult<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(CoreError::validation("Email and password are required"));
        }
        let invalid = || CoreError::Unauthorized("Invalid credentials".to_string());

        let mut tx = self.db.begin().await?;
        let credentials = tx
            .get_credentials_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(invalid)?;
        tx.commit().await?;

        if !credentials.user.is_active {
            return Err(CoreError::forbidden("Account deactivated"));
        }
        if !self.hasher.verify(password, &credentials.password_hash) {
            warn!(user_id = %credentials.user.id, "failed login attempt");
            return Err(invalid());
        }
        Ok(credentials.user)
    }

    pub async fn me(&self, viewer: &Viewer) -> CoreResult<User> {
        let mut tx = self.db.begin().await?;
        let user = tx
            .get_user(viewer.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User not found"))?;
        tx.commit().await?;
        Ok(user)
    }
}
