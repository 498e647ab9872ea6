use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, SignupRequest},
    jwt::TokenKeys,
    password::Passwords,
};
use crate::{
    errors::AppError,
    state::AppState,
    store::{NewUser, StoreError, UserStore},
};

const EMAIL_TAKEN: &str = "Email already registered";
const DUMMY_PASSWORD: &str = "evently-unknown-account";

/// Signup and login over a [`UserStore`]. All collaborators are injected.
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserStore>,
    keys: TokenKeys,
    passwords: Passwords,
    dummy_hash: Arc<OnceCell<String>>,
}

impl FromRef<AppState> for CredentialService {
    fn from_ref(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            keys: state.keys.clone(),
            passwords: state.passwords,
            dummy_hash: state.dummy_hash.clone(),
        }
    }
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserStore>, keys: TokenKeys, passwords: Passwords) -> Self {
        Self {
            users,
            keys,
            passwords,
            dummy_hash: Arc::default(),
        }
    }

    /// Creates the account and returns a fresh session token.
    ///
    /// The email check runs before the insert for a friendly error, but it is not atomic with
    /// it: two concurrent signups for one email can both pass the check. The store's unique
    /// constraint decides the race and the loser gets the same conflict error.
    #[instrument(skip(self, req))]
    pub async fn signup(&self, req: SignupRequest) -> Result<AuthResponse, AppError> {
        let username = required(req.username)?;
        let email = required(req.email)?;
        let password = required_secret(req.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict(EMAIL_TAKEN));
        }

        let password_hash = self.passwords.hash(password).await?;

        let user = self
            .users
            .insert(NewUser {
                username,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation => {
                    warn!("email registered concurrently");
                    AppError::Conflict(EMAIL_TAKEN)
                }
                other => other.into(),
            })?;

        let token = self.keys.sign(user.id)?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(AuthResponse {
            token,
            username: user.username,
            email: user.email,
        })
    }

    /// Unknown email and wrong password fail identically.
    #[instrument(skip(self, req))]
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let email = required(req.email)?;
        let password = required_secret(req.password)?;

        let Some(user) = self.users.find_by_email(&email).await? else {
            // unknown emails pay for one hash check, like a wrong password
            self.verify_dummy(password).await;
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self
            .passwords
            .verify(password, user.password_hash.clone())
            .await?
        {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.keys.sign(user.id)?;

        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok(AuthResponse {
            token,
            username: user.username,
            email: user.email,
        })
    }
}

impl CredentialService {
    async fn verify_dummy(&self, password: String) {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.passwords.hash(DUMMY_PASSWORD.to_string()))
            .await;
        match hash {
            Ok(hash) => {
                let _ = self.passwords.verify(password, hash.clone()).await;
            }
            Err(e) => warn!(error = %e, "dummy hash unavailable"),
        }
    }
}

/// Trimmed value, or a validation error when absent or blank.
fn required(value: Option<String>) -> Result<String, AppError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::missing_fields()),
    }
}

/// Like [`required`] but keeps the value verbatim; passwords are never rewritten.
fn required_secret(value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::missing_fields()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{JwtConfig, PasswordConfig, PasswordScheme},
        store::MemoryStore,
    };

    fn service() -> (CredentialService, Arc<MemoryStore>, TokenKeys) {
        let store = Arc::new(MemoryStore::new());
        let keys = TokenKeys::new(&JwtConfig {
            secret: "test-secret".into(),
            ttl_minutes: 60 * 24 * 7,
        });
        let passwords = Passwords::new(&PasswordConfig {
            scheme: PasswordScheme::Bcrypt,
            bcrypt_cost: 4,
        });
        let svc = CredentialService::new(store.clone(), keys.clone(), passwords);
        (svc, store, keys)
    }

    fn signup_req(username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[tokio::test]
    async fn signup_then_login() {
        let (svc, store, keys) = service();

        let res = svc
            .signup(signup_req("alice", "a@x.com", "secret1"))
            .await
            .expect("signup");
        assert_eq!(res.username, "alice");
        assert_eq!(res.email, "a@x.com");

        let user = store.find_by_email("a@x.com").await.unwrap().expect("stored");
        assert_eq!(keys.verify(&res.token).unwrap().user_id, user.id);
        assert_ne!(user.password_hash, "secret1");

        let res = svc.login(login_req("a@x.com", "secret1")).await.expect("login");
        assert_eq!(res.username, "alice");
        assert_eq!(keys.verify(&res.token).unwrap().user_id, user.id);
    }

    #[tokio::test]
    async fn missing_fields_never_touch_the_store() {
        let (svc, store, _) = service();

        let cases = [
            SignupRequest::default(),
            signup_req("", "a@x.com", "pw"),
            signup_req("alice", "   ", "pw"),
            signup_req("alice", "a@x.com", ""),
        ];
        for req in cases {
            let err = svc.signup(req).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{err:?}");
        }
        assert_eq!(store.user_count().await, 0);

        let err = svc.login(login_req("", "pw")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = svc.login(LoginRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_and_keeps_one_row() {
        let (svc, store, _) = service();
        svc.signup(signup_req("alice", "a@x.com", "secret1"))
            .await
            .expect("first signup");

        let err = svc
            .signup(signup_req("alice2", "a@x.com", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(store.count_by_email("a@x.com").await, 1);
    }

    #[tokio::test]
    async fn concurrent_duplicate_signups_leave_one_row() {
        let (svc, store, _) = service();
        let a = svc.signup(signup_req("a", "race@x.com", "pw1"));
        let b = svc.signup(signup_req("b", "race@x.com", "pw2"));
        let (ra, rb) = tokio::join!(a, b);

        assert_eq!([ra.is_ok(), rb.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(store.count_by_email("race@x.com").await, 1);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (svc, _, _) = service();
        svc.signup(signup_req("alice", "a@x.com", "secret1"))
            .await
            .unwrap();

        let wrong = svc.login(login_req("a@x.com", "wrong")).await.unwrap_err();
        let unknown = svc
            .login(login_req("nobody@x.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn unknown_email_still_runs_a_hash_check() {
        let (svc, _, _) = service();
        assert!(svc.dummy_hash.get().is_none());

        let err = svc
            .login(login_req("nobody@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let hash = svc.dummy_hash.get().expect("dummy hash computed");
        assert!(hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn password_is_not_trimmed() {
        let (svc, _, _) = service();
        svc.signup(signup_req("alice", " a@x.com ", " pw "))
            .await
            .unwrap();

        assert!(svc.login(login_req("a@x.com", " pw ")).await.is_ok());
        assert!(matches!(
            svc.login(login_req("a@x.com", "pw")).await.unwrap_err(),
            AppError::InvalidCredentials
        ));
    }
}
