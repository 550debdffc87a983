use thiserror::Error;
use tracing::{info, warn};

use quill_client::{Backend, ClientError};
use quill_session::{Route, Session, WorkspaceView};
use quill_types::api::Credentials;
use quill_types::models::User;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Session(#[from] anyhow::Error),
}

/// Where a freshly authenticated user lands.
pub fn landing_for(user: &User) -> Route {
    if user.is_onboarded {
        Route::Workspace(WorkspaceView::Studio)
    } else {
        Route::Onboarding
    }
}

fn credentials(email: &str, password: &str, message: &'static str) -> Result<Credentials, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::Validation(message));
    }
    Ok(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

pub async fn login<B, S>(backend: &B, session: &S, email: &str, password: &str) -> Result<Route, AuthError>
where
    B: Backend,
    S: Session + ?Sized,
{
    let credentials = credentials(email, password, "Email and password are required")?;
    let user = backend.login(&credentials).await?;
    session.replace_user(&user)?;

    info!("Logged in as {}", user.email);
    Ok(landing_for(&user))
}

/// Create an account. No session is started; the caller logs in next.
pub async fn signup<B: Backend>(backend: &B, email: &str, password: &str) -> Result<Route, AuthError> {
    let credentials = credentials(email, password, "Please fill in all fields")?;
    backend.signup(&credentials).await?;

    info!("Account created for {}", credentials.email);
    Ok(Route::Login)
}

/// End the session. The server call is best effort; local state is
/// cleared whatever it returns.
pub async fn logout<B, S>(backend: &B, session: &S) -> Result<Route, AuthError>
where
    B: Backend,
    S: Session + ?Sized,
{
    if let Err(e) = backend.logout().await {
        warn!("Server logout failed, clearing local session anyway: {}", e);
    }
    session.clear()?;
    Ok(Route::Landing)
}
