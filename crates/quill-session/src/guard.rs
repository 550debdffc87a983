use tracing::debug;

use crate::Session;
use crate::routes::Route;

/// Which check a route needs before it may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Public,
    Authenticated,
    Onboarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

/// Redirect target when the visitor is not logged in.
pub fn auth_guard<S: Session + ?Sized>(session: &S) -> Option<Route> {
    (!session.is_authenticated()).then_some(Route::Login)
}

/// Redirect target when the visitor is not logged in or has not finished
/// onboarding. Reads the record once so both checks see the same state.
pub fn onboarding_guard<S: Session + ?Sized>(session: &S) -> Option<Route> {
    match session.user() {
        None => Some(Route::Login),
        Some(user) if !user.is_onboarded => Some(Route::Onboarding),
        Some(_) => None,
    }
}

pub fn navigate<S: Session + ?Sized>(session: &S, route: Route) -> Navigation {
    let redirect = match route.guard() {
        Guard::Public => None,
        Guard::Authenticated => auth_guard(session),
        Guard::Onboarded => onboarding_guard(session),
    };

    match redirect {
        Some(target) => {
            debug!("Guard redirected {} -> {}", route, target);
            Navigation::Redirect(target)
        }
        None => Navigation::Render(route),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::WorkspaceView;
    use crate::{SessionStore, USER_KEY};
    use quill_types::models::User;

    enum Stored {
        Nothing,
        Garbage,
        User { onboarded: bool },
    }

    fn store_with(state: Stored) -> SessionStore {
        let store = SessionStore::in_memory().unwrap();
        match state {
            Stored::Nothing => {}
            Stored::Garbage => store.put_value(USER_KEY, "[1, 2").unwrap(),
            Stored::User { onboarded } => store
                .replace_user(&User {
                    email: "ana@acme.io".into(),
                    is_onboarded: onboarded,
                    ..User::default()
                })
                .unwrap(),
        }
        store
    }

    #[test]
    fn onboarding_guard_over_every_state() {
        let workspace = Route::Workspace(WorkspaceView::Studio);
        let cases = [
            (Stored::Nothing, Navigation::Redirect(Route::Login)),
            (Stored::Garbage, Navigation::Redirect(Route::Login)),
            (Stored::User { onboarded: false }, Navigation::Redirect(Route::Onboarding)),
            (Stored::User { onboarded: true }, Navigation::Render(workspace.clone())),
        ];

        for (state, expected) in cases {
            let store = store_with(state);
            assert_eq!(navigate(&store, workspace.clone()), expected);
        }
    }

    #[test]
    fn onboarding_page_only_needs_login() {
        let store = store_with(Stored::User { onboarded: false });
        assert_eq!(
            navigate(&store, Route::Onboarding),
            Navigation::Render(Route::Onboarding)
        );

        let anonymous = store_with(Stored::Nothing);
        assert_eq!(
            navigate(&anonymous, Route::Onboarding),
            Navigation::Redirect(Route::Login)
        );
    }

    #[test]
    fn public_routes_always_render() {
        let anonymous = store_with(Stored::Nothing);
        for route in [Route::Landing, Route::Login, Route::Signup] {
            assert_eq!(navigate(&anonymous, route.clone()), Navigation::Render(route));
        }
    }

    #[test]
    fn detail_and_profile_are_protected() {
        let store = store_with(Stored::User { onboarded: false });
        assert_eq!(
            navigate(&store, Route::CampaignDetail("c1".into())),
            Navigation::Redirect(Route::Onboarding)
        );
        assert_eq!(
            navigate(&store, Route::Profile),
            Navigation::Redirect(Route::Onboarding)
        );
    }
}
