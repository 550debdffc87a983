use std::fmt;

use crate::guard::Guard;

/// Sub-views of the main workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceView {
    Studio,
    Campaigns,
    Calendar,
}

impl WorkspaceView {
    fn segment(self) -> Option<&'static str> {
        match self {
            WorkspaceView::Studio => None,
            WorkspaceView::Campaigns => Some("campaigns"),
            WorkspaceView::Calendar => Some("calendar"),
        }
    }
}

/// Client route paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Signup,
    Onboarding,
    Workspace(WorkspaceView),
    CampaignDetail(String),
    Profile,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".into(),
            Route::Login => "/login".into(),
            Route::Signup => "/signup".into(),
            Route::Onboarding => "/onboarding".into(),
            Route::Workspace(view) => match view.segment() {
                Some(segment) => format!("/homepage/{}", segment),
                None => "/homepage".into(),
            },
            Route::CampaignDetail(id) => format!("/campaign/{}", id),
            Route::Profile => "/profile".into(),
        }
    }

    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Route::Landing,
            ["login"] => Route::Login,
            ["signup"] => Route::Signup,
            ["onboarding"] => Route::Onboarding,
            ["homepage"] => Route::Workspace(WorkspaceView::Studio),
            ["homepage", "studio"] => Route::Workspace(WorkspaceView::Studio),
            ["homepage", "campaigns"] | ["campaigns"] => Route::Workspace(WorkspaceView::Campaigns),
            ["homepage", "calendar"] => Route::Workspace(WorkspaceView::Calendar),
            ["campaign", id] => Route::CampaignDetail((*id).to_string()),
            ["profile"] => Route::Profile,
            _ => return None,
        };
        Some(route)
    }

    pub fn guard(&self) -> Guard {
        match self {
            Route::Landing | Route::Login | Route::Signup => Guard::Public,
            Route::Onboarding => Guard::Authenticated,
            Route::Workspace(_) | Route::CampaignDetail(_) | Route::Profile => Guard::Onboarded,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
