use tracing::{debug, warn};

use quill_client::Backend;
use quill_session::{Route, WorkspaceView};
use quill_types::models::{Campaign, ContentBundle};

use crate::generation::normalize_all;

/// A campaign with its content rendered for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignView {
    pub campaign: Campaign,
    pub bundle: ContentBundle,
}

impl From<Campaign> for CampaignView {
    fn from(campaign: Campaign) -> Self {
        let bundle = normalize_all(&campaign.content);
        Self { campaign, bundle }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CampaignLookup {
    Found(CampaignView),
    /// Empty state with a way back to the list.
    NotFound { back: Route },
}

impl CampaignLookup {
    fn not_found() -> Self {
        CampaignLookup::NotFound {
            back: Route::Workspace(WorkspaceView::Campaigns),
        }
    }
}

/// Fetch a campaign by id, falling back to a scan of the history when the
/// single-item endpoint has nothing. Network failures are logged and read
/// as not found.
pub async fn lookup_campaign<B: Backend>(backend: &B, id: &str) -> CampaignLookup {
    match backend.campaign(id).await {
        Ok(Some(campaign)) => return CampaignLookup::Found(campaign.into()),
        Ok(None) => debug!("Campaign {} not served directly, searching history", id),
        Err(e) => {
            warn!("Failed to load campaign {}: {}", id, e);
            return CampaignLookup::not_found();
        }
    }

    match backend.history().await {
        Ok(campaigns) => campaigns
            .into_iter()
            .find(|campaign| campaign.id == id)
            .map_or_else(CampaignLookup::not_found, |c| CampaignLookup::Found(c.into())),
        Err(e) => {
            warn!("Failed to search history for {}: {}", id, e);
            CampaignLookup::not_found()
        }
    }
}
