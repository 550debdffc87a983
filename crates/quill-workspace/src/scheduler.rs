//! Campaign calendar.
//!
//! [`ScheduleBoard`] holds the two lists and only changes through its
//! transition methods. [`Scheduler`] layers the drag, confirm and network
//! steps on top: nothing on the board moves until the backend accepts.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{debug, info, warn};

use quill_client::{Backend, ClientError};
use quill_types::api::{PublishRequest, ScheduleRequest};
use quill_types::models::{Campaign, CampaignStatus, CalendarEvent, Platform, TimeSlot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("campaign {0} is not waiting to be scheduled")]
    NotUnscheduled(String),

    #[error("campaign {0} is not on the calendar")]
    NotScheduled(String),

    #[error("unknown campaign {0}")]
    Unknown(String),
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("a scheduling request is already running")]
    Busy,

    #[error("no draft is being dragged")]
    NothingDragged,

    #[error("a drop is waiting for confirmation")]
    ConfirmationOpen,

    #[error("no drop to confirm")]
    NoPendingDrop,

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// An unscheduled campaign in the side list.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub id: String,
    pub title: String,
    pub platforms: Vec<Platform>,
}

impl From<&Campaign> for Draft {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: campaign.id.clone(),
            title: campaign.display_title().to_string(),
            platforms: campaign.platforms.clone(),
        }
    }
}

/// Unscheduled drafts and calendar events. An id is never in both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleBoard {
    unscheduled: BTreeMap<String, Draft>,
    scheduled: BTreeMap<String, CalendarEvent>,
    platforms: BTreeMap<String, Vec<Platform>>,
    published: BTreeSet<String>,
}

impl ScheduleBoard {
    /// Campaigns with a scheduled time become one-hour events; the rest
    /// are drafts.
    pub fn from_history(campaigns: &[Campaign]) -> Self {
        let mut board = Self::default();
        for campaign in campaigns {
            board
                .platforms
                .insert(campaign.id.clone(), campaign.platforms.clone());
            if campaign.status == Some(CampaignStatus::Published) {
                board.published.insert(campaign.id.clone());
            }

            match CalendarEvent::for_campaign(campaign) {
                Some(event) => {
                    board.unscheduled.remove(&campaign.id);
                    board.scheduled.insert(event.id.clone(), event);
                }
                None if !board.scheduled.contains_key(&campaign.id) => {
                    board
                        .unscheduled
                        .insert(campaign.id.clone(), Draft::from(campaign));
                }
                None => {}
            }
        }
        board
    }

    pub fn draft(&self, id: &str) -> Option<&Draft> {
        self.unscheduled.get(id)
    }

    pub fn event(&self, id: &str) -> Option<&CalendarEvent> {
        self.scheduled.get(id)
    }

    pub fn drafts(&self) -> impl Iterator<Item = &Draft> {
        self.unscheduled.values()
    }

    pub fn events_by_start(&self) -> Vec<&CalendarEvent> {
        let mut events: Vec<_> = self.scheduled.values().collect();
        events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        events
    }

    pub fn is_published(&self, id: &str) -> bool {
        self.published.contains(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.unscheduled.contains_key(id) || self.scheduled.contains_key(id)
    }

    /// First target platform of a campaign, else `default`.
    pub fn platform_for(&self, id: &str, default: Platform) -> Platform {
        self.platforms
            .get(id)
            .and_then(|platforms| platforms.first().copied())
            .unwrap_or(default)
    }

    /// Move a draft onto the calendar.
    pub fn schedule(&mut self, id: &str, slot: TimeSlot) -> Result<&CalendarEvent, BoardError> {
        let draft = self
            .unscheduled
            .remove(id)
            .ok_or_else(|| BoardError::NotUnscheduled(id.to_string()))?;
        let event = CalendarEvent::new(draft.id, draft.title, slot);
        Ok(&*self.scheduled.entry(id.to_string()).or_insert(event))
    }

    /// Change the slot of an event already on the calendar.
    pub fn reschedule(&mut self, id: &str, slot: TimeSlot) -> Result<(), BoardError> {
        let event = self
            .scheduled
            .get_mut(id)
            .ok_or_else(|| BoardError::NotScheduled(id.to_string()))?;
        event.start = slot.start;
        event.end = slot.end;
        Ok(())
    }

    pub fn mark_published(&mut self, id: &str) -> Result<(), BoardError> {
        if !self.contains(id) {
            return Err(BoardError::Unknown(id.to_string()));
        }
        self.published.insert(id.to_string());
        Ok(())
    }

    pub fn is_consistent(&self) -> bool {
        self.unscheduled
            .keys()
            .all(|id| !self.scheduled.contains_key(id))
    }
}

/// A dropped draft awaiting the user's yes or no.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDrop {
    pub draft_id: String,
    pub title: String,
    pub slot: TimeSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TicketKind {
    Schedule,
    Reschedule,
}

/// An accepted schedule or reschedule, waiting on the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleTicket {
    kind: TicketKind,
    id: String,
    slot: TimeSlot,
    platform: Platform,
}

impl ScheduleTicket {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn slot(&self) -> TimeSlot {
        self.slot
    }

    pub fn request(&self) -> ScheduleRequest {
        ScheduleRequest {
            content_id: self.id.clone(),
            scheduled_at: self.slot.start,
            platform: self.platform,
        }
    }
}

pub struct Scheduler {
    board: ScheduleBoard,
    dragging: Option<String>,
    pending: Option<PendingDrop>,
    busy: bool,
    default_platform: Platform,
}

impl Scheduler {
    pub fn new(board: ScheduleBoard, default_platform: Platform) -> Self {
        Self {
            board,
            dragging: None,
            pending: None,
            busy: false,
            default_platform,
        }
    }

    /// Build the board from the backend's campaign history.
    pub async fn load<B: Backend>(backend: &B, default_platform: Platform) -> Result<Self, ScheduleError> {
        let campaigns = backend.history().await?;
        let board = ScheduleBoard::from_history(&campaigns);
        debug!(
            "Loaded {} drafts and {} events",
            board.unscheduled.len(),
            board.scheduled.len()
        );
        Ok(Self::new(board, default_platform))
    }

    pub fn board(&self) -> &ScheduleBoard {
        &self.board
    }

    pub fn pending(&self) -> Option<&PendingDrop> {
        self.pending.as_ref()
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn ensure_idle(&self) -> Result<(), ScheduleError> {
        if self.busy {
            return Err(ScheduleError::Busy);
        }
        if self.pending.is_some() {
            return Err(ScheduleError::ConfirmationOpen);
        }
        Ok(())
    }

    pub fn begin_drag(&mut self, id: &str) -> Result<(), ScheduleError> {
        self.ensure_idle()?;
        if self.board.draft(id).is_none() {
            return Err(BoardError::NotUnscheduled(id.to_string()).into());
        }
        self.dragging = Some(id.to_string());
        Ok(())
    }

    /// Drop the dragged draft on a slot and open the confirmation.
    pub fn drop_on(&mut self, slot: TimeSlot) -> Result<&PendingDrop, ScheduleError> {
        self.ensure_idle()?;
        let id = self.dragging.take().ok_or(ScheduleError::NothingDragged)?;
        let draft = self
            .board
            .draft(&id)
            .ok_or_else(|| BoardError::NotUnscheduled(id.clone()))?;

        let pending = PendingDrop {
            draft_id: id,
            title: draft.title.clone(),
            slot,
        };
        Ok(&*self.pending.insert(pending))
    }

    /// Close the confirmation without scheduling anything.
    pub fn decline(&mut self) -> Option<PendingDrop> {
        self.pending.take()
    }

    /// Accept the pending drop. The board is unchanged until
    /// [`Scheduler::complete`] sees the backend's answer.
    pub fn confirm(&mut self) -> Result<ScheduleTicket, ScheduleError> {
        if self.busy {
            return Err(ScheduleError::Busy);
        }
        let pending = self.pending.take().ok_or(ScheduleError::NoPendingDrop)?;
        self.busy = true;
        Ok(ScheduleTicket {
            kind: TicketKind::Schedule,
            platform: self.board.platform_for(&pending.draft_id, self.default_platform),
            id: pending.draft_id,
            slot: pending.slot,
        })
    }

    /// Start moving an event to a new slot.
    pub fn move_event(&mut self, id: &str, slot: TimeSlot) -> Result<ScheduleTicket, ScheduleError> {
        self.ensure_idle()?;
        if self.board.event(id).is_none() {
            return Err(BoardError::NotScheduled(id.to_string()).into());
        }
        self.busy = true;
        Ok(ScheduleTicket {
            kind: TicketKind::Reschedule,
            id: id.to_string(),
            slot,
            platform: self.board.platform_for(id, self.default_platform),
        })
    }

    /// Apply the backend's answer to a ticket. On failure the board is left
    /// as it was and the draft can be dropped again.
    pub fn complete(
        &mut self,
        ticket: ScheduleTicket,
        outcome: Result<(), ClientError>,
    ) -> Result<(), ScheduleError> {
        self.busy = false;

        if let Err(e) = outcome {
            warn!("Scheduling {} failed: {}", ticket.id, e);
            return Err(e.into());
        }

        match ticket.kind {
            TicketKind::Schedule => {
                self.board.schedule(&ticket.id, ticket.slot)?;
                info!("Scheduled {} at {}", ticket.id, ticket.slot.start);
            }
            TicketKind::Reschedule => {
                self.board.reschedule(&ticket.id, ticket.slot)?;
                info!("Rescheduled {} to {}", ticket.id, ticket.slot.start);
            }
        }
        Ok(())
    }

    /// Confirm the pending drop and send it.
    pub async fn confirm_and_send<B: Backend>(&mut self, backend: &B) -> Result<CalendarEvent, ScheduleError> {
        let ticket = self.confirm()?;
        let outcome = backend.schedule(&ticket.request()).await;
        let id = ticket.id.clone();
        self.complete(ticket, outcome)?;
        self.board
            .event(&id)
            .cloned()
            .ok_or_else(|| BoardError::NotScheduled(id).into())
    }

    pub async fn reschedule<B: Backend>(&mut self, backend: &B, id: &str, slot: TimeSlot) -> Result<(), ScheduleError> {
        let ticket = self.move_event(id, slot)?;
        let outcome = backend.schedule(&ticket.request()).await;
        self.complete(ticket, outcome)
    }

    pub async fn publish<B: Backend>(&mut self, backend: &B, id: &str) -> Result<(), ScheduleError> {
        self.ensure_idle()?;
        if !self.board.contains(id) {
            return Err(BoardError::Unknown(id.to_string()).into());
        }

        let request = PublishRequest {
            content_id: id.to_string(),
            platform: self.board.platform_for(id, self.default_platform),
        };
        self.busy = true;
        let outcome = backend.publish(&request).await;
        self.busy = false;

        outcome?;
        self.board.mark_published(id)?;
        info!("Published {} to {}", id, request.platform);
        Ok(())
    }
}
