//! The signed-in user's calendar: events ordered by start time.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::{error, info};

use super::backend::{EventBackend, EventInsert};
use super::models::{Event, NewEvent, Notice, Session, non_empty};
use crate::errors::BoardError;

/// Local checks for a new event; no remote call is made when this fails.
pub fn validate_event(event: &NewEvent) -> Result<(), BoardError> {
    if event.title.trim().is_empty() {
        return Err(BoardError::validation("Event title is required"));
    }
    if event.end_date.is_some_and(|end| end < event.start_date) {
        return Err(BoardError::validation(
            "Event end must not be before its start",
        ));
    }
    Ok(())
}

/// Events not yet over at `now`, in start order.
pub fn upcoming(events: &[Event], now: DateTime<Utc>) -> Vec<&Event> {
    events.iter().filter(|e| e.ends_at() >= now).collect()
}

/// Group events by the calendar day they start on in `tz`. Days come out
/// in order; events keep their order within a day.
pub fn by_day<'a, Tz: TimeZone>(
    events: impl IntoIterator<Item = &'a Event>,
    tz: &Tz,
) -> Vec<(NaiveDate, Vec<&'a Event>)> {
    let mut days: Vec<(NaiveDate, Vec<&'a Event>)> = Vec::new();
    for event in events {
        let day = event.start_date.with_timezone(tz).date_naive();
        match days.iter_mut().find(|(d, _)| *d == day) {
            Some((_, list)) => list.push(event),
            None => days.push((day, vec![event])),
        }
    }
    days.sort_by_key(|(day, _)| *day);
    days
}

pub struct EventStore {
    backend: Arc<dyn EventBackend>,
    events: Vec<Event>,
    notices: Vec<Notice>,
}

impl EventStore {
    pub fn new(backend: Arc<dyn EventBackend>) -> Self {
        Self {
            backend,
            events: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Replace the list with the owner's events. On failure the previous
    /// list stays in place.
    pub async fn load(&mut self, session: &Session) -> Result<&[Event], BoardError> {
        match self.backend.select_events(session).await {
            Ok(mut events) => {
                events.sort_by_key(|e| e.start_date);
                self.events = events;
                Ok(&self.events)
            }
            Err(e) => {
                error!(error = %e, "failed to load events");
                self.notices.push(Notice::error("Error", "Failed to load events"));
                Err(BoardError::Fetch {
                    what: "events",
                    source: e,
                })
            }
        }
    }

    pub async fn add(&mut self, session: &Session, input: NewEvent) -> Result<Event, BoardError> {
        validate_event(&input)?;
        let row = EventInsert {
            title: input.title.trim().to_string(),
            description: input.description.as_deref().and_then(non_empty),
            start_date: input.start_date,
            end_date: input.end_date,
            priority: input.priority.as_str().to_string(),
            user_id: session.user_id,
        };
        let event = match self.backend.insert_event(session, row).await {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "failed to create event");
                self.notices.push(Notice::error("Error", "Failed to create event"));
                return Err(BoardError::Save {
                    what: "event",
                    source: e,
                });
            }
        };
        info!(event_id = %event.id, start = %event.start_date, "event created");
        self.notices.push(Notice::info(
            "Event created",
            "New event has been added to your calendar",
        ));
        let _ = self.load(session).await;
        Ok(event)
    }
}
