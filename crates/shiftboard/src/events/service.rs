use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{event_window, Event, EventId, EventType, Shift, ShiftId};
use super::stats::SignupStats;
use crate::notifications::{send_robust, Notification, NotificationDispatcher, NotificationKind};
use crate::plugins::PluginRegistry;
use crate::repository::{RepositoryError, Store};
use crate::signup::configuration::{signup_info, SignupConfiguration, SignupInfoEntry};
use crate::signup::registry::RegistryError;
use crate::users::qualifications::QualificationCatalog;

/// Listing entry for an event.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub event: Event,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub stats: SignupStats,
}

/// One shift as shown on the event page.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftOverview {
    pub shift_id: ShiftId,
    pub label: String,
    pub meeting_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub signup_method: &'static str,
    pub signup_method_name: &'static str,
    pub stats: SignupStats,
    pub signup_info: Vec<SignupInfoEntry>,
}

/// Event page: the event, its type, its shifts, and head counts summed over all shifts.
#[derive(Debug, Clone, Serialize)]
pub struct EventOverview {
    pub event: Event,
    pub event_type: Option<EventType>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub shifts: Vec<ShiftOverview>,
    pub stats: SignupStats,
}

/// Read side of events plus activation.
pub struct EventService<S, N> {
    store: Arc<S>,
    notifications: Arc<N>,
    plugins: Arc<PluginRegistry>,
}

impl<S, N> EventService<S, N>
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(store: Arc<S>, notifications: Arc<N>, plugins: Arc<PluginRegistry>) -> Self {
        Self {
            store,
            notifications,
            plugins,
        }
    }

    /// Active events ordered by their first shift; events without shifts come last.
    ///
    /// A shift whose signup method or configuration cannot be loaded is left out of the event's
    /// stats instead of failing the listing. Storage errors still fail it.
    pub fn active_events(&self) -> Result<Vec<EventSummary>, EventServiceError> {
        let catalog = self.catalog()?;
        let mut summaries = Vec::new();
        for event in self.store.events()?.into_iter().filter(|event| event.active) {
            let shifts = self.store.shifts_for_event(&event.id)?;
            let window = event_window(&shifts);
            let mut stats = SignupStats::default();
            for shift in &shifts {
                match self.shift_overview(shift, &catalog) {
                    Ok(overview) => stats = stats + overview.stats,
                    Err(error @ EventServiceError::Repository(_)) => return Err(error),
                    Err(error) => {
                        tracing::warn!(
                            event = %event.id,
                            shift = %shift.id,
                            error = %error,
                            "shift left out of the event listing"
                        );
                    }
                }
            }
            summaries.push(EventSummary {
                event,
                start_time: window.map(|(start, _)| start),
                end_time: window.map(|(_, end)| end),
                stats,
            });
        }
        summaries.sort_by_key(|summary| (summary.start_time.is_none(), summary.start_time));
        Ok(summaries)
    }

    pub fn event_overview(&self, event_id: &EventId) -> Result<EventOverview, EventServiceError> {
        let event = self
            .store
            .event(event_id)?
            .ok_or_else(|| EventServiceError::UnknownEvent(event_id.clone()))?;
        let event_type = self.store.event_type(&event.event_type)?;
        let shifts = self.store.shifts_for_event(event_id)?;
        let catalog = self.catalog()?;

        let window = event_window(&shifts);
        let shifts = shifts
            .iter()
            .map(|shift| self.shift_overview(shift, &catalog))
            .collect::<Result<Vec<_>, _>>()?;
        let stats: SignupStats = shifts.iter().map(|shift| shift.stats).sum();

        Ok(EventOverview {
            event,
            event_type,
            start_time: window.map(|(start, _)| start),
            end_time: window.map(|(_, end)| end),
            shifts,
            stats,
        })
    }

    /// Publish an event. Activating an active event changes nothing.
    pub fn activate(&self, event_id: &EventId) -> Result<Event, EventServiceError> {
        let mut event = self
            .store
            .event(event_id)?
            .ok_or_else(|| EventServiceError::UnknownEvent(event_id.clone()))?;
        if event.active {
            return Ok(event);
        }

        event.active = true;
        self.store.update_event(event.clone())?;
        tracing::info!(event = %event.id, "event activated");

        if event.mail_updates {
            let recipients = self
                .store
                .users()?
                .into_iter()
                .filter(|user| user.is_active)
                .map(|user| user.email);
            send_robust(
                self.notifications.as_ref(),
                Notification::new(
                    NotificationKind::NewEvent,
                    format!("New event: {}", event.title),
                )
                .to(recipients)
                .detail("event_id", event.id.0.clone())
                .detail("location", event.location.clone()),
            );
        }
        Ok(event)
    }

    fn shift_overview(
        &self,
        shift: &Shift,
        catalog: &QualificationCatalog,
    ) -> Result<ShiftOverview, EventServiceError> {
        let method = self.plugins.signup_method(&shift.signup_method_slug)?;
        let config = SignupConfiguration::from_value(&shift.signup_configuration)?;
        let participations = self.store.participations_for_shift(&shift.id)?;
        Ok(ShiftOverview {
            shift_id: shift.id.clone(),
            label: shift.display_label(),
            meeting_time: shift.meeting_time,
            start_time: shift.start_time,
            end_time: shift.end_time,
            signup_method: method.slug(),
            signup_method_name: method.verbose_name(),
            stats: SignupStats::from_participations(
                &participations,
                method.participant_count_bounds(&config),
            ),
            signup_info: signup_info(&config, catalog),
        })
    }

    fn catalog(&self) -> Result<QualificationCatalog, EventServiceError> {
        Ok(QualificationCatalog::new(self.store.qualifications()?))
    }
}

/// Error raised by the event service.
#[derive(Debug, thiserror::Error)]
pub enum EventServiceError {
    #[error("event '{0}' was not found")]
    UnknownEvent(EventId),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid signup configuration: {0}")]
    Configuration(#[from] serde_json::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::domain::EventTypeId;
    use crate::events::repository::EventRepository;
    use crate::memory::InMemoryStore;
    use crate::notifications::InMemoryNotifications;
    use crate::signup::participant::ParticipantRequest;
    use crate::signup::service::SignupService;
    use crate::users::domain::{UserId, UserProfile};
    use chrono::{NaiveDate, TimeZone};
    use serde_json::{json, Map, Value};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, day, hour, 0, 0).unwrap()
    }

    fn event(id: &str, active: bool, mail_updates: bool) -> Event {
        Event {
            id: EventId(id.to_string()),
            title: format!("Event {id}"),
            description: None,
            location: "Town hall".to_string(),
            event_type: EventTypeId("training".to_string()),
            active,
            mail_updates,
            responsibles: Vec::new(),
        }
    }

    fn shift(id: &str, event: &str, slug: &str, day: u32, config: Value) -> Shift {
        Shift {
            id: ShiftId(id.to_string()),
            event: EventId(event.to_string()),
            label: None,
            meeting_time: at(day, 7),
            start_time: at(day, 8),
            end_time: at(day, 12),
            signup_method_slug: slug.to_string(),
            signup_configuration: config,
        }
    }

    fn user(id: &str, active: bool) -> UserProfile {
        UserProfile {
            id: UserId(id.to_string()),
            email: format!("{id}@example.org"),
            first_name: "Test".to_string(),
            last_name: id.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid"),
            phone: None,
            is_active: active,
            is_visible: true,
            is_staff: false,
        }
    }

    fn seeded() -> (
        EventService<InMemoryStore, InMemoryNotifications>,
        SignupService<InMemoryStore, InMemoryNotifications>,
        Arc<InMemoryStore>,
        Arc<InMemoryNotifications>,
    ) {
        let store = Arc::new(InMemoryStore::new());
        store
            .add_event_type(EventType {
                id: EventTypeId("training".to_string()),
                title: "Training".to_string(),
                can_grant_qualification: true,
            })
            .expect("event type");
        store.add_event(event("late", true, true)).expect("event");
        store.add_event(event("early", true, true)).expect("event");
        store.add_event(event("empty", true, true)).expect("event");
        store.add_event(event("draft", false, true)).expect("event");
        store.add_event(event("quiet", false, false)).expect("event");
        store
            .add_shift(shift(
                "late-a",
                "late",
                "instant_confirmation",
                20,
                json!({ "maximum_number_of_participants": 3 }),
            ))
            .expect("shift");
        store
            .add_shift(shift(
                "late-b",
                "late",
                "request_confirm",
                21,
                json!({ "minimum_number_of_participants": 2, "maximum_number_of_participants": 4 }),
            ))
            .expect("shift");
        store
            .add_shift(shift("early-a", "early", "instant_confirmation", 10, Value::Null))
            .expect("shift");
        store.add_user(user("u-1", true)).expect("user");
        store.add_user(user("u-2", false)).expect("user");

        let notifications = Arc::new(InMemoryNotifications::default());
        let plugins = Arc::new(PluginRegistry::default());
        let events = EventService::new(store.clone(), notifications.clone(), plugins.clone());
        let signups = SignupService::new(store.clone(), notifications.clone(), plugins);
        (events, signups, store, notifications)
    }

    #[test]
    fn active_events_are_ordered_by_first_shift() {
        let (service, _, _, _) = seeded();

        let ids: Vec<String> = service
            .active_events()
            .expect("listing")
            .into_iter()
            .map(|summary| summary.event.id.0)
            .collect();

        assert_eq!(ids, vec!["early", "late", "empty"]);
    }

    #[test]
    fn listing_skips_shifts_that_cannot_be_loaded() {
        let (service, _, store, _) = seeded();
        store
            .add_shift(shift("late-c", "late", "retired_method", 22, Value::Null))
            .expect("shift");
        store
            .add_shift(shift(
                "late-d",
                "late",
                "instant_confirmation",
                22,
                json!({ "maximum_number_of_participants": "many" }),
            ))
            .expect("shift");

        let listing = service.active_events().expect("listing");
        let late = listing
            .iter()
            .find(|summary| summary.event.id.0 == "late")
            .expect("late event listed");

        assert_eq!(listing.len(), 3);
        assert_eq!(late.stats.max_count, Some(7));
        assert_eq!(late.stats.min_count, Some(2));
        assert_eq!(late.end_time, Some(at(22, 12)));
        assert!(matches!(
            service.event_overview(&EventId("late".to_string())),
            Err(EventServiceError::Registry(_))
        ));
    }

    #[test]
    fn overview_sums_shift_stats() {
        let (service, signups, _, _) = seeded();
        signups
            .perform_signup(
                &ShiftId("late-a".to_string()),
                ParticipantRequest::UserId(UserId("u-1".to_string())),
                Map::new(),
                at(1, 12),
            )
            .expect("signup");

        let overview = service
            .event_overview(&EventId("late".to_string()))
            .expect("overview");

        assert_eq!(overview.event_type.map(|kind| kind.title), Some("Training".to_string()));
        assert_eq!(overview.start_time, Some(at(20, 8)));
        assert_eq!(overview.end_time, Some(at(21, 12)));
        assert_eq!(overview.shifts.len(), 2);
        assert_eq!(overview.shifts[0].signup_method_name, "Instant Confirmation");
        assert_eq!(overview.shifts[0].stats.max_count, Some(3));
        assert_eq!(overview.shifts[1].stats.min_count, Some(2));
        assert_eq!(overview.stats.confirmed_count, 1);
        assert_eq!(overview.stats.min_count, Some(2));
        assert_eq!(overview.stats.max_count, Some(7));
    }

    #[test]
    fn unknown_event_is_reported() {
        let (service, _, _, _) = seeded();
        assert!(matches!(
            service.event_overview(&EventId("nope".to_string())),
            Err(EventServiceError::UnknownEvent(_))
        ));
    }

    #[test]
    fn activation_announces_the_event_once() {
        let (service, _, store, notifications) = seeded();

        let event = service
            .activate(&EventId("draft".to_string()))
            .expect("activated");
        assert!(event.active);
        assert!(store
            .event(&EventId("draft".to_string()))
            .expect("readable")
            .expect("stored")
            .active);

        service
            .activate(&EventId("draft".to_string()))
            .expect("second activation is a no-op");

        let sent = notifications.of_kind(NotificationKind::NewEvent);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["u-1@example.org".to_string()]);
    }

    #[test]
    fn activation_without_mail_updates_stays_quiet() {
        let (service, _, _, notifications) = seeded();

        service
            .activate(&EventId("quiet".to_string()))
            .expect("activated");

        assert!(notifications.sent().is_empty());
    }
}
