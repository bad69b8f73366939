use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};

use crate::config::PluginConfig;
use crate::events::domain::{Event, EventId, EventType, EventTypeId, Shift, ShiftId};
use crate::events::participation::{
    ParticipantRef, Participation, ParticipationId, ParticipationState,
};
use crate::events::repository::{EventRepository, ParticipationRepository};
use crate::memory::InMemoryStore;
use crate::notifications::{
    InMemoryNotifications, Notification, NotificationDispatcher, NotificationError,
};
use crate::plugins::PluginRegistry;
use crate::repository::RepositoryError;
use crate::signup::participant::{GuestRegistration, ParticipantRequest};
use crate::signup::service::SignupService;
use crate::users::domain::{
    Qualification, QualificationGrant, QualificationId, UserId, UserProfile, WorkingHours,
};
use crate::users::repository::UserRepository;

pub(super) const INSTANT: &str = "shift-instant";
pub(super) const REQUEST: &str = "shift-request";
pub(super) const MEDIC: &str = "shift-medic";
pub(super) const CLOSED: &str = "shift-closed";
pub(super) const NO_SELF_SERVICE: &str = "shift-none";
pub(super) const DRAFT: &str = "shift-draft";

pub(super) const ADA: &str = "u-ada";
pub(super) const BOB: &str = "u-bob";
pub(super) const CAT: &str = "u-cat";
pub(super) const DAN: &str = "u-dan";
pub(super) const EVE: &str = "u-eve";

pub(super) const RESPONSIBLE: &str = "lead@example.org";

/// Clock used by most tests: well before every shift.
pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap()
}

pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, day, hour, 0, 0).unwrap()
}

pub(super) fn shift_id(id: &str) -> ShiftId {
    ShiftId(id.to_string())
}

pub(super) fn user(id: &str) -> ParticipantRequest {
    ParticipantRequest::UserId(UserId(id.to_string()))
}

pub(super) fn local(id: &str) -> ParticipantRef {
    ParticipantRef::Local(UserId(id.to_string()))
}

pub(super) fn guest() -> ParticipantRequest {
    ParticipantRequest::Guest(GuestRegistration {
        email: " Grace@Example.org ".to_string(),
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1991, 12, 9).expect("valid date"),
    })
}

fn profile(id: &str, first: &str, last: &str, born: (i32, u32, u32), active: bool) -> UserProfile {
    UserProfile {
        id: UserId(id.to_string()),
        email: format!("{}@example.org", first.to_ascii_lowercase()),
        first_name: first.to_string(),
        last_name: last.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(born.0, born.1, born.2).expect("valid date"),
        phone: None,
        is_active: active,
        is_visible: true,
        is_staff: false,
    }
}

fn shift(id: &str, event: &str, slug: &str, window: (u32, u32, u32), config: Value) -> Shift {
    let (day, start, end) = window;
    Shift {
        id: shift_id(id),
        event: EventId(event.to_string()),
        label: None,
        meeting_time: at(day, start),
        start_time: at(day, start),
        end_time: at(day, end),
        signup_method_slug: slug.to_string(),
        signup_configuration: config,
    }
}

/// One active event with a shift per signup method, plus an inactive draft event.
pub(super) fn seeded_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    store
        .add_event_type(EventType {
            id: EventTypeId("service".to_string()),
            title: "Ambulance service".to_string(),
            can_grant_qualification: false,
        })
        .expect("event type");
    store
        .add_event(Event {
            id: EventId("evt-marathon".to_string()),
            title: "City marathon".to_string(),
            description: None,
            location: "Harbour".to_string(),
            event_type: EventTypeId("service".to_string()),
            active: true,
            mail_updates: true,
            responsibles: vec![RESPONSIBLE.to_string()],
        })
        .expect("event");
    store
        .add_event(Event {
            id: EventId("evt-draft".to_string()),
            title: "Summer fair".to_string(),
            description: None,
            location: "Park".to_string(),
            event_type: EventTypeId("service".to_string()),
            active: false,
            mail_updates: true,
            responsibles: Vec::new(),
        })
        .expect("event");

    for shift in [
        shift(
            INSTANT,
            "evt-marathon",
            "instant_confirmation",
            (1, 8, 12),
            json!({ "maximum_number_of_participants": 2 }),
        ),
        shift(
            REQUEST,
            "evt-marathon",
            "request_confirm",
            (1, 10, 14),
            json!({
                "minimum_number_of_participants": 1,
                "maximum_number_of_participants": 1,
            }),
        ),
        shift(
            MEDIC,
            "evt-marathon",
            "request_confirm",
            (2, 14, 18),
            json!({ "required_qualification_ids": ["first-aid"] }),
        ),
        shift(
            CLOSED,
            "evt-marathon",
            "instant_confirmation",
            (3, 8, 12),
            json!({ "signup_until": "2025-06-15T00:00:00Z" }),
        ),
        shift(
            NO_SELF_SERVICE,
            "evt-marathon",
            "no_selfservice",
            (4, 8, 12),
            json!({ "maximum_number_of_participants": 1 }),
        ),
        shift(DRAFT, "evt-draft", "instant_confirmation", (5, 8, 12), Value::Null),
    ] {
        store.add_shift(shift).expect("shift");
    }

    store
        .add_qualification(Qualification {
            id: QualificationId("first-aid".to_string()),
            title: "First Aid".to_string(),
            abbreviation: "FA".to_string(),
            category: "medical".to_string(),
            includes: Vec::new(),
        })
        .expect("qualification");
    store
        .add_qualification(Qualification {
            id: QualificationId("emt".to_string()),
            title: "Emergency Medical Technician".to_string(),
            abbreviation: "EMT".to_string(),
            category: "medical".to_string(),
            includes: vec![QualificationId("first-aid".to_string())],
        })
        .expect("qualification");

    for user in [
        profile(ADA, "Ada", "Lovelace", (1990, 12, 10), true),
        profile(BOB, "Bob", "Builder", (2012, 3, 1), true),
        profile(CAT, "Cat", "Stevens", (1985, 7, 21), true),
        profile(DAN, "Dan", "Brown", (1980, 1, 5), false),
        profile(EVE, "Eve", "Online", (1995, 4, 2), true),
    ] {
        store.add_user(user).expect("user");
    }
    store
        .grant(QualificationGrant {
            user: UserId(ADA.to_string()),
            qualification: QualificationId("emt".to_string()),
            expires: None,
        })
        .expect("grant");
    store
        .grant(QualificationGrant {
            user: UserId(CAT.to_string()),
            qualification: QualificationId("first-aid".to_string()),
            expires: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        })
        .expect("grant");

    Arc::new(store)
}

pub(super) type TestService = SignupService<InMemoryStore, InMemoryNotifications>;

pub(super) fn build_service() -> (TestService, Arc<InMemoryStore>, Arc<InMemoryNotifications>) {
    build_service_with_plugins(PluginRegistry::default())
}

pub(super) fn build_service_with_plugins(
    plugins: PluginRegistry,
) -> (TestService, Arc<InMemoryStore>, Arc<InMemoryNotifications>) {
    let store = seeded_store();
    let notifications = Arc::new(InMemoryNotifications::default());
    let service = SignupService::new(store.clone(), notifications.clone(), Arc::new(plugins));
    (service, store, notifications)
}

pub(super) fn base_signup_only() -> PluginRegistry {
    PluginRegistry::builtin(&PluginConfig {
        enabled: Some(BTreeSet::from(["basesignup".to_string()])),
    })
}

pub(super) fn state_of(store: &InMemoryStore, id: &ParticipationId) -> ParticipationState {
    store
        .participation(id)
        .expect("store readable")
        .expect("participation stored")
        .state()
}

pub(super) struct OfflineNotifications;

impl NotificationDispatcher for OfflineNotifications {
    fn dispatch(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl EventRepository for UnavailableStore {
    fn event(&self, _id: &EventId) -> Result<Option<Event>, RepositoryError> {
        offline()
    }

    fn events(&self) -> Result<Vec<Event>, RepositoryError> {
        offline()
    }

    fn update_event(&self, _event: Event) -> Result<(), RepositoryError> {
        offline()
    }

    fn event_type(&self, _id: &EventTypeId) -> Result<Option<EventType>, RepositoryError> {
        offline()
    }

    fn shift(&self, _id: &ShiftId) -> Result<Option<Shift>, RepositoryError> {
        offline()
    }

    fn shifts_for_event(&self, _event: &EventId) -> Result<Vec<Shift>, RepositoryError> {
        offline()
    }
}

impl ParticipationRepository for UnavailableStore {
    fn insert_participation(
        &self,
        _participation: Participation,
    ) -> Result<Participation, RepositoryError> {
        offline()
    }

    fn update_participation(&self, _participation: Participation) -> Result<(), RepositoryError> {
        offline()
    }

    fn update_participations(
        &self,
        _participations: Vec<Participation>,
    ) -> Result<(), RepositoryError> {
        offline()
    }

    fn participation(
        &self,
        _id: &ParticipationId,
    ) -> Result<Option<Participation>, RepositoryError> {
        offline()
    }

    fn participations_for_shift(
        &self,
        _shift: &ShiftId,
    ) -> Result<Vec<Participation>, RepositoryError> {
        offline()
    }

    fn participations_for_participant(
        &self,
        _participant: &ParticipantRef,
    ) -> Result<Vec<Participation>, RepositoryError> {
        offline()
    }

    fn participations_in_state(
        &self,
        _state: ParticipationState,
    ) -> Result<Vec<Participation>, RepositoryError> {
        offline()
    }
}

impl UserRepository for UnavailableStore {
    fn user(&self, _id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        offline()
    }

    fn users(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        offline()
    }

    fn qualifications(&self) -> Result<Vec<Qualification>, RepositoryError> {
        offline()
    }

    fn grants_for_user(&self, _user: &UserId) -> Result<Vec<QualificationGrant>, RepositoryError> {
        offline()
    }

    fn working_hours_for_user(
        &self,
        _user: &UserId,
    ) -> Result<Vec<WorkingHours>, RepositoryError> {
        offline()
    }
}

/// Seeded store that accepts a limited number of participation writes, then goes offline.
pub(super) struct WriteLimitedStore {
    inner: Arc<InMemoryStore>,
    remaining: Mutex<usize>,
}

impl WriteLimitedStore {
    pub(super) fn new(inner: Arc<InMemoryStore>, writes: usize) -> Self {
        Self {
            inner,
            remaining: Mutex::new(writes),
        }
    }

    fn spend(&self, writes: usize) -> Result<(), RepositoryError> {
        let mut remaining = self.remaining.lock().unwrap_or_else(PoisonError::into_inner);
        if writes > *remaining {
            *remaining = 0;
            return offline();
        }
        *remaining -= writes;
        Ok(())
    }
}

impl EventRepository for WriteLimitedStore {
    fn event(&self, id: &EventId) -> Result<Option<Event>, RepositoryError> {
        self.inner.event(id)
    }

    fn events(&self) -> Result<Vec<Event>, RepositoryError> {
        self.inner.events()
    }

    fn update_event(&self, event: Event) -> Result<(), RepositoryError> {
        self.inner.update_event(event)
    }

    fn event_type(&self, id: &EventTypeId) -> Result<Option<EventType>, RepositoryError> {
        self.inner.event_type(id)
    }

    fn shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError> {
        self.inner.shift(id)
    }

    fn shifts_for_event(&self, event: &EventId) -> Result<Vec<Shift>, RepositoryError> {
        self.inner.shifts_for_event(event)
    }
}

impl ParticipationRepository for WriteLimitedStore {
    fn insert_participation(
        &self,
        participation: Participation,
    ) -> Result<Participation, RepositoryError> {
        self.inner.insert_participation(participation)
    }

    fn update_participation(&self, participation: Participation) -> Result<(), RepositoryError> {
        self.spend(1)?;
        self.inner.update_participation(participation)
    }

    fn update_participations(
        &self,
        participations: Vec<Participation>,
    ) -> Result<(), RepositoryError> {
        self.spend(participations.len())?;
        self.inner.update_participations(participations)
    }

    fn participation(
        &self,
        id: &ParticipationId,
    ) -> Result<Option<Participation>, RepositoryError> {
        self.inner.participation(id)
    }

    fn participations_for_shift(
        &self,
        shift: &ShiftId,
    ) -> Result<Vec<Participation>, RepositoryError> {
        self.inner.participations_for_shift(shift)
    }

    fn participations_for_participant(
        &self,
        participant: &ParticipantRef,
    ) -> Result<Vec<Participation>, RepositoryError> {
        self.inner.participations_for_participant(participant)
    }

    fn participations_in_state(
        &self,
        state: ParticipationState,
    ) -> Result<Vec<Participation>, RepositoryError> {
        self.inner.participations_in_state(state)
    }
}

impl UserRepository for WriteLimitedStore {
    fn user(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        self.inner.user(id)
    }

    fn users(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        self.inner.users()
    }

    fn qualifications(&self) -> Result<Vec<Qualification>, RepositoryError> {
        self.inner.qualifications()
    }

    fn grants_for_user(&self, user: &UserId) -> Result<Vec<QualificationGrant>, RepositoryError> {
        self.inner.grants_for_user(user)
    }

    fn working_hours_for_user(&self, user: &UserId) -> Result<Vec<WorkingHours>, RepositoryError> {
        self.inner.working_hours_for_user(user)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
