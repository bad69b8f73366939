use crate::infra::Services;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use serde_json::{json, Map, Value};
use shiftboard::error::AppError;
use shiftboard::events::{
    Event, EventId, EventOverview, EventType, EventTypeId, Participation, Shift, ShiftId,
};
use shiftboard::notifications::{InMemoryNotifications, NotificationKind};
use shiftboard::plugins::PluginRegistry;
use shiftboard::repository::RepositoryError;
use shiftboard::signup::{
    Decision, DispositionDecision, GuestRegistration, ParticipantRequest, SignupServiceError,
};
use shiftboard::users::{
    write_working_hours_csv, Qualification, QualificationGrant, QualificationId, UserId,
    UserProfile, UserRepository, WorkingHours, WorkingHoursSummary,
};
use shiftboard::InMemoryStore;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

const FESTIVAL: &str = "evt-festival";
const BLOOD_DRIVE: &str = "evt-blood-drive";
const GATE: &str = "shift-gate";
const TENT: &str = "shift-tent";
const SETUP: &str = "shift-setup";
const DONORS: &str = "shift-donors";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Clock the scenario starts at (RFC 3339). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_datetime)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Write the working hours export to this CSV file instead of stdout.
    #[arg(long)]
    pub(crate) hours_csv: Option<PathBuf>,
}

/// What a scenario run leaves behind.
pub(crate) struct DemoOutcome {
    pub(crate) log: Vec<String>,
    pub(crate) overviews: Vec<EventOverview>,
    pub(crate) finished: Vec<Participation>,
    pub(crate) working_hours: Vec<WorkingHoursSummary>,
    pub(crate) notifications: Vec<(NotificationKind, usize)>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { now, hours_csv } = args;
    let anchor = now.unwrap_or_else(Utc::now);

    println!("Shiftboard demo starting {}", anchor.to_rfc3339());
    let outcome = run_scenario(anchor)?;

    println!("\nSignup activity");
    for line in &outcome.log {
        println!("- {line}");
    }

    for overview in &outcome.overviews {
        println!(
            "\n{} ({}) | {} confirmed | {} requested",
            overview.event.title,
            overview
                .event_type
                .as_ref()
                .map_or("untyped", |event_type| event_type.title.as_str()),
            overview.stats.confirmed_count,
            overview.stats.requested_count
        );
        for shift in &overview.shifts {
            let places = shift
                .stats
                .max_count
                .map(|max| format!("{}/{max}", shift.stats.confirmed_count))
                .unwrap_or_else(|| shift.stats.confirmed_count.to_string());
            println!(
                "  - {} [{}] {} | {} places taken",
                shift.label,
                shift.signup_method_name,
                shift.start_time.format("%a %H:%M"),
                places
            );
        }
    }

    println!(
        "\n{} participations finished after their shifts ended",
        outcome.finished.len()
    );

    println!("\nNotifications");
    for (kind, count) in &outcome.notifications {
        println!("- {}: {count}", kind.slug());
    }

    println!("\nWorking hours");
    for summary in &outcome.working_hours {
        println!("- {}: {:.2} h", summary.name, summary.total_hours);
    }

    match hours_csv {
        Some(path) => {
            write_working_hours_csv(File::create(&path)?, &outcome.working_hours)?;
            println!("\nWorking hours exported to {}", path.display());
        }
        None => {
            println!();
            write_working_hours_csv(std::io::stdout().lock(), &outcome.working_hours)?;
        }
    }

    Ok(())
}

pub(crate) fn run_scenario(anchor: DateTime<Utc>) -> Result<DemoOutcome, AppError> {
    let store = Arc::new(InMemoryStore::new());
    seed_demo_data(&store, anchor)?;
    let notifications = Arc::new(InMemoryNotifications::default());
    let services = Services::new(
        store.clone(),
        notifications.clone(),
        Arc::new(PluginRegistry::default()),
    );
    let mut log = Vec::new();

    services.events.activate(&EventId(FESTIVAL.to_string()))?;
    log.push("Summer festival activated".to_string());

    let signups = [
        (GATE, user("u-ada")),
        (GATE, user("u-bob")),
        (GATE, user("u-eve")),
        (TENT, user("u-dan")),
        (TENT, user("u-cat")),
        (TENT, user("u-bob")),
        (DONORS, guest(anchor)),
    ];
    let mut pending = Vec::new();
    for (shift, request) in signups {
        let who = describe(&request);
        match services
            .signups
            .perform_signup(&shift_id(shift), request, Map::new(), anchor)
        {
            Ok(participation) => {
                log.push(format!(
                    "{who} signed up for {shift}: {}",
                    participation.state().label()
                ));
                if shift == GATE {
                    pending.push(participation);
                }
            }
            Err(SignupServiceError::Rejected(errors)) => {
                let reasons: Vec<String> = errors.iter().map(ToString::to_string).collect();
                log.push(format!("{who} refused for {shift}: {}", reasons.join("; ")));
            }
            Err(err) => return Err(err.into()),
        }
    }

    let decisions = pending
        .iter()
        .filter_map(|participation| {
            let decision = match participation.participant.to_string().as_str() {
                "u-ada" => Decision::Confirm,
                "u-bob" => Decision::Decline,
                _ => return None,
            };
            Some(DispositionDecision {
                participation_id: participation.id.clone(),
                decision,
            })
        })
        .collect();
    let view = services
        .signups
        .dispose(&shift_id(GATE), decisions, anchor)?;
    log.push(format!(
        "Gate disposition: {} confirmed, {} still requested",
        view.stats.confirmed_count, view.stats.requested_count
    ));

    let declined = services
        .signups
        .perform_decline(&shift_id(GATE), user("u-eve"), anchor)?;
    log.push(format!(
        "u-eve withdrew from {GATE}: {}",
        declined.state().label()
    ));

    services
        .signups
        .add_participant(&shift_id(SETUP), &UserId("u-bob".to_string()), anchor)?;
    log.push(format!("u-bob added to {SETUP} by the dispatcher"));

    let mut overviews = Vec::new();
    for event in [FESTIVAL, BLOOD_DRIVE] {
        overviews.push(services.events.event_overview(&EventId(event.to_string()))?);
    }

    let finished = services.signups.finish_elapsed(anchor + Duration::days(5))?;

    let mut working_hours = Vec::new();
    for profile in store.users()? {
        working_hours.push(services.users.working_hours(&profile.id)?);
    }

    let sent = notifications.sent();
    let notifications = [
        NotificationKind::NewEvent,
        NotificationKind::ResponsibleParticipationRequested,
        NotificationKind::ParticipationConfirmed,
        NotificationKind::ParticipationRejected,
        NotificationKind::ParticipationFinished,
    ]
    .into_iter()
    .map(|kind| {
        let count = sent
            .iter()
            .filter(|notification| notification.kind == kind)
            .count();
        (kind, count)
    })
    .collect();

    Ok(DemoOutcome {
        log,
        overviews,
        finished,
        working_hours,
        notifications,
    })
}

/// Two events around `anchor`: an inactive festival with three shifts and an active blood drive.
pub(crate) fn seed_demo_data(
    store: &InMemoryStore,
    anchor: DateTime<Utc>,
) -> Result<(), RepositoryError> {
    store.add_event_type(EventType {
        id: EventTypeId("service".to_string()),
        title: "Medical service".to_string(),
        can_grant_qualification: false,
    })?;

    store.add_qualification(Qualification {
        id: QualificationId("first-aid".to_string()),
        title: "First aider".to_string(),
        abbreviation: "FA".to_string(),
        category: "medical".to_string(),
        includes: Vec::new(),
    })?;
    store.add_qualification(Qualification {
        id: QualificationId("paramedic".to_string()),
        title: "Paramedic".to_string(),
        abbreviation: "PM".to_string(),
        category: "medical".to_string(),
        includes: vec![QualificationId("first-aid".to_string())],
    })?;

    let today = anchor.date_naive();
    for (id, first, last, age) in [
        ("u-ada", "Ada", "Lovelace", 34),
        ("u-bob", "Bob", "Ross", 41),
        ("u-cat", "Cat", "Stevens", 14),
        ("u-dan", "Dan", "Brown", 47),
        ("u-eve", "Eve", "Curie", 29),
    ] {
        store.add_user(UserProfile {
            id: UserId(id.to_string()),
            email: format!("{}@shiftboard.example", first.to_ascii_lowercase()),
            first_name: first.to_string(),
            last_name: last.to_string(),
            date_of_birth: years_before(today, age),
            phone: None,
            is_active: true,
            is_visible: true,
            is_staff: false,
        })?;
    }

    for (user, qualification) in [("u-ada", "paramedic"), ("u-dan", "first-aid")] {
        store.grant(QualificationGrant {
            user: UserId(user.to_string()),
            qualification: QualificationId(qualification.to_string()),
            expires: Some(anchor + Duration::days(365)),
        })?;
    }
    store.add_working_hours(WorkingHours {
        user: UserId("u-bob".to_string()),
        hours: 2.5,
        reason: "Vehicle maintenance".to_string(),
        date: today,
    })?;

    store.add_event(Event {
        id: EventId(FESTIVAL.to_string()),
        title: "Summer festival".to_string(),
        description: Some("First aid coverage for the open air stage".to_string()),
        location: "Riverside park".to_string(),
        event_type: EventTypeId("service".to_string()),
        active: false,
        mail_updates: true,
        responsibles: vec!["dispatch@shiftboard.example".to_string()],
    })?;
    store.add_event(Event {
        id: EventId(BLOOD_DRIVE.to_string()),
        title: "Blood drive".to_string(),
        description: None,
        location: "Town hall".to_string(),
        event_type: EventTypeId("service".to_string()),
        active: true,
        mail_updates: false,
        responsibles: Vec::new(),
    })?;

    let hours = |offset: i64| anchor + Duration::minutes(offset * 30);
    let shifts = [
        (
            SETUP,
            FESTIVAL,
            "Setup crew",
            "no_selfservice",
            (48, 48, 56),
            json!({ "maximum_number_of_participants": 2 }),
        ),
        (
            GATE,
            FESTIVAL,
            "Gate",
            "request_confirm",
            (95, 97, 108),
            json!({
                "minimum_number_of_participants": 1,
                "maximum_number_of_participants": 2,
            }),
        ),
        (
            TENT,
            FESTIVAL,
            "First aid tent",
            "instant_confirmation",
            (94, 96, 112),
            json!({
                "maximum_number_of_participants": 3,
                "required_qualification_ids": ["first-aid"],
            }),
        ),
        (
            DONORS,
            BLOOD_DRIVE,
            "Donor reception",
            "instant_confirmation",
            (144, 144, 152),
            Value::Null,
        ),
    ];
    for (id, event, label, method, (meeting, start, end), configuration) in shifts {
        store.add_shift(Shift {
            id: shift_id(id),
            event: EventId(event.to_string()),
            label: Some(label.to_string()),
            meeting_time: hours(meeting),
            start_time: hours(start),
            end_time: hours(end),
            signup_method_slug: method.to_string(),
            signup_configuration: configuration,
        })?;
    }

    Ok(())
}

fn years_before(day: NaiveDate, years: i64) -> NaiveDate {
    day - Duration::days(years * 365)
}

fn shift_id(raw: &str) -> ShiftId {
    ShiftId(raw.to_string())
}

fn user(raw: &str) -> ParticipantRequest {
    ParticipantRequest::UserId(UserId(raw.to_string()))
}

fn guest(anchor: DateTime<Utc>) -> ParticipantRequest {
    ParticipantRequest::Guest(GuestRegistration {
        email: "walk-in@shiftboard.example".to_string(),
        first_name: "Robin".to_string(),
        last_name: "Walker".to_string(),
        date_of_birth: years_before(anchor.date_naive(), 30),
    })
}

fn describe(request: &ParticipantRequest) -> String {
    match request {
        ParticipantRequest::UserId(id) => id.to_string(),
        ParticipantRequest::Guest(guest) => format!("guest {}", guest.email),
    }
}
