use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::configuration::{signup_info, SignupConfiguration, SignupInfoEntry};
use super::disposition::Decision;
use crate::events::domain::{Event, Shift, ShiftId};
use crate::events::participation::{
    ParticipantRef, Participation, ParticipationId, ParticipationState,
};
use crate::events::stats::SignupStats;
use crate::users::qualifications::QualificationCatalog;

/// Read-only inputs for rendering a shift.
pub struct ShiftView<'a> {
    pub shift: &'a Shift,
    pub event: &'a Event,
    pub config: &'a SignupConfiguration,
    pub participations: &'a [Participation],
    pub catalog: &'a QualificationCatalog,
    /// Participant asking, so their own state can be shown.
    pub viewer: Option<&'a ParticipantRef>,
}

impl ShiftView<'_> {
    pub fn names_in(&self, state: ParticipationState) -> Vec<String> {
        self.participations
            .iter()
            .filter(|participation| participation.state() == state)
            .map(|participation| participation.display_name.clone())
            .collect()
    }

    /// Names of everyone holding a place, including finished participations.
    pub fn confirmed_names(&self) -> Vec<String> {
        self.participations
            .iter()
            .filter(|participation| participation.state().counts_as_confirmed())
            .map(|participation| participation.display_name.clone())
            .collect()
    }

    pub fn viewer_state(&self) -> Option<ParticipationState> {
        let viewer = self.viewer?;
        self.participations
            .iter()
            .find(|participation| &participation.participant == viewer)
            .map(Participation::state)
    }
}

/// Participant-facing status of a shift.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftStateView {
    pub shift_id: ShiftId,
    pub shift_label: String,
    pub signup_method: &'static str,
    pub signup_method_name: &'static str,
    pub registration_button_text: &'static str,
    pub stats: SignupStats,
    pub signup_info: Vec<SignupInfoEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_participants: Option<Vec<String>>,
    pub confirmed_participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_state: Option<ParticipationState>,
    pub disposition_available: bool,
}

/// Identity of a signup method as shown to users.
#[derive(Debug, Clone, Copy)]
pub struct MethodLabels {
    pub slug: &'static str,
    pub verbose_name: &'static str,
    pub registration_button_text: &'static str,
    pub supports_disposition: bool,
}

impl ShiftStateView {
    pub fn build(
        labels: MethodLabels,
        bounds: (Option<u32>, Option<u32>),
        view: &ShiftView<'_>,
    ) -> Self {
        Self {
            shift_id: view.shift.id.clone(),
            shift_label: view.shift.display_label(),
            signup_method: labels.slug,
            signup_method_name: labels.verbose_name,
            registration_button_text: labels.registration_button_text,
            stats: SignupStats::from_participations(view.participations, bounds),
            signup_info: signup_info(view.config, view.catalog),
            requested_participants: Some(view.names_in(ParticipationState::Requested)),
            confirmed_participants: view.confirmed_names(),
            own_state: view.viewer_state(),
            disposition_available: labels.supports_disposition,
        }
    }
}

/// Manager view of every participation on a shift.
#[derive(Debug, Clone, Serialize)]
pub struct DispositionView {
    pub shift_id: ShiftId,
    pub shift_label: String,
    pub event_title: String,
    pub signup_method: &'static str,
    pub stats: SignupStats,
    pub participations: Vec<DispositionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispositionEntry {
    pub participation_id: ParticipationId,
    pub participant: ParticipantRef,
    pub participant_name: String,
    pub state: ParticipationState,
    pub data: Map<String, Value>,
    pub allowed_decisions: Vec<Decision>,
}

impl DispositionView {
    pub fn build(
        slug: &'static str,
        bounds: (Option<u32>, Option<u32>),
        view: &ShiftView<'_>,
    ) -> Self {
        let participations = view
            .participations
            .iter()
            .map(|participation| DispositionEntry {
                participation_id: participation.id.clone(),
                participant: participation.participant.clone(),
                participant_name: participation.display_name.clone(),
                state: participation.state(),
                data: participation.data.clone(),
                allowed_decisions: Decision::allowed_from(participation.state()),
            })
            .collect();

        Self {
            shift_id: view.shift.id.clone(),
            shift_label: view.shift.display_label(),
            event_title: view.event.title.clone(),
            signup_method: slug,
            stats: SignupStats::from_participations(view.participations, bounds),
            participations,
        }
    }
}
