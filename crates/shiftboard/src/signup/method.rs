use serde::Serialize;

use super::checks::{
    collect_errors, default_decline_checks, default_signup_checks, ParticipationError,
    SignupCheck, SignupContext,
};
use super::configuration::SignupConfiguration;
use super::views::{DispositionView, MethodLabels, ShiftStateView, ShiftView};
use crate::events::participation::ParticipationState;

/// Outcome of a signup that passed every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    Confirmed,
    Pending,
}

impl Admission {
    pub const fn state(self) -> ParticipationState {
        match self {
            Admission::Confirmed => ParticipationState::Confirmed,
            Admission::Pending => ParticipationState::Requested,
        }
    }
}

/// Policy deciding how participation requests for a shift are accepted.
///
/// Implementations are contributed by plugins and looked up by [`SignupMethod::slug`].
pub trait SignupMethod: Send + Sync {
    fn slug(&self) -> &'static str;

    fn verbose_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn registration_button_text(&self) -> &'static str {
        "Sign up"
    }

    /// Managers may confirm, decline, and add participants.
    fn supports_disposition(&self) -> bool {
        true
    }

    fn signup_checks(&self) -> Vec<SignupCheck> {
        default_signup_checks()
    }

    fn decline_checks(&self) -> Vec<SignupCheck> {
        default_decline_checks()
    }

    fn signup_errors(&self, ctx: &SignupContext<'_>) -> Vec<ParticipationError> {
        collect_errors(&self.signup_checks(), ctx)
    }

    fn decline_errors(&self, ctx: &SignupContext<'_>) -> Vec<ParticipationError> {
        collect_errors(&self.decline_checks(), ctx)
    }

    /// Whether a request that passed the checks is confirmed right away or left pending.
    fn admission(&self, ctx: &SignupContext<'_>) -> Admission;

    /// Minimum and maximum head count, where the method knows them.
    fn participant_count_bounds(&self, _config: &SignupConfiguration) -> (Option<u32>, Option<u32>) {
        (None, None)
    }

    fn labels(&self) -> MethodLabels {
        MethodLabels {
            slug: self.slug(),
            verbose_name: self.verbose_name(),
            registration_button_text: self.registration_button_text(),
            supports_disposition: self.supports_disposition(),
        }
    }

    fn render_shift_state(&self, view: &ShiftView<'_>) -> ShiftStateView {
        ShiftStateView::build(
            self.labels(),
            self.participant_count_bounds(view.config),
            view,
        )
    }

    fn disposition_view(&self, view: &ShiftView<'_>) -> Option<DispositionView> {
        if !self.supports_disposition() {
            return None;
        }
        Some(DispositionView::build(
            self.slug(),
            self.participant_count_bounds(view.config),
            view,
        ))
    }
}

/// Listing entry for available signup methods.
#[derive(Debug, Clone, Serialize)]
pub struct SignupMethodSummary {
    pub slug: &'static str,
    pub verbose_name: &'static str,
    pub description: &'static str,
    pub supports_disposition: bool,
}

impl SignupMethodSummary {
    pub fn of(method: &dyn SignupMethod) -> Self {
        Self {
            slug: method.slug(),
            verbose_name: method.verbose_name(),
            description: method.description(),
            supports_disposition: method.supports_disposition(),
        }
    }
}
