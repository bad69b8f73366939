use super::qualification_checks;
use crate::signup::checks::{check_maximum_number_of_participants, SignupCheck, SignupContext};
use crate::signup::configuration::SignupConfiguration;
use crate::signup::method::{Admission, SignupMethod};
use crate::signup::views::{ShiftStateView, ShiftView};

/// Confirms every signup that passes the checks, up to an optional maximum.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantConfirmationSignupMethod;

impl InstantConfirmationSignupMethod {
    pub const SLUG: &'static str = "instant_confirmation";
}

impl SignupMethod for InstantConfirmationSignupMethod {
    fn slug(&self) -> &'static str {
        Self::SLUG
    }

    fn verbose_name(&self) -> &'static str {
        "Instant Confirmation"
    }

    fn description(&self) -> &'static str {
        "This method instantly confirms every signup after it was requested."
    }

    fn signup_checks(&self) -> Vec<SignupCheck> {
        let mut checks = qualification_checks();
        checks.push(check_maximum_number_of_participants);
        checks
    }

    fn admission(&self, _ctx: &SignupContext<'_>) -> Admission {
        Admission::Confirmed
    }

    fn participant_count_bounds(&self, config: &SignupConfiguration) -> (Option<u32>, Option<u32>) {
        (None, config.maximum_number_of_participants)
    }

    fn render_shift_state(&self, view: &ShiftView<'_>) -> ShiftStateView {
        // Nobody waits for confirmation here, so the requested list is omitted.
        let mut state = ShiftStateView::build(
            self.labels(),
            self.participant_count_bounds(view.config),
            view,
        );
        state.requested_participants = None;
        state
    }
}
