use super::qualification_checks;
use crate::signup::checks::{SignupCheck, SignupContext};
use crate::signup::configuration::SignupConfiguration;
use crate::signup::method::{Admission, SignupMethod};

/// Participants request a place; responsibles confirm or decline in the disposition.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestConfirmSignupMethod;

impl RequestConfirmSignupMethod {
    pub const SLUG: &'static str = "request_confirm";
}

impl SignupMethod for RequestConfirmSignupMethod {
    fn slug(&self) -> &'static str {
        Self::SLUG
    }

    fn verbose_name(&self) -> &'static str {
        "Request and confirm"
    }

    fn description(&self) -> &'static str {
        "This method lets people request participation. Responsibles can then confirm the participation."
    }

    fn registration_button_text(&self) -> &'static str {
        "Request"
    }

    fn signup_checks(&self) -> Vec<SignupCheck> {
        qualification_checks()
    }

    fn admission(&self, _ctx: &SignupContext<'_>) -> Admission {
        Admission::Pending
    }

    fn participant_count_bounds(&self, config: &SignupConfiguration) -> (Option<u32>, Option<u32>) {
        (
            config.minimum_number_of_participants,
            config.maximum_number_of_participants,
        )
    }
}
