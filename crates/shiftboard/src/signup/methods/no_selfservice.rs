use crate::signup::checks::{ParticipationError, SignupCheck, SignupContext};
use crate::signup::configuration::SignupConfiguration;
use crate::signup::method::{Admission, SignupMethod};

/// Only responsibles put people on the shift, through the disposition.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSelfServiceSignupMethod;

impl NoSelfServiceSignupMethod {
    pub const SLUG: &'static str = "no_selfservice";
}

fn check_self_service(_ctx: &SignupContext<'_>) -> Option<ParticipationError> {
    Some(ParticipationError::SelfServiceDisabled)
}

impl SignupMethod for NoSelfServiceSignupMethod {
    fn slug(&self) -> &'static str {
        Self::SLUG
    }

    fn verbose_name(&self) -> &'static str {
        "No self-service"
    }

    fn description(&self) -> &'static str {
        "Participants cannot sign up themselves. Responsibles add participants in the disposition."
    }

    fn signup_checks(&self) -> Vec<SignupCheck> {
        let check: SignupCheck = check_self_service;
        vec![check]
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
