//! Signup methods shipped with the `basesignup` plugin.

mod instant;
mod no_selfservice;
mod request_confirm;

pub use instant::InstantConfirmationSignupMethod;
pub use no_selfservice::NoSelfServiceSignupMethod;
pub use request_confirm::RequestConfirmSignupMethod;

use super::checks::{check_qualification, default_signup_checks, SignupCheck};

/// Default checks plus the required-qualification check.
fn qualification_checks() -> Vec<SignupCheck> {
    let mut checks = default_signup_checks();
    checks.push(check_qualification);
    checks
}
