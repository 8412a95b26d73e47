//! The gym's background jobs.

use gymjobs_core::ConfigResult;
use gymjobs_functions::JobDescriptor;

pub mod memberships;
pub mod streaks;
pub mod welcome;

/// Every job the app registers, in registration order.
pub fn all() -> ConfigResult<Vec<JobDescriptor>> {
    Ok(vec![
        welcome::send_welcome_email()?,
        streaks::update_check_in_streak()?,
        memberships::expire_memberships()?,
    ])
}
