use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use gymjobs_core::{ConfigResult, JobFunctionConfig, RateLimit};
use gymjobs_functions::{HandlerContext, JobDescriptor, create_event_handler};

use crate::services::{MemberDirectory, Notification, Notifier};

/// Streak lengths that earn a congratulation.
const MILESTONES: [u32; 4] = [7, 30, 100, 365];

#[derive(Debug, Clone, Deserialize)]
pub struct CheckedIn {
    pub member_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// One streak update per member per day, however often they scan in.
pub fn update_check_in_streak() -> ConfigResult<JobDescriptor> {
    let config = JobFunctionConfig::new("update-check-in-streak")?
        .with_name("Update check-in streak")
        .with_rate_limit(RateLimit::new(1, "1d")?.keyed_by("event.data.member_id")?);

    create_event_handler(config, "member.checked_in", handle)
}

async fn handle(ctx: HandlerContext<CheckedIn>) -> anyhow::Result<serde_json::Value> {
    let members = ctx.injector.resolve::<Arc<MemberDirectory>>()?;
    let checked_in = ctx.payload;

    let member_id = checked_in.member_id.clone();
    let streak: u32 = ctx
        .step
        .run("record-check-in", move || async move {
            anyhow::Ok(members.record_check_in(&member_id))
        })
        .await?;

    if let (true, Some(email)) = (MILESTONES.contains(&streak), checked_in.email) {
        let notifier = ctx.injector.resolve::<Arc<dyn Notifier>>()?;
        ctx.step
            .run("congratulate", move || async move {
                notifier
                    .send(Notification {
                        to: email,
                        template: "streak-milestone".to_string(),
                        data: json!({ "streak": streak }),
                    })
                    .await
            })
            .await?;
    }

    Ok(json!({ "member_id": checked_in.member_id, "streak": streak }))
}
