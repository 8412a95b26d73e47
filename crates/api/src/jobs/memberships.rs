use std::sync::Arc;

use serde_json::{Value, json};

use gymjobs_core::{ConfigResult, JobFunctionConfig};
use gymjobs_functions::{HandlerContext, JobDescriptor, create_cron_handler};

use crate::services::{MemberDirectory, Membership, Notification, Notifier};

/// Nightly sweep deactivating lapsed memberships. Runs one at a time so two
/// sweeps never race on the same members.
pub fn expire_memberships() -> ConfigResult<JobDescriptor> {
    let config = JobFunctionConfig::new("expire-memberships")?
        .with_name("Expire memberships")
        .with_concurrency(1)?
        .with_retries(2)?;

    create_cron_handler(config, "TZ=Europe/Madrid 0 3 * * *", handle)
}

async fn handle(ctx: HandlerContext<Value>) -> anyhow::Result<Value> {
    let members = ctx.injector.resolve::<Arc<MemberDirectory>>()?;
    let notifier = ctx.injector.resolve::<Arc<dyn Notifier>>()?;

    let today = ctx.event.ts.date_naive();
    let expired: Vec<Membership> = ctx
        .step
        .run("expire-due", move || async move { anyhow::Ok(members.expire_due(today)) })
        .await?;

    for membership in &expired {
        let notifier = notifier.clone();
        let notification = Notification {
            to: membership.email.clone(),
            template: "membership-expired".to_string(),
            data: json!({ "expired_on": membership.expires_on }),
        };
        ctx.step
            .run(&format!("notify-{}", membership.member_id), move || async move {
                notifier.send(notification).await
            })
            .await?;
    }

    ctx.logger.log(&format!("expired {} memberships", expired.len()));
    Ok(json!({ "expired": expired.len() }))
}
