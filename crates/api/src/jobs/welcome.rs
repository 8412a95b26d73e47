use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use gymjobs_core::{ConfigResult, JobFunctionConfig};
use gymjobs_functions::{HandlerContext, JobDescriptor, create_event_handler};

use crate::services::{Notification, Notifier};

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreated {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Welcome mail for new members; staff accounts are skipped.
pub fn send_welcome_email() -> ConfigResult<JobDescriptor> {
    let config = JobFunctionConfig::new("send-welcome-email")?
        .with_name("Send welcome email")
        .with_retries(3)?;

    create_event_handler(config, "user.created", handle)?.when("event.data.role == \"member\"")
}

async fn handle(ctx: HandlerContext<UserCreated>) -> anyhow::Result<serde_json::Value> {
    let notifier = ctx.injector.resolve::<Arc<dyn Notifier>>()?;
    let user = ctx.payload;

    let notification = Notification {
        to: user.email.clone(),
        template: "welcome".to_string(),
        data: json!({ "name": user.name.as_deref().unwrap_or("there") }),
    };

    ctx.step
        .run("send-email", move || async move {
            notifier.send(notification).await?;
            anyhow::Ok(())
        })
        .await?;

    ctx.logger.log(&format!("welcomed user {}", user.user_id));
    Ok(json!({ "user_id": user.user_id, "sent": true }))
}
