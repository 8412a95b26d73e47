//! Describe → register → run, through the in-process runtime.

use std::sync::{Arc, Mutex};

use gymjobs_core::{FunctionId, JobEvent, JobFunctionConfig, RateLimit};
use gymjobs_functions::{
    BuildContext, HandlerContext, InProcessRuntime, Injector, RetryPolicy, RunOutcome,
    create_cron_handler, create_event_handler, register_handlers,
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Default)]
struct Outbox(Mutex<Vec<String>>);

#[derive(Deserialize)]
struct CheckedIn {
    member_id: String,
}

fn bootstrap() -> anyhow::Result<(Arc<InProcessRuntime>, BuildContext, Arc<Outbox>)> {
    let runtime = Arc::new(InProcessRuntime::new("gym-app").with_retry_policy(RetryPolicy::immediate()));
    let outbox = Arc::new(Outbox::default());
    let injector = Injector::new().with(outbox.clone());
    let mut ctx = BuildContext::new(runtime.clone(), injector);

    let streak = create_event_handler(
        JobFunctionConfig::new("update-streak")?
            .with_rate_limit(RateLimit::new(1, "1d")?.keyed_by("event.data.member_id")?),
        "member.checked_in",
        |ctx: HandlerContext<CheckedIn>| async move {
            let outbox = ctx.injector.resolve::<Arc<Outbox>>()?;
            outbox.0.lock().unwrap().push(ctx.payload.member_id.clone());
            Ok(json!({ "member": ctx.payload.member_id }))
        },
    )?;

    let vip = create_event_handler(
        JobFunctionConfig::new("vip-greeting")?,
        "member.checked_in",
        |ctx: HandlerContext<Value>| async move { Ok(ctx.payload["tier"].clone()) },
    )?
    .when("event.data.tier == \"vip\"")?;

    let sweep = create_cron_handler(
        JobFunctionConfig::new("expire-memberships")?
            .with_concurrency(1)?
            .with_retries(1)?,
        "0 3 * * *",
        |ctx: HandlerContext<Value>| async move {
            if ctx.attempt == 0 {
                anyhow::bail!("database busy");
            }
            Ok(ctx.attempt)
        },
    )?;

    register_handlers(&mut ctx, [streak, vip, sweep])?;
    Ok((runtime, ctx, outbox))
}

#[tokio::test]
async fn registered_functions_run_through_the_runtime() {
    let (runtime, ctx, outbox) = bootstrap().unwrap();
    assert_eq!(ctx.handler_count(), 3);
    assert_eq!(runtime.function_count(), 3);

    let reports = runtime
        .send(JobEvent::new("member.checked_in", json!({ "member_id": "m-1", "tier": "vip" })))
        .await;
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.is_completed()));

    let again = runtime
        .send(JobEvent::new("member.checked_in", json!({ "member_id": "m-1", "tier": "basic" })))
        .await;
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].outcome, RunOutcome::RateLimited);

    assert_eq!(*outbox.0.lock().unwrap(), ["m-1"]);

    let tick = runtime
        .tick(&FunctionId::new("expire-memberships").unwrap())
        .await
        .unwrap();
    assert_eq!(tick.attempts, 2);
    assert_eq!(tick.outcome, RunOutcome::Completed { output: json!(1) });
}

#[test]
fn registry_outlives_the_build_context() {
    let (_, ctx, _) = bootstrap().unwrap();
    let registry = Arc::new(ctx.into_registry());

    let ids: Vec<_> = registry.iter().map(|f| f.id().to_string()).collect();
    assert_eq!(ids, ["update-streak", "vip-greeting", "expire-memberships"]);
    assert_eq!(
        registry.get(&FunctionId::new("vip-greeting").unwrap()).unwrap().handle(),
        "gym-app-vip-greeting"
    );
}
