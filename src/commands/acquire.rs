//! Implementation of the `roadlock acquire` command.

use super::{Session, format_ms, print_json, resolve_holder};
use crate::cli::AcquireArgs;
use crate::clock::Clock;
use crate::error::Result;
use crate::events::{Event, EventAction};
use crate::locks::{AcquireKind, Acquired, LockHolder, WriteLockView};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AcquireOutput {
    outcome: &'static str,
    #[serde(flatten)]
    lock: WriteLockView,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_holder: Option<LockHolder>,
}

pub fn cmd_acquire(args: AcquireArgs, json: bool) -> Result<()> {
    let session = Session::open()?;
    let holder = resolve_holder(&args.user, args.name.as_deref())?;

    let acquired = run_acquire(&session, &args.roadmap, &holder)?;
    let view = acquired.lock.view(session.service.now());

    if json {
        let previous_holder = match &acquired.kind {
            AcquireKind::TakenOver { previous, .. } => Some(previous.clone()),
            _ => None,
        };
        return print_json(&AcquireOutput {
            outcome: outcome_name(&acquired.kind),
            lock: view,
            previous_holder,
        });
    }

    match &acquired.kind {
        AcquireKind::Granted => println!("Acquired write lock on '{}'.", args.roadmap),
        AcquireKind::Renewed => println!("Renewed write lock on '{}'.", args.roadmap),
        AcquireKind::TakenOver {
            previous,
            was_expired,
        } => println!(
            "Took over write lock on '{}' from {} <{}> ({}).",
            args.roadmap,
            previous.user_name,
            previous.user_id,
            if *was_expired { "expired" } else { "stale" }
        ),
    }
    println!("  Holder:     {} <{}>", view.lock.holder_name, view.lock.holder_id);
    println!("  Acquired:   {}", view.lock.acquired_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Expires in: {}", format_ms(view.expires_in));
    println!();
    println!(
        "Keep it alive with `roadlock heartbeat {}` at least every {}s.",
        args.roadmap,
        session.service.policy().stale_threshold().num_seconds()
    );

    Ok(())
}

/// Acquire through the session's service and log the transition.
pub(crate) fn run_acquire<C: Clock>(
    session: &Session<C>,
    roadmap_id: &str,
    holder: &LockHolder,
) -> Result<Acquired> {
    let acquired = session.service.acquire(roadmap_id, holder)?;

    let (action, mut details) = match &acquired.kind {
        AcquireKind::Granted => (EventAction::Acquire, json!({})),
        AcquireKind::Renewed => (EventAction::Renew, json!({})),
        AcquireKind::TakenOver {
            previous,
            was_expired,
        } => (
            EventAction::Takeover,
            json!({
                "previous_user_id": previous.user_id,
                "previous_user_name": previous.user_name,
                "was_expired": was_expired,
            }),
        ),
    };
    details["user_id"] = json!(holder.user_id);
    details["lock_id"] = json!(acquired.lock.id);
    details["expires_at"] = json!(acquired.lock.expires_at);

    session.record(
        Event::new(action)
            .with_roadmap(roadmap_id)
            .with_details(details),
    );

    Ok(acquired)
}

fn outcome_name(kind: &AcquireKind) -> &'static str {
    match kind {
        AcquireKind::Granted => "granted",
        AcquireKind::Renewed => "renewed",
        AcquireKind::TakenOver { .. } => "taken_over",
    }
}
