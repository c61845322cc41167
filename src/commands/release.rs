//! Implementation of the `roadlock release` command.

use super::{Session, print_json, resolve_user_id};
use crate::cli::ReleaseArgs;
use crate::clock::Clock;
use crate::error::Result;
use crate::events::{Event, EventAction};
use crate::locks::ReleaseOutcome;
use serde_json::json;

pub fn cmd_release(args: ReleaseArgs, json: bool) -> Result<()> {
    let session = Session::open()?;
    let user_id = resolve_user_id(&args.user)?;

    let outcome = run_release(&session, &args.roadmap, &user_id, args.force)?;

    if json {
        let value = match &outcome {
            ReleaseOutcome::Released { lock, forced } => json!({
                "released": true,
                "forced": forced,
                "lock": lock,
            }),
            ReleaseOutcome::NotLocked => json!({"released": false}),
        };
        return print_json(&value);
    }

    match outcome {
        ReleaseOutcome::Released { lock, forced: true } => println!(
            "Force-released write lock on '{}' (was held by {} <{}>).",
            args.roadmap, lock.holder_name, lock.holder_id
        ),
        ReleaseOutcome::Released { .. } => {
            println!("Released write lock on '{}'.", args.roadmap)
        }
        ReleaseOutcome::NotLocked => println!("'{}' was not locked.", args.roadmap),
    }
    Ok(())
}

pub(crate) fn run_release<C: Clock>(
    session: &Session<C>,
    roadmap_id: &str,
    user_id: &str,
    force: bool,
) -> Result<ReleaseOutcome> {
    let outcome = session.service.release(roadmap_id, user_id, force)?;

    if let ReleaseOutcome::Released { lock, forced } = &outcome {
        let action = if *forced {
            EventAction::ForceRelease
        } else {
            EventAction::Release
        };
        session.record(
            Event::new(action)
                .with_roadmap(roadmap_id)
                .with_details(json!({
                    "user_id": user_id,
                    "holder_id": lock.holder_id,
                    "lock_id": lock.id,
                })),
        );
    }

    Ok(outcome)
}
