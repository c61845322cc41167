//! Implementation of the `roadlock heartbeat` command.

use super::{Session, format_ms, print_json, resolve_user_id};
use crate::cli::HolderArgs;
use crate::clock::Clock;
use crate::error::Result;
use crate::events::{Event, EventAction};
use crate::locks::WriteLock;
use serde_json::json;

pub fn cmd_heartbeat(args: HolderArgs, json: bool) -> Result<()> {
    let session = Session::open()?;
    let user_id = resolve_user_id(&args.user)?;

    let lock = run_heartbeat(&session, &args.roadmap, &user_id)?;
    let view = lock.view(session.service.now());

    if json {
        return print_json(&view);
    }

    println!(
        "Heartbeat recorded for '{}'; expires in {}.",
        args.roadmap,
        format_ms(view.expires_in)
    );
    Ok(())
}

pub(crate) fn run_heartbeat<C: Clock>(
    session: &Session<C>,
    roadmap_id: &str,
    user_id: &str,
) -> Result<WriteLock> {
    let lock = session.service.heartbeat(roadmap_id, user_id)?;

    session.record(
        Event::new(EventAction::Heartbeat)
            .with_roadmap(roadmap_id)
            .with_details(json!({
                "user_id": user_id,
                "lock_id": lock.id,
                "expires_at": lock.expires_at,
            })),
    );

    Ok(lock)
}
