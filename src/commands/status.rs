//! Implementation of the `roadlock status` command.

use super::{Session, format_ms, print_json, resolve_user_id};
use crate::cli::HolderArgs;
use crate::error::Result;

pub fn cmd_status(args: HolderArgs, json: bool) -> Result<()> {
    let session = Session::open()?;
    let user_id = resolve_user_id(&args.user)?;

    let status = session.service.status(&args.roadmap, &user_id)?;

    if json {
        return print_json(&status);
    }

    match (&status.lock_holder, status.expires_in) {
        (Some(holder), Some(expires_in)) if status.is_locked => {
            println!(
                "'{}' is locked by {} <{}>{}; expires in {}.",
                args.roadmap,
                holder.user_name,
                holder.user_id,
                if status.is_own_lock { " (you)" } else { "" },
                format_ms(expires_in)
            );
        }
        _ => println!("'{}' is not locked.", args.roadmap),
    }
    Ok(())
}
