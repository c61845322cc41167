//! Implementation of the `roadlock list` command.

use super::{Session, print_json};
use crate::error::Result;
use crate::locks::{LockInfo, WriteLockView};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListEntry {
    #[serde(flatten)]
    lock: WriteLockView,
    is_stale: bool,
    is_expired: bool,
}

impl From<LockInfo> for ListEntry {
    fn from(info: LockInfo) -> Self {
        Self {
            lock: WriteLockView {
                lock: info.lock,
                expires_in: info.expires_in,
            },
            is_stale: info.is_stale,
            is_expired: info.is_expired,
        }
    }
}

pub fn cmd_list(json: bool) -> Result<()> {
    let session = Session::open()?;
    let infos = session.service.list()?;

    if json {
        let entries: Vec<ListEntry> = infos.into_iter().map(ListEntry::from).collect();
        return print_json(&entries);
    }

    if infos.is_empty() {
        println!("No write locks.");
        return Ok(());
    }

    println!("Write locks ({}):", infos.len());
    for info in &infos {
        println!("  {}", info);
    }

    let expired = infos.iter().filter(|i| i.is_expired).count();
    if expired > 0 {
        println!();
        println!(
            "Note: {} lock(s) expired. Run `roadlock sweep` to reclaim them.",
            expired
        );
    }
    Ok(())
}
