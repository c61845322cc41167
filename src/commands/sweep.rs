//! Implementation of the `roadlock sweep` and `roadlock watch` commands.
//!
//! Both run the [`ExpiryScheduler`] against the state directory's store:
//! `sweep` once, `watch` on its interval until the process is interrupted.

use super::{Session, print_json};
use crate::cli::WatchArgs;
use crate::clock::Clock;
use crate::error::{Result, RoadlockError};
use crate::events::{Event, EventAction, record_event};
use crate::locks::WriteLock;
use crate::scheduler::{ExpiryScheduler, SweepReport};
use crate::store::FileLockStore;
use chrono::Duration;
use serde_json::{Value, json};
use std::sync::Arc;
use std::thread;

pub fn cmd_sweep(json: bool) -> Result<()> {
    let session = Session::open()?;
    let report = build_scheduler(&session, false).sweep_once();
    print_report(&report, json)
}

pub fn cmd_watch(args: WatchArgs, json: bool) -> Result<()> {
    let session = Session::open()?;
    let mut scheduler = build_scheduler(&session, !json);

    if let Some(ms) = args.interval_ms {
        let ttl_ms = session.service.policy().ttl().num_milliseconds();
        let ms = i64::try_from(ms).unwrap_or(i64::MAX);
        if ms <= 0 || ms >= ttl_ms {
            return Err(RoadlockError::UserError(format!(
                "--interval-ms must be between 1 and {} (the lock TTL)",
                ttl_ms - 1
            )));
        }
        let policy = scheduler
            .policy()
            .with_sweep_interval(Duration::milliseconds(ms));
        scheduler = scheduler.with_policy(policy);
    }

    if args.once {
        return print_report(&scheduler.sweep_once(), json);
    }

    eprintln!("roadlock watch started");
    eprintln!("  state:    {}", session.ctx.state_dir.display());
    eprintln!(
        "  interval: {}ms",
        scheduler.policy().sweep_interval().num_milliseconds()
    );
    eprintln!();

    let _handle = scheduler.spawn().map_err(|e| {
        RoadlockError::UserError(format!("failed to start sweeper thread: {}", e))
    })?;

    // The sweeper runs until the process is interrupted.
    loop {
        thread::park();
    }
}

/// Scheduler over the session's store whose reclamations land in the audit
/// log (and on stdout when `announce` is set).
pub(crate) fn build_scheduler<C: Clock + Clone + 'static>(
    session: &Session<C>,
    announce: bool,
) -> ExpiryScheduler<FileLockStore, C> {
    let ctx = session.ctx.clone();
    let audit = session.config.audit_log;
    let clock = session.service.clock().clone();

    let hook = Arc::new(move |lock: &WriteLock| {
        if announce {
            println!(
                "Reclaimed expired lock on '{}' (held by {} <{}>).",
                lock.roadmap_id, lock.holder_name, lock.holder_id
            );
        }
        if audit {
            record_event(
                &ctx,
                &Event::new(EventAction::Reclaim)
                    .at(clock.now())
                    .with_roadmap(&lock.roadmap_id)
                    .with_details(json!({
                        "holder_id": lock.holder_id,
                        "lock_id": lock.id,
                        "expired_at": lock.expires_at,
                    })),
            );
        }
    });

    ExpiryScheduler::new(
        session.service.store().clone(),
        session.service.clock().clone(),
        *session.service.policy(),
    )
    .on_reclaim(hook)
}

fn print_report(report: &SweepReport, json: bool) -> Result<()> {
    if json {
        return print_json(&report_json(report));
    }

    if report.reclaimed.is_empty() {
        println!("No expired locks ({} checked).", report.scanned);
    } else {
        println!("Reclaimed {} expired lock(s):", report.reclaimed.len());
        for lock in &report.reclaimed {
            println!(
                "  {} (holder: {} <{}>, expired {})",
                lock.roadmap_id,
                lock.holder_name,
                lock.holder_id,
                lock.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    for roadmap_id in &report.contended {
        println!("  {} busy; will retry on the next sweep", roadmap_id);
    }
    for (roadmap_id, error) in &report.errors {
        eprintln!("Warning: {}: {}", roadmap_id, error);
    }
    Ok(())
}

fn report_json(report: &SweepReport) -> Value {
    json!({
        "scanned": report.scanned,
        "reclaimed": report.reclaimed,
        "contended": report.contended,
        "errors": report
            .errors
            .iter()
            .map(|(roadmap_id, e)| json!({
                "roadmapId": roadmap_id,
                "kind": e.kind(),
                "message": e.to_string(),
            }))
            .collect::<Vec<_>>(),
    })
}
