//! Bridge from room member notifications to status observations.

use brewery_core::{MemberEvent, MemberEventKind, WorkerStatus};

/// Status to feed the processor for `event`, if any.
///
/// Joins and property changes only count when the member's presence carries
/// the worker status extension; most presence updates are unrelated and are
/// skipped. Departures always read as `Undefined` regardless of presence.
pub fn status_update(event: &MemberEvent) -> Option<WorkerStatus> {
    match event.kind {
        MemberEventKind::Joined | MemberEventKind::PropertyChanged => {
            event.member.presence.as_ref()?.worker_status()
        }
        MemberEventKind::Left | MemberEventKind::Kicked | MemberEventKind::Quit => {
            Some(WorkerStatus::Undefined)
        }
    }
}
