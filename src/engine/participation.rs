//! Effective attendance

use crate::models::event::{Event, Participant, ParticipantKind, ParticipantStatus};

/// Whether `participant` counts as attending an event created by `creator_id`.
///
/// Placeholders and the creator often never get an explicit `accepted`
/// status, so they count on their own; an `invited` status always excludes.
pub fn is_effective(participant: &Participant, creator_id: &str) -> bool {
    if participant.status == ParticipantStatus::Invited {
        return false;
    }

    participant.status == ParticipantStatus::Accepted
        || participant.kind == ParticipantKind::NonUser
        || participant.id == creator_id
}

/// Number of effective participants of `event`; this is the popularity key.
pub fn effective_count(event: &Event) -> usize {
    event
        .participants
        .iter()
        .filter(|participant| is_effective(participant, &event.creator_id))
        .count()
}
