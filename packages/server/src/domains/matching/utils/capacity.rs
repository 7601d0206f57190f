use crate::domains::matching::errors::MatchError;
use crate::domains::member::models::Member;

/// Fail with `MentorCapacityReached` when the mentor has no free slot.
///
/// Unset capacity means 3, unset active count means 0. Only the mentor's
/// own accept is gated; a mentee accept never consults this.
pub fn ensure_mentor_capacity(mentor: &Member) -> Result<(), MatchError> {
    let capacity = mentor.effective_capacity();
    let active = mentor.effective_active_mentees();

    if active >= capacity {
        return Err(MatchError::MentorCapacityReached { capacity, active });
    }

    Ok(())
}
