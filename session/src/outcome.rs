//! Results of state-changing session operations.
//!
//! Each variant maps to a different thing to tell the user: retry later,
//! not allowed, already over, or done.

use votebox_types::TallyEntry;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Vote confirmed; tally read right after it.
    Counted(Vec<TallyEntry>),
    /// Vote confirmed, but the tally could not be read afterwards.
    Recorded,
    /// The voter had already voted; nothing was sent.
    AlreadyVoted,
    /// The contract reverted the vote, or the vote left no trace.
    Rejected,
    /// The poll was closed before the vote could land.
    Closed,
    /// The remote environment could not be reached or gave no answer.
    Unavailable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Contract destroyed; tally as read immediately before destruction.
    Finalized(Vec<TallyEntry>),
    /// Requester is not the owner. The session is untouched.
    Denied,
    /// The poll had already been closed, by this request's owner or a
    /// concurrent one.
    Closed,
    /// Unknown address or a failed remote call. The session, if it exists,
    /// is untouched.
    Unavailable,
}
