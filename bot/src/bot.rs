//! Conversation dispatcher: one text message in, one reply out.

use std::fmt::Write;

use tracing::{debug, info};

use votebox_contract::ContractBackend;
use votebox_session::{
    FinalizeOutcome, LookupError, QueryError, Session, SessionManager, VoteOutcome,
    VotingBuilder,
};
use votebox_types::tally::{leaders, total_votes};
use votebox_types::{Address, Candidate, TallyEntry, UserId, ValidationError, MAX_CANDIDATES};

use crate::command::Command;
use crate::store::{UserState, UserStateStore, UserView};

pub const HELP: &str = "\
/new - start drafting a poll, then send one candidate name per message
/done - create the drafted poll
/cancel - drop the draft or leave the current poll
/open <address> - join an existing poll
/candidates - list the candidates
/vote <number> - vote for a candidate
/results - show the current tally
/voted - check whether you have voted
/close - close your poll and show the final results";

const RETRY: &str = "The voting network is not reachable right now. Please try again later.";
const NO_POLL: &str = "You are not in a poll. Start one with /new or join one with /open <address>.";
const FINISH_DRAFT: &str = "Finish your draft with /done or drop it with /cancel first.";

pub struct Bot<B> {
    manager: SessionManager<B>,
    users: UserStateStore<B>,
}

impl<B: ContractBackend> Bot<B> {
    pub fn new(manager: SessionManager<B>) -> Self {
        Self {
            manager,
            users: UserStateStore::new(),
        }
    }

    pub fn manager(&self) -> &SessionManager<B> {
        &self.manager
    }

    pub fn users(&self) -> &UserStateStore<B> {
        &self.users
    }

    /// Handle one message from `user` and produce the reply text.
    pub async fn handle(&self, user: UserId, text: &str) -> String {
        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(error) => return capitalize(&error.to_string()),
        };
        debug!(%user, ?command, "handling message");

        match command {
            Command::Help => HELP.to_string(),
            Command::New => self.start_draft(user).await,
            Command::Text(name) => self.add_candidate(user, &name).await,
            Command::Done => self.create_poll(user).await,
            Command::Cancel => match self.users.remove(user).await {
                Some(UserState::Drafting(_)) => "Draft discarded.".to_string(),
                Some(UserState::Active(session)) => {
                    format!("You left poll {}.", session.address())
                }
                None => "Nothing to cancel.".to_string(),
            },
            Command::Open(address) => self.open(user, address).await,
            Command::Candidates => {
                self.with_session(user, |session| async move {
                    let names = session.get_candidates().await?;
                    Ok::<_, QueryError>(format_candidates(&names))
                })
                .await
            }
            Command::Vote(choice) => {
                self.with_session(user, |session| async move {
                    vote(&session, user, choice).await
                })
                .await
            }
            Command::Results => {
                self.with_session(user, |session| async move {
                    let tally = session.get_candidates_votes().await?;
                    Ok::<_, QueryError>(format_tally(&tally))
                })
                .await
            }
            Command::Voted => {
                self.with_session(user, |session| async move {
                    Ok::<_, QueryError>(if session.has_voted(user).await? {
                        "You have voted in this poll.".to_string()
                    } else {
                        "You have not voted in this poll yet.".to_string()
                    })
                })
                .await
            }
            Command::Close => self.close(user).await,
        }
    }

    async fn start_draft(&self, user: UserId) -> String {
        let builder = VotingBuilder::new(user, self.manager.clone());
        self.users.insert(user, UserState::Drafting(builder)).await;
        format!(
            "New poll. Send up to {MAX_CANDIDATES} candidate names, one per message, then /done."
        )
    }

    async fn add_candidate(&self, user: UserId, name: &str) -> String {
        let added = self
            .users
            .with_draft(user, |builder| {
                builder.add_candidate(name).map(|added| (added, builder.len()))
            })
            .await;
        match added {
            Some(Ok((true, count))) => format!("Added {name:?} ({count}/{MAX_CANDIDATES})."),
            Some(Ok((false, _))) => {
                format!("The poll already has {MAX_CANDIDATES} candidates. Send /done to create it.")
            }
            Some(Err(error)) => format!("Cannot add that candidate: {error}."),
            None => "Send /help for the list of commands.".to_string(),
        }
    }

    /// Create the poll from a copy of the draft. The draft stays in the store
    /// until the poll exists, and is only replaced if the user has not
    /// changed it in the meantime.
    async fn create_poll(&self, user: UserId) -> String {
        let Some(draft) = self.users.with_draft(user, |builder| builder.clone()).await else {
            return "Nothing to create. Start a draft with /new.".to_string();
        };
        if draft.is_empty() {
            return "Add at least one candidate first.".to_string();
        }

        let names: Vec<Candidate> = draft.candidates().to_vec();
        let Some(session) = draft.get_voting().await else {
            return "The poll could not be created. Your draft is kept; send /done to retry."
                .to_string();
        };
        let address = session.address();
        if !self
            .users
            .replace_draft(user, &names, UserState::Active(session))
            .await
        {
            info!(%user, %address, "draft changed while its poll was being created");
            return format!(
                "Poll created at {address}. Your draft changed in the meantime and was kept; \
                 join the poll later with /open {address}"
            );
        }
        let names: Vec<String> = names.into_iter().map(String::from).collect();
        format!(
            "Poll created at {address}. Others can join with /open {address}\n{}",
            format_candidates(&names)
        )
    }

    async fn open(&self, user: UserId, address: Address) -> String {
        if let Some(UserView::Drafting { .. }) = self.users.get(user).await {
            return FINISH_DRAFT.to_string();
        }
        let session = match self.manager.lookup_session(address).await {
            Ok(session) => session,
            Err(LookupError::Unknown) => return format!("There is no open poll at {address}."),
            Err(LookupError::Closed) => return closed(address),
            Err(LookupError::Unavailable) => return RETRY.to_string(),
        };
        let listing = session.get_candidates().await;
        self.users.insert(user, UserState::Active(session)).await;
        match listing {
            Ok(names) => format!("Joined poll {address}.\n{}", format_candidates(&names)),
            Err(QueryError::Closed) => {
                self.users.remove_session(user, address).await;
                closed(address)
            }
            Err(QueryError::Unavailable) => {
                format!("Joined poll {address}. Send /candidates to see the choices.")
            }
        }
    }

    async fn close(&self, user: UserId) -> String {
        let session = match self.users.get(user).await {
            Some(UserView::Active(session)) => session,
            Some(UserView::Drafting { .. }) => return FINISH_DRAFT.to_string(),
            None => return NO_POLL.to_string(),
        };
        let address = session.address();
        match session.finalize(user).await {
            FinalizeOutcome::Finalized(tally) => {
                self.users.remove_session(user, address).await;
                format!("Poll closed. Final results:\n{}", format_tally(&tally))
            }
            FinalizeOutcome::Denied => "Only the creator of the poll can close it.".to_string(),
            FinalizeOutcome::Closed => {
                self.users.remove_session(user, address).await;
                closed(address)
            }
            FinalizeOutcome::Unavailable => RETRY.to_string(),
        }
    }

    /// Run `f` against the user's poll. A closed poll is dropped from the
    /// user's state; the user is not asked to retry.
    async fn with_session<F, Fut>(&self, user: UserId, f: F) -> String
    where
        F: FnOnce(Session<B>) -> Fut,
        Fut: std::future::Future<Output = Result<String, QueryError>>,
    {
        let session = match self.users.get(user).await {
            Some(UserView::Active(session)) => session,
            Some(UserView::Drafting { .. }) => return FINISH_DRAFT.to_string(),
            None => return NO_POLL.to_string(),
        };
        let address = session.address();
        match f(session).await {
            Ok(reply) => reply,
            Err(QueryError::Closed) => {
                self.users.remove_session(user, address).await;
                closed(address)
            }
            Err(QueryError::Unavailable) => RETRY.to_string(),
        }
    }
}

async fn vote<B: ContractBackend>(
    session: &Session<B>,
    user: UserId,
    choice: u64,
) -> Result<String, QueryError> {
    Ok(match session.vote_and_get_results(user, choice - 1).await {
        Ok(VoteOutcome::Counted(tally)) => format!("Vote counted.\n{}", format_tally(&tally)),
        Ok(VoteOutcome::Recorded) => {
            "Vote counted. The results cannot be shown right now.".to_string()
        }
        Ok(VoteOutcome::AlreadyVoted) => "You have already voted in this poll.".to_string(),
        Ok(VoteOutcome::Rejected) => "The poll did not accept this vote.".to_string(),
        Ok(VoteOutcome::Closed) => return Err(QueryError::Closed),
        Ok(VoteOutcome::Unavailable) => return Err(QueryError::Unavailable),
        Err(ValidationError::InvalidIndex { count, .. }) => {
            format!("Choose a number between 1 and {count}.")
        }
        Err(error) => format!("Invalid vote: {error}."),
    })
}

fn closed(address: Address) -> String {
    format!("Poll {address} has been closed. Start a new one with /new.")
}

fn format_candidates(names: &[String]) -> String {
    let mut out = String::new();
    for (i, name) in names.iter().enumerate() {
        let _ = writeln!(out, "{}. {name}", i + 1);
    }
    out.trim_end().to_string()
}

fn format_tally(tally: &[TallyEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in tally.iter().enumerate() {
        let _ = writeln!(out, "{}. {}: {}", i + 1, entry.candidate, entry.votes);
    }
    let _ = write!(out, "Total votes: {}", total_votes(tally));
    let top = leaders(tally);
    if !top.is_empty() {
        let names: Vec<&str> = top.iter().map(|e| e.candidate.as_str()).collect();
        let _ = write!(out, "\nLeading: {}", names.join(", "));
    }
    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>() + ".",
        None => String::new(),
    }
}
