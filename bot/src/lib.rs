//! Chat front-end for votebox.
//!
//! Users talk to the bot with short text commands. Each user is either
//! drafting a poll or attached to one live poll; see [`UserStateStore`].
//! The webhook server in [`server`] is a thin transport over [`Bot::handle`].

pub mod bot;
pub mod command;
pub mod config;
pub mod error;
pub mod server;
pub mod store;

pub use bot::Bot;
pub use command::Command;
pub use config::BotConfig;
pub use error::{BotError, CommandError};
pub use server::{router, BotServer, MessageReply, MessageRequest};
pub use store::{UserState, UserStateStore, UserView};
