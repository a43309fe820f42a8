//! PJLink wire protocol: command model, line codec, and authentication.
//!
//! The protocol is a text line protocol: every line ends with a single
//! carriage return, commands render as `%<class><code> <param>`, and
//! replies echo the command code back as `%<class><code>=<payload>`.
//! There are no request identifiers; correlation relies on the echoed
//! code together with strict one-at-a-time dispatch (see
//! [`crate::session`]).

pub mod auth;
pub mod codec;
pub mod command;

pub use auth::{challenge_digest, parse_greeting, Greeting, GreetingError};
pub use codec::{decode_reply, encode_command, DecodeError, ErrorToken, Reply, ReplyBody, Response};
pub use command::{Command, CommandCode, PjClass};
