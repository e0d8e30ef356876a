//! Gateway: HTTP endpoint the digital-human front end calls once per turn.
//!
//! `GET /` is a health check; `POST /` runs a turn and returns
//! `{ answer, instructions, conversationPayload }`.

mod protocol;
mod server;

pub use protocol::{AvatarContext, ErrorBody, InboundRequest, RequestError, TurnKind};
pub use server::{run_gateway, serve, GatewayState};
