//! Parley core library: dialog engine reply normalization, the turn dispatcher, and the
//! HTTP gateway used by the CLI.

pub mod config;
pub mod dialog;
pub mod format;
pub mod gateway;
pub mod normalize;
pub mod session;
pub mod turn;
