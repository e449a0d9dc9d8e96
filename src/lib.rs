//! Pure Rust async client for the UDP rcon protocol spoken by Call of Duty
//! and other Quake 3 derived game servers.
pub mod client;
pub mod commands;
pub mod dvar;
pub mod error;
pub mod info;
pub mod packet;
pub mod response;
pub mod settings;
pub mod status;
pub mod transport;

pub use client::Client;
pub use error::RconError;
pub use settings::{ClientConfig, CommandSettings};
