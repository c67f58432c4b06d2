//! # supervisor_net
//!
//! NATS transport layer for the simulation supervisor.
//!
//! This crate provides:
//!
//! - [`subjects`] — NATS subject hierarchy and builders.
//! - [`messages`] — Request, reply and clock message types.
//! - [`codec`] — MessagePack / JSON serialisation helpers.
//! - [`connection`] — NATS connection management.
//! - [`error`] — Network-layer error types.

pub mod codec;
pub mod connection;
pub mod error;
pub mod messages;
pub mod subjects;

pub use codec::{WireFormat, decode, encode};
pub use connection::NatsConnection;
pub use error::NetError;
