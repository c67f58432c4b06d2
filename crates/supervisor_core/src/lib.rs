//! # supervisor_core
//!
//! Entity lifecycle management for a running simulation.
//!
//! This crate provides:
//!
//! - [`scene`] — the [`SceneStore`] contract the simulator is driven through.
//! - [`memory`] — [`MemoryScene`], an in-process scene host.
//! - [`fragment`] — lexer and parser for scene fragments, entity name extraction.
//! - [`converter`] — the robot-description [`FragmentConverter`] contract.
//! - [`registry`] — the [`EntityRegistry`] of spawned names.
//! - [`manager`] — the [`EntityManager`] serving spawn and remove requests.
//! - [`clock`] — the [`ClockRelay`] stepping the scene and reporting time.

pub mod clock;
pub mod converter;
pub mod fragment;
pub mod manager;
pub mod memory;
pub mod registry;
pub mod scene;

pub use clock::{ClockRelay, ClockTick, SimTime};
pub use converter::{CommandConverter, ConversionOptions, ConvertError, FragmentConverter};
pub use manager::{EntityManager, RemoveOutcome, RobotSource, SpawnError, SpawnRequest};
pub use memory::MemoryScene;
pub use registry::EntityRegistry;
pub use scene::{NodeId, SceneStore};
