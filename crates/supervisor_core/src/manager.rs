//! Entity lifecycle manager.
//!
//! The manager is the only component that inserts entities into or removes
//! them from the scene. It validates every request against the
//! [`EntityRegistry`], mutates the [`SceneStore`], and keeps the registry in
//! line with what the scene reports.
//!
//! ## Operations
//!
//! - [`spawn_robot`](EntityManager::spawn_robot) — convert a robot
//!   description and insert it. The converter's success is taken as proof
//!   that the node exists; the scene is not re-scanned.
//! - [`spawn_fragment`](EntityManager::spawn_fragment) — insert a raw
//!   fragment, then scan the scene for the node. If it is missing, only the
//!   registry entry is rolled back; whatever the scene kept stays there.
//! - [`remove`](EntityManager::remove) — remove a spawned entity by name.
//!   If the registry owns the name but the scene has no such node, the
//!   registry entry is kept.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::converter::{ConversionOptions, ConvertError, FragmentConverter};
use crate::fragment::extract_name;
use crate::registry::EntityRegistry;
use crate::scene::{SceneStore, find_node};

/// Where the robot description comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RobotSource {
    /// A description file on disk.
    File(PathBuf),
    /// An inline description.
    Content {
        content: String,
        /// Prefix used to resolve relative resource paths in `content`.
        relative_path_prefix: Option<String>,
    },
}

impl RobotSource {
    /// Returns `true` if the source carries no path or no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            RobotSource::File(path) => path.as_os_str().is_empty(),
            RobotSource::Content { content, .. } => content.is_empty(),
        }
    }
}

/// A request to spawn a robot from its description.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    /// Unique entity name.
    pub name: String,
    /// The robot description, `None` if the client gave neither form.
    pub source: Option<RobotSource>,
    /// Placement and geometry options.
    pub options: ConversionOptions,
}

impl SpawnRequest {
    /// Spawn `name` from a description file, with default options.
    #[must_use]
    pub fn from_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: Some(RobotSource::File(path.into())),
            options: ConversionOptions::default(),
        }
    }

    /// Spawn `name` from inline description content, with default options.
    #[must_use]
    pub fn from_content(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Some(RobotSource::Content {
                content: content.into(),
                relative_path_prefix: None,
            }),
            options: ConversionOptions::default(),
        }
    }

    /// Replace the conversion options.
    #[must_use]
    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Reasons a spawn request is rejected. None of them affects the process.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("cannot import an unnamed robot")]
    UnnamedRobot,

    #[error("the robot name \"{0}\" is already used by another robot")]
    NameAlreadyUsed(String),

    #[error("no robot description path or content given for \"{0}\"")]
    NoSource(String),

    #[error("failed to convert the robot \"{name}\": {source}")]
    Conversion {
        name: String,
        #[source]
        source: ConvertError,
    },

    #[error("cannot import an empty string")]
    EmptyFragment,

    #[error("cannot import an unnamed node")]
    UnnamedNode,

    #[error("a node named \"{0}\" already exists")]
    DuplicateNode(String),

    #[error("could not import the node named \"{0}\"")]
    ImportFailed(String),
}

/// What a removal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The node was removed from the scene and the registry.
    Removed,
    /// The name was never spawned (or is already removed); nothing changed.
    NotSpawned,
    /// The registry owns the name but the scene has no such node. Nothing changed.
    NotFound,
}

/// Owns the entity registry and serialises all scene mutations.
#[derive(Debug)]
pub struct EntityManager<S, C> {
    scene: S,
    converter: C,
    registry: EntityRegistry,
}

impl<S: SceneStore, C: FragmentConverter> EntityManager<S, C> {
    /// Create a manager with an empty registry.
    #[must_use]
    pub fn new(scene: S, converter: C) -> Self {
        Self {
            scene,
            converter,
            registry: EntityRegistry::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable access to the scene, for stepping the simulation. Entity
    /// insertion and removal must go through the manager.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// Convert a robot description and insert it into the scene.
    ///
    /// # Errors
    ///
    /// Returns a [`SpawnError`] if the name is empty or taken, no source is
    /// given, or the conversion fails. The scene and registry are untouched
    /// in every error case.
    pub fn spawn_robot(&mut self, request: &SpawnRequest) -> Result<(), SpawnError> {
        let name = request.name.as_str();
        if name.is_empty() {
            info!("cannot import an unnamed robot, a name must be given");
            return Err(SpawnError::UnnamedRobot);
        }
        if self.registry.contains(name) {
            info!(name, "robot name is already used by another robot");
            return Err(SpawnError::NameAlreadyUsed(name.to_string()));
        }

        let converted = match request.source.as_ref().filter(|source| !source.is_empty()) {
            Some(RobotSource::File(path)) => self.converter.convert_file(path, name, &request.options),
            Some(RobotSource::Content {
                content,
                relative_path_prefix,
            }) => self.converter.convert_content(
                content,
                name,
                &request.options,
                relative_path_prefix.as_deref(),
            ),
            None => {
                info!(name, "cannot import a robot without a description path or content");
                return Err(SpawnError::NoSource(name.to_string()));
            }
        };

        let fragment = match converted {
            Ok(fragment) => fragment,
            Err(source) => {
                warn!(name, %source, "robot description conversion failed");
                return Err(SpawnError::Conversion {
                    name: name.to_string(),
                    source,
                });
            }
        };

        self.scene.import_node(&fragment);
        self.registry.insert(name);
        info!(name, "imported robot");
        Ok(())
    }

    /// Insert a raw fragment and verify that the scene now holds a node
    /// with the fragment's name. Returns the name on success.
    ///
    /// # Errors
    ///
    /// Returns a [`SpawnError`] if the fragment is empty, declares no name,
    /// declares a name already spawned, or does not show up in the scene
    /// after insertion. In the last case the fragment may still be present
    /// in the scene; only the registry entry is rolled back.
    pub fn spawn_fragment(&mut self, fragment: &str) -> Result<String, SpawnError> {
        if fragment.is_empty() {
            info!("cannot import an empty string");
            return Err(SpawnError::EmptyFragment);
        }

        let name = match extract_name(fragment) {
            Some(name) if !name.is_empty() => name,
            _ => {
                info!("cannot import an unnamed node");
                return Err(SpawnError::UnnamedNode);
            }
        };

        if self.registry.contains(&name) {
            info!(name, "found a duplicate node, a unique name must be given");
            return Err(SpawnError::DuplicateNode(name));
        }

        self.registry.insert(&name);
        self.scene.import_node(fragment);

        if find_node(&self.scene, &name).is_none() {
            self.registry.remove(&name);
            info!(name, "could not import the node");
            return Err(SpawnError::ImportFailed(name));
        }

        info!(name, "imported node");
        Ok(name)
    }

    /// Remove a spawned entity by name.
    pub fn remove(&mut self, name: &str) -> RemoveOutcome {
        if !self.registry.contains(name) {
            info!(name, "no spawned node with this name, nothing to remove");
            return RemoveOutcome::NotSpawned;
        }

        match find_node(&self.scene, name) {
            Some(node) => {
                self.scene.remove_node(node);
                self.registry.remove(name);
                info!(name, "removed node");
                RemoveOutcome::Removed
            }
            None => {
                info!(
                    name,
                    "wanted to remove the node but it has not been found in the simulation world"
                );
                RemoveOutcome::NotFound
            }
        }
    }
}
