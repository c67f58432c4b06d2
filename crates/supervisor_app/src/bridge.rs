//! Bridge between NATS clients and the entity manager.
//!
//! One task owns the manager and the clock relay. Commands arrive on a
//! single wildcard subscription and are handled strictly one at a time in
//! arrival order, interleaved with clock ticks. No handler yields while it
//! touches the scene, so the registry needs no locking.

use anyhow::Result;
use futures::StreamExt;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use supervisor_core::{ClockRelay, ClockTick, EntityManager, FragmentConverter, SceneStore};
use supervisor_net::NatsConnection;
use supervisor_net::messages::{
    Clock, RemoveNode, SpawnNodeFromString, SpawnResponse, SpawnUrdfRobot,
};
use supervisor_net::subjects::{self, OP_REMOVE_NODE, OP_SPAWN_NODE_FROM_STRING, OP_SPAWN_URDF_ROBOT};

use crate::config::BridgeConfig;

#[derive(Debug)]
pub struct Bridge<S, C> {
    manager: EntityManager<S, C>,
    clock: ClockRelay,
    config: BridgeConfig,
}

impl<S: SceneStore, C: FragmentConverter> Bridge<S, C> {
    /// Create a bridge. The clock steps the scene by its basic time step.
    #[must_use]
    pub fn new(manager: EntityManager<S, C>, config: BridgeConfig) -> Self {
        let clock = ClockRelay::new(manager.scene().basic_timestep());
        Self {
            manager,
            clock,
            config,
        }
    }

    #[must_use]
    pub fn manager(&self) -> &EntityManager<S, C> {
        &self.manager
    }

    /// Handle one command. Returns the encoded reply for request/reply
    /// operations and `None` for notifications. Unknown operations are
    /// answered with a failed [`SpawnResponse`] so a waiting requester does
    /// not time out; the reply is only sent when the message has a reply
    /// subject.
    pub fn dispatch(&mut self, op: &str, payload: &[u8]) -> Option<Vec<u8>> {
        match op {
            OP_SPAWN_URDF_ROBOT => {
                let success = match self.config.format.decode::<SpawnUrdfRobot>(payload) {
                    Ok(request) => self.manager.spawn_robot(&request.robot.into()).is_ok(),
                    Err(e) => {
                        warn!(op, %e, "invalid request");
                        false
                    }
                };
                self.reply(SpawnResponse { success })
            }
            OP_SPAWN_NODE_FROM_STRING => {
                let success = match self.config.format.decode::<SpawnNodeFromString>(payload) {
                    Ok(request) => self.manager.spawn_fragment(&request.data).is_ok(),
                    Err(e) => {
                        warn!(op, %e, "invalid request");
                        false
                    }
                };
                self.reply(SpawnResponse { success })
            }
            OP_REMOVE_NODE => {
                match self.config.format.decode::<RemoveNode>(payload) {
                    Ok(message) => {
                        self.manager.remove(&message.data);
                    }
                    Err(e) => warn!(op, %e, "invalid notification"),
                }
                None
            }
            _ => {
                warn!(op, "unknown operation");
                self.reply(SpawnResponse { success: false })
            }
        }
    }

    fn reply(&self, response: SpawnResponse) -> Option<Vec<u8>> {
        match self.config.format.encode(&response) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!(%e, "failed to encode reply");
                None
            }
        }
    }

    /// Advance the scene by one step.
    pub fn tick(&mut self) -> ClockTick {
        self.clock.tick(self.manager.scene_mut())
    }

    /// Serve commands and clock ticks until the simulation terminates, the
    /// command subscription closes, or the process is interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error if the command subscription cannot be created.
    pub async fn run(&mut self, conn: &NatsConnection) -> Result<()> {
        let command_subject = subjects::command_wildcard(&self.config.prefix);
        let clock_subject = subjects::clock(&self.config.prefix);

        let mut commands = conn.subscribe(&command_subject).await?;
        info!(subject = command_subject, "subscribed to commands");

        let mut interval = tokio::time::interval(self.config.tick_period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!(
            tick_rate = self.config.tick_rate,
            timestep_ms = self.clock.timestep_ms(),
            clock = clock_subject,
            "supervisor ready"
        );

        loop {
            tokio::select! {
                message = commands.next() => {
                    let Some(message) = message else {
                        warn!("command subscription closed");
                        break;
                    };
                    self.handle_message(conn, message).await;
                }
                _ = interval.tick() => {
                    match self.tick() {
                        ClockTick::Time(time) => {
                            if let Err(e) = conn.publish(&clock_subject, &Clock { clock: time }).await {
                                debug!(%e, "failed to publish clock");
                            }
                        }
                        ClockTick::Terminated => break,
                    }
                }
                _ = &mut shutdown => {
                    info!("interrupted");
                    break;
                }
            }
        }

        info!(
            ticks = self.clock.ticks(),
            spawned = self.manager().registry().len(),
            "supervisor stopping"
        );
        Ok(())
    }

    async fn handle_message(&mut self, conn: &NatsConnection, message: async_nats::Message) {
        let Some(op) = subjects::command_op(&self.config.prefix, message.subject.as_str()) else {
            debug!(subject = %message.subject, "ignoring message outside the command subtree");
            return;
        };
        debug!(op, "received command");

        let reply = self.dispatch(op, &message.payload);

        if let (Some(reply_to), Some(payload)) = (message.reply, reply)
            && let Err(e) = conn.publish_raw(reply_to.as_str(), payload).await
        {
            error!(%e, "failed to publish reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use supervisor_core::{ConversionOptions, ConvertError, MemoryScene, SimTime};
    use supervisor_net::WireFormat;
    use supervisor_net::messages::UrdfRobot;

    use super::*;

    /// Converter returning `Robot { name "<name>" }`.
    struct NamedRobotConverter;

    impl FragmentConverter for NamedRobotConverter {
        fn convert_file(
            &self,
            _path: &Path,
            name: &str,
            _options: &ConversionOptions,
        ) -> Result<String, ConvertError> {
            Ok(format!("Robot {{ name \"{name}\" }}"))
        }

        fn convert_content(
            &self,
            _content: &str,
            name: &str,
            _options: &ConversionOptions,
            _relative_path_prefix: Option<&str>,
        ) -> Result<String, ConvertError> {
            Ok(format!("Robot {{ name \"{name}\" }}"))
        }
    }

    fn bridge(format: WireFormat) -> Bridge<MemoryScene, NamedRobotConverter> {
        let manager = EntityManager::new(MemoryScene::new(32), NamedRobotConverter);
        Bridge::new(
            manager,
            BridgeConfig {
                format,
                ..BridgeConfig::default()
            },
        )
    }

    fn response(format: WireFormat, reply: Option<Vec<u8>>) -> SpawnResponse {
        format.decode(&reply.expect("spawn requests are answered")).unwrap()
    }

    #[test]
    fn test_spawn_robot_request() {
        let format = WireFormat::MessagePack;
        let mut bridge = bridge(format);
        let request = SpawnUrdfRobot {
            robot: UrdfRobot {
                name: "arm".to_string(),
                urdf_path: "/robots/arm.urdf".to_string(),
                ..UrdfRobot::default()
            },
        };
        let payload = format.encode(&request).unwrap();

        let reply = bridge.dispatch(OP_SPAWN_URDF_ROBOT, &payload);
        assert!(response(format, reply).success);
        let reply = bridge.dispatch(OP_SPAWN_URDF_ROBOT, &payload);
        assert!(!response(format, reply).success);
        assert_eq!(bridge.manager().registry().len(), 1);
    }

    #[test]
    fn test_spawn_fragment_request_json() {
        let format = WireFormat::Json;
        let mut bridge = bridge(format);
        let payload = br#"{"data": "Solid { name \"box_1\" }"}"#;

        let reply = bridge.dispatch(OP_SPAWN_NODE_FROM_STRING, payload);
        assert!(response(format, reply).success);
        assert!(bridge.manager().registry().contains("box_1"));

        let reply = bridge.dispatch(OP_SPAWN_NODE_FROM_STRING, br#"{"data": ""}"#);
        assert!(!response(format, reply).success);
    }

    #[test]
    fn test_invalid_payload_answers_failure() {
        let format = WireFormat::Json;
        let mut bridge = bridge(format);
        let reply = bridge.dispatch(OP_SPAWN_URDF_ROBOT, b"not json");
        assert!(!response(format, reply).success);
        assert!(bridge.manager().registry().is_empty());
    }

    #[test]
    fn test_remove_has_no_reply() {
        let format = WireFormat::Json;
        let mut bridge = bridge(format);
        bridge.dispatch(OP_SPAWN_NODE_FROM_STRING, br#"{"data": "Solid { name \"box_1\" }"}"#);

        assert_eq!(bridge.dispatch(OP_REMOVE_NODE, br#"{"data": "box_1"}"#), None);
        assert!(bridge.manager().registry().is_empty());
        assert_eq!(bridge.manager().scene().node_count(), 0);

        // Removing again is a no-op.
        assert_eq!(bridge.dispatch(OP_REMOVE_NODE, br#"{"data": "box_1"}"#), None);
    }

    #[test]
    fn test_unknown_operation_answers_failure() {
        let format = WireFormat::Json;
        let mut bridge = bridge(format);
        let reply = bridge.dispatch("reset_world", b"{}");
        assert!(!response(format, reply).success);
        assert!(bridge.manager().registry().is_empty());
    }

    #[test]
    fn test_tick_uses_basic_timestep() {
        let mut bridge = bridge(WireFormat::MessagePack);
        assert_eq!(
            bridge.tick(),
            ClockTick::Time(SimTime {
                sec: 0,
                nanosec: 32_000_000
            })
        );
    }
}
