use std::sync::Arc;

use crate::player::ConnectedPlayer;
use crate::protocol::PacketKind;
use crate::uuid_rewrite::{rewrite_payload, RewriteDirection};
use crate::ProxyInfo;

#[derive(Debug, PartialEq, Eq)]
pub enum EndpointResolution {
    /// Send the bytes on to the client exactly as they arrived.
    ForwardPacket(Vec<u8>),
    ForwardRewritten(Vec<u8>),
}

/// Backend side of a player's session.
pub struct BackendEndpoint {
    proxy_info: Arc<ProxyInfo>,
    player: Arc<ConnectedPlayer>,
    server_name: String,
}

impl BackendEndpoint {
    pub fn connect(
        proxy_info: Arc<ProxyInfo>,
        player: Arc<ConnectedPlayer>,
        server_name: impl Into<String>,
    ) -> BackendEndpoint {
        let server_name = server_name.into();
        player.set_current_server(Some(server_name.clone()));
        BackendEndpoint {
            proxy_info,
            player,
            server_name,
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn handle_server_packet(
        &self,
        kind: Option<PacketKind>,
        data: Vec<u8>,
    ) -> EndpointResolution {
        let Some(kind) = kind else {
            return EndpointResolution::ForwardPacket(data);
        };
        match rewrite_payload(
            &self.proxy_info,
            kind,
            &data,
            self.player.protocol_version(),
            &self.player,
            RewriteDirection::S2C,
        ) {
            Ok(Some(rewritten)) => EndpointResolution::ForwardRewritten(rewritten),
            Ok(None) => EndpointResolution::ForwardPacket(data),
            Err(err) => {
                log::warn!(
                    "Could not decode {:?} from {} for {}, forwarding untouched: {}",
                    kind,
                    self.server_name,
                    self.player.username(),
                    err
                );
                EndpointResolution::ForwardPacket(data)
            }
        }
    }
}
