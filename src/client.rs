use std::sync::Arc;

use crate::player::ConnectedPlayer;
use crate::protocol::PacketKind;
use crate::uuid_rewrite::{rewrite_payload, RewriteDirection};
use crate::ProxyInfo;

#[derive(Debug, PartialEq, Eq)]
pub enum ClientFunctionResponse {
    /// Send the bytes on to the backend exactly as they arrived.
    ForwardPacket(Vec<u8>),
    ForwardRewritten(Vec<u8>),
}

/// Client side of a player's session, as seen by the packet pipeline.
pub struct Client {
    proxy_info: Arc<ProxyInfo>,
    player: Arc<ConnectedPlayer>,
}

impl Client {
    pub fn create(proxy_info: Arc<ProxyInfo>, player: Arc<ConnectedPlayer>) -> Client {
        Client { proxy_info, player }
    }

    pub fn player(&self) -> &Arc<ConnectedPlayer> {
        &self.player
    }

    /// `kind` is `None` for everything the rewriter has no interest in.
    pub fn handle_client_packet(
        &self,
        kind: Option<PacketKind>,
        data: Vec<u8>,
    ) -> ClientFunctionResponse {
        let Some(kind) = kind else {
            return ClientFunctionResponse::ForwardPacket(data);
        };
        match rewrite_payload(
            &self.proxy_info,
            kind,
            &data,
            self.player.protocol_version(),
            &self.player,
            RewriteDirection::C2S,
        ) {
            Ok(Some(rewritten)) => ClientFunctionResponse::ForwardRewritten(rewritten),
            Ok(None) => ClientFunctionResponse::ForwardPacket(data),
            Err(err) => {
                log::warn!(
                    "Could not decode {:?} from {}, forwarding untouched: {}",
                    kind,
                    self.player.username(),
                    err
                );
                ClientFunctionResponse::ForwardPacket(data)
            }
        }
    }
}
