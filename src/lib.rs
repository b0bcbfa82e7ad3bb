pub mod backend;
pub mod cfg;
pub mod client;
pub mod player;
pub mod protocol;
pub mod uuid_rewrite;

use crate::player::PlayerList;
use crate::uuid_rewrite::UuidRewriter;

pub struct ProxyInfo {
    pub config: cfg::UmbrellaConfig,
    pub players: PlayerList,
    pub uuid_rewriter: UuidRewriter,
}

impl ProxyInfo {
    pub fn new(config: cfg::UmbrellaConfig) -> ProxyInfo {
        let uuid_rewriter = UuidRewriter::new(&config.uuid_rewrite);
        ProxyInfo {
            config,
            players: PlayerList::new(),
            uuid_rewriter,
        }
    }
}
