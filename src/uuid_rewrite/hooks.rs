use std::sync::Arc;

use crate::player::{ConnectedPlayer, PlayerRegistry};
use crate::protocol::RewritablePacket;
use crate::ProxyInfo;

/// Opens the mapping store when configured. A store that fails to open is
/// disabled for the rest of the process; startup carries on without it.
///
/// Must run inside a tokio runtime, the store's vacuum task is spawned here.
pub fn on_proxy_start(proxy: &Arc<ProxyInfo>) {
    let config = &proxy.config.uuid_rewrite;
    let store = proxy.uuid_rewriter.store();
    if !config.database.enabled {
        store.set_enabled(false);
        return;
    }

    let path = &config.database.path;
    match store.open(path) {
        Ok(()) => log::info!("UUID rewrite mapping database opened at '{}'", path),
        Err(err) => {
            log::error!(
                "UUID rewrite mapping database failed to open at '{}', disabling it: {:#}",
                path,
                err
            );
            store.set_enabled(false);
            return;
        }
    }

    let store = store.clone();
    let period = config.vacuum_interval();
    proxy.uuid_rewriter.set_maintenance(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let store = store.clone();
            if let Err(err) = tokio::task::spawn_blocking(move || store.vacuum_if_due()).await {
                log::warn!("UUID mapping vacuum task failed: {}", err);
            }
        }
    }));
}

pub fn on_proxy_stop(proxy: &ProxyInfo) {
    proxy.uuid_rewriter.stop_maintenance();
    let store = proxy.uuid_rewriter.store();
    if store.is_enabled() {
        store.close();
        log::info!("UUID rewrite mapping database closed");
    }
}

pub fn on_player_connect(proxy: &ProxyInfo, player: &ConnectedPlayer) {
    if !proxy.config.is_uuid_rewrite_active() {
        return;
    }
    let identity = player.identity();
    proxy
        .uuid_rewriter
        .store()
        .upsert(identity.online_uuid, identity.offline_uuid, &identity.name);
}

/// Tells everyone else on the player's backend that the player left, in the
/// client's own uuid space. Older backends never send this themselves.
///
/// The cache entry is retired after the broadcast rather than purged: the
/// backend's own removal for this player is still on its way to every other
/// client and has to resolve. It leaves the cache through LRU eviction, or
/// once `retire_grace_secs` has passed when that is configured.
pub fn on_player_disconnect(proxy: &ProxyInfo, player: &ConnectedPlayer) {
    if !proxy.config.is_uuid_rewrite_active() {
        return;
    }
    let identity = player.identity();

    if let Some(server) = player.current_server() {
        let mut notified = 0;
        for other in proxy.players.players_on(&server) {
            if other.identity().online_uuid == identity.online_uuid {
                continue;
            }
            let removal = RewritablePacket::tab_list_removal(
                other.protocol_version(),
                vec![identity.online_uuid],
            );
            other.send(&removal);
            notified += 1;
        }
        log::debug!(
            "Sent tab list removal of {} to {} player(s) on {}",
            identity.name,
            notified,
            server
        );
    }

    proxy
        .uuid_rewriter
        .cache()
        .retire(identity.offline_uuid, identity.online_uuid);
}
