use std::sync::Arc;

use log::LevelFilter;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use uuid::Uuid;

use umbrella_rewrite::backend::{BackendEndpoint, EndpointResolution};
use umbrella_rewrite::cfg::{PlayerInfoForwarding, UmbrellaConfig, UuidRewriteConfig};
use umbrella_rewrite::client::{Client, ClientFunctionResponse};
use umbrella_rewrite::player::{ConnectedPlayer, OutboundPacket, PlayerIdentity};
use umbrella_rewrite::protocol::entity::{SpawnEntity, SpawnPlayer};
use umbrella_rewrite::protocol::io::WriteExt;
use umbrella_rewrite::protocol::tab_list::RemovePlayerInfo;
use umbrella_rewrite::protocol::{PacketKind, ProtocolVersion};
use umbrella_rewrite::uuid_rewrite::{self, UuidResolver};
use umbrella_rewrite::ProxyInfo;

fn proxy_with_database(path: Option<String>) -> Arc<ProxyInfo> {
    proxy_with(path, UuidRewriteConfig::default().cache_capacity)
}

fn proxy_with(path: Option<String>, cache_capacity: usize) -> Arc<ProxyInfo> {
    let mut uuid_rewrite = UuidRewriteConfig {
        enabled: true,
        cache_capacity,
        ..UuidRewriteConfig::default()
    };
    match path {
        Some(path) => uuid_rewrite.database.path = path,
        None => uuid_rewrite.database.enabled = false,
    }
    Arc::new(ProxyInfo::new(UmbrellaConfig {
        log_level: LevelFilter::Off,
        online_mode: true,
        player_info_forwarding: PlayerInfoForwarding::None,
        uuid_rewrite,
    }))
}

struct Session {
    player: Arc<ConnectedPlayer>,
    client: Client,
    backend: BackendEndpoint,
    _outbound: UnboundedReceiver<OutboundPacket>,
}

fn login(
    proxy: &Arc<ProxyInfo>,
    online: Uuid,
    name: &str,
    version: ProtocolVersion,
    server: &str,
) -> Session {
    let (tx, rx) = mpsc::unbounded_channel();
    let player = Arc::new(ConnectedPlayer::new(
        PlayerIdentity::new(online, name),
        version,
        tx,
    ));
    proxy.players.register(player.clone());
    uuid_rewrite::on_player_connect(proxy, &player);
    Session {
        client: Client::create(proxy.clone(), player.clone()),
        backend: BackendEndpoint::connect(proxy.clone(), player.clone(), server),
        player,
        _outbound: rx,
    }
}

fn logout(proxy: &ProxyInfo, session: &Session) {
    proxy
        .players
        .unregister(&session.player.identity().online_uuid);
    uuid_rewrite::on_player_disconnect(proxy, &session.player);
}

fn spawn_entity(uuid: Uuid, entity_type: i32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_varint(41).unwrap();
    buf.write_uuid(uuid).unwrap();
    buf.write_varint(entity_type).unwrap();
    buf.extend_from_slice(&[0x3f, 0xf0, 0, 0, 0, 0, 0, 0, 0x12, 0x34]);
    buf
}

fn removal(uuids: Vec<Uuid>) -> Vec<u8> {
    RemovePlayerInfo::new(uuids).encode().unwrap()
}

#[test]
fn spawn_and_spectate_end_to_end() {
    let proxy = proxy_with_database(None);
    let online = Uuid::from_u128(0x1111);
    let steve = login(&proxy, online, "Steve", ProtocolVersion::MINECRAFT_1_20_5, "lobby");
    let viewer = login(
        &proxy,
        Uuid::from_u128(0x2222),
        "Viewer",
        ProtocolVersion::MINECRAFT_1_20_5,
        "lobby",
    );
    let offline = steve.player.identity().offline_uuid;

    let resolution = viewer
        .backend
        .handle_server_packet(Some(PacketKind::SpawnEntity), spawn_entity(offline, 128));
    let EndpointResolution::ForwardRewritten(bytes) = resolution else {
        panic!("spawn was not rewritten: {:?}", resolution);
    };
    let spawned = SpawnEntity::decode(&bytes, ProtocolVersion::MINECRAFT_1_20_5).unwrap();
    assert_eq!(spawned.entity_uuid, online);
    assert_eq!(spawned.remainder, vec![0x3f, 0xf0, 0, 0, 0, 0, 0, 0, 0x12, 0x34]);

    let mut spectate = Vec::new();
    spectate.write_uuid(online).unwrap();
    let response = viewer
        .client
        .handle_client_packet(Some(PacketKind::SpectatorTeleport), spectate);
    let mut expected = Vec::new();
    expected.write_uuid(offline).unwrap();
    assert_eq!(response, ClientFunctionResponse::ForwardRewritten(expected));
}

#[test]
fn every_connected_player_round_trips() {
    let proxy = proxy_with_database(None);
    let sessions: Vec<Session> = (0..20u128)
        .map(|n| {
            login(
                &proxy,
                Uuid::from_u128(0xa000 + n),
                &format!("player{n}"),
                ProtocolVersion::MINECRAFT_1_21_4,
                "lobby",
            )
        })
        .collect();

    let resolver = proxy.uuid_rewriter.resolver(&proxy.players);
    for session in &sessions {
        let identity = session.player.identity();
        assert_eq!(resolver.to_online(identity.offline_uuid), Some(identity.online_uuid));
        assert_eq!(resolver.to_offline(identity.online_uuid), Some(identity.offline_uuid));
    }
}

#[test]
fn packets_already_in_target_space_pass_through_byte_identical() {
    let proxy = proxy_with_database(None);
    let online = Uuid::from_u128(0x3333);
    let alex = login(&proxy, online, "Alex", ProtocolVersion::MINECRAFT_1_19_3, "lobby");

    let mut spawn = Vec::new();
    spawn.write_varint(9).unwrap();
    spawn.write_uuid(online).unwrap();
    spawn.extend_from_slice(&[1, 2, 3, 4]);
    let response = alex
        .backend
        .handle_server_packet(Some(PacketKind::SpawnPlayer), spawn.clone());
    assert_eq!(response, EndpointResolution::ForwardPacket(spawn.clone()));

    // and the offline form is rewritten in place
    let mut offline_spawn = Vec::new();
    offline_spawn.write_varint(9).unwrap();
    offline_spawn.write_uuid(alex.player.identity().offline_uuid).unwrap();
    offline_spawn.extend_from_slice(&[1, 2, 3, 4]);
    let EndpointResolution::ForwardRewritten(bytes) = alex
        .backend
        .handle_server_packet(Some(PacketKind::SpawnPlayer), offline_spawn)
    else {
        panic!("spawn player was not rewritten");
    };
    assert_eq!(bytes, spawn);
    let decoded = SpawnPlayer::decode(&bytes, ProtocolVersion::MINECRAFT_1_19_3).unwrap();
    assert_eq!(decoded.entity_uuid, online);
}

#[test]
fn undecodable_packets_are_forwarded_untouched() {
    let proxy = proxy_with_database(None);
    let old = login(
        &proxy,
        Uuid::from_u128(0x4444),
        "Old",
        ProtocolVersion(340),
        "lobby",
    );
    let bytes = spawn_entity(old.player.identity().offline_uuid, 122);
    let response = old
        .backend
        .handle_server_packet(Some(PacketKind::SpawnEntity), bytes.clone());
    assert_eq!(response, EndpointResolution::ForwardPacket(bytes.clone()));

    let response = old.backend.handle_server_packet(None, bytes.clone());
    assert_eq!(response, EndpointResolution::ForwardPacket(bytes));
}

#[test]
fn removal_fan_out_after_disconnect_uses_online_uuid() {
    let proxy = proxy_with_database(None);
    let leaving_online = Uuid::from_u128(0x5555);
    let leaving = login(
        &proxy,
        leaving_online,
        "Leaving",
        ProtocolVersion::MINECRAFT_1_21_4,
        "lobby",
    );
    let watchers: Vec<Session> = (0..3u128)
        .map(|n| {
            login(
                &proxy,
                Uuid::from_u128(0x6000 + n),
                &format!("watcher{n}"),
                ProtocolVersion::MINECRAFT_1_21_4,
                "lobby",
            )
        })
        .collect();
    let offline = leaving.player.identity().offline_uuid;

    logout(&proxy, &leaving);

    for watcher in &watchers {
        let response = watcher
            .backend
            .handle_server_packet(Some(PacketKind::RemovePlayerInfo), removal(vec![offline]));
        assert_eq!(
            response,
            EndpointResolution::ForwardRewritten(removal(vec![leaving_online]))
        );
    }
}

#[tokio::test]
async fn store_answers_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uuid_mapping.db").to_string_lossy().into_owned();
    let online = Uuid::from_u128(0x7777);

    let proxy = proxy_with_database(Some(path.clone()));
    uuid_rewrite::on_proxy_start(&proxy);
    let gone = login(&proxy, online, "Gone", ProtocolVersion::MINECRAFT_1_21_4, "lobby");
    let offline = gone.player.identity().offline_uuid;
    logout(&proxy, &gone);
    uuid_rewrite::on_proxy_stop(&proxy);

    let proxy = proxy_with_database(Some(path));
    uuid_rewrite::on_proxy_start(&proxy);
    let watcher = login(
        &proxy,
        Uuid::from_u128(0x8888),
        "Watcher",
        ProtocolVersion::MINECRAFT_1_21_4,
        "lobby",
    );
    let response = watcher
        .backend
        .handle_server_packet(Some(PacketKind::RemovePlayerInfo), removal(vec![offline]));
    assert_eq!(
        response,
        EndpointResolution::ForwardRewritten(removal(vec![online]))
    );
    uuid_rewrite::on_proxy_stop(&proxy);
}

#[test]
fn resolution_holds_up_under_connect_churn() {
    let proxy = proxy_with(None, 16);
    let stable: Vec<Session> = (0..4u128)
        .map(|n| {
            login(
                &proxy,
                Uuid::from_u128(0x9000 + n),
                &format!("stable{n}"),
                ProtocolVersion::MINECRAFT_1_21_4,
                "lobby",
            )
        })
        .collect();
    let identities: Vec<PlayerIdentity> = stable
        .iter()
        .map(|session| session.player.identity().clone())
        .collect();

    std::thread::scope(|scope| {
        for worker in 0..3u128 {
            let proxy = &proxy;
            scope.spawn(move || {
                for n in 0..200u128 {
                    let session = login(
                        proxy,
                        Uuid::from_u128(0x10_0000 + worker * 1000 + n),
                        &format!("churn{worker}_{n}"),
                        ProtocolVersion::MINECRAFT_1_20_5,
                        "lobby",
                    );
                    logout(proxy, &session);
                }
            });
        }
        for _ in 0..3 {
            let proxy = &proxy;
            let identities = &identities;
            scope.spawn(move || {
                for _ in 0..300 {
                    let resolver = proxy.uuid_rewriter.resolver(&proxy.players);
                    for identity in identities {
                        assert_eq!(
                            resolver.to_online(identity.offline_uuid),
                            Some(identity.online_uuid)
                        );
                        assert_eq!(
                            resolver.to_offline(identity.online_uuid),
                            Some(identity.offline_uuid)
                        );
                    }
                    let cache = proxy.uuid_rewriter.cache();
                    assert!(cache.len() <= cache.capacity());
                }
            });
        }
    });

    assert_eq!(proxy.players.current_players(), stable.len());
    assert!(proxy.uuid_rewriter.cache().len() <= 16);
}
