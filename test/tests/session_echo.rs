use lockstep_client::RemoteConfig;
use lockstep_server::HostConfig;
use lockstep_shared::{
    ids,
    protocol::{id_of, HEADER_SIZE},
    ChannelConfig, ClientEnter, Command, DebugValue, Ping, COUNTER_SIZE, LENGTH_SIZE, TAG_SIZE,
};
use lockstep_test::{
    exchange, exchange_n_times, indexed, start_host, start_remote, LocalNetwork, RawPeer,
    HOST_PORT,
};

fn init() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

fn plain() -> RemoteConfig {
    RemoteConfig {
        encrypt: false,
        ..Default::default()
    }
}

fn seeded(seed: u64) -> HostConfig {
    HostConfig {
        seed: Some(seed),
        ..Default::default()
    }
}

// ========== Connection Tests ==========

#[test]
fn remote_learns_actor_clock_and_seed() {
    init();
    let network = LocalNetwork::new();
    let (mut host, host_world) = start_host(&network, seeded(7));
    let (mut remote, remote_world) = start_remote(&network, 7001, plain());

    assert!(!remote.is_connected());

    exchange(&mut host, &mut [&mut remote]);

    assert!(remote.is_connected());
    assert_eq!(remote.actor(), Some(0));
    assert_eq!(host.actors(), vec![0]);
    assert_eq!(remote.tick_duration(), 10);
    assert_eq!(remote.seed(), 7);
    assert_eq!(host.log_len(), 3);

    assert!(host_world.has_actor(0));
    assert!(remote_world.has_actor(0));
    assert_eq!(
        remote_world.performed_ids(),
        vec![ids::SERVER_CLOCK, ids::SERVER_SEED, ids::SLOT_CREATE]
    );
    assert_eq!(host_world.performed_ids(), remote_world.performed_ids());
}

#[test]
fn plain_session_echoes_debug_values() {
    init();
    let network = LocalNetwork::new();
    let (mut host, host_world) = start_host(&network, seeded(1));
    let (mut remote, remote_world) = start_remote(&network, 7001, plain());

    exchange(&mut host, &mut [&mut remote]);
    remote.queue(&DebugValue::new(42).encode());
    remote.queue(&DebugValue::new(-2).encode());
    exchange(&mut host, &mut [&mut remote]);

    assert_eq!(host_world.debug_values(), vec![(Some(0), 42), (Some(0), -2)]);
    assert_eq!(remote_world.debug_values(), host_world.debug_values());
    assert_eq!(host_world.score(0), Some(40));
    assert_eq!(remote_world.score(0), Some(40));
    assert!(!remote.is_encrypted());
}

// ========== Encryption Tests ==========

#[test]
fn encrypted_session_echoes_debug_values() {
    init();
    let network = LocalNetwork::new();
    let (mut host, host_world) = start_host(&network, seeded(1));
    let (mut remote, remote_world) = start_remote(&network, 7001, RemoteConfig::default());

    exchange(&mut host, &mut [&mut remote]);

    assert!(remote.is_encrypted());
    assert!(host.slots()[0].is_encrypted());
    assert!(remote.is_connected());

    remote.queue(&DebugValue::new(5).encode());
    exchange_n_times(&mut host, &mut [&mut remote], 2);

    assert_eq!(host_world.debug_values(), vec![(Some(0), 5)]);
    assert_eq!(remote_world.debug_values(), vec![(Some(0), 5)]);
    assert_eq!(remote.loss_count(), 0);
}

#[test]
fn small_chunks_survive_key_switch() {
    init();
    let network = LocalNetwork::new();
    let config = HostConfig {
        channel: ChannelConfig {
            chunk_size: 64,
            ..Default::default()
        },
        ..seeded(9)
    };
    let (mut host, host_world) = start_host(&network, config);
    let (mut remote, remote_world) = start_remote(&network, 7001, RemoteConfig::default());

    exchange_n_times(&mut host, &mut [&mut remote], 10);

    assert!(remote.is_encrypted());
    assert!(host.slots()[0].is_encrypted());
    assert!(remote.is_connected());
    assert_eq!(remote.actor(), Some(0));
    assert_eq!(remote.seed(), host.seed());
    assert!(remote_world.has_actor(0));
    assert_eq!(remote.loss_count(), 0);

    remote.queue(&DebugValue::new(11).encode());
    exchange_n_times(&mut host, &mut [&mut remote], 2);

    assert_eq!(host_world.debug_values(), vec![(Some(0), 11)]);
    assert_eq!(remote_world.debug_values(), vec![(Some(0), 11)]);
    assert_eq!(remote.loss_count(), 0);
}

#[test]
fn encrypted_datagrams_hide_the_payload() {
    init();
    let network = LocalNetwork::new();
    let host_address = LocalNetwork::address(HOST_PORT);
    let (mut host, host_world) = start_host(&network, seeded(1));
    let (mut remote, _remote_world) = start_remote(&network, 7001, RemoteConfig::default());

    exchange(&mut host, &mut [&mut remote]);

    let value: i64 = 0x1122_3344_5566_7788;
    remote.queue(&DebugValue::new(value).encode());
    remote.tick(10);

    let sent = network.take(host_address);
    assert_eq!(sent.len(), 1);

    let (from, datagram) = &sent[0];
    assert_eq!(
        datagram.len(),
        COUNTER_SIZE + LENGTH_SIZE + HEADER_SIZE + 8 + TAG_SIZE
    );
    assert!(!datagram
        .windows(8)
        .any(|window| window == value.to_le_bytes()));

    network.deliver(*from, host_address, datagram.clone());
    host.tick(10);

    assert_eq!(host_world.debug_values(), vec![(Some(0), value)]);
}

#[test]
fn tampered_datagram_is_lost() {
    init();
    let network = LocalNetwork::new();
    let remote_address = LocalNetwork::address(7001);
    let (mut host, _host_world) = start_host(&network, seeded(1));
    let (mut remote, remote_world) = start_remote(&network, 7001, RemoteConfig::default());

    exchange(&mut host, &mut [&mut remote]);

    host.queue(&DebugValue::new(3).encode());
    host.tick(10);

    let mut received = network.take(remote_address);
    assert_eq!(received.len(), 1);
    let (from, mut datagram) = received.remove(0);
    let last = datagram.len() - 1;
    datagram[last] ^= 0x01;
    let lost = datagram.len();
    network.deliver(from, remote_address, datagram);

    remote.tick(10);

    assert!(remote_world.debug_values().is_empty());
    assert_eq!(remote.loss_count(), lost);
}

// ========== Ping Tests ==========

#[test]
fn host_echoes_ping() {
    init();
    let network = LocalNetwork::new();
    let (mut host, _host_world) = start_host(&network, seeded(1));
    let mut peer = RawPeer::new(&network, 7002, LocalNetwork::address(HOST_PORT));

    let ping = Ping {
        payload: vec![1, 2, 3],
    }
    .encode();
    peer.send(&[indexed(ClientEnter.encode(), 0), ping.clone()]);
    host.tick(10);

    let frames = peer.receive();
    assert_eq!(frames.first(), Some(&ping));
    assert!(frames.iter().any(|frame| id_of(frame) == Some(ids::SLOT_CREATE)));
}
