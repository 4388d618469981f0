use lockstep_client::RemoteConfig;
use lockstep_server::HostConfig;
use lockstep_shared::{
    ids, protocol::{id_of, index_of}, ClientEnter, Command, DebugValue, EventOrder, RequestEvents,
};
use lockstep_test::{indexed, start_host, start_remote, LocalNetwork, RawPeer, HOST_PORT};

fn init() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

fn debug_at(value: i64, index: u64) -> Vec<u8> {
    indexed(DebugValue::new(value).encode(), index)
}

fn requested(frames: &[Vec<u8>]) -> Vec<u64> {
    frames
        .iter()
        .filter_map(|frame| RequestEvents::decode(frame))
        .flat_map(|request| request.events)
        .collect()
}

// ========== Host Gap Tests ==========

#[test]
fn host_requests_missing_slot_events() {
    init();
    let network = LocalNetwork::new();
    let (mut host, host_world) = start_host(&network, HostConfig::default());
    let mut peer = RawPeer::new(&network, 7001, LocalNetwork::address(HOST_PORT));

    peer.send(&[
        indexed(ClientEnter.encode(), 0),
        debug_at(2, 2),
        debug_at(4, 4),
    ]);
    host.tick(10);

    assert_eq!(requested(&peer.receive()), vec![1, 3]);
    assert!(host_world.debug_values().is_empty());

    peer.send(&[debug_at(3, 3), debug_at(1, 1)]);
    host.tick(10);

    let values: Vec<i64> = host_world.debug_values().iter().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![1, 2, 3, 4]);
    assert!(requested(&peer.receive()).is_empty());
}

#[test]
fn host_keeps_requesting_until_filled() {
    init();
    let network = LocalNetwork::new();
    let (mut host, host_world) = start_host(&network, HostConfig::default());
    let mut peer = RawPeer::new(&network, 7001, LocalNetwork::address(HOST_PORT));

    peer.send(&[indexed(ClientEnter.encode(), 0), debug_at(2, 2)]);
    host.tick(10);
    assert_eq!(requested(&peer.receive()), vec![1]);

    host.tick(10);
    assert_eq!(requested(&peer.receive()), vec![1]);

    peer.send(&[debug_at(1, 1)]);
    host.tick(10);
    assert_eq!(host_world.debug_values().len(), 2);
}

#[test]
fn host_resends_requested_log_events() {
    init();
    let network = LocalNetwork::new();
    let (mut host, _host_world) = start_host(&network, HostConfig::default());
    let mut peer = RawPeer::new(&network, 7001, LocalNetwork::address(HOST_PORT));

    peer.send(&[indexed(ClientEnter.encode(), 0)]);
    host.tick(10);
    assert_eq!(peer.receive().len(), 3);

    peer.send(&[RequestEvents::new(&[1, 0, 9]).encode()]);
    host.tick(10);

    let frames = peer.receive();
    let resent: Vec<Option<u64>> = frames.iter().map(|frame| index_of(frame)).collect();
    assert_eq!(resent, vec![Some(1), Some(0)]);
    assert_eq!(id_of(&frames[0]), Some(ids::SERVER_SEED));
}

// ========== Remote Gap Tests ==========

#[test]
fn remote_requests_missing_host_events() {
    init();
    let network = LocalNetwork::new();
    let (mut remote, remote_world) = start_remote(
        &network,
        7001,
        RemoteConfig {
            encrypt: false,
            ..Default::default()
        },
    );
    let mut host = RawPeer::new(&network, HOST_PORT, LocalNetwork::address(7001));

    let host_event = |value: i64, index: u64| {
        DebugValue::new(value)
            .to_event()
            .with_order(EventOrder::new(index))
            .encode()
    };

    remote.tick(10);
    let entered = host.receive();
    assert_eq!(entered.len(), 1);
    assert_eq!(id_of(&entered[0]), Some(ids::CLIENT_ENTER));
    assert_eq!(index_of(&entered[0]), Some(0));

    host.send(&[host_event(0, 0), host_event(20, 2), host_event(40, 4)]);
    remote.tick(10);

    assert_eq!(requested(&host.receive()), vec![1, 3]);
    assert_eq!(remote.event_index(), 1);

    host.send(&[host_event(10, 1), host_event(30, 3)]);
    remote.tick(10);

    let values: Vec<i64> = remote_world.debug_values().iter().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![0, 10, 20, 30, 40]);
    assert_eq!(remote.event_index(), 5);
}

#[test]
fn remote_resends_its_own_events() {
    init();
    let network = LocalNetwork::new();
    let (mut remote, _remote_world) = start_remote(
        &network,
        7001,
        RemoteConfig {
            encrypt: false,
            ..Default::default()
        },
    );
    let mut host = RawPeer::new(&network, HOST_PORT, LocalNetwork::address(7001));

    remote.queue(&DebugValue::new(8).encode());
    remote.tick(10);
    assert_eq!(host.receive().len(), 2);

    host.send(&[RequestEvents::new(&[1]).encode()]);
    remote.tick(10);

    let resent = host.receive();
    assert_eq!(resent.len(), 1);
    assert_eq!(index_of(&resent[0]), Some(1));
    assert_eq!(DebugValue::decode(&resent[0]), Some(DebugValue::new(8)));
}
