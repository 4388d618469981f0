use lockstep_client::RemoteConfig;
use lockstep_server::HostConfig;
use lockstep_shared::{
    ids, ClientEnter, Command, DebugValue, ServerAction, ServerLaunch, ServerPause, ServerSeed,
    ServerState,
};
use lockstep_test::{
    exchange, indexed, start_host, start_remote, LocalNetwork, RawPeer, RecordingSolver,
    HOST_PORT,
};

fn init() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

// ========== Host Solver Tests ==========

#[test]
fn host_hands_events_to_solver_during_action() {
    init();
    let network = LocalNetwork::new();
    let config = HostConfig {
        seed: Some(99),
        ..Default::default()
    };
    let (mut host, host_world) = start_host(&network, config);
    let solver = RecordingSolver::new();
    host.set_solver(Box::new(solver.clone()));

    assert_eq!(solver.log().seed, Some(99));

    let mut peer = RawPeer::new(&network, 7001, LocalNetwork::address(HOST_PORT));
    peer.send(&[indexed(ClientEnter.encode(), 0)]);
    host.tick(10);
    assert_eq!(solver.log().elapsed_msec, 0);

    host.queue(&ServerAction.encode());
    peer.send(&[indexed(DebugValue::new(6).encode(), 1)]);
    host.tick(10);
    host.tick(10);

    let log = solver.log();
    assert_eq!(log.applied.len(), 1);
    assert_eq!(log.applied[0].id, ids::DEBUG);
    assert_eq!(log.applied[0].actor, Some(0));
    assert_eq!(log.applied[0].index(), Some(3));
    assert_eq!(log.elapsed_msec, 20);
    assert!(host_world.debug_values().is_empty());

    host.queue(&ServerPause.encode());
    host.tick(10);
    assert_eq!(host.state(), ServerState::Pause);
    assert_eq!(solver.log().elapsed_msec, 20);
}

#[test]
fn seed_is_fixed_once_the_match_runs() {
    init();
    let network = LocalNetwork::new();
    let config = HostConfig {
        seed: Some(1),
        ..Default::default()
    };
    let (mut host, _host_world) = start_host(&network, config);

    host.queue(&ServerSeed::new(2).encode());
    assert_eq!(host.seed(), 2);

    host.queue(&ServerAction.encode());
    let logged = host.log_len();
    host.queue(&ServerSeed::new(3).encode());

    assert_eq!(host.seed(), 2);
    assert_eq!(host.log_len(), logged + 1);
}

// ========== Remote Solver Tests ==========

#[test]
fn launch_moves_remotes_to_action() {
    init();
    let network = LocalNetwork::new();
    let (mut host, _host_world) = start_host(&network, HostConfig::default());
    let (mut remote, remote_world) = start_remote(&network, 7001, RemoteConfig::default());
    let solver = RecordingSolver::new();
    remote.set_solver(Box::new(solver.clone()));

    exchange(&mut host, &mut [&mut remote]);
    assert_eq!(remote.state(), ServerState::Prepare);
    assert_eq!(solver.log().seed, Some(host.seed()));

    host.queue(&ServerLaunch.encode());
    host.queue(&DebugValue::new(4).encode());
    exchange(&mut host, &mut [&mut remote]);

    assert_eq!(remote.state(), ServerState::Action);
    let applied: Vec<u16> = solver.log().applied.iter().map(|event| event.id).collect();
    assert_eq!(applied, vec![ids::SERVER_LAUNCH, ids::DEBUG]);
    assert!(remote_world.debug_values().is_empty());
    assert!(solver.log().elapsed_msec > 0);
}
