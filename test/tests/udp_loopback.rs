use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    thread,
    time::Duration,
};

use lockstep_client::{Remote, RemoteConfig, RemoteError};
use lockstep_server::{Host, HostConfig, HostError};
use lockstep_shared::{BasicFactory, CipherError, Command, DebugValue, Factory, World};
use lockstep_test::TestWorld;

fn init() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

fn run_until(host: &mut Host, remote: &mut Remote, done: impl Fn(&Host, &Remote) -> bool) -> bool {
    for _ in 0..200 {
        remote.tick(10);
        host.tick(10);
        remote.tick(10);
        if done(host, remote) {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn encrypted_session_over_loopback_udp() {
    init();

    let factory: Arc<dyn Factory> = Arc::new(BasicFactory);
    let host_world = TestWorld::new();
    let remote_world = TestWorld::new();
    let host_handle: Arc<dyn World> = host_world.clone();
    let remote_handle: Arc<dyn World> = remote_world.clone();

    let mut host = Host::new(HostConfig::default(), factory.clone(), host_handle);
    host.listen(0).unwrap();
    assert_ne!(host.port(), 0);
    assert!(matches!(
        host.listen(0),
        Err(HostError::AlreadyListening { .. })
    ));

    let host_address = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), host.port());
    let mut remote = Remote::try_new(RemoteConfig::default(), factory, remote_handle).unwrap();
    assert!(!remote.is_encrypted());
    remote.connect(host_address).unwrap();
    assert_ne!(remote.port(), 0);
    assert!(matches!(
        remote.connect(host_address),
        Err(RemoteError::AlreadyConnected { .. })
    ));

    assert!(run_until(&mut host, &mut remote, |_, remote| remote.is_connected()));
    assert!(remote.is_encrypted());

    remote.queue(&DebugValue::new(17).encode());
    let actor = remote.actor();
    assert!(run_until(&mut host, &mut remote, |_, _| {
        remote_world.debug_values() == vec![(actor, 17)]
    }));
    assert_eq!(host_world.debug_values(), vec![(actor, 17)]);
}

#[test]
fn remote_reports_cipher_setup_failure() {
    let error = RemoteError::from(CipherError::KeyGeneration);
    assert_eq!(error, RemoteError::Cipher(CipherError::KeyGeneration));

    let msg = format!("{}", error);
    assert!(msg.contains("Cipher error"));
    assert!(msg.contains("key pair"));
}
