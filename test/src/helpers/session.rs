use std::sync::Arc;

use lockstep_client::{Remote, RemoteConfig};
use lockstep_server::{Host, HostConfig};
use lockstep_shared::{BasicFactory, Factory, World};

use crate::{local_socket::LocalNetwork, test_world::TestWorld};

pub const HOST_PORT: u16 = 7000;

pub const TICK_MSEC: u64 = 10;

/// Host listening on [`HOST_PORT`] of the given network.
pub fn start_host(network: &LocalNetwork, config: HostConfig) -> (Host, Arc<TestWorld>) {
    let world = TestWorld::new();
    let factory: Arc<dyn Factory> = Arc::new(BasicFactory);
    let world_handle: Arc<dyn World> = world.clone();

    let mut host = Host::new(config, factory, world_handle);
    if let Err(err) = host.listen_with(Box::new(network.socket(HOST_PORT))) {
        panic!("host failed to listen: {}", err);
    }

    (host, world)
}

/// Remote bound on `port`, connecting to [`HOST_PORT`].
pub fn start_remote(
    network: &LocalNetwork,
    port: u16,
    config: RemoteConfig,
) -> (Remote, Arc<TestWorld>) {
    let world = TestWorld::new();
    let factory: Arc<dyn Factory> = Arc::new(BasicFactory);
    let world_handle: Arc<dyn World> = world.clone();

    let mut remote = match Remote::try_new(config, factory, world_handle) {
        Ok(remote) => remote,
        Err(err) => panic!("remote failed to start: {}", err),
    };
    let socket = Box::new(network.socket(port));
    if let Err(err) = remote.connect_with(socket, LocalNetwork::address(HOST_PORT)) {
        panic!("remote failed to connect: {}", err);
    }

    (remote, world)
}
