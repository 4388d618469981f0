use std::{net::SocketAddr, sync::Arc};

use log::{debug, info, trace, warn};

use lockstep_shared::{
    ids,
    protocol::{actor_of, id_of, index_of, set_index},
    Admission, ActorId, CipherSession, ClientEnter, ClientLeave, Command, DatagramSocket, Decoder,
    Encoder, EventQueue, Factory, Ping, PublicKey, RequestEvents, ServerAction, ServerClock,
    ServerLaunch, ServerPause, ServerQuit, ServerSeed, ServerState, SlotCreate, Solver, World,
};

cfg_if! {
    if #[cfg(feature = "transport_udp")] {
        use lockstep_shared::UdpNode;
    }
}

use crate::{error::RemoteError, remote_config::RemoteConfig};

/// The client end of a lockstep session.
///
/// Mirrors the host for a single connection: ordered commands queued
/// locally are stamped with consecutive indices and kept for resends, and
/// the host's event stream is admitted into a reorder queue and performed
/// in log order.
pub struct Remote {
    config: RemoteConfig,
    factory: Arc<dyn Factory>,
    world: Arc<dyn World>,
    solver: Option<Box<dyn Solver>>,
    socket: Option<Box<dyn DatagramSocket>>,
    host_address: Option<SocketAddr>,
    cipher: CipherSession,
    decoder: Decoder,
    encoder: Encoder,
    queue: EventQueue,
    local_log: Vec<Vec<u8>>,
    actor: Option<ActorId>,
    state: ServerState,
    tick_duration_msec: u64,
    seed: u64,
    is_quit: bool,
}

impl Remote {
    /// Create a new Remote, failing if its cipher session cannot generate
    /// a key pair
    pub fn try_new(
        config: RemoteConfig,
        factory: Arc<dyn Factory>,
        world: Arc<dyn World>,
    ) -> Result<Self, RemoteError> {
        let queue = EventQueue::new(config.channel.max_queue_ahead);
        let cipher = CipherSession::try_new()?;

        Ok(Self {
            config,
            factory,
            world,
            solver: None,
            socket: None,
            host_address: None,
            cipher,
            decoder: Decoder::new(),
            encoder: Encoder::new(),
            queue,
            local_log: Vec::new(),
            actor: None,
            state: ServerState::Prepare,
            tick_duration_msec: 0,
            seed: 0,
            is_quit: false,
        })
    }

    /// Create a new Remote
    ///
    /// # Panics
    /// Panics if the system random source is unavailable
    pub fn new(config: RemoteConfig, factory: Arc<dyn Factory>, world: Arc<dyn World>) -> Self {
        Self::try_new(config, factory, world).expect("Failed to create Remote")
    }

    pub fn set_solver(&mut self, solver: Box<dyn Solver>) {
        self.solver = Some(solver);
    }

    /// Connect to a host, binding a local UDP port.
    #[cfg(feature = "transport_udp")]
    pub fn connect(&mut self, host_address: SocketAddr) -> Result<(), RemoteError> {
        if let Some(address) = self.host_address {
            return Err(RemoteError::AlreadyConnected { address });
        }
        let node = UdpNode::bind(self.config.port)?;
        self.connect_with(Box::new(node), host_address)
    }

    /// Connect to a host through the given socket
    pub fn connect_with(
        &mut self,
        socket: Box<dyn DatagramSocket>,
        host_address: SocketAddr,
    ) -> Result<(), RemoteError> {
        if let Some(address) = self.host_address {
            return Err(RemoteError::AlreadyConnected { address });
        }

        self.socket = Some(socket);
        self.host_address = Some(host_address);
        info!("[ remote ] connecting to {}", host_address);

        if self.config.encrypt {
            debug!("[ remote ] -> public-key");
            let offer = PublicKey::new(ids::CIPHER_X25519_CHACHA20, self.cipher.public_key());
            self.queue(&offer.encode());
        }

        debug!("[ remote ] -> client-enter");
        self.queue(&ClientEnter.encode());

        Ok(())
    }

    /// Submit a command to the host.
    pub fn queue(&mut self, seq: &[u8]) {
        if seq.is_empty() {
            debug!("[ remote ] ignore empty event");
            return;
        }

        if index_of(seq).is_none() && id_of(seq).map_or(false, ids::is_control) {
            self.encoder.append(seq);
            return;
        }

        let mut seq = seq.to_vec();
        if !set_index(&mut seq, self.local_log.len() as u64) {
            warn!("[ remote ] ignore malformed event");
            return;
        }

        self.encoder.append(&seq);
        self.local_log.push(seq);
    }

    /// Run one remote step: receive and perform the host's events, request
    /// missing ones, send queued commands, then advance the simulation.
    pub fn tick(&mut self, delta_msec: u64) {
        self.receive_events();
        self.perform_queue();
        self.send_chunks();

        if self.state == ServerState::Action {
            if let Some(solver) = self.solver.as_mut() {
                solver.advance(delta_msec);
            }
        }
    }

    // Accessors

    /// True once the host assigned an actor, until the host quits.
    pub fn is_connected(&self) -> bool {
        self.actor.is_some() && !self.is_quit
    }

    pub fn actor(&self) -> Option<ActorId> {
        self.actor
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn tick_duration(&self) -> u64 {
        self.tick_duration_msec
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_ready()
    }

    /// Bytes lost to datagrams that failed to decrypt.
    pub fn loss_count(&self) -> usize {
        self.cipher.loss_count()
    }

    /// Local port, or 0 when not connected.
    pub fn port(&self) -> u16 {
        self.socket
            .as_ref()
            .and_then(|socket| socket.local_addr())
            .map_or(0, |address| address.port())
    }

    /// Absolute index of the next host event to perform.
    pub fn event_index(&self) -> u64 {
        self.queue.index()
    }

    // Receive

    fn receive_events(&mut self) {
        let (Some(socket), Some(host_address)) = (self.socket.as_mut(), self.host_address) else {
            return;
        };

        let mut datagrams = Vec::new();
        loop {
            match socket.receive() {
                Ok(Some((address, payload))) => {
                    if address == host_address {
                        datagrams.push(payload.to_vec());
                    } else {
                        debug!("[ remote ] ignore datagram from {}", address);
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("[ remote ] {}", err);
                    break;
                }
            }
        }

        // A key reply must be installed before the next datagram is opened.
        for datagram in datagrams {
            let plain = self.cipher.decrypt(&datagram);
            if plain.is_empty() {
                debug!("[ remote ] unable to decrypt chunk");
                continue;
            }

            trace!("[ remote ] plain {:02x?}", plain);
            debug!("[ remote ] RECV {} bytes", plain.len());

            self.decoder.extend(&plain);
            self.process_buffer();
        }
    }

    fn process_buffer(&mut self) {
        loop {
            match self.decoder.next_frame() {
                Ok(Some(seq)) => self.add_event(&seq),
                Ok(None) => break,
                Err(err) => {
                    warn!("[ remote ] ignore invalid data: {}", err);
                    break;
                }
            }
        }
    }

    fn add_event(&mut self, seq: &[u8]) {
        if index_of(seq).is_none() {
            if !self.perform_control(seq) {
                debug!("[ remote ] ignore unordered event");
            }
            return;
        }

        match self.queue.admit(seq) {
            Admission::Stored | Admission::Unordered => {}
            Admission::Duplicate | Admission::Stale => {
                debug!("[ remote ] event {:?} duplicate", index_of(seq));
            }
            Admission::TooFarAhead => {
                warn!("[ remote ] event {:?} too far ahead, dropped", index_of(seq));
            }
        }
    }

    // Process

    fn perform_queue(&mut self) {
        for seq in self.queue.take_ready() {
            self.perform_event(&seq);
        }

        let channel = &self.config.channel;
        let missing = self.queue.missing(channel.resend_batch);

        if !missing.is_empty() && missing.len() >= channel.resend_threshold {
            debug!("[ remote ] -> request-events {:?}", missing);
            self.encoder.append(&RequestEvents::new(&missing).encode());
        }
    }

    fn perform_event(&mut self, seq: &[u8]) {
        if self.perform_control(seq) {
            return;
        }

        let Some(event) = self.factory.decode(seq) else {
            warn!("[ remote ] unable to decode command");
            return;
        };

        match (self.state, self.solver.as_mut()) {
            (ServerState::Prepare, _) | (_, None) => self.world.perform(&event),
            (_, Some(solver)) => solver.apply(event),
        }
    }

    /// Handle commands that act on the remote itself. Returns true when the
    /// command was consumed and must not reach the world.
    fn perform_control(&mut self, seq: &[u8]) -> bool {
        let name = id_of(seq).and_then(ids::name_by_id).unwrap_or("?");

        if PublicKey::scan(seq) {
            debug!("[ remote ] {}", name);
            if PublicKey::cipher_of(seq) != Some(ids::CIPHER_X25519_CHACHA20) {
                warn!("[ remote ] unknown cipher");
            } else if let Err(err) = self.cipher.set_remote_key(PublicKey::key_of(seq)) {
                warn!("[ remote ] key exchange failed: {}", err);
            } else {
                debug!("[ remote ] mutual key");
            }
            return true;
        }

        if let Some(request) = RequestEvents::decode(seq) {
            debug!("[ remote ] {}", name);
            for n in request.events {
                match self.local_log.get(n as usize) {
                    Some(event) => {
                        debug!("[ remote ] resend event {}", n);
                        self.encoder.append(event);
                    }
                    None => debug!("[ remote ] no requested event {}", n),
                }
            }
            return true;
        }

        if Ping::scan(seq) {
            debug!("[ remote ] {}", name);
            return true;
        }

        if ServerLaunch::scan(seq) {
            debug!("[ remote ] {}", name);
            self.set_state(ServerState::Action);
            return false;
        }

        if ServerAction::scan(seq) {
            debug!("[ remote ] {}", name);
            self.set_state(ServerState::Action);
            return true;
        }

        if ServerPause::scan(seq) {
            debug!("[ remote ] {}", name);
            self.set_state(ServerState::Pause);
            return true;
        }

        if let Some(clock) = ServerClock::decode(seq) {
            debug!("[ remote ] {}", name);
            self.tick_duration_msec = clock.tick_duration_msec;
            return false;
        }

        if let Some(seed) = ServerSeed::decode(seq) {
            debug!("[ remote ] {}", name);
            if self.state != ServerState::Prepare {
                debug!("[ remote ] ignore seed outside prepare");
                return false;
            }
            self.seed = seed.seed;
            if let Some(solver) = self.solver.as_mut() {
                solver.set_seed(seed.seed);
            }
            return false;
        }

        if ServerQuit::scan(seq) {
            info!("[ remote ] host quit");
            self.is_quit = true;
            return false;
        }

        if let Some(slot) = SlotCreate::decode(seq) {
            let slot_actor = actor_of(seq);
            debug!("[ remote ] {} {:?}", name, slot_actor);
            if slot.is_local(slot_actor) {
                info!("[ remote ] entered as actor {:?}", slot_actor);
                self.actor = slot_actor;
            }
            return false;
        }

        false
    }

    fn set_state(&mut self, state: ServerState) {
        if self.state != state {
            info!("[ remote ] state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    // Send

    fn send_chunks(&mut self) {
        let (Some(socket), Some(host_address)) = (self.socket.as_mut(), self.host_address) else {
            self.encoder.clear();
            return;
        };

        let chunk_size = self.config.channel.chunk_size;
        let encrypt = self.cipher.is_ready();

        while !self.encoder.is_empty() {
            let chunk = self.encoder.peek_chunk(chunk_size);

            if chunk.is_empty() {
                warn!("[ remote ] unable to adjust chunk size");
                self.encoder.clear();
                return;
            }

            trace!("[ remote ] chunk {:02x?}", chunk);
            let chunk_len = chunk.len();

            let datagram = if encrypt {
                match self.cipher.encrypt(chunk) {
                    Ok(datagram) => datagram,
                    Err(err) => {
                        warn!("[ remote ] unable to encrypt chunk: {}", err);
                        self.encoder.clear();
                        return;
                    }
                }
            } else {
                chunk.to_vec()
            };

            debug!(
                "[ remote ] SEND {} bytes to {}{}",
                datagram.len(),
                host_address,
                if encrypt { " (encrypted)" } else { "" }
            );

            if let Err(err) = socket.send_to(&host_address, &datagram) {
                warn!("[ remote ] {}", err);
            }

            self.encoder.consume(chunk_len);
        }
    }
}

impl Drop for Remote {
    fn drop(&mut self) {
        if self.is_connected() {
            debug!("[ remote ] -> client-leave");
            self.queue(&ClientLeave.encode());
            self.send_chunks();
        }
    }
}
