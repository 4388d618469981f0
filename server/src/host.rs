use std::{net::SocketAddr, sync::Arc};

use log::{debug, info, trace, warn};

use lockstep_shared::{
    ids,
    protocol::{id_of, index_of, time_of},
    Admission, ActorId, ClientEnter, ClientLeave, ClientReady, Command, DatagramSocket, EventOrder,
    Factory, Ping, PublicKey, RequestEvents, ServerAction, ServerClock, ServerPause, ServerQuit,
    ServerSeed, ServerState, SlotCreate, SlotRemove, Solver, World,
};

cfg_if! {
    if #[cfg(feature = "transport_udp")] {
        use lockstep_shared::UdpNode;
    }
}

use crate::{error::HostError, host_config::HostConfig, slot::Slot};

/// Where a command entered the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    /// Submitted by the host application through [`Host::queue`].
    Host,
    Slot(usize),
}

/// The authoritative end of a lockstep session.
///
/// The host accepts slots over a datagram socket, admits their ordered
/// commands into per-slot reorder queues, and appends every accepted event
/// to one canonical log that is broadcast to all slots in log order. While
/// preparing, events are performed on the world directly; during live play
/// they are handed to the solver.
pub struct Host {
    config: HostConfig,
    factory: Arc<dyn Factory>,
    world: Arc<dyn World>,
    solver: Option<Box<dyn Solver>>,
    socket: Option<Box<dyn DatagramSocket>>,
    slots: Vec<Slot>,
    log: Vec<Vec<u8>>,
    sent: usize,
    state: ServerState,
    tick_duration_msec: u64,
    seed: u64,
}

impl Host {
    /// Create a new Host
    pub fn new(config: HostConfig, factory: Arc<dyn Factory>, world: Arc<dyn World>) -> Self {
        let seed = config.seed.unwrap_or_else(|| fastrand::u64(..));
        let tick_duration_msec = config.tick_duration_msec;

        Self {
            config,
            factory,
            world,
            solver: None,
            socket: None,
            slots: Vec::new(),
            log: Vec::new(),
            sent: 0,
            state: ServerState::Prepare,
            tick_duration_msec,
            seed,
        }
    }

    pub fn set_solver(&mut self, mut solver: Box<dyn Solver>) {
        solver.set_seed(self.seed);
        self.solver = Some(solver);
    }

    /// Only accept the given command ids from slots. An empty list accepts
    /// every command.
    pub fn set_allowed_commands(&mut self, commands: &[u16]) {
        self.config.allowed_commands = commands.to_vec();
    }

    /// Listen for slots on the given UDP port. Port 0 picks any free port.
    #[cfg(feature = "transport_udp")]
    pub fn listen(&mut self, port: u16) -> Result<(), HostError> {
        if self.is_listening() {
            return Err(HostError::AlreadyListening { port: self.port() });
        }
        let node = UdpNode::bind(port)?;
        self.listen_with(Box::new(node))
    }

    /// Listen for slots on the given socket
    pub fn listen_with(&mut self, socket: Box<dyn DatagramSocket>) -> Result<(), HostError> {
        if self.is_listening() {
            return Err(HostError::AlreadyListening { port: self.port() });
        }

        self.socket = Some(socket);
        info!("[ host ] listening on port {}", self.port());

        debug!("[ host ] -> server-clock");
        self.perform_event(Origin::Host, &ServerClock::new(self.tick_duration_msec).encode());

        debug!("[ host ] -> server-seed");
        self.perform_event(Origin::Host, &ServerSeed::new(self.seed).encode());

        Ok(())
    }

    pub fn is_listening(&self) -> bool {
        self.socket.is_some()
    }

    /// Submit an event from the host application.
    pub fn queue(&mut self, seq: &[u8]) {
        if seq.is_empty() {
            debug!("[ host ] ignore empty event");
            return;
        }
        self.perform_event(Origin::Host, seq);
    }

    /// Run one host step: receive, perform queued slot events, broadcast the
    /// log, then advance the simulation.
    pub fn tick(&mut self, delta_msec: u64) {
        self.receive_events();
        self.process_slots();
        self.send_events();

        if self.state == ServerState::Action {
            if let Some(solver) = self.solver.as_mut() {
                solver.advance(delta_msec);
            }
        }
    }

    // Accessors

    /// Local port, or 0 when not listening.
    pub fn port(&self) -> u16 {
        self.socket
            .as_ref()
            .and_then(|socket| socket.local_addr())
            .map_or(0, |address| address.port())
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn set_state(&mut self, state: ServerState) {
        if self.state != state {
            info!("[ host ] state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    pub fn tick_duration(&self) -> u64 {
        self.tick_duration_msec
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Actor ids of the slots that entered.
    pub fn actors(&self) -> Vec<ActorId> {
        self.slots.iter().filter_map(Slot::actor).collect()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Length of the canonical event log.
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Encoded event at the given log index.
    pub fn log_event(&self, index: usize) -> Option<&[u8]> {
        self.log.get(index).map(Vec::as_slice)
    }

    // Receive

    fn receive_events(&mut self) {
        self.receive_chunks();
        self.process_buffers();
    }

    fn receive_chunks(&mut self) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };

        let mut datagrams = Vec::new();
        loop {
            match socket.receive() {
                Ok(Some((address, payload))) => datagrams.push((address, payload.to_vec())),
                Ok(None) => break,
                Err(err) => {
                    warn!("[ host ] {}", err);
                    break;
                }
            }
        }

        for (address, datagram) in datagrams {
            let Some(slot) = self.find_slot(address) else {
                continue;
            };

            let slot_state = &mut self.slots[slot];
            if slot_state.cipher.is_ready() {
                trace!("[ host ] sealed {:02x?}", datagram);
            }

            let plain = slot_state.cipher.decrypt(&datagram);
            if plain.is_empty() {
                debug!("[ host ] unable to decrypt chunk");
                continue;
            }

            trace!("[ host ] plain {:02x?}", plain);
            debug!("[ host ] RECV {} bytes on slot {}", plain.len(), slot);

            slot_state.decoder.extend(&plain);
        }
    }

    fn process_buffers(&mut self) {
        for slot in 0..self.slots.len() {
            let (frames, desync) = self.slots[slot].take_frames();

            for seq in frames {
                let Some(id) = id_of(&seq) else {
                    continue;
                };
                if self.is_allowed(id) {
                    self.add_event(slot, &seq);
                } else {
                    debug!("[ host ] command {} not allowed", id);
                }
            }

            if let Some(err) = desync {
                warn!("[ host ] ignore invalid data on slot {}: {}", slot, err);
            }
        }
    }

    fn is_allowed(&self, id: u16) -> bool {
        self.config.allowed_commands.is_empty() || self.config.allowed_commands.contains(&id)
    }

    fn find_slot(&mut self, address: SocketAddr) -> Option<usize> {
        if let Some(slot) = self.slots.iter().position(|slot| slot.address == address) {
            return Some(slot);
        }

        match Slot::try_new(address, self.config.channel.max_queue_ahead) {
            Ok(slot) => {
                info!("[ host ] new slot {} for {}", self.slots.len(), address);
                self.slots.push(slot);
                Some(self.slots.len() - 1)
            }
            Err(err) => {
                warn!("[ host ] {}", HostError::from(err));
                None
            }
        }
    }

    fn add_event(&mut self, slot: usize, seq: &[u8]) {
        if index_of(seq).is_none() {
            // public-key, request-events and ping
            if !self.perform_control(Origin::Slot(slot), seq) {
                debug!("[ host ] ignore unordered event on slot {}", slot);
            }
            return;
        }

        match self.slots[slot].queue.admit(seq) {
            Admission::Stored => {}
            Admission::Duplicate | Admission::Stale => {
                debug!(
                    "[ host ] event {:?} duplicate on slot {}",
                    index_of(seq),
                    slot
                );
            }
            Admission::TooFarAhead => {
                warn!(
                    "[ host ] event {:?} too far ahead on slot {}, dropped",
                    index_of(seq),
                    slot
                );
            }
            Admission::Unordered => {}
        }
    }

    // Process

    fn process_slots(&mut self) {
        for slot in 0..self.slots.len() {
            self.perform_queue(slot);
        }
        self.clean_slots();
    }

    fn perform_queue(&mut self, slot: usize) {
        for seq in self.slots[slot].queue.take_ready() {
            self.perform_event(Origin::Slot(slot), &seq);
        }

        let channel = &self.config.channel;
        let missing = self.slots[slot].queue.missing(channel.resend_batch);

        if !missing.is_empty() && missing.len() >= channel.resend_threshold {
            debug!("[ host ] {} :: request-events {:?}", slot, missing);
            self.send_event_to(slot, &RequestEvents::new(&missing).encode());
        }
    }

    fn clean_slots(&mut self) {
        self.slots.retain(|slot| {
            if slot.actor.is_none() {
                info!("[ host ] remove slot {}", slot.address);
            }
            slot.actor.is_some()
        });
    }

    /// Append an event to the log and perform it.
    fn perform_event(&mut self, origin: Origin, seq: &[u8]) {
        if time_of(seq).is_some() {
            debug!("[ host ] ignore timed event");
            return;
        }

        if self.perform_control(origin, seq) {
            return;
        }

        let Some(mut event) = self.factory.decode(seq) else {
            warn!("[ host ] unable to decode command");
            return;
        };

        if let Origin::Slot(slot) = origin {
            event.actor = self.slots[slot].actor;
        }

        event.order = EventOrder::new(self.log.len() as u64);
        self.log.push(event.encode());

        match (self.state, self.solver.as_mut()) {
            (ServerState::Prepare, _) | (_, None) => self.world.perform(&event),
            (_, Some(solver)) => solver.apply(event),
        }
    }

    /// Handle commands that act on the host itself. Returns true when the
    /// command was consumed and must not enter the log.
    fn perform_control(&mut self, origin: Origin, seq: &[u8]) -> bool {
        let name = id_of(seq)
            .and_then(ids::name_by_id)
            .unwrap_or("?");

        if Ping::scan(seq) {
            if let Origin::Slot(slot) = origin {
                debug!("[ host ] {} :: {}", slot, name);
                self.send_event_to(slot, seq);
            }
            return true;
        }

        if ServerAction::scan(seq) {
            debug!("[ host ] {:?} :: {}", origin, name);
            self.set_state(ServerState::Action);
            return true;
        }

        if ServerPause::scan(seq) {
            debug!("[ host ] {:?} :: {}", origin, name);
            self.set_state(ServerState::Pause);
            return true;
        }

        if let Some(clock) = ServerClock::decode(seq) {
            debug!("[ host ] {:?} :: {}", origin, name);
            self.tick_duration_msec = clock.tick_duration_msec;
            return false;
        }

        if let Some(seed) = ServerSeed::decode(seq) {
            debug!("[ host ] {:?} :: {}", origin, name);
            if self.state != ServerState::Prepare {
                // the seed is fixed once the match runs
                debug!("[ host ] ignore seed outside prepare");
                return false;
            }
            self.seed = seed.seed;
            if let Some(solver) = self.solver.as_mut() {
                solver.set_seed(seed.seed);
            }
            return false;
        }

        if PublicKey::scan(seq) {
            if let Origin::Slot(slot) = origin {
                debug!("[ host ] {} :: {}", slot, name);
                self.exchange_keys(slot, seq);
            }
            return true;
        }

        if RequestEvents::scan(seq)
            || ClientEnter::scan(seq)
            || ClientLeave::scan(seq)
            || ClientReady::scan(seq)
        {
            match origin {
                Origin::Slot(slot) => {
                    debug!("[ host ] {} :: {}", slot, name);
                    self.perform_slot_command(slot, seq);
                }
                Origin::Host => debug!("[ host ] ignore {} from host", name),
            }
            return true;
        }

        // server-launch, server-quit and every other event go to the log
        false
    }

    fn exchange_keys(&mut self, slot: usize, seq: &[u8]) {
        if PublicKey::cipher_of(seq) != Some(ids::CIPHER_X25519_CHACHA20) {
            warn!("[ host ] unknown cipher on slot {}", slot);
            return;
        }

        let reply = PublicKey::new(
            ids::CIPHER_X25519_CHACHA20,
            self.slots[slot].cipher.public_key(),
        )
        .encode();
        self.send_event_to(slot, &reply);

        let slot_state = &mut self.slots[slot];
        slot_state.encrypt = false;
        slot_state.clear_len = slot_state.encoder.len();

        match slot_state.cipher.set_remote_key(PublicKey::key_of(seq)) {
            Ok(()) => debug!("[ host ] mutual key on slot {}", slot),
            Err(err) => warn!("[ host ] key exchange failed on slot {}: {}", slot, err),
        }
    }

    fn perform_slot_command(&mut self, slot: usize, seq: &[u8]) {
        if let Some(request) = RequestEvents::decode(seq) {
            for n in request.events {
                match self.log.get(n as usize).cloned() {
                    Some(event) => {
                        debug!("[ host ] resend event {}", n);
                        self.send_event_to(slot, &event);
                    }
                    None => debug!("[ host ] no requested event {}", n),
                }
            }
            return;
        }

        if ClientEnter::scan(seq) {
            if self.slots[slot].actor.is_some() {
                debug!("[ host ] slot {} already entered", slot);
                return;
            }

            self.slots[slot].actor = Some(self.world.reserve(None));

            debug!("[ host ] -> {} :: slot-create", slot);
            self.perform_event(Origin::Slot(slot), &SlotCreate::default().encode());
            return;
        }

        if ClientLeave::scan(seq) {
            if self.state != ServerState::Prepare {
                debug!("[ host ] ignore command");
                return;
            }

            self.perform_event(Origin::Slot(slot), &SlotRemove.encode());

            if let Some(actor) = self.slots[slot].actor.take() {
                self.world.release(actor);
            }
            return;
        }

        if ClientReady::scan(seq) {
            if self.state != ServerState::Prepare {
                debug!("[ host ] ignore command");
                return;
            }

            match self.factory.decode(seq) {
                Some(mut event) => {
                    event.actor = self.slots[slot].actor;
                    self.world.perform(&event);
                }
                None => warn!("[ host ] unable to decode command"),
            }
        }
    }

    // Send

    fn send_events(&mut self) {
        while self.sent < self.log.len() {
            let seq = std::mem::take(&mut self.log[self.sent]);
            self.send_event(&seq);
            self.log[self.sent] = seq;
            self.sent += 1;
        }

        self.send_chunks();
    }

    /// Queue an event for every slot.
    fn send_event(&mut self, seq: &[u8]) {
        for slot in 0..self.slots.len() {
            self.send_event_to(slot, seq);
        }
    }

    /// Queue an event for one slot. `slot-create` names the receiving
    /// slot's own actor as its recipient.
    fn send_event_to(&mut self, slot: usize, seq: &[u8]) {
        let slot = &mut self.slots[slot];

        if SlotCreate::scan(seq) {
            let mut altered = seq.to_vec();
            SlotCreate::alter(&mut altered, slot.actor);
            slot.encoder.append(&altered);
        } else {
            slot.encoder.append(seq);
        }
    }

    fn send_chunks(&mut self) {
        let Some(socket) = self.socket.as_mut() else {
            for slot in &mut self.slots {
                slot.encoder.clear();
                slot.clear_len = 0;
            }
            return;
        };

        let chunk_size = self.config.channel.chunk_size;

        for (n, slot) in self.slots.iter_mut().enumerate() {
            if slot.encoder.is_empty() {
                continue;
            }

            while !slot.encoder.is_empty() {
                let encrypt = slot.encrypt;
                let chunk = slot.encoder.peek_chunk(chunk_size);

                if chunk.is_empty() {
                    warn!("[ host ] unable to adjust chunk size on slot {}", n);
                    slot.encoder.clear();
                    slot.clear_len = 0;
                    break;
                }

                trace!("[ host ] chunk {:02x?}", chunk);
                let chunk_len = chunk.len();

                let datagram = if encrypt {
                    match slot.cipher.encrypt(chunk) {
                        Ok(datagram) => {
                            debug!(
                                "[ host ] SEND {} bytes to {} (encrypted)",
                                datagram.len(),
                                slot.address
                            );
                            datagram
                        }
                        Err(err) => {
                            warn!("[ host ] unable to encrypt chunk: {}", err);
                            slot.encoder.clear();
                            slot.clear_len = 0;
                            break;
                        }
                    }
                } else {
                    debug!("[ host ] SEND {} bytes to {}", chunk_len, slot.address);
                    chunk.to_vec()
                };

                if let Err(err) = socket.send_to(&slot.address, &datagram) {
                    warn!("[ host ] {}", err);
                }

                slot.encoder.consume(chunk_len);

                if !encrypt {
                    slot.clear_len = slot.clear_len.saturating_sub(chunk_len);
                    if slot.clear_len == 0 {
                        slot.encrypt = slot.cipher.is_ready();
                    }
                }
            }
        }
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        if self.socket.is_some() {
            debug!("[ host ] -> server-quit");
            self.perform_event(Origin::Host, &ServerQuit.encode());
            self.send_events();
        }
    }
}
