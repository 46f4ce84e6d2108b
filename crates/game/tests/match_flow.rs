use duel::{
    Block, BlockColor, ConnectionId, Cursor, Direction, GameState, MatchSession, Packet,
    PacketReader, PacketType, PlayerInput, PlayerSlot, RoomRegistry, SessionEvent,
    SimulationConfig, Winner, write_packet,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::net::{TcpListener, TcpStream};

const ROOM: &str = "TEST";

/// Two sessions wired to a registry, with deliveries applied in order.
struct Relay {
    registry: RoomRegistry,
    sessions: Vec<MatchSession>,
    rng: StdRng,
    now_ms: u64,
}

impl Relay {
    fn new(resync_probability: f64) -> Self {
        let sessions = (0..2)
            .map(|i| MatchSession::with_seed(ROOM, SimulationConfig::default(), 100 + i))
            .collect();
        Self {
            registry: RoomRegistry::new(resync_probability),
            sessions,
            rng: StdRng::seed_from_u64(5),
            now_ms: 0,
        }
    }

    /// Delivers everything the registry produces and returns the events
    /// each recipient reported, tagged with its index.
    fn send(&mut self, from: usize, packets: Vec<Packet>) -> Vec<(usize, SessionEvent)> {
        let mut events = Vec::new();
        for packet in packets {
            let out = self
                .registry
                .handle(from as ConnectionId, packet, &mut self.rng);
            for delivery in out {
                let to = delivery.to as usize;
                if let Some(session) = self.sessions.get_mut(to) {
                    if let Some(event) = session.handle_packet(delivery.packet, self.now_ms) {
                        events.push((to, event));
                    }
                }
            }
        }
        events
    }

    fn edit(&mut self, i: usize, edit: impl FnOnce(&mut GameState)) {
        let mut state = self.sessions[i].local().state().clone();
        edit(&mut state);
        self.sessions[i].load_local(state);
    }

    fn joined() -> Self {
        Self::joined_with(0.0)
    }

    fn joined_with(resync_probability: f64) -> Self {
        let mut relay = Self::new(resync_probability);
        for i in 0..2 {
            let join = relay.sessions[i].join_packet();
            relay.send(i, vec![join]);
        }
        relay
    }

    fn started() -> Self {
        let mut relay = Self::joined();
        let start = relay.sessions[0].request_start();
        relay.send(0, start.into_iter().collect());
        for i in 0..2 {
            relay.edit(i, |state| state.board.clear());
        }
        relay
    }

    fn tick(&mut self, i: usize, now_ms: u64) -> Vec<(usize, SessionEvent)> {
        self.now_ms = now_ms;
        let out = self.sessions[i].tick(now_ms);
        self.send(i, out)
    }

    fn input(&mut self, i: usize, input: PlayerInput) {
        let out = self.sessions[i].input(input, self.now_ms);
        self.send(i, out);
    }
}

#[test]
fn test_two_clients_join_and_start() {
    let relay = Relay::joined();
    assert_eq!(relay.sessions[0].client_id(), Some(PlayerSlot::One));
    assert_eq!(relay.sessions[1].client_id(), Some(PlayerSlot::Two));
    assert!(relay.sessions.iter().all(|s| s.connected() == 2));

    let relay = Relay::started();
    assert!(relay.sessions.iter().all(|s| s.is_playing()));
    assert!(relay.registry.get(ROOM).is_some_and(|r| r.state.game_started));
}

#[test]
fn test_swap_result_reaches_opponent_mirror() {
    let mut relay = Relay::started();
    let blue = Some(Block::colored(BlockColor::Blue));
    relay.edit(0, |state| {
        state.board.set(0, 11, blue);
        state.board.set(1, 11, Some(Block::colored(BlockColor::Red)));
        state.board.set(2, 11, blue);
        state.board.set(3, 11, blue);
        state.board.set(5, 11, Some(Block::colored(BlockColor::Green)));
        state.cursor = Cursor::new(0, 11);
    });

    relay.input(0, PlayerInput::Swap);

    let local = relay.sessions[0].local().state().clone();
    let mirror = relay.sessions[1].mirror();
    assert_eq!(local.score, 30);
    assert_eq!(mirror.score, 30);
    assert_eq!(mirror.combo, 1);
    assert_eq!(mirror.board, local.board);
    assert_eq!(mirror.board.block_count(), 2);

    let room = relay.registry.get(ROOM).unwrap();
    assert_eq!(room.state.player1.board, local.board);
}

#[test]
fn test_cursor_moves_are_mirrored() {
    let mut relay = Relay::started();
    relay.input(1, PlayerInput::Move(Direction::Up));
    relay.input(1, PlayerInput::Move(Direction::Right));

    let cursor = relay.sessions[1].local().state().cursor;
    assert_eq!(cursor, Cursor::new(3, 7));
    assert_eq!(relay.sessions[0].mirror().cursor, cursor);
}

#[test]
fn test_garbage_lands_on_target_only() {
    let mut relay = Relay::started();
    relay.send(
        0,
        vec![Packet::new(PacketType::SendGarbage {
            room: ROOM.to_string(),
            lines: 2,
            target_player: PlayerSlot::Two,
        })],
    );

    assert_eq!(relay.sessions[0].local().state().board.block_count(), 0);
    let target_blocks = relay.sessions[1].local().state().board.block_count();
    assert!(target_blocks > 0);

    relay.tick(1, 100);
    assert_eq!(
        relay.sessions[0].mirror().board,
        relay.sessions[1].local().state().board
    );
}

#[test]
fn test_combo_chain_buries_the_opponent() {
    let mut relay = Relay::started();
    let red = Some(Block::colored(BlockColor::Red));
    let green = Some(Block::colored(BlockColor::Green));
    let blue = Some(Block::colored(BlockColor::Blue));
    relay.edit(0, |state| {
        for x in 0..3 {
            state.board.set(x, 10, red);
        }
        for y in [8, 9, 11] {
            state.board.set(0, y, green);
        }
        state.board.set(1, 11, blue);
        state.board.set(2, 11, blue);
        state.board.set(0, 7, blue);
    });

    let events = relay.tick(0, 100);
    assert_eq!(events, vec![(1, SessionEvent::GarbageIn(1))]);
    assert_eq!(relay.sessions[0].local().state().board.block_count(), 0);

    let bottom = relay.sessions[1].local().state().board.row(11).copied();
    assert!(bottom.unwrap_or_default().iter().flatten().any(|b| b.is_garbage));

    relay.tick(1, 200);
    assert_eq!(
        relay.sessions[0].mirror().board,
        relay.sessions[1].local().state().board
    );
}

#[test]
fn test_chat_reaches_the_other_player() {
    let mut relay = Relay::joined();
    let packet = relay.sessions[1].chat("good luck");
    let events = relay.send(1, packet.into_iter().collect());

    assert_eq!(
        events,
        vec![(
            0,
            SessionEvent::Chat {
                from: PlayerSlot::Two,
                text: "good luck".to_string(),
            }
        )]
    );
}

#[test]
fn test_top_out_ends_match_for_both() {
    let mut relay = Relay::started();
    relay.edit(1, |state| {
        for y in 0..12 {
            state.board.set(4, y, Some(Block::garbage()));
        }
    });

    relay.tick(1, 100);

    for session in &relay.sessions {
        assert!(!session.is_playing());
        assert_eq!(session.winner(), Winner::Player1);
    }
    assert!(!relay.sessions[0].mirror().is_playing);
    let room = relay.registry.get(ROOM).unwrap();
    assert_eq!(room.state.winner, Winner::Player1);
    assert!(!room.state.game_started);
}

#[test]
fn test_disconnect_mid_game() {
    let mut relay = Relay::started();
    let out = relay.registry.leave(1);
    for delivery in out {
        relay.sessions[delivery.to as usize].handle_packet(delivery.packet, 0);
    }

    assert_eq!(relay.sessions[0].winner(), Winner::Disconnect);
    assert_eq!(relay.sessions[0].connected(), 1);
    assert!(!relay.sessions[0].is_playing());
    assert!(relay.sessions[0].request_start().is_none());
}

#[test]
fn test_full_resync_touches_mirrors_only() {
    let mut relay = Relay::joined_with(1.0);
    let start = relay.sessions[0].request_start();
    relay.send(0, start.into_iter().collect());

    relay.edit(0, |state| state.score = 999);
    relay.input(1, PlayerInput::Move(Direction::Down));

    assert_eq!(relay.sessions[0].local().state().score, 999);
    assert_eq!(
        relay.sessions[0].mirror().cursor,
        relay.sessions[1].local().state().cursor
    );
}

#[tokio::test]
async fn test_packets_cross_a_tcp_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let echo = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = PacketReader::new(read_half);
        while let Some(packet) = reader.next_packet().await.unwrap() {
            write_packet(&mut write_half, &packet).await.unwrap();
        }
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = PacketReader::new(read_half);

    let session = MatchSession::with_seed(ROOM, SimulationConfig::default(), 1);
    let join = session.join_packet();
    write_packet(&mut write_half, &join).await.unwrap();
    assert_eq!(reader.next_packet().await.unwrap(), Some(join));

    drop(write_half);
    assert_eq!(reader.next_packet().await.unwrap(), None);
    echo.await.unwrap();
}
