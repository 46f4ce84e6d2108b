use rand::Rng;

use crate::net::{GameAction, Packet, PacketType};
use crate::simulation::{InputOutcome, LocalSimulated, PlayerInput, SimulationConfig};
use crate::state::{GameState, MirroredSnapshot, PlayerSlot, Winner};

pub const ROOM_CODE_LEN: usize = 4;
const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_CHARS[rng.gen_range(0..ROOM_CODE_CHARS.len())] as char)
        .collect()
}

/// Something the front end may want to show after an inbound packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Joined(PlayerSlot),
    Denied(String),
    ClientCount(u8),
    Started,
    Resynced,
    GarbageIn(u32),
    Finished(Winner),
    Chat { from: PlayerSlot, text: String },
}

/// One client's view of a match: its own simulated board, a mirror of the
/// opponent, and the rules for what goes on the wire and when.
#[derive(Debug)]
pub struct MatchSession {
    room: String,
    client_id: Option<PlayerSlot>,
    local: LocalSimulated,
    mirror: MirroredSnapshot,
    connected: u8,
    winner: Winner,
    pending_sync: bool,
}

impl MatchSession {
    pub fn new(room: impl Into<String>, config: SimulationConfig) -> Self {
        Self::with_simulation(room, LocalSimulated::new(config))
    }

    pub fn with_seed(room: impl Into<String>, config: SimulationConfig, seed: u64) -> Self {
        Self::with_simulation(room, LocalSimulated::with_seed(config, seed))
    }

    fn with_simulation(room: impl Into<String>, local: LocalSimulated) -> Self {
        Self {
            room: room.into(),
            client_id: None,
            local,
            mirror: MirroredSnapshot::new(),
            connected: 0,
            winner: Winner::None,
            pending_sync: false,
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn client_id(&self) -> Option<PlayerSlot> {
        self.client_id
    }

    pub fn opponent(&self) -> Option<PlayerSlot> {
        self.client_id.map(PlayerSlot::opponent)
    }

    pub fn local(&self) -> &LocalSimulated {
        &self.local
    }

    /// Replaces the local position, leaving connection state alone.
    #[doc(hidden)]
    pub fn load_local(&mut self, state: GameState) {
        self.local.load_state(state);
    }

    pub fn mirror(&self) -> &MirroredSnapshot {
        &self.mirror
    }

    pub fn connected(&self) -> u8 {
        self.connected
    }

    pub fn winner(&self) -> Winner {
        self.winner
    }

    pub fn is_playing(&self) -> bool {
        self.local.is_playing()
    }

    pub fn join_packet(&self) -> Packet {
        Packet::new(PacketType::Join {
            room: self.room.clone(),
        })
    }

    /// Only honoured once two clients share the room and no game is running.
    pub fn request_start(&self) -> Option<Packet> {
        if self.client_id.is_none() || self.connected < 2 || self.local.is_playing() {
            return None;
        }
        Some(Packet::new(PacketType::GameStart {
            room: self.room.clone(),
        }))
    }

    pub fn chat(&self, text: impl Into<String>) -> Option<Packet> {
        self.client_id?;
        Some(Packet::new(PacketType::Chat {
            room: self.room.clone(),
            text: text.into(),
        }))
    }

    pub fn handle_packet(&mut self, packet: Packet, now_ms: u64) -> Option<SessionEvent> {
        match packet.payload {
            PacketType::Joined {
                client_id,
                room_state,
            } => {
                self.client_id = Some(client_id);
                self.local.adopt_snapshot(room_state.player(client_id));
                self.mirror
                    .replace(room_state.player(client_id.opponent()).clone());
                self.winner = room_state.winner;
                Some(SessionEvent::Joined(client_id))
            }
            PacketType::JoinDenied { reason } => Some(SessionEvent::Denied(reason)),
            PacketType::ClientCount { count } => {
                self.connected = count;
                Some(SessionEvent::ClientCount(count))
            }
            PacketType::GameStarted => {
                self.local.start(now_ms);
                let mut opponent = GameState::new();
                opponent.is_playing = true;
                self.mirror.replace(opponent);
                self.winner = Winner::None;
                self.pending_sync = true;
                Some(SessionEvent::Started)
            }
            PacketType::GameStateSync(room_state) => {
                let opponent = self.opponent()?;
                self.mirror.replace(room_state.player(opponent).clone());
                Some(SessionEvent::Resynced)
            }
            PacketType::GameAction {
                player_id, action, ..
            } => {
                if Some(player_id) == self.client_id {
                    return None;
                }
                match action {
                    GameAction::Move { cursor } => {
                        self.mirror.overwrite_cursor(cursor);
                        None
                    }
                    GameAction::BoardSync {
                        board,
                        score,
                        combo,
                    } => {
                        self.mirror.overwrite_board(board, score, combo);
                        None
                    }
                    GameAction::GameOver { winner, .. } => {
                        self.finish(winner);
                        Some(SessionEvent::Finished(winner))
                    }
                }
            }
            PacketType::GarbageReceived { lines } => {
                if self.local.receive_garbage(lines) {
                    self.pending_sync = true;
                }
                Some(SessionEvent::GarbageIn(lines))
            }
            PacketType::GameOver { winner } => {
                self.finish(winner);
                Some(SessionEvent::Finished(winner))
            }
            PacketType::ChatMessage { sender_id, text } => Some(SessionEvent::Chat {
                from: sender_id,
                text,
            }),
            other => {
                log::debug!("ignoring relay-bound {} from server", other.kind());
                None
            }
        }
    }

    /// Runs one simulation step and returns what must be sent for it.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Packet> {
        let Some(me) = self.client_id else {
            return Vec::new();
        };
        if !self.local.is_playing() {
            return Vec::new();
        }

        let report = self.local.tick(now_ms);
        let pending = std::mem::take(&mut self.pending_sync);
        self.outbound(me, report.board_changed || pending, &report.garbage, report.game_over)
    }

    /// Applies local input immediately. A board-affecting input produces
    /// exactly one board sync.
    pub fn input(&mut self, input: PlayerInput, now_ms: u64) -> Vec<Packet> {
        let Some(me) = self.client_id else {
            return Vec::new();
        };

        match self.local.apply_input(input, now_ms) {
            InputOutcome::Rejected => Vec::new(),
            InputOutcome::CursorMoved(cursor) => {
                vec![self.action(me, GameAction::Move { cursor })]
            }
            InputOutcome::BoardChanged { cascade, game_over } => {
                self.pending_sync = false;
                let garbage: Vec<u32> = cascade.garbage().collect();
                self.outbound(me, true, &garbage, game_over)
            }
        }
    }

    fn outbound(
        &mut self,
        me: PlayerSlot,
        board_changed: bool,
        garbage: &[u32],
        game_over: bool,
    ) -> Vec<Packet> {
        let mut out = Vec::new();
        if board_changed {
            out.push(self.action(me, GameAction::board_sync(self.local.state())));
        }
        for &lines in garbage {
            out.push(Packet::new(PacketType::SendGarbage {
                room: self.room.clone(),
                lines,
                target_player: me.opponent(),
            }));
        }
        if game_over {
            let winner = me.opponent().as_winner();
            log::info!("topped out, {} wins", winner.as_str());
            out.push(self.action(me, GameAction::GameOver { winner, loser: me }));
            self.finish(winner);
        }
        out
    }

    fn action(&self, me: PlayerSlot, action: GameAction) -> Packet {
        Packet::new(PacketType::GameAction {
            room: self.room.clone(),
            player_id: me,
            action,
        })
    }

    fn finish(&mut self, winner: Winner) {
        self.winner = winner;
        self.local.stop();
        self.mirror.freeze();
        self.pending_sync = false;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::board::{Block, BlockColor, Board};
    use crate::state::{Cursor, RoomState};

    fn joined(slot: PlayerSlot) -> MatchSession {
        let mut session = MatchSession::with_seed("abcd", SimulationConfig::default(), 9);
        session.handle_packet(
            Packet::new(PacketType::Joined {
                client_id: slot,
                room_state: RoomState::new(),
            }),
            0,
        );
        session
    }

    fn playing(slot: PlayerSlot) -> MatchSession {
        let mut session = joined(slot);
        session.handle_packet(Packet::new(PacketType::ClientCount { count: 2 }), 0);
        session.handle_packet(Packet::new(PacketType::GameStarted), 0);
        edit_local(&mut session, |state| state.board.clear());
        session.pending_sync = false;
        session
    }

    fn edit_local(session: &mut MatchSession, edit: impl FnOnce(&mut GameState)) {
        let mut state = session.local().state().clone();
        edit(&mut state);
        session.load_local(state);
    }

    /// Reds clear, greens drop into a vertical three, then the blues meet
    /// on the bottom row: three clears with the last at combo 3.
    fn three_step_chain(state: &mut GameState) {
        let red = Some(Block::colored(BlockColor::Red));
        let green = Some(Block::colored(BlockColor::Green));
        let blue = Some(Block::colored(BlockColor::Blue));
        for x in 0..3 {
            state.board.set(x, 10, red);
        }
        state.board.set(0, 11, green);
        state.board.set(0, 9, green);
        state.board.set(0, 8, green);
        state.board.set(1, 11, blue);
        state.board.set(2, 11, blue);
        state.board.set(0, 7, blue);
    }

    fn garbage_sends(packets: &[Packet]) -> Vec<(u32, PlayerSlot)> {
        packets
            .iter()
            .filter_map(|p| match &p.payload {
                PacketType::SendGarbage {
                    lines,
                    target_player,
                    ..
                } => Some((*lines, *target_player)),
                _ => None,
            })
            .collect()
    }

    fn kinds(packets: &[Packet]) -> Vec<&'static str> {
        packets.iter().map(|p| p.payload.kind()).collect()
    }

    #[test]
    fn test_room_codes_have_fixed_length() {
        let mut rng = StdRng::seed_from_u64(3);
        let code = generate_room_code(&mut rng);
        assert_eq!(code.len(), ROOM_CODE_LEN);
        assert!(code.bytes().all(|b| ROOM_CODE_CHARS.contains(&b)));
    }

    #[test]
    fn test_joined_splits_room_state() {
        let mut session = MatchSession::with_seed("abcd", SimulationConfig::default(), 1);
        let mut room = RoomState::new();
        room.player2.score = 70;
        room.player2.board.set(0, 11, Some(Block::colored(BlockColor::Green)));
        room.player1.score = 450;

        let event = session.handle_packet(
            Packet::new(PacketType::Joined {
                client_id: PlayerSlot::Two,
                room_state: room.clone(),
            }),
            0,
        );
        assert_eq!(event, Some(SessionEvent::Joined(PlayerSlot::Two)));
        assert_eq!(session.local().state().score, 70);
        assert_eq!(session.local().state().board, room.player2.board);
        assert_eq!(session.mirror().score, 450);
    }

    #[test]
    fn test_start_needs_an_opponent() {
        let mut session = joined(PlayerSlot::One);
        assert!(session.request_start().is_none());

        session.handle_packet(Packet::new(PacketType::ClientCount { count: 2 }), 0);
        assert!(matches!(
            session.request_start().map(|p| p.payload),
            Some(PacketType::GameStart { .. })
        ));
    }

    #[test]
    fn test_swap_clearing_three_sends_one_board_sync() {
        let mut session = playing(PlayerSlot::One);
        let blue = Some(Block::colored(BlockColor::Blue));
        edit_local(&mut session, |state| {
            state.board.set(0, 11, blue);
            state.board.set(1, 11, Some(Block::colored(BlockColor::Red)));
            state.board.set(2, 11, blue);
            state.board.set(3, 11, blue);
            state.cursor = Cursor::new(0, 11);
        });

        let out = session.input(PlayerInput::Swap, 50);
        assert_eq!(kinds(&out), vec!["board_sync"]);
        let PacketType::GameAction {
            player_id,
            action: GameAction::BoardSync { score, combo, .. },
            ..
        } = &out[0].payload
        else {
            panic!("expected a board sync");
        };
        assert_eq!(*player_id, PlayerSlot::One);
        assert_eq!(*score, 30);
        assert_eq!(*combo, Some(1));
    }

    #[test]
    fn test_cursor_moves_send_move_only() {
        let mut session = playing(PlayerSlot::Two);
        let out = session.input(PlayerInput::Move(crate::state::Direction::Left), 0);
        assert_eq!(kinds(&out), vec!["move"]);
    }

    #[test]
    fn test_input_before_join_is_dropped() {
        let mut session = MatchSession::with_seed("abcd", SimulationConfig::default(), 1);
        assert!(session.input(PlayerInput::Swap, 0).is_empty());
        assert!(session.tick(10_000).is_empty());
    }

    #[test]
    fn test_opponent_board_sync_is_mirrored_without_evaluation() {
        let mut session = playing(PlayerSlot::One);
        let mut board = Board::new();
        for x in 0..3 {
            board.set(x, 11, Some(Block::colored(BlockColor::Yellow)));
        }

        session.handle_packet(
            Packet::new(PacketType::GameAction {
                room: "abcd".to_string(),
                player_id: PlayerSlot::Two,
                action: GameAction::BoardSync {
                    board: board.clone(),
                    score: 10,
                    combo: None,
                },
            }),
            0,
        );
        session.tick(100);
        assert_eq!(session.mirror().board, board);
        assert_eq!(session.mirror().score, 10);
    }

    #[test]
    fn test_resync_leaves_local_state_alone() {
        let mut session = playing(PlayerSlot::One);
        edit_local(&mut session, |state| state.score = 300);

        let mut room = RoomState::new();
        room.player1.score = 0;
        room.player2.score = 80;
        let event = session.handle_packet(Packet::new(PacketType::GameStateSync(room)), 0);

        assert_eq!(event, Some(SessionEvent::Resynced));
        assert_eq!(session.local().state().score, 300);
        assert_eq!(session.mirror().score, 80);
    }

    #[test]
    fn test_received_garbage_is_synced_next_tick() {
        let mut session = playing(PlayerSlot::Two);
        session.handle_packet(Packet::new(PacketType::GarbageReceived { lines: 1 }), 0);
        assert!(session.local().state().board.block_count() > 0);

        let out = session.tick(100);
        assert_eq!(kinds(&out), vec!["board_sync"]);
        assert!(session.tick(200).is_empty());
    }

    #[test]
    fn test_topping_out_reports_the_opponent_as_winner() {
        let mut session = playing(PlayerSlot::One);
        edit_local(&mut session, |state| {
            for y in 0..12 {
                state.board.set(2, y, Some(Block::garbage()));
            }
        });

        let out = session.tick(100);
        assert_eq!(kinds(&out), vec!["game_over"]);
        assert!(matches!(
            out[0].payload,
            PacketType::GameAction {
                action: GameAction::GameOver {
                    winner: Winner::Player2,
                    loser: PlayerSlot::One,
                },
                ..
            }
        ));
        assert!(!session.is_playing());
        assert_eq!(session.winner(), Winner::Player2);
        assert!(session.tick(200).is_empty());
    }

    #[test]
    fn test_disconnect_freezes_both_boards() {
        let mut session = playing(PlayerSlot::Two);
        let event = session.handle_packet(
            Packet::new(PacketType::GameOver {
                winner: Winner::Disconnect,
            }),
            0,
        );
        assert_eq!(event, Some(SessionEvent::Finished(Winner::Disconnect)));
        assert!(!session.is_playing());
        assert!(!session.mirror().is_playing);
        assert!(session.input(PlayerInput::Rise, 0).is_empty());
    }

    #[test]
    fn test_three_step_chain_sends_garbage_to_opponent() {
        let mut session = playing(PlayerSlot::One);
        edit_local(&mut session, three_step_chain);

        let out = session.tick(100);
        assert_eq!(kinds(&out), vec!["board_sync", "send_garbage"]);
        assert_eq!(garbage_sends(&out), vec![(1, PlayerSlot::Two)]);
        assert_eq!(session.local().state().score, 30 + 60 + 90);
        assert_eq!(session.local().state().combo, 3);
        assert_eq!(session.local().state().board.block_count(), 0);

        assert!(session.tick(200).is_empty());
        assert_eq!(session.local().state().combo, 0);
    }

    #[test]
    fn test_long_chain_sends_garbage_per_step() {
        let mut session = playing(PlayerSlot::Two);
        edit_local(&mut session, |state| {
            three_step_chain(state);
            // Lands beside these once the blues are gone.
            let yellow = Some(Block::colored(BlockColor::Yellow));
            state.board.set(2, 9, yellow);
            state.board.set(3, 11, yellow);
            state.board.set(4, 11, yellow);
        });

        let out = session.tick(100);
        assert_eq!(
            kinds(&out),
            vec!["board_sync", "send_garbage", "send_garbage"]
        );
        assert_eq!(
            garbage_sends(&out),
            vec![(1, PlayerSlot::One), (1, PlayerSlot::One)]
        );
        assert_eq!(session.local().state().score, 30 + 60 + 90 + 120);
        assert_eq!(session.local().state().combo, 4);
    }
}
