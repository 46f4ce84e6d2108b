use std::collections::HashMap;
use std::time::Instant;

use rand::Rng;

use crate::net::{GameAction, Packet, PacketType};
use crate::state::{PlayerSlot, RoomState, Winner};

pub type ConnectionId = u64;

pub const ROOM_CAPACITY: usize = 2;
pub const DEFAULT_RESYNC_PROBABILITY: f64 = 0.2;

/// A packet the relay must deliver to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub to: ConnectionId,
    pub packet: Packet,
}

impl Outgoing {
    fn new(to: ConnectionId, payload: PacketType) -> Self {
        Self {
            to,
            packet: Packet::new(payload),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub connection: ConnectionId,
    pub slot: PlayerSlot,
}

/// What a connection knows about its place: a room key and an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room: String,
    pub slot: PlayerSlot,
}

#[derive(Debug)]
pub struct Room {
    pub key: String,
    pub members: Vec<Member>,
    pub state: RoomState,
    pub created_at: Instant,
}

impl Room {
    pub fn new(key: String) -> Self {
        Self {
            key,
            members: Vec::with_capacity(ROOM_CAPACITY),
            state: RoomState::new(),
            created_at: Instant::now(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> u8 {
        self.members.len() as u8
    }

    /// Lowest identity not currently taken.
    pub fn free_slot(&self) -> Option<PlayerSlot> {
        PlayerSlot::ALL
            .into_iter()
            .find(|slot| self.members.iter().all(|m| m.slot != *slot))
    }

    pub fn member(&self, slot: PlayerSlot) -> Option<&Member> {
        self.members.iter().find(|m| m.slot == slot)
    }

    pub fn others(&self, connection: ConnectionId) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(move |m| m.connection != connection)
    }

    fn broadcast(&self, payload: &PacketType) -> Vec<Outgoing> {
        self.members
            .iter()
            .map(|m| Outgoing::new(m.connection, payload.clone()))
            .collect()
    }

    fn to_others(&self, connection: ConnectionId, payload: &PacketType) -> Vec<Outgoing> {
        self.others(connection)
            .map(|m| Outgoing::new(m.connection, payload.clone()))
            .collect()
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            key: self.key.clone(),
            members: self.member_count(),
            game_started: self.state.game_started,
            winner: self.state.winner,
            scores: [self.state.player1.score, self.state.player2.score],
            age_secs: self.created_at.elapsed().as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub key: String,
    pub members: u8,
    pub game_started: bool,
    pub winner: Winner,
    pub scores: [u32; 2],
    pub age_secs: u64,
}

/// Owns every room and every membership. Connections are known only by id;
/// each operation returns the deliveries it produced.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    memberships: HashMap<ConnectionId, Membership>,
    resync_probability: f64,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_RESYNC_PROBABILITY)
    }
}

impl RoomRegistry {
    pub fn new(resync_probability: f64) -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            resync_probability: resync_probability.clamp(0.0, 1.0),
        }
    }

    pub fn resync_probability(&self) -> f64 {
        self.resync_probability
    }

    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        connection: ConnectionId,
        packet: Packet,
        rng: &mut R,
    ) -> Vec<Outgoing> {
        match packet.payload {
            PacketType::Join { room } => self.join(connection, &room),
            PacketType::GameStart { room } => self.start_game(connection, &room),
            PacketType::GameAction {
                room,
                player_id,
                action,
            } => self.relay_action(connection, &room, player_id, action, rng),
            PacketType::SendGarbage {
                room,
                lines,
                target_player,
            } => self.route_garbage(connection, &room, lines, target_player),
            PacketType::Chat { room, text } => self.chat(connection, &room, text),
            other => {
                log::debug!(
                    "ignoring {} from connection {}",
                    other.kind(),
                    connection
                );
                Vec::new()
            }
        }
    }

    pub fn join(&mut self, connection: ConnectionId, key: &str) -> Vec<Outgoing> {
        if let Some(existing) = self.memberships.get(&connection) {
            log::debug!(
                "connection {} already in room {}, ignoring join to {}",
                connection,
                existing.room,
                key
            );
            return Vec::new();
        }

        let room = self
            .rooms
            .entry(key.to_string())
            .or_insert_with(|| Room::new(key.to_string()));

        let Some(slot) = room.free_slot() else {
            log::info!("connection {} denied: room {} is full", connection, key);
            return vec![Outgoing::new(
                connection,
                PacketType::JoinDenied {
                    reason: "Room is full".to_string(),
                },
            )];
        };

        room.members.push(Member { connection, slot });
        self.memberships.insert(
            connection,
            Membership {
                room: key.to_string(),
                slot,
            },
        );
        log::info!(
            "connection {} joined room {} as player {}",
            connection,
            key,
            slot.number()
        );

        let mut out = vec![Outgoing::new(
            connection,
            PacketType::Joined {
                client_id: slot,
                room_state: room.state.clone(),
            },
        )];
        out.extend(room.broadcast(&PacketType::ClientCount {
            count: room.member_count(),
        }));
        out
    }

    pub fn start_game(&mut self, connection: ConnectionId, key: &str) -> Vec<Outgoing> {
        let Some((room, _)) = self.member_room(connection, key) else {
            return Vec::new();
        };
        if !room.is_full() {
            log::debug!("room {} cannot start with {} player(s)", key, room.members.len());
            return Vec::new();
        }

        room.state.reset_for_start();
        log::info!("room {} started a game", key);
        room.broadcast(&PacketType::GameStarted)
    }

    pub fn relay_action<R: Rng + ?Sized>(
        &mut self,
        connection: ConnectionId,
        key: &str,
        player_id: PlayerSlot,
        action: GameAction,
        rng: &mut R,
    ) -> Vec<Outgoing> {
        let resync_probability = self.resync_probability;
        let Some((room, slot)) = self.member_room(connection, key) else {
            return Vec::new();
        };

        match &action {
            GameAction::Move { cursor } => {
                room.state.player_mut(slot).cursor = *cursor;
            }
            GameAction::BoardSync {
                board,
                score,
                combo,
            } => {
                let mirror = room.state.player_mut(slot);
                mirror.board = board.clone();
                mirror.score = *score;
                if let Some(combo) = combo {
                    mirror.combo = *combo;
                }
            }
            GameAction::GameOver { winner, .. } => {
                log::info!("room {} finished, winner {}", key, winner.as_str());
                room.state.finish(*winner);
            }
        }

        let mut out = room.to_others(
            connection,
            &PacketType::GameAction {
                room: key.to_string(),
                player_id,
                action,
            },
        );

        if rng.gen_bool(resync_probability) {
            log::trace!("full resync of room {}", key);
            out.extend(room.broadcast(&PacketType::GameStateSync(room.state.clone())));
        }

        out
    }

    pub fn route_garbage(
        &mut self,
        connection: ConnectionId,
        key: &str,
        lines: u32,
        target: PlayerSlot,
    ) -> Vec<Outgoing> {
        let Some((room, _)) = self.member_room(connection, key) else {
            return Vec::new();
        };
        if lines == 0 {
            return Vec::new();
        }

        match room.member(target) {
            Some(member) => vec![Outgoing::new(
                member.connection,
                PacketType::GarbageReceived { lines },
            )],
            None => Vec::new(),
        }
    }

    pub fn chat(&mut self, connection: ConnectionId, key: &str, text: String) -> Vec<Outgoing> {
        let Some((room, slot)) = self.member_room(connection, key) else {
            return Vec::new();
        };
        room.to_others(
            connection,
            &PacketType::ChatMessage {
                sender_id: slot,
                text,
            },
        )
    }

    /// Drops a connection. A game in progress ends with a disconnect.
    pub fn leave(&mut self, connection: ConnectionId) -> Vec<Outgoing> {
        let Some(membership) = self.memberships.remove(&connection) else {
            return Vec::new();
        };
        let Some(room) = self.rooms.get_mut(&membership.room) else {
            return Vec::new();
        };

        room.members.retain(|m| m.connection != connection);
        log::info!(
            "player {} left room {}",
            membership.slot.number(),
            membership.room
        );

        if room.is_empty() {
            self.rooms.remove(&membership.room);
            log::info!("room {} closed", membership.room);
            return Vec::new();
        }

        let mut out = Vec::new();
        if room.state.game_started {
            room.state.finish(Winner::Disconnect);
            out.extend(room.broadcast(&PacketType::GameOver {
                winner: Winner::Disconnect,
            }));
        }
        out.extend(room.broadcast(&PacketType::ClientCount {
            count: room.member_count(),
        }));
        out
    }

    fn member_room(&mut self, connection: ConnectionId, key: &str) -> Option<(&mut Room, PlayerSlot)> {
        let membership = self.memberships.get(&connection)?;
        if membership.room != key {
            log::debug!(
                "connection {} sent for room {} but belongs to {}",
                connection,
                key,
                membership.room
            );
            return None;
        }
        let slot = membership.slot;
        self.rooms.get_mut(key).map(|room| (room, slot))
    }

    pub fn membership(&self, connection: ConnectionId) -> Option<&Membership> {
        self.memberships.get(&connection)
    }

    pub fn get(&self, key: &str) -> Option<&Room> {
        self.rooms.get(key)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn player_count(&self) -> usize {
        self.memberships.len()
    }

    pub fn infos(&self) -> Vec<RoomInfo> {
        let mut infos: Vec<RoomInfo> = self.rooms.values().map(Room::to_info).collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        infos
    }
}
