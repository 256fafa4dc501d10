//! Live room state: whiteboards and connected stream clients.
//!
//! A room directory may only be reclaimed when nobody is drawing on one of
//! its whiteboards and nobody is streaming in it. The reaper asks the two
//! collaborators below; the in-memory implementations back the service
//! binary and the tests.

use std::collections::{BTreeMap, HashMap};

use housekeeper_core::{BoardId, ClientId, RoomId, UserId};
use parking_lot::RwLock;

use crate::error::Result;

/// A single whiteboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whiteboard {
    /// Display name.
    pub name: String,
    /// Drawn objects, keyed by object id, holding the serialized object.
    pub items: BTreeMap<String, String>,
}

impl Whiteboard {
    /// Create an empty board.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: BTreeMap::new(),
        }
    }

    /// Whether nothing is drawn on the board.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// All whiteboards of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whiteboards {
    /// Owning room.
    pub room_id: RoomId,
    /// Boards by id.
    pub boards: BTreeMap<BoardId, Whiteboard>,
}

impl Whiteboards {
    /// A room with no boards.
    #[must_use]
    pub fn empty(room_id: RoomId) -> Self {
        Self {
            room_id,
            boards: BTreeMap::new(),
        }
    }

    /// Whether every board is empty. True for a room with no boards.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.boards.values().all(Whiteboard::is_empty)
    }
}

/// A client connected to a room's media stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamClient {
    /// Connection id.
    pub client_id: ClientId,
    /// Room the client is in.
    pub room_id: RoomId,
    /// Authenticated user behind the connection.
    pub user_id: UserId,
}

/// Source of whiteboard state.
pub trait WhiteboardStore: Send + Sync {
    /// Get the whiteboards of a room. Unknown rooms have no boards.
    ///
    /// # Errors
    ///
    /// Returns `ReaperError::RoomState` if the state cannot be read.
    fn whiteboards(&self, room_id: RoomId) -> Result<Whiteboards>;
}

/// Source of live stream connections.
pub trait StreamRegistry: Send + Sync {
    /// List clients currently connected to a room.
    ///
    /// # Errors
    ///
    /// Returns `ReaperError::RoomState` if the registry cannot be read.
    fn clients(&self, room_id: RoomId) -> Result<Vec<StreamClient>>;
}

/// In-process whiteboard state.
#[derive(Debug, Default)]
pub struct InMemoryWhiteboards {
    rooms: RwLock<HashMap<RoomId, Whiteboards>>,
}

impl InMemoryWhiteboards {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw an object on a board, creating the board if needed.
    pub fn put_item(&self, room_id: RoomId, board_id: BoardId, item_id: &str, item: String) {
        self.rooms
            .write()
            .entry(room_id)
            .or_insert_with(|| Whiteboards::empty(room_id))
            .boards
            .entry(board_id)
            .or_insert_with(|| Whiteboard::new(format!("Board {board_id}")))
            .items
            .insert(item_id.to_string(), item);
    }

    /// Wipe everything drawn on a board.
    pub fn clear_board(&self, room_id: RoomId, board_id: BoardId) {
        if let Some(board) = self
            .rooms
            .write()
            .get_mut(&room_id)
            .and_then(|wbs| wbs.boards.get_mut(&board_id))
        {
            board.items.clear();
        }
    }

    /// Forget every board of a room.
    pub fn remove_room(&self, room_id: RoomId) {
        self.rooms.write().remove(&room_id);
    }
}

impl WhiteboardStore for InMemoryWhiteboards {
    fn whiteboards(&self, room_id: RoomId) -> Result<Whiteboards> {
        Ok(self
            .rooms
            .read()
            .get(&room_id)
            .cloned()
            .unwrap_or_else(|| Whiteboards::empty(room_id)))
    }
}

/// In-process stream connection registry.
#[derive(Debug, Default)]
pub struct InMemoryStreamRegistry {
    clients: RwLock<HashMap<ClientId, StreamClient>>,
}

impl InMemoryStreamRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connected client.
    pub fn connect(&self, client: StreamClient) {
        self.clients.write().insert(client.client_id, client);
    }

    /// Remove a client. Returns the client if it was connected.
    pub fn disconnect(&self, client_id: &ClientId) -> Option<StreamClient> {
        self.clients.write().remove(client_id)
    }
}

impl StreamRegistry for InMemoryStreamRegistry {
    fn clients(&self, room_id: RoomId) -> Result<Vec<StreamClient>> {
        Ok(self
            .clients
            .read()
            .values()
            .filter(|c| c.room_id == room_id)
            .cloned()
            .collect())
    }
}
