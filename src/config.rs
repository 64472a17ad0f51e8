use std::net::SocketAddr;
use std::time::Duration;

use crate::ship::ShipKind;

pub const BOARD_SIZE: u8 = 10;
pub const FLEET_SIZE: usize = 5;
pub const FLEET: [ShipKind; FLEET_SIZE] = [
    ShipKind::Carrier,
    ShipKind::Battleship,
    ShipKind::Cruiser,
    ShipKind::Submarine,
    ShipKind::Destroyer,
];

/// Total number of ship segments in a complete fleet.
pub const TOTAL_SHIP_CELLS: usize = 5 + 4 + 3 + 3 + 2;

/// Points credited to the winner of a game.
pub const WIN_POINTS: i64 = 100;

/// Longest chat message accepted, in characters, after trimming.
pub const MAX_CHAT_LEN: usize = 500;

/// Default size of each connection's outbound queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Default maximum frame size (1 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 1 << 20;

/// Default upper bound on a single frame write (10 seconds).
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time a reader waits for the next frame (5 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Runtime settings for the connection server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_address: SocketAddr,
    /// Slots in each connection's outbound queue before it is dropped as slow.
    pub outbound_capacity: usize,
    /// Largest inbound or outbound frame accepted.
    pub max_frame_size: u32,
    /// Upper bound on a single frame write.
    pub write_timeout: Duration,
    /// A connection silent for this long is closed.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}
