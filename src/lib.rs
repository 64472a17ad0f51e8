mod board;
mod common;
mod config;
pub mod domain;
pub mod game;
pub mod gateway;
mod geometry;
pub mod hub;
mod logging;
pub mod protocol;
pub mod server;
pub mod session;
mod ship;
pub mod sim;
pub mod store;
pub mod transport;

pub use board::*;
pub use common::*;
pub use config::*;
pub use domain::*;
pub use game::{GameEngine, MoveReport, Outcome};
pub use gateway::{ConnectionState, Gateway};
pub use geometry::*;
pub use hub::{ConnectionId, Hub, HubStats, Registry, Subscription, Target};
pub use logging::init_logging;
pub use protocol::*;
pub use server::Server;
pub use ship::*;
pub use store::{GameStore, MemoryStore};
pub use transport::tcp::TcpTransport;
pub use transport::in_memory::InMemoryTransport;
