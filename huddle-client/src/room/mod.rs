mod command;
mod coordinator;
mod event;

pub use command::{RoomCommand, RoomGone, RoomHandle};
pub use coordinator::RoomCoordinator;
pub use event::{RoomEvent, RoomSnapshot, RoomState};
