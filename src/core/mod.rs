pub mod engine;
pub mod input;
pub mod lobby;
pub mod menu;
pub mod network;
pub mod renderer;
pub mod session;
