pub mod simulation;
pub mod window_server;
