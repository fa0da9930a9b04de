//! Live scoreboard synchronization engine for the club/league platform.
//!
//! The server half is a stateless fan-out relay plus a keyed snapshot store
//! ([`routes`], [`services`], [`dao`]); the client half is the
//! [`session::ScoreboardSession`] that owns per-view state, applies operator
//! actions, and ticks the clocks.

pub mod audio;
pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod render;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
