//! Crate root module declarations for the Plum bridge.
//!
//! The bridge sits between a browser-rendered chess game and a move-generating
//! engine: it watches the page for the opponent's move, relays it to the engine
//! over TCP, and plays the engine's reply back on the page. Subsystems are
//! grouped the same way the data flows: board coordinates, the UI capability
//! surface, observation, execution, the engine channel, and the session loop,
//! plus the engine-side peer and in-memory harness used by tests and demos.

pub mod bridge_errors;

pub mod board {
    pub mod bridge_types;
    pub mod coordinate_mapper;
}

pub mod ui {
    pub mod ui_driver;
    pub mod ui_vocabulary;
}

pub mod observer {
    pub mod board_observer;
    pub mod move_evidence;
    pub mod poll_policy;
}

pub mod executor {
    pub mod move_executor;
}

pub mod channel {
    pub mod engine_channel;
    pub mod engine_link;
    pub mod wire_protocol;
}

pub mod session {
    pub mod bridge_session;
    pub mod config;
    pub mod time_budget;
    pub mod turn_controller;
}

pub mod peer {
    pub mod engine_peer;
    pub mod engine_trait;
}

pub mod harness {
    pub mod loopback;
    pub mod scripted_board;
    pub mod scripted_engine;
    pub mod scripted_link;
}
