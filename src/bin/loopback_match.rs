//! Plays a short scripted game through the whole bridge over localhost TCP.
//!
//! Run with:
//! `cargo run --bin loopback_match`
//! `cargo run --bin loopback_match -- --second`
//! `RUST_LOG=debug cargo run --bin loopback_match` to see every wire message

use std::time::Duration;

use plum_bridge::board::bridge_types::{RelayMove, Side};
use plum_bridge::board::coordinate_mapper::algebraic_to_engine_index;
use plum_bridge::bridge_errors::BridgeResult;
use plum_bridge::harness::loopback::{play_loopback_match, LoopbackConfig};
use plum_bridge::harness::scripted_board::ScriptedReply;

fn lan(from: &str, to: &str) -> BridgeResult<(u8, u8)> {
    Ok((algebraic_to_engine_index(from)?, algebraic_to_engine_index(to)?))
}

fn main() -> BridgeResult<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let second = std::env::args().any(|a| a == "--second" || a == "-s");

    // Italian opening: the bridge's side and the page's side alternate.
    let line = [
        lan("e2", "e4")?,
        lan("e7", "e5")?,
        lan("g1", "f3")?,
        lan("b8", "c6")?,
        lan("f1", "c4")?,
        lan("f8", "c5")?,
    ];
    let (own_side, own_parity) = if second {
        (Side::SecondPlayer, 1)
    } else {
        (Side::FirstPlayer, 0)
    };

    let engine_moves = line
        .iter()
        .enumerate()
        .filter(|(ply, _)| ply % 2 == own_parity)
        .map(|(_, &(from, to))| RelayMove::quiet(from, to))
        .collect();
    let opponent_replies = line
        .iter()
        .enumerate()
        .filter(|(ply, _)| ply % 2 != own_parity)
        .map(|(_, &(from, to))| ScriptedReply::quiet(from, to))
        .collect();

    let result = play_loopback_match(LoopbackConfig {
        own_side,
        clock_text: "5:00".to_owned(),
        engine_moves,
        opponent_replies,
        opponent_timeout: Duration::from_millis(500),
    })?;

    println!("{}", result.report());
    Ok(())
}
