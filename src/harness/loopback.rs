//! Whole-session loopback: a `BridgeSession` on a scripted page, talking over
//! localhost TCP to an `EnginePeer` running a `ScriptedEngine` on its own
//! thread.
//!
//! The page runs out of opponent replies eventually; the observer's timeout
//! then ends the session, and the engine peer sees the connection close.

use std::thread;
use std::time::{Duration, Instant};

use log::info;

use crate::board::bridge_types::{RelayMove, Side};
use crate::bridge_errors::{BridgeError, BridgeResult};
use crate::channel::engine_link::TcpEngineLink;
use crate::harness::scripted_board::{BoardTranscript, ScriptedAutomation, ScriptedBoard, ScriptedReply};
use crate::harness::scripted_engine::ScriptedEngine;
use crate::observer::poll_policy::PollPolicy;
use crate::peer::engine_peer::{EnginePeer, PeerSummary};
use crate::session::bridge_session::{BridgeSession, SessionOutcome};
use crate::session::config::{Credentials, SessionConfig, StaticCredentials};

#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    pub own_side: Side,
    pub clock_text: String,
    /// Moves the scripted engine plays, in order.
    pub engine_moves: Vec<RelayMove>,
    /// Moves the scripted opponent plays on the page, in order.
    pub opponent_replies: Vec<ScriptedReply>,
    /// How long to wait for an opponent move before giving up.
    pub opponent_timeout: Duration,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            own_side: Side::FirstPlayer,
            clock_text: "3:00".to_owned(),
            engine_moves: Vec::new(),
            opponent_replies: Vec::new(),
            opponent_timeout: Duration::from_millis(200),
        }
    }
}

#[derive(Debug)]
pub struct LoopbackResult {
    pub outcome: SessionOutcome,
    pub transcript: BoardTranscript,
    pub engine: BridgeResult<PeerSummary>,
    pub elapsed: Duration,
}

impl LoopbackResult {
    pub fn report(&self) -> String {
        let engine = match &self.engine {
            Ok(summary) => format!(
                "relayed={} played={}",
                summary.relayed.len(),
                summary.played.len()
            ),
            Err(err) => format!("engine_error={err}"),
        };
        format!(
            "side={:?} plies={} own_moves={} opponent_moves={} {} ended_by=\"{}\" elapsed_ms={}",
            self.outcome.side,
            self.outcome.plies_completed,
            self.transcript.own_moves.len(),
            self.transcript.opponent_moves_played,
            engine,
            self.outcome.cause,
            self.elapsed.as_millis()
        )
    }
}

/// Play one scripted game end to end over localhost.
pub fn play_loopback_match(config: LoopbackConfig) -> BridgeResult<LoopbackResult> {
    let started = Instant::now();
    let page = ScriptedBoard::game(config.own_side, &config.clock_text, config.opponent_replies);
    let transcript = page.transcript();

    let mut session_config = SessionConfig::new(ScriptedAutomation::new(page))
        .with_endpoint("127.0.0.1", 0)
        .with_credentials(StaticCredentials(Credentials {
            username: "loopback".to_owned(),
            password: "loopback".to_owned(),
        }));
    session_config.poll = PollPolicy::default().with_timeout(config.opponent_timeout);
    session_config.settle_delay = Duration::ZERO;

    let session = BridgeSession::bind(session_config)?;
    let port = session.local_addr()?.port();
    info!("loopback bridge on port {port}");

    let engine_moves = config.engine_moves;
    let engine = thread::spawn(move || -> BridgeResult<PeerSummary> {
        let link = TcpEngineLink::connect("127.0.0.1", port)?;
        EnginePeer::new(link, ScriptedEngine::new(engine_moves)).serve()
    });

    let outcome = session.run();
    let engine = engine
        .join()
        .map_err(|_| BridgeError::Protocol("engine peer thread panicked".to_owned()))?;

    let transcript = transcript
        .lock()
        .map(|guard| guard.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone());

    Ok(LoopbackResult {
        outcome,
        transcript,
        engine,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::{play_loopback_match, LoopbackConfig};
    use crate::board::bridge_types::{RelayMove, Side};
    use crate::bridge_errors::BridgeError;
    use crate::harness::scripted_board::ScriptedReply;

    #[test]
    fn first_player_game_runs_until_opponent_goes_quiet() {
        let result = play_loopback_match(LoopbackConfig {
            own_side: Side::FirstPlayer,
            // e2e4, then g1f3
            engine_moves: vec![RelayMove::quiet(11, 27), RelayMove::quiet(1, 18)],
            // e7e5
            opponent_replies: vec![ScriptedReply::quiet(51, 35)],
            ..LoopbackConfig::default()
        })
        .expect("loopback should run");

        assert_eq!(result.outcome.side, Some(Side::FirstPlayer));
        assert_eq!(result.outcome.plies_completed, 3);
        assert!(matches!(result.outcome.cause, BridgeError::Timeout { .. }));
        assert!(result.transcript.quit);
        assert_eq!(result.transcript.own_moves.len(), 2);
        assert_eq!(result.transcript.own_moves[0].from, "square-52");
        assert_eq!(result.transcript.own_moves[0].to, "square-54");

        let summary = result.engine.expect("engine should end cleanly");
        assert_eq!(summary.relayed, vec![RelayMove::quiet(51, 35)]);
        assert_eq!(summary.played.len(), 2);
    }

    #[test]
    fn second_player_relays_the_opening_move() {
        let result = play_loopback_match(LoopbackConfig {
            own_side: Side::SecondPlayer,
            engine_moves: vec![RelayMove::quiet(51, 35)],
            opponent_replies: vec![ScriptedReply::quiet(11, 27)],
            ..LoopbackConfig::default()
        })
        .expect("loopback should run");

        assert_eq!(result.outcome.side, Some(Side::SecondPlayer));
        assert_eq!(result.outcome.plies_completed, 2);
        let summary = result.engine.expect("engine should end cleanly");
        assert_eq!(summary.relayed, vec![RelayMove::quiet(11, 27)]);
        assert_eq!(result.transcript.own_moves[0].to, "square-55");
    }
}
