//! One game session from listening socket to teardown.
//!
//! ```text
//! bind -> accept engine -> credentials -> launch page -> detect side
//!      -> TurnController::run -> teardown (channel, listener, page)
//! ```
//!
//! Every failure, whether during setup or inside the loop, goes through the
//! same teardown and is reported in the `SessionOutcome`.

use std::net::SocketAddr;

use log::{info, warn};

use crate::board::bridge_types::Side;
use crate::bridge_errors::{BridgeError, BridgeResult};
use crate::channel::engine_channel::EngineChannel;
use crate::channel::engine_link::{EngineListener, TcpEngineLink};
use crate::observer::poll_policy::{poll_until, PollPolicy};
use crate::session::config::{AutomationFactory, SessionConfig};
use crate::session::turn_controller::TurnController;
use crate::ui::ui_driver::{class_tokens, Selector, UiDriver};
use crate::ui::ui_vocabulary::UiVocabulary;

/// How a session ended. Sessions only end on an error.
#[derive(Debug)]
pub struct SessionOutcome {
    /// `None` when the session failed before the side was known.
    pub side: Option<Side>,
    pub plies_completed: u32,
    pub cause: BridgeError,
    /// Errors raised while tearing down, after `cause`.
    pub teardown_errors: Vec<BridgeError>,
}

pub struct BridgeSession<F: AutomationFactory> {
    config: SessionConfig<F>,
    listener: EngineListener,
}

impl<F: AutomationFactory> BridgeSession<F> {
    /// Bind the engine endpoint. The engine may connect any time after this.
    pub fn bind(config: SessionConfig<F>) -> BridgeResult<Self> {
        let listener = EngineListener::bind(&config.address, config.port)?;
        Ok(Self { config, listener })
    }

    pub fn local_addr(&self) -> BridgeResult<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the session to completion.
    pub fn run(self) -> SessionOutcome {
        let Self {
            mut config,
            listener,
        } = self;

        let link = match listener.accept() {
            Ok(link) => link,
            Err(cause) => return teardown::<F::Driver>(None, None, listener, None, 0, cause),
        };
        let mut channel = EngineChannel::new(link, config.channel);

        let mut driver = match config
            .credentials
            .credentials()
            .and_then(|credentials| config.automation.launch(&credentials))
        {
            Ok(driver) => driver,
            Err(cause) => {
                return teardown::<F::Driver>(None, Some(&mut channel), listener, None, 0, cause)
            }
        };

        let side = match detect_side(&mut driver, &config.vocabulary, &config.poll) {
            Ok(side) => side,
            Err(cause) => {
                return teardown(
                    None,
                    Some(&mut channel),
                    listener,
                    Some(&mut driver),
                    0,
                    cause,
                )
            }
        };
        info!("playing as {side:?}");

        let mut controller = TurnController::new(
            driver,
            channel,
            side,
            config.vocabulary.clone(),
            config.poll,
        )
        .budget_policy(config.budget)
        .settle_delay(config.settle_delay);

        let cause = controller.run();
        let plies = controller.turn().move_number;
        let (mut driver, mut channel) = controller.into_parts();
        teardown(
            Some(side),
            Some(&mut channel),
            listener,
            Some(&mut driver),
            plies,
            cause,
        )
    }
}

/// The board is drawn flipped when we hold the second seat.
pub fn detect_side<D: UiDriver>(
    driver: &mut D,
    vocabulary: &UiVocabulary,
    poll: &PollPolicy,
) -> BridgeResult<Side> {
    let board_selector = Selector::class(vocabulary.board_class.as_str());
    let board = poll_until(poll, "game board", || {
        Ok(driver.find_elements(&board_selector)?.into_iter().next())
    })?;
    let flipped = class_tokens(driver, &board)?
        .iter()
        .any(|token| *token == vocabulary.flipped_marker);
    Ok(if flipped {
        Side::SecondPlayer
    } else {
        Side::FirstPlayer
    })
}

fn teardown<D: UiDriver>(
    side: Option<Side>,
    channel: Option<&mut EngineChannel<TcpEngineLink>>,
    listener: EngineListener,
    driver: Option<&mut D>,
    plies_completed: u32,
    cause: BridgeError,
) -> SessionOutcome {
    warn!("session ending after {plies_completed} plies: {cause}");
    let mut teardown_errors = Vec::new();

    if let Some(channel) = channel {
        if let Err(err) = channel.close() {
            teardown_errors.push(err);
        }
    }
    listener.close();
    if let Some(driver) = driver {
        if let Err(err) = driver.quit() {
            teardown_errors.push(err);
        }
    }

    for err in &teardown_errors {
        warn!("teardown: {err}");
    }
    SessionOutcome {
        side,
        plies_completed,
        cause,
        teardown_errors,
    }
}
