//! Session configuration and the collaborator factories it carries.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::bridge_errors::{BridgeError, BridgeResult};
use crate::channel::engine_channel::ChannelSettings;
use crate::executor::move_executor::DEFAULT_SETTLE_DELAY;
use crate::observer::poll_policy::PollPolicy;
use crate::session::time_budget::TimeBudgetPolicy;
use crate::ui::ui_driver::UiDriver;
use crate::ui::ui_vocabulary::UiVocabulary;

/// Address the engine listener binds to unless overridden.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 12345;

/// Site login. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the site login comes from. Asked once per session, before launch.
pub trait CredentialProvider {
    fn credentials(&self) -> BridgeResult<Credentials>;
}

/// Credentials held in memory.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> BridgeResult<Credentials> {
        Ok(self.0.clone())
    }
}

/// Credentials read from two environment variables at session start.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    pub username_var: String,
    pub password_var: String,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self {
            username_var: "PLUM_BRIDGE_USERNAME".to_owned(),
            password_var: "PLUM_BRIDGE_PASSWORD".to_owned(),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> BridgeResult<Credentials> {
        let read = |name: &str| {
            env::var(name).map_err(|err| BridgeError::Credentials(format!("{name}: {err}")))
        };
        Ok(Credentials {
            username: read(&self.username_var)?,
            password: read(&self.password_var)?,
        })
    }
}

/// Opens a signed-in page with the game board on screen.
pub trait AutomationFactory {
    type Driver: UiDriver;

    /// Start the browser, sign in and navigate to the game.
    fn launch(&mut self, credentials: &Credentials) -> BridgeResult<Self::Driver>;
}

/// Everything a `BridgeSession` needs, passed once at construction.
pub struct SessionConfig<F: AutomationFactory> {
    pub address: String,
    pub port: u16,
    pub credentials: Box<dyn CredentialProvider>,
    pub automation: F,
    pub vocabulary: UiVocabulary,
    pub poll: PollPolicy,
    pub channel: ChannelSettings,
    pub budget: TimeBudgetPolicy,
    pub settle_delay: Duration,
}

impl<F: AutomationFactory> SessionConfig<F> {
    /// Defaults for everything except the automation factory.
    pub fn new(automation: F) -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_owned(),
            port: DEFAULT_PORT,
            credentials: Box::new(EnvCredentials::default()),
            automation,
            vocabulary: UiVocabulary::default(),
            poll: PollPolicy::default(),
            channel: ChannelSettings::default(),
            budget: TimeBudgetPolicy::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Where to listen for the engine.
    pub fn with_endpoint(mut self, address: impl Into<String>, port: u16) -> Self {
        self.address = address.into();
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.credentials = Box::new(provider);
        self
    }

    /// Override address and port from `PLUM_BRIDGE_ADDRESS` and
    /// `PLUM_BRIDGE_PORT` when they are set.
    pub fn with_env_overrides(mut self) -> BridgeResult<Self> {
        if let Ok(address) = env::var("PLUM_BRIDGE_ADDRESS") {
            self.address = address;
        }
        if let Ok(port) = env::var("PLUM_BRIDGE_PORT") {
            self.port = port
                .parse()
                .map_err(|_| BridgeError::Protocol(format!("invalid PLUM_BRIDGE_PORT {port:?}")))?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CredentialProvider, Credentials, EnvCredentials, SessionConfig, StaticCredentials,
        DEFAULT_PORT,
    };
    use crate::bridge_errors::BridgeError;
    use crate::harness::scripted_board::{ScriptedAutomation, ScriptedBoard};

    #[test]
    fn defaults_match_the_fixed_endpoint() {
        let config = SessionConfig::new(ScriptedAutomation::new(ScriptedBoard::new()));
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.budget.cap_ms, 10_000);
        assert_eq!(config.settle_delay.as_millis(), 50);
    }

    #[test]
    fn env_overrides_replace_endpoint() {
        let base = || SessionConfig::new(ScriptedAutomation::new(ScriptedBoard::new()));

        std::env::set_var("PLUM_BRIDGE_ADDRESS", "0.0.0.0");
        std::env::set_var("PLUM_BRIDGE_PORT", "not-a-port");
        assert!(matches!(
            base().with_env_overrides(),
            Err(BridgeError::Protocol(_))
        ));

        std::env::set_var("PLUM_BRIDGE_PORT", "23456");
        let config = base()
            .with_env_overrides()
            .expect("valid overrides should apply");
        std::env::remove_var("PLUM_BRIDGE_ADDRESS");
        std::env::remove_var("PLUM_BRIDGE_PORT");

        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 23456);
    }

    #[test]
    fn missing_env_credentials_are_reported() {
        let provider = EnvCredentials {
            username_var: "PLUM_BRIDGE_TEST_UNSET_USER".to_owned(),
            password_var: "PLUM_BRIDGE_TEST_UNSET_PASS".to_owned(),
        };
        assert!(matches!(
            provider.credentials(),
            Err(BridgeError::Credentials(_))
        ));
    }

    #[test]
    fn static_credentials_redact_password_in_debug() {
        let provider = StaticCredentials(Credentials {
            username: "bridge".to_owned(),
            password: "hunter2".to_owned(),
        });
        let credentials = provider.credentials().expect("static credentials");
        let printed = format!("{credentials:?}");
        assert!(printed.contains("bridge"));
        assert!(!printed.contains("hunter2"));
    }
}
