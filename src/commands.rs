//! High level operations built on [`Client::send_command`].

use std::time::Duration;

use log::{trace, warn};

use crate::{
    client::Client,
    dvar::{self, DvarScan, ScanStep},
    error::{RconError, Result},
    info::{ServerInfo, ServerStatusInfo},
    settings::{self, CommandSettings},
    status::{self, ServerStatus},
};

/// Player tables can span many datagrams; give the server more time between
/// them.
const STATUS_READ_EXTENSION: Duration = Duration::from_secs(1);

impl Client {
    /// Current map and player table.
    pub async fn status(&self) -> Result<ServerStatus> {
        let settings = CommandSettings::new()
            .require_success()
            .with_read_extension(STATUS_READ_EXTENSION);
        let lines = self.send_command("status", None, settings).await?;
        Ok(status::parse_status(lines))
    }

    /// Connectionless `getinfo` query; no password involved.
    pub async fn get_info(&self) -> Result<ServerInfo> {
        let lines = self.query("getinfo").await?;
        Ok(ServerInfo::from_lines(&lines))
    }

    /// Connectionless `getstatus` query; no password involved.
    pub async fn get_status(&self) -> Result<ServerStatusInfo> {
        let lines = self.query("getstatus").await?;
        Ok(ServerStatusInfo::from_lines(&lines))
    }

    /// Reads a dvar by sending its name as a command.
    ///
    /// Replies polluted by admin tooling are asked again, up to
    /// [`dvar::MAX_ATTEMPTS`] times. If no line ever matches, the first clean
    /// line seen is returned as the best available answer.
    pub async fn get_dvar(&self, name: &str) -> Result<String> {
        if name.is_empty() {
            return Err(RconError::InvalidArgument("dvar cannot be empty"));
        }

        let mut scan = DvarScan::new(name);
        for attempt in 0..dvar::MAX_ATTEMPTS {
            let lines = self
                .send_command(name, None, CommandSettings::new().require_success())
                .await?;

            match scan.feed(&lines) {
                ScanStep::Found(value) => {
                    trace!("dvar {:?} = {:?}", name, value);
                    return Ok(value);
                }
                ScanStep::Exhausted => break,
                ScanStep::Retry => {
                    warn!(
                        "reply to dvar {:?} was polluted, attempt {} of {}",
                        name,
                        attempt + 1,
                        dvar::MAX_ATTEMPTS
                    );
                    self.pause(settings::backoff(attempt)).await?;
                }
            }
        }

        scan.into_fallback()
            .ok_or_else(|| RconError::EmptyDvarResponse(name.to_string()))
    }

    /// `set <dvar> <value>`, quoting the value when needed.
    pub async fn set_dvar(&self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || value.is_empty() {
            return Err(RconError::InvalidArgument("dvar and value cannot be empty"));
        }
        let args = format!("{} {}", name, dvar::quote_value(value));
        self.send_command("set", Some(&args), CommandSettings::new())
            .await?;
        Ok(())
    }

    /// Broadcast a chat message to every player.
    pub async fn say(&self, message: &str) -> Result<()> {
        if message.is_empty() {
            return Err(RconError::InvalidArgument("message cannot be empty"));
        }
        self.send_command("say", Some(message), CommandSettings::new())
            .await?;
        Ok(())
    }

    /// Private message to one client slot.
    pub async fn tell(&self, client_num: u32, message: &str) -> Result<()> {
        if message.is_empty() {
            return Err(RconError::InvalidArgument("message cannot be empty"));
        }
        let args = format!("{} {} {}", client_num, self.config().tell_prefix, message);
        self.send_command("tell", Some(&args), CommandSettings::new())
            .await?;
        Ok(())
    }

    pub async fn kick(&self, player: &str, reason: &str) -> Result<()> {
        if player.is_empty() || reason.is_empty() {
            return Err(RconError::InvalidArgument(
                "player and reason cannot be empty",
            ));
        }
        let args = format!("{} '{}'", player, reason);
        self.send_command("clientkick_for_reason", Some(&args), CommandSettings::new())
            .await?;
        Ok(())
    }
}
