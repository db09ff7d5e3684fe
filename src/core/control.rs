use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use super::alerts::SharedThresholds;
use super::types::ThresholdBand;
use crate::error::ValidationError;
use crate::notify::CommandSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    SetMin,
    SetMax,
}

impl CommandKind {
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::SetMin => "/setminlimit",
            CommandKind::SetMax => "/setmaxlimit",
        }
    }

    /// Accepts `/setminlimit` as well as the bot-addressed `/setminlimit@SomeBot`.
    fn from_token(token: &str) -> Option<Self> {
        let command = token.split('@').next().unwrap_or(token);
        match command {
            "/setminlimit" => Some(CommandKind::SetMin),
            "/setmaxlimit" => Some(CommandKind::SetMax),
            _ => None,
        }
    }
}

/// A recognised command with its raw argument still unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdCommand<'a> {
    pub kind: CommandKind,
    pub argument: Option<&'a str>,
}

/// `None` for anything that isn't a threshold command.
pub fn parse_command(text: &str) -> Option<ThresholdCommand<'_>> {
    let mut tokens = text.split_whitespace();
    let kind = CommandKind::from_token(tokens.next()?)?;
    Some(ThresholdCommand {
        kind,
        argument: tokens.next(),
    })
}

pub fn parse_threshold_value(raw: Option<&str>) -> Result<f64, ValidationError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let raw = raw.ok_or(ValidationError::MissingArgument)?;

    let value: f64 = raw
        .parse()
        .map_err(|_| ValidationError::NotANumber(raw.to_string()))?;
    if !value.is_finite() {
        return Err(ValidationError::NotANumber(raw.to_string()));
    }
    if value < 0.0 {
        return Err(ValidationError::Negative(raw.to_string()));
    }
    Ok(value)
}

/// Operator-facing side of the threshold band.
pub struct ThresholdControlSurface {
    thresholds: SharedThresholds,
}

impl ThresholdControlSurface {
    pub fn new(thresholds: SharedThresholds) -> Self {
        Self { thresholds }
    }

    /// Validates and applies one command, returning the band now in effect.
    pub fn apply(&self, command: &ThresholdCommand<'_>) -> Result<ThresholdBand, ValidationError> {
        let value = parse_threshold_value(command.argument)?;
        let band = match command.kind {
            CommandKind::SetMin => self.thresholds.set_min(value),
            CommandKind::SetMax => self.thresholds.set_max(value),
        };
        info!(
            "Threshold band updated via {}: [{}, {}]",
            command.kind.name(),
            band.min,
            band.max
        );
        Ok(band)
    }

    /// Handles one operator message and returns the reply, if any.
    pub fn handle(&self, text: &str) -> Option<String> {
        let command = parse_command(text)?;
        let reply = match self.apply(&command) {
            Ok(band) => match command.kind {
                CommandKind::SetMin => format!("minimum threshold set to {}", band.min),
                CommandKind::SetMax => format!("maximum threshold set to {}", band.max),
            },
            Err(e) => {
                warn!("Rejected {}: {}", command.kind.name(), e);
                format!("invalid value for {}: {}", command.kind.name(), e)
            }
        };
        Some(reply)
    }

    /// Serves commands until cancelled or the source closes.
    pub async fn run<S: CommandSource>(&self, source: &mut S, cancel: CancellationToken) {
        info!("Threshold control surface started");
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => break,
                message = source.next_message() => message,
            };

            let Some(message) = message else {
                warn!("Operator channel closed");
                break;
            };

            let Some(reply) = self.handle(&message.text) else {
                debug!("Ignoring operator message: {}", message.text);
                continue;
            };

            if let Err(e) = source.reply(&message, &reply).await {
                error!("Failed to reply to chat {}: {}", message.chat_id, e);
            }
        }
        info!("Threshold control surface stopped");
    }
}
