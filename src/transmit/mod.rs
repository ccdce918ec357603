pub mod command;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{TransmitMode, TransmitterConfig};

pub use command::CommandTransmitter;

/// Hands a formatted line to the broadcast channel.
/// Implementations must not touch the message pipeline beyond reporting
/// success or failure.
#[async_trait]
pub trait Transmitter: Send + Sync {
    fn name(&self) -> &str;

    async fn transmit(&self, line: &str) -> Result<()>;
}

/// Demo transmitter: logs the line instead of putting it on air
#[derive(Debug, Clone, Default)]
pub struct LoggingTransmitter;

#[async_trait]
impl Transmitter for LoggingTransmitter {
    fn name(&self) -> &str {
        "log"
    }

    async fn transmit(&self, line: &str) -> Result<()> {
        info!("TX: {}", line);
        warn!("Transmitter is in demo mode; nothing was broadcast");
        Ok(())
    }
}

/// Build the transmitter selected by `[transmitter] mode`
pub fn from_config(config: &TransmitterConfig) -> Result<Box<dyn Transmitter>> {
    match config.mode {
        TransmitMode::Log => Ok(Box::new(LoggingTransmitter)),
        TransmitMode::Command => {
            let template = config
                .command
                .as_deref()
                .context("transmitter.command is required when mode = \"command\"")?;
            let transmitter = CommandTransmitter::new(template, config.frequency_mhz);
            info!("Transmit command: {}", transmitter.command());
            Ok(Box::new(transmitter))
        }
    }
}
