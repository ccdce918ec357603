use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::Transmitter;

/// Pipes each line into a shell command, e.g. a TTS + FM modulator chain:
///
/// ```text
/// espeak --stdout | sudo ./rpitx/sendiq -i - -s 48000 -f {frequency}M -t iq
/// ```
///
/// The line goes to the command's stdin; it is never spliced into the shell
/// string.
#[derive(Debug, Clone)]
pub struct CommandTransmitter {
    command: String,
}

impl CommandTransmitter {
    pub fn new(template: &str, frequency_mhz: f64) -> Self {
        Self {
            command: template.replace("{frequency}", &frequency_mhz.to_string()),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Transmitter for CommandTransmitter {
    fn name(&self) -> &str {
        "command"
    }

    async fn transmit(&self, line: &str) -> Result<()> {
        info!("TX via command: {}", line);

        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start transmit command: {}", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(format!("{}\n", line).as_bytes())
                .await
                .context("Failed to write to transmit command")?;
            // Dropping stdin closes the pipe so the command sees EOF
        }

        let output = child
            .wait_with_output()
            .await
            .context("Failed to wait for transmit command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Transmit command failed (exit code {}): {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        debug!("Transmit command finished");
        Ok(())
    }
}
