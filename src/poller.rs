use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::api::MessageSource;
use crate::config::Config;
use crate::extract::extract_messages;
use crate::format::LineFormatter;
use crate::message::{IdentityKey, MessageRecord};
use crate::sink::MessageLog;
use crate::transmit::Transmitter;

/// Outcome of one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub received: usize,
    pub new: usize,
    pub duplicates: usize,
    pub transmit_failures: usize,
}

/// Polling context: everything one relay loop needs, including the set of
/// identities already relayed by this process.
pub struct Poller {
    source: Box<dyn MessageSource>,
    log: MessageLog,
    transmitter: Box<dyn Transmitter>,
    formatter: LineFormatter,
    interval: Duration,
    reverse_order: bool,
    seen: HashSet<IdentityKey>,
}

impl Poller {
    pub fn new(
        config: &Config,
        source: Box<dyn MessageSource>,
        transmitter: Box<dyn Transmitter>,
    ) -> Self {
        let log = MessageLog::new(config.log.path.clone());
        debug!("Relayed messages are logged to {}", log.path().display());
        Self {
            source,
            log,
            transmitter,
            formatter: LineFormatter::new(config.log.max_line_length),
            interval: config.poll_interval(),
            reverse_order: config.poller.reverse_order,
            seen: HashSet::new(),
        }
    }

    pub fn has_seen(&self, key: &IdentityKey) -> bool {
        self.seen.contains(key)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Fetch one page and relay whatever is new in it
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let body = self
            .source
            .fetch()
            .await
            .context("Failed to fetch group messages")?;
        let messages = extract_messages(&body);
        self.process_batch(messages).await
    }

    /// Relay unseen records from one batch. The batch is replayed
    /// oldest-first when `reverse_order` is set.
    pub async fn process_batch(&mut self, mut messages: Vec<MessageRecord>) -> Result<CycleReport> {
        if self.reverse_order {
            messages.reverse();
        }

        let mut report = CycleReport {
            received: messages.len(),
            ..Default::default()
        };

        for record in &messages {
            let key = record.identity();
            if self.has_seen(&key) {
                report.duplicates += 1;
                continue;
            }

            let line = self.formatter.format(record);
            self.log
                .append(&line)
                .await
                .with_context(|| format!("Failed to log message {}", key))?;
            debug!("New message {}: {}", key, line);
            self.seen.insert(key);
            report.new += 1;

            if let Err(e) = self.transmitter.transmit(&line).await {
                error!("Transmitter '{}' failed: {:#}", self.transmitter.name(), e);
                report.transmit_failures += 1;
            }
        }

        Ok(report)
    }

    /// Poll forever. Every cycle error is logged and retried after the
    /// fixed interval.
    pub async fn run(&mut self) {
        loop {
            match self.run_cycle().await {
                Ok(report) => {
                    debug!(
                        "Cycle: {} received, {} duplicate(s), {} seen in total",
                        report.received,
                        report.duplicates,
                        self.seen_count()
                    );
                    Self::summarize(&report);
                }
                Err(e) => error!("Error while polling: {:#}", e),
            }

            tokio::time::sleep(self.interval).await;
        }
    }

    fn summarize(report: &CycleReport) {
        if report.new == 0 {
            info!("No new messages.");
            return;
        }

        info!("Processed {} new message(s).", report.new);
        if report.transmit_failures > 0 {
            warn!("{} transmission(s) failed.", report.transmit_failures);
        }
    }
}
