//! Remind command implementation

use anyhow::Result;
use std::time::Duration;
use tracing::debug;

use fluency_progress::progress::{Notification, NotificationSink};

use super::EngineOptions;

/// Prints notifications to stdout
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn show(&mut self, notification: &Notification) -> Result<()> {
        println!("🔔 {}", notification.title);
        println!("   {}", notification.body);
        Ok(())
    }
}

/// Deliver due reminders once, or keep polling with `watch`
pub fn remind_command(opts: &EngineOptions, watch: bool, interval_secs: u64) -> Result<()> {
    let mut engine = opts.open()?;
    let mut sink = ConsoleSink;

    loop {
        let delivered = engine.deliver_due_reminders(&mut sink)?;
        debug!(count = delivered.len(), "Reminder poll finished");

        if !watch {
            if delivered.is_empty() {
                println!("No reminders due.");
            }
            return Ok(());
        }
        std::thread::sleep(Duration::from_secs(interval_secs.max(1)));
    }
}
