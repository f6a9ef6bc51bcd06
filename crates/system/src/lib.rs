pub mod battery;
pub mod reading;

pub use battery::BatteryState;
pub use reading::SystemReading;

use chrono::Utc;
use std::time::Duration;
use sysinfo::System;
use tokio::sync::mpsc;
use tokio::time;
use tracing::debug;

/// Spawn a background Tokio task that polls system stats every `interval_ms`
/// milliseconds and forwards [`SystemReading`]s through the returned channel.
///
/// The task stops automatically when the receiver is dropped.
pub fn spawn_sampler(interval_ms: u64) -> mpsc::Receiver<SystemReading> {
    let (tx, rx) = mpsc::channel(16);
    let interval = Duration::from_millis(interval_ms.max(1));

    tokio::spawn(async move {
        let mut sys    = System::new_all();
        let mut ticker = time::interval(interval);
        // Readings are timestamped; catching up on missed ticks adds nothing.
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            sys.refresh_cpu_usage();
            sys.refresh_memory();

            let reading = take_reading(&sys);
            debug!(cores = reading.cpu_per_core.len(), "system reading");

            if tx.send(reading).await.is_err() {
                break; // all receivers dropped
            }
        }
    });

    rx
}

fn take_reading(sys: &System) -> SystemReading {
    SystemReading {
        time:         Utc::now(),
        cpu_per_core: sys.cpus().iter().map(|c| c.cpu_usage()).collect(),
        ram_used:     sys.used_memory(),
        ram_total:    sys.total_memory(),
        battery:      battery::read_battery(),
    }
}
