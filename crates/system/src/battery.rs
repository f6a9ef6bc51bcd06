use std::path::Path;

/// Charge state of the first battery found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryState {
    /// Charge level, 0–100.
    pub percent: u8,
    /// `true` while charging or full.
    pub charging: bool,
}

/// Read battery state from the Linux sysfs power-supply interface.
///
/// Returns `None` if the system has no battery (desktop, VM).
pub fn read_battery() -> Option<BatteryState> {
    read_battery_from(Path::new("/sys/class/power_supply"))
}

fn read_battery_from(root: &Path) -> Option<BatteryState> {
    ["BAT0", "BAT1", "BAT2"]
        .iter()
        .map(|name| root.join(name))
        .filter(|base| base.exists())
        .find_map(|base| {
            let capacity = std::fs::read_to_string(base.join("capacity")).ok()?;
            let status = std::fs::read_to_string(base.join("status")).ok()?;
            parse_battery(&capacity, &status)
        })
}

/// Parse the sysfs `capacity` and `status` file contents.
pub fn parse_battery(capacity: &str, status: &str) -> Option<BatteryState> {
    let percent = capacity.trim().parse::<u8>().ok()?.min(100);
    let charging = matches!(status.trim(), "Charging" | "Full");
    Some(BatteryState { percent, charging })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sysfs_contents() {
        assert_eq!(
            parse_battery("87\n", "Discharging\n"),
            Some(BatteryState { percent: 87, charging: false })
        );
        assert_eq!(
            parse_battery("100", "Full"),
            Some(BatteryState { percent: 100, charging: true })
        );
        assert_eq!(parse_battery("n/a", "Full"), None);
    }

    #[test]
    fn missing_supply_dir_means_no_battery() {
        assert_eq!(read_battery_from(Path::new("/nonexistent/power_supply")), None);
    }
}
