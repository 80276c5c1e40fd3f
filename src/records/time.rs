/// Simulation steps per second
pub const TICK_RATE: i64 = 64;

/// Longest run accepted; stored tick counts fit a 32-bit column
pub const MAX_TICKS: i64 = i32::MAX as i64;

/// Renders a tick count as `mm:ss.mmm`, or `h:mm:ss.mmm` past the hour.
pub fn format_ticks(ticks: i64) -> String {
    let millis = i128::from(ticks.max(0)) * 1000 / i128::from(TICK_RATE);
    let hours = millis / 3_600_000;
    let minutes = (millis / 60_000) % 60;
    let seconds = (millis / 1000) % 60;
    let fraction = millis % 1000;

    if hours > 0 {
        format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, fraction)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, seconds, fraction)
    }
}
