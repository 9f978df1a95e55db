// src/config/duration.rs

use std::time::Duration;

/// Milliseconds per unit accepted in `timeout` and `retry_delay`.
const UNITS: [(&str, u64); 4] = [("ms", 1), ("s", 1_000), ("m", 60_000), ("h", 3_600_000)];

/// Parse `"<digits><unit>"` with unit `ms`, `s`, `m` or `h`, e.g. `"250ms"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' has no unit; expected ms, s, m or h"))?;
    let (digits, unit) = (&s[..split], s[split..].trim().to_ascii_lowercase());

    let amount: u64 = digits
        .parse()
        .map_err(|e| format!("bad number '{digits}' in duration '{s}': {e}"))?;
    let per_unit = UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, ms)| *ms)
        .ok_or_else(|| format!("unknown duration unit '{unit}'; expected ms, s, m or h"))?;

    amount
        .checked_mul(per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration '{s}' out of range"))
}
