//! Shared formatting helpers for text reports.
//!
//! All pure formatting functions (no layout, no I/O) live here.

/// Format uptime seconds as `"[Nd ]HH:MM:SS (S.SSs)"`.
///
/// `93784.5` → `"1d 02:03:04 (93784.50s)"`, `59.0` → `"00:00:59 (59.00s)"`.
pub fn format_uptime(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    let days = total / 86400;
    let h = (total % 86400) / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if days > 0 {
        format!("{days}d {h:02}:{m:02}:{s:02} ({secs:.2}s)")
    } else {
        format!("{h:02}:{m:02}:{s:02} ({secs:.2}s)")
    }
}

/// Format KiB to human-readable size.
pub fn format_kb(kb: u64) -> String {
    if kb == 0 {
        return "0".to_string();
    }
    if kb >= 1024 * 1024 {
        format!("{:.1} GiB", kb as f64 / (1024.0 * 1024.0))
    } else if kb >= 1024 {
        format!("{:.1} MiB", kb as f64 / 1024.0)
    } else {
        format!("{} KiB", kb)
    }
}

/// Format an optional value, `"?"` when unknown.
pub fn or_unknown<T: ToString>(v: Option<T>) -> String {
    v.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// Truncate string to `max_chars` characters with unicode ellipsis (`…`).
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
