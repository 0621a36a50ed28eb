//! Utility functions for names, sizes, and host introspection

use std::path::Path;

/// Reduce a declared file name to its final path component
///
/// Declared names come straight from the transport and are untrusted;
/// embedded separators would otherwise let a name escape the destination
/// directory. Returns `None` when nothing usable remains.
///
/// # Examples
///
/// ```
/// use torrent_inbox::utils::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("movie.torrent"), Some("movie.torrent".to_string()));
/// assert_eq!(sanitize_file_name("../../etc/passwd"), Some("passwd".to_string()));
/// assert_eq!(sanitize_file_name(""), None);
/// ```
pub fn sanitize_file_name(declared: &str) -> Option<String> {
    let name = Path::new(declared)
        .file_name()
        .and_then(|n| n.to_str())?
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// Whether a declared file name is a `.torrent` file (case-insensitive)
pub fn is_torrent_file(declared: &str) -> bool {
    Path::new(declared)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("torrent"))
        .unwrap_or(false)
}

/// Format a byte count as megabytes with two decimals, e.g. "12.34 MB"
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Human-readable system uptime line
///
/// Reads `/proc/uptime` on unix hosts; degrades to a fixed message when
/// the information is unavailable.
#[cfg(unix)]
pub fn uptime_message() -> String {
    match read_proc_uptime() {
        Some(seconds) => {
            let days = (seconds / 86_400.0) as u64;
            let hours = ((seconds % 86_400.0) / 3600.0) as u64;
            let minutes = ((seconds % 3600.0) / 60.0) as u64;
            format!("System uptime: {days} days, {hours} hours, {minutes} minutes.")
        }
        None => "Unable to get system uptime.".to_string(),
    }
}

/// Human-readable system uptime line (unsupported on this platform)
#[cfg(not(unix))]
pub fn uptime_message() -> String {
    "Unable to get system uptime.".to_string()
}

#[cfg(unix)]
fn read_proc_uptime() -> Option<f64> {
    let raw = std::fs::read_to_string("/proc/uptime").ok()?;
    raw.split_whitespace().next()?.parse().ok()
}

/// Write a health-check trigger file containing the current UTC timestamp
///
/// The host-side healthcheck watches for this file; parent directories
/// are created as needed.
///
/// # Errors
/// Returns an error when the directory or file cannot be written.
pub fn write_health_trigger(path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, chrono::Utc::now().to_rfc3339())?;
    Ok(())
}
