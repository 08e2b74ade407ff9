//! Shared utility functions

/// Format an upload limit in human-readable units.
///
/// # Examples
///
/// ```
/// use wxhook_server::util::format_file_size;
///
/// assert_eq!(format_file_size(512), "512 bytes");
/// assert_eq!(format_file_size(10 * 1024 * 1024), "10.0MB");
/// ```
pub fn format_file_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    match bytes {
        b if b < KB => format!("{b} bytes"),
        b if b < MB => format!("{}KB", b / KB),
        b => format!("{:.1}MB", b as f64 / MB as f64),
    }
}
