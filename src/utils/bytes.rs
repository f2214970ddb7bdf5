// Human-readable byte sizes for attachment listings

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count as B/KB/MB/GB. Whole bytes have no decimals; larger
/// units get one. Non-positive sizes render as "-".
pub fn format_bytes(size: i64) -> String {
    if size <= 0 {
        return "-".to_string();
    }

    let mut value = size as f64;
    let mut index = 0;
    while value >= 1024.0 && index < UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }

    if index == 0 {
        format!("{} {}", size, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[index])
    }
}
