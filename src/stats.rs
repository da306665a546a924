use crate::util;

const BAR_LENGTH: usize = 30;

/// Percentage of `received` out of `total`, never above 100. Chunked
/// responses may deliver more than they advertised.
pub fn percent(received: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (received.saturating_mul(100) / total).min(100) as u8
}

/// One status line for an archive download, without the leading `\r`.
pub fn progress_line(received: u64, total: Option<u64>) -> String {
    match total {
        Some(total) => {
            let percent = percent(received, total);
            let filled = BAR_LENGTH * percent as usize / 100;
            format!(
                "Downloading: |{}{}| {}% Complete",
                "█".repeat(filled),
                "░".repeat(BAR_LENGTH - filled),
                percent
            )
        }
        None => format!("Downloading: {}", util::format_bytes(received)),
    }
}
