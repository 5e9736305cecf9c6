use std::fmt::Write;

use crate::config::AdvertisementConfig;
use crate::models::TrackSnapshot;
use crate::volume::is_advertisement;

const RULE: &str = "==================================================";
const HEADER: &str = "🎧 Bluetooth A2DP player";

/// Formats the fixed display block for a snapshot.
pub fn render(snapshot: &TrackSnapshot, ads: &AdvertisementConfig) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_block(&mut out, snapshot, ads);
    out
}

fn write_block(
    out: &mut String,
    snapshot: &TrackSnapshot,
    ads: &AdvertisementConfig,
) -> std::fmt::Result {
    writeln!(out, "{RULE}")?;
    writeln!(out, "{HEADER}")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Status : {}", snapshot.status)?;

    if snapshot.status.is_message() {
        writeln!(out, "Message: {}", snapshot.title)?;
    } else {
        let title = if is_advertisement(&snapshot.artist, &ads.marker) {
            ads.placeholder.as_str()
        } else {
            snapshot.title.as_str()
        };

        writeln!(out)?;
        writeln!(out, "--- Now playing ---")?;
        writeln!(out, "Title  : {title}")?;
        writeln!(out, "Artist : {}", snapshot.artist)?;
        writeln!(out, "Album  : {}", snapshot.album)?;
        if let Some(duration) = snapshot.format_duration() {
            writeln!(out, "Duration: {duration}")?;
        }
    }

    writeln!(out, "{RULE}")
}
