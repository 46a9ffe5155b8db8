//! Derived HTML rendering of a registry file.

use core::fmt::Write as _;
use std::path::Path;

use super::DELIMITER;
use crate::error::Result;

/// Regenerate the HTML mirror of `csv_file` at `html_file`, best effort.
///
/// The rendering is derived state; a failure here is logged at warn level
/// and never propagated, so it cannot corrupt the registry itself.
pub(crate) fn regenerate(csv_file: &Path, html_file: &Path) {
    if let Err(err) = render(csv_file, html_file) {
        tracing::warn!(%err, file = %html_file.display(), "failed to regenerate registry rendering");
    }
}

fn render(csv_file: &Path, html_file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(csv_file)?;
    let mut lines = content.lines();

    let mut html = String::with_capacity(content.len() * 4);
    html.push_str("<table border=\"1\" class=\"dataframe\">\n");

    if let Some(header) = lines.next() {
        html.push_str("  <thead>\n    <tr style=\"text-align: right;\">\n");
        for cell in header.split(DELIMITER) {
            let _ = writeln!(html, "      <th>{}</th>", escape(cell));
        }
        html.push_str("    </tr>\n  </thead>\n");
    }

    html.push_str("  <tbody>\n");
    for line in lines {
        html.push_str("    <tr>\n");
        for cell in line.split(DELIMITER) {
            let _ = writeln!(html, "      <td>{}</td>", escape(cell));
        }
        html.push_str("    </tr>\n");
    }
    html.push_str("  </tbody>\n</table>\n");

    std::fs::write(html_file, html)?;
    Ok(())
}

fn escape(cell: &str) -> String {
    cell.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
