//! Markdown assembly from reconstructed lines.

use crate::output::Line;
use crate::pipeline::postprocess;

/// Join line texts with `\n`, across pages, with no page-break marker.
///
/// When `normalize` is set the joined text goes through
/// [`postprocess::normalize_markdown`]; otherwise it is returned verbatim.
pub fn assemble(lines: &[Line], normalize: bool) -> String {
    let raw = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    if normalize {
        postprocess::normalize_markdown(&raw)
    } else {
        raw
    }
}
