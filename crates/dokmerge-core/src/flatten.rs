//! Paragraph text flattening
//!
//! Word splits text into runs wherever formatting, spell-check state or
//! editing history changes, so `{{name}}` may arrive as `"{{na"` + `"me}}"`.
//! Matching happens on the concatenation of all runs instead.

use dokmerge_ooxml::{Paragraph, Run};

/// Concatenate the text of every direct run of `paragraph`, in order
pub fn flatten(paragraph: &Paragraph) -> String {
    paragraph.runs().map(Run::text).collect()
}
