use regex::Regex;
use tracing::{trace, warn};

use crate::core::Span;

/// Find the span of the first markup usage of `component_name`
///
/// A self-closing tag (`<Name ... />`) is preferred. Otherwise the span runs
/// from the first `<Name>` to the end of the first `</Name>`; the two are
/// found independently, so nested or repeated usages can pair the wrong
/// tags.
///
/// This is a regex scan, not a parse: tags inside strings or comments match
/// just like real ones.
pub fn locate(document_text: &str, component_name: &str) -> Option<Span> {
    if component_name.is_empty() {
        return None;
    }

    let name = regex::escape(component_name);

    if let Some(span) = find_first(&format!(r"<{name}[^>]*?/\s*>"), document_text) {
        trace!("Self-closing <{}> at {:?}", component_name, span);
        return Some(span);
    }

    let open = find_first(&format!(r"<\s*{name}\s*>"), document_text)?;
    let close = find_first(&format!(r"<\s*/\s*{name}\s*>"), document_text)?;

    if close.end <= open.start {
        trace!(
            "Closing tag for {} precedes its opening tag, ignoring",
            component_name
        );
        return None;
    }

    Some(Span::new(open.start, close.end))
}

fn find_first(pattern: &str, text: &str) -> Option<Span> {
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            warn!("Failed to build tag pattern {}: {}", pattern, e);
            return None;
        }
    };
    regex.find(text).map(|m| Span::from(m.range()))
}
