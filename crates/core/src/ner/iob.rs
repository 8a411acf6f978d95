//! IOB2 tag decoding

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Parsed view of one tag: `None` for the null tag, otherwise the begin
/// flag and the type suffix.
fn parse_tag<'a>(tag: &'a str, null_label: &str, position: usize) -> Result<Option<(bool, &'a str)>> {
    if tag == null_label {
        return Ok(None);
    }
    match tag.split_once('-') {
        Some(("B", typ)) if !typ.is_empty() => Ok(Some((true, typ))),
        Some(("I", typ)) if !typ.is_empty() => Ok(Some((false, typ))),
        _ => Err(Error::Annotation(format!(
            "tag {tag:?} at position {position} is neither {null_label:?} nor B-/I- shaped"
        ))),
    }
}

/// Decode a segment's IOB2 tags into entity spans.
///
/// Returns a map from half-open `(start, end)` word-index spans to entity
/// type, ordered by start index. A word closes the open span when it is
/// last in the segment, the next tag is null, or the next tag begins a new
/// span; it opens one when explicitly "B"-marked, first in the segment, or
/// preceded by the null tag or another type. Structural contradictions are
/// errors, never resynced.
pub fn segment_entities(
    tags: &[String],
    null_label: &str,
) -> Result<BTreeMap<(usize, usize), String>> {
    let mut spans = BTreeMap::new();
    let mut open_start: Option<usize> = None;
    let mut open_type: Option<&str> = None;

    for (i, tag) in tags.iter().enumerate() {
        let Some((begins, typ)) = parse_tag(tag, null_label, i)? else {
            if open_start.is_some() {
                return Err(Error::Annotation(format!(
                    "null tag at position {i} while a span is open"
                )));
            }
            continue;
        };

        let next = if i + 1 < tags.len() {
            parse_tag(&tags[i + 1], null_label, i + 1)?
        } else {
            None
        };
        // Last word, a following null tag, and a following new span all close
        let closes = match next {
            None => true,
            Some((next_begins, next_type)) => next_begins || next_type != typ,
        };

        if closes {
            if let Some(open) = open_type {
                if open != typ {
                    return Err(Error::Annotation(format!(
                        "entity changed type from {open:?} to {typ:?} at position {i}"
                    )));
                }
            }
            spans.insert((open_start.unwrap_or(i), i + 1), typ.to_string());
            open_start = None;
            open_type = None;
        } else {
            let prev = if i == 0 {
                None
            } else {
                parse_tag(&tags[i - 1], null_label, i - 1)?
            };
            let opens = begins || i == 0 || !matches!(prev, Some((_, prev_type)) if prev_type == typ);
            if opens {
                if open_start.is_some() {
                    return Err(Error::Annotation(format!(
                        "span opened at position {i} while another is open"
                    )));
                }
                open_start = Some(i);
                open_type = Some(typ);
            }
        }
    }
    Ok(spans)
}

/// Encode entity spans back into IOB2 tags.
///
/// The inverse of [`segment_entities`], used by corpus tooling and the
/// round-trip tests. Spans must lie inside `len` and not overlap.
pub fn tags_from_spans(
    len: usize,
    spans: &BTreeMap<(usize, usize), String>,
    null_label: &str,
) -> Result<Vec<String>> {
    let mut tags = vec![null_label.to_string(); len];
    for (&(start, end), typ) in spans {
        if start >= end || end > len {
            return Err(Error::Annotation(format!(
                "span ({start}, {end}) does not fit a {len}-word segment"
            )));
        }
        for (i, tag) in tags.iter_mut().enumerate().take(end).skip(start) {
            if *tag != null_label {
                return Err(Error::Annotation(format!(
                    "span ({start}, {end}) overlaps an earlier span at position {i}"
                )));
            }
            let prefix = if i == start { "B" } else { "I" };
            *tag = format!("{prefix}-{typ}");
        }
    }
    Ok(tags)
}

/// Count entity occurrences per type over a corpus split's annotations.
///
/// Logged before training so label imbalance is visible up front.
pub fn type_distribution(
    annotations: &[Vec<String>],
    null_label: &str,
) -> Result<BTreeMap<String, usize>> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for tags in annotations {
        for typ in segment_entities(tags, null_label)?.values() {
            *counts.entry(typ.clone()).or_default() += 1;
        }
    }
    for (typ, count) in &counts {
        tracing::info!(entity_type = typ.as_str(), count = *count, "entity type distribution");
    }
    Ok(counts)
}
