use nova_types::Span;

/// Extracts a byte range selection from a fixture containing `/*start*/` and
/// `/*end*/` markers.
///
/// Returns the fixture with markers removed and the selection `Span`
/// pointing at the extracted region.
pub fn extract_range(fixture: &str) -> (String, Span) {
    let start_marker = "/*start*/";
    let end_marker = "/*end*/";

    let start = fixture
        .find(start_marker)
        .expect("fixture missing /*start*/ marker");
    let after_start = start + start_marker.len();
    let end = fixture
        .find(end_marker)
        .expect("fixture missing /*end*/ marker");
    assert!(end >= after_start, "/*end*/ must come after /*start*/");

    let mut text = String::with_capacity(fixture.len());
    text.push_str(&fixture[..start]);
    text.push_str(&fixture[after_start..end]);
    text.push_str(&fixture[end + end_marker.len()..]);

    // Range in the marker-stripped text: the start position stays the same;
    // the end shrinks by the length of the start marker.
    let range = Span::new(start, end - start_marker.len());
    (text, range)
}

/// Span of the first occurrence of `needle` in `text`.
#[track_caller]
pub fn span_of(text: &str, needle: &str) -> Span {
    nth_span_of(text, needle, 0)
}

/// Span of the `n`-th (zero based) occurrence of `needle` in `text`.
///
/// Occurrences are searched without overlap, left to right.
#[track_caller]
pub fn nth_span_of(text: &str, needle: &str, n: usize) -> Span {
    assert!(!needle.is_empty(), "needle must not be empty");
    let start = text
        .match_indices(needle)
        .nth(n)
        .map(|(idx, _)| idx)
        .unwrap_or_else(|| panic!("fixture has no occurrence #{n} of {needle:?}:\n{text}"));
    Span::new(start, start + needle.len())
}

/// Span of the first `needle` that starts at or after the end of the first
/// `anchor`.
#[track_caller]
pub fn span_after(text: &str, anchor: &str, needle: &str) -> Span {
    let anchor = span_of(text, anchor);
    let rel = text[anchor.end..]
        .find(needle)
        .unwrap_or_else(|| panic!("fixture has no {needle:?} after {anchor:?}:\n{text}"));
    let start = anchor.end + rel;
    Span::new(start, start + needle.len())
}

/// All spans of `needle` in `text`, left to right.
pub fn all_spans_of(text: &str, needle: &str) -> Vec<Span> {
    text.match_indices(needle)
        .map(|(idx, m)| Span::new(idx, idx + m.len()))
        .collect()
}
