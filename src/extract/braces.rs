// Balanced brace matching.
//
// Model output often carries braces in the surrounding prose ("use {x}",
// a second example object after the answer). Taking the first `{` and the
// last `}` would swallow those, so we scan for the first brace that opens
// at depth 0 and stop at the brace that brings depth back to 0.
//
// Two scans are offered. The plain one counts every brace. The quoted one
// ignores braces inside string literals once the payload has started,
// which handles values such as "a } b" but gives up on payloads with
// unbalanced quotes. `extract` tries the quoted scan first.

/// Outermost balanced `{...}` span, counting every brace. `None` if the
/// first opening brace is never closed (or there is none).
pub fn outermost_braces(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut start = None;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &text[s..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Like `outermost_braces`, but braces inside single- or double-quoted
/// strings within the payload do not count.
pub fn outermost_braces_quoted(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut start = None;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'"' | b'\'' if depth > 0 => quote = Some(b),
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &text[s..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
