//! Lexer character-set parsing: `[a-z0-9\nÿ]` → interval set.

use gramir_atn::IntervalSet;

/// Parse result: the set plus any elements whose code points were
/// already covered (reported as collisions by the caller).
#[derive(Debug, Default)]
pub struct CharSetParse {
    pub set: IntervalSet,
    /// Textual form of each colliding element, in order of appearance.
    pub collisions: Vec<String>,
}

/// Parse the raw bracketed text of a character set.
pub fn parse_char_set(raw: &str) -> CharSetParse {
    let body = raw
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(raw);

    // Decode escapes first; a dash only separates a range when unescaped.
    let mut decoded: Vec<(char, bool)> = Vec::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(ch) = unescape_next(&mut chars) {
                decoded.push((ch, true));
            }
        } else {
            decoded.push((c, false));
        }
    }

    let mut out = CharSetParse::default();
    let mut i = 0;
    while i < decoded.len() {
        let lo = decoded[i].0;
        let mut hi = lo;
        if i + 2 < decoded.len() && decoded[i + 1] == ('-', false) {
            hi = decoded[i + 2].0;
            i += 3;
        } else {
            i += 1;
        }

        let (a, b) = (lo as i32, hi.max(lo) as i32);
        if out.set.overlap(a, b).is_some() {
            out.collisions.push(render(lo, hi));
        }
        out.set.add_range(a, b);
    }

    out
}

fn render(lo: char, hi: char) -> String {
    if lo == hi {
        format!("{lo}")
    } else {
        format!("{lo}-{hi}")
    }
}

/// Decode one escape after a backslash.
fn unescape_next(chars: &mut std::str::Chars<'_>) -> Option<char> {
    Some(match chars.next()? {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'f' => '\x0C',
        'b' => '\x08',
        'u' => {
            let hex: String = chars.by_ref().take(4).collect();
            u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)?
        }
        other => other,
    })
}
