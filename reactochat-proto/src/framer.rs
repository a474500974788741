//! Bracket-Balanced Framer (§4.G)
//!
//! Scans a byte buffer for `{ ... }` ranges using the reference algorithm
//! exactly: for each `{`, scan forward for the next `}` and emit the slice
//! between them inclusive, then resume scanning immediately after the
//! closing brace. This is *not* a depth-counting scanner — a `{` nested
//! inside the outer object, or a literal `{`/`}` inside a JSON string, is
//! not handled specially. The reference wire schema is flat and
//! base64-encodes arbitrary content precisely so this works in practice;
//! see the regression test below for the documented limitation.
//!
//! An unterminated `{` at the end of the buffer (no following `}`) yields no
//! range for that position; bytes are not buffered across calls; callers
//! that expect a stray half-message at a read boundary should rely on the
//! next `recv` delivering the rest of it in the same buffer, as the
//! reference implementation does (no framer state survives between
//! `handRecv` calls).

/// Extract every bracket-delimited slice from `buf`, in order.
///
/// Each returned slice includes both the opening `{` and closing `}` bytes.
#[must_use]
pub fn extract_objects(buf: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < buf.len() {
        if buf[i] == b'{' {
            let mut j = i;
            let mut found = false;
            while j < buf.len() {
                if buf[j] == b'}' {
                    found = true;
                    break;
                }
                j += 1;
            }
            if found {
                out.push(&buf[i..=j]);
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    out
}
