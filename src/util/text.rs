use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended when a string is cut off.
const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width of a string in terminal columns, Unicode-aware (CJK and
/// emoji count double, combining marks zero).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates a string to fit within `max_width` terminal columns,
/// appending "..." when text was cut off.
///
/// Returns `Cow::Borrowed` when the string already fits, so the common
/// case in render loops allocates nothing.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    // Too narrow for an ellipsis: just keep whatever characters fit.
    let (budget, ellipsis) = if max_width > ELLIPSIS_WIDTH {
        (max_width - ELLIPSIS_WIDTH, true)
    } else {
        (max_width, false)
    };
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    if ellipsis {
        out.push_str(ELLIPSIS);
    }
    Cow::Owned(out)
}
