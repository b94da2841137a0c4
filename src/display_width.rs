use unicode_width::UnicodeWidthStr;

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Split a label into lines on `\n`, `<br/>`, `<br>` and `<br />`
/// (case-insensitive).
pub fn label_lines(s: &str) -> Vec<&str> {
    s.split('\n')
        .flat_map(split_br)
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

const BREAK_TAGS: [&str; 3] = ["<br/>", "<br />", "<br>"];

fn split_br(s: &str) -> Vec<&str> {
    let lower = s.to_ascii_lowercase();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut from = 0;
    while let Some(offset) = lower[from..].find("<br") {
        let at = from + offset;
        match BREAK_TAGS.iter().find(|tag| lower[at..].starts_with(*tag)) {
            Some(tag) => {
                parts.push(&s[start..at]);
                start = at + tag.len();
                from = start;
            }
            None => from = at + 3,
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Widest line of a label, in terminal columns.
pub fn label_width(s: &str) -> usize {
    label_lines(s)
        .iter()
        .map(|line| display_width(line))
        .max()
        .unwrap_or(0)
}

pub fn line_count(s: &str) -> usize {
    label_lines(s).len()
}
