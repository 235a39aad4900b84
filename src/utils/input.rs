//! Cleaning of pasted text before it reaches a text field.

/// Make pasted text safe to insert into a single-line field.
///
/// Tabs become four spaces, line breaks (`\r\n`, `\r`, `\n`) become a single
/// space, and any other control character is dropped.
pub fn sanitize_text_input(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\t' => sanitized.push_str("    "),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                sanitized.push(' ');
            }
            '\n' => sanitized.push(' '),
            _ if !c.is_control() => sanitized.push(c),
            _ => {}
        }
    }

    sanitized
}
