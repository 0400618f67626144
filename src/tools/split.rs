//! Shell-style splitting of user-typed option strings.

/// Split a command line into arguments.
///
/// Whitespace outside quotes separates arguments. Single and double quotes
/// group text (including whitespace) into one argument and are removed; an
/// empty quoted segment produces an empty argument. Backslashes are literal.
/// An unterminated quote extends to the end of the input.
#[must_use]
pub fn split_arguments(command_line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current: Option<String> = None;
    let mut quote: Option<char> = None;

    for ch in command_line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.get_or_insert_with(String::new).push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                // A quote always starts a token, even if it ends up empty.
                current.get_or_insert_with(String::new);
            }
            None if ch.is_whitespace() => {
                if let Some(arg) = current.take() {
                    args.push(arg);
                }
            }
            None => current.get_or_insert_with(String::new).push(ch),
        }
    }

    if let Some(arg) = current {
        args.push(arg);
    }
    args
}
