/// Splits a chat command line into its tokens.
///
/// The line is trimmed and must start with `prefix`, otherwise it is not a
/// command and `None` is returned. The remainder goes through [`tokenize`].
///
/// ```
/// use paddock_event_system::parse_args;
///
/// assert_eq!(
///     parse_args(r#"/kick "John Doe" reason"#, '/'),
///     Some(vec!["kick".to_string(), "John Doe".to_string(), "reason".to_string()])
/// );
/// assert_eq!(parse_args("notacommand", '/'), None);
/// ```
pub fn parse_args(text: &str, prefix: char) -> Option<Vec<String>> {
    let body = text.trim().strip_prefix(prefix)?;
    Some(tokenize(body))
}

/// Quote-aware tokenizer.
///
/// Spaces separate tokens. A `"` opens a verbatim run in which spaces are kept;
/// the closing `"` always ends a token, even an empty one. An opening quote
/// flushes any token that was being built.
pub fn tokenize(body: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut verbatim = false;

    for ch in body.chars() {
        match ch {
            '"' if verbatim => {
                verbatim = false;
                tokens.push(std::mem::take(&mut current));
            }
            '"' => {
                verbatim = true;
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            ' ' if !verbatim => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
