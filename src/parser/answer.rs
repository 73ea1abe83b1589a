/// Strip the `"<number>. "` prefix every problem component starts with.
/// `None` means the text is not the component for `number`.
pub fn process_component(text: &str, number: u32) -> Option<&str> {
    text.strip_prefix(&format!("{}. ", number))
}

pub fn process_question(text: &str, number: u32) -> Option<&str> {
    process_component(text, number)
}

/// Pull the final answer out of a worked solution such as
/// `"3. 10 + 5 = 15."` or `"4. total = 3 1/4 pies"`.
///
/// The answer follows the last `=` that has something after it. It is a
/// single token when that token ends a sentence, otherwise the token plus a
/// following fraction, if the next token starts with a digit.
pub fn process_solution(text: &str, number: u32) -> Option<String> {
    let body = process_component(text, number)?;
    let tokens: Vec<&str> = body.split_whitespace().collect();

    let marker = (0..tokens.len().saturating_sub(1))
        .rev()
        .find(|&i| tokens[i] == "=")?;

    let whole = tokens[marker + 1];
    let stripped = strip_ending_punctuation(whole);
    if stripped != whole {
        return Some(stripped.to_string());
    }

    let fraction = match tokens.get(marker + 2).map(|t| strip_ending_punctuation(t)) {
        Some(fraction) if fraction != whole => fraction,
        _ => return Some(whole.to_string()),
    };

    if fraction.starts_with(|c: char| c.is_ascii_digit()) {
        Some(format!("{} {}", whole, fraction))
    } else {
        Some(whole.to_string())
    }
}

/// Drop one trailing `.`, `,` or `!`.
pub fn strip_ending_punctuation(token: &str) -> &str {
    token
        .strip_suffix(|c: char| matches!(c, '.' | ',' | '!'))
        .unwrap_or(token)
}
