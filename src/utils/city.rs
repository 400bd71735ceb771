/// Title-case a city name: the first character of every whitespace-separated
/// token is upper-cased and the rest lower-cased. Surrounding whitespace is
/// dropped; inner whitespace is kept as typed.
///
/// Applied both when a complaint is stored and to the city filter input, so
/// matching is case-insensitive from the caller's point of view.
pub fn normalize_city(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_token_start = true;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            out.push(ch);
            at_token_start = true;
        } else if at_token_start {
            // Multi-char uppercase expansions (e.g. 'ß' -> "SS") keep only the
            // first char upper so that normalizing twice changes nothing.
            let mut upper = ch.to_uppercase();
            if let Some(first) = upper.next() {
                out.push(first);
            }
            out.extend(upper.flat_map(char::to_lowercase));
            at_token_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }

    out
}
