use rand::seq::IndexedRandom;

/// Replies for the "Д" trigger, chosen uniformly at random.
pub const PHRASES_ON_D: &[&str] = &["не хочу", "не буду"];

/// Reply elicited by a plain-text message, if any. Only administrators
/// trigger anything; everyone else's messages are ignored.
pub fn response(text: &str, is_admin: bool) -> Option<String> {
    if !is_admin {
        return None;
    }

    match text.trim() {
        echo @ ("е" | "Е") => Some(echo.to_string()),
        "Д" => PHRASES_ON_D
            .choose(&mut rand::rng())
            .map(|phrase| phrase.to_string()),
        _ => None,
    }
}
