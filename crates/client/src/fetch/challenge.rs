//! Bot-verification interstitial detection.

/// Whether `title` contains any of `phrases`, ignoring case.
///
/// Blank phrases never match.
pub fn is_challenge_title(title: &str, phrases: &[String]) -> bool {
    let title = title.to_lowercase();
    phrases
        .iter()
        .map(|phrase| phrase.trim())
        .filter(|phrase| !phrase.is_empty())
        .any(|phrase| title.contains(&phrase.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases() -> Vec<String> {
        vec!["just a moment".into(), "verify you are human".into()]
    }

    #[test]
    fn test_matches_case_insensitively() {
        assert!(is_challenge_title("Just a moment...", &phrases()));
        assert!(is_challenge_title("Please VERIFY YOU ARE HUMAN", &phrases()));
    }

    #[test]
    fn test_regular_title_does_not_match() {
        assert!(!is_challenge_title("Frostbite - Icecrown - Warmane Armory", &phrases()));
        assert!(!is_challenge_title("", &phrases()));
    }

    #[test]
    fn test_blank_phrase_never_matches() {
        let phrases = vec!["   ".to_string(), String::new()];
        assert!(!is_challenge_title("anything at all", &phrases));
    }
}
