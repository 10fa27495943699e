//! Collapses look-alike-character evasion ("п1дaр", "@" for "а" and so
//! on) into plain lowercase Cyrillic so the profanity lexicon can match
//! by simple word comparison.

/// Fixed table of Latin letters, digits and symbols that spammers swap
/// in for visually similar Cyrillic letters.
fn lookalike(c: char) -> Option<char> {
    Some(match c {
        'a' => 'а',
        'b' => 'в',
        'c' => 'с',
        'e' => 'е',
        'h' => 'н',
        'k' => 'к',
        'm' => 'м',
        'o' => 'о',
        'p' => 'р',
        'r' => 'г',
        't' => 'т',
        'u' => 'и',
        'x' => 'х',
        'y' => 'у',
        '0' => 'о',
        '1' => 'и',
        '3' => 'з',
        '4' => 'ч',
        '6' => 'б',
        '@' => 'а',
        '$' => 'с',
        _ => return None,
    })
}

fn is_kept(c: char) -> bool {
    matches!(c, 'а'..='я' | 'ё') || c.is_whitespace()
}

/// Lowercase, substitute look-alikes, and drop everything that is not
/// Cyrillic or whitespace. Total and idempotent over arbitrary text.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        let c = lookalike(c).unwrap_or(c);
        if is_kept(c) {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_lookalikes() {
        assert_eq!(normalize("п1дaр"), "пидар");
        assert_eq!(normalize("ПРИВ3Т"), "привзт");
        assert_eq!(normalize("сук@"), "сука");
    }

    #[test]
    fn strips_foreign_noise() {
        assert_eq!(normalize("при—вет!!!qwz:)"), "привет");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("12345 #!?"), "изч ");
    }

    #[test]
    fn keeps_whitespace_between_words() {
        assert_eq!(normalize("иди на хуй"), "иди на хуй");
    }

    #[test]
    fn is_idempotent() {
        for input in ["п1дaр", "Normal English", "Привет, мир!", "@@@", ""] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "failed on {input:?}");
        }
    }
}
