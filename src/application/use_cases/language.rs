// ============================================================
// LANGUAGE PLAUSIBILITY
// ============================================================
// Lightweight indicator-word heuristic; guards against mislabeled
// columns without ever blocking an import

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Spanish,
    French,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::English => "English",
        }
    }
}

const SPANISH_WORDS: &[&str] = &[
    "para", "con", "que", "una", "del", "por", "sistema", "digital", "lámpara", "guía",
];
const FRENCH_WORDS: &[&str] = &[
    "pour", "avec", "que", "une", "du", "par", "système", "numérique", "lampe", "guide",
];
const ENGLISH_WORDS: &[&str] = &[
    "for", "with", "that", "a", "the", "by", "system", "digital", "lamp", "guide",
];

fn hit_count(text_lower: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| text_lower.contains(*w)).count()
}

/// Guess the language of `text`: two or more indicator-word hits wins, with
/// Spanish checked first, then French, then English. `None` when nothing
/// scores, or for empty input.
pub fn detect_language(text: &str) -> Option<Language> {
    if text.trim().is_empty() {
        return None;
    }
    let lower = text.to_lowercase();

    if hit_count(&lower, SPANISH_WORDS) >= 2 {
        return Some(Language::Spanish);
    }
    if hit_count(&lower, FRENCH_WORDS) >= 2 {
        return Some(Language::French);
    }
    if hit_count(&lower, ENGLISH_WORDS) >= 2 {
        return Some(Language::English);
    }
    None
}

/// True when two translations of the same logical field are byte-identical
/// and long enough that the match is unlikely to be a short shared term.
/// Usually means a missing translation.
pub fn identical_translation(a: &str, b: &str, min_len: usize) -> bool {
    a == b && a.len() > min_len
}
