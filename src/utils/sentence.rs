use std::collections::HashSet;

/// Splits a block of text into sentences.
pub trait SentenceSegmenter {
    fn segment(&self, text: &str) -> anyhow::Result<Vec<String>>;
}

const ENGLISH_ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "ft", "gen", "col", "lt", "capt",
    "sgt", "gov", "rev", "hon", "pres", "vs", "etc", "cf", "al", "approx", "ca", "c", "no", "nos",
    "vol", "vols", "fig", "figs", "pp", "p", "ch", "chap", "sec", "art", "ed", "eds", "est", "dept",
    "univ", "inc", "ltd", "co", "corp", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec", "e.g", "i.e", "a.d", "b.c", "a.m", "p.m", "u.s", "u.k",
];

const CLOSERS: &[char] = &['"', '\'', ')', ']', '}', '\u{201D}', '\u{2019}'];

/// Rule-based English sentence boundary detection.
///
/// A boundary is a run of `.`, `!` or `?` (plus any closing quotes or
/// brackets) followed by whitespace and a character that can open a
/// sentence. Periods after known abbreviations, single-letter initials and
/// dotted acronyms are not boundaries. Whitespace inside each sentence is
/// collapsed to single spaces.
#[derive(Debug, Clone)]
pub struct RuleSegmenter {
    abbreviations: HashSet<String>,
}

impl Default for RuleSegmenter {
    fn default() -> Self {
        Self::english()
    }
}

impl RuleSegmenter {
    pub fn english() -> Self {
        Self::with_abbreviations(ENGLISH_ABBREVIATIONS.iter().copied())
    }

    /// Abbreviations are matched case-insensitively and without their final period.
    pub fn with_abbreviations<'a>(abbreviations: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            abbreviations: abbreviations
                .into_iter()
                .map(|a| a.trim_end_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn is_protected_period(&self, word: &str) -> bool {
        let stem = word
            .trim_start_matches(|c: char| CLOSERS.contains(&c) || c == '(' || c == '[')
            .trim_end_matches('.');
        if stem.is_empty() {
            return false;
        }
        if self.abbreviations.contains(&stem.to_lowercase()) {
            return true;
        }
        let mut chars = stem.chars();
        let single_initial = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase());
        let dotted_acronym = stem.contains('.') && stem.split('.').all(|part| part.chars().count() == 1);
        single_initial || dotted_acronym
    }
}

fn opens_sentence(c: char) -> bool {
    c.is_uppercase()
        || c.is_numeric()
        || matches!(c, '"' | '\'' | '(' | '[' | '\u{201C}' | '\u{2018}')
}

impl SentenceSegmenter for RuleSegmenter {
    fn segment(&self, text: &str) -> anyhow::Result<Vec<String>> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut sentences = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for (i, &word) in words.iter().enumerate() {
            current.push(word);

            let core = word.trim_end_matches(CLOSERS);
            let Some(last) = core.chars().last() else {
                continue;
            };
            if !matches!(last, '.' | '!' | '?') {
                continue;
            }

            let boundary = match words.get(i + 1) {
                None => true,
                Some(next) => {
                    let starts = next.chars().next().map(opens_sentence).unwrap_or(false);
                    starts && !(last == '.' && self.is_protected_period(core))
                }
            };

            if boundary {
                sentences.push(current.join(" "));
                current.clear();
            }
        }

        if !current.is_empty() {
            sentences.push(current.join(" "));
        }

        Ok(sentences)
    }
}
