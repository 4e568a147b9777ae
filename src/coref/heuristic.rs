use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::{Cluster, CorefEngine, CorefOutput, Mention};

/// Capitalized words that start a sentence without naming anything.
const NON_NAMES: &[&str] = &[
    "The", "A", "An", "This", "That", "These", "Those", "In", "On", "At", "By", "For", "From",
    "With", "After", "Before", "During", "When", "While", "Although", "But", "And", "Or", "If",
    "As", "Its", "It", "They", "Their", "We", "Our", "You", "Your", "I", "He", "She", "His", "Her",
    "Him", "There", "Here", "Some", "Many", "Most", "All", "Each", "Every", "What", "Why", "How",
    "Who", "Which", "Where", "Chapter", "Fig", "Figure", "Source", "Activity",
];

/// Capitalized only because they open a sentence.
const SENTENCE_OPENERS: &[&str] = &[
    "Later", "Soon", "Today", "Then", "Now", "However", "Meanwhile", "Finally", "Eventually",
    "Thus", "Therefore", "Hence", "Also", "Moreover", "Furthermore", "Earlier", "Once", "Since",
    "Until", "Because", "Though", "Despite", "Instead", "Yet", "So", "Such", "Both", "Another",
    "Other", "One", "Only", "Even", "Still", "Under", "Over", "Through", "Between", "Among",
    "Against", "Like", "Unlike", "Following", "According", "Gradually", "Initially",
    "Subsequently", "Nevertheless", "Again", "Not", "No",
];

/// Prepositions and articles after which `her` is an object, not a possessive.
const AFTER_OBJECT: &[&str] = &[
    "to", "and", "in", "on", "at", "with", "for", "from", "by", "as", "that", "the", "a", "an",
    "of", "or", "but", "into", "about",
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pronoun {
    Nominative,
    Object,
    Reflexive,
    Possessive,
    /// `her` needs the following word to decide between object and possessive.
    Her,
}

fn personal_pronoun(word: &str) -> Option<Pronoun> {
    match word.to_lowercase().as_str() {
        "he" | "she" => Some(Pronoun::Nominative),
        "him" => Some(Pronoun::Object),
        "himself" | "herself" => Some(Pronoun::Reflexive),
        "his" | "hers" => Some(Pronoun::Possessive),
        "her" => Some(Pronoun::Her),
        _ => None,
    }
}

/// A word match; `end` excludes a possessive `'s`, `full_end` does not.
#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    end: usize,
    full_end: usize,
}

impl Token {
    fn is_possessive(&self) -> bool {
        self.end != self.full_end
    }
}

fn possessive_stem(word: &str) -> &str {
    ["'s", "\u{2019}s", "'", "\u{2019}"]
        .iter()
        .find_map(|suffix| word.strip_suffix(suffix).filter(|stem| !stem.is_empty()))
        .unwrap_or(word)
}

struct Entity {
    main: Mention,
    mentions: Vec<Mention>,
}

/// Rule-based resolver for named people in textbook prose.
///
/// Capitalized word runs are named mentions; a possessive `'s` is not part
/// of the name, and a single word matching the last word of an earlier name
/// joins that name's cluster. A single capitalized word at the start of a
/// sentence only counts as a name when the text also capitalizes it
/// mid-sentence, when it is already known, or when it is neither a common
/// sentence opener nor found lowercase elsewhere.
///
/// The first non-possessive name of a sentence is its subject. Third-person
/// singular pronouns resolve to the current sentence's subject, or to the
/// last subject of an earlier sentence; object pronouns always look back to
/// earlier sentences. Resolved pronouns are replaced by the cluster's main
/// mention (possessives gain `'s`). Only clusters with at least two mentions
/// are reported.
pub struct HeuristicCoref {
    word: Regex,
}

impl Default for HeuristicCoref {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicCoref {
    pub fn new() -> Self {
        Self {
            word: Regex::new(r"[A-Za-z][A-Za-z'\u{2019}-]*").expect("valid word pattern"),
        }
    }

    fn tokenize(&self, text: &str) -> Vec<Token> {
        self.word
            .find_iter(text)
            .map(|m| Token {
                start: m.start(),
                end: m.start() + possessive_stem(m.as_str()).len(),
                full_end: m.end(),
            })
            .collect()
    }
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().map(char::is_uppercase).unwrap_or(false)
}

fn ends_sentence(gap: &str) -> bool {
    gap.contains(['.', '!', '?', '\n'])
}

fn starts_sentence(text: &str, tokens: &[Token], i: usize) -> bool {
    i == 0 || ends_sentence(&text[tokens[i - 1].full_end..tokens[i].start])
}

impl CorefEngine for HeuristicCoref {
    fn resolve(&self, text: &str) -> anyhow::Result<CorefOutput> {
        let words = self.tokenize(text);

        let mut capitalized_inside: HashSet<&str> = HashSet::new();
        let mut lowercase: HashSet<&str> = HashSet::new();
        for (i, token) in words.iter().enumerate() {
            let word = &text[token.start..token.end];
            if !is_capitalized(word) {
                lowercase.insert(word);
            } else if !starts_sentence(text, &words, i) {
                capitalized_inside.insert(word);
            }
        }

        let mut entities: Vec<Entity> = Vec::new();
        let mut by_text: HashMap<String, usize> = HashMap::new();
        let mut sentence_subject: Option<usize> = None;
        let mut carried: Option<usize> = None;
        let mut replacements: Vec<(usize, usize, String)> = Vec::new();

        let mut i = 0;
        while i < words.len() {
            let Token { start, full_end, .. } = words[i];
            let at_sentence_start = starts_sentence(text, &words, i);
            if at_sentence_start && sentence_subject.is_some() {
                carried = sentence_subject.take();
            }
            let word = &text[start..full_end];

            if let Some(kind) = personal_pronoun(word) {
                let kind = match kind {
                    Pronoun::Her => {
                        let possessive = words.get(i + 1).map_or(false, |next| {
                            text[full_end..next.start].trim().is_empty()
                                && !AFTER_OBJECT.contains(
                                    &text[next.start..next.full_end].to_lowercase().as_str(),
                                )
                        });
                        if possessive {
                            Pronoun::Possessive
                        } else {
                            Pronoun::Object
                        }
                    }
                    other => other,
                };
                let target = match kind {
                    Pronoun::Object => carried,
                    _ => sentence_subject.or(carried),
                };
                if let Some(idx) = target {
                    let entity = &mut entities[idx];
                    let replacement = if kind == Pronoun::Possessive {
                        format!("{}'s", entity.main.text)
                    } else {
                        entity.main.text.clone()
                    };
                    entity.mentions.push(Mention {
                        start,
                        end: full_end,
                        text: word.to_string(),
                    });
                    replacements.push((start, full_end, replacement));
                    sentence_subject.get_or_insert(idx);
                }
                i += 1;
                continue;
            }

            let stem = &text[start..words[i].end];
            if !is_capitalized(stem) || NON_NAMES.contains(&stem) {
                i += 1;
                continue;
            }

            // Extend over following capitalized words joined by a single space.
            let mut run_end = i;
            while let Some(next) = words.get(run_end + 1) {
                let next_word = &text[next.start..next.end];
                if words[run_end].is_possessive()
                    || &text[words[run_end].full_end..next.start] != " "
                    || !is_capitalized(next_word)
                    || NON_NAMES.contains(&next_word)
                    || personal_pronoun(next_word).is_some()
                {
                    break;
                }
                run_end += 1;
            }
            let span_end = words[run_end].end;
            let mention = Mention {
                start,
                end: span_end,
                text: text[start..span_end].to_string(),
            };

            let single = run_end == i;
            let existing = by_text.get(&mention.text).copied().or_else(|| {
                if !single {
                    return None;
                }
                entities.iter().rposition(|entity| {
                    entity.main.text.rsplit(' ').next() == Some(mention.text.as_str())
                })
            });

            if existing.is_none()
                && single
                && at_sentence_start
                && !capitalized_inside.contains(stem)
                && (SENTENCE_OPENERS.contains(&stem)
                    || lowercase.contains(stem.to_lowercase().as_str()))
            {
                i += 1;
                continue;
            }

            let idx = match existing {
                Some(idx) => {
                    entities[idx].mentions.push(mention);
                    idx
                }
                None => {
                    by_text.insert(mention.text.clone(), entities.len());
                    entities.push(Entity {
                        main: mention.clone(),
                        mentions: vec![mention],
                    });
                    entities.len() - 1
                }
            };

            if !words[run_end].is_possessive() {
                sentence_subject.get_or_insert(idx);
            }
            i = run_end + 1;
        }

        let mut resolved = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end, replacement) in &replacements {
            resolved.push_str(&text[cursor..*start]);
            resolved.push_str(replacement);
            cursor = *end;
        }
        resolved.push_str(&text[cursor..]);

        let clusters = entities
            .into_iter()
            .filter(|entity| entity.mentions.len() > 1)
            .map(|entity| Cluster {
                main: entity.main,
                mentions: entity.mentions,
            })
            .collect();

        Ok(CorefOutput { resolved, clusters })
    }
}
