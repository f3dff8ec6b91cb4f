//! Word splitting and lexeme normalization shared by the in-process engine
//! and the query parser.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// PostgreSQL caps lexeme positions at 16383.
pub const MAX_POSITION: u16 = 16_383;

/// Text-search configuration. The names match PostgreSQL `regconfig` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchLanguage {
    #[default]
    Spanish,
    English,
    Simple,
}

impl SearchLanguage {
    pub const ALL: [SearchLanguage; 3] = [Self::Spanish, Self::English, Self::Simple];

    pub fn regconfig(&self) -> &'static str {
        match self {
            Self::Spanish => "spanish",
            Self::English => "english",
            Self::Simple => "simple",
        }
    }

    /// Normalizes a single word into a lexeme. Stop words yield `None`.
    pub fn lexeme(&self, word: &str) -> Option<String> {
        let lowered = word.to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        match self {
            Self::Simple => Some(lowered),
            Self::Spanish => {
                let folded = fold_accents(&lowered);
                if SPANISH_STOP_WORDS.contains(&folded.as_str()) {
                    return None;
                }
                Some(stem_spanish(folded))
            }
            Self::English => {
                if ENGLISH_STOP_WORDS.contains(&lowered.as_str()) {
                    return None;
                }
                Some(stem_english(lowered))
            }
        }
    }
}

impl fmt::Display for SearchLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.regconfig())
    }
}

impl FromStr for SearchLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spanish" | "es" => Ok(Self::Spanish),
            "english" | "en" => Ok(Self::English),
            "simple" => Ok(Self::Simple),
            other => Err(format!("unsupported text-search language: {}", other)),
        }
    }
}

/// A normalized word and its 1-based position in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub lexeme: String,
    pub position: u16,
}

/// Splits `text` into words and normalizes them.
///
/// Stop words are dropped but still advance the position counter, so phrase
/// distances stay the same as in the source text.
pub fn tokenize(text: &str, language: SearchLanguage) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut position: u16 = 0;
    for word in words(text) {
        position = position.saturating_add(1).min(MAX_POSITION);
        if let Some(lexeme) = language.lexeme(word) {
            tokens.push(Token { lexeme, position });
        }
    }
    tokens
}

/// Words are maximal runs of alphanumeric characters.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

pub(crate) fn fold_accents(word: &str) -> String {
    word.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn has_digit(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit())
}

// Plural `s` first, then the gender vowel: medicos -> medico -> medic.
fn stem_spanish(mut word: String) -> String {
    if has_digit(&word) {
        return word;
    }
    if word.chars().count() > 3 && word.ends_with('s') {
        word.pop();
    }
    if word.chars().count() > 4 && word.ends_with(['a', 'e', 'o']) {
        word.pop();
    }
    word
}

fn stem_english(mut word: String) -> String {
    if has_digit(&word) {
        return word;
    }
    if word.chars().count() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word.pop();
    }
    word
}

// Accent-folded.
const SPANISH_STOP_WORDS: &[&str] = &[
    "a", "al", "algo", "algunas", "algunos", "ante", "antes", "como", "con", "contra", "cual",
    "cuando", "de", "del", "desde", "donde", "durante", "e", "el", "ella", "ellas", "ellos", "en",
    "entre", "era", "es", "esa", "esas", "ese", "eso", "esos", "esta", "estas", "este", "esto",
    "estos", "fue", "ha", "han", "hasta", "hay", "la", "las", "le", "les", "lo", "los", "mas",
    "me", "mi", "mis", "mucho", "muchos", "muy", "nada", "ni", "no", "nos", "nosotros", "o", "os",
    "otra", "otras", "otro", "otros", "para", "pero", "poco", "por", "porque", "que", "quien",
    "quienes", "se", "ser", "si", "sin", "sobre", "son", "su", "sus", "tambien", "te", "ti",
    "todo", "todos", "tu", "tus", "un", "una", "unas", "uno", "unos", "y", "ya", "yo",
];

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "he",
    "her", "his", "i", "in", "into", "is", "it", "its", "no", "not", "of", "on", "or", "our",
    "she", "so", "such", "that", "the", "their", "then", "there", "these", "they", "this", "to",
    "was", "we", "were", "will", "with", "you",
];
