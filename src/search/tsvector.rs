//! Textual `tsvector` documents, as stored by the in-process engine.
//!
//! The format is PostgreSQL's output format: `'lexeme':1,4B 'other':2`.
//! Weight `D` is the default and is not printed.

use super::normalize::{tokenize, SearchLanguage, MAX_POSITION};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weight {
    A,
    B,
    C,
    D,
}

impl Weight {
    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    fn letter(&self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }

    fn bit(&self) -> u8 {
        match self {
            Self::A => 0b1000,
            Self::B => 0b0100,
            Self::C => 0b0010,
            Self::D => 0b0001,
        }
    }

    /// `ts_rank_cd` default weights.
    pub fn rank_factor(&self) -> f32 {
        match self {
            Self::A => 1.0,
            Self::B => 0.4,
            Self::C => 0.2,
            Self::D => 0.1,
        }
    }
}

/// The weights a query lexeme is restricted to (`:AB`). Empty means any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeightMask(u8);

impl WeightMask {
    pub const ANY: WeightMask = WeightMask(0);

    pub fn with(self, weight: Weight) -> Self {
        WeightMask(self.0 | weight.bit())
    }

    pub fn is_any(&self) -> bool {
        self.0 == 0
    }

    pub fn allows(&self, weight: Weight) -> bool {
        self.is_any() || self.0 & weight.bit() != 0
    }

    pub fn letters(&self) -> String {
        [Weight::A, Weight::B, Weight::C, Weight::D]
            .iter()
            .filter(|w| self.0 & w.bit() != 0)
            .map(Weight::letter)
            .collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed tsvector at byte {offset}: {reason}")]
pub struct TsVectorParseError {
    pub offset: usize,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsVector {
    lexemes: BTreeMap<String, Vec<(u16, Weight)>>,
}

impl TsVector {
    /// Equivalent of `to_tsvector(language, text)`.
    pub fn from_text(text: &str, language: SearchLanguage) -> Self {
        let mut vector = TsVector::default();
        for token in tokenize(text, language) {
            vector.push(token.lexeme, token.position, Weight::D);
        }
        vector
    }

    fn push(&mut self, lexeme: String, position: u16, weight: Weight) {
        let positions = self.lexemes.entry(lexeme).or_default();
        if position > 0 && !positions.iter().any(|(p, _)| *p == position) {
            positions.push((position, weight));
            positions.sort_unstable();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lexemes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lexemes.len()
    }

    /// Positions of `lexeme` (or of every lexeme it prefixes) whose weight
    /// passes `weights`, sorted and deduplicated.
    ///
    /// A lexeme stored without positions still matches; it reports no
    /// positions but `matches` returns true for it.
    pub fn positions(&self, lexeme: &str, prefix: bool, weights: WeightMask) -> Vec<u16> {
        let mut found: Vec<u16> = self
            .entries(lexeme, prefix)
            .flat_map(|(_, positions)| positions.iter())
            .filter(|(_, weight)| weights.allows(*weight))
            .map(|(position, _)| *position)
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    pub fn matches(&self, lexeme: &str, prefix: bool, weights: WeightMask) -> bool {
        self.entries(lexeme, prefix).any(|(_, positions)| {
            if positions.is_empty() {
                weights.allows(Weight::D)
            } else {
                positions.iter().any(|(_, weight)| weights.allows(*weight))
            }
        })
    }

    /// Sum of the weight factors of every matching occurrence.
    pub fn weighted_occurrences(&self, lexeme: &str, prefix: bool, weights: WeightMask) -> f32 {
        self.entries(lexeme, prefix)
            .flat_map(|(_, positions)| positions.iter())
            .filter(|(_, weight)| weights.allows(*weight))
            .map(|(_, weight)| weight.rank_factor())
            .sum()
    }

    fn entries<'a>(
        &'a self,
        lexeme: &'a str,
        prefix: bool,
    ) -> Box<dyn Iterator<Item = (&'a String, &'a Vec<(u16, Weight)>)> + 'a> {
        if prefix {
            Box::new(
                self.lexemes
                    .range(lexeme.to_string()..)
                    .take_while(move |(key, _)| key.starts_with(lexeme)),
            )
        } else {
            Box::new(self.lexemes.get_key_value(lexeme).into_iter())
        }
    }
}

impl fmt::Display for TsVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (lexeme, positions)) in self.lexemes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str("'")?;
            for c in lexeme.chars() {
                match c {
                    '\'' => f.write_str("''")?,
                    '\\' => f.write_str("\\\\")?,
                    other => write!(f, "{}", other)?,
                }
            }
            f.write_str("'")?;
            for (j, (position, weight)) in positions.iter().enumerate() {
                f.write_str(if j == 0 { ":" } else { "," })?;
                write!(f, "{}", position)?;
                if *weight != Weight::D {
                    write!(f, "{}", weight.letter())?;
                }
            }
        }
        Ok(())
    }
}

impl FromStr for TsVector {
    type Err = TsVectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut vector = TsVector::default();
        let mut chars = s.char_indices().peekable();
        let error = |offset, reason| TsVectorParseError { offset, reason };

        loop {
            while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
            let Some((start, first)) = chars.next() else {
                break;
            };

            let mut lexeme = String::new();
            if first == '\'' {
                loop {
                    match chars.next() {
                        Some((_, '\'')) => {
                            if chars.next_if(|(_, c)| *c == '\'').is_some() {
                                lexeme.push('\'');
                            } else {
                                break;
                            }
                        }
                        Some((_, '\\')) => match chars.next() {
                            Some((_, escaped)) => lexeme.push(escaped),
                            None => return Err(error(s.len(), "dangling escape")),
                        },
                        Some((_, c)) => lexeme.push(c),
                        None => return Err(error(start, "unterminated lexeme")),
                    }
                }
            } else {
                lexeme.push(first);
                while let Some((_, c)) = chars.next_if(|(_, c)| !c.is_whitespace() && *c != ':') {
                    lexeme.push(c);
                }
            }
            if lexeme.is_empty() {
                return Err(error(start, "empty lexeme"));
            }

            let mut positions = Vec::new();
            if chars.next_if(|(_, c)| *c == ':').is_some() {
                loop {
                    let mut digits = String::new();
                    let digits_at = chars.peek().map(|(i, _)| *i).unwrap_or(s.len());
                    while let Some((_, d)) = chars.next_if(|(_, c)| c.is_ascii_digit()) {
                        digits.push(d);
                    }
                    let position: u32 = digits
                        .parse()
                        .map_err(|_| error(digits_at, "expected a position"))?;
                    if position == 0 {
                        return Err(error(digits_at, "positions start at 1"));
                    }
                    let weight = chars
                        .next_if(|(_, c)| Weight::from_letter(*c).is_some())
                        .and_then(|(_, c)| Weight::from_letter(c))
                        .unwrap_or(Weight::D);
                    let position = position.min(u32::from(MAX_POSITION)) as u16;
                    positions.push((position, weight));
                    if chars.next_if(|(_, c)| *c == ',').is_none() {
                        break;
                    }
                }
            }

            vector.lexemes.entry(lexeme.clone()).or_default();
            for (position, weight) in positions {
                vector.push(lexeme.clone(), position, weight);
            }
        }
        Ok(vector)
    }
}
