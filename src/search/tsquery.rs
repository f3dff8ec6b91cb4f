//! Parser and evaluator for the `to_tsquery` query language.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or     := and ( '|' and )*
//! and    := phrase ( '&' phrase )*
//! phrase := unary ( ('<->' | '<N>') unary )*
//! unary  := '!' unary | '(' or ')' | lexeme [ ':' ( '*' | 'A'..'D' )+ ]
//! ```

use super::normalize::{tokenize, SearchLanguage, MAX_POSITION};
use super::tsvector::{TsVector, Weight, WeightMask};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("syntax error in tsquery at offset {offset}: {message}")]
pub struct TsQueryError {
    pub offset: usize,
    pub message: String,
}

impl TsQueryError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLexeme {
    pub text: String,
    pub prefix: bool,
    pub weights: WeightMask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsQuery {
    Lexeme(QueryLexeme),
    Not(Box<TsQuery>),
    And(Box<TsQuery>, Box<TsQuery>),
    Or(Box<TsQuery>, Box<TsQuery>),
    /// `left <N> right`: right occurs exactly N positions after left.
    Phrase(Box<TsQuery>, Box<TsQuery>, u16),
}

impl TsQuery {
    /// Parses raw query text. Lexemes are kept as written; see
    /// [`TsQuery::normalize`].
    pub fn parse(input: &str) -> Result<TsQuery, TsQueryError> {
        let tokens = lex(input)?;
        if tokens.is_empty() {
            return Err(TsQueryError::new(0, "empty query"));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            end: input.len(),
        };
        let query = parser.parse_or()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(query),
            Some(Spanned {
                token: Token::Close,
                offset,
            }) => Err(TsQueryError::new(*offset, "unbalanced parenthesis")),
            Some(Spanned { offset, .. }) => {
                Err(TsQueryError::new(*offset, "missing operator between operands"))
            }
        }
    }

    /// Runs every lexeme through the language's normalizer.
    ///
    /// Stop words drop out together with the operators that bind them. A
    /// quoted lexeme holding several words becomes a phrase. Returns `None`
    /// when nothing is left, in which case the query matches no document.
    pub fn normalize(self, language: SearchLanguage) -> Option<TsQuery> {
        match self {
            TsQuery::Lexeme(lexeme) => {
                let tokens = tokenize(&lexeme.text, language);
                let mut parts = tokens.into_iter();
                let first = parts.next()?;
                let mut previous = first.position;
                let mut query = TsQuery::Lexeme(QueryLexeme {
                    text: first.lexeme,
                    ..lexeme.clone()
                });
                for token in parts {
                    let distance = token.position - previous;
                    previous = token.position;
                    query = TsQuery::Phrase(
                        Box::new(query),
                        Box::new(TsQuery::Lexeme(QueryLexeme {
                            text: token.lexeme,
                            ..lexeme.clone()
                        })),
                        distance,
                    );
                }
                Some(query)
            }
            TsQuery::Not(inner) => inner.normalize(language).map(|q| TsQuery::Not(Box::new(q))),
            TsQuery::And(l, r) => {
                join(l.normalize(language), r.normalize(language), |l, r| TsQuery::And(l, r))
            }
            TsQuery::Or(l, r) => {
                join(l.normalize(language), r.normalize(language), |l, r| TsQuery::Or(l, r))
            }
            TsQuery::Phrase(l, r, distance) => join(
                l.normalize(language),
                r.normalize(language),
                |l, r| TsQuery::Phrase(l, r, distance),
            ),
        }
    }

    /// `query @@ document`.
    pub fn matches(&self, document: &TsVector) -> bool {
        self.eval(document).matched
    }

    /// Cover-density style rank of `document`, normalized as `rank / (rank + 1)`
    /// (`ts_rank_cd` normalization 32). Zero when the document does not match.
    pub fn rank(&self, document: &TsVector) -> f32 {
        if !self.matches(document) {
            return 0.0;
        }
        let mut lexemes = Vec::new();
        self.collect_positive(&mut lexemes);
        let raw: f32 = lexemes
            .iter()
            .map(|l| document.weighted_occurrences(&l.text, l.prefix, l.weights))
            .sum();
        raw / (raw + 1.0)
    }

    fn collect_positive<'a>(&'a self, out: &mut Vec<&'a QueryLexeme>) {
        match self {
            TsQuery::Lexeme(lexeme) => out.push(lexeme),
            TsQuery::Not(_) => {}
            TsQuery::And(l, r) | TsQuery::Or(l, r) | TsQuery::Phrase(l, r, _) => {
                l.collect_positive(out);
                r.collect_positive(out);
            }
        }
    }

    fn eval(&self, document: &TsVector) -> Evaluation {
        match self {
            TsQuery::Lexeme(l) => Evaluation {
                matched: document.matches(&l.text, l.prefix, l.weights),
                positions: Some(document.positions(&l.text, l.prefix, l.weights)),
            },
            TsQuery::Not(inner) => Evaluation {
                matched: !inner.eval(document).matched,
                positions: None,
            },
            TsQuery::And(l, r) => Evaluation {
                matched: l.eval(document).matched && r.eval(document).matched,
                positions: None,
            },
            TsQuery::Or(l, r) => {
                let (left, right) = (l.eval(document), r.eval(document));
                let positions = match (left.positions, right.positions) {
                    (Some(mut a), Some(b)) => {
                        a.extend(b);
                        a.sort_unstable();
                        a.dedup();
                        Some(a)
                    }
                    _ => None,
                };
                Evaluation {
                    matched: left.matched || right.matched,
                    positions,
                }
            }
            TsQuery::Phrase(l, r, distance) => {
                let (left, right) = (l.eval(document), r.eval(document));
                match (left.positions, right.positions) {
                    (Some(before), Some(after)) => {
                        let hits: Vec<u16> = after
                            .into_iter()
                            .filter(|p| *p >= *distance && before.binary_search(&(p - distance)).is_ok())
                            .collect();
                        Evaluation {
                            matched: !hits.is_empty(),
                            positions: Some(hits),
                        }
                    }
                    // negated operands carry no positions; fall back to AND
                    _ => Evaluation {
                        matched: left.matched && right.matched,
                        positions: None,
                    },
                }
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            TsQuery::Or(..) => 1,
            TsQuery::And(..) => 2,
            TsQuery::Phrase(..) => 3,
            TsQuery::Not(_) => 4,
            TsQuery::Lexeme(_) => 5,
        }
    }
}

struct Evaluation {
    matched: bool,
    positions: Option<Vec<u16>>,
}

fn join(
    left: Option<TsQuery>,
    right: Option<TsQuery>,
    combine: impl FnOnce(Box<TsQuery>, Box<TsQuery>) -> TsQuery,
) -> Option<TsQuery> {
    match (left, right) {
        (Some(l), Some(r)) => Some(combine(Box::new(l), Box::new(r))),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

impl fmt::Display for QueryLexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("'")?;
        for c in self.text.chars() {
            match c {
                '\'' => f.write_str("''")?,
                '\\' => f.write_str("\\\\")?,
                other => write!(f, "{}", other)?,
            }
        }
        f.write_str("'")?;
        if self.prefix || !self.weights.is_any() {
            f.write_str(":")?;
            if self.prefix {
                f.write_str("*")?;
            }
            f.write_str(&self.weights.letters())?;
        }
        Ok(())
    }
}

impl TsQuery {
    fn write_operand(&self, f: &mut fmt::Formatter<'_>, operand: &TsQuery, parens: bool) -> fmt::Result {
        if parens {
            write!(f, "( {} )", operand)
        } else {
            write!(f, "{}", operand)
        }
    }

    fn write_binary(
        &self,
        f: &mut fmt::Formatter<'_>,
        left: &TsQuery,
        op: &str,
        right: &TsQuery,
    ) -> fmt::Result {
        let prec = self.precedence();
        // the parser nests to the left, so a right operand of equal
        // precedence keeps its parentheses
        self.write_operand(f, left, left.precedence() < prec)?;
        f.write_str(op)?;
        self.write_operand(f, right, right.precedence() <= prec)
    }
}

impl fmt::Display for TsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsQuery::Lexeme(l) => write!(f, "{}", l),
            TsQuery::Not(inner) => {
                f.write_str("!")?;
                self.write_operand(f, inner, inner.precedence() < self.precedence())
            }
            TsQuery::And(l, r) => self.write_binary(f, l, " & ", r),
            TsQuery::Or(l, r) => self.write_binary(f, l, " | ", r),
            TsQuery::Phrase(l, r, 1) => self.write_binary(f, l, " <-> ", r),
            TsQuery::Phrase(l, r, n) => self.write_binary(f, l, &format!(" <{}> ", n), r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Operand(QueryLexeme),
    And,
    Or,
    Not,
    FollowedBy(u16),
    Open,
    Close,
}

#[derive(Debug)]
struct Spanned {
    token: Token,
    offset: usize,
}

fn is_bare_lexeme_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '&' | '|' | '!' | '(' | ')' | '<' | ':' | '\'')
}

fn lex(input: &str) -> Result<Vec<Spanned>, TsQueryError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '&' => Token::And,
            '|' => Token::Or,
            '!' => Token::Not,
            '(' => Token::Open,
            ')' => Token::Close,
            '<' => {
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some((_, '>')) => break,
                        Some((_, c)) => inner.push(c),
                        None => return Err(TsQueryError::new(offset, "unterminated phrase operator")),
                    }
                }
                let distance = if inner == "-" {
                    1
                } else {
                    inner
                        .parse::<u16>()
                        .ok()
                        .filter(|n| *n <= MAX_POSITION + 1)
                        .ok_or_else(|| {
                            TsQueryError::new(offset, format!("invalid phrase distance <{}>", inner))
                        })?
                };
                Token::FollowedBy(distance)
            }
            '\'' => {
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\'')) => {
                            if chars.next_if(|(_, c)| *c == '\'').is_some() {
                                text.push('\'');
                            } else {
                                break;
                            }
                        }
                        Some((_, '\\')) => match chars.next() {
                            Some((_, escaped)) => text.push(escaped),
                            None => return Err(TsQueryError::new(offset, "dangling escape")),
                        },
                        Some((_, c)) => text.push(c),
                        None => return Err(TsQueryError::new(offset, "unterminated quoted lexeme")),
                    }
                }
                if text.is_empty() {
                    return Err(TsQueryError::new(offset, "empty lexeme"));
                }
                operand(text, &mut chars)?
            }
            ':' => return Err(TsQueryError::new(offset, "modifier without lexeme")),
            c => {
                let mut text = String::from(c);
                while let Some((_, c)) = chars.next_if(|(_, c)| is_bare_lexeme_char(*c)) {
                    text.push(c);
                }
                operand(text, &mut chars)?
            }
        };
        tokens.push(Spanned { token, offset });
    }
    Ok(tokens)
}

fn operand(
    text: String,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<Token, TsQueryError> {
    let mut lexeme = QueryLexeme {
        text,
        prefix: false,
        weights: WeightMask::ANY,
    };
    if let Some((colon, _)) = chars.next_if(|(_, c)| *c == ':') {
        let mut seen = false;
        while let Some((_, c)) = chars.next_if(|(_, c)| *c == '*' || "abcdABCD".contains(*c)) {
            seen = true;
            lexeme.weights = match c.to_ascii_uppercase() {
                '*' => {
                    lexeme.prefix = true;
                    lexeme.weights
                }
                'A' => lexeme.weights.with(Weight::A),
                'B' => lexeme.weights.with(Weight::B),
                'C' => lexeme.weights.with(Weight::C),
                _ => lexeme.weights.with(Weight::D),
            };
        }
        if !seen {
            return Err(TsQueryError::new(colon, "expected '*' or a weight after ':'"));
        }
    }
    Ok(Token::Operand(lexeme))
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn next(&mut self) -> Option<&Spanned> {
        let spanned = self.tokens.get(self.pos);
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn parse_or(&mut self) -> Result<TsQuery, TsQueryError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = TsQuery::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<TsQuery, TsQueryError> {
        let mut left = self.parse_phrase()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_phrase()?;
            left = TsQuery::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_phrase(&mut self) -> Result<TsQuery, TsQueryError> {
        let mut left = self.parse_unary()?;
        while let Some(Token::FollowedBy(distance)) = self.peek() {
            let distance = *distance;
            self.pos += 1;
            let right = self.parse_unary()?;
            left = TsQuery::Phrase(Box::new(left), Box::new(right), distance);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<TsQuery, TsQueryError> {
        let end = self.end;
        let Some(Spanned { token, offset }) = self.next() else {
            return Err(TsQueryError::new(end, "unexpected end of query"));
        };
        let offset = *offset;
        match token.clone() {
            Token::Operand(lexeme) => Ok(TsQuery::Lexeme(lexeme)),
            Token::Not => Ok(TsQuery::Not(Box::new(self.parse_unary()?))),
            Token::Open => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Spanned {
                        token: Token::Close,
                        ..
                    }) => Ok(inner),
                    Some(Spanned { offset, .. }) => {
                        Err(TsQueryError::new(*offset, "missing operator between operands"))
                    }
                    None => Err(TsQueryError::new(offset, "unbalanced parenthesis")),
                }
            }
            Token::Close => Err(TsQueryError::new(offset, "unexpected ')'")),
            Token::And | Token::Or | Token::FollowedBy(_) => {
                Err(TsQueryError::new(offset, "operator without left operand"))
            }
        }
    }
}
