//! Tokenizer for the surface syntax.

use crate::ParseError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(u64),
    Lambda,
    Forall,
    Sigma,
    Arrow,
    FatArrow,
    Dot,
    Colon,
    Comma,
    LParen,
    RParen,
    Pipe,
    Plus,
    Type,
    Case,
    Of,
    Inl,
    Inr,
    Fst,
    Snd,
    Refl,
    Path,
    Transport,
    True,
    False,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "{s}"),
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Lambda => write!(f, "λ"),
            TokenKind::Forall => write!(f, "∀"),
            TokenKind::Sigma => write!(f, "Σ"),
            TokenKind::Arrow => write!(f, "→"),
            TokenKind::FatArrow => write!(f, "=>"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Type => write!(f, "Type"),
            TokenKind::Case => write!(f, "case"),
            TokenKind::Of => write!(f, "of"),
            TokenKind::Inl => write!(f, "inl"),
            TokenKind::Inr => write!(f, "inr"),
            TokenKind::Fst => write!(f, "fst"),
            TokenKind::Snd => write!(f, "snd"),
            TokenKind::Refl => write!(f, "refl"),
            TokenKind::Path => write!(f, "Path"),
            TokenKind::Transport => write!(f, "transport"),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset into the input.
    pub offset: usize,
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '?'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '\''
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(&(offset, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
                continue;
            }
            let kind = match ch {
                'λ' | '\\' => self.single(TokenKind::Lambda),
                '∀' | 'Π' => self.single(TokenKind::Forall),
                'Σ' => self.single(TokenKind::Sigma),
                '→' => self.single(TokenKind::Arrow),
                '.' => self.single(TokenKind::Dot),
                ':' => self.single(TokenKind::Colon),
                ',' => self.single(TokenKind::Comma),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '|' => self.single(TokenKind::Pipe),
                '+' => self.single(TokenKind::Plus),
                '-' => {
                    self.chars.next();
                    match self.chars.peek() {
                        Some(&(_, '>')) => {
                            self.chars.next();
                            TokenKind::Arrow
                        }
                        _ => {
                            return Err(ParseError::UnrecognizedChar { ch: '-', offset });
                        }
                    }
                }
                '=' => {
                    self.chars.next();
                    match self.chars.peek() {
                        Some(&(_, '>')) => {
                            self.chars.next();
                            TokenKind::FatArrow
                        }
                        _ => {
                            return Err(ParseError::UnrecognizedChar { ch: '=', offset });
                        }
                    }
                }
                _ if ch.is_ascii_digit() => self.number(offset)?,
                _ if is_ident_start(ch) => self.ident(offset),
                _ => return Err(ParseError::UnrecognizedChar { ch, offset }),
            };
            tokens.push(Token { kind, offset });
        }
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.chars.next();
        kind
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        let mut end = start;
        while let Some(&(i, ch)) = self.chars.peek() {
            if ch.is_ascii_digit() {
                end = i + ch.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        self.input[start..end]
            .parse::<u64>()
            .map(TokenKind::Number)
            .map_err(|_| ParseError::NumberOutOfRange { offset: start })
    }

    fn ident(&mut self, start: usize) -> TokenKind {
        let mut end = start;
        while let Some(&(i, ch)) = self.chars.peek() {
            let take = if end == start {
                is_ident_start(ch)
            } else if ch == '.' {
                // A dot continues the identifier only when another segment
                // follows (`Nat.zero`); otherwise it is the binder dot.
                self.input[i + ch.len_utf8()..]
                    .chars()
                    .next()
                    .is_some_and(is_ident_start)
            } else {
                is_ident_continue(ch)
            };
            if !take {
                break;
            }
            end = i + ch.len_utf8();
            self.chars.next();
        }
        match &self.input[start..end] {
            "forall" => TokenKind::Forall,
            "Sigma" => TokenKind::Sigma,
            "Type" => TokenKind::Type,
            "case" => TokenKind::Case,
            "of" => TokenKind::Of,
            "inl" => TokenKind::Inl,
            "inr" => TokenKind::Inr,
            "fst" => TokenKind::Fst,
            "snd" => TokenKind::Snd,
            "refl" => TokenKind::Refl,
            "Path" => TokenKind::Path,
            "transport" => TokenKind::Transport,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            text => TokenKind::Ident(text.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_dotted_names_vs_binder_dot() {
        assert_eq!(
            kinds("λ(x : Nat). Nat.zero"),
            vec![
                TokenKind::Lambda,
                TokenKind::LParen,
                TokenKind::Ident("x".into()),
                TokenKind::Colon,
                TokenKind::Ident("Nat".into()),
                TokenKind::RParen,
                TokenKind::Dot,
                TokenKind::Ident("Nat.zero".into()),
            ]
        );
    }

    #[test]
    fn test_meta_tokens() {
        assert_eq!(kinds("?g12"), vec![TokenKind::Ident("?g12".into())]);
    }

    #[test]
    fn test_arrows() {
        assert_eq!(kinds("->"), kinds("→"));
        assert_eq!(kinds("a => b").len(), 3);
    }

    #[test]
    fn test_unrecognized_char() {
        let err = Lexer::new("a # b").tokenize().unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedChar { ch: '#', .. }));
    }
}
