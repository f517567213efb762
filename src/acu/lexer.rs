//! Token definitions for ACU text.
//!
//! Whitespace and `//` comments are skipped by the lexer itself, so every
//! later stage sees only significant tokens, each tagged with its source line.

use logos::Logos;

use crate::acu::ParseError;

/// A significant token of ACU text.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"([ \t\r\n\f]+|//[^\n]*)")]
pub enum Token {
    /// A block marker such as `@title`, without the `@`.
    #[regex(r"@[\p{L}_][\p{L}\p{N}_\-]*", |lex| lex.slice()[1..].to_string())]
    Marker(String),

    /// `{`
    #[token("{")]
    OpenBrace,

    /// `}`
    #[token("}")]
    CloseBrace,

    /// `,`
    #[token(",")]
    Comma,

    /// `=`, or its alternative spelling `:`.
    #[token("=")]
    #[token(":")]
    Equals,

    /// A quoted string with its escapes resolved.
    #[regex(r#""([^"\\]|\\.)*""#, unescape)]
    #[regex(r"'([^'\\]|\\.)*'", unescape)]
    Str(String),

    /// A numeric literal, kept as written.
    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string(), priority = 10)]
    Number(String),

    /// Any other bare token: identifiers, keywords and unquoted values.
    ///
    /// A `/` must be followed by another token character, so `//` always
    /// starts a comment.
    #[regex(r"[\p{L}\p{N}_][\p{L}\p{N}_\-.%]*(/[\p{L}\p{N}_\-.%]+)*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),
}

impl Token {
    /// The token as it would read in source, for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Marker(marker) => format!("@{marker}"),
            Self::OpenBrace => "{".to_string(),
            Self::CloseBrace => "}".to_string(),
            Self::Comma => ",".to_string(),
            Self::Equals => "=".to_string(),
            Self::Str(text) => format!("{text:?}"),
            Self::Number(raw) | Self::Ident(raw) => raw.clone(),
        }
    }
}

fn unescape(lex: &mut logos::Lexer<'_, Token>) -> Option<String> {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            _ => return None,
        }
    }
    Some(out)
}

/// A token with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Line the token starts on.
    pub line: usize,
}

/// Maps byte offsets to 1-based line numbers.
#[derive(Debug)]
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(offset, _)| offset + 1))
            .collect();
        Self { starts }
    }

    fn line(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

/// Splits source text into significant tokens.
///
/// # Errors
///
/// Returns [`ParseError::MalformedBlock`] at the first character sequence
/// that is not a token, including unterminated strings and unknown escapes.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let lines = LineIndex::new(source);
    Token::lexer(source)
        .spanned()
        .map(|(token, span)| {
            let line = lines.line(span.start);
            match token {
                Ok(token) => Ok(Spanned { token, line }),
                Err(()) => Err(ParseError::MalformedBlock {
                    line,
                    reason: format!("unexpected input '{}'", snippet(&source[span])),
                }),
            }
        })
        .collect()
}

fn snippet(text: &str) -> String {
    text.chars().take(20).collect()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn block_tokens() {
        assert_eq!(
            tokens("@title{1, name = \"EARTHWORKS\"}"),
            [
                Token::Marker("title".to_string()),
                Token::OpenBrace,
                Token::Number("1".to_string()),
                Token::Comma,
                Token::Ident("name".to_string()),
                Token::Equals,
                Token::Str("EARTHWORKS".to_string()),
                Token::CloseBrace,
            ]
        );
    }

    #[test_case("12", Token::Number("12".to_string()); "integer")]
    #[test_case("-0.5", Token::Number("-0.5".to_string()); "negative decimal")]
    #[test_case("1e3", Token::Number("1e3".to_string()); "exponent")]
    #[test_case("m3", Token::Ident("m3".to_string()); "unit")]
    #[test_case("12abc", Token::Ident("12abc".to_string()); "digits then letters")]
    #[test_case("hh/día", Token::Ident("hh/día".to_string()); "unicode with slash")]
    #[test_case("m3// note", Token::Ident("m3".to_string()); "trailing comment after bare token")]
    #[test_case("kg/m3//per volume", Token::Ident("kg/m3".to_string()); "comment after slashed unit")]
    #[test_case("'it\\'s'", Token::Str("it's".to_string()); "single quoted escape")]
    #[test_case(r#""a\\b\"c\n""#, Token::Str("a\\b\"c\n".to_string()); "double quoted escapes")]
    #[test_case(":", Token::Equals; "colon separator")]
    fn single_token(source: &str, expected: Token) {
        assert_eq!(tokens(source), [expected]);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let source = "// header comment\n\n@budget{ // trailing\n}\n";
        assert_eq!(
            tokens(source),
            [
                Token::Marker("budget".to_string()),
                Token::OpenBrace,
                Token::CloseBrace,
            ]
        );
    }

    #[test]
    fn comment_markers_inside_strings_are_kept() {
        assert_eq!(
            tokens("\"http://example.com\""),
            [Token::Str("http://example.com".to_string())]
        );
    }

    #[test]
    fn lines_are_one_based() {
        let spanned = tokenize("@budget{\n  P1,\n\n  name = \"x\"\n}").unwrap();
        let lines: Vec<usize> = spanned.iter().map(|token| token.line).collect();
        assert_eq!(lines, [1, 1, 2, 2, 4, 4, 4, 5]);
    }

    #[test_case("\"unterminated"; "unterminated string")]
    #[test_case("\"bad \\q escape\""; "unknown escape")]
    #[test_case("#"; "stray character")]
    fn invalid_input(source: &str) {
        assert!(matches!(
            tokenize(source),
            Err(ParseError::MalformedBlock { line: 1, .. })
        ));
    }
}
