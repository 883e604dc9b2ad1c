use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Literals
    String(String),
    /// Raw digits and dots, e.g. `1.2.3` is kept whole and parsed later.
    Number(String),
    Boolean(bool),
    Null,
    Undefined,

    // Reserved words with their own kind
    Random,
    Bussin,

    Name(String),
    Symbol(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
}

impl Token {
    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    pub fn is_symbol(&self, symbol: char) -> bool {
        self.token_type == TokenType::Symbol(symbol)
    }

    pub fn is_name(&self, name: &str) -> bool {
        matches!(&self.token_type, TokenType::Name(n) if n == name)
    }
}

impl TokenType {
    pub fn kind(&self) -> &'static str {
        match self {
            TokenType::String(_) => "string",
            TokenType::Number(_) => "number",
            TokenType::Boolean(_) => "boolean",
            TokenType::Null => "null",
            TokenType::Undefined => "undefined",
            TokenType::Random => "random",
            TokenType::Bussin => "bussin",
            TokenType::Name(_) => "name",
            TokenType::Symbol(_) => "symbol",
        }
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::String(s) => write!(f, "\"{}\"", s),
            TokenType::Number(n) => write!(f, "{}", n),
            TokenType::Boolean(true) => write!(f, "yup"),
            TokenType::Boolean(false) => write!(f, "nah"),
            TokenType::Null => write!(f, "null"),
            TokenType::Undefined => write!(f, "undefined"),
            TokenType::Random => write!(f, "random"),
            TokenType::Bussin => write!(f, "bussin"),
            TokenType::Name(name) => write!(f, "{}", name),
            TokenType::Symbol(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("[SyntaxError] Unknown character '{character}' at line {line}")]
    UnexpectedCharacter { character: char, line: usize },
}

const SYMBOLS: &str = "(){},><.+-*/!:=[]";

pub fn tokens(source: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut remaining = source;
    let mut line = 1;

    loop {
        while let Some((_, rest)) = maximal(&[whitespace, comment], remaining) {
            line += newlines(&remaining[..remaining.len() - rest.len()]);
            remaining = rest;
        }

        let Some(first) = remaining.chars().next() else {
            break;
        };

        let (token_type, rest) = maximal(&[string, number, name, symbol], remaining).ok_or(
            TokenizeError::UnexpectedCharacter {
                character: first,
                line,
            },
        )?;
        tokens.push(Token { token_type, line });
        line += newlines(&remaining[..remaining.len() - rest.len()]);
        remaining = rest;
    }

    Ok(tokens)
}

fn newlines(consumed: &str) -> usize {
    consumed.chars().filter(|c| *c == '\n').count()
}

fn maximal<'a, T: std::fmt::Debug>(
    parsers: &[fn(&str) -> Option<(T, &str)>],
    source: &'a str,
) -> Option<(T, &'a str)> {
    let mut min_left = source.len() + 1;
    let mut max_match = None;

    let matching_parsers = parsers.iter().filter_map(|parser| parser(source));
    for (m, rest) in matching_parsers {
        let left = rest.len();
        if left < min_left {
            min_left = left;
            max_match = Some((m, rest));
        }
    }

    max_match
}

fn whitespace(source: &str) -> Option<((), &str)> {
    let len = source
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum();
    if len > 0 {
        Some(((), &source[len..]))
    } else {
        None
    }
}

fn comment(source: &str) -> Option<((), &str)> {
    if source.starts_with("//") {
        let len = source
            .chars()
            .take_while(|c| *c != '\n')
            .map(char::len_utf8)
            .sum();
        Some(((), &source[len..]))
    } else {
        None
    }
}

/// Either quote opens a string; no escapes, and an unterminated string runs to the end.
fn string(source: &str) -> Option<(TokenType, &str)> {
    let quote = source.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &source[1..];
    match body.find(quote) {
        Some(end) => Some((TokenType::String(body[..end].to_string()), &body[end + 1..])),
        None => Some((TokenType::String(body.to_string()), "")),
    }
}

fn number(source: &str) -> Option<(TokenType, &str)> {
    if !source.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let len = source
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .count();

    Some((TokenType::Number(source[..len].to_string()), &source[len..]))
}

fn name(source: &str) -> Option<(TokenType, &str)> {
    let mut chars = source.chars();

    let first = chars.next()?;
    if !first.is_ascii_alphabetic() && first != '_' {
        return None;
    }

    let len = 1 + chars
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '!' | ':'))
        .count();

    let token_type = match &source[..len] {
        "yup" => TokenType::Boolean(true),
        "nah" => TokenType::Boolean(false),
        "null" => TokenType::Null,
        "undefined" => TokenType::Undefined,
        "random" => TokenType::Random,
        "bussin" => TokenType::Bussin,
        word => TokenType::Name(word.to_string()),
    };

    Some((token_type, &source[len..]))
}

fn symbol(source: &str) -> Option<(TokenType, &str)> {
    let c = source.chars().next().filter(|c| SYMBOLS.contains(*c))?;
    Some((TokenType::Symbol(c), &source[1..]))
}

#[cfg(test)]
mod test {
    use super::*;

    fn types(source: &str) -> Vec<TokenType> {
        tokens(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_tokens() {
        let source = "this 'x' is 1";
        let expected = vec![
            TokenType::Name("this".to_string()),
            TokenType::String("x".to_string()),
            TokenType::Name("is".to_string()),
            TokenType::Number("1".to_string()),
        ];
        assert_eq!(types(source), expected);
    }

    #[test]
    fn test_tokens_with_comments() {
        let source = "debug! \"hi\" // comment\ndebug! 2";
        let expected = vec![
            TokenType::Name("debug!".to_string()),
            TokenType::String("hi".to_string()),
            TokenType::Name("debug!".to_string()),
            TokenType::Number("2".to_string()),
        ];
        assert_eq!(types(source), expected);
    }

    #[test]
    fn test_lines_are_counted() {
        let tokens = tokens("a\n\n// skip\nb \"x\ny\" c").unwrap();
        let lines: Vec<_> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 4, 4, 5]);
    }

    #[test]
    fn test_tokens_with_keywords() {
        let source = "yup nah null undefined random bussin loop!";
        let expected = vec![
            TokenType::Boolean(true),
            TokenType::Boolean(false),
            TokenType::Null,
            TokenType::Undefined,
            TokenType::Random,
            TokenType::Bussin,
            TokenType::Name("loop!".to_string()),
        ];
        assert_eq!(types(source), expected);
    }

    #[test]
    fn test_names_absorb_colons() {
        let source = "x:str 5:num";
        let expected = vec![
            TokenType::Name("x:str".to_string()),
            TokenType::Number("5".to_string()),
            TokenType::Symbol(':'),
            TokenType::Name("num".to_string()),
        ];
        assert_eq!(types(source), expected);
    }

    #[test]
    fn test_number_keeps_every_dot() {
        assert_eq!(types("1.2.3"), vec![TokenType::Number("1.2.3".to_string())]);
    }

    #[test]
    fn test_single_quotes_and_unterminated_string() {
        let expected = vec![
            TokenType::String("it\"s".to_string()),
            TokenType::String("open to the end".to_string()),
        ];
        assert_eq!(types("'it\"s' \"open to the end"), expected);
    }

    #[test]
    fn test_symbols() {
        let expected: Vec<_> = "(){}[],><.+-*/!:=".chars().map(TokenType::Symbol).collect();
        assert_eq!(types("(){}[],><.+-*/!:="), expected);
    }

    #[test]
    fn test_unknown_character() {
        let err = tokens("this 'a' is 1\n  @").unwrap_err();
        assert!(matches!(
            err,
            TokenizeError::UnexpectedCharacter {
                character: '@',
                line: 2
            }
        ));
        assert_eq!(err.to_string(), "[SyntaxError] Unknown character '@' at line 2");
    }
}
