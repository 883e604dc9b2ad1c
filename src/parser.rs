use std::cell::RefCell;

use crate::{
    ast::{Conditional, CutMode, InfixOperator, Literal, Node, Program, Status},
    number,
    tokenizer::{Token, TokenType},
};

/// Bare words that end a phrase or a parameter list. A command such as
/// `debug!` matches by its name without the `!`.
pub const STOP_WORDS: &[&str] = &[
    "set", "fr", "this", "if", "elseif", "loop", "cut", "banish", "bussin", "debug", "openfile",
    "vx",
];

/// Symbols that never become nodes on their own.
const DELIMITERS: &str = "{}[](),";

#[derive(Debug)]
pub struct ParseErrorWithContext {
    pub error: ParseError,
    context: Vec<&'static str>,
    pub line: Option<usize>,
}

impl std::error::Error for ParseErrorWithContext {}

impl std::fmt::Display for ParseErrorWithContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }
        write!(f, "\nWhile parsing {}", self.context.join(" > "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("syntax error: variable must be a quoted string")]
    VariableNotQuoted,
    #[error("Target for banish! must be a quoted string")]
    BanishTargetNotQuoted,
    #[error("syntax error: loop! needs a {{ body }}")]
    MissingLoopBody,
}

#[derive(Debug, Clone)]
struct ParseContext {
    stack: RefCell<Vec<&'static str>>,
}

impl ParseContext {
    fn new() -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
        }
    }

    fn push(&self, name: &'static str) -> ParseContextGuard {
        self.stack.borrow_mut().push(name);
        ParseContextGuard::new(self)
    }

    fn pop(&self) {
        self.stack.borrow_mut().pop();
    }

    fn error(&self, error: ParseError, tokens: &[Token]) -> ParseErrorWithContext {
        ParseErrorWithContext {
            error,
            context: self.stack.borrow().clone(),
            line: tokens.first().map(|token| token.line),
        }
    }
}

struct ParseContextGuard<'a> {
    context: &'a ParseContext,
}

impl<'a> ParseContextGuard<'a> {
    fn new(context: &'a ParseContext) -> Self {
        Self { context }
    }
}

impl<'a> Drop for ParseContextGuard<'a> {
    fn drop(&mut self) {
        self.context.pop();
    }
}

type Parsed<'a> = Result<(Option<Node>, &'a [Token]), ParseErrorWithContext>;

pub fn program(tokens: &[Token]) -> Result<Program, ParseErrorWithContext> {
    let context = ParseContext::new();
    let _guard = context.push("program");
    let mut nodes = Vec::new();
    let mut tokens = tokens;

    while !tokens.is_empty() {
        let (node, rest) = walk(&context, tokens, false)?;
        nodes.extend(node);
        tokens = advance(tokens, rest);
    }

    Ok(Program(nodes))
}

/// Skips one token when a rule made no progress, so every loop terminates.
fn advance<'a>(before: &'a [Token], after: &'a [Token]) -> &'a [Token] {
    if after.len() == before.len() && !before.is_empty() {
        &before[1..]
    } else {
        after
    }
}

fn walk<'a>(context: &ParseContext, tokens: &'a [Token], in_phrase: bool) -> Parsed<'a> {
    let Some(token) = tokens.first() else {
        return Ok((None, tokens));
    };

    if let Some((cast, rest)) = cast_shorthand(tokens) {
        return Ok((Some(cast), rest));
    }

    let rest = &tokens[1..];
    match token.token_type() {
        TokenType::Number(n) => Ok((Some(number_literal(n)), rest)),
        TokenType::String(s) => Ok((Some(Node::string(s.clone())), rest)),
        TokenType::Boolean(b) => Ok((Some(Node::Literal(Literal::Boolean(*b))), rest)),
        TokenType::Null => Ok((Some(Node::Literal(Literal::Null)), rest)),
        TokenType::Undefined => Ok((Some(Node::Literal(Literal::Undefined)), rest)),
        TokenType::Bussin => Ok((Some(Node::Bussin), rest)),
        TokenType::Random => random(context, rest),
        TokenType::Symbol('(') => group(context, rest),
        TokenType::Symbol(c) if DELIMITERS.contains(*c) => Ok((None, tokens)),
        TokenType::Symbol(c) => Ok((Some(Node::string(c.to_string())), rest)),
        TokenType::Name(name) => word(context, name, rest, in_phrase),
    }
}

fn number_literal(text: &str) -> Node {
    Node::Literal(Literal::Number(number::parse_float(text)))
}

fn undefined() -> Node {
    Node::Literal(Literal::Undefined)
}

/// `5 : num`, `"name" : var`, `yup : str`, `x : bool`.
fn cast_shorthand(tokens: &[Token]) -> Option<(Node, &[Token])> {
    let [token, colon, status, ..] = tokens else {
        return None;
    };
    if !colon.is_symbol(':') {
        return None;
    }
    let TokenType::Name(status) = status.token_type() else {
        return None;
    };

    let value = match token.token_type() {
        TokenType::Number(n) => number_literal(n),
        TokenType::String(s) => Node::string(s.clone()),
        TokenType::Boolean(b) => Node::Literal(Literal::Boolean(*b)),
        TokenType::Name(name) => Node::Identifier(name.clone()),
        _ => return None,
    };

    Some((
        Node::Cast {
            value: Box::new(value),
            status: Status::from(status.as_str()),
        },
        &tokens[3..],
    ))
}

fn group<'a>(context: &ParseContext, tokens: &'a [Token]) -> Parsed<'a> {
    let _guard = context.push("group");
    let (left, tokens) = walk(context, tokens, false)?;

    let (node, tokens) = match tokens.first() {
        Some(token) if is_equality(token) => {
            let (right, rest) = walk(context, &tokens[1..], false)?;
            let node = Node::Comparison(
                Box::new(left.unwrap_or_else(undefined)),
                Box::new(right.unwrap_or_else(undefined)),
            );
            (Some(node), rest)
        }
        Some(Token {
            token_type: TokenType::Symbol(symbol),
            ..
        }) if InfixOperator::from_symbol(*symbol).is_some() => {
            let (right, rest) = walk(context, &tokens[1..], false)?;
            let node = InfixOperator::from_symbol(*symbol).map(|op| {
                Node::Binary(
                    Box::new(left.unwrap_or_else(undefined)),
                    op,
                    Box::new(right.unwrap_or_else(undefined)),
                )
            });
            (node, rest)
        }
        _ => (left, tokens),
    };

    // A missing `)` is tolerated.
    Ok((node, skip_symbol(tokens, ')')))
}

fn random<'a>(context: &ParseContext, tokens: &'a [Token]) -> Parsed<'a> {
    let _guard = context.push("random");
    let (min, tokens) = walk(context, tokens, false)?;
    let (max, tokens) = walk(context, tokens, false)?;
    Ok((
        Some(Node::Random {
            min: Box::new(min.unwrap_or_else(undefined)),
            max: Box::new(max.unwrap_or_else(undefined)),
        }),
        tokens,
    ))
}

fn word<'a>(context: &ParseContext, name: &str, rest: &'a [Token], in_phrase: bool) -> Parsed<'a> {
    match name {
        "vx" if !in_phrase => Ok((Some(Node::Help), rest)),
        "openfile" if !in_phrase => Ok((Some(Node::OpenFile), rest)),
        "if" => conditional(context, rest, Node::If),
        "elseif" => conditional(context, rest, Node::ElseIf),
        "fr" => declaration(context, rest, true),
        "this" => declaration(context, rest, false),
        "set" => assignment(context, rest),
        _ => {
            if let Some(command_name) = name.strip_suffix('!') {
                return command(context, rest, command_name);
            }
            if let Some((identifier, status)) = name.split_once(':') {
                let status = status.split(':').next().unwrap_or_default();
                return Ok((
                    Some(Node::Cast {
                        value: Box::new(Node::Identifier(identifier.to_string())),
                        status: Status::from(status),
                    }),
                    rest,
                ));
            }
            Ok((Some(Node::Identifier(name.to_string())), rest))
        }
    }
}

fn conditional<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
    kind: fn(Conditional) -> Node,
) -> Parsed<'a> {
    let _guard = context.push("if");
    let (condition, mut tokens) = walk(context, tokens, false)?;
    let mut condition = condition.unwrap_or_else(undefined);

    if tokens.first().is_some_and(is_equality) {
        let (right, rest) = walk(context, &tokens[1..], false)?;
        condition = Node::Comparison(Box::new(condition), Box::new(right.unwrap_or_else(undefined)));
        tokens = rest;
    }

    let (body, tokens) = block(context, skip_symbol(tokens, '{'))?;

    let (alternate, tokens) = match tokens {
        [next, ..] if next.is_name("elseif") => {
            let (alternate, rest) = walk(context, tokens, false)?;
            (alternate.map(Box::new), rest)
        }
        [next, open, ..] if next.is_name("else") && open.is_symbol('{') => {
            let (body, rest) = block(context, &tokens[2..])?;
            let otherwise = Node::ElseIf(Conditional {
                condition: Box::new(Node::Literal(Literal::Boolean(true))),
                body,
                alternate: None,
            });
            (Some(Box::new(otherwise)), rest)
        }
        _ => (None, tokens),
    };

    Ok((
        Some(kind(Conditional {
            condition: Box::new(condition),
            body,
            alternate,
        })),
        tokens,
    ))
}

/// Statements up to the matching `}`, which is consumed when present.
fn block<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
) -> Result<(Vec<Node>, &'a [Token]), ParseErrorWithContext> {
    let _guard = context.push("block");
    let mut body = Vec::new();
    let mut tokens = tokens;

    while let Some(token) = tokens.first() {
        if token.is_symbol('}') {
            return Ok((body, &tokens[1..]));
        }
        let (node, rest) = walk(context, tokens, false)?;
        body.extend(node);
        tokens = advance(tokens, rest);
    }

    Ok((body, tokens))
}

fn declaration<'a>(context: &ParseContext, tokens: &'a [Token], is_constant: bool) -> Parsed<'a> {
    let _guard = context.push("declaration");
    let tokens = match tokens {
        [next, rest @ ..] if is_constant && next.is_name("this") => rest,
        _ => tokens,
    };
    let (name, tokens) = quoted_name(context, tokens, ParseError::VariableNotQuoted)?;
    let (value, tokens) = phrase(context, skip_equality(tokens))?;
    Ok((
        Some(Node::VariableDeclaration {
            name,
            value: Box::new(value.unwrap_or_else(|| Node::string(""))),
            is_constant,
        }),
        tokens,
    ))
}

fn assignment<'a>(context: &ParseContext, tokens: &'a [Token]) -> Parsed<'a> {
    let _guard = context.push("assignment");
    let (name, tokens) = quoted_name(context, tokens, ParseError::VariableNotQuoted)?;
    let (value, tokens) = phrase(context, skip_equality(tokens))?;
    Ok((
        Some(Node::Assignment {
            name,
            value: Box::new(value.unwrap_or_else(|| Node::string(""))),
        }),
        tokens,
    ))
}

fn command<'a>(context: &ParseContext, tokens: &'a [Token], name: &str) -> Parsed<'a> {
    match name {
        "loop" => loop_statement(context, tokens),
        "cut" => match tokens.first().map(Token::token_type) {
            Some(TokenType::String(target)) => {
                Ok((Some(Node::Cut(CutMode::Modify(target.clone()))), &tokens[1..]))
            }
            _ => Ok((Some(Node::Cut(CutMode::Toggle)), tokens)),
        },
        "banish" => {
            let _guard = context.push("banish");
            let (target, tokens) = quoted_name(context, tokens, ParseError::BanishTargetNotQuoted)?;
            Ok((Some(Node::Banish(target)), tokens))
        }
        _ => call(context, tokens, name),
    }
}

fn loop_statement<'a>(context: &ParseContext, tokens: &'a [Token]) -> Parsed<'a> {
    let _guard = context.push("loop");
    let (times, tokens) = match tokens {
        [open, rest @ ..] if open.is_symbol('[') => {
            let (times, rest) = walk(context, rest, false)?;
            (times.map(Box::new), skip_symbol(rest, ']'))
        }
        _ => (None, tokens),
    };

    let tokens = match tokens {
        [open, rest @ ..] if open.is_symbol('{') => rest,
        _ => return Err(context.error(ParseError::MissingLoopBody, tokens)),
    };
    let (body, tokens) = block(context, tokens)?;

    Ok((Some(Node::Loop { times, body }), tokens))
}

fn call<'a>(context: &ParseContext, tokens: &'a [Token], name: &str) -> Parsed<'a> {
    let _guard = context.push("call");
    let mut params = Vec::new();
    let mut tokens = tokens;

    while let Some(token) = tokens.first() {
        if token.is_symbol('}') || token.is_symbol(']') || token.is_symbol(')') {
            break;
        }
        if is_stop_word(token) {
            break;
        }
        if token.is_symbol(',') {
            tokens = &tokens[1..];
            continue;
        }
        let (param, rest) = phrase(context, tokens)?;
        params.extend(param);
        tokens = advance(tokens, rest);
    }

    Ok((
        Some(Node::Call {
            name: name.to_string(),
            params,
        }),
        tokens,
    ))
}

/// Adjacent terms read as one value: `"Hello" "count":var` joins its parts
/// with spaces. Composite expressions always stand alone.
fn phrase<'a>(context: &ParseContext, tokens: &'a [Token]) -> Parsed<'a> {
    let _guard = context.push("phrase");
    let (first, mut tokens) = walk(context, tokens, true)?;
    let Some(first) = first else {
        return Ok((None, tokens));
    };

    if matches!(
        first,
        Node::Binary(..) | Node::Random { .. } | Node::Comparison(..) | Node::Literal(Literal::Boolean(_))
    ) {
        return Ok((Some(first), tokens));
    }

    let mut parts = vec![first];
    while let Some(token) = tokens.first() {
        if ends_phrase(token) {
            break;
        }
        let (part, rest) = walk(context, tokens, true)?;
        tokens = rest;
        match part {
            Some(part) => parts.push(part),
            None => break,
        }
    }

    let node = if parts.len() == 1 {
        parts.remove(0)
    } else {
        Node::SmartPhrase(parts)
    };
    Ok((Some(node), tokens))
}

fn ends_phrase(token: &Token) -> bool {
    match token.token_type() {
        TokenType::Symbol(c) => ",}])={".contains(*c),
        TokenType::Name(_) => is_stop_word(token) || token.is_name("is"),
        _ => is_stop_word(token),
    }
}

fn is_stop_word(token: &Token) -> bool {
    match token.token_type() {
        TokenType::Bussin => true,
        TokenType::Name(name) => STOP_WORDS.contains(&name.strip_suffix('!').unwrap_or(name)),
        _ => false,
    }
}

fn is_equality(token: &Token) -> bool {
    token.is_name("is") || token.is_symbol('=')
}

fn skip_equality(tokens: &[Token]) -> &[Token] {
    match tokens {
        [first, rest @ ..] if is_equality(first) => rest,
        _ => tokens,
    }
}

fn skip_symbol(tokens: &[Token], symbol: char) -> &[Token] {
    match tokens {
        [first, rest @ ..] if first.is_symbol(symbol) => rest,
        _ => tokens,
    }
}

fn quoted_name<'a>(
    context: &ParseContext,
    tokens: &'a [Token],
    error: ParseError,
) -> Result<(String, &'a [Token]), ParseErrorWithContext> {
    match tokens.first().map(Token::token_type) {
        Some(TokenType::String(name)) => Ok((name.clone(), &tokens[1..])),
        _ => Err(context.error(error, tokens)),
    }
}
