//! Tokenizer and parser for Schemer source text.
//!
//! Parsing never fails. Parentheses are not checked for balance: a list left
//! open at the end of input is closed implicitly, and a stray `)` at the top
//! level ends the program.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till1, take_while},
    character::complete::{digit1, one_of},
    combinator::{all_consuming, map_res, opt, recognize, value},
    sequence::{pair, preceded},
};

use crate::ast::{NumberType, Value};

/// Spelling of the boolean literals
pub const TRUE_LITERAL: &str = "#t";
pub const FALSE_LITERAL: &str = "#f";

fn is_paren(c: char) -> bool {
    c == '(' || c == ')'
}

/// Skip any amount of whitespace
fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace).parse(input)
}

/// A single token: a parenthesis, or a run of anything else up to whitespace or a parenthesis
fn token(input: &str) -> IResult<&str, &str> {
    alt((
        tag("("),
        tag(")"),
        take_till1(|c: char| c.is_whitespace() || is_paren(c)),
    ))
    .parse(input)
}

/// Split source text into parenthesis and atom tokens.
///
/// No quoting, strings or comments are recognised: `'`, `"` and `;` are
/// ordinary atom characters.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut input = text;
    // Stops once only whitespace remains
    while let Ok((rest, tok)) = preceded(whitespace, token).parse(input) {
        tokens.push(tok);
        input = rest;
    }
    tokens
}

/// Parse an optionally signed decimal integer
fn parse_integer(input: &str) -> IResult<&str, NumberType> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |digits: &str| {
        digits.parse::<NumberType>()
    })
    .parse(input)
}

/// Parse a boolean (#t or #f)
fn parse_bool(input: &str) -> IResult<&str, bool> {
    alt((
        value(true, tag(TRUE_LITERAL)),
        value(false, tag(FALSE_LITERAL)),
    ))
    .parse(input)
}

/// Classify one atom token. Integers too large for `i64` stay symbols.
fn parse_atom(token: &str) -> Value {
    if let Ok((_, n)) = all_consuming(parse_integer).parse(token) {
        return Value::Number(n);
    }
    if let Ok((_, b)) = all_consuming(parse_bool).parse(token) {
        return Value::Bool(b);
    }
    Value::Symbol(token.to_owned())
}

/// Collect elements until the closing `)` or the end of the token stream
fn parse_list<'a, I>(tokens: &mut I) -> Vec<Value>
where
    I: Iterator<Item = &'a str>,
{
    let mut elements = Vec::new();
    while let Some(tok) = tokens.next() {
        match tok {
            "(" => elements.push(Value::List(parse_list(tokens))),
            ")" => return elements,
            atom => elements.push(parse_atom(atom)),
        }
    }
    elements
}

/// Build an expression tree from a token stream.
///
/// The whole stream is wrapped in one implicit outer list, so the result is
/// always a [`Value::List`] of the top-level forms.
pub fn parse<'a, I>(tokens: I) -> Value
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tokens = tokens.into_iter();
    Value::List(parse_list(&mut tokens))
}

/// Tokenize and parse source text into a list of top-level forms
pub fn parse_program(text: &str) -> Value {
    parse(tokenize(text))
}
