//! Tokenizer and recursive-descent parser.
//!
//! Grammar (informal):
//! ```text
//! expr       = or
//! or         = and (("or" | "||") and)*
//! and        = unary (("and" | "&&") unary)*
//! unary      = ("not" | "!") unary | comparison
//! comparison = primary [ OP primary | ["not"] "in" primary ]
//! OP         = "==" | "!=" | "<" | "<=" | ">" | ">="
//! primary    = "true" | "false" | NUMBER | STRING | VARIABLE | CALL | "(" expr ")"
//! VARIABLE   = "hour" | "minute" | "weekday"
//! CALL       = "is_weekday()" | "is_weekend()" | "is_daytime()" | "is_work_hours()"
//!            | "occupants()" | "state(" STRING ")"
//! ```
//!
//! Keywords are case-insensitive (`AND` and `and` both work).

use crate::EvalError;

/// A parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Num(f64),
    Str(String),
    Var(Variable),
    Call(Function),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, CmpOp, Box<Expr>),
    /// Membership test; `negated` for `not in`.
    In {
        needle: Box<Expr>,
        haystack: Box<Expr>,
        negated: bool,
    },
}

/// Clock fields readable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Hour,
    Minute,
    Weekday,
}

/// The function whitelist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    IsWeekday,
    IsWeekend,
    IsDaytime,
    IsWorkHours,
    Occupants,
    State(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Parse an expression string into an [`Expr`] tree.
///
/// Returns `Ok(Expr::Bool(true))` for empty input.
pub fn parse_expr(input: &str) -> Result<Expr, EvalError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Expr::Bool(true));
    }
    let tokens = tokenize(input)?;
    if tokens.len() > MAX_TOKENS {
        return Err(syntax(format!(
            "expression too long ({} tokens, limit {MAX_TOKENS})",
            tokens.len()
        )));
    }
    let (expr, rest) = parse_or(&tokens, 0)?;
    if !rest.is_empty() {
        return Err(EvalError::Syntax(format!(
            "unexpected tokens after expression: {rest:?}"
        )));
    }
    Ok(expr)
}

/// Token types for the condition language.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    True,
    False,
    And,
    Or,
    Not,
    In,
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    LParen,
    RParen,
    Comma,
}

/// Deepest allowed nesting of parentheses and `not`.
pub const MAX_DEPTH: usize = 64;

/// Operator chains build left-deep trees, so length is capped as well.
pub const MAX_TOKENS: usize = 1024;

fn syntax(msg: impl Into<String>) -> EvalError {
    EvalError::Syntax(msg.into())
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                s.push(escaped);
                            }
                        }
                        Some(ch) if ch == quote => break,
                        Some(ch) => s.push(ch),
                        None => return Err(syntax("unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(s));
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Gte);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Lte);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                }
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::NotEq);
                } else {
                    tokens.push(Token::Not);
                }
            }
            '&' => {
                chars.next();
                if chars.next() != Some('&') {
                    return Err(syntax("expected '&&'"));
                }
                tokens.push(Token::And);
            }
            '|' => {
                chars.next();
                if chars.next() != Some('|') {
                    return Err(syntax("expected '||'"));
                }
                tokens.push(Token::Or);
            }
            _ if c.is_ascii_digit() || c == '-' => {
                let mut num_str = String::new();
                num_str.push(c);
                chars.next();
                while let Some(&nc) = chars.peek() {
                    if nc.is_ascii_digit() || nc == '.' {
                        num_str.push(nc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match num_str.parse::<f64>() {
                    Ok(n) => tokens.push(Token::Num(n)),
                    Err(_) => return Err(syntax(format!("invalid number: {num_str}"))),
                }
            }
            _ if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&wc) = chars.peek() {
                    if wc.is_alphanumeric() || wc == '_' {
                        word.push(wc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    "true" => Token::True,
                    "false" => Token::False,
                    _ => Token::Ident(word),
                };
                tokens.push(token);
            }
            _ => return Err(syntax(format!("unexpected character: {c}"))),
        }
    }

    Ok(tokens)
}

fn parse_or(tokens: &[Token], depth: usize) -> Result<(Expr, &[Token]), EvalError> {
    let (mut left, mut rest) = parse_and(tokens, depth)?;
    while rest.first() == Some(&Token::Or) {
        let (right, remaining) = parse_and(&rest[1..], depth)?;
        left = Expr::Or(Box::new(left), Box::new(right));
        rest = remaining;
    }
    Ok((left, rest))
}

fn parse_and(tokens: &[Token], depth: usize) -> Result<(Expr, &[Token]), EvalError> {
    let (mut left, mut rest) = parse_unary(tokens, depth)?;
    while rest.first() == Some(&Token::And) {
        let (right, remaining) = parse_unary(&rest[1..], depth)?;
        left = Expr::And(Box::new(left), Box::new(right));
        rest = remaining;
    }
    Ok((left, rest))
}

fn nested(depth: usize) -> Result<usize, EvalError> {
    if depth >= MAX_DEPTH {
        return Err(syntax("expression nested too deeply"));
    }
    Ok(depth + 1)
}

fn parse_unary(tokens: &[Token], depth: usize) -> Result<(Expr, &[Token]), EvalError> {
    if tokens.first() == Some(&Token::Not) {
        let (inner, rest) = parse_unary(&tokens[1..], nested(depth)?)?;
        return Ok((Expr::Not(Box::new(inner)), rest));
    }
    parse_comparison(tokens, depth)
}

fn parse_comparison(tokens: &[Token], depth: usize) -> Result<(Expr, &[Token]), EvalError> {
    let (left, rest) = parse_primary(tokens, depth)?;

    let op = match rest.first() {
        Some(Token::Eq) => Some(CmpOp::Eq),
        Some(Token::NotEq) => Some(CmpOp::NotEq),
        Some(Token::Lt) => Some(CmpOp::Lt),
        Some(Token::Lte) => Some(CmpOp::Lte),
        Some(Token::Gt) => Some(CmpOp::Gt),
        Some(Token::Gte) => Some(CmpOp::Gte),
        _ => None,
    };
    if let Some(op) = op {
        let (right, rest) = parse_primary(&rest[1..], depth)?;
        return Ok((Expr::Compare(Box::new(left), op, Box::new(right)), rest));
    }

    // `x in set` / `x not in set`
    let (negated, after) = match (rest.first(), rest.get(1)) {
        (Some(Token::In), _) => (false, &rest[1..]),
        (Some(Token::Not), Some(Token::In)) => (true, &rest[2..]),
        _ => return Ok((left, rest)),
    };
    let (haystack, rest) = parse_primary(after, depth)?;
    Ok((
        Expr::In {
            needle: Box::new(left),
            haystack: Box::new(haystack),
            negated,
        },
        rest,
    ))
}

fn parse_primary(tokens: &[Token], depth: usize) -> Result<(Expr, &[Token]), EvalError> {
    match tokens.first() {
        Some(Token::LParen) => {
            let (inner, rest) = parse_or(&tokens[1..], nested(depth)?)?;
            if rest.first() != Some(&Token::RParen) {
                return Err(syntax("expected closing parenthesis"));
            }
            Ok((inner, &rest[1..]))
        }
        Some(Token::True) => Ok((Expr::Bool(true), &tokens[1..])),
        Some(Token::False) => Ok((Expr::Bool(false), &tokens[1..])),
        Some(Token::Num(n)) => Ok((Expr::Num(*n), &tokens[1..])),
        Some(Token::Str(s)) => Ok((Expr::Str(s.clone()), &tokens[1..])),
        Some(Token::Ident(name)) => {
            if tokens.get(1) == Some(&Token::LParen) {
                parse_call(name, &tokens[2..])
            } else {
                let var = match name.to_ascii_lowercase().as_str() {
                    "hour" => Variable::Hour,
                    "minute" => Variable::Minute,
                    "weekday" | "day" => Variable::Weekday,
                    _ => return Err(EvalError::UnknownIdentifier(name.clone())),
                };
                Ok((Expr::Var(var), &tokens[1..]))
            }
        }
        other => Err(syntax(format!("expected a value, got {other:?}"))),
    }
}

/// Parse the argument list of `name(`, with `tokens` starting after the
/// opening parenthesis.
fn parse_call<'t>(name: &str, tokens: &'t [Token]) -> Result<(Expr, &'t [Token]), EvalError> {
    let mut args = Vec::new();
    let mut rest = tokens;
    loop {
        match rest.first() {
            Some(Token::RParen) => {
                rest = &rest[1..];
                break;
            }
            Some(Token::Comma) if !args.is_empty() => rest = &rest[1..],
            Some(Token::Str(s)) => {
                args.push(s.clone());
                rest = &rest[1..];
            }
            Some(Token::Ident(s)) => {
                // Bare identifier as a string argument: state(tv)
                args.push(s.clone());
                rest = &rest[1..];
            }
            other => {
                return Err(syntax(format!(
                    "expected string argument or ')' in call to {name}, got {other:?}"
                )));
            }
        }
    }

    let arity = |expected: usize| -> Result<(), EvalError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(EvalError::Arity {
                function: name.to_string(),
                expected,
                found: args.len(),
            })
        }
    };

    let function = match name.to_ascii_lowercase().as_str() {
        "is_weekday" => arity(0).map(|_| Function::IsWeekday)?,
        "is_weekend" => arity(0).map(|_| Function::IsWeekend)?,
        "is_daytime" => arity(0).map(|_| Function::IsDaytime)?,
        "is_work_hours" => arity(0).map(|_| Function::IsWorkHours)?,
        "occupants" => arity(0).map(|_| Function::Occupants)?,
        "state" => {
            arity(1)?;
            Function::State(args[0].clone())
        }
        _ => return Err(EvalError::UnknownFunction(name.to_string())),
    };
    Ok((Expr::Call(function), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_function_conjunction() {
        let expr = parse_expr("is_work_hours() and is_weekday()").unwrap();
        assert_eq!(
            expr,
            Expr::And(
                Box::new(Expr::Call(Function::IsWorkHours)),
                Box::new(Expr::Call(Function::IsWeekday)),
            )
        );
    }

    #[test]
    fn symbolic_operators() {
        let a = parse_expr("hour >= 22 || hour < 6").unwrap();
        let b = parse_expr("hour >= 22 OR hour < 6").unwrap();
        assert_eq!(a, b);
        assert!(matches!(parse_expr("!is_weekend()").unwrap(), Expr::Not(_)));
    }

    #[test]
    fn not_binds_tighter_than_and() {
        let expr = parse_expr("not is_weekend() and hour > 8").unwrap();
        assert!(matches!(expr, Expr::And(ref l, _) if matches!(**l, Expr::Not(_))));
    }

    #[test]
    fn membership_and_negated_membership() {
        let expr = parse_expr(r#""parent_b" in occupants()"#).unwrap();
        assert!(matches!(expr, Expr::In { negated: false, .. }));
        let expr = parse_expr(r#""guest" not in occupants()"#).unwrap();
        assert!(matches!(expr, Expr::In { negated: true, .. }));
    }

    #[test]
    fn state_takes_one_argument() {
        assert_eq!(
            parse_expr(r#"state("tv")"#).unwrap(),
            Expr::Call(Function::State("tv".into()))
        );
        assert_eq!(
            parse_expr("state(tv)").unwrap(),
            Expr::Call(Function::State("tv".into()))
        );
        assert!(matches!(
            parse_expr("state()"),
            Err(EvalError::Arity { expected: 1, found: 0, .. })
        ));
        assert!(matches!(
            parse_expr(r#"is_weekday("x")"#),
            Err(EvalError::Arity { expected: 0, .. })
        ));
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(
            parse_expr("now() > 3"),
            Err(EvalError::UnknownFunction("now".into()))
        );
        assert_eq!(
            parse_expr("temperature > 3"),
            Err(EvalError::UnknownIdentifier("temperature".into()))
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(parse_expr("hour >"), Err(EvalError::Syntax(_))));
        assert!(matches!(parse_expr("(hour > 3"), Err(EvalError::Syntax(_))));
        assert!(matches!(parse_expr("hour > 3 4"), Err(EvalError::Syntax(_))));
        assert!(matches!(parse_expr("'open"), Err(EvalError::Syntax(_))));
        assert!(matches!(parse_expr("hour & 3"), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn nesting_is_bounded() {
        let wrap = |n: usize| format!("{}true{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(parse_expr(&wrap(MAX_DEPTH)).unwrap(), Expr::Bool(true));
        assert_eq!(
            parse_expr(&wrap(MAX_DEPTH + 1)),
            Err(EvalError::Syntax("expression nested too deeply".into()))
        );
        assert!(matches!(parse_expr(&wrap(5000)), Err(EvalError::Syntax(_))));
        let mixed = format!("{}true{}", "not (".repeat(40), ")".repeat(40));
        assert!(matches!(parse_expr(&mixed), Err(EvalError::Syntax(_))));
        let nots = format!("{}true", "!".repeat(5000));
        assert!(matches!(parse_expr(&nots), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn long_chains_are_rejected() {
        let chain = vec!["true"; MAX_TOKENS].join(" and ");
        assert!(matches!(parse_expr(&chain), Err(EvalError::Syntax(_))));
        let short = vec!["true"; 10].join(" and ");
        assert!(parse_expr(&short).is_ok());
    }

    #[test]
    fn empty_is_true() {
        assert_eq!(parse_expr("  ").unwrap(), Expr::Bool(true));
    }
}
