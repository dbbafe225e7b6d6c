//! Propositional expression tree, lexer and recursive-descent parser.
//!
//! Expressions are parsed once (at configuration time, or when a premise is
//! compared) and evaluated against a variable-binding context.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Error, Result};

/// Deepest parenthesis, negation or implication nesting the parser accepts.
pub const MAX_NESTING: usize = 128;

/// Longest token sequence the parser accepts. Bounds the depth of any
/// parsed tree, so evaluation and rendering stay shallow.
pub const MAX_TOKENS: usize = 1024;

/// A propositional formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Const(bool),
    Var(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Iff(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn not(inner: Expr) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Self::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn implies(lhs: Expr, rhs: Expr) -> Self {
        Self::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn iff(lhs: Expr, rhs: Expr) -> Self {
        Self::Iff(Box::new(lhs), Box::new(rhs))
    }

    /// Parse a formula from text.
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = lex(input, LexMode::Strict)?;
        if tokens.len() > MAX_TOKENS {
            return Err(Error::expression_parse(
                input,
                tokens[MAX_TOKENS].1,
                format!("expression longer than {} tokens", MAX_TOKENS),
            ));
        }
        let mut parser = Parser {
            input,
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_iff()?;
        if let Some((token, at)) = parser.tokens.get(parser.pos) {
            return Err(Error::expression_parse(
                input,
                *at,
                format!("unexpected trailing {}", token),
            ));
        }
        Ok(expr)
    }

    /// Evaluate under a binding context. Unbound atoms are false.
    pub fn eval(&self, context: &BTreeMap<String, bool>) -> bool {
        match self {
            Self::Const(value) => *value,
            Self::Var(name) => context.get(name).copied().unwrap_or(false),
            Self::Not(inner) => !inner.eval(context),
            Self::And(l, r) => l.eval(context) && r.eval(context),
            Self::Or(l, r) => l.eval(context) || r.eval(context),
            Self::Implies(l, r) => !l.eval(context) || r.eval(context),
            Self::Iff(l, r) => l.eval(context) == r.eval(context),
        }
    }

    /// Names of all atoms in the formula.
    pub fn atoms(&self) -> BTreeSet<String> {
        let mut atoms = BTreeSet::new();
        self.collect_atoms(&mut atoms);
        atoms
    }

    fn collect_atoms(&self, atoms: &mut BTreeSet<String>) {
        match self {
            Self::Const(_) => {}
            Self::Var(name) => {
                atoms.insert(name.clone());
            }
            Self::Not(inner) => inner.collect_atoms(atoms),
            Self::And(l, r) | Self::Or(l, r) | Self::Implies(l, r) | Self::Iff(l, r) => {
                l.collect_atoms(atoms);
                r.collect_atoms(atoms);
            }
        }
    }

    /// The same formula with every atom name lowercased.
    pub fn with_lowercase_atoms(&self) -> Expr {
        match self {
            Self::Const(value) => Self::Const(*value),
            Self::Var(name) => Self::Var(name.to_lowercase()),
            Self::Not(inner) => Self::not(inner.with_lowercase_atoms()),
            Self::And(l, r) => Self::and(l.with_lowercase_atoms(), r.with_lowercase_atoms()),
            Self::Or(l, r) => Self::or(l.with_lowercase_atoms(), r.with_lowercase_atoms()),
            Self::Implies(l, r) => {
                Self::implies(l.with_lowercase_atoms(), r.with_lowercase_atoms())
            }
            Self::Iff(l, r) => Self::iff(l.with_lowercase_atoms(), r.with_lowercase_atoms()),
        }
    }

    /// Truth-table equivalence over the union of both formulas' atoms.
    ///
    /// When the union exceeds `max_atoms` the canonical renderings are
    /// compared instead.
    pub fn equivalent(&self, other: &Expr, max_atoms: usize) -> bool {
        let mut atoms = self.atoms();
        atoms.extend(other.atoms());
        if atoms.len() > max_atoms {
            return self.to_string() == other.to_string();
        }

        let atoms: Vec<String> = atoms.into_iter().collect();
        (0u64..(1u64 << atoms.len())).all(|bits| {
            let context: BTreeMap<String, bool> = atoms
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), bits & (1 << i) != 0))
                .collect();
            self.eval(&context) == other.eval(&context)
        })
    }

    fn is_binary(&self) -> bool {
        matches!(
            self,
            Self::And(..) | Self::Or(..) | Self::Implies(..) | Self::Iff(..)
        )
    }
}

struct Wrapped<'a>(&'a Expr);

impl fmt::Display for Wrapped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_binary() {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Canonical rendering: ASCII operators, binary operands parenthesized.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(true) => write!(f, "true"),
            Self::Const(false) => write!(f, "false"),
            Self::Var(name) => write!(f, "{}", name),
            Self::Not(inner) => write!(f, "!{}", Wrapped(inner)),
            Self::And(l, r) => write!(f, "{} & {}", Wrapped(l), Wrapped(r)),
            Self::Or(l, r) => write!(f, "{} | {}", Wrapped(l), Wrapped(r)),
            Self::Implies(l, r) => write!(f, "{} -> {}", Wrapped(l), Wrapped(r)),
            Self::Iff(l, r) => write!(f, "{} <-> {}", Wrapped(l), Wrapped(r)),
        }
    }
}

// ==================== Lexer ====================

/// A lexical token of the expression language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Ident(String),
    True,
    False,
    Not,
    And,
    Or,
    Implies,
    Iff,
    If,
    Then,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "identifier '{}'", name),
            Self::True => write!(f, "'true'"),
            Self::False => write!(f, "'false'"),
            Self::Not => write!(f, "'!'"),
            Self::And => write!(f, "'&'"),
            Self::Or => write!(f, "'|'"),
            Self::Implies => write!(f, "'->'"),
            Self::Iff => write!(f, "'<->'"),
            Self::If => write!(f, "'if'"),
            Self::Then => write!(f, "'then'"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Comma => write!(f, "','"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexMode {
    /// Unknown characters are errors
    Strict,
    /// Unknown characters separate tokens
    Lenient,
}

const SYMBOLS: &[(&str, Token)] = &[
    ("<->", Token::Iff),
    ("<=>", Token::Iff),
    ("->", Token::Implies),
    ("=>", Token::Implies),
    ("&&", Token::And),
    ("||", Token::Or),
    ("↔", Token::Iff),
    ("→", Token::Implies),
    ("∧", Token::And),
    ("∨", Token::Or),
    ("¬", Token::Not),
    ("⊤", Token::True),
    ("⊥", Token::False),
    ("!", Token::Not),
    ("~", Token::Not),
    ("&", Token::And),
    ("|", Token::Or),
    ("(", Token::LParen),
    (")", Token::RParen),
    (",", Token::Comma),
];

fn keyword(word: &str) -> Option<Token> {
    match word.to_ascii_lowercase().as_str() {
        "not" => Some(Token::Not),
        "and" => Some(Token::And),
        "or" => Some(Token::Or),
        "implies" => Some(Token::Implies),
        "iff" => Some(Token::Iff),
        "if" => Some(Token::If),
        "then" => Some(Token::Then),
        "true" => Some(Token::True),
        "false" => Some(Token::False),
        _ => None,
    }
}

fn lex(input: &str, mode: LexMode) -> Result<Vec<(Token, usize)>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    'outer: while pos < input.len() {
        let rest = &input[pos..];
        let Some(c) = rest.chars().next() else { break };

        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        for (symbol, token) in SYMBOLS {
            if rest.starts_with(symbol) {
                tokens.push((token.clone(), pos));
                pos += symbol.len();
                continue 'outer;
            }
        }

        if c.is_alphabetic() || c == '_' {
            let len = rest
                .char_indices()
                .find(|(_, ch)| !(ch.is_alphanumeric() || *ch == '_'))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let word = &rest[..len];
            let token = keyword(word).unwrap_or_else(|| Token::Ident(word.to_string()));
            tokens.push((token, pos));
            pos += len;
            continue;
        }

        match mode {
            LexMode::Strict => {
                return Err(Error::expression_parse(
                    input,
                    pos,
                    format!("unexpected character '{}'", c),
                ))
            }
            LexMode::Lenient => pos += c.len_utf8(),
        }
    }

    Ok(tokens)
}

/// Operator-normalized token stream of arbitrary text, ignoring grouping
/// and unknown characters. Used to locate formulas inside prose.
pub fn search_tokens(text: &str) -> Vec<Token> {
    lex(text, LexMode::Lenient)
        .unwrap_or_default()
        .into_iter()
        .map(|(token, _)| token)
        .filter(|t| !matches!(t, Token::LParen | Token::RParen | Token::Comma))
        .collect()
}

// ==================== Parser ====================

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, at)| *at)
            .unwrap_or(self.input.len())
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::expression_parse(self.input, self.offset(), message)
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.peek() {
            Some(token) if *token == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(self.error(format!("expected {}, found {}", expected, token))),
            None => Err(self.error(format!("expected {}, found end of input", expected))),
        }
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("nesting too deep"));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn parse_iff(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_implies()?;
        while self.peek() == Some(&Token::Iff) {
            self.advance();
            let rhs = self.parse_implies()?;
            lhs = Expr::iff(lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_implies(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::If) {
            self.advance();
            self.descend()?;
            let antecedent = self.parse_implies()?;
            if self.peek() == Some(&Token::Comma) {
                self.advance();
            }
            self.expect(Token::Then)?;
            let consequent = self.parse_implies()?;
            self.ascend();
            return Ok(Expr::implies(antecedent, consequent));
        }

        let lhs = self.parse_or()?;
        if self.peek() == Some(&Token::Implies) {
            self.advance();
            self.descend()?;
            let rhs = self.parse_implies()?;
            self.ascend();
            return Ok(Expr::implies(lhs, rhs));
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::or(lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::and(lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            self.descend()?;
            let inner = self.parse_unary()?;
            self.ascend();
            return Ok(Expr::not(inner));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::True) => Ok(Expr::Const(true)),
            Some(Token::False) => Ok(Expr::Const(false)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.parse_iff()?;
                self.expect(Token::RParen)?;
                self.ascend();
                Ok(inner)
            }
            Some(token) => Err(Error::expression_parse(
                self.input,
                offset,
                format!("unexpected {}", token),
            )),
            None => Err(self.error("unexpected end of input")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_parse_precedence() {
        let expr = Expr::parse("A & B -> C").unwrap();
        assert_eq!(
            expr,
            Expr::implies(Expr::and(Expr::var("A"), Expr::var("B")), Expr::var("C"))
        );

        let expr = Expr::parse("!A | B & C").unwrap();
        assert_eq!(
            expr,
            Expr::or(
                Expr::not(Expr::var("A")),
                Expr::and(Expr::var("B"), Expr::var("C"))
            )
        );
    }

    #[test]
    fn test_implication_is_right_associative() {
        let expr = Expr::parse("A -> B -> C").unwrap();
        assert_eq!(
            expr,
            Expr::implies(Expr::var("A"), Expr::implies(Expr::var("B"), Expr::var("C")))
        );
    }

    #[test]
    fn test_unicode_and_keyword_operators() {
        let symbolic = Expr::parse("A&B→C").unwrap();
        let unicode = Expr::parse("(A ∧ B) → C").unwrap();
        let words = Expr::parse("A and B implies C").unwrap();
        let conditional = Expr::parse("If A and B, then C").unwrap();

        assert_eq!(symbolic, unicode);
        assert_eq!(symbolic, words);
        assert_eq!(symbolic, conditional);
        assert_eq!(Expr::parse("¬C").unwrap(), Expr::parse("Not C").unwrap());
        assert_eq!(Expr::parse("A <=> B").unwrap(), Expr::parse("A ↔ B").unwrap());
    }

    #[test]
    fn test_parse_errors_carry_position() {
        match Expr::parse("A & (B | C") {
            Err(Error::ExpressionParse { position, .. }) => assert_eq!(position, 10),
            other => panic!("expected parse error, got {:?}", other),
        }
        match Expr::parse("A $ B") {
            Err(Error::ExpressionParse { position, .. }) => assert_eq!(position, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(Expr::parse("Socrates is mortal").is_err());
        assert!(Expr::parse("").is_err());
    }

    #[test]
    fn test_eval() {
        let expr = Expr::parse("A & B -> C").unwrap();
        assert!(expr.eval(&ctx(&[("A", true), ("B", true), ("C", true)])));
        assert!(!expr.eval(&ctx(&[("A", true), ("B", true), ("C", false)])));
        assert!(expr.eval(&ctx(&[("A", false), ("B", true), ("C", false)])));
        // Unbound atoms are false.
        assert!(expr.eval(&ctx(&[])));
        assert!(!Expr::parse("A <-> !A").unwrap().eval(&ctx(&[])));
    }

    #[test]
    fn test_equivalence() {
        let a = Expr::parse("A -> B").unwrap();
        let b = Expr::parse("!A | B").unwrap();
        let c = Expr::parse("!B -> !A").unwrap();
        let d = Expr::parse("B -> A").unwrap();

        assert!(a.equivalent(&b, 16));
        assert!(a.equivalent(&c, 16));
        assert!(!a.equivalent(&d, 16));
        assert!(Expr::parse("A | !A").unwrap().equivalent(&Expr::Const(true), 16));
    }

    #[test]
    fn test_equivalence_falls_back_to_rendering_past_limit() {
        let a = Expr::parse("A & B").unwrap();
        let b = Expr::parse("B & A").unwrap();
        assert!(a.equivalent(&b, 2));
        assert!(!a.equivalent(&b, 1));
        assert!(a.equivalent(&a.clone(), 1));
    }

    #[test]
    fn test_canonical_rendering_round_trips() {
        let expr = Expr::parse("not (A and B) or C <-> D").unwrap();
        let rendered = expr.to_string();
        assert_eq!(rendered, "(!(A & B) | C) <-> D");
        assert_eq!(Expr::parse(&rendered).unwrap(), expr);
    }

    #[test]
    fn test_atoms() {
        let atoms = Expr::parse("(A & B) -> (C | A) & true").unwrap().atoms();
        assert_eq!(
            atoms.into_iter().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
    }

    #[test]
    fn test_search_tokens_ignore_prose_punctuation() {
        let tokens = search_tokens("Therefore, (A ∧ B) → C holds.");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("Therefore".into()),
                Token::Ident("A".into()),
                Token::And,
                Token::Ident("B".into()),
                Token::Implies,
                Token::Ident("C".into()),
                Token::Ident("holds".into()),
            ]
        );
    }

    #[test]
    fn test_deep_nesting_is_a_parse_error() {
        let parens = format!("{}A", "(".repeat(50_000));
        let err = Expr::parse(&parens).unwrap_err();
        assert!(matches!(err, Error::ExpressionParse { .. }));

        let negations = format!("{}A", "!".repeat(MAX_NESTING + 1));
        let err = Expr::parse(&negations).unwrap_err();
        assert!(err.to_string().contains("nesting too deep"), "{}", err);

        let nested = format!("{}A{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(Expr::parse(&nested).unwrap(), Expr::var("A"));
    }

    #[test]
    fn test_overlong_expression_is_a_parse_error() {
        let chain = vec!["A"; MAX_TOKENS].join(" & ");
        let err = Expr::parse(&chain).unwrap_err();
        assert!(err.to_string().contains("tokens"), "{}", err);

        let implications = vec!["A"; 200].join(" -> ");
        assert!(Expr::parse(&implications).is_err());

        let short = vec!["A"; 50].join(" & ");
        assert!(Expr::parse(&short).is_ok());
    }
}
