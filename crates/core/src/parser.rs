//! Tolerant parser: token stream -> [`RawClass`].
//!
//! This is not a Java parser. It recognizes exactly the member shapes the
//! extractor can use -- single-declarator field declarations and constructor
//! bodies with top-level assignments -- and skips everything else with
//! balanced-delimiter consumption. Initializer expressions outside the small
//! recognized grammar become [`RawExpr::Opaque`], which makes the enclosing
//! declaration fail its shape match later instead of failing the parse.

use crate::ast::{Provenance, RawAssign, RawClass, RawExpr, RawField};
use crate::error::ExtractError;
use crate::lexer::{Spanned, Token};

const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "final",
    "abstract",
    "volatile",
    "transient",
    "synchronized",
    "native",
    "strictfp",
];

pub fn parse_class(tokens: &[Spanned], filename: &str) -> Result<RawClass, ExtractError> {
    Parser::new(tokens, filename).parse()
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    filename: String,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], filename: &str) -> Self {
        Parser {
            tokens,
            pos: 0,
            filename: filename.to_owned(),
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].token
    }

    fn cur_line(&self) -> u32 {
        self.cur().line
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn err(&self, msg: impl Into<String>) -> ExtractError {
        ExtractError::parse(&self.filename, self.cur_line(), msg)
    }

    fn prov(&self, line: u32) -> Provenance {
        Provenance {
            file: self.filename.clone(),
            line,
        }
    }

    // ── Compilation unit ─────────────────────────────────────────────

    fn parse(&mut self) -> Result<RawClass, ExtractError> {
        let class_name = self.find_class_header()?;
        let mut fields = Vec::new();
        let mut assigns = Vec::new();
        loop {
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => {
                    return Err(self.err("unexpected end of input inside class body"));
                }
                _ => self.parse_member(&class_name, &mut fields, &mut assigns)?,
            }
        }
        Ok(RawClass {
            name: class_name,
            fields,
            assigns,
        })
    }

    /// Scan forward to the first type-declaration keyword (ignoring
    /// `Foo.class` literals), take the type name, and position the cursor
    /// just inside the opening brace of the type body.
    fn find_class_header(&mut self) -> Result<String, ExtractError> {
        let mut prev_was_dot = false;
        loop {
            match self.peek() {
                Token::Eof => {
                    return Err(self.err("no class declaration found"));
                }
                Token::Word(w)
                    if !prev_was_dot
                        && matches!(w.as_str(), "class" | "interface" | "enum" | "record") =>
                {
                    self.advance();
                    break;
                }
                t => {
                    prev_was_dot = matches!(t, Token::Dot);
                    self.advance();
                }
            }
        }
        let name = match self.peek().clone() {
            Token::Word(w) => {
                self.advance();
                w
            }
            _ => return Err(self.err("expected class name after 'class'")),
        };
        // extends / implements clauses
        loop {
            match self.peek() {
                Token::LBrace => {
                    self.advance();
                    return Ok(name);
                }
                Token::Eof => {
                    return Err(self.err("expected '{' to open class body"));
                }
                _ => self.advance(),
            }
        }
    }

    // ── Class members ────────────────────────────────────────────────

    fn parse_member(
        &mut self,
        class_name: &str,
        fields: &mut Vec<RawField>,
        assigns: &mut Vec<RawAssign>,
    ) -> Result<(), ExtractError> {
        while matches!(self.peek(), Token::At) {
            self.skip_annotation();
        }
        let mut modifiers = Vec::new();
        while let Token::Word(w) = self.peek() {
            if MODIFIERS.contains(&w.as_str()) {
                modifiers.push(w.clone());
                self.advance();
                while matches!(self.peek(), Token::At) {
                    self.skip_annotation();
                }
            } else {
                break;
            }
        }

        match (self.peek().clone(), self.peek_at(1).clone(), self.peek_at(2).clone()) {
            (Token::Word(type_name), Token::Word(name), Token::Eq) => {
                self.parse_field(modifiers, type_name, name, true, fields)
            }
            (Token::Word(type_name), Token::Word(name), Token::Semi) => {
                self.parse_field(modifiers, type_name, name, false, fields)
            }
            (Token::Word(name), Token::LParen, _) if name == class_name => {
                self.parse_constructor(assigns)
            }
            _ => self.skip_member(),
        }
    }

    fn parse_field(
        &mut self,
        modifiers: Vec<String>,
        type_name: String,
        name: String,
        has_init: bool,
        fields: &mut Vec<RawField>,
    ) -> Result<(), ExtractError> {
        let line = self.cur_line();
        self.advance(); // type
        self.advance(); // name
        if !has_init {
            self.advance(); // ';'
            fields.push(RawField {
                modifiers,
                type_name,
                name,
                init: None,
                prov: self.prov(line),
            });
            return Ok(());
        }
        self.advance(); // '='
        let expr = self.parse_expr();
        match self.peek() {
            Token::Semi => {
                self.advance();
                fields.push(RawField {
                    modifiers,
                    type_name,
                    name,
                    init: Some(expr),
                    prov: self.prov(line),
                });
                Ok(())
            }
            // Multiple declarators ("double a = 1, b = 2;") are not a
            // recognized shape; drop the whole declaration.
            Token::Comma => self.skip_member(),
            _ => self.skip_member(),
        }
    }

    fn parse_constructor(&mut self, assigns: &mut Vec<RawAssign>) -> Result<(), ExtractError> {
        self.advance(); // constructor name
        self.skip_balanced(Token::LParen, Token::RParen)?;
        // optional throws clause
        loop {
            match self.peek() {
                Token::LBrace => break,
                Token::Semi => {
                    self.advance();
                    return Ok(());
                }
                Token::Eof => {
                    return Err(self.err("unexpected end of input in constructor declaration"));
                }
                _ => self.advance(),
            }
        }
        self.advance(); // '{'
        loop {
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    return Ok(());
                }
                Token::Eof => {
                    return Err(self.err("unexpected end of input in constructor body"));
                }
                _ => {
                    if !self.try_parse_assign(assigns) {
                        self.skip_statement()?;
                    }
                }
            }
        }
    }

    /// `name = expr;` or `this.name = expr;` at the top level of a
    /// constructor body. Returns false without consuming anything when the
    /// next statement is not assignment-shaped.
    fn try_parse_assign(&mut self, assigns: &mut Vec<RawAssign>) -> bool {
        let (name, eq_offset) = match (self.peek().clone(), self.peek_at(1).clone()) {
            (Token::Word(w), Token::Eq) if w != "this" => (w, 1),
            (Token::Word(w), Token::Dot) if w == "this" => {
                match (self.peek_at(2).clone(), self.peek_at(3).clone()) {
                    (Token::Word(n), Token::Eq) => (n, 3),
                    _ => return false,
                }
            }
            _ => return false,
        };
        // "==" is a comparison, not an assignment
        if self.peek_at(eq_offset + 1) == &Token::Eq {
            return false;
        }
        let line = self.cur_line();
        for _ in 0..=eq_offset {
            self.advance();
        }
        let expr = self.parse_expr();
        if matches!(self.peek(), Token::Semi) {
            self.advance();
        }
        assigns.push(RawAssign {
            name,
            expr,
            prov: self.prov(line),
        });
        true
    }

    // ── Skipping ─────────────────────────────────────────────────────

    /// Consume one unrecognized class member: up to a top-level ';', or a
    /// balanced `{...}` body (methods, nested types, initializer blocks).
    fn skip_member(&mut self) -> Result<(), ExtractError> {
        let mut depth = 0i32;
        loop {
            match self.peek() {
                Token::Eof => {
                    return Err(self.err("unexpected end of input in class member"));
                }
                Token::Semi if depth == 0 => {
                    self.advance();
                    return Ok(());
                }
                Token::RBrace if depth == 0 => {
                    // end of the enclosing class body; leave it for the caller
                    return Ok(());
                }
                Token::LBrace if depth == 0 => {
                    self.skip_balanced(Token::LBrace, Token::RBrace)?;
                    // trailing ';' after a body is legal and harmless
                    if matches!(self.peek(), Token::Semi) {
                        self.advance();
                    }
                    return Ok(());
                }
                Token::LParen | Token::LBracket | Token::LBrace => {
                    depth += 1;
                    self.advance();
                }
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth -= 1;
                    self.advance();
                }
                _ => self.advance(),
            }
        }
    }

    /// Consume one unrecognized constructor statement (same strategy as
    /// [`skip_member`], minus the trailing-semicolon special case).
    fn skip_statement(&mut self) -> Result<(), ExtractError> {
        let mut depth = 0i32;
        loop {
            match self.peek() {
                Token::Eof => {
                    return Err(self.err("unexpected end of input in statement"));
                }
                Token::Semi if depth == 0 => {
                    self.advance();
                    return Ok(());
                }
                Token::RBrace if depth == 0 => {
                    return Ok(());
                }
                Token::LBrace if depth == 0 => {
                    return self.skip_balanced(Token::LBrace, Token::RBrace);
                }
                Token::LParen | Token::LBracket | Token::LBrace => {
                    depth += 1;
                    self.advance();
                }
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth -= 1;
                    self.advance();
                }
                _ => self.advance(),
            }
        }
    }

    /// Cursor must be on `open`; consumes through the matching `close`.
    fn skip_balanced(&mut self, open: Token, close: Token) -> Result<(), ExtractError> {
        if self.peek() != &open {
            return Err(self.err(format!("expected {:?}, got {:?}", open, self.peek())));
        }
        self.advance();
        let mut depth = 1u32;
        loop {
            let t = self.peek().clone();
            if t == Token::Eof {
                return Err(self.err(format!("unbalanced {:?}", open)));
            }
            if t == open {
                depth += 1;
            } else if t == close {
                depth -= 1;
            }
            self.advance();
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// `@Name`, `@a.b.Name`, `@Name(...)`.
    fn skip_annotation(&mut self) {
        self.advance(); // '@'
        while let Token::Word(_) = self.peek() {
            self.advance();
            if matches!(self.peek(), Token::Dot) && matches!(self.peek_at(1), Token::Word(_)) {
                self.advance();
                continue;
            }
            break;
        }
        if matches!(self.peek(), Token::LParen) {
            let _ = self.skip_balanced(Token::LParen, Token::RParen);
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    /// Parse an expression, or consume it as [`RawExpr::Opaque`] when it
    /// falls outside the recognized grammar. Never fails; always leaves the
    /// cursor on a terminator (';', ',', ')', '}', or Eof) at this depth.
    fn parse_expr(&mut self) -> RawExpr {
        let start = self.pos;
        if let Some(e) = self.try_expr() {
            if self.at_terminator() {
                return e;
            }
        }
        self.pos = start;
        self.consume_opaque();
        RawExpr::Opaque
    }

    fn at_terminator(&self) -> bool {
        matches!(
            self.peek(),
            Token::Semi | Token::Comma | Token::RParen | Token::RBrace | Token::Eof
        )
    }

    fn try_expr(&mut self) -> Option<RawExpr> {
        let mut e = self.try_primary()?;
        while matches!(self.peek(), Token::Dot) {
            let method = match self.peek_at(1).clone() {
                Token::Word(m) => m,
                _ => return None,
            };
            if self.peek_at(2) != &Token::LParen {
                // field access ("Math.PI") -- not in the grammar
                return None;
            }
            self.advance(); // '.'
            self.advance(); // method name
            self.advance(); // '('
            let args = self.parse_args()?;
            e = RawExpr::Invoke {
                recv: Box::new(e),
                method,
                args,
            };
        }
        Some(e)
    }

    fn try_primary(&mut self) -> Option<RawExpr> {
        match self.peek().clone() {
            Token::Minus => match self.peek_at(1).clone() {
                Token::Int(n) => {
                    self.advance();
                    self.advance();
                    Some(RawExpr::Int(-n))
                }
                Token::Float(f) => {
                    self.advance();
                    self.advance();
                    Some(RawExpr::Float(-f))
                }
                _ => None,
            },
            Token::Int(n) => {
                self.advance();
                Some(RawExpr::Int(n))
            }
            Token::Float(f) => {
                self.advance();
                Some(RawExpr::Float(f))
            }
            Token::Word(w) if w == "new" => {
                self.advance();
                let mut class = match self.peek().clone() {
                    Token::Word(c) => {
                        self.advance();
                        c
                    }
                    _ => return None,
                };
                while matches!(self.peek(), Token::Dot) {
                    match self.peek_at(1).clone() {
                        Token::Word(seg) => {
                            self.advance();
                            self.advance();
                            class = seg;
                        }
                        _ => return None,
                    }
                }
                if self.peek() != &Token::LParen {
                    return None;
                }
                self.advance();
                let args = self.parse_args()?;
                Some(RawExpr::New { class, args })
            }
            Token::Word(w) => {
                self.advance();
                Some(RawExpr::Ident(w))
            }
            _ => None,
        }
    }

    /// Cursor is just past '('. Parses comma-separated arguments through the
    /// closing ')'. A single unparseable argument becomes `Opaque` without
    /// poisoning its siblings.
    fn parse_args(&mut self) -> Option<Vec<RawExpr>> {
        let mut args = Vec::new();
        if self.peek() == &Token::RParen {
            self.advance();
            return Some(args);
        }
        loop {
            args.push(self.parse_arg());
            match self.peek() {
                Token::Comma => self.advance(),
                Token::RParen => {
                    self.advance();
                    return Some(args);
                }
                _ => return None,
            }
        }
    }

    fn parse_arg(&mut self) -> RawExpr {
        let start = self.pos;
        if let Some(e) = self.try_expr() {
            if matches!(self.peek(), Token::Comma | Token::RParen) {
                return e;
            }
        }
        self.pos = start;
        self.consume_opaque();
        RawExpr::Opaque
    }

    /// Consume tokens up to (not including) a terminator at the current
    /// nesting depth.
    fn consume_opaque(&mut self) {
        let mut depth = 0i32;
        loop {
            match self.peek() {
                Token::Eof => return,
                Token::Semi | Token::Comma if depth == 0 => return,
                Token::RParen | Token::RBracket | Token::RBrace if depth == 0 => return,
                Token::LParen | Token::LBracket | Token::LBrace => {
                    depth += 1;
                    self.advance();
                }
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth -= 1;
                    self.advance();
                }
                _ => self.advance(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn class_of(src: &str) -> RawClass {
        let tokens = lex(src, "test.java").unwrap();
        parse_class(&tokens, "test.java").unwrap()
    }

    #[test]
    fn fields_and_initializers() {
        let c = class_of(
            "package x.y;\n\
             import a.b.C;\n\
             @Configurable\n\
             public class Paths {\n\
                 public static double org = 72.0;\n\
                 public static int step = -80;\n\
                 public PathChain Path1;\n\
             }",
        );
        assert_eq!(c.name, "Paths");
        assert_eq!(c.fields.len(), 3);
        assert_eq!(c.fields[0].name, "org");
        assert_eq!(c.fields[0].init, Some(RawExpr::Float(72.0)));
        assert_eq!(c.fields[1].init, Some(RawExpr::Int(-80)));
        assert!(c.fields[0].is_public_static());
        assert_eq!(c.fields[2].type_name, "PathChain");
        assert_eq!(c.fields[2].init, None);
        assert!(c.fields[2].is_public_instance());
    }

    #[test]
    fn constructor_calls_parse_into_invoke_chains() {
        let c = class_of(
            "class Paths {\n\
                 public Pose start;\n\
                 Paths(Follower f) {\n\
                     start = new Pose(org, org, 0);\n\
                     Path1 = f.pathBuilder().addPath(b1).build();\n\
                     int unrelated = 3 + 4;\n\
                 }\n\
             }",
        );
        assert_eq!(c.assigns.len(), 2);
        assert_eq!(
            c.assigns[0].expr,
            RawExpr::New {
                class: "Pose".into(),
                args: vec![
                    RawExpr::Ident("org".into()),
                    RawExpr::Ident("org".into()),
                    RawExpr::Int(0),
                ],
            }
        );
        match &c.assigns[1].expr {
            RawExpr::Invoke { method, .. } => assert_eq!(method, "build"),
            other => panic!("expected Invoke, got {:?}", other),
        }
    }

    #[test]
    fn arithmetic_initializer_becomes_opaque() {
        let c = class_of("class C { public static double a = 1 + 2; }");
        assert_eq!(c.fields[0].init, Some(RawExpr::Opaque));
    }

    #[test]
    fn opaque_argument_does_not_poison_siblings() {
        let c = class_of("class C { public static Pose p = new Pose(a * 2, b, 0); }");
        assert_eq!(
            c.fields[0].init,
            Some(RawExpr::New {
                class: "Pose".into(),
                args: vec![RawExpr::Opaque, RawExpr::Ident("b".into()), RawExpr::Int(0)],
            })
        );
    }

    #[test]
    fn methods_and_multi_declarators_are_skipped() {
        let c = class_of(
            "class C {\n\
                 public static double a = 1, b = 2;\n\
                 public void run() { while (true) { a = 0; } }\n\
                 public static double keep = 5.0;\n\
             }",
        );
        assert_eq!(c.fields.len(), 1);
        assert_eq!(c.fields[0].name, "keep");
        // assignments inside method bodies are not constructor assignments
        assert!(c.assigns.is_empty());
    }

    #[test]
    fn missing_class_is_a_parse_error() {
        let tokens = lex("int a = 3;", "test.java").unwrap();
        let err = parse_class(&tokens, "test.java").unwrap_err();
        assert!(err.message.contains("no class declaration"));
    }

    #[test]
    fn unbalanced_body_is_a_parse_error() {
        let tokens = lex("class C { public void f() {", "test.java").unwrap();
        assert!(parse_class(&tokens, "test.java").is_err());
    }

    #[test]
    fn this_qualified_assignment() {
        let c = class_of(
            "class C { C() { this.Path1 = f.pathBuilder().addPath(x).build(); } }",
        );
        assert_eq!(c.assigns.len(), 1);
        assert_eq!(c.assigns[0].name, "Path1");
    }
}
