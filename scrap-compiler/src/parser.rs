// Surface parser for the Scrap snippet language.
//
// Parses: using directives, namespace blocks, classes with fields,
// constructors and methods, statements (locals, assignment, return,
// if/else, while, unsafe blocks) and expressions.
// Does NOT parse: generics, inheritance, member access chains.

#[derive(Debug, Clone)]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub found: String,
    pub expected: String,
    pub source_line: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "syntax error in {}:{}:{}",
            self.file, self.line, self.column
        )?;
        writeln!(f, "    {}", self.source_line)?;
        writeln!(f, "    {}^", " ".repeat(self.column.saturating_sub(1)))?;
        write!(f, "expected '{}', got '{}'", self.expected, self.found)
    }
}

#[derive(Debug, Clone)]
struct SourceLocation {
    line: usize,
    column: usize,
}

#[derive(Debug, Clone)]
struct Token {
    text: String,
    location: SourceLocation,
}

// ---------------------------------------------------------------------------
// Surface AST
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Module {
    pub usings: Vec<UsingDecl>,
    pub classes: Vec<ClassDecl>,
}

#[derive(Debug, Clone)]
pub struct UsingDecl {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub namespace: Option<String>,
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub ctors: Vec<CtorDecl>,
    pub methods: Vec<MethodDecl>,
    pub line: usize,
}

impl ClassDecl {
    /// Namespace-qualified name, e.g. "Demo.W".
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: String,
    pub init: Option<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct CtorDecl {
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub ret: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub is_static: bool,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    // name, declared type (None for `var`), initializer
    Local(String, Option<String>, Expr, usize),
    Assign(String, Expr, usize),
    Expr(Expr),
    Return(Option<Expr>, usize),
    If(Expr, Vec<Stmt>, Vec<Stmt>),
    While(Expr, Vec<Stmt>),
    Unsafe(Vec<Stmt>, usize),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Int(i64),
    Bool(bool),
    Str(String),
    Ident(String, usize),
    Index(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>, usize),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source: String,
    file: String,
}

pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    parse_module_with_file(source, "<snippet>")
}

pub fn parse_module_with_file(source: &str, file: &str) -> Result<Module, ParseError> {
    let tokens = tokenize_with_location(source);
    let mut parser = Parser {
        tokens,
        pos: 0,
        source: source.to_string(),
        file: file.to_string(),
    };
    parser.parse_module()
}

impl Parser {
    fn parse_module(&mut self) -> Result<Module, ParseError> {
        let mut usings = Vec::new();
        let mut classes = Vec::new();

        while self.pos < self.tokens.len() {
            match self.peek_text() {
                "using" => usings.push(self.parse_using()?),
                "namespace" => self.parse_namespace(&mut classes)?,
                "public" | "static" | "class" => classes.push(self.parse_class(None)?),
                found => {
                    let found = found.to_string();
                    return self.error("using, namespace, or class declaration", &found);
                }
            }
        }

        Ok(Module { usings, classes })
    }

    fn parse_using(&mut self) -> Result<UsingDecl, ParseError> {
        let line = self.current_line();
        self.expect_token("using")?;
        let name = self.consume_qualified_name()?;
        self.expect_token(";")?;
        Ok(UsingDecl { name, line })
    }

    fn parse_namespace(&mut self, classes: &mut Vec<ClassDecl>) -> Result<(), ParseError> {
        self.expect_token("namespace")?;
        let name = self.consume_qualified_name()?;
        self.expect_token("{")?;
        while self.pos < self.tokens.len() && self.peek_text() != "}" {
            classes.push(self.parse_class(Some(name.clone()))?);
        }
        self.expect_token("}")?;
        Ok(())
    }

    fn parse_class(&mut self, namespace: Option<String>) -> Result<ClassDecl, ParseError> {
        let line = self.current_line();
        self.parse_modifiers();
        self.expect_token("class")?;
        let name = self.consume_identifier("class name")?;
        self.expect_token("{")?;

        let mut fields = Vec::new();
        let mut ctors = Vec::new();
        let mut methods = Vec::new();

        while self.pos < self.tokens.len() && self.peek_text() != "}" {
            let member_line = self.current_line();
            let is_static = self.parse_modifiers();

            // Constructor: member named after the class, parameter list next.
            if self.peek_text() == name && self.peek_ahead(1) == "(" {
                self.pos += 1; // class-name token
                let params = self.parse_params()?;
                let body = self.parse_block()?;
                ctors.push(CtorDecl {
                    params,
                    body,
                    line: member_line,
                });
                continue;
            }

            let ty = self.parse_type()?;
            let member_name = self.consume_identifier("member name")?;

            if self.peek_text() == "(" {
                let params = self.parse_params()?;
                let body = self.parse_block()?;
                methods.push(MethodDecl {
                    name: member_name,
                    ret: ty,
                    params,
                    body,
                    is_static,
                    line: member_line,
                });
            } else {
                let init = if self.peek_text() == "=" {
                    self.pos += 1;
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect_token(";")?;
                fields.push(FieldDecl {
                    name: member_name,
                    ty,
                    init,
                    line: member_line,
                });
            }
        }

        self.expect_token("}")?;
        Ok(ClassDecl {
            namespace,
            name,
            fields,
            ctors,
            methods,
            line,
        })
    }

    // Consume leading `public` / `static` modifiers; report whether
    // `static` was among them.
    fn parse_modifiers(&mut self) -> bool {
        let mut is_static = false;
        while self.pos < self.tokens.len() {
            match self.peek_text() {
                "public" => self.pos += 1,
                "static" => {
                    is_static = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        is_static
    }

    // Type names are a bare identifier optionally followed by `[]`.
    // Unknown names are accepted here; the checker reports them.
    fn parse_type(&mut self) -> Result<String, ParseError> {
        let mut ty = self.consume_identifier("type name")?;
        if self.peek_text() == "[" && self.peek_ahead(1) == "]" {
            self.pos += 2;
            ty.push_str("[]");
        }
        Ok(ty)
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect_token("(")?;
        let mut params = Vec::new();
        while self.pos < self.tokens.len() && self.peek_text() != ")" {
            let ty = self.parse_type()?;
            let name = self.consume_identifier("parameter name")?;
            params.push(Param { name, ty });
            if self.peek_text() == "," {
                self.pos += 1;
            }
        }
        self.expect_token(")")?;
        Ok(params)
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect_token("{")?;
        let mut stmts = Vec::new();
        while self.pos < self.tokens.len() && self.peek_text() != "}" {
            stmts.push(self.parse_stmt()?);
        }
        self.expect_token("}")?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let line = self.current_line();
        match self.peek_text() {
            "var" => {
                self.pos += 1;
                let name = self.consume_identifier("local name")?;
                self.expect_token("=")?;
                let init = self.parse_expr()?;
                self.expect_token(";")?;
                Ok(Stmt::Local(name, None, init, line))
            }
            "int" | "bool" | "string" => {
                let ty = self.parse_type()?;
                let name = self.consume_identifier("local name")?;
                self.expect_token("=")?;
                let init = self.parse_expr()?;
                self.expect_token(";")?;
                Ok(Stmt::Local(name, Some(ty), init, line))
            }
            "return" => {
                self.pos += 1;
                let value = if self.peek_text() == ";" {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect_token(";")?;
                Ok(Stmt::Return(value, line))
            }
            "if" => self.parse_if(),
            "while" => {
                self.pos += 1;
                self.expect_token("(")?;
                let cond = self.parse_expr()?;
                self.expect_token(")")?;
                let body = self.parse_block()?;
                Ok(Stmt::While(cond, body))
            }
            "unsafe" => {
                self.pos += 1;
                let body = self.parse_block()?;
                Ok(Stmt::Unsafe(body, line))
            }
            _ => {
                // `name = expr;` is an assignment; anything else is an
                // expression statement.
                if self.is_identifier_at(self.pos) && self.peek_ahead(1) == "=" {
                    let name = self.consume_identifier("assignment target")?;
                    self.expect_token("=")?;
                    let value = self.parse_expr()?;
                    self.expect_token(";")?;
                    Ok(Stmt::Assign(name, value, line))
                } else {
                    let expr = self.parse_expr()?;
                    self.expect_token(";")?;
                    Ok(Stmt::Expr(expr))
                }
            }
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.expect_token("if")?;
        self.expect_token("(")?;
        let cond = self.parse_expr()?;
        self.expect_token(")")?;
        let then_body = self.parse_block()?;

        let else_body = if self.peek_text() == "else" {
            self.pos += 1;
            if self.peek_text() == "if" {
                vec![self.parse_if()?]
            } else {
                self.parse_block()?
            }
        } else {
            Vec::new()
        };

        Ok(Stmt::If(cond, then_body, else_body))
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_and_expr()?;
        while self.peek_text() == "||" {
            self.pos += 1;
            let rhs = self.parse_and_expr()?;
            expr = Expr::Binary(BinOp::Or, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_equality_expr()?;
        while self.peek_text() == "&&" {
            self.pos += 1;
            let rhs = self.parse_equality_expr()?;
            expr = Expr::Binary(BinOp::And, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_comparison_expr()?;
        loop {
            let op = match self.peek_text() {
                "==" => BinOp::Eq,
                "!=" => BinOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_comparison_expr()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_comparison_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_additive_expr()?;
        loop {
            let op = match self.peek_text() {
                "<" => BinOp::Lt,
                "<=" => BinOp::Le,
                ">" => BinOp::Gt,
                ">=" => BinOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_additive_expr()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.peek_text() {
                "+" => BinOp::Add,
                "-" => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative_expr()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_unary_expr()?;
        loop {
            let op = match self.peek_text() {
                "*" => BinOp::Mul,
                "/" => BinOp::Div,
                "%" => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary_expr()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, ParseError> {
        match self.peek_text() {
            "!" => {
                self.pos += 1;
                let inner = self.parse_unary_expr()?;
                Ok(Expr::Unary(UnOp::Not, Box::new(inner)))
            }
            "-" => {
                self.pos += 1;
                let inner = self.parse_unary_expr()?;
                Ok(Expr::Unary(UnOp::Neg, Box::new(inner)))
            }
            _ => self.parse_postfix_expr(),
        }
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary_expr()?;
        while self.peek_text() == "[" {
            self.pos += 1;
            let index = self.parse_expr()?;
            self.expect_token("]")?;
            expr = Expr::Index(Box::new(expr), Box::new(index));
        }
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, ParseError> {
        if self.pos >= self.tokens.len() {
            return self.error("expression", "EOF");
        }
        let line = self.current_line();
        let text = self.peek_text().to_string();

        if text == "(" {
            self.pos += 1;
            let expr = self.parse_expr()?;
            self.expect_token(")")?;
            return Ok(expr);
        }

        if text.starts_with('"') {
            self.pos += 1;
            if text.len() < 2 || !text.ends_with('"') {
                return self.error("closing '\"'", "end of string literal");
            }
            return Ok(Expr::Str(unescape_string(&text[1..text.len() - 1])));
        }

        if text.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
            return match text.parse::<i64>() {
                Ok(n) => Ok(Expr::Int(n)),
                Err(_) => self.error("integer literal", &text),
            };
        }

        match text.as_str() {
            "true" => {
                self.pos += 1;
                Ok(Expr::Bool(true))
            }
            "false" => {
                self.pos += 1;
                Ok(Expr::Bool(false))
            }
            _ => {
                if !self.is_identifier_at(self.pos) {
                    return self.error("expression", &text);
                }
                self.pos += 1;
                if self.peek_text() == "(" {
                    self.pos += 1;
                    let mut args = Vec::new();
                    while self.pos < self.tokens.len() && self.peek_text() != ")" {
                        args.push(self.parse_expr()?);
                        if self.peek_text() == "," {
                            self.pos += 1;
                        }
                    }
                    self.expect_token(")")?;
                    Ok(Expr::Call(text, args, line))
                } else {
                    Ok(Expr::Ident(text, line))
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Token helpers
    // -----------------------------------------------------------------------

    fn peek_text(&self) -> &str {
        if self.pos < self.tokens.len() {
            &self.tokens[self.pos].text
        } else {
            ""
        }
    }

    fn peek_ahead(&self, offset: usize) -> &str {
        if self.pos + offset < self.tokens.len() {
            &self.tokens[self.pos + offset].text
        } else {
            ""
        }
    }

    fn current_line(&self) -> usize {
        if self.pos < self.tokens.len() {
            self.tokens[self.pos].location.line
        } else {
            self.tokens.last().map(|t| t.location.line).unwrap_or(1)
        }
    }

    fn is_identifier_at(&self, pos: usize) -> bool {
        if pos >= self.tokens.len() {
            return false;
        }
        let text = &self.tokens[pos].text;
        text.chars()
            .next()
            .map(|c| c.is_alphabetic() || c == '_')
            .unwrap_or(false)
            && !is_keyword(text)
    }

    fn consume_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        if !self.is_identifier_at(self.pos) {
            let found = self.peek_text().to_string();
            let found = if found.is_empty() { "EOF".to_string() } else { found };
            return self.error(expected, &found);
        }
        let text = self.tokens[self.pos].text.clone();
        self.pos += 1;
        Ok(text)
    }

    // Dotted identifier path like "System.IO".
    fn consume_qualified_name(&mut self) -> Result<String, ParseError> {
        let mut parts = vec![self.consume_identifier("name")?];
        while self.peek_text() == "." {
            self.pos += 1;
            parts.push(self.consume_identifier("identifier after '.'")?);
        }
        Ok(parts.join("."))
    }

    fn expect_token(&mut self, expected: &str) -> Result<(), ParseError> {
        if self.pos >= self.tokens.len() {
            return self.error(expected, "EOF");
        }
        if self.tokens[self.pos].text == expected {
            self.pos += 1;
            Ok(())
        } else {
            let found = self.tokens[self.pos].text.clone();
            self.error(expected, &found)
        }
    }

    fn error<T>(&self, expected: &str, found: &str) -> Result<T, ParseError> {
        let (line, column, source_line) = if self.pos < self.tokens.len() {
            let token = &self.tokens[self.pos];
            (
                token.location.line,
                token.location.column,
                self.get_source_line(token.location.line),
            )
        } else if let Some(last_token) = self.tokens.last() {
            (
                last_token.location.line,
                last_token.location.column + last_token.text.len(),
                self.get_source_line(last_token.location.line),
            )
        } else {
            (1, 1, "<empty snippet>".to_string())
        };

        Err(ParseError {
            file: self.file.clone(),
            line,
            column,
            found: found.to_string(),
            expected: expected.to_string(),
            source_line,
        })
    }

    fn get_source_line(&self, line_num: usize) -> String {
        self.source
            .lines()
            .nth(line_num.saturating_sub(1))
            .unwrap_or("<line not found>")
            .to_string()
    }
}

fn is_keyword(text: &str) -> bool {
    matches!(
        text,
        "using"
            | "namespace"
            | "class"
            | "public"
            | "static"
            | "var"
            | "return"
            | "if"
            | "else"
            | "while"
            | "unsafe"
            | "true"
            | "false"
    )
}

// Unescape string literal bodies: \n, \t, \r, \\, \", \0.
fn unescape_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('0') => result.push('\0'),
                Some(other) => {
                    // Unknown escape sequence - keep as is
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

fn tokenize_with_location(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;
    let mut column = 1;

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
            chars.next();
        } else if ch == '/' && chars.clone().nth(1) == Some('/') {
            // Skip line comment
            while let Some(c) = chars.next() {
                if c == '\n' {
                    line += 1;
                    column = 1;
                    break;
                }
                column += 1;
            }
        } else if ch.is_alphabetic() || ch == '_' {
            let start_column = column;
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    ident.push(chars.next().unwrap());
                    column += 1;
                } else {
                    break;
                }
            }
            tokens.push(Token {
                text: ident,
                location: SourceLocation {
                    line,
                    column: start_column,
                },
            });
        } else if ch.is_ascii_digit() {
            let start_column = column;
            let mut num = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    num.push(chars.next().unwrap());
                    column += 1;
                } else {
                    break;
                }
            }
            tokens.push(Token {
                text: num,
                location: SourceLocation {
                    line,
                    column: start_column,
                },
            });
        } else if let Some(two) = two_char_op(ch, chars.clone().nth(1)) {
            let start_column = column;
            chars.next();
            chars.next();
            column += 2;
            tokens.push(Token {
                text: two.to_string(),
                location: SourceLocation {
                    line,
                    column: start_column,
                },
            });
        } else if ch == '"' {
            let start_column = column;
            let start_line = line;
            chars.next(); // consume opening quote
            column += 1;
            let mut string_literal = String::new();
            string_literal.push('"');

            while let Some(&c) = chars.peek() {
                if c == '"' {
                    string_literal.push(chars.next().unwrap());
                    column += 1;
                    break;
                } else if c == '\\' {
                    string_literal.push(chars.next().unwrap());
                    column += 1;
                    if chars.peek().is_some() {
                        string_literal.push(chars.next().unwrap());
                        column += 1;
                    }
                } else {
                    string_literal.push(chars.next().unwrap());
                    if c == '\n' {
                        line += 1;
                        column = 1;
                    } else {
                        column += 1;
                    }
                }
            }

            tokens.push(Token {
                text: string_literal,
                location: SourceLocation {
                    line: start_line,
                    column: start_column,
                },
            });
        } else if "(){}[],.;=+-*/%<>!".contains(ch) {
            let start_column = column;
            let tok = chars.next().unwrap().to_string();
            column += 1;
            tokens.push(Token {
                text: tok,
                location: SourceLocation {
                    line,
                    column: start_column,
                },
            });
        } else {
            chars.next(); // skip unknown char
            column += 1;
        }
    }

    tokens
}

fn two_char_op(first: char, second: Option<char>) -> Option<&'static str> {
    match (first, second) {
        ('=', Some('=')) => Some("=="),
        ('!', Some('=')) => Some("!="),
        ('<', Some('=')) => Some("<="),
        ('>', Some('=')) => Some(">="),
        ('&', Some('&')) => Some("&&"),
        ('|', Some('|')) => Some("||"),
        _ => None,
    }
}
