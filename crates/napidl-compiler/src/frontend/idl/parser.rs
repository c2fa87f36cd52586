//! Recursive-descent parser for the supported WebIDL subset.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::lexer::{tokenize, Token, TokenKind};
use crate::diagnostic::{CompilerError, Span};
use crate::frontend::ast::*;

/// Member keywords the generator does not bind. They are skipped up to the
/// terminating `;`.
const SKIPPED_MEMBERS: &[&str] = &[
    "const",
    "stringifier",
    "iterable",
    "async",
    "maplike",
    "setlike",
    "getter",
    "setter",
    "deleter",
    "inherit",
];

/// Scalar type names that may be followed by further keywords.
const MULTI_WORD_PREFIXES: &[&str] = &["unsigned", "unrestricted", "long"];

/// Parses a complete WebIDL document.
pub fn parse_document(source: &str, path: &Path) -> Result<Vec<Definition>, CompilerError> {
    let tokens = tokenize(source).map_err(|e| CompilerError::SyntaxError {
        message: e.message,
        file: path.to_path_buf(),
        line: e.span.line,
        column: e.span.column,
    })?;

    let mut parser = Parser::new(tokens, path);
    parser.parse_definitions()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    path: PathBuf,
}

impl Parser {
    fn new(tokens: Vec<Token>, path: &Path) -> Self {
        Self {
            tokens,
            pos: 0,
            path: path.to_path_buf(),
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        &self.tokens[(self.pos + ahead).min(self.tokens.len() - 1)].kind
    }

    fn span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn error(&self, message: impl Into<String>) -> CompilerError {
        let span = self.span();
        CompilerError::SyntaxError {
            message: message.into(),
            file: self.path.clone(),
            line: span.line,
            column: span.column,
        }
    }

    fn describe(kind: &TokenKind) -> String {
        match kind {
            TokenKind::Ident(s) => format!("'{}'", s),
            TokenKind::String(s) => format!("string \"{}\"", s),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Punct(c) => format!("'{}'", c),
            TokenKind::Ellipsis => "'...'".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(s) if s == keyword)
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == &TokenKind::Punct(c)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.is_punct(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<(), CompilerError> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{}', found {}",
                c,
                Self::describe(self.peek())
            )))
        }
    }

    fn expect_ident(&mut self) -> Result<String, CompilerError> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name.trim_start_matches('_').to_string())
            }
            other => Err(self.error(format!(
                "expected identifier, found {}",
                Self::describe(&other)
            ))),
        }
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    fn parse_definitions(&mut self) -> Result<Vec<Definition>, CompilerError> {
        let mut definitions = Vec::new();
        while self.peek() != &TokenKind::Eof {
            let ext_attrs = self.parse_ext_attrs()?;
            definitions.push(self.parse_definition(ext_attrs)?);
        }
        Ok(definitions)
    }

    fn parse_definition(&mut self, ext_attrs: Vec<ExtAttr>) -> Result<Definition, CompilerError> {
        let partial = self.eat_keyword("partial");

        let definition = match self.peek().clone() {
            TokenKind::Ident(kw) if kw == "interface" => {
                self.advance();
                if self.eat_keyword("mixin") {
                    let name = self.expect_ident()?;
                    let members = self.parse_interface_body()?;
                    Definition::Mixin(MixinDecl {
                        name,
                        partial,
                        members,
                    })
                } else {
                    let name = self.expect_ident()?;
                    let inheritance = self.parse_inheritance()?;
                    let members = self.parse_interface_body()?;
                    Definition::Interface(InterfaceDecl {
                        name,
                        partial,
                        inheritance,
                        members,
                        ext_attrs,
                    })
                }
            }
            TokenKind::Ident(kw) if kw == "dictionary" => {
                self.advance();
                let name = self.expect_ident()?;
                let inheritance = self.parse_inheritance()?;
                let members = self.parse_dictionary_body()?;
                Definition::Dictionary(DictionaryDecl {
                    name,
                    partial,
                    inheritance,
                    members,
                })
            }
            TokenKind::Ident(kw) if kw == "enum" && !partial => {
                self.advance();
                let name = self.expect_ident()?;
                let values = self.parse_enum_body()?;
                Definition::Enum(EnumDecl { name, values })
            }
            TokenKind::Ident(kw) if kw == "typedef" && !partial => {
                self.advance();
                self.parse_ext_attrs()?;
                let idl_type = self.parse_type()?;
                let name = self.expect_ident()?;
                Definition::Typedef(TypedefDecl { name, idl_type })
            }
            TokenKind::Ident(kw) if kw == "callback" || kw == "namespace" => {
                return Err(self.error(format!("'{}' definitions are not supported", kw)));
            }
            TokenKind::Ident(_) if !partial && self.peek_at(1) == &TokenKind::Ident("includes".to_string()) => {
                let target = self.expect_ident()?;
                self.advance();
                let includes = self.expect_ident()?;
                Definition::Includes(IncludesDecl { target, includes })
            }
            other => {
                return Err(self.error(format!(
                    "expected a definition, found {}",
                    Self::describe(&other)
                )))
            }
        };

        self.expect_punct(';')?;
        Ok(definition)
    }

    fn parse_inheritance(&mut self) -> Result<Option<String>, CompilerError> {
        if self.eat_punct(':') {
            Ok(Some(self.expect_ident()?))
        } else {
            Ok(None)
        }
    }

    fn parse_interface_body(&mut self) -> Result<Vec<Member>, CompilerError> {
        self.expect_punct('{')?;
        let mut members = Vec::new();
        while !self.eat_punct('}') {
            let ext_attrs = self.parse_ext_attrs()?;
            if let Some(member) = self.parse_member(ext_attrs)? {
                members.push(member);
            }
        }
        Ok(members)
    }

    fn parse_member(&mut self, ext_attrs: Vec<ExtAttr>) -> Result<Option<Member>, CompilerError> {
        if let TokenKind::Ident(kw) = self.peek().clone() {
            if SKIPPED_MEMBERS.contains(&kw.as_str()) {
                let span = self.span();
                self.skip_member()?;
                warn!(member = %kw, at = %span, "skipping unsupported interface member");
                return Ok(None);
            }
        }

        if self.eat_keyword("constructor") {
            let arguments = self.parse_argument_list()?;
            self.expect_punct(';')?;
            return Ok(Some(Member::Constructor(Constructor {
                arguments,
                ext_attrs,
            })));
        }

        let special = if self.eat_keyword("static") {
            Special::Static
        } else {
            Special::None
        };

        let readonly = self.eat_keyword("readonly");
        if readonly || self.is_keyword("attribute") {
            if !self.eat_keyword("attribute") {
                return Err(self.error("expected 'attribute' after 'readonly'"));
            }
            let idl_type = self.parse_type()?;
            let name = self.expect_ident()?;
            self.expect_punct(';')?;
            return Ok(Some(Member::Attribute(Attribute {
                name,
                idl_type,
                readonly,
                special,
                ext_attrs,
            })));
        }

        let return_type = self.parse_type()?;
        let name = match self.peek() {
            TokenKind::Ident(_) => self.expect_ident()?,
            _ => return Err(self.error("anonymous special operations are not supported")),
        };
        let arguments = self.parse_argument_list()?;
        self.expect_punct(';')?;

        Ok(Some(Member::Operation(Operation {
            name,
            arguments,
            return_type: if return_type.is_undefined() {
                None
            } else {
                Some(return_type)
            },
            special,
            ext_attrs,
        })))
    }

    /// Skips tokens up to and including the `;` that ends the current member.
    fn skip_member(&mut self) -> Result<(), CompilerError> {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                TokenKind::Punct('(' | '{' | '[' | '<') => depth += 1,
                TokenKind::Punct(')' | '}' | ']' | '>') => depth = depth.saturating_sub(1),
                TokenKind::Punct(';') if depth == 0 => return Ok(()),
                TokenKind::Eof => return Err(self.error("unexpected end of input in member")),
                _ => {}
            }
        }
    }

    fn parse_dictionary_body(&mut self) -> Result<Vec<Field>, CompilerError> {
        self.expect_punct('{')?;
        let mut members = Vec::new();
        while !self.eat_punct('}') {
            self.parse_ext_attrs()?;
            let required = self.eat_keyword("required");
            self.parse_ext_attrs()?;
            let idl_type = self.parse_type()?;
            let name = self.expect_ident()?;
            let default = if self.eat_punct('=') {
                Some(self.parse_default_value()?)
            } else {
                None
            };
            self.expect_punct(';')?;
            members.push(Field {
                name,
                idl_type,
                required,
                default,
            });
        }
        Ok(members)
    }

    fn parse_enum_body(&mut self) -> Result<Vec<String>, CompilerError> {
        self.expect_punct('{')?;
        let mut values = Vec::new();
        loop {
            match self.advance() {
                TokenKind::String(value) => values.push(value),
                TokenKind::Punct('}') if !values.is_empty() => break,
                other => {
                    return Err(self.error(format!(
                        "expected enum value string, found {}",
                        Self::describe(&other)
                    )))
                }
            }
            if !self.eat_punct(',') {
                self.expect_punct('}')?;
                break;
            }
            // Trailing comma.
            if self.eat_punct('}') {
                break;
            }
        }
        Ok(values)
    }

    // =========================================================================
    // Arguments, types and values
    // =========================================================================

    fn parse_argument_list(&mut self) -> Result<Vec<Argument>, CompilerError> {
        self.expect_punct('(')?;
        let mut arguments = Vec::new();
        if self.eat_punct(')') {
            return Ok(arguments);
        }
        loop {
            self.parse_ext_attrs()?;
            let optional = self.eat_keyword("optional");
            let idl_type = self.parse_type()?;
            let variadic = self.peek() == &TokenKind::Ellipsis;
            if variadic {
                self.advance();
            }
            let name = self.expect_ident()?;
            let default = if optional && self.eat_punct('=') {
                Some(self.parse_default_value()?)
            } else {
                None
            };
            arguments.push(Argument {
                name,
                idl_type,
                optional: optional || variadic,
                variadic,
                default,
            });
            if !self.eat_punct(',') {
                break;
            }
        }
        self.expect_punct(')')?;
        Ok(arguments)
    }

    fn parse_type(&mut self) -> Result<IdlType, CompilerError> {
        self.parse_ext_attrs()?;

        if self.eat_punct('(') {
            let mut parts = vec![self.parse_type()?.to_string()];
            while self.eat_keyword("or") {
                parts.push(self.parse_type()?.to_string());
            }
            self.expect_punct(')')?;
            let mut text = format!("({})", parts.join(" or "));
            if self.eat_punct('?') {
                text.push('?');
            }
            return Ok(IdlType::Scalar(text));
        }

        let mut name = match self.advance() {
            TokenKind::Ident(word) => word,
            other => {
                return Err(self.error(format!(
                    "expected type, found {}",
                    Self::describe(&other)
                )))
            }
        };

        if MULTI_WORD_PREFIXES.contains(&name.as_str()) {
            while let TokenKind::Ident(next) = self.peek().clone() {
                if matches!(next.as_str(), "short" | "long" | "float" | "double") {
                    self.advance();
                    name.push(' ');
                    name.push_str(&next);
                } else {
                    break;
                }
            }
        }

        let mut idl_type = if self.eat_punct('<') {
            let inner = self.parse_type()?;
            let mut extra = Vec::new();
            while self.eat_punct(',') {
                extra.push(self.parse_type()?.to_string());
            }
            self.expect_punct('>')?;
            if extra.is_empty() {
                IdlType::generic(name, inner)
            } else {
                IdlType::Scalar(format!("{}<{}, {}>", name, inner, extra.join(", ")))
            }
        } else {
            IdlType::Scalar(name)
        };

        if self.eat_punct('?') {
            idl_type = IdlType::Scalar(format!("{}?", idl_type));
        }
        Ok(idl_type)
    }

    fn parse_default_value(&mut self) -> Result<String, CompilerError> {
        match self.advance() {
            TokenKind::String(s) => Ok(format!("\"{}\"", s)),
            TokenKind::Number(n) => Ok(n),
            TokenKind::Ident(word) => Ok(word),
            TokenKind::Punct('-') => match self.advance() {
                TokenKind::Ident(word) => Ok(format!("-{}", word)),
                other => Err(self.error(format!(
                    "expected default value, found {}",
                    Self::describe(&other)
                ))),
            },
            TokenKind::Punct('[') => {
                self.expect_punct(']')?;
                Ok("[]".to_string())
            }
            TokenKind::Punct('{') => {
                self.expect_punct('}')?;
                Ok("{}".to_string())
            }
            other => Err(self.error(format!(
                "expected default value, found {}",
                Self::describe(&other)
            ))),
        }
    }

    fn parse_ext_attrs(&mut self) -> Result<Vec<ExtAttr>, CompilerError> {
        let mut attrs = Vec::new();
        if !self.eat_punct('[') {
            return Ok(attrs);
        }
        loop {
            let name = self.expect_ident()?;
            let mut value = None;
            if self.eat_punct('=') {
                value = Some(self.collect_ext_attr_value()?);
            } else if self.is_punct('(') {
                value = Some(self.collect_ext_attr_value()?);
            }
            attrs.push(ExtAttr { name, value });
            if !self.eat_punct(',') {
                break;
            }
        }
        self.expect_punct(']')?;
        Ok(attrs)
    }

    /// Collects the raw text of an extended attribute's right-hand side.
    fn collect_ext_attr_value(&mut self) -> Result<String, CompilerError> {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.peek().clone() {
                TokenKind::Punct(',' | ']') if depth == 0 => return Ok(text),
                TokenKind::Eof => return Err(self.error("unterminated extended attribute")),
                kind => {
                    self.advance();
                    match &kind {
                        TokenKind::Punct('(') => depth += 1,
                        TokenKind::Punct(')') => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    match kind {
                        TokenKind::Ident(s) | TokenKind::Number(s) => {
                            if text.ends_with(|c: char| c.is_alphanumeric()) {
                                text.push(' ');
                            }
                            text.push_str(&s);
                        }
                        TokenKind::String(s) => text.push_str(&format!("\"{}\"", s)),
                        TokenKind::Punct(c) => text.push(c),
                        TokenKind::Ellipsis => text.push_str("..."),
                        TokenKind::Eof => {}
                    }
                }
            }
        }
    }
}
