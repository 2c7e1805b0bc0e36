//! Recovering recursive-descent parser from tokens to the module arena.
//!
//! The parser never fails: problems become diagnostics and recovery skips
//! to the next statement boundary. Newlines are statement separators at
//! statement level and transparent inside parentheses and brackets; the
//! cursor tracks that nesting so expression rules never see a separator
//! they should ignore.
//!
//! Loose top-level statements are wrapped into a synthetic script class
//! with a synthetic `run` method, mirroring how the Groovy front end
//! shapes scripts. The wrappers carry the statements' real range but are
//! flagged synthetic, so the relationship tracker descends through them
//! without recording them.

use crate::budget::ParseBudget;
use crate::diagnostics::Diagnostic;
use groovy_ast::{
    ClassKind, ConstantValue, Modifiers, ModuleAst, NodeId, NodeKind, Visibility,
};
use groovy_lexer::{Token, TokenKind};
use groovy_position::{LineColumn, Range, SourceRange};

/// Output of one descent over the token stream.
#[derive(Debug)]
pub struct ParsedModule {
    /// Absent only when the token stream was unusable from the start.
    pub ast: Option<ModuleAst>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Paren/bracket nesting depth; newlines are skipped while positive.
    transparent: u32,
    ast: ModuleAst,
    diagnostics: Vec<Diagnostic>,
    budget: ParseBudget,
    depth: usize,
    recoveries: usize,
    script_name: String,
    last_end: LineColumn,
}

impl Parser {
    pub fn new(source: &str, script_name: &str, budget: ParseBudget) -> Self {
        Self {
            tokens: groovy_lexer::tokenize(source),
            pos: 0,
            transparent: 0,
            ast: ModuleAst::new(),
            diagnostics: Vec::new(),
            budget,
            depth: 0,
            recoveries: 0,
            script_name: script_name.to_string(),
            last_end: LineColumn::new(1, 1),
        }
    }

    pub fn parse(mut self) -> ParsedModule {
        let module_start = LineColumn::new(1, 1);
        let mut package = None;
        let mut imports = Vec::new();
        let mut classes = Vec::new();
        let mut script_statements = Vec::new();
        let mut script_methods = Vec::new();

        self.skip_separators();
        if self.peek().is_keyword("package") {
            package = self.parse_package();
            self.skip_separators();
        }
        while self.peek().is_keyword("import") {
            if let Some(import) = self.parse_import() {
                imports.push(import);
            }
            self.skip_separators();
        }

        while !self.peek().is_eof() && !self.errors_exhausted() {
            self.skip_separators();
            if self.peek().is_eof() {
                break;
            }
            if self.peek().is_keyword("import") {
                // Imports after other code still count; Groovy allows them.
                if let Some(import) = self.parse_import() {
                    imports.push(import);
                }
                continue;
            }
            if self.at_class_declaration() {
                if let Some(class) = self.parse_class_declaration() {
                    classes.push(class);
                }
            } else if self.at_script_method() {
                if let Some(method) = self.parse_script_method() {
                    script_methods.push(method);
                }
            } else {
                let before = self.pos;
                self.parse_statement(&mut script_statements);
                if self.pos == before {
                    // No progress; drop the offending token to guarantee
                    // termination.
                    self.advance();
                }
            }
        }

        if !script_statements.is_empty() || !script_methods.is_empty() {
            classes.push(self.wrap_script(&script_statements, script_methods));
        }

        let module_range = SourceRange::new(module_start, self.eof_end());
        let module = self.ast.alloc(
            NodeKind::Module { package, imports, classes },
            module_range,
        );
        self.ast.set_root(module);

        ParsedModule { ast: Some(self.ast), diagnostics: self.diagnostics }
    }

    // ------------------------------------------------------------------
    // cursor
    // ------------------------------------------------------------------

    fn significant_index(&self) -> usize {
        let mut i = self.pos;
        if self.transparent > 0 {
            while i < self.tokens.len() && self.tokens[i].is_newline() {
                i += 1;
            }
        }
        i.min(self.tokens.len() - 1)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.significant_index()]
    }

    /// The significant token after the current one.
    fn peek2(&self) -> &Token {
        let mut i = self.significant_index() + 1;
        if self.transparent > 0 {
            while i < self.tokens.len() && self.tokens[i].is_newline() {
                i += 1;
            }
        }
        &self.tokens[i.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let idx = self.significant_index();
        let token = self.tokens[idx].clone();
        if !token.is_eof() {
            self.pos = idx + 1;
            self.last_end = token.end;
        }
        token
    }

    fn eof_end(&self) -> LineColumn {
        self.tokens.last().map(|t| t.end).unwrap_or(LineColumn::new(1, 1))
    }

    fn prev_end(&self) -> LineColumn {
        self.last_end
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        )
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.peek().is_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_operator(&mut self, spelling: &str) -> bool {
        if self.peek().is_operator(spelling) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Option<Token> {
        if std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind) {
            Some(self.advance())
        } else {
            let message = format!("expected {what}, found '{}'", self.describe_peek());
            self.error_here(message);
            None
        }
    }

    fn describe_peek(&self) -> String {
        let token = self.peek();
        match &token.kind {
            TokenKind::Eof => "<eof>".to_string(),
            TokenKind::Newline => "<newline>".to_string(),
            _ => token.text.to_string(),
        }
    }

    // ------------------------------------------------------------------
    // diagnostics & recovery
    // ------------------------------------------------------------------

    fn errors_exhausted(&self) -> bool {
        self.diagnostics.len() >= self.budget.max_errors
            || self.recoveries >= self.budget.max_recoveries
    }

    fn token_editor_range(token: &Token) -> Range {
        SourceRange::new(token.start, token.end).to_editor().unwrap_or_default()
    }

    fn error_here(&mut self, message: String) {
        if self.diagnostics.len() >= self.budget.max_errors {
            return;
        }
        let range = Self::token_editor_range(self.peek());
        self.diagnostics.push(Diagnostic::error(range, message));
    }

    /// Skips to the next statement boundary without consuming it (except
    /// that a closing brace is left for the enclosing rule).
    fn recover_to_statement(&mut self) {
        self.recoveries += 1;
        loop {
            match self.peek().kind {
                TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::RightBrace
                | TokenKind::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn enter(&mut self) -> bool {
        self.depth += 1;
        if self.depth > self.budget.max_depth {
            self.error_here("nesting too deep".to_string());
            false
        } else {
            true
        }
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Fallback node for positions where an expression was required but
    /// none could be parsed.
    fn error_expr(&mut self, at: LineColumn) -> NodeId {
        self.ast.alloc_synthetic(
            NodeKind::Constant { value: ConstantValue::Null },
            SourceRange::new(at, at),
        )
    }

    // ------------------------------------------------------------------
    // module structure
    // ------------------------------------------------------------------

    fn parse_package(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        self.advance();
        let (name, _) = self.parse_dotted_name()?;
        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(NodeKind::Package { name }, range))
    }

    fn parse_import(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        self.advance();
        let is_static = self.eat_keyword("static");
        let (name, _) = self.parse_dotted_name()?;
        let mut is_star = false;
        if self.peek().kind == TokenKind::Dot && self.peek2().is_operator("*") {
            self.advance();
            self.advance();
            is_star = true;
        }
        let mut alias = None;
        if self.eat_keyword("as") {
            if let Some(token) = self.expect(&TokenKind::Identifier, "import alias") {
                alias = Some(token.text.to_string());
            }
        }
        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(
            NodeKind::Import { class_name: name, alias, is_static, is_star },
            range,
        ))
    }

    fn parse_dotted_name(&mut self) -> Option<(String, SourceRange)> {
        let first = self.expect(&TokenKind::Identifier, "name")?;
        let start = first.start;
        let mut name = first.text.to_string();
        while self.peek().kind == TokenKind::Dot && self.peek2().is_word() {
            self.advance();
            let part = self.advance();
            name.push('.');
            name.push_str(&part.text);
        }
        Some((name, SourceRange::new(start, self.prev_end())))
    }

    // ------------------------------------------------------------------
    // classes
    // ------------------------------------------------------------------

    fn at_class_declaration(&self) -> bool {
        let mut i = self.significant_index();
        // Look past annotations and modifier keywords.
        let mut guard = 0;
        while guard < 64 {
            guard += 1;
            if i >= self.tokens.len() {
                return false;
            }
            let token = &self.tokens[i];
            if token.is_newline() {
                i += 1;
                continue;
            }
            if token.is_operator("@") {
                // `@Name`; annotation arguments ahead of a class keyword are
                // not scanned past.
                i += 2;
                continue;
            }
            match &token.kind {
                TokenKind::Keyword => match &*token.text {
                    "public" | "private" | "protected" | "static" | "final" | "abstract" => i += 1,
                    "class" | "interface" | "enum" | "trait" => return true,
                    _ => return false,
                },
                _ => return false,
            }
        }
        false
    }

    fn parse_annotations(&mut self) -> Vec<NodeId> {
        let mut out = Vec::new();
        loop {
            if !self.peek().is_operator("@") {
                break;
            }
            let start = self.peek().start;
            self.advance();
            let name = match self.expect(&TokenKind::Identifier, "annotation name") {
                Some(t) => t.text.to_string(),
                None => break,
            };
            let mut arguments = Vec::new();
            if self.peek().kind == TokenKind::LeftParen {
                arguments = self.parse_argument_list();
            }
            let range = SourceRange::new(start, self.prev_end());
            out.push(self.ast.alloc(NodeKind::Annotation { name, arguments }, range));
            self.skip_separators();
        }
        out
    }

    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::default();
        loop {
            let token = self.peek();
            if !matches!(token.kind, TokenKind::Keyword) {
                break;
            }
            match &*token.text {
                "public" => modifiers.visibility = Visibility::Public,
                "protected" => modifiers.visibility = Visibility::Protected,
                "private" => modifiers.visibility = Visibility::Private,
                "static" => modifiers.is_static = true,
                "final" => modifiers.is_final = true,
                "abstract" => modifiers.is_abstract = true,
                "synchronized" | "transient" | "volatile" | "native" | "strictfp" => {}
                _ => break,
            }
            self.advance();
        }
        modifiers
    }

    fn parse_class_declaration(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        let annotations = self.parse_annotations();
        let modifiers = self.parse_modifiers();
        let kind = match &*self.peek().text {
            "class" => ClassKind::Class,
            "interface" => ClassKind::Interface,
            "enum" => ClassKind::Enum,
            "trait" => ClassKind::Trait,
            _ => {
                self.error_here("expected class declaration".to_string());
                self.recover_to_statement();
                return None;
            }
        };
        self.advance();

        let name_token = self.expect(&TokenKind::Identifier, "class name")?;
        let name = name_token.text.to_string();
        let name_range = SourceRange::new(name_token.start, name_token.end);
        self.skip_type_parameters();

        let mut superclass = None;
        let mut interfaces = Vec::new();
        if self.eat_keyword("extends") {
            superclass = self.parse_type_name();
        }
        if self.eat_keyword("implements") {
            loop {
                if let Some(ty) = self.parse_type_name() {
                    interfaces.push(ty);
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.skip_separators();
        if self.expect(&TokenKind::LeftBrace, "'{'").is_none() {
            self.recover_to_statement();
            return None;
        }

        let mut fields = Vec::new();
        let mut properties = Vec::new();
        let mut methods = Vec::new();
        let mut inner_classes = Vec::new();

        loop {
            self.skip_separators();
            if matches!(self.peek().kind, TokenKind::RightBrace | TokenKind::Eof)
                || self.errors_exhausted()
            {
                break;
            }
            self.parse_member(&name, &mut fields, &mut properties, &mut methods, &mut inner_classes);
        }
        self.eat(&TokenKind::RightBrace);

        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(
            NodeKind::Class {
                name,
                kind,
                modifiers,
                superclass,
                interfaces,
                annotations,
                fields,
                properties,
                methods,
                inner_classes,
                name_range,
            },
            range,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_member(
        &mut self,
        class_name: &str,
        fields: &mut Vec<NodeId>,
        properties: &mut Vec<NodeId>,
        methods: &mut Vec<NodeId>,
        inner_classes: &mut Vec<NodeId>,
    ) {
        if self.at_class_declaration() {
            if let Some(inner) = self.parse_class_declaration() {
                inner_classes.push(inner);
            }
            return;
        }

        let start = self.peek().start;
        let annotations = self.parse_annotations();
        let modifiers = self.parse_modifiers();
        let explicit_visibility = modifiers.visibility != Visibility::Default;

        // Initializer block: wrap as a synthetic method so traversal still
        // reaches its statements.
        if self.peek().kind == TokenKind::LeftBrace {
            if let Some(body) = self.parse_block() {
                let range = self.ast.range(body);
                let method = self.ast.alloc_synthetic(
                    NodeKind::Method {
                        name: if modifiers.is_static { "<clinit>" } else { "<init>" }.to_string(),
                        return_type: None,
                        modifiers,
                        annotations,
                        parameters: Vec::new(),
                        body: Some(body),
                        is_constructor: false,
                        name_range: SourceRange::synthetic(),
                    },
                    range,
                );
                methods.push(method);
            }
            return;
        }

        let has_def = self.eat_keyword("def");
        let mut return_type = None;

        if !has_def {
            let looks_typed = self.peek().is_word()
                && (self.peek2().kind == TokenKind::Identifier
                    || self.peek2().is_operator("<"));
            let direct_call = self.peek().kind == TokenKind::Identifier
                && self.peek2().kind == TokenKind::LeftParen;
            if looks_typed && !direct_call {
                return_type = self.parse_type_name();
            } else if !direct_call && !self.peek().is_word() {
                self.error_here("expected class member".to_string());
                self.recover_to_statement();
                return;
            }
        }

        let name_token = match self.expect(&TokenKind::Identifier, "member name") {
            Some(t) => t,
            None => {
                self.recover_to_statement();
                return;
            }
        };
        let name = name_token.text.to_string();
        let name_range = SourceRange::new(name_token.start, name_token.end);

        if self.peek().kind == TokenKind::LeftParen {
            let is_constructor = return_type.is_none() && !has_def && name == class_name;
            if let Some(method) = self.parse_method_rest(
                start,
                name,
                name_range,
                return_type,
                modifiers,
                annotations,
                is_constructor,
            ) {
                methods.push(method);
            }
            return;
        }

        // Field or property.
        let mut initializer = None;
        if self.eat_operator("=") {
            initializer = Some(self.parse_expression());
        }
        let range = SourceRange::new(start, self.prev_end());
        let node = if explicit_visibility {
            self.ast.alloc(
                NodeKind::Field {
                    name,
                    type_name: return_type,
                    modifiers,
                    annotations,
                    initializer,
                    name_range,
                },
                range,
            )
        } else {
            self.ast.alloc(
                NodeKind::Property {
                    name,
                    type_name: return_type,
                    modifiers,
                    annotations,
                    initializer,
                    name_range,
                },
                range,
            )
        };
        if explicit_visibility {
            fields.push(node);
        } else {
            properties.push(node);
        }
        // Additional declarators share the type and modifiers.
        while self.eat(&TokenKind::Comma) {
            if let Some(extra) = self.expect(&TokenKind::Identifier, "member name") {
                let extra_name_range = SourceRange::new(extra.start, extra.end);
                let mut extra_init = None;
                if self.eat_operator("=") {
                    extra_init = Some(self.parse_expression());
                }
                let extra_range = SourceRange::new(extra.start, self.prev_end());
                let node = if explicit_visibility {
                    self.ast.alloc(
                        NodeKind::Field {
                            name: extra.text.to_string(),
                            type_name: None,
                            modifiers,
                            annotations: Vec::new(),
                            initializer: extra_init,
                            name_range: extra_name_range,
                        },
                        extra_range,
                    )
                } else {
                    self.ast.alloc(
                        NodeKind::Property {
                            name: extra.text.to_string(),
                            type_name: None,
                            modifiers,
                            annotations: Vec::new(),
                            initializer: extra_init,
                            name_range: extra_name_range,
                        },
                        extra_range,
                    )
                };
                if explicit_visibility {
                    fields.push(node);
                } else {
                    properties.push(node);
                }
            } else {
                break;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_method_rest(
        &mut self,
        start: LineColumn,
        name: String,
        name_range: SourceRange,
        return_type: Option<String>,
        modifiers: Modifiers,
        annotations: Vec<NodeId>,
        is_constructor: bool,
    ) -> Option<NodeId> {
        let parameters = self.parse_parameter_list();
        if self.eat_keyword("throws") {
            loop {
                if self.parse_type_name().is_none() {
                    break;
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.skip_separators();
        let body = if self.peek().kind == TokenKind::LeftBrace {
            self.parse_block()
        } else {
            None
        };
        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(
            NodeKind::Method {
                name,
                return_type,
                modifiers,
                annotations,
                parameters,
                body,
                is_constructor,
                name_range,
            },
            range,
        ))
    }

    fn parse_parameter_list(&mut self) -> Vec<NodeId> {
        let mut parameters = Vec::new();
        if self.peek().kind != TokenKind::LeftParen {
            return parameters;
        }
        self.advance();
        self.transparent += 1;
        loop {
            if matches!(self.peek().kind, TokenKind::RightParen | TokenKind::Eof) {
                break;
            }
            if let Some(param) = self.parse_parameter() {
                parameters.push(param);
            } else {
                // Skip to the next comma or the closing paren.
                while !matches!(
                    self.peek().kind,
                    TokenKind::Comma | TokenKind::RightParen | TokenKind::Eof
                ) {
                    self.advance();
                }
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.transparent = self.transparent.saturating_sub(1);
        self.eat(&TokenKind::RightParen);
        parameters
    }

    fn parse_parameter(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        self.eat_keyword("final");
        let mut type_name = None;
        if self.peek().is_word()
            && (self.peek2().kind == TokenKind::Identifier || self.peek2().is_operator("<"))
        {
            type_name = self.parse_type_name();
        }
        let name_token = self.expect(&TokenKind::Identifier, "parameter name")?;
        let name_range = SourceRange::new(name_token.start, name_token.end);
        let mut default_value = None;
        if self.eat_operator("=") {
            default_value = Some(self.parse_expression());
        }
        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(
            NodeKind::Parameter {
                name: name_token.text.to_string(),
                type_name,
                default_value,
                name_range,
            },
            range,
        ))
    }

    /// Parses a (possibly dotted, possibly generic, possibly array) type
    /// spelling into its source text.
    fn parse_type_name(&mut self) -> Option<String> {
        if !self.peek().is_word() {
            self.error_here("expected type".to_string());
            return None;
        }
        let first = self.advance();
        let mut name = first.text.to_string();
        while self.peek().kind == TokenKind::Dot && self.peek2().is_word() {
            self.advance();
            let part = self.advance();
            name.push('.');
            name.push_str(&part.text);
        }
        if self.peek().is_operator("<") {
            name.push_str(&self.capture_type_arguments());
        }
        while self.peek().kind == TokenKind::LeftBracket
            && self.peek2().kind == TokenKind::RightBracket
        {
            self.advance();
            self.advance();
            name.push_str("[]");
        }
        Some(name)
    }

    /// Captures `<...>` including nested generics as raw text.
    fn capture_type_arguments(&mut self) -> String {
        let mut text = String::new();
        let mut depth = 0i32;
        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Operator(op) if &**op == "<" => depth += 1,
                TokenKind::Operator(op) if &**op == ">" => depth -= 1,
                TokenKind::Operator(op) if &**op == ">>" => depth -= 2,
                TokenKind::Eof | TokenKind::Newline | TokenKind::LeftBrace => break,
                _ => {}
            }
            self.advance();
            text.push_str(&token.text);
            if depth <= 0 {
                break;
            }
        }
        text
    }

    fn skip_type_parameters(&mut self) {
        if self.peek().is_operator("<") {
            self.capture_type_arguments();
        }
    }

    /// `def name(...) {` or `Type name(...) {` at the top level declares a
    /// method on the script class. The body brace is required to keep
    /// command calls (`println foo(1)`) out.
    fn at_script_method(&self) -> bool {
        let i = self.significant_index();
        let token_at = |n: usize| &self.tokens[(i + n).min(self.tokens.len() - 1)];
        let head = self.peek();
        let typed = head.kind == TokenKind::Identifier
            && head.text.chars().next().is_some_and(|c| c.is_uppercase());
        let primitive = matches!(head.kind, TokenKind::Keyword)
            && matches!(
                &*head.text,
                "int" | "long" | "short" | "byte" | "double" | "float" | "boolean" | "char"
                    | "void"
            );
        if !(head.is_keyword("def") || typed || primitive) {
            return false;
        }
        if token_at(1).kind != TokenKind::Identifier || token_at(2).kind != TokenKind::LeftParen {
            return false;
        }
        let mut depth = 0i32;
        let mut n = 2usize;
        for _ in 0..64 {
            match token_at(n).kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        let mut m = n + 1;
                        while matches!(token_at(m).kind, TokenKind::Newline) && m < n + 4 {
                            m += 1;
                        }
                        return token_at(m).kind == TokenKind::LeftBrace;
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            n += 1;
        }
        false
    }

    fn parse_script_method(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        let annotations = self.parse_annotations();
        let modifiers = self.parse_modifiers();
        let has_def = self.eat_keyword("def");
        let return_type = if has_def { None } else { self.parse_type_name() };
        let name_token = self.expect(&TokenKind::Identifier, "method name")?;
        let name_range = SourceRange::new(name_token.start, name_token.end);
        self.parse_method_rest(
            start,
            name_token.text.to_string(),
            name_range,
            return_type,
            modifiers,
            annotations,
            false,
        )
    }

    fn wrap_script(&mut self, statements: &[NodeId], script_methods: Vec<NodeId>) -> NodeId {
        let mut range = statements
            .first()
            .or(script_methods.first())
            .map(|id| self.ast.range(*id))
            .unwrap_or(SourceRange::synthetic());
        for id in statements.iter().chain(script_methods.iter()) {
            range = range.union(self.ast.range(*id));
        }
        let mut methods = Vec::new();
        if !statements.is_empty() {
            let block = self
                .ast
                .alloc_synthetic(NodeKind::Block { statements: statements.to_vec() }, range);
            let run = self.ast.alloc_synthetic(
                NodeKind::Method {
                    name: "run".to_string(),
                    return_type: None,
                    modifiers: Modifiers { visibility: Visibility::Public, ..Modifiers::default() },
                    annotations: Vec::new(),
                    parameters: Vec::new(),
                    body: Some(block),
                    is_constructor: false,
                    name_range: SourceRange::synthetic(),
                },
                range,
            );
            methods.push(run);
        }
        methods.extend(script_methods);
        self.ast.alloc_synthetic(
            NodeKind::Class {
                name: self.script_name.clone(),
                kind: ClassKind::Class,
                modifiers: Modifiers::default(),
                superclass: Some("Script".to_string()),
                interfaces: Vec::new(),
                annotations: Vec::new(),
                fields: Vec::new(),
                properties: Vec::new(),
                methods,
                inner_classes: Vec::new(),
                name_range: SourceRange::synthetic(),
            },
            range,
        )
    }

    // ------------------------------------------------------------------
    // statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self, statements: &mut Vec<NodeId>) {
        if !self.enter() {
            self.leave();
            self.recover_to_statement();
            return;
        }
        self.skip_separators();
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::LeftBrace => {
                if let Some(block) = self.parse_block() {
                    statements.push(block);
                }
            }
            TokenKind::Keyword => match &*token.text {
                "if" => {
                    if let Some(stmt) = self.parse_if() {
                        statements.push(stmt);
                    }
                }
                "while" => {
                    if let Some(stmt) = self.parse_while() {
                        statements.push(stmt);
                    }
                }
                "for" => {
                    if let Some(stmt) = self.parse_for() {
                        statements.push(stmt);
                    }
                }
                "try" => {
                    if let Some(stmt) = self.parse_try() {
                        statements.push(stmt);
                    }
                }
                "switch" => {
                    if let Some(stmt) = self.parse_switch() {
                        statements.push(stmt);
                    }
                }
                "return" => {
                    let start = token.start;
                    self.advance();
                    let value =
                        if self.at_statement_end() { None } else { Some(self.parse_expression()) };
                    let range = SourceRange::new(start, self.prev_end());
                    statements.push(self.ast.alloc(NodeKind::Return { value }, range));
                }
                "throw" => {
                    let start = token.start;
                    self.advance();
                    let value = self.parse_expression();
                    let range = SourceRange::new(start, self.prev_end());
                    statements.push(self.ast.alloc(NodeKind::Throw { value }, range));
                }
                "assert" => {
                    let start = token.start;
                    self.advance();
                    let condition = self.parse_expression();
                    let message =
                        if self.eat(&TokenKind::Comma) { Some(self.parse_expression()) } else { None };
                    let range = SourceRange::new(start, self.prev_end());
                    statements.push(self.ast.alloc(NodeKind::Assert { condition, message }, range));
                }
                "break" => {
                    self.advance();
                    let range = SourceRange::new(token.start, token.end);
                    statements.push(self.ast.alloc(NodeKind::Break, range));
                }
                "continue" => {
                    self.advance();
                    let range = SourceRange::new(token.start, token.end);
                    statements.push(self.ast.alloc(NodeKind::Continue, range));
                }
                "def" | "final" => {
                    self.parse_variable_declarations(statements);
                }
                "int" | "long" | "short" | "byte" | "double" | "float" | "boolean" | "char" => {
                    self.parse_variable_declarations(statements);
                }
                _ => {
                    if let Some(stmt) = self.parse_expression_statement() {
                        statements.push(stmt);
                    }
                }
            },
            TokenKind::Identifier if self.looks_like_typed_declaration() => {
                self.parse_variable_declarations(statements);
            }
            TokenKind::Error(message) => {
                let msg = message.to_string();
                self.error_here(msg);
                self.advance();
            }
            TokenKind::Eof | TokenKind::RightBrace => {}
            _ => {
                if let Some(stmt) = self.parse_expression_statement() {
                    statements.push(stmt);
                }
            }
        }
        self.leave();
    }

    /// `Type name …` at statement level. Without the uppercase-initial
    /// heuristic, `println foo` would be indistinguishable from a
    /// declaration `Type foo`.
    fn looks_like_typed_declaration(&self) -> bool {
        let first = self.peek();
        if !first.text.chars().next().is_some_and(|c| c.is_uppercase()) {
            return false;
        }
        let second = self.peek2();
        if second.is_operator("<") {
            return true;
        }
        if second.kind != TokenKind::Identifier {
            return false;
        }
        // `Type name` then `=`, a separator, or a comma.
        let i = self.significant_index();
        let third = &self.tokens[(i + 2).min(self.tokens.len() - 1)];
        third.is_operator("=")
            || matches!(
                third.kind,
                TokenKind::Newline
                    | TokenKind::Semicolon
                    | TokenKind::Comma
                    | TokenKind::Eof
                    | TokenKind::RightBrace
            )
    }

    fn parse_variable_declarations(&mut self, statements: &mut Vec<NodeId>) {
        let checkpoint = self.pos;
        let start = self.peek().start;
        let has_def = self.eat_keyword("def");
        let has_final = self.eat_keyword("final");
        let mut type_name = None;
        if self.peek().is_word()
            && (self.peek2().kind == TokenKind::Identifier || self.peek2().is_operator("<"))
        {
            type_name = self.parse_type_name();
        }
        let mut first = true;
        loop {
            if first && !has_def && !has_final && self.peek().kind != TokenKind::Identifier {
                // Not a declaration after all (`Limit < max` reads as a
                // comparison); reparse from the checkpoint as an expression.
                self.pos = checkpoint;
                if let Some(stmt) = self.parse_expression_statement() {
                    statements.push(stmt);
                }
                return;
            }
            let name_token = match self.expect(&TokenKind::Identifier, "variable name") {
                Some(t) => t,
                None => {
                    self.recover_to_statement();
                    return;
                }
            };
            let target_range = SourceRange::new(name_token.start, name_token.end);
            let target = self.ast.alloc(
                NodeKind::Variable { name: name_token.text.to_string(), accessed_variable: None },
                target_range,
            );
            let mut initializer = None;
            if self.eat_operator("=") {
                initializer = Some(self.parse_expression());
            }
            let range = SourceRange::new(
                if first { start } else { name_token.start },
                self.prev_end(),
            );
            first = false;
            statements.push(self.ast.alloc(
                NodeKind::VariableDeclaration {
                    target,
                    type_name: type_name.clone(),
                    initializer,
                },
                range,
            ));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
    }

    fn parse_block(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if matches!(self.peek().kind, TokenKind::RightBrace | TokenKind::Eof)
                || self.errors_exhausted()
            {
                break;
            }
            let before = self.pos;
            self.parse_statement(&mut statements);
            if self.pos == before {
                self.advance();
            }
        }
        self.eat(&TokenKind::RightBrace);
        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(NodeKind::Block { statements }, range))
    }

    fn parse_single_statement(&mut self) -> NodeId {
        let mut bucket = Vec::new();
        self.parse_statement(&mut bucket);
        match bucket.len() {
            0 => {
                let at = self.prev_end();
                self.error_expr(at)
            }
            1 => bucket[0],
            _ => {
                let mut range = self.ast.range(bucket[0]);
                for id in &bucket {
                    range = range.union(self.ast.range(*id));
                }
                self.ast.alloc(NodeKind::Block { statements: bucket }, range)
            }
        }
    }

    fn parse_parenthesized_condition(&mut self) -> NodeId {
        if self.expect(&TokenKind::LeftParen, "'('").is_none() {
            let at = self.prev_end();
            return self.error_expr(at);
        }
        self.transparent += 1;
        let condition = self.parse_expression();
        self.transparent = self.transparent.saturating_sub(1);
        self.eat(&TokenKind::RightParen);
        condition
    }

    fn parse_if(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        self.advance();
        let condition = self.parse_parenthesized_condition();
        self.skip_separators();
        let then_branch = self.parse_single_statement();
        let mut else_branch = None;
        let checkpoint = self.pos;
        self.skip_separators();
        if self.eat_keyword("else") {
            self.skip_separators();
            else_branch = Some(self.parse_single_statement());
        } else {
            self.pos = checkpoint;
        }
        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(NodeKind::If { condition, then_branch, else_branch }, range))
    }

    fn parse_while(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        self.advance();
        let condition = self.parse_parenthesized_condition();
        self.skip_separators();
        let body = self.parse_single_statement();
        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(NodeKind::While { condition, body }, range))
    }

    fn parse_for(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        self.advance();
        if self.expect(&TokenKind::LeftParen, "'('").is_none() {
            self.recover_to_statement();
            return None;
        }
        self.transparent += 1;

        // `for (x in xs)` / `for (Type x in xs)` against the C-style form.
        let checkpoint = self.pos;
        let mut for_in = None;
        {
            let var_start = self.peek().start;
            let mut type_name = None;
            if self.peek().is_word() && self.peek2().kind == TokenKind::Identifier {
                type_name = self.parse_type_name();
            }
            if self.peek().kind == TokenKind::Identifier && self.peek2().is_keyword("in") {
                let name_token = self.advance();
                let name_range = SourceRange::new(name_token.start, name_token.end);
                self.advance(); // in
                let variable = self.ast.alloc(
                    NodeKind::Parameter {
                        name: name_token.text.to_string(),
                        type_name,
                        default_value: None,
                        name_range,
                    },
                    SourceRange::new(var_start, name_token.end),
                );
                let iterable = self.parse_expression();
                for_in = Some((variable, iterable));
            } else {
                self.pos = checkpoint;
            }
        }

        if let Some((variable, iterable)) = for_in {
            self.transparent = self.transparent.saturating_sub(1);
            self.eat(&TokenKind::RightParen);
            self.skip_separators();
            let body = self.parse_single_statement();
            let range = SourceRange::new(start, self.prev_end());
            return Some(self.ast.alloc(NodeKind::ForIn { variable, iterable, body }, range));
        }

        // C-style: init ; condition ; update
        let mut init = None;
        if self.peek().kind != TokenKind::Semicolon {
            let mut bucket = Vec::new();
            self.parse_statement(&mut bucket);
            init = bucket.first().copied();
        }
        self.eat(&TokenKind::Semicolon);
        let mut condition = None;
        if self.peek().kind != TokenKind::Semicolon {
            condition = Some(self.parse_expression());
        }
        self.eat(&TokenKind::Semicolon);
        let mut update = None;
        if self.peek().kind != TokenKind::RightParen {
            update = Some(self.parse_expression());
        }
        self.transparent = self.transparent.saturating_sub(1);
        self.eat(&TokenKind::RightParen);
        self.skip_separators();
        let body = self.parse_single_statement();
        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(NodeKind::For { init, condition, update, body }, range))
    }

    fn parse_try(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        self.advance();
        self.skip_separators();
        let body = self.parse_block()?;
        let mut catches = Vec::new();
        let mut finally_block = None;
        loop {
            let checkpoint = self.pos;
            self.skip_separators();
            if self.peek().is_keyword("catch") {
                let catch_start = self.peek().start;
                self.advance();
                self.expect(&TokenKind::LeftParen, "'('");
                self.transparent += 1;
                let parameter = self.parse_parameter();
                self.transparent = self.transparent.saturating_sub(1);
                self.eat(&TokenKind::RightParen);
                self.skip_separators();
                if let (Some(parameter), Some(catch_body)) = (parameter, self.parse_block()) {
                    let range = SourceRange::new(catch_start, self.prev_end());
                    catches.push(
                        self.ast
                            .alloc(NodeKind::CatchClause { parameter, body: catch_body }, range),
                    );
                }
            } else if self.peek().is_keyword("finally") {
                self.advance();
                self.skip_separators();
                finally_block = self.parse_block();
                break;
            } else {
                self.pos = checkpoint;
                break;
            }
        }
        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(NodeKind::TryCatch { body, catches, finally_block }, range))
    }

    fn parse_switch(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        self.advance();
        let subject = self.parse_parenthesized_condition();
        self.skip_separators();
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let mut cases = Vec::new();
        loop {
            self.skip_separators();
            if matches!(self.peek().kind, TokenKind::RightBrace | TokenKind::Eof)
                || self.errors_exhausted()
            {
                break;
            }
            let case_start = self.peek().start;
            let test = if self.eat_keyword("case") {
                let test = self.parse_expression();
                Some(test)
            } else if self.eat_keyword("default") {
                None
            } else {
                self.error_here("expected 'case' or 'default'".to_string());
                self.recover_to_statement();
                continue;
            };
            self.eat(&TokenKind::Colon);
            let mut body = Vec::new();
            loop {
                self.skip_separators();
                if self.peek().is_keyword("case")
                    || self.peek().is_keyword("default")
                    || matches!(self.peek().kind, TokenKind::RightBrace | TokenKind::Eof)
                {
                    break;
                }
                let before = self.pos;
                self.parse_statement(&mut body);
                if self.pos == before {
                    self.advance();
                }
            }
            let range = SourceRange::new(case_start, self.prev_end());
            cases.push(self.ast.alloc(NodeKind::CaseBlock { test, body }, range));
        }
        self.eat(&TokenKind::RightBrace);
        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(NodeKind::Switch { subject, cases }, range))
    }

    fn parse_expression_statement(&mut self) -> Option<NodeId> {
        let start = self.peek().start;
        let expression = self.parse_expression();

        // Command syntax: `println greeting` — a bare variable followed by
        // the start of another expression on the same logical line is a
        // paren-less call.
        let is_bare_variable =
            matches!(self.ast.kind(expression), NodeKind::Variable { .. });
        if is_bare_variable && self.at_command_argument() {
            let (method, method_range) = match self.ast.kind(expression) {
                NodeKind::Variable { name, .. } => {
                    (name.clone(), self.ast.range(expression))
                }
                _ => (String::new(), SourceRange::synthetic()),
            };
            let mut arguments = vec![self.parse_argument()];
            while self.eat(&TokenKind::Comma) {
                arguments.push(self.parse_argument());
            }
            let range = SourceRange::new(start, self.prev_end());
            let call = self.ast.alloc(
                NodeKind::MethodCall { object: None, method, method_range, arguments, safe: false },
                range,
            );
            let stmt_range = SourceRange::new(start, self.prev_end());
            return Some(self.ast.alloc(NodeKind::ExpressionStmt { expression: call }, stmt_range));
        }

        let range = SourceRange::new(start, self.prev_end());
        Some(self.ast.alloc(NodeKind::ExpressionStmt { expression }, range))
    }

    fn at_command_argument(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Identifier
                | TokenKind::Number { .. }
                | TokenKind::Str { .. }
                | TokenKind::LeftBracket
        ) || self.peek().is_keyword("true")
            || self.peek().is_keyword("false")
            || self.peek().is_keyword("null")
            || self.peek().is_keyword("this")
            || self.peek().is_keyword("new")
    }

    // ------------------------------------------------------------------
    // expressions
    // ------------------------------------------------------------------

    pub(crate) fn parse_expression(&mut self) -> NodeId {
        if !self.enter() {
            self.leave();
            let at = self.prev_end();
            return self.error_expr(at);
        }
        let result = self.parse_assignment();
        self.leave();
        result
    }

    fn binary(&mut self, op: &str, left: NodeId, right: NodeId) -> NodeId {
        let range = self.ast.range(left).union(self.ast.range(right));
        self.ast.alloc(
            NodeKind::BinaryExpr { op: op.to_string(), left, right },
            range,
        )
    }

    fn parse_assignment(&mut self) -> NodeId {
        let left = self.parse_ternary();
        const ASSIGN_OPS: &[&str] =
            &["=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", "&=", "|=", "^=", "?="];
        for op in ASSIGN_OPS {
            if self.peek().is_operator(op) {
                self.advance();
                let right = self.parse_assignment();
                return self.binary(op, left, right);
            }
        }
        left
    }

    fn parse_ternary(&mut self) -> NodeId {
        let condition = self.parse_logical_or();
        if self.peek().is_operator("?:") {
            self.advance();
            let fallback = self.parse_ternary();
            return self.binary("?:", condition, fallback);
        }
        if self.peek().is_operator("?") {
            self.advance();
            self.transparent += 1;
            let then_expr = self.parse_ternary();
            self.transparent = self.transparent.saturating_sub(1);
            self.eat(&TokenKind::Colon);
            let else_expr = self.parse_ternary();
            let range = self.ast.range(condition).union(self.ast.range(else_expr));
            return self
                .ast
                .alloc(NodeKind::TernaryExpr { condition, then_expr, else_expr }, range);
        }
        condition
    }

    fn parse_binary_level(
        &mut self,
        ops: &[&str],
        next: fn(&mut Self) -> NodeId,
    ) -> NodeId {
        let mut left = next(self);
        'outer: loop {
            for op in ops {
                if self.peek().is_operator(op) {
                    self.advance();
                    let right = next(self);
                    left = self.binary(op, left, right);
                    continue 'outer;
                }
            }
            return left;
        }
    }

    fn parse_logical_or(&mut self) -> NodeId {
        self.parse_binary_level(&["||"], Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> NodeId {
        self.parse_binary_level(&["&&"], Self::parse_bit_or)
    }

    fn parse_bit_or(&mut self) -> NodeId {
        self.parse_binary_level(&["|"], Self::parse_bit_xor)
    }

    fn parse_bit_xor(&mut self) -> NodeId {
        self.parse_binary_level(&["^"], Self::parse_bit_and)
    }

    fn parse_bit_and(&mut self) -> NodeId {
        self.parse_binary_level(&["&"], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> NodeId {
        self.parse_binary_level(&["==", "!=", "<=>", "=~", "==~"], Self::parse_relational)
    }

    fn parse_relational(&mut self) -> NodeId {
        let mut left = self.parse_range_expr();
        loop {
            if self.eat_keyword("instanceof") {
                let type_start = self.peek().start;
                let type_name = self.parse_type_name().unwrap_or_default();
                let type_range = SourceRange::new(type_start, self.prev_end());
                let right = self.ast.alloc(NodeKind::ClassExpr { type_name }, type_range);
                left = self.binary("instanceof", left, right);
                continue;
            }
            if self.eat_keyword("as") {
                let type_name = self.parse_type_name().unwrap_or_default();
                let range = SourceRange::new(
                    self.ast.range(left).start,
                    self.prev_end(),
                );
                left = self.ast.alloc(NodeKind::CastExpr { type_name, expression: left }, range);
                continue;
            }
            if self.peek().is_keyword("in") {
                self.advance();
                let right = self.parse_range_expr();
                left = self.binary("in", left, right);
                continue;
            }
            let mut matched = false;
            for op in ["<=", ">=", "<", ">"] {
                if self.peek().is_operator(op) {
                    self.advance();
                    let right = self.parse_range_expr();
                    left = self.binary(op, left, right);
                    matched = true;
                    break;
                }
            }
            if !matched {
                return left;
            }
        }
    }

    fn parse_range_expr(&mut self) -> NodeId {
        self.parse_binary_level(&["..", "..<"], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> NodeId {
        self.parse_binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> NodeId {
        self.parse_binary_level(&["*", "/", "%"], Self::parse_power)
    }

    fn parse_power(&mut self) -> NodeId {
        self.parse_binary_level(&["**"], Self::parse_unary)
    }

    fn parse_unary(&mut self) -> NodeId {
        for op in ["!", "-", "+", "~", "++", "--"] {
            if self.peek().is_operator(op) {
                let start = self.peek().start;
                self.advance();
                let operand = self.parse_unary();
                let range = SourceRange::new(start, self.prev_end());
                return self
                    .ast
                    .alloc(NodeKind::UnaryExpr { op: op.to_string(), operand }, range);
            }
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> NodeId {
        let mut expr = self.parse_primary();
        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Dot | TokenKind::SafeDot | TokenKind::SpreadDot => {
                    let safe = matches!(token.kind, TokenKind::SafeDot);
                    let spread = matches!(token.kind, TokenKind::SpreadDot);
                    self.advance();
                    if !self.peek().is_word() {
                        self.error_here("expected property or method name".to_string());
                        return expr;
                    }
                    let name_token = self.advance();
                    let name_range = SourceRange::new(name_token.start, name_token.end);
                    if self.peek().kind == TokenKind::LeftParen {
                        let arguments = self.parse_argument_list();
                        let range =
                            SourceRange::new(self.ast.range(expr).start, self.prev_end());
                        expr = self.ast.alloc(
                            NodeKind::MethodCall {
                                object: Some(expr),
                                method: name_token.text.to_string(),
                                method_range: name_range,
                                arguments,
                                safe,
                            },
                            range,
                        );
                        expr = self.maybe_trailing_closure(expr);
                    } else if self.at_trailing_closure() {
                        let closure = self.parse_closure();
                        let range =
                            SourceRange::new(self.ast.range(expr).start, self.prev_end());
                        expr = self.ast.alloc(
                            NodeKind::MethodCall {
                                object: Some(expr),
                                method: name_token.text.to_string(),
                                method_range: name_range,
                                arguments: vec![closure],
                                safe,
                            },
                            range,
                        );
                    } else {
                        let property = self.ast.alloc(
                            NodeKind::Constant {
                                value: ConstantValue::Str(name_token.text.to_string()),
                            },
                            name_range,
                        );
                        let range =
                            SourceRange::new(self.ast.range(expr).start, name_token.end);
                        expr = self.ast.alloc(
                            NodeKind::PropertyExpr { object: expr, property, safe, spread },
                            range,
                        );
                    }
                }
                TokenKind::LeftParen => {
                    let arguments = self.parse_argument_list();
                    let range = SourceRange::new(self.ast.range(expr).start, self.prev_end());
                    expr = self.to_call(expr, arguments, range);
                    expr = self.maybe_trailing_closure(expr);
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    self.transparent += 1;
                    let index = self.parse_expression();
                    self.transparent = self.transparent.saturating_sub(1);
                    self.eat(&TokenKind::RightBracket);
                    let range = SourceRange::new(self.ast.range(expr).start, self.prev_end());
                    expr = self.ast.alloc(NodeKind::IndexExpr { object: expr, index }, range);
                }
                TokenKind::ColonColon => {
                    self.advance();
                    if self.peek().is_word() {
                        let name_token = self.advance();
                        let range =
                            SourceRange::new(self.ast.range(expr).start, name_token.end);
                        expr = self.ast.alloc(
                            NodeKind::MethodReference {
                                object: expr,
                                method: name_token.text.to_string(),
                            },
                            range,
                        );
                    } else {
                        self.error_here("expected method name after '::'".to_string());
                        return expr;
                    }
                }
                TokenKind::LeftBrace
                    if matches!(self.ast.kind(expr), NodeKind::Variable { .. })
                        && self.at_trailing_closure() =>
                {
                    // `foo { ... }` — paren-less call with a closure argument.
                    let (method, method_range) = match self.ast.kind(expr) {
                        NodeKind::Variable { name, .. } => (name.clone(), self.ast.range(expr)),
                        _ => (String::new(), SourceRange::synthetic()),
                    };
                    let closure = self.parse_closure();
                    let range = SourceRange::new(self.ast.range(expr).start, self.prev_end());
                    expr = self.ast.alloc(
                        NodeKind::MethodCall {
                            object: None,
                            method,
                            method_range,
                            arguments: vec![closure],
                            safe: false,
                        },
                        range,
                    );
                }
                TokenKind::Operator(op) if &**op == "++" || &**op == "--" => {
                    let spelling = op.to_string();
                    self.advance();
                    let range = SourceRange::new(self.ast.range(expr).start, self.prev_end());
                    expr = self
                        .ast
                        .alloc(NodeKind::UnaryExpr { op: spelling, operand: expr }, range);
                }
                _ => return expr,
            }
        }
    }

    fn at_trailing_closure(&self) -> bool {
        self.peek().kind == TokenKind::LeftBrace && self.peek().start.line == self.last_end.line
    }

    fn maybe_trailing_closure(&mut self, call: NodeId) -> NodeId {
        if !self.at_trailing_closure() {
            return call;
        }
        let closure = self.parse_closure();
        if let NodeKind::MethodCall { arguments, .. } = &mut self.ast.node_mut(call).kind {
            arguments.push(closure);
        }
        let closure_range = self.ast.range(closure);
        self.ast.widen(call, closure_range);
        call
    }

    fn to_call(&mut self, callee: NodeId, arguments: Vec<NodeId>, range: SourceRange) -> NodeId {
        match self.ast.kind(callee).clone() {
            NodeKind::Variable { name, .. } => {
                let method_range = self.ast.range(callee);
                self.ast.alloc(
                    NodeKind::MethodCall {
                        object: None,
                        method: name,
                        method_range,
                        arguments,
                        safe: false,
                    },
                    range,
                )
            }
            NodeKind::PropertyExpr { object, property, safe, .. } => {
                let method = self
                    .ast
                    .kind(property)
                    .clone();
                let method_name = match method {
                    NodeKind::Constant { value: ConstantValue::Str(s) } => s,
                    _ => "call".to_string(),
                };
                let method_range = self.ast.range(property);
                self.ast.alloc(
                    NodeKind::MethodCall {
                        object: Some(object),
                        method: method_name,
                        method_range,
                        arguments,
                        safe,
                    },
                    range,
                )
            }
            _ => self.ast.alloc(
                NodeKind::MethodCall {
                    object: Some(callee),
                    method: "call".to_string(),
                    method_range: SourceRange::synthetic(),
                    arguments,
                    safe: false,
                },
                range,
            ),
        }
    }

    fn parse_argument_list(&mut self) -> Vec<NodeId> {
        let mut arguments = Vec::new();
        if self.peek().kind != TokenKind::LeftParen {
            return arguments;
        }
        self.advance();
        self.transparent += 1;
        loop {
            if matches!(self.peek().kind, TokenKind::RightParen | TokenKind::Eof) {
                break;
            }
            arguments.push(self.parse_argument());
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.transparent = self.transparent.saturating_sub(1);
        self.eat(&TokenKind::RightParen);
        arguments
    }

    /// One call argument; named arguments become map entries.
    fn parse_argument(&mut self) -> NodeId {
        if self.peek().is_word() && self.peek2().kind == TokenKind::Colon {
            let key_token = self.advance();
            let key_range = SourceRange::new(key_token.start, key_token.end);
            let key = self.ast.alloc(
                NodeKind::Constant { value: ConstantValue::Str(key_token.text.to_string()) },
                key_range,
            );
            self.advance(); // :
            let value = self.parse_expression();
            let range = SourceRange::new(key_token.start, self.prev_end());
            return self.ast.alloc(NodeKind::MapEntry { key, value }, range);
        }
        self.parse_expression()
    }

    fn parse_primary(&mut self) -> NodeId {
        if !self.enter() {
            self.leave();
            let at = self.prev_end();
            return self.error_expr(at);
        }
        let result = self.parse_primary_inner();
        self.leave();
        result
    }

    fn parse_primary_inner(&mut self) -> NodeId {
        let token = self.peek().clone();
        let range = SourceRange::new(token.start, token.end);
        match &token.kind {
            TokenKind::Number { decimal } => {
                self.advance();
                let cleaned: String =
                    token.text.chars().filter(|c| *c != '_').collect();
                let value = if *decimal {
                    ConstantValue::Decimal(cleaned)
                } else {
                    let digits = cleaned.trim_end_matches(|c: char| c.is_alphabetic());
                    digits
                        .parse::<i64>()
                        .map(ConstantValue::Integer)
                        .unwrap_or(ConstantValue::Decimal(cleaned))
                };
                self.ast.alloc(NodeKind::Constant { value }, range)
            }
            TokenKind::Str { value, interpolated, triple } => {
                self.advance();
                if *interpolated {
                    self.build_gstring(&token, value, *triple)
                } else {
                    self.ast.alloc(
                        NodeKind::Constant { value: ConstantValue::Str(value.to_string()) },
                        range,
                    )
                }
            }
            TokenKind::Identifier => {
                self.advance();
                self.ast.alloc(
                    NodeKind::Variable { name: token.text.to_string(), accessed_variable: None },
                    range,
                )
            }
            TokenKind::Keyword => match &*token.text {
                "true" | "false" => {
                    self.advance();
                    let value = ConstantValue::Bool(&*token.text == "true");
                    self.ast.alloc(NodeKind::Constant { value }, range)
                }
                "null" => {
                    self.advance();
                    self.ast.alloc(NodeKind::Constant { value: ConstantValue::Null }, range)
                }
                "this" | "super" => {
                    self.advance();
                    self.ast.alloc(
                        NodeKind::Variable {
                            name: token.text.to_string(),
                            accessed_variable: None,
                        },
                        range,
                    )
                }
                "new" => self.parse_constructor_call(),
                "int" | "long" | "short" | "byte" | "double" | "float" | "boolean" | "char"
                | "void" => {
                    self.advance();
                    self.ast
                        .alloc(NodeKind::ClassExpr { type_name: token.text.to_string() }, range)
                }
                _ => {
                    self.error_here(format!("unexpected '{}'", token.text));
                    self.advance();
                    self.error_expr(token.start)
                }
            },
            TokenKind::LeftParen => self.parse_paren_or_cast(),
            TokenKind::LeftBracket => self.parse_list_or_map(),
            TokenKind::LeftBrace => self.parse_closure(),
            TokenKind::Error(message) => {
                let msg = message.to_string();
                self.error_here(msg);
                self.advance();
                self.error_expr(token.start)
            }
            _ => {
                self.error_here(format!("expected expression, found '{}'", self.describe_peek()));
                self.error_expr(token.start)
            }
        }
    }

    fn parse_constructor_call(&mut self) -> NodeId {
        let start = self.peek().start;
        self.advance(); // new
        let type_start = self.peek().start;
        let type_name = self.parse_type_name().unwrap_or_default();
        let type_range = SourceRange::new(type_start, self.prev_end());
        let arguments = if self.peek().kind == TokenKind::LeftParen {
            self.parse_argument_list()
        } else {
            Vec::new()
        };
        let range = SourceRange::new(start, self.prev_end());
        let call =
            self.ast.alloc(NodeKind::ConstructorCall { type_name, type_range, arguments }, range);
        if self.at_trailing_closure() {
            let closure = self.parse_closure();
            if let NodeKind::ConstructorCall { arguments, .. } =
                &mut self.ast.node_mut(call).kind
            {
                arguments.push(closure);
            }
            let closure_range = self.ast.range(closure);
            self.ast.widen(call, closure_range);
        }
        call
    }

    /// `(Type) expr` vs `(expr)`. A single capitalized word followed by a
    /// closing paren and the start of another expression reads as a cast.
    fn parse_paren_or_cast(&mut self) -> NodeId {
        let start = self.peek().start;
        let idx = self.significant_index();
        let one = self.tokens.get(idx + 1);
        let two = self.tokens.get(idx + 2);
        let three = self.tokens.get(idx + 3);
        let is_cast = matches!(
            (one, two),
            (Some(a), Some(b))
                if a.kind == TokenKind::Identifier
                    && a.text.chars().next().is_some_and(|c| c.is_uppercase())
                    && b.kind == TokenKind::RightParen
        ) && three.is_some_and(|t| {
            matches!(
                t.kind,
                TokenKind::Identifier | TokenKind::Number { .. } | TokenKind::Str { .. }
            )
        });

        if is_cast {
            self.advance(); // (
            let type_token = self.advance();
            self.advance(); // )
            let expression = self.parse_unary();
            let range = SourceRange::new(start, self.prev_end());
            return self.ast.alloc(
                NodeKind::CastExpr { type_name: type_token.text.to_string(), expression },
                range,
            );
        }

        self.advance();
        self.transparent += 1;
        let inner = self.parse_expression();
        self.transparent = self.transparent.saturating_sub(1);
        self.eat(&TokenKind::RightParen);
        inner
    }

    fn parse_list_or_map(&mut self) -> NodeId {
        let start = self.peek().start;
        self.advance(); // [
        self.transparent += 1;

        // `[:]` empty map
        if self.peek().kind == TokenKind::Colon && self.peek2().kind == TokenKind::RightBracket {
            self.advance();
            self.transparent = self.transparent.saturating_sub(1);
            self.advance();
            let range = SourceRange::new(start, self.prev_end());
            return self.ast.alloc(NodeKind::MapLiteral { entries: Vec::new() }, range);
        }
        if self.peek().kind == TokenKind::RightBracket {
            self.transparent = self.transparent.saturating_sub(1);
            self.advance();
            let range = SourceRange::new(start, self.prev_end());
            return self.ast.alloc(NodeKind::ListLiteral { elements: Vec::new() }, range);
        }

        let mut elements = Vec::new();
        let mut entries = Vec::new();
        let mut is_map = false;
        loop {
            if matches!(self.peek().kind, TokenKind::RightBracket | TokenKind::Eof) {
                break;
            }
            // `key:` marks a map literal; identifier keys are string
            // constants.
            if self.peek().is_word() && self.peek2().kind == TokenKind::Colon {
                is_map = true;
                let key_token = self.advance();
                let key_range = SourceRange::new(key_token.start, key_token.end);
                let key = self.ast.alloc(
                    NodeKind::Constant {
                        value: ConstantValue::Str(key_token.text.to_string()),
                    },
                    key_range,
                );
                self.advance(); // :
                let value = self.parse_expression();
                let range = SourceRange::new(key_token.start, self.prev_end());
                entries.push(self.ast.alloc(NodeKind::MapEntry { key, value }, range));
            } else {
                let element = self.parse_expression();
                if self.peek().kind == TokenKind::Colon {
                    is_map = true;
                    self.advance();
                    let value = self.parse_expression();
                    let range = SourceRange::new(
                        self.ast.range(element).start,
                        self.prev_end(),
                    );
                    entries.push(
                        self.ast.alloc(NodeKind::MapEntry { key: element, value }, range),
                    );
                } else {
                    elements.push(element);
                }
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.transparent = self.transparent.saturating_sub(1);
        self.eat(&TokenKind::RightBracket);
        let range = SourceRange::new(start, self.prev_end());
        if is_map {
            self.ast.alloc(NodeKind::MapLiteral { entries }, range)
        } else {
            self.ast.alloc(NodeKind::ListLiteral { elements }, range)
        }
    }

    fn parse_closure(&mut self) -> NodeId {
        let start = self.peek().start;
        self.advance(); // {

        // Parameters end with `->` before any statement-ish token.
        let mut parameters = Vec::new();
        if self.closure_has_parameters() {
            loop {
                if self.peek().is_operator("->") {
                    break;
                }
                if let Some(param) = self.parse_parameter() {
                    parameters.push(param);
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.eat_operator("->");
        }

        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if matches!(self.peek().kind, TokenKind::RightBrace | TokenKind::Eof)
                || self.errors_exhausted()
            {
                break;
            }
            let before = self.pos;
            self.parse_statement(&mut statements);
            if self.pos == before {
                self.advance();
            }
        }
        self.eat(&TokenKind::RightBrace);
        let body_range = SourceRange::new(start, self.prev_end());
        let body = self.ast.alloc(NodeKind::Block { statements }, body_range);
        let range = SourceRange::new(start, self.prev_end());
        self.ast.alloc(NodeKind::Closure { parameters, body }, range)
    }

    fn closure_has_parameters(&self) -> bool {
        let mut i = self.significant_index();
        let mut guard = 0;
        while guard < 48 {
            guard += 1;
            let token = &self.tokens[i.min(self.tokens.len() - 1)];
            match &token.kind {
                TokenKind::Arrow => return true,
                TokenKind::Identifier
                | TokenKind::Comma
                | TokenKind::Keyword
                | TokenKind::Dot => i += 1,
                TokenKind::Operator(op) if &**op == "<" || &**op == ">" || &**op == "=" => i += 1,
                TokenKind::Number { .. } | TokenKind::Str { .. } => i += 1,
                _ => return false,
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // GStrings
    // ------------------------------------------------------------------

    /// Splits an interpolated string into literal and embedded-variable
    /// segments with real source positions.
    fn build_gstring(&mut self, token: &Token, raw: &str, triple: bool) -> NodeId {
        let quote_len = if triple { 3 } else { 1 };
        let mut cursor = LineColumn::new(token.start.line, token.start.column + quote_len);
        let mut segments = Vec::new();
        let bytes = raw.as_bytes();
        let mut i = 0usize;
        let mut literal_start = 0usize;
        let mut literal_start_pos = cursor;

        while i < bytes.len() {
            let ch = match raw[i..].chars().next() {
                Some(c) => c,
                None => break,
            };
            if ch == '\\' {
                let skip = ch.len_utf8()
                    + raw[i + ch.len_utf8()..].chars().next().map(|c| c.len_utf8()).unwrap_or(0);
                cursor = advance_over(cursor, &raw[i..i + skip.min(raw.len() - i)]);
                i += skip;
                continue;
            }
            if ch == '$' {
                let after = &raw[i + 1..];
                let (name, braced) = if let Some(rest) = after.strip_prefix('{') {
                    let inner: String = rest
                        .chars()
                        .take_while(|c| *c != '}')
                        .collect();
                    (inner, true)
                } else {
                    let inner: String = after
                        .chars()
                        .take_while(|c| c.is_alphanumeric() || *c == '_')
                        .collect();
                    (inner, false)
                };
                let is_simple_name = !name.is_empty()
                    && name.chars().all(|c| c.is_alphanumeric() || c == '_')
                    && name.chars().next().is_some_and(|c| !c.is_ascii_digit());
                if is_simple_name {
                    if literal_start < i {
                        let text = &raw[literal_start..i];
                        let seg_range = SourceRange::new(
                            literal_start_pos,
                            advance_over(literal_start_pos, text),
                        );
                        segments.push(self.ast.alloc(
                            NodeKind::Constant { value: ConstantValue::Str(text.to_string()) },
                            seg_range,
                        ));
                    }
                    // Position of the name inside the raw text.
                    let dollar_pos = cursor;
                    let name_offset = if braced { 2 } else { 1 };
                    let name_start = LineColumn::new(
                        dollar_pos.line,
                        dollar_pos.column + name_offset,
                    );
                    let name_end = advance_over(name_start, &name);
                    let var = self.ast.alloc(
                        NodeKind::Variable { name: name.clone(), accessed_variable: None },
                        SourceRange::new(name_start, name_end),
                    );
                    segments.push(var);
                    let consumed = 1 + name_offset as usize - 1 + name.len() + usize::from(braced);
                    cursor = advance_over(cursor, &raw[i..i + consumed.min(raw.len() - i)]);
                    i += consumed;
                    literal_start = i;
                    literal_start_pos = cursor;
                    continue;
                }
            }
            cursor = advance_over(cursor, &raw[i..i + ch.len_utf8()]);
            i += ch.len_utf8();
        }
        if literal_start < raw.len() {
            let text = &raw[literal_start..];
            let seg_range =
                SourceRange::new(literal_start_pos, advance_over(literal_start_pos, text));
            segments.push(self.ast.alloc(
                NodeKind::Constant { value: ConstantValue::Str(text.to_string()) },
                seg_range,
            ));
        }
        let range = SourceRange::new(token.start, token.end);
        self.ast.alloc(NodeKind::GString { segments }, range)
    }
}

/// Advances a compiler position over `text`, counting UTF-16 columns.
fn advance_over(mut pos: LineColumn, text: &str) -> LineColumn {
    for ch in text.chars() {
        if ch == '\n' {
            pos.line += 1;
            pos.column = 1;
        } else {
            pos.column += ch.len_utf16() as u32;
        }
    }
    pos
}
