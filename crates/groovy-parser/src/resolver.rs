//! Scope resolution: wires every variable expression to the declaration it
//! accesses.
//!
//! After conversion each `Variable` node carries `accessed_variable`: locals
//! and parameters point at their declaration site, fields and properties at
//! the member node, and a declaration points at itself. Resolution is
//! strictly lexical and order-sensitive — a local is visible only after its
//! declaration statement, matching how the front end scopes script bodies.

use groovy_ast::{ModuleAst, NodeId, NodeKind};
use std::collections::HashMap;

/// Names that looked like class references (capitalized, not in any scope).
/// The semantic phase checks them against the known-class set.
#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub class_like: Vec<(String, NodeId)>,
}

pub fn resolve_scopes(ast: &mut ModuleAst) -> ResolutionReport {
    let mut resolver = Resolver { scopes: Vec::new(), report: ResolutionReport::default() };
    if let Some(root) = ast.root() {
        if let NodeKind::Module { classes, .. } = ast.kind(root).clone() {
            for class in classes {
                resolver.resolve_class(ast, class);
            }
        }
    }
    resolver.report
}

struct Resolver {
    scopes: Vec<HashMap<String, NodeId>>,
    report: ResolutionReport,
}

impl Resolver {
    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str, node: NodeId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), node);
        }
    }

    fn lookup(&self, name: &str) -> Option<NodeId> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }

    fn resolve_class(&mut self, ast: &mut ModuleAst, class: NodeId) {
        let (fields, properties, methods, inner_classes) = match ast.kind(class) {
            NodeKind::Class { fields, properties, methods, inner_classes, .. } => (
                fields.clone(),
                properties.clone(),
                methods.clone(),
                inner_classes.clone(),
            ),
            _ => return,
        };

        // Members are visible everywhere in the class body, initializers
        // included.
        self.push_scope();
        for member in fields.iter().chain(properties.iter()) {
            if let NodeKind::Field { name, .. } | NodeKind::Property { name, .. } =
                ast.kind(*member)
            {
                let name = name.clone();
                self.declare(&name, *member);
            }
        }

        for member in fields.iter().chain(properties.iter()) {
            let initializer = match ast.kind(*member) {
                NodeKind::Field { initializer, .. } | NodeKind::Property { initializer, .. } => {
                    *initializer
                }
                _ => None,
            };
            if let Some(init) = initializer {
                self.resolve_expr(ast, init);
            }
        }

        for method in methods {
            self.resolve_method(ast, method);
        }
        for inner in inner_classes {
            self.resolve_class(ast, inner);
        }
        self.pop_scope();
    }

    fn resolve_method(&mut self, ast: &mut ModuleAst, method: NodeId) {
        let (parameters, body) = match ast.kind(method) {
            NodeKind::Method { parameters, body, .. } => (parameters.clone(), *body),
            _ => return,
        };
        self.push_scope();
        for param in parameters {
            let (name, default_value) = match ast.kind(param) {
                NodeKind::Parameter { name, default_value, .. } => {
                    (name.clone(), *default_value)
                }
                _ => continue,
            };
            if let Some(default) = default_value {
                self.resolve_expr(ast, default);
            }
            self.declare(&name, param);
        }
        if let Some(body) = body {
            self.resolve_stmt(ast, body);
        }
        self.pop_scope();
    }

    fn resolve_stmt(&mut self, ast: &mut ModuleAst, stmt: NodeId) {
        match ast.kind(stmt).clone() {
            NodeKind::Block { statements } => {
                self.push_scope();
                for s in statements {
                    self.resolve_stmt(ast, s);
                }
                self.pop_scope();
            }
            NodeKind::ExpressionStmt { expression } => self.resolve_expr(ast, expression),
            NodeKind::VariableDeclaration { target, initializer, .. } => {
                if let Some(init) = initializer {
                    self.resolve_expr(ast, init);
                }
                if let NodeKind::Variable { name, .. } = ast.kind(target) {
                    let name = name.clone();
                    self.declare(&name, target);
                }
                ast.set_accessed_variable(target, target);
            }
            NodeKind::If { condition, then_branch, else_branch } => {
                self.resolve_expr(ast, condition);
                self.resolve_stmt(ast, then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(ast, else_branch);
                }
            }
            NodeKind::While { condition, body } => {
                self.resolve_expr(ast, condition);
                self.resolve_stmt(ast, body);
            }
            NodeKind::For { init, condition, update, body } => {
                self.push_scope();
                if let Some(init) = init {
                    self.resolve_stmt(ast, init);
                }
                if let Some(condition) = condition {
                    self.resolve_expr(ast, condition);
                }
                if let Some(update) = update {
                    self.resolve_expr(ast, update);
                }
                self.resolve_stmt(ast, body);
                self.pop_scope();
            }
            NodeKind::ForIn { variable, iterable, body } => {
                self.resolve_expr(ast, iterable);
                self.push_scope();
                if let NodeKind::Parameter { name, .. } = ast.kind(variable) {
                    let name = name.clone();
                    self.declare(&name, variable);
                }
                self.resolve_stmt(ast, body);
                self.pop_scope();
            }
            NodeKind::TryCatch { body, catches, finally_block } => {
                self.resolve_stmt(ast, body);
                for catch in catches {
                    self.resolve_stmt(ast, catch);
                }
                if let Some(finally_block) = finally_block {
                    self.resolve_stmt(ast, finally_block);
                }
            }
            NodeKind::CatchClause { parameter, body } => {
                self.push_scope();
                if let NodeKind::Parameter { name, .. } = ast.kind(parameter) {
                    let name = name.clone();
                    self.declare(&name, parameter);
                }
                self.resolve_stmt(ast, body);
                self.pop_scope();
            }
            NodeKind::Return { value } => {
                if let Some(value) = value {
                    self.resolve_expr(ast, value);
                }
            }
            NodeKind::Throw { value } => self.resolve_expr(ast, value),
            NodeKind::Switch { subject, cases } => {
                self.resolve_expr(ast, subject);
                for case in cases {
                    if let NodeKind::CaseBlock { test, body } = ast.kind(case).clone() {
                        if let Some(test) = test {
                            self.resolve_expr(ast, test);
                        }
                        self.push_scope();
                        for s in body {
                            self.resolve_stmt(ast, s);
                        }
                        self.pop_scope();
                    }
                }
            }
            NodeKind::Assert { condition, message } => {
                self.resolve_expr(ast, condition);
                if let Some(message) = message {
                    self.resolve_expr(ast, message);
                }
            }
            // Expressions can land in statement position via recovery.
            _ => self.resolve_expr(ast, stmt),
        }
    }

    fn resolve_expr(&mut self, ast: &mut ModuleAst, expr: NodeId) {
        match ast.kind(expr).clone() {
            NodeKind::Variable { name, accessed_variable } => {
                if accessed_variable.is_some() || name == "this" || name == "super" {
                    return;
                }
                if let Some(decl) = self.lookup(&name) {
                    ast.set_accessed_variable(expr, decl);
                } else if name.chars().next().is_some_and(|c| c.is_uppercase()) {
                    self.report.class_like.push((name, expr));
                }
            }
            NodeKind::PropertyExpr { object, .. } => self.resolve_expr(ast, object),
            NodeKind::MethodCall { object, arguments, .. } => {
                if let Some(object) = object {
                    self.resolve_expr(ast, object);
                }
                for arg in arguments {
                    self.resolve_expr(ast, arg);
                }
            }
            NodeKind::ConstructorCall { arguments, .. } => {
                for arg in arguments {
                    self.resolve_expr(ast, arg);
                }
            }
            NodeKind::Closure { parameters, body } | NodeKind::Lambda { parameters, body } => {
                self.push_scope();
                for param in parameters.iter() {
                    if let NodeKind::Parameter { name, .. } = ast.kind(*param) {
                        let name = name.clone();
                        self.declare(&name, *param);
                    }
                }
                self.resolve_stmt(ast, body);
                self.pop_scope();
            }
            NodeKind::MethodReference { object, .. } => self.resolve_expr(ast, object),
            NodeKind::ListLiteral { elements } => {
                for element in elements {
                    self.resolve_expr(ast, element);
                }
            }
            NodeKind::MapLiteral { entries } => {
                for entry in entries {
                    self.resolve_expr(ast, entry);
                }
            }
            NodeKind::MapEntry { key, value } => {
                self.resolve_expr(ast, key);
                self.resolve_expr(ast, value);
            }
            NodeKind::BinaryExpr { left, right, .. } => {
                self.resolve_expr(ast, left);
                self.resolve_expr(ast, right);
            }
            NodeKind::UnaryExpr { operand, .. } => self.resolve_expr(ast, operand),
            NodeKind::TernaryExpr { condition, then_expr, else_expr } => {
                self.resolve_expr(ast, condition);
                self.resolve_expr(ast, then_expr);
                self.resolve_expr(ast, else_expr);
            }
            NodeKind::CastExpr { expression, .. } => self.resolve_expr(ast, expression),
            NodeKind::GString { segments } => {
                for segment in segments {
                    self.resolve_expr(ast, segment);
                }
            }
            NodeKind::IndexExpr { object, index } => {
                self.resolve_expr(ast, object);
                self.resolve_expr(ast, index);
            }
            _ => {}
        }
    }
}
