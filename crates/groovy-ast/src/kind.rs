//! The closed node-kind sum and its fixed child ordering.

use crate::NodeId;
use groovy_position::SourceRange;

/// Visibility of a class member. Members declared with no visibility
/// keyword are Groovy properties; the parser uses `Default` to tell the
/// two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,
    Protected,
    Private,
    /// No explicit keyword.
    #[default]
    Default,
}

/// Modifier set attached to classes, members, and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
}

impl Modifiers {
    /// Renders the modifier keywords in declaration order, e.g.
    /// `"private static final"`. Empty for a bare property.
    pub fn render(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        match self.visibility {
            Visibility::Public => parts.push("public"),
            Visibility::Protected => parts.push("protected"),
            Visibility::Private => parts.push("private"),
            Visibility::Default => {}
        }
        if self.is_static {
            parts.push("static");
        }
        if self.is_abstract {
            parts.push("abstract");
        }
        if self.is_final {
            parts.push("final");
        }
        parts.join(" ")
    }
}

/// What flavor of type declaration a Class node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Trait,
}

/// Literal constant payloads. Decimal literals keep their source text so
/// equality stays exact.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(String),
    Str(String),
}

impl ConstantValue {
    /// Static type name of the literal, used by the type inferencer.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConstantValue::Null => "Object",
            ConstantValue::Bool(_) => "Boolean",
            ConstantValue::Integer(_) => "Integer",
            ConstantValue::Decimal(_) => "BigDecimal",
            ConstantValue::Str(_) => "String",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstantValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Every node variant the analyzer understands.
///
/// Children are arena ids; [`NodeKind::children`] yields them in the fixed
/// order position queries, completion, and rename depend on. Adding a
/// variant means extending `children`, `label`, and `position_priority`
/// together — the compiler's exhaustiveness check enforces the first.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // --- structure ---
    Module {
        package: Option<NodeId>,
        imports: Vec<NodeId>,
        classes: Vec<NodeId>,
    },
    Package {
        name: String,
    },
    Import {
        /// Fully qualified name, without the trailing `.*` for star imports.
        class_name: String,
        alias: Option<String>,
        is_static: bool,
        is_star: bool,
    },
    Annotation {
        name: String,
        arguments: Vec<NodeId>,
    },
    Class {
        name: String,
        kind: ClassKind,
        modifiers: Modifiers,
        superclass: Option<String>,
        interfaces: Vec<String>,
        annotations: Vec<NodeId>,
        fields: Vec<NodeId>,
        properties: Vec<NodeId>,
        methods: Vec<NodeId>,
        inner_classes: Vec<NodeId>,
        name_range: SourceRange,
    },
    Field {
        name: String,
        type_name: Option<String>,
        modifiers: Modifiers,
        annotations: Vec<NodeId>,
        initializer: Option<NodeId>,
        name_range: SourceRange,
    },
    Property {
        name: String,
        type_name: Option<String>,
        modifiers: Modifiers,
        annotations: Vec<NodeId>,
        initializer: Option<NodeId>,
        name_range: SourceRange,
    },
    Method {
        name: String,
        return_type: Option<String>,
        modifiers: Modifiers,
        annotations: Vec<NodeId>,
        parameters: Vec<NodeId>,
        body: Option<NodeId>,
        is_constructor: bool,
        name_range: SourceRange,
    },
    Parameter {
        name: String,
        type_name: Option<String>,
        default_value: Option<NodeId>,
        name_range: SourceRange,
    },

    // --- statements ---
    Block {
        statements: Vec<NodeId>,
    },
    ExpressionStmt {
        expression: NodeId,
    },
    VariableDeclaration {
        /// The declared Variable node; its `accessed_variable` points at
        /// itself after resolution.
        target: NodeId,
        type_name: Option<String>,
        initializer: Option<NodeId>,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        condition: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForIn {
        variable: NodeId,
        iterable: NodeId,
        body: NodeId,
    },
    TryCatch {
        body: NodeId,
        catches: Vec<NodeId>,
        finally_block: Option<NodeId>,
    },
    CatchClause {
        parameter: NodeId,
        body: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    Throw {
        value: NodeId,
    },
    Switch {
        subject: NodeId,
        cases: Vec<NodeId>,
    },
    CaseBlock {
        /// `None` for the default case.
        test: Option<NodeId>,
        body: Vec<NodeId>,
    },
    Assert {
        condition: NodeId,
        message: Option<NodeId>,
    },
    Break,
    Continue,

    // --- expressions ---
    Variable {
        name: String,
        /// Filled by the scope resolver. A declaration points at itself.
        accessed_variable: Option<NodeId>,
    },
    Constant {
        value: ConstantValue,
    },
    PropertyExpr {
        object: NodeId,
        /// Constant node holding the property name; its range is the
        /// identifier alone.
        property: NodeId,
        safe: bool,
        spread: bool,
    },
    MethodCall {
        object: Option<NodeId>,
        method: String,
        method_range: SourceRange,
        arguments: Vec<NodeId>,
        safe: bool,
    },
    ConstructorCall {
        type_name: String,
        /// Range of the type spelling alone; reference edges to the class
        /// use this, not the whole call.
        type_range: SourceRange,
        arguments: Vec<NodeId>,
    },
    ClassExpr {
        type_name: String,
    },
    Closure {
        parameters: Vec<NodeId>,
        body: NodeId,
    },
    Lambda {
        parameters: Vec<NodeId>,
        body: NodeId,
    },
    MethodReference {
        object: NodeId,
        method: String,
    },
    ListLiteral {
        elements: Vec<NodeId>,
    },
    MapLiteral {
        entries: Vec<NodeId>,
    },
    MapEntry {
        key: NodeId,
        value: NodeId,
    },
    BinaryExpr {
        op: String,
        left: NodeId,
        right: NodeId,
    },
    UnaryExpr {
        op: String,
        operand: NodeId,
    },
    TernaryExpr {
        condition: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    CastExpr {
        type_name: String,
        expression: NodeId,
    },
    GString {
        /// Alternating literal Constant segments and embedded expressions.
        segments: Vec<NodeId>,
    },
    IndexExpr {
        object: NodeId,
        index: NodeId,
    },
}

impl NodeKind {
    /// Children in fixed traversal order. The visitor, the parent map, and
    /// every position query observe exactly this order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Module { package, imports, classes } => {
                out.extend(package.iter().copied());
                out.extend(imports.iter().copied());
                out.extend(classes.iter().copied());
            }
            NodeKind::Package { .. }
            | NodeKind::Import { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Variable { .. }
            | NodeKind::Constant { .. }
            | NodeKind::ClassExpr { .. } => {}
            NodeKind::Annotation { arguments, .. } => out.extend(arguments.iter().copied()),
            NodeKind::Class {
                annotations, fields, properties, methods, inner_classes, ..
            } => {
                out.extend(annotations.iter().copied());
                out.extend(fields.iter().copied());
                out.extend(properties.iter().copied());
                out.extend(methods.iter().copied());
                out.extend(inner_classes.iter().copied());
            }
            NodeKind::Field { annotations, initializer, .. }
            | NodeKind::Property { annotations, initializer, .. } => {
                out.extend(annotations.iter().copied());
                out.extend(initializer.iter().copied());
            }
            NodeKind::Method { annotations, parameters, body, .. } => {
                out.extend(annotations.iter().copied());
                out.extend(parameters.iter().copied());
                out.extend(body.iter().copied());
            }
            NodeKind::Parameter { default_value, .. } => {
                out.extend(default_value.iter().copied());
            }
            NodeKind::Block { statements } => out.extend(statements.iter().copied()),
            NodeKind::ExpressionStmt { expression } => out.push(*expression),
            NodeKind::VariableDeclaration { target, initializer, .. } => {
                out.push(*target);
                out.extend(initializer.iter().copied());
            }
            NodeKind::If { condition, then_branch, else_branch } => {
                out.push(*condition);
                out.push(*then_branch);
                out.extend(else_branch.iter().copied());
            }
            NodeKind::While { condition, body } => {
                out.push(*condition);
                out.push(*body);
            }
            NodeKind::For { init, condition, update, body } => {
                out.extend(init.iter().copied());
                out.extend(condition.iter().copied());
                out.extend(update.iter().copied());
                out.push(*body);
            }
            NodeKind::ForIn { variable, iterable, body } => {
                out.push(*variable);
                out.push(*iterable);
                out.push(*body);
            }
            NodeKind::TryCatch { body, catches, finally_block } => {
                out.push(*body);
                out.extend(catches.iter().copied());
                out.extend(finally_block.iter().copied());
            }
            NodeKind::CatchClause { parameter, body } => {
                out.push(*parameter);
                out.push(*body);
            }
            NodeKind::Return { value } => out.extend(value.iter().copied()),
            NodeKind::Throw { value } => out.push(*value),
            NodeKind::Switch { subject, cases } => {
                out.push(*subject);
                out.extend(cases.iter().copied());
            }
            NodeKind::CaseBlock { test, body } => {
                out.extend(test.iter().copied());
                out.extend(body.iter().copied());
            }
            NodeKind::Assert { condition, message } => {
                out.push(*condition);
                out.extend(message.iter().copied());
            }
            NodeKind::PropertyExpr { object, property, .. } => {
                out.push(*object);
                out.push(*property);
            }
            NodeKind::MethodCall { object, arguments, .. } => {
                out.extend(object.iter().copied());
                out.extend(arguments.iter().copied());
            }
            NodeKind::ConstructorCall { arguments, .. } => {
                out.extend(arguments.iter().copied());
            }
            NodeKind::Closure { parameters, body } | NodeKind::Lambda { parameters, body } => {
                out.extend(parameters.iter().copied());
                out.push(*body);
            }
            NodeKind::MethodReference { object, .. } => out.push(*object),
            NodeKind::ListLiteral { elements } => out.extend(elements.iter().copied()),
            NodeKind::MapLiteral { entries } => out.extend(entries.iter().copied()),
            NodeKind::MapEntry { key, value } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::BinaryExpr { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::UnaryExpr { operand, .. } => out.push(*operand),
            NodeKind::TernaryExpr { condition, then_expr, else_expr } => {
                out.push(*condition);
                out.push(*then_expr);
                out.push(*else_expr);
            }
            NodeKind::CastExpr { expression, .. } => out.push(*expression),
            NodeKind::GString { segments } => out.extend(segments.iter().copied()),
            NodeKind::IndexExpr { object, index } => {
                out.push(*object);
                out.push(*index);
            }
        }
        out
    }

    /// Stable kind label for logging and hover detail lines.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Module { .. } => "Module",
            NodeKind::Package { .. } => "Package",
            NodeKind::Import { .. } => "Import",
            NodeKind::Annotation { .. } => "Annotation",
            NodeKind::Class { .. } => "Class",
            NodeKind::Field { .. } => "Field",
            NodeKind::Property { .. } => "Property",
            NodeKind::Method { .. } => "Method",
            NodeKind::Parameter { .. } => "Parameter",
            NodeKind::Block { .. } => "Block",
            NodeKind::ExpressionStmt { .. } => "ExpressionStmt",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::If { .. } => "If",
            NodeKind::While { .. } => "While",
            NodeKind::For { .. } => "For",
            NodeKind::ForIn { .. } => "ForIn",
            NodeKind::TryCatch { .. } => "TryCatch",
            NodeKind::CatchClause { .. } => "CatchClause",
            NodeKind::Return { .. } => "Return",
            NodeKind::Throw { .. } => "Throw",
            NodeKind::Switch { .. } => "Switch",
            NodeKind::CaseBlock { .. } => "CaseBlock",
            NodeKind::Assert { .. } => "Assert",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::Variable { .. } => "Variable",
            NodeKind::Constant { .. } => "Constant",
            NodeKind::PropertyExpr { .. } => "PropertyExpr",
            NodeKind::MethodCall { .. } => "MethodCall",
            NodeKind::ConstructorCall { .. } => "ConstructorCall",
            NodeKind::ClassExpr { .. } => "ClassExpr",
            NodeKind::Closure { .. } => "Closure",
            NodeKind::Lambda { .. } => "Lambda",
            NodeKind::MethodReference { .. } => "MethodReference",
            NodeKind::ListLiteral { .. } => "ListLiteral",
            NodeKind::MapLiteral { .. } => "MapLiteral",
            NodeKind::MapEntry { .. } => "MapEntry",
            NodeKind::BinaryExpr { .. } => "BinaryExpr",
            NodeKind::UnaryExpr { .. } => "UnaryExpr",
            NodeKind::TernaryExpr { .. } => "TernaryExpr",
            NodeKind::CastExpr { .. } => "CastExpr",
            NodeKind::GString { .. } => "GString",
            NodeKind::IndexExpr { .. } => "IndexExpr",
        }
    }

    /// Tie-break priority for overlapping nodes at a position. Higher wins.
    ///
    /// The ordering is fixed: Constant > Variable > PropertyExpr >
    /// MethodCall > other expressions > statements > declarations > Class >
    /// Module.
    pub fn position_priority(&self) -> u8 {
        match self {
            NodeKind::Constant { .. } => 90,
            NodeKind::Variable { .. } => 80,
            NodeKind::PropertyExpr { .. } => 70,
            NodeKind::MethodCall { .. } => 60,
            NodeKind::ConstructorCall { .. }
            | NodeKind::ClassExpr { .. }
            | NodeKind::Closure { .. }
            | NodeKind::Lambda { .. }
            | NodeKind::MethodReference { .. }
            | NodeKind::ListLiteral { .. }
            | NodeKind::MapLiteral { .. }
            | NodeKind::MapEntry { .. }
            | NodeKind::BinaryExpr { .. }
            | NodeKind::UnaryExpr { .. }
            | NodeKind::TernaryExpr { .. }
            | NodeKind::CastExpr { .. }
            | NodeKind::GString { .. }
            | NodeKind::IndexExpr { .. } => 50,
            NodeKind::Parameter { .. } => 46,
            NodeKind::Block { .. }
            | NodeKind::ExpressionStmt { .. }
            | NodeKind::VariableDeclaration { .. }
            | NodeKind::If { .. }
            | NodeKind::While { .. }
            | NodeKind::For { .. }
            | NodeKind::ForIn { .. }
            | NodeKind::TryCatch { .. }
            | NodeKind::CatchClause { .. }
            | NodeKind::Return { .. }
            | NodeKind::Throw { .. }
            | NodeKind::Switch { .. }
            | NodeKind::CaseBlock { .. }
            | NodeKind::Assert { .. }
            | NodeKind::Break
            | NodeKind::Continue => 40,
            NodeKind::Import { .. } | NodeKind::Package { .. } | NodeKind::Annotation { .. } => 35,
            NodeKind::Field { .. } | NodeKind::Property { .. } | NodeKind::Method { .. } => 30,
            NodeKind::Class { .. } => 20,
            NodeKind::Module { .. } => 0,
        }
    }

    /// True for nodes that declare a named symbol.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::Class { .. }
                | NodeKind::Field { .. }
                | NodeKind::Property { .. }
                | NodeKind::Method { .. }
                | NodeKind::Parameter { .. }
                | NodeKind::Import { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn priority_table_matches_spec_order() {
        let constant = NodeKind::Constant { value: ConstantValue::Null };
        let variable = NodeKind::Variable { name: "x".into(), accessed_variable: None };
        let property =
            NodeKind::PropertyExpr { object: NodeId(0), property: NodeId(1), safe: false, spread: false };
        let call = NodeKind::MethodCall {
            object: None,
            method: "m".into(),
            method_range: SourceRange::synthetic(),
            arguments: vec![],
            safe: false,
        };
        let module = NodeKind::Module { package: None, imports: vec![], classes: vec![] };

        let mut priorities = vec![
            call.position_priority(),
            property.position_priority(),
            module.position_priority(),
            constant.position_priority(),
            variable.position_priority(),
        ];
        priorities.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(
            priorities,
            vec![
                constant.position_priority(),
                variable.position_priority(),
                property.position_priority(),
                call.position_priority(),
                module.position_priority(),
            ]
        );
    }

    #[test]
    fn children_order_covers_method_shape() {
        let method = NodeKind::Method {
            name: "m".into(),
            return_type: None,
            modifiers: Modifiers::default(),
            annotations: vec![NodeId(1)],
            parameters: vec![NodeId(2), NodeId(3)],
            body: Some(NodeId(4)),
            is_constructor: false,
            name_range: SourceRange::synthetic(),
        };
        assert_eq!(method.children(), vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4)]);
    }

    #[test]
    fn leaves_have_no_children() {
        let import = NodeKind::Import {
            class_name: "java.util.List".into(),
            alias: None,
            is_static: false,
            is_star: false,
        };
        assert!(import.children().is_empty());
        assert!(import.is_declaration());
    }
}
