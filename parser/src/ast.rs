//! TJS syntax tree
//!
//! Nodes live in an arena ([`Ast`]) and refer to each other by [`NodeId`].
//! Children are owned through the variant fields; the `parent` link is a
//! plain index used only for ancestry queries.
//!
//! Child slots that a malformed program may leave empty are `Option`s, and
//! every node carries a `completed` flag telling whether its production
//! (and everything below it) parsed cleanly.

use source_map::{Position, Range};
use std::fmt::Write as _;
use std::ops;

use crate::analysis_type::{AnalysisType, LiteralValue};
use crate::token::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Stat(StatKind),
    Expr(ExprKind),
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum StatKind {
    /// `{ stats }`; the chunk root is a global block without braces
    Block { stats: Vec<NodeId>, is_global: bool },

    /// `;`
    Empty,

    /// `expr;`
    Expr { expr: Option<NodeId> },

    /// `if (pred) stat else stat`
    If {
        pred: Option<NodeId>,
        true_stat: Option<NodeId>,
        false_stat: Option<NodeId>,
    },

    /// `while (pred) body`
    While { pred: Option<NodeId>, body: Option<NodeId> },

    /// `do body while (pred);`
    Do { body: Option<NodeId>, pred: Option<NodeId> },

    /// `for (init; pred; step) body`; `init` may be a `var` statement
    For {
        init: Option<NodeId>,
        pred: Option<NodeId>,
        step: Option<NodeId>,
        body: Option<NodeId>,
    },

    /// `with (expr) body`
    With { expr: Option<NodeId>, body: Option<NodeId> },

    /// `switch (expr) { cases }`
    Switch { expr: Option<NodeId>, cases: Vec<NodeId> },

    /// `case pred:` or `default:` followed by its statements
    Case {
        pred: Option<NodeId>,
        is_default: bool,
        stats: Vec<NodeId>,
    },

    /// `try { } catch (e) { }`
    Try {
        try_block: Option<NodeId>,
        catch_param: Option<NodeId>,
        catch_block: Option<NodeId>,
    },

    /// `throw expr;`
    Throw { expr: Option<NodeId> },

    /// `return expr;`
    Return { expr: Option<NodeId> },

    Break,
    Continue,

    /// `function name(params) { body }`
    Function {
        name: Option<NodeId>,
        params: Vec<NodeId>,
        body: Option<NodeId>,
    },

    /// `property name { getter() { } setter(v) { } }`
    Property {
        name: Option<NodeId>,
        getter: Option<NodeId>,
        setter: Option<NodeId>,
    },
    PropertyGetter { body: Option<NodeId> },
    PropertySetter { param: Option<NodeId>, body: Option<NodeId> },

    /// `var a = 1, b;` or `const c = 2;`
    Var { entries: Vec<NodeId>, is_const: bool },
    VarEntry { name: Option<NodeId>, initializer: Option<NodeId> },

    /// `class Name extends Base { members }`
    Class {
        name: Option<NodeId>,
        extends: Vec<NodeId>,
        members: Vec<NodeId>,
    },
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier { name: String },

    Literal { value: LiteralValue },

    /// `this`, `super`, `global`
    Context { kind: ContextKind },

    /// `lhs op rhs`, including `,`, `instanceof` and `incontextof`
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: Option<NodeId>,
    },

    /// `target op value`, right associative
    Assign {
        op: AssignOp,
        target: NodeId,
        value: Option<NodeId>,
    },

    /// Prefix or postfix operator
    Unary {
        op: UnaryOp,
        operand: Option<NodeId>,
        is_prefix: bool,
    },

    /// `pred ? a : b`
    Conditional {
        pred: NodeId,
        true_branch: Option<NodeId>,
        false_branch: Option<NodeId>,
    },

    /// `expr if pred`
    PostIf { expr: NodeId, pred: Option<NodeId> },

    /// `callee(args)`; `args` is a `ParList`
    Call { callee: NodeId, args: Option<NodeId> },

    /// `target[index]`
    Index { target: NodeId, index: Option<NodeId> },

    /// `target.name`; `target` is `None` for `.name` inside `with`
    Member { target: Option<NodeId>, name: Option<String> },

    /// `(inner)`
    Paren { inner: Option<NodeId> },

    /// `[entries]`
    Array { entries: Option<NodeId> },

    /// `%[entries]`
    Dict { entries: Option<NodeId> },

    /// Comma separated entries of calls, arrays and dictionaries
    ParList { entries: Vec<NodeId> },
    ParEntry {
        entry_type: ParEntryType,
        expr: Option<NodeId>,
    },

    /// One parameter of a function declaration
    FunctionParameter {
        param_type: ParamType,
        name: Option<String>,
        init: Option<NodeId>,
    },

    /// `function (params) { body }` used as a value
    FunctionExpr { params: Vec<NodeId>, body: Option<NodeId> },

    /// `@"text ${expr} &expr; text"`; parts are string literals and splices
    InterpolatedString { parts: Vec<NodeId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    This,
    Super,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Comma,
    Instanceof,
    Incontextof,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Shl,
    Shr,
    Ushr,
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
}

impl BinaryOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Comma => BinaryOp::Comma,
            TokenKind::Instanceof => BinaryOp::Instanceof,
            TokenKind::Incontextof => BinaryOp::Incontextof,
            TokenKind::OrOr => BinaryOp::Or,
            TokenKind::AndAnd => BinaryOp::And,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::EqEqEq => BinaryOp::StrictEq,
            TokenKind::NotEqEq => BinaryOp::StrictNotEq,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEq => BinaryOp::LessEq,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::GreaterEq => BinaryOp::GreaterEq,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            TokenKind::Ushr => BinaryOp::Ushr,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Backslash => BinaryOp::IntDiv,
            TokenKind::Percent => BinaryOp::Mod,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Swap,
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Shl,
    Shr,
    Ushr,
}

impl AssignOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::Swap => AssignOp::Swap,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Sub,
            TokenKind::StarAssign => AssignOp::Mul,
            TokenKind::SlashAssign => AssignOp::Div,
            TokenKind::BackslashAssign => AssignOp::IntDiv,
            TokenKind::PercentAssign => AssignOp::Mod,
            TokenKind::AmpAssign => AssignOp::BitAnd,
            TokenKind::PipeAssign => AssignOp::BitOr,
            TokenKind::CaretAssign => AssignOp::BitXor,
            TokenKind::AndAssign => AssignOp::And,
            TokenKind::OrAssign => AssignOp::Or,
            TokenKind::ShlAssign => AssignOp::Shl,
            TokenKind::ShrAssign => AssignOp::Shr,
            TokenKind::UshrAssign => AssignOp::Ushr,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    BitNot,
    Neg,
    Plus,
    Inc,
    Dec,
    New,
    Delete,
    Typeof,
    Isvalid,
    Invalidate,
    /// `#expr`, character code
    CharCode,
    /// `$expr`, character from code
    CharFrom,
    /// `&expr`, property object
    GetObject,
    /// `*expr`, property call
    CallObject,
    ToInt,
    ToReal,
    ToString,
}

impl UnaryOp {
    pub fn prefix_from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::PlusPlus => UnaryOp::Inc,
            TokenKind::MinusMinus => UnaryOp::Dec,
            TokenKind::New => UnaryOp::New,
            TokenKind::Delete => UnaryOp::Delete,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::Isvalid => UnaryOp::Isvalid,
            TokenKind::Invalidate => UnaryOp::Invalidate,
            TokenKind::Hash => UnaryOp::CharCode,
            TokenKind::Dollar => UnaryOp::CharFrom,
            TokenKind::Amp => UnaryOp::GetObject,
            TokenKind::Star => UnaryOp::CallObject,
            TokenKind::Int => UnaryOp::ToInt,
            TokenKind::Real => UnaryOp::ToReal,
            TokenKind::String => UnaryOp::ToString,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParEntryType {
    Normal,
    /// `*`
    UnnamedArgs,
    /// `...`
    CallerArgs,
    /// nothing between two commas
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Normal,
    WithInitializer,
    /// `name*`
    NamedArgs,
    /// `*` or `...`
    UnnamedArgs,
}

impl ParamType {
    pub fn is_variadic(self) -> bool {
        matches!(self, ParamType::NamedArgs | ParamType::UnnamedArgs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessibility {
    LValue,
    RValue,
}

/// Extra data every expression node carries
#[derive(Debug, Clone, PartialEq)]
pub struct ExprInfo {
    pub accessibility: Accessibility,
    pub analysis_type: AnalysisType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub range: Range,
    /// Indices of this node's tokens in the parse's token list
    pub tokens: ops::Range<usize>,
    pub completed: bool,
    pub parent: Option<NodeId>,
    pub expr: Option<ExprInfo>,
}

impl Node {
    pub fn as_stat(&self) -> Option<&StatKind> {
        match &self.kind {
            NodeKind::Stat(stat) => Some(stat),
            NodeKind::Expr(_) => None,
        }
    }

    pub fn as_expr(&self) -> Option<&ExprKind> {
        match &self.kind {
            NodeKind::Expr(expr) => Some(expr),
            NodeKind::Stat(_) => None,
        }
    }
}

fn push_opt(out: &mut Vec<NodeId>, id: &Option<NodeId>) {
    out.extend(id.iter().copied());
}

impl NodeKind {
    /// Direct children in source order
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = vec![];
        match self {
            NodeKind::Stat(stat) => match stat {
                StatKind::Block { stats, .. } => out.extend(stats),
                StatKind::Empty | StatKind::Break | StatKind::Continue => {}
                StatKind::Expr { expr } | StatKind::Throw { expr } | StatKind::Return { expr } => {
                    push_opt(&mut out, expr)
                }
                StatKind::If {
                    pred,
                    true_stat,
                    false_stat,
                } => {
                    push_opt(&mut out, pred);
                    push_opt(&mut out, true_stat);
                    push_opt(&mut out, false_stat);
                }
                StatKind::While { pred, body } => {
                    push_opt(&mut out, pred);
                    push_opt(&mut out, body);
                }
                StatKind::Do { body, pred } => {
                    push_opt(&mut out, body);
                    push_opt(&mut out, pred);
                }
                StatKind::For {
                    init,
                    pred,
                    step,
                    body,
                } => {
                    push_opt(&mut out, init);
                    push_opt(&mut out, pred);
                    push_opt(&mut out, step);
                    push_opt(&mut out, body);
                }
                StatKind::With { expr, body } => {
                    push_opt(&mut out, expr);
                    push_opt(&mut out, body);
                }
                StatKind::Switch { expr, cases } => {
                    push_opt(&mut out, expr);
                    out.extend(cases);
                }
                StatKind::Case { pred, stats, .. } => {
                    push_opt(&mut out, pred);
                    out.extend(stats);
                }
                StatKind::Try {
                    try_block,
                    catch_param,
                    catch_block,
                } => {
                    push_opt(&mut out, try_block);
                    push_opt(&mut out, catch_param);
                    push_opt(&mut out, catch_block);
                }
                StatKind::Function { name, params, body } => {
                    push_opt(&mut out, name);
                    out.extend(params);
                    push_opt(&mut out, body);
                }
                StatKind::Property {
                    name,
                    getter,
                    setter,
                } => {
                    push_opt(&mut out, name);
                    push_opt(&mut out, getter);
                    push_opt(&mut out, setter);
                }
                StatKind::PropertyGetter { body } => push_opt(&mut out, body),
                StatKind::PropertySetter { param, body } => {
                    push_opt(&mut out, param);
                    push_opt(&mut out, body);
                }
                StatKind::Var { entries, .. } => out.extend(entries),
                StatKind::VarEntry { name, initializer } => {
                    push_opt(&mut out, name);
                    push_opt(&mut out, initializer);
                }
                StatKind::Class {
                    name,
                    extends,
                    members,
                } => {
                    push_opt(&mut out, name);
                    out.extend(extends);
                    out.extend(members);
                }
            },
            NodeKind::Expr(expr) => match expr {
                ExprKind::Identifier { .. } | ExprKind::Literal { .. } | ExprKind::Context { .. } => {}
                ExprKind::Binary { lhs, rhs, .. } => {
                    out.push(*lhs);
                    push_opt(&mut out, rhs);
                }
                ExprKind::Assign { target, value, .. } => {
                    out.push(*target);
                    push_opt(&mut out, value);
                }
                ExprKind::Unary { operand, .. } => push_opt(&mut out, operand),
                ExprKind::Conditional {
                    pred,
                    true_branch,
                    false_branch,
                } => {
                    out.push(*pred);
                    push_opt(&mut out, true_branch);
                    push_opt(&mut out, false_branch);
                }
                ExprKind::PostIf { expr, pred } => {
                    out.push(*expr);
                    push_opt(&mut out, pred);
                }
                ExprKind::Call { callee, args } => {
                    out.push(*callee);
                    push_opt(&mut out, args);
                }
                ExprKind::Index { target, index } => {
                    out.push(*target);
                    push_opt(&mut out, index);
                }
                ExprKind::Member { target, .. } => push_opt(&mut out, target),
                ExprKind::Paren { inner } => push_opt(&mut out, inner),
                ExprKind::Array { entries } | ExprKind::Dict { entries } => {
                    push_opt(&mut out, entries)
                }
                ExprKind::ParList { entries } => out.extend(entries),
                ExprKind::ParEntry { expr, .. } => push_opt(&mut out, expr),
                ExprKind::FunctionParameter { init, .. } => push_opt(&mut out, init),
                ExprKind::FunctionExpr { params, body } => {
                    out.extend(params);
                    push_opt(&mut out, body);
                }
                ExprKind::InterpolatedString { parts } => out.extend(parts),
            },
        }
        out
    }

    /// Short variant name, used by dumps and tooling
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Stat(stat) => match stat {
                StatKind::Block { .. } => "Block",
                StatKind::Empty => "Empty",
                StatKind::Expr { .. } => "ExprStat",
                StatKind::If { .. } => "If",
                StatKind::While { .. } => "While",
                StatKind::Do { .. } => "Do",
                StatKind::For { .. } => "For",
                StatKind::With { .. } => "With",
                StatKind::Switch { .. } => "Switch",
                StatKind::Case { .. } => "Case",
                StatKind::Try { .. } => "Try",
                StatKind::Throw { .. } => "Throw",
                StatKind::Return { .. } => "Return",
                StatKind::Break => "Break",
                StatKind::Continue => "Continue",
                StatKind::Function { .. } => "Function",
                StatKind::Property { .. } => "Property",
                StatKind::PropertyGetter { .. } => "Getter",
                StatKind::PropertySetter { .. } => "Setter",
                StatKind::Var { .. } => "Var",
                StatKind::VarEntry { .. } => "VarEntry",
                StatKind::Class { .. } => "Class",
            },
            NodeKind::Expr(expr) => match expr {
                ExprKind::Identifier { .. } => "Identifier",
                ExprKind::Literal { .. } => "Literal",
                ExprKind::Context { .. } => "Context",
                ExprKind::Binary { .. } => "Binary",
                ExprKind::Assign { .. } => "Assign",
                ExprKind::Unary { .. } => "Unary",
                ExprKind::Conditional { .. } => "Conditional",
                ExprKind::PostIf { .. } => "PostIf",
                ExprKind::Call { .. } => "Call",
                ExprKind::Index { .. } => "Index",
                ExprKind::Member { .. } => "Member",
                ExprKind::Paren { .. } => "Paren",
                ExprKind::Array { .. } => "Array",
                ExprKind::Dict { .. } => "Dict",
                ExprKind::ParList { .. } => "ParList",
                ExprKind::ParEntry { .. } => "ParEntry",
                ExprKind::FunctionParameter { .. } => "Parameter",
                ExprKind::FunctionExpr { .. } => "FunctionExpr",
                ExprKind::InterpolatedString { .. } => "InterpolatedString",
            },
        }
    }
}

impl ExprKind {
    fn accessibility(&self) -> Accessibility {
        match self {
            ExprKind::Identifier { .. } | ExprKind::Index { .. } | ExprKind::Member { .. } => {
                Accessibility::LValue
            }
            _ => Accessibility::RValue,
        }
    }

    fn initial_type(&self) -> AnalysisType {
        match self {
            ExprKind::Literal { value } => AnalysisType::Literal(value.clone()),
            _ => AnalysisType::Unknown,
        }
    }
}

/// Arena holding every node of one parse
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and adopt its children
    pub(crate) fn alloc(
        &mut self,
        kind: NodeKind,
        range: Range,
        tokens: ops::Range<usize>,
        completed: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in kind.children() {
            if let Some(node) = self.nodes.get_mut(child.index()) {
                node.parent = Some(id);
            }
        }
        let expr = match &kind {
            NodeKind::Expr(expr) => Some(ExprInfo {
                accessibility: expr.accessibility(),
                analysis_type: expr.initial_type(),
            }),
            NodeKind::Stat(_) => None,
        };
        self.nodes.push(Node {
            kind,
            range,
            tokens,
            completed,
            parent: None,
            expr,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).kind.children()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn is_completed(&self, id: NodeId) -> bool {
        self.node(id).completed
    }

    /// Parent, grandparent, ... up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// The node itself or its nearest ancestor matching `pred`
    pub fn enclosing(&self, id: NodeId, pred: impl Fn(&Node) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|candidate| pred(self.node(*candidate)))
    }

    pub fn analysis_type(&self, id: NodeId) -> Option<&AnalysisType> {
        self.node(id).expr.as_ref().map(|info| &info.analysis_type)
    }

    /// Type annotation hook for a type checker; ignored on statements
    pub fn set_analysis_type(&mut self, id: NodeId, analysis_type: AnalysisType) {
        if let Some(info) = self
            .nodes
            .get_mut(id.index())
            .and_then(|node| node.expr.as_mut())
        {
            info.analysis_type = analysis_type;
        }
    }

    /// Innermost node under `root` whose range contains `pos`
    pub fn node_at(&self, root: NodeId, pos: Position) -> Option<NodeId> {
        if !self.node(root).range.contains(pos) {
            return None;
        }
        let mut current = root;
        'descend: loop {
            for child in self.children(current) {
                if self.node(child).range.contains(pos) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Indented outline of the subtree, one node per line
    pub fn dump(&self, root: NodeId) -> String {
        let mut out = String::new();
        let mut pending = vec![(root, 0usize)];
        while let Some((id, depth)) = pending.pop() {
            self.dump_line(id, depth, &mut out);
            let children = self.children(id);
            pending.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
        out
    }

    fn dump_line(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let _ = write!(out, "{}{}", "  ".repeat(depth), node.kind.name());
        match &node.kind {
            NodeKind::Expr(ExprKind::Identifier { name }) => {
                let _ = write!(out, " {}", name);
            }
            NodeKind::Expr(ExprKind::Literal { value }) => {
                let _ = write!(out, " {}", value);
            }
            NodeKind::Expr(ExprKind::Binary { op, .. }) => {
                let _ = write!(out, " {:?}", op);
            }
            NodeKind::Expr(ExprKind::Unary { op, .. }) => {
                let _ = write!(out, " {:?}", op);
            }
            NodeKind::Expr(ExprKind::Assign { op, .. }) => {
                let _ = write!(out, " {:?}", op);
            }
            NodeKind::Expr(ExprKind::Member {
                name: Some(name), ..
            }) => {
                let _ = write!(out, " .{}", name);
            }
            _ => {}
        }
        if !node.completed {
            out.push_str(" (incomplete)");
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize, end: usize) -> Range {
        Range::new(Position::new(0, start), Position::new(0, end))
    }

    fn build() -> (Ast, NodeId, NodeId, NodeId) {
        let mut ast = Ast::new();
        let lhs = ast.alloc(
            NodeKind::Expr(ExprKind::Identifier { name: "a".into() }),
            range(0, 1),
            0..1,
            true,
        );
        let rhs = ast.alloc(
            NodeKind::Expr(ExprKind::Literal {
                value: LiteralValue::Integer(1),
            }),
            range(4, 5),
            2..3,
            true,
        );
        let sum = ast.alloc(
            NodeKind::Expr(ExprKind::Binary {
                op: BinaryOp::Add,
                lhs,
                rhs: Some(rhs),
            }),
            range(0, 5),
            0..3,
            true,
        );
        (ast, lhs, rhs, sum)
    }

    #[test]
    fn test_parent_links() {
        let (ast, lhs, rhs, sum) = build();
        assert_eq!(ast.parent(lhs), Some(sum));
        assert_eq!(ast.parent(rhs), Some(sum));
        assert_eq!(ast.parent(sum), None);
        assert_eq!(ast.children(sum), vec![lhs, rhs]);
        assert_eq!(ast.ancestors(rhs).collect::<Vec<_>>(), vec![sum]);
    }

    #[test]
    fn test_expression_metadata() {
        let (mut ast, lhs, rhs, sum) = build();
        assert_eq!(ast.node(lhs).expr.as_ref().unwrap().accessibility, Accessibility::LValue);
        assert_eq!(ast.node(sum).expr.as_ref().unwrap().accessibility, Accessibility::RValue);
        assert_eq!(ast.analysis_type(rhs).unwrap().pretty_string(), "1");
        assert_eq!(ast.analysis_type(sum), Some(&AnalysisType::Unknown));

        ast.set_analysis_type(sum, AnalysisType::exact("int"));
        assert_eq!(ast.analysis_type(sum).unwrap().pretty_string(), "int");
    }

    #[test]
    fn test_node_at_finds_innermost() {
        let (ast, lhs, rhs, sum) = build();
        assert_eq!(ast.node_at(sum, Position::new(0, 0)), Some(lhs));
        assert_eq!(ast.node_at(sum, Position::new(0, 4)), Some(rhs));
        assert_eq!(ast.node_at(sum, Position::new(0, 2)), Some(sum));
        assert_eq!(ast.node_at(sum, Position::new(0, 9)), None);
        assert_eq!(
            ast.enclosing(lhs, |node| matches!(node.kind, NodeKind::Expr(ExprKind::Binary { .. }))),
            Some(sum)
        );
    }

    #[test]
    fn test_dump() {
        let (ast, _, _, sum) = build();
        assert_eq!(ast.dump(sum), "Binary Add\n  Identifier a\n  Literal 1\n");
    }

    #[test]
    fn test_dump_deep_chain() {
        let mut ast = Ast::new();
        let mut inner = ast.alloc(
            NodeKind::Expr(ExprKind::Identifier { name: "x".into() }),
            range(0, 1),
            0..1,
            true,
        );
        for _ in 0..4_000 {
            inner = ast.alloc(
                NodeKind::Expr(ExprKind::Paren { inner: Some(inner) }),
                range(0, 1),
                0..1,
                true,
            );
        }
        let dump = ast.dump(inner);
        assert_eq!(dump.lines().count(), 4_001);
        assert!(dump.ends_with("Identifier x\n"));
    }
}
