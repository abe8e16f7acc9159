// Expression AST definitions for the grammar language

use crate::grammar::value::Value;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Binary operators, in the grammar's fixed precedence ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
}

impl BinOp {
    /// Precedence level, higher binds tighter. Used by the pretty-printer
    /// to emit minimal parentheses that re-parse identically.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Ne => 3,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg, // -x
    Not, // !x
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnOp::Neg => write!(f, "-"),
            UnOp::Not => write!(f, "!"),
        }
    }
}

/// An expression tree node.
///
/// Trees are owned and read-only after grammar load; the evaluator walks
/// them without mutation, so one tree is shared by every generation and
/// every rewrite draw. Each node carries the [`SourceLocation`] where it
/// started so evaluation errors can point back into the grammar text.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(Value, SourceLocation),
    Variable(String, SourceLocation),
    Unary {
        op: UnOp,
        operand: Box<Expression>,
        location: SourceLocation,
    },
    Binary {
        op: BinOp,
        left: Box<Expression>,
        right: Box<Expression>,
        location: SourceLocation,
    },
    Call {
        name: String,
        args: Vec<Expression>,
        location: SourceLocation,
    },
}

impl Expression {
    /// Returns the source location where this expression appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Expression::Number(_, loc)
            | Expression::Variable(_, loc)
            | Expression::Unary { location: loc, .. }
            | Expression::Binary { location: loc, .. }
            | Expression::Call { location: loc, .. } => *loc,
        }
    }

    /// Collect every variable name referenced by this tree into `out`.
    ///
    /// Used by the parser's load-time check that guards and successor
    /// templates only reference bound formals or constants.
    pub fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expression::Number(..) => {}
            Expression::Variable(name, _) => out.push(name),
            Expression::Unary { operand, .. } => operand.collect_variables(out),
            Expression::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Expression::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        match self {
            Expression::Number(v, _) => write!(f, "{}", v),
            Expression::Variable(name, _) => write!(f, "{}", name),
            Expression::Unary { op, operand, .. } => {
                write!(f, "{}", op)?;
                operand.fmt_prec(f, 7)
            }
            Expression::Binary {
                op, left, right, ..
            } => {
                let prec = op.precedence();
                let parens = prec < parent;
                if parens {
                    write!(f, "(")?;
                }
                left.fmt_prec(f, prec)?;
                write!(f, " {} ", op)?;
                // +1 keeps left associativity on re-parse
                right.fmt_prec(f, prec + 1)?;
                if parens {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Expression::Call { name, args, .. } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    arg.fmt_prec(f, 0)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn num(n: i64) -> Expression {
        Expression::Number(Value::Int(n), loc())
    }

    fn var(name: &str) -> Expression {
        Expression::Variable(name.to_string(), loc())
    }

    fn bin(op: BinOp, left: Expression, right: Expression) -> Expression {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            location: loc(),
        }
    }

    #[test]
    fn display_omits_redundant_parens() {
        let e = bin(BinOp::Add, bin(BinOp::Mul, var("x"), num(2)), num(1));
        assert_eq!(e.to_string(), "x * 2 + 1");
    }

    #[test]
    fn display_keeps_necessary_parens() {
        let e = bin(BinOp::Mul, var("x"), bin(BinOp::Add, num(2), num(1)));
        assert_eq!(e.to_string(), "x * (2 + 1)");
    }

    #[test]
    fn display_parenthesizes_right_subtraction() {
        let e = bin(BinOp::Sub, var("x"), bin(BinOp::Sub, var("y"), var("z")));
        assert_eq!(e.to_string(), "x - (y - z)");
    }

    #[test]
    fn collect_variables_walks_whole_tree() {
        let e = bin(
            BinOp::And,
            bin(BinOp::Gt, var("x"), num(0)),
            Expression::Call {
                name: "sin".to_string(),
                args: vec![var("y")],
                location: loc(),
            },
        );
        let mut vars = Vec::new();
        e.collect_variables(&mut vars);
        assert_eq!(vars, vec!["x", "y"]);
    }
}
