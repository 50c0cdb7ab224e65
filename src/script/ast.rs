// AST definitions for heap scripts

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A parsed script
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Top-level statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `class Name(a, b)` or `slots class Name(a, b)`
    ClassDef {
        name: String,
        fields: Vec<String>,
        slots: bool,
        location: SourceLocation,
    },
    Assign {
        target: Target,
        value: Expr,
        location: SourceLocation,
    },
    /// Deep size; several roots share one visited set
    Footprint {
        exprs: Vec<Expr>,
        location: SourceLocation,
    },
    /// Shallow (intrinsic) size
    Sizeof {
        expr: Expr,
        location: SourceLocation,
    },
    Dump {
        expr: Expr,
        location: SourceLocation,
    },
    Print {
        expr: Expr,
        location: SourceLocation,
    },
    /// Evaluated for its effect (method calls, allocations)
    Expr {
        expr: Expr,
        location: SourceLocation,
    },
}

impl Statement {
    pub fn location(&self) -> SourceLocation {
        match self {
            Statement::ClassDef { location, .. }
            | Statement::Assign { location, .. }
            | Statement::Footprint { location, .. }
            | Statement::Sizeof { location, .. }
            | Statement::Dump { location, .. }
            | Statement::Print { location, .. }
            | Statement::Expr { location, .. } => *location,
        }
    }
}

/// Left-hand side of an assignment
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Name(String),
    Attribute { object: Expr, name: String },
    Index { object: Expr, index: Expr },
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    None(SourceLocation),
    Bool(bool, SourceLocation),
    Int(i64, SourceLocation),
    Float(f64, SourceLocation),
    Str(String, SourceLocation),
    Bytes(Vec<u8>, SourceLocation),
    Name(String, SourceLocation),
    List(Vec<Expr>, SourceLocation),
    Tuple(Vec<Expr>, SourceLocation),
    Set(Vec<Expr>, SourceLocation),
    Dict(Vec<(Expr, Expr)>, SourceLocation),
    /// Class construction: `Name(args)`
    Call {
        callee: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    Attribute {
        object: Box<Expr>,
        name: String,
        location: SourceLocation,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        location: SourceLocation,
    },
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
}

impl Expr {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::None(loc)
            | Expr::Bool(_, loc)
            | Expr::Int(_, loc)
            | Expr::Float(_, loc)
            | Expr::Str(_, loc)
            | Expr::Bytes(_, loc)
            | Expr::Name(_, loc)
            | Expr::List(_, loc)
            | Expr::Tuple(_, loc)
            | Expr::Set(_, loc)
            | Expr::Dict(_, loc) => *loc,
            Expr::Call { location, .. }
            | Expr::Attribute { location, .. }
            | Expr::Index { location, .. }
            | Expr::MethodCall { location, .. } => *location,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Renders the expression back to script syntax (used as a label in output)
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::None(_) => write!(f, "None"),
            Expr::Bool(b, _) => write!(f, "{}", if *b { "True" } else { "False" }),
            Expr::Int(n, _) => write!(f, "{}", n),
            Expr::Float(x, _) => write!(f, "{:?}", x),
            Expr::Str(s, _) => write!(f, "{:?}", s),
            Expr::Bytes(b, _) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            Expr::Name(name, _) => write!(f, "{}", name),
            Expr::List(items, _) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Expr::Tuple(items, _) => {
                write!(f, "(")?;
                write_list(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Expr::Set(items, _) => {
                write!(f, "{{")?;
                write_list(f, items)?;
                write!(f, "}}")
            }
            Expr::Dict(pairs, _) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Expr::Call { callee, args, .. } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Attribute { object, name, .. } => write!(f, "{}.{}", object, name),
            Expr::Index { object, index, .. } => write!(f, "{}[{}]", object, index),
            Expr::MethodCall {
                object,
                method,
                args,
                ..
            } => {
                write!(f, "{}.{}(", object, method)?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}
