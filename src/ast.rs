use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub struct Program(pub Vec<Node>);

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    VariableDeclaration {
        name: String,
        value: Box<Node>,
        is_constant: bool,
    },
    Assignment {
        name: String,
        value: Box<Node>,
    },
    Call {
        name: String,
        params: Vec<Node>,
    },
    Loop {
        times: Option<Box<Node>>,
        body: Vec<Node>,
    },
    If(Conditional),
    ElseIf(Conditional),
    Comparison(Box<Node>, Box<Node>),
    Binary(Box<Node>, InfixOperator, Box<Node>),
    Random {
        min: Box<Node>,
        max: Box<Node>,
    },
    SmartPhrase(Vec<Node>),
    Cast {
        value: Box<Node>,
        status: Status,
    },
    Cut(CutMode),
    Banish(String),
    Bussin,
    Help,
    OpenFile,
    Identifier(String),
    Literal(Literal),
}

/// Shared shape of `if` and `elseif`; `alternate` is always another conditional.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Box<Node>,
    pub body: Vec<Node>,
    pub alternate: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InfixOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Num,
    Str,
    Bool,
    Null,
    Undefined,
    Var,
    /// Any unrecognised status; casting to it is the identity.
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CutMode {
    Toggle,
    Modify(String),
}

impl Node {
    pub fn string(value: impl Into<String>) -> Self {
        Node::Literal(Literal::String(value.into()))
    }

    pub fn is_number_literal(&self) -> bool {
        matches!(self, Node::Literal(Literal::Number(_)))
    }

    /// Statement-shaped values that need wrapping when used as an expression.
    pub fn is_block_construct(&self) -> bool {
        matches!(self, Node::Loop { .. } | Node::If(_) | Node::ElseIf(_))
    }
}

impl InfixOperator {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(InfixOperator::Plus),
            '-' => Some(InfixOperator::Minus),
            '*' => Some(InfixOperator::Multiply),
            '/' => Some(InfixOperator::Divide),
            _ => None,
        }
    }
}

impl From<&str> for Status {
    fn from(status: &str) -> Self {
        match status {
            "num" => Status::Num,
            "str" => Status::Str,
            "bool" => Status::Bool,
            "null" => Status::Null,
            "undefined" => Status::Undefined,
            "var" => Status::Var,
            other => Status::Other(other.to_string()),
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in &self.0 {
            writeln!(f, "{}", node)?;
        }
        Ok(())
    }
}

fn write_body(f: &mut std::fmt::Formatter<'_>, body: &[Node]) -> std::fmt::Result {
    writeln!(f, "{{")?;
    for node in body {
        writeln!(f, "{}", node)?;
    }
    write!(f, "}}")
}

fn write_list(f: &mut std::fmt::Formatter<'_>, nodes: &[Node], separator: &str) -> std::fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        write!(f, "{}", node)?;
        if i != nodes.len() - 1 {
            write!(f, "{}", separator)?;
        }
    }
    Ok(())
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::VariableDeclaration {
                name,
                value,
                is_constant,
            } => {
                let keyword = if *is_constant { "fr" } else { "this" };
                write!(f, "{keyword} '{name}' is {value}")
            }
            Node::Assignment { name, value } => write!(f, "set '{name}' is {value}"),
            Node::Call { name, params } => {
                write!(f, "{name}!")?;
                if !params.is_empty() {
                    write!(f, " ")?;
                    write_list(f, params, ", ")?;
                }
                Ok(())
            }
            Node::Loop { times, body } => {
                write!(f, "loop! ")?;
                if let Some(times) = times {
                    write!(f, "[{times}] ")?;
                }
                write_body(f, body)
            }
            Node::If(conditional) => write!(f, "if {conditional}"),
            Node::ElseIf(conditional) => write!(f, "elseif {conditional}"),
            Node::Comparison(left, right) => write!(f, "({left} is {right})"),
            Node::Binary(left, op, right) => write!(f, "({left} {op} {right})"),
            Node::Random { min, max } => write!(f, "random {min} {max}"),
            Node::SmartPhrase(parts) => write_list(f, parts, " "),
            Node::Cast { value, status } => write!(f, "{value}:{status}"),
            Node::Cut(CutMode::Toggle) => write!(f, "cut!"),
            Node::Cut(CutMode::Modify(target)) => write!(f, "cut! '{target}'"),
            Node::Banish(target) => write!(f, "banish! '{target}'"),
            Node::Bussin => write!(f, "bussin"),
            Node::Help => write!(f, "vx"),
            Node::OpenFile => write!(f, "openfile"),
            Node::Identifier(name) => write!(f, "{name}"),
            Node::Literal(literal) => write!(f, "{literal}"),
        }
    }
}

impl Display for Conditional {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ", self.condition)?;
        write_body(f, &self.body)?;
        if let Some(alternate) = &self.alternate {
            write!(f, " {alternate}")?;
        }
        Ok(())
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", crate::number::format(*n)),
            Literal::String(s) => write!(f, "\"{}\"", s),
            Literal::Boolean(true) => write!(f, "yup"),
            Literal::Boolean(false) => write!(f, "nah"),
            Literal::Null => write!(f, "null"),
            Literal::Undefined => write!(f, "undefined"),
        }
    }
}

impl Display for InfixOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfixOperator::Plus => write!(f, "+"),
            InfixOperator::Minus => write!(f, "-"),
            InfixOperator::Multiply => write!(f, "*"),
            InfixOperator::Divide => write!(f, "/"),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Num => write!(f, "num"),
            Status::Str => write!(f, "str"),
            Status::Bool => write!(f, "bool"),
            Status::Null => write!(f, "null"),
            Status::Undefined => write!(f, "undefined"),
            Status::Var => write!(f, "var"),
            Status::Other(other) => write!(f, "{}", other),
        }
    }
}
