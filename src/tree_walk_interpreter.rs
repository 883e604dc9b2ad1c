mod control_flow;
mod environment;
mod value;

use std::{
    cell::RefCell,
    fmt::{Debug, Display},
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use log::debug;
use rand::Rng;

use crate::ast::{Conditional, CutMode, InfixOperator, Node, Program, Status};

use self::control_flow::Unwind;
pub use self::{control_flow::HostSignal, environment::Environment, value::Value};

/// Manual pages shown for `vx`.
pub const MANUAL: [&str; 3] = [
    "[DOCS: VARIABLES & SYNTAX]
* syntax error: variable must be a quoted string
* const-
  fr 'name' is value
  fr this 'name' is value
* let-
  this 'name' is value",
    "[DOCS: LOOPS & MATH]
* for loop-
  loop! [counter] { code }
* math-
  debug! (1+1)
  (Math MUST be in parentheses)",
    "[DOCS: TYPES & AUTOSTATUS]
* \"value\"        -> :str
* value:str      -> :str
* value          -> :str (by autostatus)
* 1              -> :str (by autostatus)
* 1:num          -> :num",
];

pub struct Interpreter {
    stdout: Rc<RefCell<dyn std::io::Write>>,
    interrupt: Arc<AtomicBool>,
    show_manual: Box<dyn FnMut(&[&'static str])>,
}

impl Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("interrupt", &self.interrupt)
            .finish()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Rc::new(RefCell::new(std::io::stdout())))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("{kind}\n    at: {current_statement}")]
    Execution {
        kind: ExecutionErrorKind,
        current_statement: Node,
    },
}

impl ExecutionError {
    pub fn kind(&self) -> &ExecutionErrorKind {
        match self {
            ExecutionError::Execution { kind, .. } => kind,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionErrorKind {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("[ReferenceError] '{0}' undefined.")]
    UndeclaredVariable(String),
    #[error("[ReferenceError] Unknown identifier '{0}'. Variables must be quoted.")]
    UnquotedIdentifier(String),
    #[error("[ConstError] '{0}' is fr (constant).")]
    ConstantReassignment(String),
    #[error("[Interrupted] Run cancelled by the host.")]
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Reference,
    Const,
    Host,
}

impl ExecutionErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExecutionErrorKind::UndeclaredVariable(_) | ExecutionErrorKind::UnquotedIdentifier(_) => {
                ErrorCategory::Reference
            }
            ExecutionErrorKind::ConstantReassignment(_) => ErrorCategory::Const,
            ExecutionErrorKind::IO(_) | ExecutionErrorKind::Interrupted => ErrorCategory::Host,
        }
    }
}

impl Interpreter {
    pub fn new(stdout: Rc<RefCell<dyn std::io::Write>>) -> Self {
        Self {
            stdout,
            interrupt: Arc::new(AtomicBool::new(false)),
            show_manual: Box::new(|_| debug!("vx: no manual viewer installed")),
        }
    }

    /// Receives the manual pages whenever `vx` runs. The run carries on
    /// once the viewer returns.
    pub fn with_manual_viewer(mut self, viewer: impl FnMut(&[&'static str]) + 'static) -> Self {
        self.show_manual = Box::new(viewer);
        self
    }

    /// Shares a cancellation flag with the host. Loops check it before every
    /// iteration; an unbounded `loop!` only ends through it.
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    /// Runs `program` against `environment`. A host signal ends the run early
    /// and is returned for the host to act on.
    pub fn interpret(
        &mut self,
        program: &Program,
        environment: &mut Environment,
    ) -> Result<Option<HostSignal>, ExecutionError> {
        for node in program.0.iter() {
            #[cfg(feature = "trace")]
            log::trace!("executing {node}");

            match self.evaluate(node, environment) {
                Ok(_) => {}
                Err(Unwind::Signal(signal)) => {
                    debug!("handing {signal:?} back to the host");
                    return Ok(Some(signal));
                }
                Err(Unwind::Error(kind)) => {
                    return Err(ExecutionError::Execution {
                        kind,
                        current_statement: node.clone(),
                    })
                }
            }
        }

        Ok(None)
    }

    fn write_line(&self, text: impl Display) -> Result<(), ExecutionErrorKind> {
        writeln!(self.stdout.borrow_mut(), "{}", text)?;
        Ok(())
    }

    fn check_interrupt(&self) -> Result<(), ExecutionErrorKind> {
        if self.interrupt.load(Ordering::Relaxed) {
            return Err(ExecutionErrorKind::Interrupted);
        }
        Ok(())
    }

    fn execute_body(&mut self, body: &[Node], env: &mut Environment) -> Result<(), Unwind> {
        for node in body {
            #[cfg(feature = "trace")]
            log::trace!("executing {node}");

            self.evaluate(node, env)?;
        }
        Ok(())
    }

    /// Numeric literals stored straight into a variable keep their text form.
    fn stored_value(&mut self, node: &Node, env: &mut Environment) -> Result<Value, Unwind> {
        let value = self.evaluate(node, env)?;
        if node.is_number_literal() {
            return Ok(Value::String(value.to_string()));
        }
        Ok(value)
    }

    /// Statements evaluate to `undefined`.
    fn evaluate(&mut self, node: &Node, env: &mut Environment) -> Result<Value, Unwind> {
        let value = match node {
            Node::Literal(literal) => Value::from(literal),
            Node::Identifier(name) => match name.as_str() {
                "null" => Value::Null,
                "undefined" => Value::Undefined,
                _ => return Err(ExecutionErrorKind::UnquotedIdentifier(name.clone()).into()),
            },
            Node::Cast { value, status } => {
                if *status == Status::Var {
                    let key = match value.as_ref() {
                        Node::Identifier(name) => name.clone(),
                        other => self.evaluate(other, env)?.to_string(),
                    };
                    env.get(&key)
                } else {
                    self.evaluate(value, env)?.cast(status)
                }
            }
            Node::SmartPhrase(parts) => {
                let mut texts = Vec::with_capacity(parts.len());
                for part in parts {
                    texts.push(self.evaluate(part, env)?.phrase_text());
                }
                Value::String(texts.join(" "))
            }
            Node::VariableDeclaration {
                name,
                value,
                is_constant,
            } => {
                let value = self.stored_value(value, env)?;
                env.declare(name.clone(), value, *is_constant);
                Value::Undefined
            }
            Node::Assignment { name, value } => {
                env.ensure_assignable(name)?;
                let value = self.stored_value(value, env)?;
                env.assign(name, value)?;
                Value::Undefined
            }
            Node::Cut(CutMode::Toggle) => {
                let on = env.toggle_auto_status();
                debug!("autoStatus toggled, nothing reads it yet");
                self.write_line(format_args!(
                    "[System] AutoStatus is now: {}",
                    if on { "ON" } else { "OFF" }
                ))?;
                Value::Undefined
            }
            Node::Cut(CutMode::Modify(target)) => {
                if !env.unconst(target) {
                    debug!("cut! '{target}': not a constant");
                }
                Value::Undefined
            }
            Node::Banish(target) => {
                if !env.banish(target) {
                    debug!("banish! '{target}': not declared");
                }
                Value::Undefined
            }
            Node::Call { name, params } => {
                for param in params {
                    let value = self.evaluate(param, env)?;
                    if name == "debug" {
                        self.write_line(value)?;
                    }
                }
                if name != "debug" {
                    debug!("{name}! is not a command, ignoring");
                }
                Value::Undefined
            }
            Node::Loop { times, body } => {
                match times {
                    Some(times) => {
                        let limit = self.evaluate(times, env)?.to_number();
                        let mut i = 0.0;
                        while i < limit {
                            self.check_interrupt()?;
                            self.execute_body(body, env)?;
                            i += 1.0;
                        }
                    }
                    None => loop {
                        self.check_interrupt()?;
                        self.execute_body(body, env)?;
                    },
                }
                Value::Undefined
            }
            Node::If(conditional) | Node::ElseIf(conditional) => {
                self.conditional(conditional, env)?;
                Value::Undefined
            }
            Node::Comparison(left, right) => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                Value::Boolean(left == right)
            }
            Node::Binary(left, op, right) => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                match (op, left, right) {
                    (InfixOperator::Plus, Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                    (InfixOperator::Plus, a, b) => Value::String(format!("{a}{b}")),
                    (InfixOperator::Minus, a, b) => Value::Number(a.to_number() - b.to_number()),
                    (InfixOperator::Multiply, a, b) => Value::Number(a.to_number() * b.to_number()),
                    (InfixOperator::Divide, a, b) => Value::Number(a.to_number() / b.to_number()),
                }
            }
            Node::Random { min, max } => {
                let min = self.evaluate(min, env)?.to_number();
                let max = self.evaluate(max, env)?.to_number();
                let unit = rand::thread_rng().gen::<f64>();
                Value::Number((unit * (max - min + 1.0) + min).floor())
            }
            Node::Bussin => {
                self.write_line("Bussin. Exiting...")?;
                return Err(Unwind::Signal(HostSignal::Exit));
            }
            Node::Help => {
                (self.show_manual)(&MANUAL);
                Value::Undefined
            }
            Node::OpenFile => return Err(Unwind::Signal(HostSignal::RequestFilePath)),
        };

        Ok(value)
    }

    fn conditional(&mut self, conditional: &Conditional, env: &mut Environment) -> Result<(), Unwind> {
        if self.evaluate(&conditional.condition, env)?.is_yup() {
            self.execute_body(&conditional.body, env)
        } else if let Some(alternate) = &conditional.alternate {
            self.evaluate(alternate, env).map(|_| ())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{parser, tokenizer};

    fn run(source: &str, env: &mut Environment) -> (Result<Option<HostSignal>, ExecutionError>, String) {
        let tokens = tokenizer::tokens(source).unwrap();
        let program = parser::program(&tokens).unwrap();
        let output = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::new(output.clone());
        let result = interpreter.interpret(&program, env);
        let output = String::from_utf8(output.take()).unwrap();
        (result, output)
    }

    #[test]
    fn test_numeric_literal_is_stored_as_text() {
        let mut env = Environment::new();
        run("this 'a' is 5 this 'b' is 5:num", &mut env).0.unwrap();
        assert_eq!(env.get("a"), Value::String("5".to_string()));
        assert_eq!(env.get("b"), Value::Number(5.0));
    }

    #[test]
    fn test_bare_identifier_is_a_reference_error() {
        let mut env = Environment::new();
        let err = run("debug! count", &mut env).0.unwrap_err();
        assert!(matches!(err.kind(), ExecutionErrorKind::UnquotedIdentifier(name) if name == "count"));
        assert_eq!(err.kind().category(), ErrorCategory::Reference);
    }

    #[test]
    fn test_null_identifier_in_cast() {
        let mut env = Environment::new();
        let (result, output) = run("debug! null:str", &mut env);
        result.unwrap();
        assert_eq!(output, "null\n");
    }

    #[test]
    fn test_arithmetic() {
        let mut env = Environment::new();
        let (result, output) = run(
            "debug! (1:num + 2:num) (\"a\" + 1) (\"6\" * 2) (\"x\" - 1) (1 / 0)",
            &mut env,
        );
        result.unwrap();
        assert_eq!(output, "3\na1\n12\nNaN\nInfinity\n");
    }

    #[test]
    fn test_smart_phrase_joins_with_spaces() {
        let mut env = Environment::new();
        let (result, output) = run(
            "this 'n' is \"Ada\" debug! \"hi\" \"n\":var 2 undefined \"!\"",
            &mut env,
        );
        result.unwrap();
        assert_eq!(output, "hi Ada 2  !\n");
    }

    #[test]
    fn test_cut_toggle_reports_state() {
        let mut env = Environment::new();
        let (result, output) = run("cut! cut!", &mut env);
        result.unwrap();
        assert_eq!(
            output,
            "[System] AutoStatus is now: OFF\n[System] AutoStatus is now: ON\n"
        );
        assert!(env.auto_status());
    }

    #[test]
    fn test_if_requires_yup() {
        let mut env = Environment::new();
        let (result, output) = run(
            "if 1 { debug! \"number\" } if \"yup\" { debug! \"text\" } if (\"a\" is \"a\") { debug! \"cmp\" }",
            &mut env,
        );
        result.unwrap();
        assert_eq!(output, "text\ncmp\n");
    }

    #[test]
    fn test_signals_end_the_run() {
        let mut env = Environment::new();
        let (result, output) = run("debug! 1 loop! [3] { openfile } debug! 2", &mut env);
        assert_eq!(result.unwrap(), Some(HostSignal::RequestFilePath));
        assert_eq!(output, "1\n");

        let (result, output) = run("if yup { bussin } debug! \"after\"", &mut env);
        assert_eq!(result.unwrap(), Some(HostSignal::Exit));
        assert_eq!(output, "Bussin. Exiting...\n");
    }

    #[test]
    fn test_manual_does_not_end_the_run() {
        let tokens = tokenizer::tokens("vx debug! \"after\" loop! [2] { vx }").unwrap();
        let program = parser::program(&tokens).unwrap();
        let output = Rc::new(RefCell::new(Vec::new()));
        let shown = Rc::new(RefCell::new(Vec::new()));
        let viewer_log = shown.clone();
        let mut interpreter = Interpreter::new(output.clone())
            .with_manual_viewer(move |pages| viewer_log.borrow_mut().push(pages.len()));

        let signal = interpreter
            .interpret(&program, &mut Environment::new())
            .unwrap();
        assert_eq!(signal, None);
        assert_eq!(String::from_utf8(output.take()).unwrap(), "after\n");
        assert_eq!(*shown.borrow(), vec![MANUAL.len(); 3]);
    }

    #[test]
    fn test_interrupt_stops_loops() {
        let tokens = tokenizer::tokens("loop! { this 'x' is \"y\" }").unwrap();
        let program = parser::program(&tokens).unwrap();
        let interrupt = Arc::new(AtomicBool::new(true));
        let mut interpreter =
            Interpreter::new(Rc::new(RefCell::new(Vec::<u8>::new()))).with_interrupt(interrupt);
        let err = interpreter
            .interpret(&program, &mut Environment::new())
            .unwrap_err();
        assert!(matches!(err.kind(), ExecutionErrorKind::Interrupted));
    }

    #[test]
    fn test_fractional_and_invalid_loop_counts() {
        let mut env = Environment::new();
        let (result, output) = run(
            "loop! [2.5] { debug! \"a\" } loop! [\"x\"] { debug! \"b\" } loop! [\"2\"] { debug! \"c\" }",
            &mut env,
        );
        result.unwrap();
        assert_eq!(output, "a\na\na\nc\nc\n");
    }
}
