//! Generates JavaScript mirroring the tree-walk interpreter's semantics.
//!
//! The output is a structural mirror of the tree: a fixed runtime helper
//! followed by one generated statement per top-level node. Checking that the
//! result is valid JavaScript is left to the host.

use crate::{
    ast::{Conditional, CutMode, InfixOperator, Literal, Node, Program, Status},
    number,
};

pub const PRELUDE: &str = r#"
// --- COMPILED VEXAL JS ---
const _vexHelper = {
  cast: (val, type) => {
    if (!type) return val;
    if (type === 'num') return parseFloat(val);
    if (type === 'str') return String(val);
    if (type === 'bool') return val === true || val === 'true' || val === 1 || val === 'yup';
    if (type === 'null') return null;
    if (type === 'undefined') return undefined;
    return val;
  },
  autoStatus: (val) => {
    if (typeof val === 'number') return String(val);
    return val;
  },
  add: (l, r) => (typeof l === 'number' && typeof r === 'number' ? l + r : String(l) + String(r)),
  random: (min, max) => Math.floor(Math.random() * (Number(max) - Number(min) + 1) + Number(min)),
  isYup: (val) => val === true || val === 'yup'
};

// --- USER CODE ---
"#;

/// Where an expression lands, which decides how numeric literals are spelled.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Context {
    Statement,
    /// Declaration/assignment values and call parameters store numbers as text.
    Store,
    /// Arithmetic, comparisons and casts keep numbers numeric.
    Math,
}

pub fn transpile(program: &Program) -> String {
    let mut output = PRELUDE.to_string();
    let statements: Vec<String> = program.0.iter().map(statement).collect();
    output.push_str(&statements.join("\n"));
    output.push('\n');
    output
}

fn block(body: &[Node]) -> String {
    let statements: Vec<String> = body.iter().map(statement).collect();
    format!("{{\n{}\n}}", statements.join("\n"))
}

fn statement(node: &Node) -> String {
    match node {
        Node::VariableDeclaration {
            name,
            value,
            is_constant,
        } => {
            let keyword = if *is_constant { "const" } else { "let" };
            format!("{keyword} {name} = {};", stored(value))
        }
        Node::Assignment { name, value } => format!("{name} = {};", stored(value)),
        Node::Call { name, params } if name == "debug" => params
            .iter()
            .map(|param| format!("console.log({});", expression(param, Context::Store)))
            .collect::<Vec<_>>()
            .join("\n"),
        Node::Call { name, params } => {
            let params: Vec<String> = params
                .iter()
                .map(|param| expression(param, Context::Store))
                .collect();
            format!("/* {}! */ void [{}];", comment(name), params.join(", "))
        }
        Node::Bussin => "console.log(\"Bussin. Exiting...\");\nprocess.exit(0);".to_string(),
        Node::Loop {
            times: Some(times),
            body,
        } => format!(
            "for (let i = 0; i < Number({}); i++) {}",
            expression(times, Context::Math),
            block(body)
        ),
        Node::Loop { times: None, body } => format!("while (true) {}", block(body)),
        Node::If(conditional) | Node::ElseIf(conditional) => if_statement(conditional),
        Node::Banish(target) => format!("{target} = undefined;"),
        Node::Cut(CutMode::Toggle) => "// cut! ignored in compiled".to_string(),
        Node::Cut(CutMode::Modify(target)) => {
            format!("// cut! '{}' ignored in compiled", comment(target))
        }
        Node::Help => "// Unsupported in compiled output: vx".to_string(),
        Node::OpenFile => "// Unsupported in compiled output: openfile".to_string(),
        expr => format!("{};", expression(expr, Context::Statement)),
    }
}

fn if_statement(conditional: &Conditional) -> String {
    let mut code = format!(
        "if (_vexHelper.isYup({})) {}",
        expression(&conditional.condition, Context::Math),
        block(&conditional.body)
    );
    if let Some(alternate) = &conditional.alternate {
        code.push_str(&format!(" else {{\n{}\n}}", statement(alternate)));
    }
    code
}

/// Right-hand sides; loops and ifs become an immediately invoked arrow function.
fn stored(value: &Node) -> String {
    if value.is_block_construct() {
        format!("(() => {{ {} }})()", statement(value))
    } else {
        expression(value, Context::Store)
    }
}

fn expression(node: &Node, context: Context) -> String {
    match node {
        Node::Literal(Literal::Number(n)) => match context {
            Context::Math => number::format(*n),
            Context::Store | Context::Statement => quote(&number::format(*n)),
        },
        Node::Literal(Literal::String(s)) => quote(s),
        Node::Literal(Literal::Boolean(b)) => b.to_string(),
        Node::Literal(Literal::Null) => "null".to_string(),
        Node::Literal(Literal::Undefined) => "undefined".to_string(),
        Node::Identifier(name) => name.clone(),
        Node::Comparison(left, right) => format!(
            "({} === {})",
            expression(left, Context::Math),
            expression(right, Context::Math)
        ),
        Node::Binary(left, InfixOperator::Plus, right) => format!(
            "_vexHelper.add({}, {})",
            expression(left, Context::Math),
            expression(right, Context::Math)
        ),
        Node::Binary(left, op, right) => format!(
            "({} {} {})",
            expression(left, Context::Math),
            op,
            expression(right, Context::Math)
        ),
        Node::Random { min, max } => format!(
            "_vexHelper.random({}, {})",
            expression(min, Context::Math),
            expression(max, Context::Math)
        ),
        Node::SmartPhrase(parts) => {
            let parts: Vec<String> = parts.iter().map(|part| expression(part, context)).collect();
            format!("[{}].join(\" \")", parts.join(", "))
        }
        Node::Cast {
            value,
            status: Status::Var,
        } => match value.as_ref() {
            Node::Identifier(name) | Node::Literal(Literal::String(name)) => name.clone(),
            Node::Literal(Literal::Number(n)) => number::format(*n),
            other => format!("eval(String({}))", expression(other, Context::Math)),
        },
        Node::Cast { value, status } => format!(
            "_vexHelper.cast({}, {})",
            expression(value, Context::Math),
            quote(&status.to_string())
        ),
        Node::Loop { .. } | Node::If(_) | Node::ElseIf(_) => {
            format!("(() => {{ {} }})()", statement(node))
        }
        other => format!("/* Unknown: {} */ undefined", comment(&other.to_string())),
    }
}

/// A double-quoted JavaScript string literal.
fn quote(text: &str) -> String {
    format!("\"{}\"", text.escape_default())
}

/// Text that stays inside a `//` or `/* */` comment.
fn comment(text: &str) -> String {
    text.escape_default().to_string().replace("*/", "* /")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{parser, tokenizer};

    fn user_code(source: &str) -> String {
        let tokens = tokenizer::tokens(source).unwrap();
        let program = parser::program(&tokens).unwrap();
        let output = transpile(&program);
        output
            .strip_prefix(PRELUDE)
            .expect("output starts with the prelude")
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_numbers_are_text_when_stored() {
        assert_eq!(user_code("this 'a' is 5"), "let a = \"5\";");
        assert_eq!(user_code("fr 'a' is (5 + 1)"), "const a = _vexHelper.add(5, 1);");
        assert_eq!(user_code("fr 'a' is (5 * 1)"), "const a = (5 * 1);");
        assert_eq!(user_code("debug! 2"), "console.log(\"2\");");
        assert_eq!(user_code("this 'a' is 5:num"), "let a = _vexHelper.cast(5, \"num\");");
    }

    #[test]
    fn test_var_cast_reads_directly() {
        assert_eq!(
            user_code("set 'count' is (count:var + 1:num)"),
            "count = _vexHelper.add(count, _vexHelper.cast(1, \"num\"));"
        );
        assert_eq!(user_code("debug! \"count\":var"), "console.log(count);");
    }

    #[test]
    fn test_block_values_are_wrapped() {
        assert_eq!(
            user_code("this 'x' is loop! [2] { debug! \"a\" }"),
            "let x = (() => { for (let i = 0; i < Number(2); i++) {\nconsole.log(\"a\");\n} })();"
        );
    }

    #[test]
    fn test_smart_phrase() {
        assert_eq!(
            user_code("debug! \"hi\" \"n\":var 3"),
            "console.log([\"hi\", n, \"3\"].join(\" \"));"
        );
    }

    #[test]
    fn test_if_chain() {
        assert_eq!(
            user_code("if (1 is 1) { debug! \"yes\" } elseif (1 is 2) { debug! \"no\" }"),
            "if (_vexHelper.isYup((1 === 1))) {\nconsole.log(\"yes\");\n} else {\n\
             if (_vexHelper.isYup((1 === 2))) {\nconsole.log(\"no\");\n}\n}"
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(user_code("banish! 'a'"), "a = undefined;");
        assert_eq!(user_code("cut!"), "// cut! ignored in compiled");
        assert_eq!(user_code("bussin"), "console.log(\"Bussin. Exiting...\");\nprocess.exit(0);");
        assert_eq!(user_code("vx"), "// Unsupported in compiled output: vx");
        assert_eq!(user_code("shout! \"a\""), "/* shout! */ void [\"a\"];");
        assert_eq!(user_code("loop! { }"), "while (true) {\n\n}");
    }

    #[test]
    fn test_comment_payloads_cannot_break_out() {
        let code = user_code("this 'x' is \"a\" foo! \"*/ oops\"");
        assert!(code.starts_with("let x = [\"a\", /* Unknown: foo! "));
        assert_eq!(code.matches("*/").count(), 1);
        assert!(code.contains("* / oops"));

        assert_eq!(
            user_code("cut! 'a\nb'"),
            "// cut! 'a\\nb' ignored in compiled"
        );
    }

    #[test]
    fn test_random_and_strings_are_escaped() {
        assert_eq!(
            user_code("debug! random 1 6"),
            "console.log(_vexHelper.random(1, 6));"
        );
        assert_eq!(user_code("debug! 'say \"hi\"'"), "console.log(\"say \\\"hi\\\"\");");
    }
}
