use std::{
    cell::RefCell,
    io::Write,
    path::{Path, PathBuf},
    process::Command as Process,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use clap::{Args, Parser, Subcommand};
use log::{trace, warn};
use vexal::{
    parser, tokenizer, transpiler,
    tree_walk_interpreter::{Environment, ExecutionError, HostSignal, Interpreter},
};

#[derive(Debug, Parser)]
#[command(version, about = "VEXAL interpreter and JavaScript transcriber")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Repl)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive prompt; variables live until the prompt closes
    Repl,
    /// Run a source file in a fresh environment
    Run(FileArgs),
    /// Transcribe a source file to JavaScript and syntax-check the result
    Transpile(TranspileArgs),
    /// Print the token stream of a source file
    Tokens(FileArgs),
    /// Print the parsed tree of a source file
    Ast(FileArgs),
}

#[derive(Debug, Args)]
struct FileArgs {
    file: PathBuf,
}

#[derive(Debug, Args)]
struct TranspileArgs {
    file: PathBuf,

    /// Defaults to vexal-compiled.js next to the source file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the syntax check of the generated file
    #[arg(long)]
    no_check: bool,

    /// Program invoked as `<checker> --check <output>`
    #[arg(long, default_value = "node")]
    checker: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Cli::parse();

    let result = match args.command() {
        Command::Repl => {
            repl_command(&interrupt_on_ctrl_c());
            Ok(())
        }
        Command::Run(args) => run_file(&args.file, &interrupt_on_ctrl_c()),
        Command::Transpile(args) => transpile_command(args),
        Command::Tokens(args) => tokens_command(args),
        Command::Ast(args) => ast_command(args),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

#[derive(Debug, thiserror::Error)]
enum InterpretError {
    #[error(transparent)]
    Tokenize(#[from] tokenizer::TokenizeError),
    #[error(transparent)]
    Parse(#[from] parser::ParseErrorWithContext),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("[Read Error] {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("[Transcribe Error] {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("[Output Error] {0}")]
    Output(#[from] std::io::Error),
}

/// Ctrl+C cancels the current run; the process keeps going.
fn interrupt_on_ctrl_c() -> Arc<AtomicBool> {
    let interrupt = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&interrupt);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed)) {
        warn!("could not install Ctrl+C handler, runs cannot be cancelled: {e}");
    }
    interrupt
}

fn stdout() -> Rc<RefCell<dyn Write>> {
    Rc::new(RefCell::new(std::io::stdout()))
}

fn host_interpreter(stdout: Rc<RefCell<dyn Write>>, interrupt: &Arc<AtomicBool>) -> Interpreter {
    let manual_out = Rc::clone(&stdout);
    Interpreter::new(stdout)
        .with_interrupt(Arc::clone(interrupt))
        .with_manual_viewer(move |pages| {
            if let Err(e) = write_manual(&mut *manual_out.borrow_mut(), pages) {
                warn!("failed to show the manual: {e}");
            }
        })
}

fn write_manual(out: &mut dyn Write, pages: &[&str]) -> std::io::Result<()> {
    writeln!(out, "\n=== VEXAL MANUAL ===")?;
    for page in pages {
        writeln!(out, "{page}\n------------------")?;
    }
    Ok(())
}

fn interpret(
    source: &str,
    interpreter: &mut Interpreter,
    environment: &mut Environment,
) -> Result<Option<HostSignal>, InterpretError> {
    trace!("lexing {source:?}");
    let tokens = tokenizer::tokens(source)?;
    trace!("parsing {tokens:?}");
    let program = parser::program(&tokens)?;
    trace!("interpreting {program:?}");
    Ok(interpreter.interpret(&program, environment)?)
}

fn read_source(path: &Path) -> Result<String, InterpretError> {
    std::fs::read_to_string(path).map_err(|source| InterpretError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn prompt(message: &str) -> Option<String> {
    print!("{message}");
    std::io::stdout()
        .flush()
        .expect("should be able to flush stdout");

    let mut input = String::new();
    match std::io::stdin().read_line(&mut input) {
        Ok(0) => None,
        Ok(_) => Some(input),
        Err(e) => {
            warn!("failed to read from stdin: {e}");
            None
        }
    }
}

fn repl_command(interrupt: &Arc<AtomicBool>) {
    println!("VEXAL | REPL | Type 'vx' for docs.");
    println!("EOF to exit. (Ctrl+D on *nix, Ctrl+Z on Windows)");

    let mut environment = Environment::new();
    let mut interpreter = host_interpreter(stdout(), interrupt);

    while let Some(input) = prompt("vx> ") {
        let source = input.trim();
        if source.is_empty() {
            continue;
        }
        interrupt.store(false, Ordering::Relaxed);
        match interpret(source, &mut interpreter, &mut environment) {
            Ok(Some(signal)) => handle_signal(signal, interrupt),
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }
    }
}

fn run_file(path: &Path, interrupt: &Arc<AtomicBool>) -> Result<(), InterpretError> {
    let source = read_source(path)?;
    let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();

    if let Some(signal) = run_program(&name, &source, stdout(), interrupt)? {
        handle_signal(signal, interrupt);
    }
    Ok(())
}

/// Runs a whole file in a fresh environment between a banner and a footer.
/// `bussin` skips the footer.
fn run_program(
    name: &str,
    source: &str,
    stdout: Rc<RefCell<dyn Write>>,
    interrupt: &Arc<AtomicBool>,
) -> Result<Option<HostSignal>, InterpretError> {
    interrupt.store(false, Ordering::Relaxed);
    writeln!(stdout.borrow_mut(), "\n=== VEXAL: {name} ===")?;

    let mut interpreter = host_interpreter(Rc::clone(&stdout), interrupt);
    let signal = interpret(source, &mut interpreter, &mut Environment::new())?;

    if signal != Some(HostSignal::Exit) {
        writeln!(stdout.borrow_mut(), "\n=== END ===")?;
    }
    Ok(signal)
}

fn handle_signal(signal: HostSignal, interrupt: &Arc<AtomicBool>) {
    match signal {
        HostSignal::RequestFilePath => {
            let Some(input) = prompt("[System] File path: ") else {
                return;
            };
            let path = input.trim().replace('"', "");
            if let Err(e) = run_file(Path::new(&path), interrupt) {
                eprintln!("{e}");
            }
        }
        HostSignal::Exit => std::process::exit(0),
    }
}

fn transpile_command(args: &TranspileArgs) -> Result<(), InterpretError> {
    let source = read_source(&args.file)?;
    let tokens = tokenizer::tokens(&source)?;
    let program = parser::program(&tokens)?;
    let code = transpiler::transpile(&program);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.file.with_file_name("vexal-compiled.js"));
    std::fs::write(&output, code).map_err(|source| InterpretError::Write {
        path: output.clone(),
        source,
    })?;
    println!("[Success] Transcribed to: {}", output.display());

    if !args.no_check {
        check_syntax(&args.checker, &output);
    }
    Ok(())
}

fn check_syntax(checker: &str, path: &Path) {
    match Process::new(checker).arg("--check").arg(path).output() {
        Ok(output) if output.status.success() => println!("[Verified] Compiled JS is valid."),
        Ok(output) => println!(
            "[Warning] Compiled JS has syntax errors:\n{}",
            String::from_utf8_lossy(&output.stderr)
        ),
        Err(e) => warn!("could not run syntax checker '{checker}': {e}"),
    }
}

fn tokens_command(args: &FileArgs) -> Result<(), InterpretError> {
    let source = read_source(&args.file)?;
    let mut line = 0;
    for token in tokenizer::tokens(&source)? {
        if token.line != line {
            print!("{:4} ", token.line);
            line = token.line;
        } else {
            print!("   | ");
        }

        println!("{:<10} {}", token.token_type.kind(), token.token_type);
    }

    Ok(())
}

fn ast_command(args: &FileArgs) -> Result<(), InterpretError> {
    let source = read_source(&args.file)?;
    let tokens = tokenizer::tokens(&source)?;
    print!("{}", parser::program(&tokens)?);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(source: &str, interrupt: &Arc<AtomicBool>) -> (Option<HostSignal>, String) {
        let output = Rc::new(RefCell::new(Vec::new()));
        let signal = run_program("demo.vx", source, output.clone(), interrupt).unwrap();
        (signal, String::from_utf8(output.take()).unwrap())
    }

    #[test]
    fn test_exit_skips_footer() {
        let (signal, output) = run("debug! \"a\" bussin", &Arc::new(AtomicBool::new(false)));
        assert_eq!(signal, Some(HostSignal::Exit));
        assert_eq!(output, "\n=== VEXAL: demo.vx ===\na\nBussin. Exiting...\n");
    }

    #[test]
    fn test_manual_shows_inside_the_run() {
        let (signal, output) = run("vx debug! \"after\"", &Arc::new(AtomicBool::new(false)));
        assert_eq!(signal, None);
        assert!(output.starts_with("\n=== VEXAL: demo.vx ===\n\n=== VEXAL MANUAL ===\n"));
        assert!(output.ends_with("------------------\nafter\n\n=== END ===\n"));
    }

    #[test]
    fn test_stale_interrupt_is_cleared_before_a_run() {
        let interrupt = Arc::new(AtomicBool::new(true));
        let (signal, output) = run("loop! [1] { debug! \"x\" }", &interrupt);
        assert_eq!(signal, None);
        assert!(output.contains("x\n"));
    }

    #[test]
    fn test_interrupt_cancels_only_the_run() {
        let interrupt = Arc::new(AtomicBool::new(false));
        let mut interpreter = host_interpreter(Rc::new(RefCell::new(Vec::<u8>::new())), &interrupt);
        let mut environment = Environment::new();

        interpret("this 'kept' is \"yes\"", &mut interpreter, &mut environment).unwrap();
        interrupt.store(true, Ordering::Relaxed);
        let err = interpret("loop! { }", &mut interpreter, &mut environment).unwrap_err();
        assert!(err.to_string().starts_with("[Interrupted]"));

        interrupt.store(false, Ordering::Relaxed);
        interpret("debug! \"kept\":var", &mut interpreter, &mut environment).unwrap();
        assert!(environment.contains("kept"));
    }
}
