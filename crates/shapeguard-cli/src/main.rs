//! shapeguard CLI and REPL
//!
//! Usage:
//!   shapeguard                                    - Start REPL
//!   shapeguard check -s "[X, Y]" -t 4x6 ...       - Check shapes in one session
//!   shapeguard eval "X + 2" --bind X=4            - Evaluate a size expression
//!   shapeguard parse "[X:, X + 2]"                - Show a parsed spec and its JSON
//!   shapeguard signature sig.json -t 4x6 -t 0.5   - Check arguments against a signature file

use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use shapeguard_ast::dim::ShapeSpec;
use shapeguard_ast::ser;
use shapeguard_check::prelude::*;
use shapeguard_parse::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "shapeguard")]
#[command(version = "0.1.0")]
#[command(about = "Check tensor shapes against symbolic specs", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check shapes against specs; pairs share one session
    Check {
        /// Shape spec, e.g. "[*, X, Y - 1]"
        #[arg(short, long = "spec", required = true)]
        specs: Vec<String>,

        /// Concrete shape, e.g. 1x4x6 or "(1, 4, 6)"
        #[arg(short = 't', long = "shape", required = true)]
        shapes: Vec<String>,

        /// Pre-bound symbol, e.g. X=4
        #[arg(short, long = "bind", value_parser = parse_binding)]
        bindings: Vec<(String, f64)>,

        /// Keep checking after the first failure
        #[arg(short, long)]
        aggregate: bool,
    },

    /// Evaluate a size expression
    Eval {
        expr: String,

        /// Symbol value, e.g. X=4
        #[arg(short, long = "bind", value_parser = parse_binding)]
        bindings: Vec<(String, f64)>,
    },

    /// Parse a spec and print it with its JSON form
    Parse { spec: String },

    /// Check arguments against a JSON signature file
    Signature {
        file: PathBuf,

        /// One argument per parameter: a shape, or a number for scalar parameters
        #[arg(short = 't', long = "arg")]
        args: Vec<String>,
    },

    /// Interactive session
    Repl,
}

fn parse_binding(text: &str) -> Result<(String, f64), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", text))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {}: {}", name.trim(), e))?;
    Ok((name.trim().to_string(), value))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let ok = match args.command {
        Some(Command::Check { specs, shapes, bindings, aggregate }) => {
            run_check(&specs, &shapes, &bindings, aggregate)
        }
        Some(Command::Eval { expr, bindings }) => run_eval(&expr, &bindings),
        Some(Command::Parse { spec }) => run_parse(&spec),
        Some(Command::Signature { file, args }) => run_signature(&file, &args),
        Some(Command::Repl) | None => match run_repl() {
            Ok(()) => true,
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                false
            }
        },
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// ============ One-shot commands ============

fn run_check(specs: &[String], shapes: &[String], bindings: &[(String, f64)], aggregate: bool) -> bool {
    if specs.len() != shapes.len() {
        eprintln!(
            "{}: {} spec(s) but {} shape(s); give one --shape per --spec",
            "Error".red().bold(),
            specs.len(),
            shapes.len()
        );
        return false;
    }

    let mut session = new_session();
    for (name, value) in bindings {
        if let Err(e) = session.bind_symbol(name, *value) {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return false;
        }
    }

    let mut ok = true;
    for (spec_text, shape_text) in specs.iter().zip(shapes) {
        let spec = match parse_shape_spec(spec_text) {
            Ok(spec) => spec,
            Err(e) => {
                eprintln!("{}: {}", "Spec error".red().bold(), e);
                return false;
            }
        };
        let shape = match parse_concrete_shape(shape_text) {
            Ok(shape) => shape,
            Err(e) => {
                eprintln!("{}: {}", "Shape error".red().bold(), e);
                return false;
            }
        };

        match session.check_shape(&spec, &shape) {
            Ok(()) => println!("{} {} ~ {:?}", "✓".green().bold(), spec, shape),
            Err(e) => {
                println!("{} {} ~ {:?}", "✗".red().bold(), spec, shape);
                eprintln!("  {}", e.to_string().red());
                ok = false;
                if !aggregate {
                    break;
                }
            }
        }
    }

    print_bindings(session.bindings());
    ok
}

fn run_eval(source: &str, bindings: &[(String, f64)]) -> bool {
    let table: Bindings = bindings.iter().cloned().collect();
    let expr = match parse_expr(source) {
        Ok(expr) => expr,
        Err(e) => {
            eprintln!("{}: {}", "Parse error".red().bold(), e);
            return false;
        }
    };
    match evaluate(&expr, &table) {
        Ok(value) => {
            println!("{} = {}", expr, value.to_string().green());
            true
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            false
        }
    }
}

fn run_parse(text: &str) -> bool {
    match parse_shape_spec(text) {
        Ok(spec) => {
            print_spec(&spec);
            true
        }
        Err(e) => {
            eprintln!("{}: {}", "Spec error".red().bold(), e);
            false
        }
    }
}

/// Argument parsed from the command line
enum Input {
    Shape(ShapeHandle),
    Scalar(f64),
}

fn run_signature(path: &Path, raw_args: &[String]) -> bool {
    let sig: Signature = match ser::read_file(path) {
        Ok(sig) => sig,
        Err(e) => {
            eprintln!("{}: {}", "File error".red().bold(), e);
            return false;
        }
    };

    let mut inputs = Vec::with_capacity(raw_args.len());
    for (i, raw) in raw_args.iter().enumerate() {
        let scalar = matches!(sig.params.get(i).map(|p| &p.spec), Some(ParamSpec::Scalar(_)));
        let input = if scalar {
            raw.trim().parse::<f64>().map(Input::Scalar).map_err(|e| e.to_string())
        } else {
            parse_concrete_shape(raw)
                .map(|s| Input::Shape(ShapeHandle::new(s)))
                .map_err(|e| e.to_string())
        };
        match input {
            Ok(input) => inputs.push(input),
            Err(e) => {
                eprintln!("{}: argument {}: {}", "Error".red().bold(), i, e);
                return false;
            }
        }
    }

    let args: Vec<Arg<'_>> = inputs
        .iter()
        .map(|input| match input {
            Input::Shape(h) => Arg::shape(h),
            Input::Scalar(v) => Arg::scalar(*v),
        })
        .collect();

    match sig.check_args(&args) {
        Ok(()) => {
            println!("{} {} argument(s) accepted", "✓".green().bold(), args.len());
            true
        }
        Err(CallError::Arity { expected, found }) => {
            eprintln!("{}: expected {} argument(s), got {}", "Error".red().bold(), expected, found);
            false
        }
        Err(e) => {
            for failure in e.param_errors() {
                println!("{} {}", "✗".red().bold(), failure.param.yellow());
                eprintln!("  {}", failure.error.to_string().red());
            }
            false
        }
    }
}

// ============ REPL ============

fn run_repl() -> RlResult<()> {
    print_banner();

    let mut rl = DefaultEditor::new()?;
    let history_path = dirs::data_dir().map(|p| p.join("shapeguard").join("history.txt"));

    if let Some(ref path) = history_path {
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        let _ = rl.load_history(path);
    }

    let mut session = new_session();
    let mut line_count = 0;

    loop {
        let prompt = format!("{} ", format!("shapeguard[{}]›", line_count).cyan());

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if line.starts_with(':') {
                    if !handle_command(line, &mut session) {
                        break;
                    }
                    continue;
                }

                match line.split_once('~') {
                    Some((spec, shape)) => repl_check(spec, shape, &mut session),
                    None => repl_eval(line, &session),
                }

                line_count += 1;
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}: {:?}", "Error".red().bold(), err);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

/// `SPEC ~ SHAPE`
fn repl_check(spec: &str, shape: &str, session: &mut Session) {
    let spec = match parse_shape_spec(spec) {
        Ok(spec) => spec,
        Err(e) => return eprintln!("{}: {}", "Spec error".red().bold(), e),
    };
    let shape = match parse_concrete_shape(shape) {
        Ok(shape) => shape,
        Err(e) => return eprintln!("{}: {}", "Shape error".red().bold(), e),
    };
    match session.check_shape(&spec, &shape) {
        Ok(()) => {
            println!("{}", "ok".green().bold());
            print_bindings(session.bindings());
        }
        Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
    }
}

/// Bare expression: resolve against the current bindings
fn repl_eval(source: &str, session: &Session) {
    let expr = match parse_expr(source) {
        Ok(expr) => expr,
        Err(e) => return eprintln!("{}: {}", "Parse error".red().bold(), e),
    };
    match session.resolve(&expr) {
        Ok(Resolved::Value(v)) => println!("{}", v.to_string().green()),
        Ok(Resolved::Unresolved(symbols)) => {
            println!("{} {}", "unresolved:".yellow(), symbols.join(", "))
        }
        Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
    }
}

/// Returns false when the REPL should exit
fn handle_command(cmd: &str, session: &mut Session) -> bool {
    let (command, arg) = match cmd.split_once(' ') {
        Some((c, a)) => (c, Some(a.trim())),
        None => (cmd, None),
    };

    match command {
        ":help" | ":h" | ":?" => print_help(),
        ":quit" | ":q" => return false,
        ":bindings" | ":b" => print_bindings(session.bindings()),
        ":reset" => {
            session.reset();
            println!("{}", "Bindings cleared.".yellow());
        }
        ":let" => match arg.map(parse_binding) {
            Some(Ok((name, value))) => match session.bind_symbol(&name, value) {
                Ok(()) => println!("{} {} = {}", "let".cyan(), name, value),
                Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
            },
            Some(Err(e)) => eprintln!("{}: {}", "Error".red().bold(), e),
            None => eprintln!("Usage: :let NAME=VALUE"),
        },
        ":spec" => match arg {
            Some(text) => {
                run_parse(text);
            }
            None => eprintln!("Usage: :spec <spec>"),
        },
        _ => eprintln!("{}: unknown command '{}'. Try :help", "Error".red().bold(), command),
    }
    true
}

// ============ Output ============

fn print_bindings(bindings: &Bindings) {
    if bindings.is_empty() {
        println!("{}", "(no bindings)".dimmed());
        return;
    }
    for (name, value) in bindings {
        println!("  {} = {}", name.cyan(), value);
    }
}

fn print_spec(spec: &ShapeSpec) {
    let rank = match spec.rank() {
        Some(r) => r.to_string(),
        None => "any".to_string(),
    };
    println!("{} {} (rank {})", "Spec:".cyan().bold(), spec, rank);
    let symbols = spec.symbols();
    if !symbols.is_empty() {
        println!("{} {}", "Symbols:".cyan().bold(), symbols.into_iter().collect::<Vec<_>>().join(", "));
    }
    match ser::spec_to_json(spec) {
        Ok(json) => println!("{}\n{}", "JSON:".cyan().bold(), json),
        Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
    }
}

fn print_banner() {
    println!("{}", "shapeguard v0.1.0".cyan().bold());
    println!("  Type {} for help, {} to quit\n", ":help".yellow(), ":quit".yellow());
}

fn print_help() {
    println!("{}", "
Commands:
  :help, :h, :?    Show this help
  :quit, :q        Exit REPL
  :bindings, :b    Show bound symbols
  :reset           Clear all bindings
  :let X=4         Bind a symbol
  :spec <spec>     Show a parsed spec and its JSON

Input:
  [X, 2 * Y] ~ 4x6     Check a shape; bindings persist until :reset
  X + 2                Evaluate against the current bindings

Spec entries:
  4        fixed size
  2:8      size in [2, 8)
  _  *  :  any size ('*' alone: any rank)
  X        symbol, bound on first use
  X + 2    expression over bound symbols, or solved for one unknown
  X:Y      size in [X, Y)
".cyan());
}
