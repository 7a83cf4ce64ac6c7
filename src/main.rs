mod debug_report;

use rebulk::{ConflictSolver, Context, PatternOptions, Rebulk};
use std::io::{self, IsTerminal, Read};
use tracing_subscriber::EnvFilter;

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();

    let rebulk = match build(&config) {
        Ok(rebulk) => rebulk,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };
    match rebulk.matches_with_metrics(&config.input, &Context::new()) {
        Ok(result) => debug_report::print_run(&config.input, &result, config.color),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

enum PatternArg {
    String { name: String, literal: String },
    Regex { name: String, regex: String },
}

struct CliConfig {
    input: String,
    patterns: Vec<PatternArg>,
    ignore_case: bool,
    keep_private: bool,
    color: bool,
}

fn build(config: &CliConfig) -> rebulk::Result<Rebulk> {
    let mut rebulk = if config.keep_private {
        Rebulk::without_default_rules().rule(ConflictSolver)
    } else {
        Rebulk::new()
    };
    rebulk = rebulk.defaults(PatternOptions::new().ignore_case(config.ignore_case));
    for pattern in &config.patterns {
        rebulk = match pattern {
            PatternArg::String { name, literal } => rebulk.string([literal.as_str()], PatternOptions::new().name(name))?,
            PatternArg::Regex { name, regex } => rebulk.regex([regex.as_str()], PatternOptions::new().name(name))?,
        };
    }
    Ok(rebulk)
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut patterns = Vec::new();
    let mut ignore_case = false;
    let mut keep_private = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("rebulk {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--ignore-case" => ignore_case = true,
            "--keep-private" => keep_private = true,
            "--string" | "-s" => {
                let value = args.next().ok_or_else(|| "error: --string expects NAME=LITERAL".to_string())?;
                let (name, literal) = split_definition("--string", &value)?;
                patterns.push(PatternArg::String { name, literal });
            }
            "--regex" | "-r" => {
                let value = args.next().ok_or_else(|| "error: --regex expects NAME=REGEX".to_string())?;
                let (name, regex) = split_definition("--regex", &value)?;
                patterns.push(PatternArg::Regex { name, regex });
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--string=") => {
                let (name, literal) = split_definition("--string", arg.trim_start_matches("--string="))?;
                patterns.push(PatternArg::String { name, literal });
            }
            _ if arg.starts_with("--regex=") => {
                let (name, regex) = split_definition("--regex", arg.trim_start_matches("--regex="))?;
                patterns.push(PatternArg::Regex { name, regex });
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                input = Some(std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" "));
                break;
            }
        }
    }

    if patterns.is_empty() {
        return Err(format!("error: no pattern given (use --string or --regex)\n\n{}", help_text()));
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, patterns, ignore_case, keep_private, color })
}

fn split_definition(flag: &str, value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, body)) if !name.is_empty() && !body.is_empty() => Ok((name.to_string(), body.to_string())),
        _ => Err(format!("error: invalid {flag} '{value}' (expected NAME=PATTERN)")),
    }
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "rebulk {version}

Pattern matching and rule engine CLI.

Usage:
  rebulk [OPTIONS] [--] <input...>

Options:
  -s, --string <NAME=LITERAL>  Add a literal pattern. Repeatable.
  -r, --regex <NAME=REGEX>     Add a regular expression pattern. Repeatable.
  --ignore-case                Match every pattern case-insensitively.
  --keep-private               Skip the private match removal rule.
  --color                      Force ANSI color output.
  --no-color                   Disable ANSI color output.
  -h, --help                   Show this help message.
  -V, --version                Print version information.

Input is read from the remaining arguments, or from stdin when none is given.
Set RUST_LOG=rebulk=debug to trace rule execution on stderr.

Exit codes:
  0  Success.
  1  Engine error (duplicate rule, dependency cycle).
  2  Invalid arguments, invalid pattern or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}
