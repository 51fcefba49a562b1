use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use plc_core::span::{line_col, line_text};
use plc_core::{Associativity, CoreError, ParserConfig, lex, parse_with_config};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Tokens,
    Ast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Assoc {
    Right,
    Left,
}

/// Lex and parse a PLC source file, printing the tokens or the AST.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, help = "Source file to read (defaults to stdin)")]
    input: Option<String>,

    #[arg(long, value_enum, default_value = "ast", help = "What to print")]
    emit: Emit,

    #[arg(
        long,
        value_enum,
        default_value = "right",
        help = "How chains of same-precedence operators nest"
    )]
    assoc: Assoc,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    match cli.emit {
        Emit::Tokens => {
            let tokens = lex(&source).map_err(|err| report(&source, err.into()))?;
            for token in tokens {
                println!("{}\t{:?}\t{}", token.offset, token.kind, token.literal);
            }
        }
        Emit::Ast => {
            let config = ParserConfig {
                associativity: match cli.assoc {
                    Assoc::Right => Associativity::Right,
                    Assoc::Left => Associativity::Left,
                },
            };
            let ast = parse_with_config(&source, config).map_err(|err| report(&source, err))?;
            println!("{ast:#?}");
        }
    }

    Ok(())
}

/// Turns a front-end failure into a message naming the kind and position,
/// with the offending line underneath.
fn report(source: &str, err: CoreError) -> anyhow::Error {
    let kind = match err {
        CoreError::Lex(lex) => lex.kind.to_string(),
        CoreError::Parse(parse) => parse.kind.to_string(),
    };
    let offset = err.offset();
    let (line, column) = line_col(source, offset);
    let text = line_text(source, offset);
    let caret = " ".repeat(column.saturating_sub(1));
    anyhow::anyhow!("{kind} at {line}:{column} (offset {offset})\n  {text}\n  {caret}^")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn prints_ast_for_a_program() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("main.plc");
        fs::write(&input_path, "LET x = 5;\nDEF main() DO RETURN x; END").expect("write input");

        Command::cargo_bin("plc")
            .expect("binary exists")
            .arg("--input")
            .arg(&input_path)
            .assert()
            .success()
            .stdout(predicate::str::contains("name: \"x\""))
            .stdout(predicate::str::contains("Return("));
    }

    #[test]
    fn reads_source_from_stdin() {
        Command::cargo_bin("plc")
            .expect("binary exists")
            .write_stdin("LET flag = TRUE;")
            .assert()
            .success()
            .stdout(predicate::str::contains("Boolean(\n"));
    }

    #[test]
    fn emits_tokens() {
        Command::cargo_bin("plc")
            .expect("binary exists")
            .arg("--emit")
            .arg("tokens")
            .write_stdin("x == 'c'")
            .assert()
            .success()
            .stdout(predicate::str::contains("0\tIdentifier\tx"))
            .stdout(predicate::str::contains("2\tOperator\t=="))
            .stdout(predicate::str::contains("5\tCharacter\t'c'"));
    }

    #[test]
    fn reports_parse_error_position() {
        Command::cargo_bin("plc")
            .expect("binary exists")
            .write_stdin("LET x = 1;\nLET y = x + 1")
            .assert()
            .failure()
            .stderr(predicate::str::contains("expected ';' at 2:13 (offset 23)"));
    }

    #[test]
    fn reports_lex_error_position() {
        Command::cargo_bin("plc")
            .expect("binary exists")
            .arg("--emit")
            .arg("tokens")
            .write_stdin("LET s = \"oops;")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unterminated string literal at 1:9"));
    }

    #[test]
    fn left_assoc_flag_changes_nesting() {
        Command::cargo_bin("plc")
            .expect("binary exists")
            .arg("--assoc")
            .arg("left")
            .write_stdin("LET d = 8 - 4 - 2;")
            .assert()
            .success()
            .stdout(predicate::str::contains("left: Binary {"));
    }

    #[test]
    fn reports_missing_input_file() {
        let dir = tempdir().expect("tempdir");

        Command::cargo_bin("plc")
            .expect("binary exists")
            .arg("--input")
            .arg(dir.path().join("missing.plc"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to read input file"));
    }

    #[test]
    fn report_points_at_the_offending_column() {
        let source = "LET a = 1;\nLET b = $;";
        let err = plc_core::parse(source).unwrap_err();
        let message = report(source, err).to_string();
        assert!(message.starts_with("unrecognized character at 2:9 (offset 19)"));
        assert!(message.ends_with("  LET b = $;\n          ^"));
    }
}
