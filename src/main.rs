use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use plotscript::{interpret, Interpreter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Evaluate a plotscript expression
  Eval {
    /// The plotscript expression to evaluate
    expression: String,
  },
  /// Evaluate a plotscript program from a file
  Run {
    /// Path to the program file
    file: PathBuf,
  },
  /// Start an interactive session
  Repl,
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  match cli.command {
    Commands::Eval { expression } => match interpret(&expression) {
      Ok(result) => println!("{result}"),
      Err(e) => eprintln!("Error: {e}"),
    },
    Commands::Run { file } => {
      let source = std::fs::read_to_string(&file)?;
      match interpret(&source) {
        Ok(result) => println!("{result}"),
        Err(e) => eprintln!("Error: {e}"),
      }
    }
    Commands::Repl => repl()?,
  }
  Ok(())
}

fn repl() -> anyhow::Result<()> {
  let mut session = Interpreter::new();
  let stdin = std::io::stdin();
  loop {
    print!("plotscript> ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    if stdin.lock().read_line(&mut line)? == 0 {
      break;
    }
    let line = line.trim();
    if line.is_empty() {
      continue;
    }
    match session.eval_str(line) {
      Ok(result) => println!("{result}"),
      Err(e) => eprintln!("Error: {e}"),
    }
  }
  Ok(())
}
