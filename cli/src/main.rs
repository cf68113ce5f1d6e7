use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ckyparse::{Err, Grammar, Outcome, Tree};

/// Parses sentences against a context-free grammar with the CKY algorithm
#[derive(Parser)]
#[command(version, about)]
struct Cli {
  /// File containing the grammar
  grammar: PathBuf,

  /// File with one sentence per line, tokens separated by whitespace (default: stdin).
  /// Blank lines are skipped rather than reported as empty sentences.
  sentences: Option<PathBuf>,

  /// Write the report to FILE instead of stdout
  #[arg(short, long, value_name = "FILE")]
  output: Option<PathBuf>,

  /// Convert the grammar to weak Chomsky Normal Form before parsing
  #[arg(long)]
  cnf: bool,

  /// Save the converted grammar to FILE (implies --cnf)
  #[arg(long, value_name = "FILE")]
  cnf_out: Option<PathBuf>,

  /// Keep the symbols introduced by the conversion in printed trees
  #[arg(long)]
  raw: bool,

  /// Only report whether each sentence is accepted
  #[arg(short, long)]
  recognize: bool,

  /// Print the parse chart of each sentence to stderr
  #[arg(short, long)]
  chart: bool,
}

/// The one-line verdict written after each sentence
fn describe(sentence: &str, outcome: &Outcome, parses: Option<usize>) -> String {
  match (outcome, parses) {
    (Outcome::Accepted, Some(n)) => format!(
      "The sentence, \"{}\", is accepted by the given grammar and has {} valid parse{}!",
      sentence,
      n,
      if n == 1 { "" } else { "s" }
    ),
    (Outcome::Accepted, None) => {
      format!("The sentence, \"{}\", is accepted by the given grammar!", sentence)
    }
    (Outcome::Rejected, _) => {
      format!("The sentence, \"{}\", is not accepted by the given grammar!", sentence)
    }
    (Outcome::LexiconMiss(token), _) => format!(
      "The sentence, \"{}\", is not accepted by the given grammar since the token, \"{}\", is not part of the lexicon!",
      sentence, token
    ),
  }
}

fn report(
  out: &mut dyn Write,
  sentence: &str,
  outcome: &Outcome,
  trees: Option<&[Tree]>,
) -> io::Result<()> {
  writeln!(out, "Parsing sentence: {}", sentence)?;
  writeln!(out, "{}", describe(sentence, outcome, trees.map(<[Tree]>::len)))?;
  for (idx, t) in trees.unwrap_or_default().iter().enumerate() {
    writeln!(out, "{}) {}", idx + 1, t)?;
  }
  writeln!(out)
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let grammar = Grammar::read_from_file(&cli.grammar)?;
  let cnf = if cli.cnf || cli.cnf_out.is_some() {
    Some(grammar.to_weak_cnf())
  } else {
    None
  };
  if let (Some(cnf), Some(path)) = (&cnf, &cli.cnf_out) {
    fs::write(path, cnf.grammar.to_string())?;
    info!(path = %path.display(), "wrote converted grammar");
  }
  let active = cnf.as_ref().map(|c| &c.grammar).unwrap_or(&grammar);

  let input: Box<dyn BufRead> = match &cli.sentences {
    Some(path) => Box::new(BufReader::new(File::open(path)?)),
    None => Box::new(io::stdin().lock()),
  };
  let mut out: Box<dyn Write> = match &cli.output {
    Some(path) => Box::new(BufWriter::new(File::create(path)?)),
    None => Box::new(io::stdout().lock()),
  };

  let mut count = 0;
  for line in input.lines() {
    let line = line?;
    let tokens = line.split_whitespace().collect::<Vec<_>>();
    if tokens.is_empty() {
      continue;
    }
    let sentence = tokens.join(" ");
    count += 1;

    if cli.chart {
      if let Ok(chart) = active.parse_chart(&tokens) {
        eprintln!("chart for \"{}\":\n{}", sentence, chart);
      }
    }

    if cli.recognize {
      let outcome = active.recognize(&tokens);
      report(&mut out, &sentence, &outcome, None)?;
    } else {
      let (trees, outcome) = match &cnf {
        Some(cnf) if !cli.raw => cnf.parse(&tokens),
        _ => active.parse(&tokens),
      };
      report(&mut out, &sentence, &outcome, Some(trees.as_slice()))?;
    }
  }

  out.flush()?;
  info!(sentences = count, "done");
  Ok(())
}
