//! lmscore - score sentences with a backoff n-gram language model.
//!
//! Reads one sentence per line (from `--input` or stdin), scores it the way
//! the decoder would score a complete hypothesis, and prints the natural-log
//! probability followed by the sentence. A corpus summary closes the output.
//!
//! Defaults come from the user config file (`lmscore/config.toml`); any
//! flag given on the command line overrides it. Set `RUST_LOG=debug` for
//! load progress or `RUST_LOG=trace` for every n-gram lookup.

use clap::Parser;
use lmscore::vocab::parse_phrase;
use lmscore::{Config, LanguageModel, LmConfig, Scores, StateArena, StatefulFeatureFunction, Vocabulary};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "lmscore")]
#[command(about = "Score sentences with a backoff n-gram language model")]
#[command(version)]
struct Args {
    /// Language model file (tab-separated n-grams)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Maximum n-gram order of the model
    #[arg(short, long)]
    order: Option<usize>,

    /// Factor index of each word to score
    #[arg(short, long)]
    factor: Option<usize>,

    /// Decoder feature line, e.g. "LanguageModel path=lm.txt order=3"
    #[arg(long, conflicts_with_all = ["model", "order", "factor"])]
    feature: Option<String>,

    /// Input file, one sentence per line (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Do not score the sentence-end marker
    #[arg(long)]
    no_eos: bool,

    /// Store the effective settings as the new defaults
    #[arg(long)]
    save_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(model) = args.model {
        config.model_path = Some(model);
    }
    if let Some(order) = args.order {
        config.order = order;
    }
    if let Some(factor) = args.factor {
        config.factor = factor;
    }
    if args.no_eos {
        config.sentence_end = false;
    }

    if args.save_config {
        if let Err(err) = config.save() {
            warn!("Failed to save config: {err}");
        }
    }

    let lm_config = match &args.feature {
        Some(line) => LmConfig::from_feature_line(line)?,
        None => config.lm_config()?,
    };

    let vocab = Arc::new(Vocabulary::new());
    let lm = LanguageModel::load(&lm_config, Arc::clone(&vocab), 0)?;
    info!(
        "Model ready: order {}, factor {}, {} vocabulary entries",
        lm.model().order(),
        lm.model().factor(),
        vocab.len()
    );

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let mut out = BufWriter::new(io::stdout().lock());

    let mut arena = StateArena::new();
    let mut corpus = Scores::unweighted(1);
    let mut sentences = 0usize;
    let mut words = 0usize;
    let mut oovs = 0usize;

    for line in reader.lines() {
        let line = line?;
        let phrase = parse_phrase(&vocab, &line, config.factor_delimiter);
        let model = lm.model();
        oovs += phrase
            .iter()
            .filter(|word| !model.contains(model.token(word)))
            .count();
        words += phrase.len();

        // One sentence per search session.
        arena.reset();
        let start = lm.empty_hypothesis_state(&mut arena);
        let mut scores = Scores::unweighted(1);
        lm.evaluate_when_applied(&mut arena, start, &phrase, config.sentence_end, &mut scores);

        writeln!(out, "{:.4}\t{}", scores.total(), line)?;
        corpus.add(&scores);
        sentences += 1;
    }

    let predictions = words + if config.sentence_end { sentences } else { 0 };
    let perplexity = if predictions > 0 {
        (-corpus.total() / predictions as f32).exp()
    } else {
        0.0
    };
    writeln!(
        out,
        "Total: {:.4} Sentences: {} Words: {} OOV: {} Perplexity: {:.4}",
        corpus.total(),
        sentences,
        words,
        oovs,
        perplexity
    )?;
    out.flush()?;

    Ok(())
}
