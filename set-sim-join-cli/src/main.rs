use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{ArgEnum, Parser};

use set_sim_join::tokenizer::{DelimiterTokenizer, QgramTokenizer, Tokenizer, WhitespaceTokenizer};
use set_sim_join::{
    CompOp, JoinConfig, SetSimJoiner, SideSpec, SimMeasure, Table, TokenizeErrorPolicy,
};

#[derive(ArgEnum, Clone, Copy, Debug)]
enum TokenizerKind {
    Ws,
    Delim,
    Qgram,
}

#[derive(Parser, Debug)]
#[clap(
    name = "set-sim-join",
    about = "A program to find all pairs of records in two CSV tables whose attributes are similar as token sets."
)]
struct Args {
    /// File path to the left CSV table, on which the index is built.
    #[clap(short = 'l', long)]
    left: PathBuf,

    /// File path to the right CSV table, whose records probe the index.
    #[clap(short = 'r', long)]
    right: PathBuf,

    /// Key attribute of the left table.
    #[clap(long)]
    l_key: String,

    /// Key attribute of the right table.
    #[clap(long)]
    r_key: String,

    /// Join attribute of the left table.
    #[clap(long)]
    l_join: String,

    /// Join attribute of the right table.
    #[clap(long)]
    r_join: String,

    /// Comma-separated attributes of the left table to be output.
    #[clap(long)]
    l_out: Option<String>,

    /// Comma-separated attributes of the right table to be output.
    #[clap(long)]
    r_out: Option<String>,

    /// Prefix of the output columns from the left table.
    #[clap(long, default_value = "l_")]
    l_prefix: String,

    /// Prefix of the output columns from the right table.
    #[clap(long, default_value = "r_")]
    r_prefix: String,

    /// Similarity measure (jaccard, cosine, dice or overlap).
    #[clap(short = 'm', long, default_value = "jaccard")]
    measure: SimMeasure,

    /// Threshold, in the range of [0,1] except for the overlap measure.
    #[clap(short = 't', long)]
    threshold: f64,

    /// Comparison operator between a similarity and the threshold (>=, >, =, <= or <).
    #[clap(long, default_value = ">=")]
    comp_op: CompOp,

    /// Tokenizer applied to the join attributes.
    #[clap(long, arg_enum, default_value = "ws")]
    tokenizer: TokenizerKind,

    /// Delimiter characters of the delim tokenizer.
    #[clap(long, default_value = " ")]
    delimiters: String,

    /// Size of q-grams of the qgram tokenizer (must be more than 0).
    #[clap(long, default_value = "2")]
    qval: usize,

    /// Pads strings before extracting q-grams.
    #[clap(long)]
    padding: bool,

    /// Does not match records with no tokens.
    #[clap(long)]
    no_allow_empty: bool,

    /// Does not output similarity scores.
    #[clap(long)]
    no_sim_score: bool,

    /// Skips records the tokenizer fails on instead of aborting.
    #[clap(long)]
    skip_bad_records: bool,

    /// Disables parallel join.
    #[clap(short = 'p', long)]
    disable_parallel: bool,

    /// File path to write the result. If None, it is written to the standard output.
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let tokenizer: Box<dyn Tokenizer + Sync> = match args.tokenizer {
        TokenizerKind::Ws => Box::new(WhitespaceTokenizer),
        TokenizerKind::Delim => Box::new(DelimiterTokenizer::new(args.delimiters.chars())?),
        TokenizerKind::Qgram => Box::new(QgramTokenizer::new(args.qval, args.padding)?),
    };

    let policy = if args.skip_bad_records {
        TokenizeErrorPolicy::SkipRecord
    } else {
        TokenizeErrorPolicy::Abort
    };
    let config = JoinConfig::new(args.measure, args.threshold)?
        .comp_op(args.comp_op)
        .allow_empty(!args.no_allow_empty)
        .out_sim_score(!args.no_sim_score)
        .shows_progress(true)
        .on_tokenize_error(policy);

    let left = SideSpec::left(args.l_key, args.l_join)
        .out_attrs(split_attrs(args.l_out.as_deref()))
        .out_prefix(args.l_prefix);
    let right = SideSpec::right(args.r_key, args.r_join)
        .out_attrs(split_attrs(args.r_out.as_deref()))
        .out_prefix(args.r_prefix);

    let (ltable, rtable) = {
        eprintln!("Loading tables...");
        let start = Instant::now();
        let ltable = read_table(&args.left)?;
        let rtable = read_table(&args.right)?;
        eprintln!(
            "Loaded {} left records and {} right records in {} sec",
            ltable.num_rows(),
            rtable.num_rows(),
            start.elapsed().as_secs_f64()
        );
        (ltable, rtable)
    };

    eprintln!("Finding all similar pairs with {}...", args.measure);
    let start = Instant::now();
    let joiner = SetSimJoiner::new(config);
    let output = if args.disable_parallel {
        joiner.join(&ltable, &left, &rtable, &right, tokenizer.as_ref())?
    } else {
        joiner.join_in_parallel(&ltable, &left, &rtable, &right, tokenizer.as_ref())?
    };
    eprintln!(
        "Found {} pairs in {} sec",
        output.len(),
        start.elapsed().as_secs_f64()
    );

    let wtr: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut wtr = csv::Writer::from_writer(wtr);
    wtr.write_record(output.header())?;
    for row in output.rows() {
        wtr.write_record(row.to_fields())?;
    }
    wtr.flush()?;

    Ok(())
}

fn split_attrs(attrs: Option<&str>) -> Vec<String> {
    attrs.map_or_else(Vec::new, |attrs| {
        attrs
            .split(',')
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(|a| a.to_string())
            .collect()
    })
}

/// Reads a CSV table with a header row. Empty cells are missing values.
fn read_table(path: &Path) -> Result<Table> {
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut table = Table::new(rdr.headers()?.iter())?;
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        table
            .add_row(record.iter().map(|cell| (!cell.is_empty()).then(|| cell)))
            .map_err(|e| anyhow!("{}: record {}: {}", path.display(), i, e))?;
    }
    Ok(table)
}
