//! Set-similarity join driver.
use std::sync::Mutex;

use rayon::prelude::*;

use crate::comp_op::CompOp;
use crate::errors::{Result, SetSimJoinError};
use crate::measure::SimMeasure;
use crate::output::{self, JoinOutput, OutputRow, ResolvedSide, SideSpec};
use crate::position_filter::PositionFilter;
use crate::position_index::PositionIndex;
use crate::table::Table;
use crate::token_ordering::{Rank, TokenOrdering};
use crate::tokenizer::Tokenizer;

const PROGRESS_INTERVAL: usize = 1000;

/// What to do when the tokenizer fails on a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenizeErrorPolicy {
    /// Aborts the whole join with [`SetSimJoinError::Tokenize`].
    #[default]
    Abort,
    /// Logs a warning and treats the record as having a missing join value.
    SkipRecord,
}

/// Validated configuration of a join.
#[derive(Clone, Copy, Debug)]
pub struct JoinConfig {
    measure: SimMeasure,
    threshold: f64,
    comp_op: CompOp,
    allow_empty: bool,
    out_sim_score: bool,
    shows_progress: bool,
    on_tokenize_error: TokenizeErrorPolicy,
}

impl JoinConfig {
    /// Creates an instance with `>=` as the comparison operator, empty records allowed,
    /// and similarity scores in the output.
    ///
    /// # Arguments
    ///
    /// * `measure` - Similarity measure.
    /// * `threshold` - Threshold, in `[0,1]` for normalized measures and `[0,∞)` for overlap.
    pub fn new(measure: SimMeasure, threshold: f64) -> Result<Self> {
        measure.validate_threshold(threshold)?;
        Ok(Self {
            measure,
            threshold,
            comp_op: CompOp::Ge,
            allow_empty: true,
            out_sim_score: true,
            shows_progress: false,
            on_tokenize_error: TokenizeErrorPolicy::default(),
        })
    }

    /// Sets the comparison operator.
    pub const fn comp_op(mut self, comp_op: CompOp) -> Self {
        self.comp_op = comp_op;
        self
    }

    /// Matches records with no tokens to each other with score `1.0`?
    pub const fn allow_empty(mut self, yes: bool) -> Self {
        self.allow_empty = yes;
        self
    }

    /// Appends the similarity score to output rows?
    pub const fn out_sim_score(mut self, yes: bool) -> Self {
        self.out_sim_score = yes;
        self
    }

    /// Shows the progress via the standard error output?
    pub const fn shows_progress(mut self, yes: bool) -> Self {
        self.shows_progress = yes;
        self
    }

    /// Sets the policy for records the tokenizer fails on.
    pub const fn on_tokenize_error(mut self, policy: TokenizeErrorPolicy) -> Self {
        self.on_tokenize_error = policy;
        self
    }

    /// Gets the similarity measure.
    pub const fn measure(&self) -> SimMeasure {
        self.measure
    }

    /// Gets the threshold.
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Joiner finding all pairs of a left and a right table whose join attributes are similar.
///
/// The position index is built on the left table and probed with the records of the right
/// table, so the output is grouped by right records in table order and, within a right
/// record, ordered by left row.
#[derive(Clone, Copy, Debug)]
pub struct SetSimJoiner {
    config: JoinConfig,
}

// Everything a probe needs, immutable once built.
struct Probe<'a> {
    ltable: &'a Table,
    rtable: &'a Table,
    left: &'a ResolvedSide,
    right: &'a ResolvedSide,
    ordering: TokenOrdering,
    index: PositionIndex,
    filter: PositionFilter,
    sim_fn: fn(&[Rank], &[Rank]) -> f64,
    comp_fn: fn(f64, f64) -> bool,
    threshold: f64,
    allow_empty: bool,
    out_sim_score: bool,
}

impl<'a> Probe<'a> {
    fn output_row(&self, l_id: usize, r_id: usize, score: f64) -> OutputRow {
        let score = self.out_sim_score.then(|| score);
        output::output_row(
            self.ltable,
            self.left,
            l_id,
            self.rtable,
            self.right,
            r_id,
            score,
        )
    }

    // Returns the matches of one right record and the number of its candidates.
    fn run(&self, r_id: usize, tokens: &[String]) -> (Vec<OutputRow>, usize) {
        let r_tokens = self.ordering.order(tokens);
        let mut rows = vec![];

        if r_tokens.is_empty() {
            if self.allow_empty {
                for &l_id in self.index.empty_records() {
                    rows.push(self.output_row(l_id, r_id, 1.));
                }
            }
            return (rows, 0);
        }

        let candidates = self.filter.find_candidates(&r_tokens, &self.index);
        let num_candidates = candidates.len();
        for (l_id, _) in candidates.into_sorted_vec() {
            let l_tokens = match self.index.ordered_tokens(l_id) {
                Some(l_tokens) => l_tokens,
                None => continue,
            };
            let score = (self.sim_fn)(l_tokens, &r_tokens);
            if (self.comp_fn)(score, self.threshold) {
                rows.push(self.output_row(l_id, r_id, score));
            }
        }
        (rows, num_candidates)
    }
}

impl SetSimJoiner {
    /// Creates an instance.
    pub const fn new(config: JoinConfig) -> Self {
        Self { config }
    }

    /// Gets the configuration.
    pub const fn config(&self) -> &JoinConfig {
        &self.config
    }

    /// Joins two tables.
    ///
    /// # Arguments
    ///
    /// * `ltable` - Left table, on which the index is built.
    /// * `left` - Attributes of the left table.
    /// * `rtable` - Right table, whose records probe the index.
    /// * `right` - Attributes of the right table.
    /// * `tokenizer` - Tokenizer applied to the join attributes of both tables.
    ///
    /// # Errors
    ///
    /// Configuration errors are returned before any record is tokenized.
    /// With [`TokenizeErrorPolicy::Abort`], the first tokenizer failure aborts the join.
    ///
    /// # Examples
    ///
    /// ```
    /// use set_sim_join::{JoinConfig, SetSimJoiner, SideSpec, SimMeasure, Table};
    /// use set_sim_join::tokenizer::WhitespaceTokenizer;
    ///
    /// let mut ltable = Table::new(["id", "title"]).unwrap();
    /// ltable.add_row([Some("1"), Some("data science")]).unwrap();
    /// ltable.add_row([Some("2"), Some("data engineering")]).unwrap();
    /// let mut rtable = Table::new(["id", "title"]).unwrap();
    /// rtable.add_row([Some("10"), Some("data analytics")]).unwrap();
    ///
    /// let config = JoinConfig::new(SimMeasure::Jaccard, 0.3).unwrap();
    /// let output = SetSimJoiner::new(config)
    ///     .join(
    ///         &ltable,
    ///         &SideSpec::left("id", "title"),
    ///         &rtable,
    ///         &SideSpec::right("id", "title"),
    ///         &WhitespaceTokenizer,
    ///     )
    ///     .unwrap();
    ///
    /// assert_eq!(output.header(), &["l_id", "r_id", "_sim_score"]);
    /// assert_eq!(output.key_pairs(), vec![("1", "10"), ("2", "10")]);
    /// assert_eq!(output.rows()[0].score, Some(1. / 3.));
    /// ```
    pub fn join<T>(
        &self,
        ltable: &Table,
        left: &SideSpec,
        rtable: &Table,
        right: &SideSpec,
        tokenizer: &T,
    ) -> Result<JoinOutput>
    where
        T: Tokenizer + ?Sized,
    {
        let (lside, rside, header) = self.resolve(ltable, left, rtable, right)?;

        let policy = self.config.on_tokenize_error;
        let l_tokens = (0..ltable.num_rows())
            .map(|row| tokenize_record(ltable, &lside, row, "left", tokenizer, policy))
            .collect::<Result<Vec<_>>>()?;
        let r_tokens = (0..rtable.num_rows())
            .map(|row| tokenize_record(rtable, &rside, row, "right", tokenizer, policy))
            .collect::<Result<Vec<_>>>()?;

        let probe = self.build_probe(ltable, &lside, rtable, &rside, &l_tokens, &r_tokens)?;

        let mut rows = vec![];
        let mut num_candidates = 0;
        for (r_id, tokens) in r_tokens.iter().enumerate() {
            if self.config.shows_progress && (r_id + 1) % PROGRESS_INTERVAL == 0 {
                eprintln!(
                    "[SetSimJoiner::join] Processed {}/{}...",
                    r_id + 1,
                    r_tokens.len()
                );
            }
            if let Some(tokens) = tokens {
                let (matched, n) = probe.run(r_id, tokens);
                rows.extend(matched);
                num_candidates += n;
            }
        }
        self.report("join", num_candidates, rows.len());

        Ok(JoinOutput::new(header, rows))
    }

    /// Joins two tables, tokenizing and probing in parallel.
    ///
    /// The output is identical to that of [`SetSimJoiner::join`].
    pub fn join_in_parallel<T>(
        &self,
        ltable: &Table,
        left: &SideSpec,
        rtable: &Table,
        right: &SideSpec,
        tokenizer: &T,
    ) -> Result<JoinOutput>
    where
        T: Tokenizer + Sync + ?Sized,
    {
        let (lside, rside, header) = self.resolve(ltable, left, rtable, right)?;

        // Results are gathered in row order first, so the reported failure is the same as `join`.
        let policy = self.config.on_tokenize_error;
        let l_tokens = (0..ltable.num_rows())
            .into_par_iter()
            .map(|row| tokenize_record(ltable, &lside, row, "left", tokenizer, policy))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        let r_tokens = (0..rtable.num_rows())
            .into_par_iter()
            .map(|row| tokenize_record(rtable, &rside, row, "right", tokenizer, policy))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        let probe = self.build_probe(ltable, &lside, rtable, &rside, &l_tokens, &r_tokens)?;

        #[allow(clippy::mutex_atomic)]
        let processed = Mutex::new(0usize);

        let results: Vec<_> = r_tokens
            .par_iter()
            .enumerate()
            .map(|(r_id, tokens)| {
                if self.config.shows_progress {
                    // Mutex::lock also locks eprintln.
                    let mut cnt = processed.lock().unwrap_or_else(|e| e.into_inner());
                    *cnt += 1;
                    if *cnt % PROGRESS_INTERVAL == 0 {
                        eprintln!(
                            "[SetSimJoiner::join_in_parallel] Processed {}/{}...",
                            *cnt,
                            r_tokens.len()
                        );
                    }
                }
                tokens
                    .as_ref()
                    .map_or_else(|| (vec![], 0), |tokens| probe.run(r_id, tokens))
            })
            .collect();

        let num_candidates: usize = results.iter().map(|(_, n)| n).sum();
        let rows: Vec<_> = results.into_iter().flat_map(|(rows, _)| rows).collect();
        self.report("join_in_parallel", num_candidates, rows.len());

        Ok(JoinOutput::new(header, rows))
    }

    fn resolve(
        &self,
        ltable: &Table,
        left: &SideSpec,
        rtable: &Table,
        right: &SideSpec,
    ) -> Result<(ResolvedSide, ResolvedSide, Vec<String>)> {
        let lside = left.resolve(ltable, "left")?;
        let rside = right.resolve(rtable, "right")?;
        let header = output::output_header(&lside, &rside, self.config.out_sim_score)?;
        if !self.config.comp_op.is_lower_bounded() {
            log::warn!(
                "Only candidates sharing a token are verified, so pairs satisfying `{}` with no shared token are not reported.",
                self.config.comp_op
            );
        }
        Ok((lside, rside, header))
    }

    fn build_probe<'a>(
        &self,
        ltable: &'a Table,
        lside: &'a ResolvedSide,
        rtable: &'a Table,
        rside: &'a ResolvedSide,
        l_tokens: &[Option<Vec<String>>],
        r_tokens: &[Option<Vec<String>>],
    ) -> Result<Probe<'a>> {
        let JoinConfig {
            measure, threshold, ..
        } = self.config;

        let ordering = TokenOrdering::build(
            l_tokens
                .iter()
                .chain(r_tokens.iter())
                .filter_map(|t| t.as_deref()),
        );
        let index = PositionIndex::build(
            l_tokens
                .iter()
                .enumerate()
                .filter_map(|(id, t)| t.as_deref().map(|t| (id, t))),
            measure,
            threshold,
            &ordering,
        )?;
        log::debug!(
            "Built the position index: #tokens={}, #records={}, #postings={}, #empty_records={}, memory={} bytes",
            ordering.len(),
            index.num_records(),
            index.num_postings(),
            index.empty_records().len(),
            index.memory_in_bytes(),
        );

        Ok(Probe {
            ltable,
            rtable,
            left: lside,
            right: rside,
            ordering,
            index,
            filter: PositionFilter::new(measure, threshold),
            sim_fn: measure.sim_fn(),
            comp_fn: self.config.comp_op.comp_fn(),
            threshold,
            allow_empty: self.config.allow_empty,
            out_sim_score: self.config.out_sim_score,
        })
    }

    fn report(&self, method: &str, num_candidates: usize, num_matched: usize) {
        if self.config.shows_progress {
            eprintln!("[SetSimJoiner::{method}] Done");
            eprintln!("[SetSimJoiner::{method}] #candidates={num_candidates}");
            eprintln!("[SetSimJoiner::{method}] #matched={num_matched}");
        }
        log::debug!("#candidates={num_candidates}, #matched={num_matched}");
    }
}

fn tokenize_record<T>(
    table: &Table,
    side: &ResolvedSide,
    row: usize,
    label: &'static str,
    tokenizer: &T,
    policy: TokenizeErrorPolicy,
) -> Result<Option<Vec<String>>>
where
    T: Tokenizer + ?Sized,
{
    let text = match table.cell(row, side.join) {
        Some(text) => text,
        None => return Ok(None),
    };
    match tokenizer.tokenize(text) {
        Ok(tokens) => Ok(Some(tokens)),
        Err(source) => match policy {
            TokenizeErrorPolicy::Abort => Err(SetSimJoinError::Tokenize {
                table: label,
                record: row,
                source,
            }),
            TokenizeErrorPolicy::SkipRecord => {
                log::warn!("Skipped record {row} of the {label} table: {source}");
                Ok(None)
            }
        },
    }
}

macro_rules! measure_join {
    ($(#[$attr:meta])* $name:ident, $measure:expr) => {
        $(#[$attr])*
        pub fn $name<T>(
            ltable: &Table,
            left: &SideSpec,
            rtable: &Table,
            right: &SideSpec,
            tokenizer: &T,
            threshold: f64,
        ) -> Result<JoinOutput>
        where
            T: Tokenizer + ?Sized,
        {
            let config = JoinConfig::new($measure, threshold)?;
            SetSimJoiner::new(config).join(ltable, left, rtable, right, tokenizer)
        }
    };
}

measure_join!(
    /// Joins two tables on Jaccard similarity `>= threshold` with the default configuration.
    jaccard_join,
    SimMeasure::Jaccard
);
measure_join!(
    /// Joins two tables on cosine similarity `>= threshold` with the default configuration.
    cosine_join,
    SimMeasure::Cosine
);
measure_join!(
    /// Joins two tables on Dice similarity `>= threshold` with the default configuration.
    dice_join,
    SimMeasure::Dice
);
measure_join!(
    /// Joins two tables on overlap `>= threshold` with the default configuration.
    overlap_join,
    SimMeasure::Overlap
);

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use hashbrown::HashSet;
    use rand::{Rng, SeedableRng};

    use crate::errors::TokenizeError;
    use crate::tokenizer::WhitespaceTokenizer;

    fn table(rows: &[(&str, Option<&str>)]) -> Table {
        let mut table = Table::new(["id", "text"]).unwrap();
        for &(id, text) in rows {
            table.add_row([Some(id), text]).unwrap();
        }
        table
    }

    fn join(config: JoinConfig, ltable: &Table, rtable: &Table) -> Result<JoinOutput> {
        SetSimJoiner::new(config).join(
            ltable,
            &SideSpec::left("id", "text"),
            rtable,
            &SideSpec::right("id", "text"),
            &WhitespaceTokenizer,
        )
    }

    #[test]
    fn test_data_scenario() {
        let ltable = table(&[("1", Some("data science")), ("2", Some("data engineering"))]);
        let rtable = table(&[("10", Some("data analytics"))]);
        let config = JoinConfig::new(SimMeasure::Jaccard, 0.3).unwrap();
        let output = join(config, &ltable, &rtable).unwrap();
        assert_eq!(output.header(), &["l_id", "r_id", "_sim_score"]);
        assert_eq!(
            output.rows(),
            &[
                OutputRow {
                    l_key: "1".to_string(),
                    r_key: "10".to_string(),
                    l_values: vec![],
                    r_values: vec![],
                    score: Some(1. / 3.),
                },
                OutputRow {
                    l_key: "2".to_string(),
                    r_key: "10".to_string(),
                    l_values: vec![],
                    r_values: vec![],
                    score: Some(1. / 3.),
                },
            ]
        );
    }

    #[test]
    fn test_empty_scenario() {
        let ltable = table(&[("1", Some("")), ("2", Some("a b"))]);
        let rtable = table(&[("10", Some("  "))]);
        for measure in [
            SimMeasure::Jaccard,
            SimMeasure::Cosine,
            SimMeasure::Dice,
            SimMeasure::Overlap,
        ] {
            let config = JoinConfig::new(measure, 0.).unwrap();
            let output = join(config, &ltable, &rtable).unwrap();
            assert_eq!(output.key_pairs(), vec![("1", "10")]);
            assert_eq!(output.rows()[0].score, Some(1.));

            let output = join(config.allow_empty(false), &ltable, &rtable).unwrap();
            assert!(output.is_empty());
        }
    }

    #[test]
    fn test_empty_left_never_matches_non_empty() {
        let ltable = table(&[("1", Some("")), ("2", Some("x"))]);
        let rtable = table(&[("10", Some("a b")), ("11", Some(""))]);
        let config = JoinConfig::new(SimMeasure::Jaccard, 0.).unwrap();
        let output = join(config, &ltable, &rtable).unwrap();
        assert_eq!(output.key_pairs(), vec![("1", "11")]);
        let output = join(config.allow_empty(false), &ltable, &rtable).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_missing_join_values() {
        let ltable = table(&[("1", None), ("2", Some("a b c"))]);
        let rtable = table(&[("10", Some("a b c")), ("11", None)]);
        let config = JoinConfig::new(SimMeasure::Dice, 0.5).unwrap();
        let output = join(config, &ltable, &rtable).unwrap();
        assert_eq!(output.key_pairs(), vec![("2", "10")]);
    }

    #[test]
    fn test_out_attrs() {
        let mut ltable = Table::new(["lid", "title", "year"]).unwrap();
        ltable
            .add_row([Some("1"), Some("deep learning"), Some("2016")])
            .unwrap();
        let mut rtable = Table::new(["rid", "name"]).unwrap();
        rtable.add_row([Some("9"), Some("learning deep")]).unwrap();

        let config = JoinConfig::new(SimMeasure::Cosine, 0.9)
            .unwrap()
            .out_sim_score(false);
        let output = SetSimJoiner::new(config)
            .join(
                &ltable,
                &SideSpec::left("lid", "title")
                    .out_attrs(["year", "title"])
                    .out_prefix("ltable."),
                &rtable,
                &SideSpec::right("rid", "name")
                    .out_attrs(["name"])
                    .out_prefix("rtable."),
                &WhitespaceTokenizer,
            )
            .unwrap();
        assert_eq!(
            output.header(),
            &[
                "ltable.lid",
                "rtable.rid",
                "ltable.year",
                "ltable.title",
                "rtable.name"
            ]
        );
        assert_eq!(
            output.rows()[0].to_fields(),
            vec!["1", "9", "2016", "deep learning", "learning deep"]
        );
    }

    #[test]
    fn test_comp_ops() {
        let ltable = table(&[("1", Some("a b")), ("2", Some("a b c d"))]);
        let rtable = table(&[("10", Some("a b c"))]);
        // Jaccard: 2/3 and 3/4.
        let config = JoinConfig::new(SimMeasure::Jaccard, 0.75).unwrap();
        let pairs = |op| {
            join(config.comp_op(op), &ltable, &rtable)
                .unwrap()
                .rows()
                .iter()
                .map(|r| r.l_key.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(pairs(CompOp::Ge), vec!["2"]);
        assert_eq!(pairs(CompOp::Eq), vec!["2"]);
        assert!(pairs(CompOp::Gt).is_empty());

        // Only candidates sharing a prefix token are verified.
        let config = JoinConfig::new(SimMeasure::Jaccard, 0.5).unwrap();
        let output = join(config.comp_op(CompOp::Le), &ltable, &rtable).unwrap();
        assert!(output
            .rows()
            .iter()
            .all(|r| r.score.map_or(false, |s| s <= 0.5)));
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            JoinConfig::new(SimMeasure::Jaccard, 1.2),
            Err(SetSimJoinError::InvalidThreshold { .. })
        ));

        let ltable = table(&[("1", Some("a"))]);
        let rtable = table(&[("10", Some("a"))]);
        let calls = Cell::new(0);
        let tokenizer = |text: &str| -> Result<Vec<String>, TokenizeError> {
            calls.set(calls.get() + 1);
            Ok(vec![text.to_string()])
        };
        let joiner = SetSimJoiner::new(JoinConfig::new(SimMeasure::Overlap, 1.).unwrap());

        let result = joiner.join(
            &ltable,
            &SideSpec::left("id", "body"),
            &rtable,
            &SideSpec::right("id", "text"),
            &tokenizer,
        );
        assert!(matches!(
            result,
            Err(SetSimJoinError::ColumnNotFound { table: "left", .. })
        ));

        let result = joiner.join(
            &ltable,
            &SideSpec::left("id", "text").out_prefix("x_"),
            &rtable,
            &SideSpec::right("id", "text").out_prefix("x_"),
            &tokenizer,
        );
        assert!(matches!(
            result,
            Err(SetSimJoinError::OutputColumnCollision(_))
        ));

        let duplicated = table(&[("10", Some("a")), ("10", Some("b"))]);
        let result = joiner.join(
            &ltable,
            &SideSpec::left("id", "text"),
            &duplicated,
            &SideSpec::right("id", "text"),
            &tokenizer,
        );
        assert!(matches!(
            result,
            Err(SetSimJoinError::InvalidKeyAttribute { table: "right", .. })
        ));

        assert_eq!(calls.get(), 0);
    }

    fn failing_tokenizer(text: &str) -> Result<Vec<String>, TokenizeError> {
        if text.contains('!') {
            Err(format!("cannot tokenize {text:?}").into())
        } else {
            Ok(text.split_whitespace().map(|t| t.to_string()).collect())
        }
    }

    #[test]
    fn test_tokenize_error() {
        let ltable = table(&[("1", Some("a b")), ("2", Some("a b!"))]);
        let rtable = table(&[("10", Some("a b"))]);
        let config = JoinConfig::new(SimMeasure::Jaccard, 0.5).unwrap();
        let result = SetSimJoiner::new(config).join(
            &ltable,
            &SideSpec::left("id", "text"),
            &rtable,
            &SideSpec::right("id", "text"),
            &failing_tokenizer,
        );
        assert!(matches!(
            result,
            Err(SetSimJoinError::Tokenize {
                table: "left",
                record: 1,
                ..
            })
        ));

        let config = config.on_tokenize_error(TokenizeErrorPolicy::SkipRecord);
        for parallel in [false, true] {
            let joiner = SetSimJoiner::new(config);
            let left = SideSpec::left("id", "text");
            let right = SideSpec::right("id", "text");
            let result = if parallel {
                joiner.join_in_parallel(&ltable, &left, &rtable, &right, &failing_tokenizer)
            } else {
                joiner.join(&ltable, &left, &rtable, &right, &failing_tokenizer)
            };
            assert_eq!(result.unwrap().key_pairs(), vec![("1", "10")]);
        }
    }

    #[test]
    fn test_tokenize_error_in_parallel() {
        let rows: Vec<_> = (0..200)
            .map(|i| {
                let text = if i % 7 == 3 { "bad!" } else { "a b" };
                (i.to_string(), text)
            })
            .collect();
        let rows: Vec<_> = rows.iter().map(|(id, t)| (id.as_str(), Some(*t))).collect();
        let ltable = table(&[("1", Some("a b"))]);
        let rtable = table(&rows);
        let joiner = SetSimJoiner::new(JoinConfig::new(SimMeasure::Jaccard, 0.5).unwrap());
        for _ in 0..10 {
            let result = joiner.join_in_parallel(
                &ltable,
                &SideSpec::left("id", "text"),
                &rtable,
                &SideSpec::right("id", "text"),
                &failing_tokenizer,
            );
            assert!(matches!(
                result,
                Err(SetSimJoinError::Tokenize {
                    table: "right",
                    record: 3,
                    ..
                })
            ));
        }
        assert_eq!(TokenizeErrorPolicy::default(), TokenizeErrorPolicy::Abort);
    }

    const VOCAB: [&str; 12] = [
        "the", "of", "data", "join", "set", "prefix", "index", "token", "rust", "filter", "fast",
        "exact",
    ];

    fn random_table<R: Rng>(rng: &mut R, label: &str, num_rows: usize) -> Table {
        let mut table = Table::new(["id", "text"]).unwrap();
        for i in 0..num_rows {
            let text = if rng.gen_range(0..20) == 0 {
                None
            } else {
                let len = rng.gen_range(0..7);
                let words: Vec<_> = (0..len)
                    .map(|_| VOCAB[rng.gen_range(0..VOCAB.len()).min(rng.gen_range(0..VOCAB.len()))])
                    .collect();
                Some(words.join(" "))
            };
            table.add_row([Some(format!("{label}{i}")), text]).unwrap();
        }
        table
    }

    fn naive_join(
        ltable: &Table,
        rtable: &Table,
        measure: SimMeasure,
        threshold: f64,
        comp_op: CompOp,
        allow_empty: bool,
    ) -> Vec<(String, String, f64)> {
        let token_set = |text: &str| -> HashSet<String> {
            text.split_whitespace().map(|t| t.to_string()).collect()
        };
        let mut results = vec![];
        for r in 0..rtable.num_rows() {
            let y = match rtable.cell(r, 1) {
                Some(text) => token_set(text),
                None => continue,
            };
            for l in 0..ltable.num_rows() {
                let x = match ltable.cell(l, 1) {
                    Some(text) => token_set(text),
                    None => continue,
                };
                let score = match (x.is_empty(), y.is_empty()) {
                    (true, true) if allow_empty => 1.,
                    (false, false) => {
                        let o = x.intersection(&y).count();
                        let (m, n) = (x.len(), y.len());
                        match measure {
                            SimMeasure::Jaccard => o as f64 / (m + n - o) as f64,
                            SimMeasure::Cosine => o as f64 / ((m * n) as f64).sqrt(),
                            SimMeasure::Dice => 2. * o as f64 / (m + n) as f64,
                            SimMeasure::Overlap => o as f64,
                        }
                    }
                    _ => continue,
                };
                if x.is_empty() || comp_op.apply(score, threshold) {
                    results.push((
                        ltable.cell(l, 0).unwrap().to_string(),
                        rtable.cell(r, 0).unwrap().to_string(),
                        score,
                    ));
                }
            }
        }
        results
    }

    fn triplets(output: &JoinOutput) -> Vec<(String, String, f64)> {
        output
            .rows()
            .iter()
            .map(|r| (r.l_key.clone(), r.r_key.clone(), r.score.unwrap()))
            .collect()
    }

    // The filtered join reports exactly the pairs of the brute-force join.
    fn test_against_naive(measure: SimMeasure, threshold: f64, comp_op: CompOp) {
        let mut rng = rand_xoshiro::SplitMix64::seed_from_u64(42);
        let ltable = random_table(&mut rng, "l", 80);
        let rtable = random_table(&mut rng, "r", 60);

        for allow_empty in [true, false] {
            let expected = naive_join(&ltable, &rtable, measure, threshold, comp_op, allow_empty);
            let config = JoinConfig::new(measure, threshold)
                .unwrap()
                .comp_op(comp_op)
                .allow_empty(allow_empty);
            let joiner = SetSimJoiner::new(config);
            let left = SideSpec::left("id", "text");
            let right = SideSpec::right("id", "text");

            let output = joiner
                .join(&ltable, &left, &rtable, &right, &WhitespaceTokenizer)
                .unwrap();
            assert_eq!(
                triplets(&output),
                expected,
                "{measure} {comp_op} {threshold}"
            );

            let parallel = joiner
                .join_in_parallel(&ltable, &left, &rtable, &right, &WhitespaceTokenizer)
                .unwrap();
            assert_eq!(parallel, output);
        }
    }

    #[test]
    fn test_jaccard_for_all() {
        for t in 1..=10 {
            test_against_naive(SimMeasure::Jaccard, t as f64 / 10., CompOp::Ge);
            test_against_naive(SimMeasure::Jaccard, t as f64 / 10., CompOp::Gt);
        }
        test_against_naive(SimMeasure::Jaccard, 0.5, CompOp::Eq);
    }

    #[test]
    fn test_cosine_for_all() {
        for t in 1..=10 {
            test_against_naive(SimMeasure::Cosine, t as f64 / 10., CompOp::Ge);
            test_against_naive(SimMeasure::Cosine, t as f64 / 10., CompOp::Gt);
        }
    }

    #[test]
    fn test_dice_for_all() {
        for t in 1..=10 {
            test_against_naive(SimMeasure::Dice, t as f64 / 10., CompOp::Ge);
            test_against_naive(SimMeasure::Dice, t as f64 / 10., CompOp::Gt);
        }
        test_against_naive(SimMeasure::Dice, 0.5, CompOp::Eq);
    }

    #[test]
    fn test_overlap_for_all() {
        for t in 1..=6 {
            test_against_naive(SimMeasure::Overlap, t as f64, CompOp::Ge);
            test_against_naive(SimMeasure::Overlap, t as f64, CompOp::Eq);
        }
    }

    #[test]
    fn test_deterministic() {
        let mut rng = rand_xoshiro::SplitMix64::seed_from_u64(3);
        let ltable = random_table(&mut rng, "l", 50);
        let rtable = random_table(&mut rng, "r", 50);
        let config = JoinConfig::new(SimMeasure::Cosine, 0.4).unwrap();
        assert_eq!(
            join(config, &ltable, &rtable).unwrap(),
            join(config, &ltable, &rtable).unwrap()
        );
    }

    #[test]
    fn test_convenience_joins() {
        let ltable = table(&[("1", Some("a b c")), ("2", Some("c d"))]);
        let rtable = table(&[("10", Some("a b c d"))]);
        let left = SideSpec::left("id", "text");
        let right = SideSpec::right("id", "text");
        let tokenizer = WhitespaceTokenizer;

        let output = jaccard_join(&ltable, &left, &rtable, &right, &tokenizer, 0.75).unwrap();
        assert_eq!(output.key_pairs(), vec![("1", "10")]);
        let output = dice_join(&ltable, &left, &rtable, &right, &tokenizer, 0.6).unwrap();
        assert_eq!(output.key_pairs(), vec![("1", "10"), ("2", "10")]);
        let output = cosine_join(&ltable, &left, &rtable, &right, &tokenizer, 0.8).unwrap();
        assert_eq!(output.key_pairs(), vec![("1", "10")]);
        let output = overlap_join(&ltable, &left, &rtable, &right, &tokenizer, 2.).unwrap();
        assert_eq!(output.key_pairs(), vec![("1", "10"), ("2", "10")]);
        assert_eq!(output.rows()[0].score, Some(3.));
    }
}
