//! CLI command handlers: search by profile, search by sequence, press.

use anyhow::Result;
use log::{debug, info, warn};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::dispatch::ProgressFn;
use crate::engine::alphabet::Alphabet;
use crate::engine::arg_parser::{Cli, Commands, ScoringArgs};
use crate::engine::profile::{Builder, Profile, read_models};
use crate::engine::progress::{finish_bar, search_progress_callback, setup_progress};
use crate::engine::sequence::{DigitalSequence, digitize_all, load_corpus, read_fasta};
use crate::errors::InputError;
use crate::press::{prepare_press_outputs, press};
use crate::search::{search_by_profile, search_by_sequence};
use crate::utils::config::ProgressConsts;
use crate::utils::settings_toml::{apply_file_to_opts, load_settings_toml};
use crate::utils::setup_logging;
use crate::{Opts, SearchOpts, TopHits};

fn apply_scoring_args(scoring: &ScoringArgs, opts: &mut Opts) {
    if let Some(t) = scoring.threshold {
        opts.pipeline.report_threshold = t;
    }
    if scoring.max_hits.is_some() {
        opts.pipeline.max_hits = scoring.max_hits;
    }
}

/// Settings file from the working directory first, then CLI flags on top. Sets up logging.
fn setup_opts(cli: &Cli) -> Result<Opts> {
    let mut opts = Opts::default();
    let file = load_settings_toml(Path::new("."))?;
    if let Some(file) = &file {
        apply_file_to_opts(file, &mut opts);
    }
    if let Some(jobs) = cli.jobs {
        opts.jobs = jobs;
    }
    if let Some(verbose) = cli.verbose {
        opts.verbose = verbose;
    }
    match &cli.command {
        Commands::SearchByProfile { scoring, .. } => apply_scoring_args(scoring, &mut opts),
        Commands::SearchBySequence {
            scoring,
            match_score,
            mismatch_score,
            ..
        } => {
            apply_scoring_args(scoring, &mut opts);
            if let Some(m) = match_score {
                opts.match_score = *m;
            }
            if let Some(mm) = mismatch_score {
                opts.mismatch_score = *mm;
            }
        }
        Commands::Press { .. } => {}
    }
    setup_logging(opts.verbose);
    if file.is_some() {
        debug!("Loaded settings file");
    }
    Ok(opts)
}

/// Print reported hits as `target\t-\tquery\tscore`. Returns (queries, reported hits).
fn print_hits<I>(results: I) -> Result<(usize, usize)>
where
    I: Iterator<Item = TopHits>,
{
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut queries = 0;
    let mut reported = 0;
    for hits in results {
        queries += 1;
        for hit in hits.reported() {
            writeln!(out, "{}\t-\t{}\t{}", hit.name, hits.query_name, hit.score)?;
            reported += 1;
        }
    }
    out.flush()?;
    Ok((queries, reported))
}

fn read_models_checked(path: &Path) -> Result<Vec<Profile>> {
    let models = read_models(path)?;
    if models.is_empty() {
        warn!("{} contains no models", path.display());
    }
    Ok(models)
}

fn handle_search_by_profile(models: &Path, corpus: &Path, opts: &Opts) -> Result<()> {
    let models = read_models_checked(models)?;
    let corpus = load_corpus(corpus, models.first().map(|m| m.alphabet))?;
    let search_opts = SearchOpts::from(opts);

    let bar = setup_progress(opts.verbose, ProgressConsts::SEARCH_DESC);
    let callback = bar.as_ref().map(search_progress_callback::<Profile>);
    let progress = callback.as_ref().map(|cb| cb as &ProgressFn<'_, Profile>);

    let results = search_by_profile(models, &corpus, &search_opts, progress)?;
    if let Some(bar) = &bar {
        finish_bar(bar);
    }
    let (queries, reported) = print_hits(results)?;
    info!(
        "Searched {} profiles against {} sequences: {} hits reported",
        queries,
        corpus.len(),
        reported
    );
    Ok(())
}

fn handle_search_by_sequence(queries: &Path, corpus: &Path, opts: &Opts) -> Result<()> {
    let corpus = load_corpus(corpus, None)?;
    let alphabet: Alphabet = corpus.first().ok_or(InputError::EmptyCorpus)?.alphabet;
    let queries: Vec<DigitalSequence> = digitize_all(&read_fasta(queries)?, alphabet)?;
    let builder = Builder::with_scores(alphabet, opts.match_score, opts.mismatch_score);
    let search_opts = SearchOpts::from(opts);

    let bar = setup_progress(opts.verbose, ProgressConsts::SEARCH_DESC);
    let callback = bar.as_ref().map(search_progress_callback::<DigitalSequence>);
    let progress = callback
        .as_ref()
        .map(|cb| cb as &ProgressFn<'_, DigitalSequence>);

    let results = search_by_sequence(queries, &corpus, &search_opts, Some(builder), progress)?;
    if let Some(bar) = &bar {
        finish_bar(bar);
    }
    let (queries, reported) = print_hits(results)?;
    info!(
        "Searched {} sequences against {} sequences: {} hits reported",
        queries,
        corpus.len(),
        reported
    );
    Ok(())
}

fn handle_press(models: &Path, force: bool) -> Result<()> {
    prepare_press_outputs(models, force)?;
    let profiles = read_models_checked(models)?;
    debug!("Pressing {} models from {}", profiles.len(), models.display());
    press(profiles, models)?;
    Ok(())
}

/// Run the selected subcommand.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli)?;
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    match &cli.command {
        Commands::SearchByProfile { models, corpus, .. } => {
            handle_search_by_profile(models, corpus, &opts)
        }
        Commands::SearchBySequence {
            queries, corpus, ..
        } => handle_search_by_sequence(queries, corpus, &opts),
        Commands::Press { models, force } => handle_press(models, *force),
    }
}
