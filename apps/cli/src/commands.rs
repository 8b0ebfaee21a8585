//! CLI flag definitions, mode selection, and tracing setup.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use rfctrans_core::pipeline::{self, Outcome, ProgressReporter};
use rfctrans_core::{
    BatchReport, OpenAiChat, Window, Workspace, fetch_status, make_index, make_index_draft,
    make_json, run_batch, run_continuous, summarize, translate_sample,
};
use rfctrans_fetch::FetchOptions;
use rfctrans_shared::{RfcId, load_config, parse_rfc_list, validate_api_key};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// rfctrans: fetch, translate and render IETF RFCs as bilingual HTML.
#[derive(Parser, Debug)]
#[command(
    name = "rfctrans",
    version,
    about = "Fetch IETF RFCs, machine-translate them and render bilingual HTML pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// RFC numbers to process (comma-separated, e.g. 8446,8447).
    #[arg(long, value_name = "LIST")]
    pub rfc: Option<String>,

    /// First RFC number of a range (inclusive).
    #[arg(long, value_name = "N")]
    pub begin: Option<u32>,

    /// End of a range (exclusive).
    #[arg(long, value_name = "N")]
    pub end: Option<u32>,

    /// Internet-Draft name (draft-...).
    #[arg(long, value_name = "NAME")]
    pub draft: Option<String>,

    /// Only fetch the source document.
    #[arg(long)]
    pub fetch: bool,

    /// Only translate an already fetched document.
    #[arg(long)]
    pub trans: bool,

    /// Only render the HTML page from stored artifacts.
    #[arg(long)]
    pub make: bool,

    /// Rebuild the translation JSON from a hand-corrected page.
    #[arg(long)]
    pub make_json: bool,

    /// Summarize the RFC with a chat model, then re-render its page.
    #[arg(long)]
    pub summarize: bool,

    /// Write html/index.html for every translated RFC.
    #[arg(long)]
    pub make_index: bool,

    /// Write html/draft/index.html for every translated draft.
    #[arg(long)]
    pub make_index_draft: bool,

    /// Download the master index and refresh the status snapshot.
    #[arg(long)]
    pub fetch_status: bool,

    /// Translate a fixed sample to check the translation endpoint.
    #[arg(long)]
    pub transtest: bool,

    /// Redo work even when artifacts already exist.
    #[arg(short, long)]
    pub force: bool,

    /// Continuous mode, but only the first untranslated RFC.
    #[arg(long)]
    pub only_first: bool,

    /// Process every RFC published upstream but missing locally.
    #[arg(long)]
    pub continuous: bool,

    /// Always use the plain-text source, even for XML-era RFCs.
    #[arg(long)]
    pub txt: bool,

    /// Chat model used by --summarize (defaults to openai.default_model).
    #[arg(long, value_name = "MODEL")]
    pub chatgpt: Option<String>,

    /// Path to the config file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// What a single invocation does, in flag precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    MakeIndex,
    MakeIndexDraft,
    FetchStatus,
    TransTest,
    Summarize,
    Fetch,
    Trans,
    Make,
    MakeJson,
    Pipeline,
    Continuous,
    Help,
}

impl Cli {
    pub(crate) fn mode(&self) -> Mode {
        let stages = [
            (self.make_index, Mode::MakeIndex),
            (self.make_index_draft, Mode::MakeIndexDraft),
            (self.fetch_status, Mode::FetchStatus),
            (self.transtest, Mode::TransTest),
            (self.summarize, Mode::Summarize),
            (self.fetch, Mode::Fetch),
            (self.trans, Mode::Trans),
            (self.make, Mode::Make),
            (self.make_json, Mode::MakeJson),
            (self.has_explicit_targets(), Mode::Pipeline),
            (self.continuous || self.only_first, Mode::Continuous),
        ];
        stages
            .into_iter()
            .find_map(|(set, mode)| set.then_some(mode))
            .unwrap_or(Mode::Help)
    }

    fn is_continuous(&self) -> bool {
        self.continuous || self.only_first
    }

    /// `--begin/--end` name a range only outside continuous mode, where they
    /// bound the window instead.
    fn has_explicit_targets(&self) -> bool {
        self.rfc.is_some()
            || self.draft.is_some()
            || (!self.is_continuous() && self.begin.is_some() && self.end.is_some())
    }

    /// The documents named on the command line.
    pub(crate) fn targets(&self) -> Result<Vec<RfcId>> {
        let mut ids = match &self.rfc {
            Some(list) => parse_rfc_list(list)?,
            None => Vec::new(),
        };

        if let Some(name) = &self.draft {
            if !name.starts_with("draft-") {
                return Err(eyre!("--draft expects a name starting with 'draft-', got '{name}'"));
            }
            ids.push(RfcId::draft(name.as_str()));
        }

        if ids.is_empty() {
            if let (Some(begin), Some(end)) = (self.begin, self.end) {
                if begin >= end {
                    return Err(eyre!("empty range: --begin {begin} --end {end}"));
                }
                ids.extend((begin..end).map(RfcId::number));
            }
        }

        if ids.is_empty() {
            return Err(eyre!("no document given: use --rfc, --draft or --begin/--end"));
        }
        Ok(ids)
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            force: self.force,
            force_text: self.txt,
        }
    }

    fn window(&self) -> Window {
        Window {
            begin: self.begin,
            end: self.end,
            only_first: self.only_first,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "rfctrans=info",
        1 => "rfctrans=debug",
        _ => "rfctrans=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the mode selected by the flags.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let started = Instant::now();
    let mode = cli.mode();
    if mode == Mode::Help {
        Cli::command().print_help()?;
        println!("{}", completion_banner(started.elapsed()));
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let ws = Workspace::new(config)?;
    info!(?mode, "starting");

    let progress = CliProgress::new();
    let result = dispatch(&cli, mode, &ws, &progress).await;
    progress.clear();
    result?;

    println!("{}", completion_banner(started.elapsed()));
    Ok(())
}

/// Printed after every successful run, help included.
fn completion_banner(elapsed: Duration) -> String {
    format!("\n  Finished in {:.1}s\n", elapsed.as_secs_f64())
}

async fn dispatch(cli: &Cli, mode: Mode, ws: &Workspace, progress: &CliProgress) -> Result<()> {
    match mode {
        Mode::MakeIndex => {
            let path = make_index(ws.store())?;
            println!("  Index written: {}", path.display());
        }
        Mode::MakeIndexDraft => {
            let path = make_index_draft(ws.store())?;
            println!("  Draft index written: {}", path.display());
        }
        Mode::FetchStatus => {
            let report = fetch_status(ws, progress).await?;
            println!("  RFCs:     {}", report.entries);
            println!("  Groups:   {}", report.groups);
            println!("  Snapshot: {}", report.snapshot_path.display());
            println!("  Groups:   {}", report.groups_path.display());
        }
        Mode::TransTest => cmd_transtest(ws, progress).await?,
        Mode::Summarize => cmd_summarize(cli, ws, progress).await?,
        Mode::Fetch => {
            for id in cli.targets()? {
                let outcome = pipeline::fetch(ws, &id, cli.fetch_options(), progress).await?;
                let source = if outcome.from_cache { "cache" } else { "remote" };
                println!("  {}: fetched from {source}", id.file_stem());
            }
        }
        Mode::Trans => {
            for id in cli.targets()? {
                let trans = pipeline::translate(ws, &id, cli.force, progress).await?;
                println!("  {}: {} paragraphs pending", id.file_stem(), trans.pending_count());
            }
        }
        Mode::Make => {
            for id in cli.targets()? {
                let path = pipeline::render(ws, &id, progress)?;
                println!("  {}: {}", id.file_stem(), path.display());
            }
        }
        Mode::MakeJson => {
            for id in cli.targets()? {
                make_json(ws.store(), &id)?;
                println!("  {}: {}", id.file_stem(), ws.store().translation_path(&id).display());
            }
        }
        Mode::Pipeline => {
            let ids = cli.targets()?;
            let report = run_batch(ws, &ids, cli.fetch_options(), progress).await?;
            print_report(&report);
        }
        Mode::Continuous => {
            let report = run_continuous(ws, cli.window(), cli.fetch_options(), progress).await?;
            print_report(&report);
        }
        Mode::Help => {}
    }
    Ok(())
}

async fn cmd_transtest(ws: &Workspace, progress: &CliProgress) -> Result<()> {
    progress.phase(&format!("Translating sample with {}", ws.translator().name()));
    let pairs = translate_sample(ws.translator()).await?;
    progress.clear();
    for (source, translated) in pairs {
        println!("  en: {source}");
        println!("  ja: {translated}");
        println!();
    }
    Ok(())
}

async fn cmd_summarize(cli: &Cli, ws: &Workspace, progress: &CliProgress) -> Result<()> {
    let model = cli
        .chatgpt
        .clone()
        .unwrap_or_else(|| ws.config().openai.default_model.clone());
    let api_key = validate_api_key(ws.config())?;
    let chat = OpenAiChat::new(ws.client().clone(), &ws.config().openai, api_key);
    let confirm = |question: &str| progress.ask(question);

    for id in cli.targets()? {
        let Some(number) = id.as_number() else {
            return Err(eyre!("only published RFCs can be summarized, got {id}"));
        };
        progress.phase(&format!("Summarizing RFC {number} with {model}"));
        if summarize(ws, &chat, number, &model, cli.force, &confirm).await? {
            pipeline::render(ws, &id, progress)?;
            progress.println(format!("  rfc{number}: summary written"));
        } else {
            progress.println(format!("  rfc{number}: summary unchanged"));
        }
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!();
    println!("  Processed: {}", report.total());
    println!("  Done:      {}", report.done.len());
    if !report.not_found.is_empty() {
        let missing: Vec<String> = report.not_found.iter().map(RfcId::id).collect();
        println!("  Not found: {}", missing.join(", "));
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn println(&self, line: String) {
        self.spinner.println(line);
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }

    /// Show `question` and read a yes/no answer from stdin.
    fn ask(&self, question: &str) -> bool {
        self.spinner.suspend(|| {
            println!("{question}");
            print!("Continue? [y/N] ");
            let _ = io::stdout().flush();

            let mut answer = String::new();
            if io::stdin().lock().read_line(&mut answer).is_err() {
                return false;
            }
            matches!(answer.trim(), "y" | "Y" | "yes")
        })
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn section_translated(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Translating [{current}/{total}]"));
    }

    fn finished(&self, id: &RfcId, outcome: Outcome) {
        let state = match outcome {
            Outcome::Done => "done",
            Outcome::NotFound => "not found",
        };
        self.spinner.println(format!("  {}: {state}", id.file_stem()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rfctrans").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flag_precedence() {
        assert_eq!(cli(&["--make-index", "--fetch-status"]).mode(), Mode::MakeIndex);
        assert_eq!(cli(&["--fetch-status", "--transtest"]).mode(), Mode::FetchStatus);
        assert_eq!(cli(&["--rfc", "8446", "--summarize", "--make"]).mode(), Mode::Summarize);
        assert_eq!(cli(&["--rfc", "8446", "--trans", "--make"]).mode(), Mode::Trans);
        assert_eq!(cli(&["--rfc", "8446", "--continuous"]).mode(), Mode::Pipeline);
        assert_eq!(cli(&["--only-first"]).mode(), Mode::Continuous);
        assert_eq!(cli(&[]).mode(), Mode::Help);
    }

    #[test]
    fn range_outside_continuous_mode_is_explicit() {
        let range = cli(&["--begin", "8000", "--end", "8003"]);
        assert_eq!(range.mode(), Mode::Pipeline);
        assert_eq!(
            range.targets().unwrap(),
            vec![RfcId::number(8000), RfcId::number(8001), RfcId::number(8002)]
        );

        let window = cli(&["--begin", "8000", "--end", "8010", "--only-first"]);
        assert_eq!(window.mode(), Mode::Continuous);
        assert_eq!(
            window.window(),
            Window {
                begin: Some(8000),
                end: Some(8010),
                only_first: true,
            }
        );
    }

    #[test]
    fn targets_combine_rfcs_and_drafts() {
        let both = cli(&["--rfc", "8446, 9000", "--draft", "draft-ietf-tls-esni-14"]);
        assert_eq!(
            both.targets().unwrap(),
            vec![
                RfcId::number(8446),
                RfcId::number(9000),
                RfcId::draft("draft-ietf-tls-esni-14")
            ]
        );
    }

    #[test]
    fn bad_targets_are_rejected() {
        assert!(cli(&["--rfc", "84x6"]).targets().is_err());
        assert!(cli(&["--draft", "ietf-foo"]).targets().is_err());
        assert!(cli(&["--begin", "10", "--end", "10"]).targets().is_err());
        assert!(cli(&["--make"]).targets().is_err());
    }

    #[tokio::test]
    async fn help_mode_succeeds_without_config() {
        let help = cli(&["--config", "/nonexistent/rfctrans.toml"]);
        assert_eq!(help.mode(), Mode::Help);
        run(help).await.unwrap();
    }

    #[test]
    fn banner_reports_elapsed_time() {
        let banner = completion_banner(Duration::from_millis(1500));
        assert!(banner.contains("Finished in 1.5s"));
    }

    #[test]
    fn txt_and_force_reach_fetch_options() {
        let opts = cli(&["--rfc", "9000", "-f", "--txt"]).fetch_options();
        assert!(opts.force);
        assert!(opts.force_text);
    }
}
