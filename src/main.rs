use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use photo_diary::chat::ChatClient;
use photo_diary::config::ChatConfig;
use photo_diary::translate::Translator;
use photo_diary::{caption, diary, report, stats, utils, BertScorer, Corpus};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "photo-diary",
    version,
    about = "Photo diary generation and caption evaluation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full evaluation: judgment report, then BERTScore
    Run(RunArgs),
    /// Compute BERTScore statistics for the caption/keyword corpus
    Score(ScoreArgs),
    /// Generate the qualitative judgment HTML table
    Report(ReportArgs),
    /// Caption images via the vision chat model
    Caption(CaptionArgs),
    /// Write a diary entry from a photo manifest
    Diary(DiaryArgs),
}

#[derive(Args, Clone)]
struct LayoutArgs {
    /// Project base directory (expects data/ and output/ underneath)
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,
    /// Directory containing the corpus file (default: <base-dir>/data)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Directory for generated artifacts (default: <base-dir>/output)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Corpus file name inside the data directory
    #[arg(long, default_value = "keyword.txt")]
    input_name: String,
}

impl LayoutArgs {
    fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("data"))
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("output"))
    }

    fn corpus_path(&self) -> PathBuf {
        self.data_dir().join(&self.input_name)
    }

    fn img_dir(&self) -> PathBuf {
        self.data_dir().join("all_imgs")
    }
}

#[derive(Args, Clone)]
struct ChatArgs {
    /// API key for the chat-completions endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Base URL of the chat-completions API
    #[arg(long, default_value = "https://api.openai.com/v1")]
    api_base: String,
    /// Chat model name
    #[arg(long, default_value = "gpt-4o-mini")]
    chat_model: String,
}

impl ChatArgs {
    fn client(&self) -> Result<ChatClient> {
        let Some(api_key) = self.api_key.clone() else {
            bail!("no API key given (set OPENAI_API_KEY or pass --api-key)");
        };
        let config = ChatConfig {
            base_url: self.api_base.clone(),
            api_key,
            model: self.chat_model.clone(),
            ..ChatConfig::default()
        };
        Ok(ChatClient::new(config)?)
    }
}

#[derive(Args)]
struct ScoreArgs {
    #[command(flatten)]
    layout: LayoutArgs,
    /// Output CSV file name inside the output directory
    #[arg(long, default_value = "bert_score_results.csv")]
    output_name: String,
    /// Directory with model.onnx, tokenizer.json, and scorer_config.json
    #[arg(long)]
    model_dir: Option<PathBuf>,
    /// Model ID resolved under the local cache when --model-dir is not given
    #[arg(long, default_value = "klue-bert-base")]
    model_id: String,
    /// Translate captions into this language before scoring
    #[arg(long)]
    translate: Option<String>,
    #[command(flatten)]
    chat: ChatArgs,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    layout: LayoutArgs,
    /// Output HTML file name inside the output directory
    #[arg(long, default_value = "image_keywords.html")]
    output_name: String,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    score: ScoreArgs,
}

#[derive(Args)]
struct CaptionArgs {
    /// Image files to caption, in order
    #[arg(required = true)]
    images: Vec<PathBuf>,
    #[command(flatten)]
    chat: ChatArgs,
}

#[derive(Args)]
struct DiaryArgs {
    /// JSON manifest listing the photos and their context
    #[arg(long)]
    manifest: PathBuf,
    /// Caption photos with an empty caption before writing the diary
    #[arg(long)]
    auto_caption: bool,
    #[command(flatten)]
    chat: ChatArgs,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Run(args) => run_all(&args),
        Commands::Score(args) => run_score(&args),
        Commands::Report(args) => run_report(&args),
        Commands::Caption(args) => run_caption(&args),
        Commands::Diary(args) => run_diary(&args),
    }
}

fn run_all(args: &RunArgs) -> Result<()> {
    println!("=== Evaluation started ===\n");

    println!("1. Generating qualitative judgment report...");
    run_report(&ReportArgs {
        layout: args.score.layout.clone(),
        output_name: "image_keywords.html".to_string(),
    })?;

    println!("\n2. Computing BERTScore evaluation...");
    run_score(&args.score)?;

    println!("\n=== Evaluation finished ===");
    println!(
        "Artifacts are in {}",
        args.score.layout.output_dir().display()
    );
    Ok(())
}

fn run_score(args: &ScoreArgs) -> Result<()> {
    let mut corpus = Corpus::load(&args.layout.corpus_path())?;
    info!(
        records = corpus.len(),
        skipped = corpus.skipped,
        "loaded corpus"
    );

    if let Some(lang) = &args.translate {
        let client = args.chat.client()?;
        let translator = Translator::new(&client, lang.clone());
        let originals: Vec<String> = corpus.captions().iter().map(ToString::to_string).collect();
        let translated = translator.translate_all(&originals);
        corpus.apply_translations(translated)?;
    }

    let model_dir = args
        .model_dir
        .clone()
        .unwrap_or_else(|| utils::default_model_dir(&args.model_id));
    let mut scorer = BertScorer::new(&model_dir)?;

    println!("Computing BERTScore...");
    let scores = scorer.score(&corpus.scoring_captions(), &corpus.keywords())?;
    let summary = stats::summarize(&corpus, &scores)?;

    println!("\n=== BERTScore evaluation ===");
    println!("Mean precision: {:.4}", summary.mean_precision);
    println!("Mean recall:    {:.4}", summary.mean_recall);
    println!("Mean F1:        {:.4}", summary.mean_f1);
    println!("\n=== Comparison with human judgments ===");
    println!("Mean F1 for 'O' records: {:.4}", summary.mean_f1_match);
    println!("Mean F1 for 'X' records: {:.4}", summary.mean_f1_no_match);

    let output_dir = args.layout.output_dir();
    std::fs::create_dir_all(&output_dir)?;
    let output_path = output_dir.join(&args.output_name);
    report::write_csv(&output_path, &corpus, &scores)?;
    println!("\nResults saved to {}", output_path.display());
    Ok(())
}

fn run_report(args: &ReportArgs) -> Result<()> {
    let corpus = Corpus::load(&args.layout.corpus_path())?;
    let output_dir = args.layout.output_dir();
    std::fs::create_dir_all(&output_dir)?;

    let output_path = output_dir.join(&args.output_name);
    let stats = report::write_html(&output_path, &args.layout.img_dir(), &corpus)?;

    println!("Total images: {}", stats.total);
    println!(
        "Judged similar (O): {} ({:.1}%)",
        stats.matches,
        stats.percent_match()
    );
    println!(
        "Judged not similar (X): {} ({:.1}%)",
        stats.no_matches,
        100.0 - stats.percent_match()
    );
    println!("Report saved to {}", output_path.display());
    Ok(())
}

fn run_caption(args: &CaptionArgs) -> Result<()> {
    let client = args.chat.client()?;
    let captions = caption::caption_images(&client, &args.images)?;
    for (path, caption) in args.images.iter().zip(captions) {
        println!("{} : {}", path.display(), caption);
    }
    Ok(())
}

fn run_diary(args: &DiaryArgs) -> Result<()> {
    let mut manifest = diary::DiaryManifest::from_file(&args.manifest)?;
    let client = args.chat.client()?;

    if args.auto_caption {
        let base = args.manifest.parent().unwrap_or_else(|| Path::new("."));
        let missing: Vec<usize> = manifest
            .photos
            .iter()
            .enumerate()
            .filter(|(_, photo)| photo.caption.is_empty())
            .map(|(i, _)| i)
            .collect();
        if !missing.is_empty() {
            let paths: Vec<PathBuf> = missing
                .iter()
                .map(|&i| base.join(&manifest.photos[i].image))
                .collect();
            let captions = caption::caption_images(&client, &paths)?;
            for (i, generated) in missing.into_iter().zip(captions) {
                manifest.photos[i].caption = generated;
            }
        }
    }

    let entry = diary::write_diary(&client, &manifest)?;
    println!("{entry}");
    Ok(())
}
