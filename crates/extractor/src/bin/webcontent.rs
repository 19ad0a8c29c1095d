// ABOUTME: CLI binary for the webcontent extractor.
// ABOUTME: Fetches URLs (or reads an HTML file) and prints markdown or JSON results.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use webcontent_extractor::{
    parse_url_list, render_batch, Client, ExtractionResult, FetchRequest, Strategy,
};

#[derive(Parser, Debug)]
#[command(name = "webcontent")]
#[command(about = "Fetch web pages and extract clean markdown content")]
struct Args {
    /// URLs to fetch
    #[arg()]
    urls: Vec<String>,

    /// Comma-separated list of URLs to fetch
    #[arg(long = "urls")]
    url_list: Option<String>,

    /// HTML file to extract (requires --url)
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// URL context for HTML file extraction (required with --html)
    #[arg(long = "url")]
    url: Option<String>,

    /// Extraction method: auto, trafilatura, readability or basic
    #[arg(short = 's', long = "strategy", default_value = "auto")]
    strategy: String,

    /// Reduce links to their text and omit the link list
    #[arg(long = "no-links")]
    no_links: bool,

    /// Omit title, author and date
    #[arg(long = "no-metadata")]
    no_metadata: bool,

    /// Output results as JSON
    #[arg(long = "json")]
    json_output: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    timeout: u64,

    /// Per-URL deadline in seconds for fetch plus extraction
    #[arg(long = "deadline", default_value_t = 45)]
    deadline: u64,

    /// How many URLs to work on at once
    #[arg(long = "concurrency", default_value_t = 4)]
    concurrency: usize,

    /// Largest response body accepted, in bytes
    #[arg(long = "max-content-length", default_value_t = 1_000_000)]
    max_content_length: usize,

    /// User-Agent header to send
    #[arg(long = "user-agent")]
    user_agent: Option<String>,

    /// Allow fetching from private/local networks
    #[arg(long = "allow-private-networks")]
    allow_private_networks: bool,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_requests(
    urls: &[String],
    strategy: Strategy,
    include_links: bool,
    include_metadata: bool,
) -> Result<Vec<FetchRequest>, String> {
    urls.iter()
        .map(|url| {
            FetchRequest::new(url)
                .map(|r| {
                    r.with_strategy(strategy)
                        .with_links(include_links)
                        .with_metadata(include_metadata)
                })
                .map_err(|e| e.to_string())
        })
        .collect()
}

fn format_output(results: &[ExtractionResult], json_output: bool, show_metadata: bool) -> String {
    if !json_output {
        return render_batch(results, show_metadata);
    }
    let json = if results.len() == 1 {
        serde_json::to_string_pretty(&results[0])
    } else {
        serde_json::to_string_pretty(results)
    };
    json.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    let strategy: Strategy = match args.strategy.parse() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let mut urls = args.urls.clone();
    if let Some(list) = &args.url_list {
        urls.extend(parse_url_list(list));
    }

    if args.html.is_some() && args.url.is_none() {
        eprintln!("error: --url is required when using --html");
        return ExitCode::from(1);
    }
    if args.html.is_none() && urls.is_empty() {
        eprintln!("error: at least one URL is required, or use --html with --url");
        return ExitCode::from(1);
    }
    if args.html.is_some() && !urls.is_empty() {
        eprintln!("error: cannot use both --html and URLs to fetch");
        return ExitCode::from(1);
    }

    let mut builder = Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .deadline(Duration::from_secs(args.deadline))
        .concurrency(args.concurrency)
        .max_content_length(args.max_content_length)
        .allow_private_networks(args.allow_private_networks);
    if let Some(ua) = &args.user_agent {
        builder = builder.user_agent(ua);
    }
    let client = builder.build();

    let include_links = !args.no_links;
    let include_metadata = !args.no_metadata;
    let start = Instant::now();
    let mut had_error = false;

    let results = if let (Some(html_path), Some(url)) = (&args.html, &args.url) {
        let requests = match build_requests(
            std::slice::from_ref(url),
            strategy,
            include_links,
            include_metadata,
        ) {
            Ok(requests) => requests,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
        };
        match fs::read_to_string(html_path) {
            Ok(html) => requests
                .iter()
                .map(|request| client.extract_html(request, &html))
                .collect(),
            Err(e) => {
                eprintln!("error reading file {:?}: {}", html_path, e);
                return ExitCode::from(1);
            }
        }
    } else {
        match build_requests(&urls, strategy, include_links, include_metadata) {
            Ok(requests) => client.fetch_multiple(&requests).await,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
        }
    };

    let elapsed = start.elapsed();

    for failed in results.iter().filter(|r| !r.succeeded) {
        eprintln!(
            "error extracting {}: {}",
            failed.url,
            failed.failure_reason.as_deref().unwrap_or("unknown error")
        );
        had_error = true;
    }

    let output_str = format_output(&results, args.json_output, include_metadata);
    if let Some(output_path) = &args.output {
        if let Err(e) = fs::write(output_path, &output_str) {
            eprintln!("error writing to {:?}: {}", output_path, e);
            had_error = true;
        }
    } else {
        println!("{}", output_str);
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
