use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use visual_search_lib::services::{
    read_clipboard_items, BucketKind, CameraSessionManager, ImagePayload, MediaEvent, NoCamera,
    PresentationSurface, SearchClient, SearchConfigService, SearchOutcome, SearchPipeline,
};
use visual_search_lib::telemetry::init_tracing;
use visual_search_lib::utils::read_source_file;
use visual_search_lib::{AppResult, ResultsView};

const USAGE: &str = "usage: visual-search <image> | --drop <image>... | --paste | --camera";

#[derive(Debug, PartialEq)]
enum Command {
    Browse(PathBuf),
    Drop(Vec<PathBuf>),
    Paste,
    Camera,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let first = args.next().ok_or_else(|| USAGE.to_string())?;
    match first.as_str() {
        "--paste" => Ok(Command::Paste),
        "--camera" => Ok(Command::Camera),
        "--drop" => {
            let paths: Vec<PathBuf> = args.map(PathBuf::from).collect();
            if paths.is_empty() {
                return Err(USAGE.to_string());
            }
            Ok(Command::Drop(paths))
        }
        "-h" | "--help" => Err(USAGE.to_string()),
        path => Ok(Command::Browse(PathBuf::from(path))),
    }
}

/// 终端展示：按三个分组打印结果
struct ConsoleSurface;

impl PresentationSurface for ConsoleSurface {
    fn show_preview(&self, payload: &ImagePayload) {
        println!(
            "Searching {} ({}, {} bytes, {:?})",
            payload.file_name(),
            payload.media_type(),
            payload.len(),
            payload.origin()
        );
    }

    fn show_results(&self, view: &ResultsView) {
        let buckets = match view {
            ResultsView::NoResults => {
                println!("No matching products found");
                return;
            }
            ResultsView::Matches { buckets, .. } => buckets,
        };

        for (kind, title) in [
            (BucketKind::Primary, "Search Results"),
            (BucketKind::Similar, "Similar Products"),
            (BucketKind::Recommended, "Recommended"),
        ] {
            let bucket = buckets.bucket(kind);
            println!("\n{} ({})", title, bucket.len());
            for result in bucket {
                let category = result.display_category().unwrap_or_default();
                match result.score {
                    Some(score) => println!("  {}  {}  {:.1}%", result.url, category, score * 100.0),
                    None => println!("  {}  {}", result.url, category),
                }
            }
        }
    }
}

async fn run(command: Command) -> AppResult<()> {
    let config = SearchConfigService::from_default_dir()?.load()?;
    let client = SearchClient::new(&config.service)?;
    tracing::debug!(endpoint = client.endpoint(), "Search client ready");

    let camera = CameraSessionManager::new(NoCamera, &config.camera);
    let pipeline = SearchPipeline::new(
        client,
        camera,
        Arc::new(ConsoleSurface),
        config.result_count,
    );

    let outcome = match command {
        Command::Browse(path) => {
            let file = read_source_file(path)?;
            pipeline.acquire(MediaEvent::Browsed(file)).await?
        }
        Command::Drop(paths) => {
            let files = paths
                .iter()
                .map(read_source_file)
                .collect::<AppResult<Vec<_>>>()?;
            pipeline.acquire(MediaEvent::Dropped(files)).await?
        }
        Command::Paste => {
            let items = read_clipboard_items()?;
            pipeline.acquire(MediaEvent::Pasted(items)).await?
        }
        Command::Camera => {
            pipeline.open_camera().await?;
            pipeline.capture().await?
        }
    };

    if outcome == SearchOutcome::Ignored {
        println!("Nothing to search: no image found");
    }

    pipeline.clear().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing("info");

    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(usage) => {
            eprintln!("{}", usage);
            return ExitCode::FAILURE;
        }
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
