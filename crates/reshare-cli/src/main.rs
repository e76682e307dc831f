use std::io::Read;
use std::path::PathBuf;

use chrono_tz::Tz;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use reshare_renderer::time::{parse_zone, system_zone};
use reshare_renderer::{CacheKey, ExportOptions, ExportWriter, HttpFetcher, load_export};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Reshare - render a post export into markdown documents", long_about = None)]
struct Cli {
    /// Export document (JSON array of posts). Reads stdin when omitted or `-`
    input: Option<PathBuf>,

    /// Directory for rendered documents
    #[arg(long, short, env = "RESHARE_OUT", default_value = "rendered")]
    out: PathBuf,

    /// Directory for cached images
    #[arg(long, env = "RESHARE_IMAGES", default_value = "img")]
    images: PathBuf,

    /// Zone to display timestamps in (e.g. Europe/Berlin). Defaults to TZ, then the system zone
    #[arg(long, env = "RESHARE_TIMEZONE", value_parser = zone_arg)]
    timezone: Option<Tz>,

    /// How cached image files are named: `path-segment` or `url-hash`
    #[arg(long, env = "RESHARE_CACHE_KEY", default_value = "path-segment")]
    cache_key: CacheKey,

    /// Report posts that fail to render and continue with the rest
    #[arg(long, env = "RESHARE_KEEP_GOING")]
    keep_going: bool,
}

fn zone_arg(name: &str) -> Result<Tz, String> {
    parse_zone(name).ok_or_else(|| format!("unknown time zone {name:?}"))
}

fn main() -> Result<()> {
    init_miette();
    init_tracing();

    let cli = Cli::parse();

    let (name, text) = read_input(cli.input.as_ref())?;
    let posts = load_export(name, &text)?;
    tracing::debug!(posts = posts.len(), "loaded export");

    let options = ExportOptions {
        output_dir: cli.out,
        image_dir: cli.images,
        zone: cli.timezone.unwrap_or_else(system_zone),
        cache_key: cli.cache_key,
        keep_going: cli.keep_going,
    };
    let dest = options.output_dir.clone();

    let fetcher = HttpFetcher::new().into_diagnostic()?;
    let writer = ExportWriter::new(options, fetcher)?;

    println!("→ Rendering {} posts...", posts.len());
    let start = std::time::Instant::now();
    let summary = writer.run(&posts)?;
    let elapsed = start.elapsed();

    println!(
        "✓ Rendered {} posts in {:.2}s ({} images fetched, {} already cached)",
        summary.written.len(),
        elapsed.as_secs_f64(),
        summary.images.fetched,
        summary.images.reused
    );
    println!("✓ Output: {}", dest.display());

    summary.check()?;
    Ok(())
}

fn read_input(input: Option<&PathBuf>) -> Result<(String, String)> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            let text = std::fs::read_to_string(path).into_diagnostic()?;
            Ok((path.display().to_string(), text))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .into_diagnostic()?;
            Ok(("<stdin>".to_owned(), text))
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["reshare", "export.json"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("export.json")));
        assert_eq!(cli.out, PathBuf::from("rendered"));
        assert_eq!(cli.images, PathBuf::from("img"));
        assert_eq!(cli.cache_key, CacheKey::PathSegment);
        assert!(!cli.keep_going);
    }

    #[test]
    fn options() {
        let cli = Cli::try_parse_from([
            "reshare",
            "--out",
            "site/posts",
            "--images",
            "site/img",
            "--timezone",
            "Asia/Tokyo",
            "--cache-key",
            "url-hash",
            "--keep-going",
        ])
        .unwrap();
        assert_eq!(cli.input, None);
        assert_eq!(cli.timezone, Some(Tz::Asia__Tokyo));
        assert_eq!(cli.cache_key, CacheKey::UrlHash);
        assert!(cli.keep_going);
    }

    #[test]
    fn rejects_unknown_zone_and_key() {
        assert!(Cli::try_parse_from(["reshare", "--timezone", "Mars/Olympus"]).is_err());
        assert!(Cli::try_parse_from(["reshare", "--cache-key", "md5"]).is_err());
    }
}
