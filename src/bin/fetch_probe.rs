//! One-shot source diagnostic: fetch a single page at a given offset and
//! print it, using the same config and client the dashboard runs with.
//!
//! Usage: fetch_probe [offset] [limit]

use anyhow::{Context, Result};
use serde_json::json;

use fraudmon::source::SourceKind;
use fraudmon::state::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let offset: u64 = args
        .next()
        .unwrap_or_else(|| "0".to_string())
        .parse()
        .context("offset must be a non-negative integer")?;
    let limit: u32 = args
        .next()
        .unwrap_or_else(|| "20".to_string())
        .parse()
        .context("limit must be a positive integer")?;

    let cfg = Config::from_env()?;
    let kind = SourceKind::from_env();
    let source = kind.build(&cfg)?;

    match source.fetch(offset, limit).await {
        Ok(page) => {
            println!(
                "{}",
                json!({
                    "source": kind.as_str(),
                    "offset": page.offset,
                    "count": page.len(),
                    "records": page.records,
                })
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("fetch failed ({}): {}", err.kind(), err);
            std::process::exit(1);
        }
    }
}
