//! Format an HTML file from disk
//!
//! Usage: cargo run --example format_file -- <INPUT> [OPTIONS]
//!
//! Options:
//!   --base-url <URL>        image base URL
//!   --preheader <TEXT>      hidden inbox preview text
//!   --balance <TEXT>        hidden balance text
//!   --utm <MEDIUM> <NAME>   UTM medium and campaign
//!   --width <600|650>       target width
//!   --title <TEXT>          document title
//!   --charset <LABEL>       source charset (defaults to detection)
//!   --responsive            fluid tables
//!   --wrap-columns          wrap multi-column rows
//!   --out <PATH>            write the result here instead of stdout
//!
//! Set `RUST_LOG=debug` to see each pipeline step.

use email_html_formatter::{EmailFormatter, Fingerprint, FormatOptions, TargetWidth};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut charset: Option<String> = None;
    let mut options = FormatOptions::default();

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--base-url" => options = options.with_image_base_url(value("--base-url")?),
            "--preheader" => options = options.with_preheader(value("--preheader")?),
            "--balance" => options = options.with_balance_text(value("--balance")?),
            "--utm" => {
                let medium = value("--utm")?;
                let campaign = value("--utm")?;
                options = options.with_utm(medium, campaign);
            }
            "--width" => {
                let pixels: u32 = value("--width")?.parse()?;
                let width = TargetWidth::from_pixels(pixels)
                    .ok_or_else(|| format!("unsupported width {pixels}"))?;
                options = options.with_target_width(width);
            }
            "--title" => options = options.with_title(value("--title")?),
            "--charset" => charset = Some(format!("text/html; charset={}", value("--charset")?)),
            "--responsive" => options = options.responsive(true),
            "--wrap-columns" => options = options.wrap_columns(true),
            "--out" => output = Some(PathBuf::from(value("--out")?)),
            other if input.is_none() && !other.starts_with("--") => input = Some(PathBuf::from(other)),
            other => return Err(format!("unexpected argument '{other}'").into()),
        }
    }

    let input = input.ok_or("usage: format_file <INPUT> [OPTIONS]")?;
    let bytes = std::fs::read(&input)?;
    log::info!("formatting {} ({} bytes)", input.display(), bytes.len());

    let formatter = EmailFormatter::new(options);
    let html = formatter.format_bytes(&bytes, charset.as_deref())?;
    log::info!("fingerprint {}", Fingerprint::of(&html));

    match output {
        Some(path) => {
            std::fs::write(&path, &html)?;
            log::info!("wrote {} bytes to {}", html.len(), path.display());
        }
        None => println!("{html}"),
    }

    Ok(())
}
