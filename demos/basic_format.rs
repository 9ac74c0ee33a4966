//! Basic formatting examples for the email HTML formatter

use email_html_formatter::{EmailFormatter, FormatOptions, TargetWidth, format};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Email HTML Formatter - Basic Examples ===\n");

    // Example 1: Sliced export with a CDN base URL
    example_1();

    // Example 2: Responsive layout with preheader and UTM tags
    example_2();

    // Example 3: Mixed single/multi-column rows
    example_3();

    // Example 4: Step-by-step view of the pipeline
    example_4();
}

fn show(title: &str, source: &str, options: &FormatOptions) {
    println!("{title}");
    println!("Input HTML:");
    println!("{source}\n");

    match format(source, options) {
        Ok(html) => {
            println!("Output HTML:");
            println!("{html}");
        }
        Err(e) => println!("Error (code {}): {e}", e.code()),
    }
    println!("---\n");
}

fn example_1() {
    let source = r#"<table height="800"><tr><td><img src="slice_01.png"></td></tr><tr><td><img src="slice_02.png"></td></tr></table>"#;
    let options = FormatOptions::default()
        .with_image_base_url("https://cdn.example.com/newsletters/2024-05")
        .with_target_width(TargetWidth::W650);
    show("Example 1: Sliced export", source, &options);
}

fn example_2() {
    let source = r#"<table><tr><td style="background-color:#f4f4f4"><a href="https://shop.example.com/sale?ref=hero"><img src="hero.jpg"></a></td></tr><tr><td><a href="mailto:help@example.com">Contact us</a></td></tr></table>"#;
    let options = FormatOptions::default()
        .responsive(true)
        .with_preheader("Up to 40% off this weekend only")
        .with_utm("email", "may-sale")
        .with_title("May Sale");
    show("Example 2: Responsive with tracking", source, &options);
}

fn example_3() {
    let source = "<table><tr><td>Header</td></tr><tr><td>Left</td><td>Right</td></tr></table>";
    let options = FormatOptions::default().wrap_columns(true);
    show("Example 3: Column wrapping", source, &options);
}

fn example_4() {
    println!("Example 4: Pipeline steps");
    let formatter = EmailFormatter::new(FormatOptions::default().with_preheader("Hello"));
    for (i, step) in formatter.steps().enumerate() {
        println!("  {:>2}. {}", i + 1, step.name());
    }
    println!("---\n");
}
