#![no_main]

use email_html_formatter::{FormatOptions, format_bytes};
use libfuzzer_sys::fuzz_target;

// The pipeline must never panic, whatever bytes it is given; the flags byte
// selects the option combination.
fuzz_target!(|data: &[u8]| {
    let Some((&flags, html)) = data.split_first() else {
        return;
    };

    let mut options = FormatOptions::default()
        .responsive(flags & 1 != 0)
        .wrap_columns(flags & 2 != 0);
    if flags & 4 != 0 {
        options = options.with_utm("email", "fuzz");
    }
    if flags & 8 != 0 {
        options = options
            .with_preheader("Preheader")
            .with_balance_text("Balance");
    }
    if flags & 16 != 0 {
        options = options.with_image_base_url("https://cdn.example.com/img");
    }

    let _ = format_bytes(html, None, &options);
});
