#![no_main]

use email_html_formatter::ffi::{
    EmailOptions, EmailResult, email_format, email_formatter_free, email_formatter_new,
    email_result_free,
};
use libfuzzer_sys::fuzz_target;
use std::ptr;

fuzz_target!(|data: &[u8]| {
    let handle = email_formatter_new();
    if handle.is_null() {
        return;
    }

    let options = EmailOptions {
        responsive: data.first().copied().unwrap_or(0) & 1,
        wrap_columns: 0,
        target_width: 0,
        image_base_url: ptr::null(),
        image_base_url_len: 0,
        preheader: ptr::null(),
        preheader_len: 0,
        balance_text: ptr::null(),
        balance_text_len: 0,
        utm_medium: ptr::null(),
        utm_medium_len: 0,
        utm_campaign: ptr::null(),
        utm_campaign_len: 0,
        title: ptr::null(),
        title_len: 0,
        content_type: ptr::null(),
        content_type_len: 0,
    };
    let mut result = EmailResult {
        html: ptr::null_mut(),
        html_len: 0,
        fingerprint: ptr::null_mut(),
        fingerprint_len: 0,
        error_code: 0,
        error_message: ptr::null_mut(),
        error_len: 0,
    };

    unsafe {
        email_format(handle, data.as_ptr(), data.len(), &options, &mut result);
        assert!(result.html.is_null() || result.error_code == 0);
        email_result_free(&mut result);
        email_result_free(&mut result);
        email_formatter_free(handle);
    }
});
