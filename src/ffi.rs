//! C ABI for display, preview and clipboard hosts
//!
//! A host (a desktop preview pane, an editor plugin, a clipboard helper)
//! hands raw export bytes and options across this boundary and receives the
//! finished document plus its fingerprint.
//!
//! # FFI Boundary Contract
//!
//! ## String Representation
//!
//! **All strings are UTF-8 bytes + length, NOT NUL-terminated C strings.**
//!
//! Every string field is a pointer (`*const u8` in, `*mut u8` out) paired
//! with a `_len` byte count. The host must use the length and never
//! `strlen()`. A zero length means "absent"; the pointer may then be NULL.
//!
//! ## Memory Management
//!
//! - Rust allocates every output buffer as a `Box<[u8]>`
//! - The host must call `email_result_free()` exactly once per result
//! - The handle from `email_formatter_new()` is released with
//!   `email_formatter_free()`
//!
//! ```rust
//! use email_html_formatter::ffi::{email_result_free, EmailResult};
//! use std::ptr;
//!
//! let html = String::from("<p>hi</p>");
//! let html_len = html.len();
//! let mut result = EmailResult {
//!     html: Box::into_raw(html.into_bytes().into_boxed_slice()) as *mut u8,
//!     html_len,
//!     fingerprint: ptr::null_mut(),
//!     fingerprint_len: 0,
//!     error_code: 0,
//!     error_message: ptr::null_mut(),
//!     error_len: 0,
//! };
//!
//! unsafe { email_result_free(&mut result) };
//! assert!(result.html.is_null());
//! assert_eq!(result.html_len, 0);
//! ```
//!
//! ## Error Handling Contract
//!
//! - Success: `error_code == 0`, `html` and `fingerprint` set, no message
//! - Error: `error_code != 0`, `error_message` set, `html`/`fingerprint` NULL
//! - Panics are caught with `catch_unwind` and reported as `ERROR_INTERNAL`
//!
//! ## Thread Safety
//!
//! A handle holds no mutable state, but hosts should still give each thread
//! its own handle; concurrent calls on one handle are not part of the
//! contract.

use std::panic;
use std::ptr;
use std::slice;

use crate::error::FormatError;
use crate::fingerprint::Fingerprint;
use crate::options::{FormatOptions, TargetWidth};
use crate::pipeline::EmailFormatter;
use crate::validation::InputValidator;

// ============================================================================
// Error Code Constants
// ============================================================================

/// Success - no error occurred
pub const ERROR_SUCCESS: u32 = 0;

/// Character encoding error (invalid bytes, unsupported charset)
pub const ERROR_ENCODING: u32 = 2;

/// Invalid input (NULL pointers, empty or oversized source)
pub const ERROR_INVALID_INPUT: u32 = 5;

/// Unusable option value
pub const ERROR_INVALID_OPTION: u32 = 6;

/// Internal error (panic caught)
pub const ERROR_INTERNAL: u32 = 99;

// ============================================================================
// FFI Data Structures
// ============================================================================

/// Formatting options passed from the host
///
/// - `responsive`, `wrap_columns`: 0 = off, anything else = on
/// - `target_width`: 600 or 650; 0 selects the default (600)
/// - every other field is an optional UTF-8 string (pointer + length)
///
/// ```c
/// const char *base = "https://cdn.example.com/img";
/// email_options_t options = {
///     .responsive = 1,
///     .wrap_columns = 0,
///     .target_width = 600,
///     .image_base_url = (const uint8_t *)base,
///     .image_base_url_len = strlen(base),
///     /* remaining strings: NULL / 0 */
/// };
/// ```
#[repr(C)]
pub struct EmailOptions {
    /// Fluid tables: 0=no, 1=yes
    pub responsive: u8,
    /// Wrap multi-column rows: 0=no, 1=yes
    pub wrap_columns: u8,
    /// Container width in pixels (0, 600 or 650)
    pub target_width: u32,
    /// Absolute prefix for relative image sources
    pub image_base_url: *const u8,
    pub image_base_url_len: usize,
    /// Hidden inbox preview text
    pub preheader: *const u8,
    pub preheader_len: usize,
    /// Hidden image/text ratio filler
    pub balance_text: *const u8,
    pub balance_text_len: usize,
    pub utm_medium: *const u8,
    pub utm_medium_len: usize,
    pub utm_campaign: *const u8,
    pub utm_campaign_len: usize,
    /// `<title>` of a freshly built document
    pub title: *const u8,
    pub title_len: usize,
    /// Content-Type value used for charset detection
    pub content_type: *const u8,
    pub content_type_len: usize,
}

/// Formatting result returned to the host
///
/// String fields are UTF-8 bytes + length and must be released with
/// `email_result_free()`, never with the C allocator.
#[repr(C)]
pub struct EmailResult {
    /// Formatted document; NULL on error
    pub html: *mut u8,
    pub html_len: usize,
    /// 32 hex characters identifying the document; NULL on error
    pub fingerprint: *mut u8,
    pub fingerprint_len: usize,
    /// 0 on success, see `ERROR_*`
    pub error_code: u32,
    /// Error description; NULL on success
    pub error_message: *mut u8,
    pub error_len: usize,
}

/// Opaque formatter handle
pub struct EmailFormatterHandle {
    validator: InputValidator,
}

struct FormatOutput {
    html: Box<[u8]>,
    fingerprint: Box<[u8]>,
}

fn reset_result(result: &mut EmailResult) {
    result.html = ptr::null_mut();
    result.html_len = 0;
    result.fingerprint = ptr::null_mut();
    result.fingerprint_len = 0;
    result.error_code = ERROR_SUCCESS;
    result.error_message = ptr::null_mut();
    result.error_len = 0;
}

fn set_error_result(result: &mut EmailResult, error_code: u32, error_message: String) {
    let error_bytes = error_message.into_bytes().into_boxed_slice();
    result.error_code = error_code;
    result.error_len = error_bytes.len();
    result.error_message = Box::into_raw(error_bytes) as *mut u8;
}

fn set_success_result(result: &mut EmailResult, output: FormatOutput) {
    result.html_len = output.html.len();
    result.html = Box::into_raw(output.html) as *mut u8;
    result.fingerprint_len = output.fingerprint.len();
    result.fingerprint = Box::into_raw(output.fingerprint) as *mut u8;
    result.error_code = ERROR_SUCCESS;
}

fn required_ref<'a, T>(ptr: *const T, name: &str) -> Result<&'a T, FormatError> {
    if ptr.is_null() {
        return Err(FormatError::InvalidInput(format!("{name} pointer is NULL")));
    }

    // SAFETY: non-NULL, and the caller guarantees it points to a valid,
    // properly aligned value for the duration of the call.
    Ok(unsafe { &*ptr })
}

fn required_bytes<'a>(ptr: *const u8, len: usize, name: &str) -> Result<&'a [u8], FormatError> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(FormatError::InvalidInput(format!("{name} pointer is NULL")));
    }

    // SAFETY: non-NULL, and the caller guarantees `len` readable bytes.
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

fn optional_utf8<'a>(
    ptr: *const u8,
    len: usize,
    field: &'static str,
) -> Result<Option<&'a str>, FormatError> {
    if len == 0 {
        return Ok(None);
    }
    if ptr.is_null() {
        return Err(FormatError::InvalidInput(format!(
            "{field}_len > 0 with NULL {field} pointer"
        )));
    }

    // SAFETY: non-NULL, and the caller guarantees `len` readable bytes.
    let bytes = unsafe { slice::from_raw_parts(ptr, len) };
    std::str::from_utf8(bytes)
        .map(Some)
        .map_err(|e| FormatError::InvalidOption {
            field,
            reason: format!("not valid UTF-8: {e}"),
        })
}

/// Build `FormatOptions` from the C mirror
fn format_options(options: &EmailOptions) -> Result<FormatOptions, FormatError> {
    let target_width = match options.target_width {
        0 => TargetWidth::default(),
        pixels => TargetWidth::from_pixels(pixels).ok_or_else(|| FormatError::InvalidOption {
            field: "target_width",
            reason: format!("{pixels} is not a supported width (600 or 650)"),
        })?,
    };

    let owned = |ptr, len, field| -> Result<Option<String>, FormatError> {
        Ok(optional_utf8(ptr, len, field)?.map(ToOwned::to_owned))
    };

    Ok(FormatOptions {
        image_base_url: owned(options.image_base_url, options.image_base_url_len, "image_base_url")?,
        preheader_text: owned(options.preheader, options.preheader_len, "preheader")?,
        balance_text: owned(options.balance_text, options.balance_text_len, "balance_text")?,
        utm_medium: owned(options.utm_medium, options.utm_medium_len, "utm_medium")?,
        utm_campaign: owned(options.utm_campaign, options.utm_campaign_len, "utm_campaign")?,
        responsive: options.responsive != 0,
        target_width,
        wrap_columns: options.wrap_columns != 0,
        title: owned(options.title, options.title_len, "title")?,
    })
}

fn format_inner(
    handle: &EmailFormatterHandle,
    html: &[u8],
    options: &EmailOptions,
) -> Result<FormatOutput, FormatError> {
    let content_type = optional_utf8(options.content_type, options.content_type_len, "content_type")?;
    let formatter = EmailFormatter::new(format_options(options)?).with_validator(handle.validator.clone());

    let formatted = formatter.format_bytes(html, content_type)?;
    let fingerprint = Fingerprint::of(&formatted);

    Ok(FormatOutput {
        html: formatted.into_bytes().into_boxed_slice(),
        fingerprint: fingerprint.to_string().into_bytes().into_boxed_slice(),
    })
}

fn free_buffer(ptr_field: &mut *mut u8, len_field: &mut usize) {
    if (*ptr_field).is_null() {
        return;
    }

    let raw = ptr::slice_from_raw_parts_mut(*ptr_field, *len_field);
    // SAFETY: `raw` was allocated as a `Box<[u8]>` and leaked with `Box::into_raw`.
    let _ = unsafe { Box::from_raw(raw) };
    *ptr_field = ptr::null_mut();
    *len_field = 0;
}

// ============================================================================
// FFI Functions
// ============================================================================

/// Create a formatter handle
///
/// Returns NULL if initialisation panicked. Release with
/// `email_formatter_free()`.
#[unsafe(no_mangle)]
pub extern "C" fn email_formatter_new() -> *mut EmailFormatterHandle {
    let result = panic::catch_unwind(|| {
        Box::into_raw(Box::new(EmailFormatterHandle {
            validator: InputValidator::new(),
        }))
    });

    result.unwrap_or(ptr::null_mut())
}

/// Format `html_len` bytes at `html` into `result`
///
/// `result` is always reset first. On success it holds the document and its
/// fingerprint; on failure an error code and message. Either way the host
/// must call `email_result_free()` afterwards.
///
/// ```c
/// email_result_t result;
/// email_format(formatter, html, html_len, &options, &result);
/// if (result.error_code == 0) {
///     show_preview(result.html, result.html_len);
/// } else {
///     report(result.error_code, result.error_message, result.error_len);
/// }
/// email_result_free(&result);
/// ```
///
/// # Safety
///
/// - `result` may be NULL, in which case nothing happens
/// - `handle`, `options` must be NULL or valid; NULL yields `ERROR_INVALID_INPUT`
/// - `html` must point to `html_len` readable bytes (NULL only with length 0)
/// - string fields of `options` follow the same pointer + length rule
#[unsafe(no_mangle)]
pub unsafe extern "C" fn email_format(
    handle: *mut EmailFormatterHandle,
    html: *const u8,
    html_len: usize,
    options: *const EmailOptions,
    result: *mut EmailResult,
) {
    if result.is_null() {
        return;
    }

    // SAFETY: `result` was validated as non-NULL above.
    let result_ref = unsafe { &mut *result };
    reset_result(result_ref);

    let outcome = panic::catch_unwind(|| -> Result<FormatOutput, FormatError> {
        let handle_ref = required_ref(handle.cast_const(), "Formatter handle")?;
        let options_ref = required_ref(options, "Options")?;
        let html_slice = required_bytes(html, html_len, "HTML")?;
        format_inner(handle_ref, html_slice, options_ref)
    });

    match outcome {
        Ok(Ok(output)) => set_success_result(result_ref, output),
        Ok(Err(e)) => set_error_result(result_ref, e.code(), e.to_string()),
        Err(_) => set_error_result(
            result_ref,
            ERROR_INTERNAL,
            "Internal panic during formatting".to_string(),
        ),
    }
}

/// Release every buffer held by `result`
///
/// Idempotent: freed fields are reset to NULL/0, so a second call is a no-op.
///
/// # Safety
///
/// `result` must be NULL or point to a result populated by `email_format()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn email_result_free(result: *mut EmailResult) {
    if result.is_null() {
        return;
    }

    // SAFETY: `result` was validated as non-NULL above.
    let result_ref = unsafe { &mut *result };
    free_buffer(&mut result_ref.html, &mut result_ref.html_len);
    free_buffer(&mut result_ref.fingerprint, &mut result_ref.fingerprint_len);
    free_buffer(&mut result_ref.error_message, &mut result_ref.error_len);
    result_ref.error_code = ERROR_SUCCESS;
}

/// Destroy a formatter handle
///
/// # Safety
///
/// `handle` must be NULL or come from `email_formatter_new()` and not have
/// been freed already.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn email_formatter_free(handle: *mut EmailFormatterHandle) {
    if handle.is_null() {
        return;
    }

    // SAFETY: non-NULL and created by `Box::into_raw` in `email_formatter_new`.
    unsafe { drop(Box::from_raw(handle)) };
}
