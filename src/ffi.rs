//! FFI bindings for the PlayWell engine
//!
//! This module provides C-compatible functions for calling the engine from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `playwell_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::history::DEFAULT_HISTORY_WINDOW;
use crate::pipeline::{recommendations_json, score_session_json, SessionProcessor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Reduce one session's observation JSON to a metrics outcome JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `playwell_free_string`.
/// - Returns NULL on error; call `playwell_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn playwell_score_session(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match score_session_json(&json_str) {
        Ok(outcome) => string_to_cstr(&outcome),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Derive recommendations for a classification JSON and return a JSON array.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `playwell_free_string`.
/// - Returns NULL on error; call `playwell_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn playwell_recommendations(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match recommendations_json(&json_str) {
        Ok(list) => string_to_cstr(&list),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a SessionProcessor
pub struct PlaywellProcessorHandle {
    processor: SessionProcessor,
}

/// Create a new SessionProcessor with the specified history window size.
///
/// # Safety
/// - Returns a pointer to a newly allocated SessionProcessor.
/// - Must be freed with `playwell_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn playwell_processor_new(
    history_window_sessions: i32,
) -> *mut PlaywellProcessorHandle {
    clear_last_error();

    let window_sessions = if history_window_sessions <= 0 {
        DEFAULT_HISTORY_WINDOW
    } else {
        history_window_sessions as usize
    };

    let processor = SessionProcessor::with_history_window(window_sessions);
    let handle = Box::new(PlaywellProcessorHandle { processor });
    Box::into_raw(handle)
}

/// Free a SessionProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `playwell_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn playwell_processor_free(processor: *mut PlaywellProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Reduce observation JSON with a stateful processor, folding ready metrics
/// into its history window.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `playwell_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `playwell_free_string`.
/// - Returns NULL on error; call `playwell_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn playwell_processor_process(
    processor: *mut PlaywellProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.processor.process(&json_str) {
        Ok(outcome) => string_to_cstr(&outcome),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Save processor history to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `playwell_processor_new`.
/// - Returns a newly allocated string that must be freed with `playwell_free_string`.
/// - Returns NULL on error; call `playwell_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn playwell_processor_save_history(
    processor: *mut PlaywellProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.save_history() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load processor history from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `playwell_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `playwell_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn playwell_processor_load_history(
    processor: *mut PlaywellProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_history(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by engine functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an engine function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn playwell_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next engine function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn playwell_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the engine library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn playwell_version() -> *const c_char {
    // Use a static CString to avoid allocation
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_reaction_json() -> CString {
        CString::new(
            r#"{
            "gameType": "Reaction Test",
            "raw_events": [
                {"trial": 0, "latency_ms": 300},
                {"trial": 1, "latency_ms": 250},
                {"trial": 2, "latency_ms": 900}
            ],
            "false_starts": 1
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_score_session() {
        let json = sample_reaction_json();

        unsafe {
            let result = playwell_score_session(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains(r#""status":"ready""#));
            assert!(result_str.contains(r#""reaction_avg":138"#));

            playwell_free_string(result);
        }
    }

    #[test]
    fn test_ffi_recommendations() {
        let json = CString::new(r#"{"stress_level": "high", "cognitive_score": 85}"#).unwrap();

        unsafe {
            let result = playwell_recommendations(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.starts_with('['));
            assert!(result_str.contains("mentally fatigued"));

            playwell_free_string(result);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            // Create processor
            let processor = playwell_processor_new(3);
            assert!(!processor.is_null());

            // Process a session
            let json = sample_reaction_json();
            let result = playwell_processor_process(processor, json.as_ptr());
            assert!(!result.is_null());
            playwell_free_string(result);

            // Save history
            let history = playwell_processor_save_history(processor);
            assert!(!history.is_null());

            // Load history into a new processor
            let processor2 = playwell_processor_new(3);
            let load_result = playwell_processor_load_history(processor2, history);
            assert_eq!(load_result, 0);

            playwell_free_string(history);
            playwell_processor_free(processor);
            playwell_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();

            let result = playwell_score_session(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = playwell_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_null_pointers() {
        unsafe {
            assert!(playwell_score_session(ptr::null()).is_null());
            assert!(playwell_processor_process(ptr::null_mut(), ptr::null()).is_null());
            // Free of NULL is a no-op
            playwell_free_string(ptr::null_mut());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = playwell_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
