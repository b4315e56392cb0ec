//! FFI bindings for Health Stats
//!
//! This module provides C-compatible functions for calling Health Stats from
//! mobile hosts. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `hstats_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, Utc};

use crate::config::StatsConfig;
use crate::entry::RecordDraft;
use crate::error::StatsError;
use crate::pipeline::{documents_to_report_json, StatsProcessor};
use crate::schema::RecordAdapter;
use crate::store::InMemoryStore;
use crate::types::HealthRecord;
use crate::window::Period;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

/// Map a Rust result onto the C convention: allocated string or NULL + last error
fn finish(result: Result<String, StatsError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Optional RFC 3339 timestamp; NULL means "now"
unsafe fn timestamp_or_now(ptr: *const c_char) -> Result<DateTime<Utc>, StatsError> {
    match cstr_to_string(ptr) {
        None => Ok(Utc::now()),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StatsError::ParseError(format!("invalid timestamp '{s}': {e}"))),
    }
}

fn parse_records(documents_json: &str) -> Result<Vec<HealthRecord>, StatsError> {
    let documents = RecordAdapter::parse_array(documents_json)?;
    RecordAdapter::to_records(&documents)
}

macro_rules! require_str {
    ($ptr:expr, $what:literal) => {
        match cstr_to_string($ptr) {
            Some(s) => s,
            None => {
                set_last_error(concat!("Invalid ", $what, " string pointer"));
                return ptr::null_mut();
            }
        }
    };
}

// ============================================================================
// Stateless API
// ============================================================================

/// Summarize a JSON array of store documents into a JSON object keyed by
/// category id.
///
/// # Safety
/// - `documents_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `hstats_free_string`.
/// - Returns NULL on error; call `hstats_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hstats_summarize_json(documents_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = require_str!(documents_json, "JSON");

    finish(parse_records(&json_str).and_then(|records| {
        let summaries = StatsProcessor::new().summarize(&records);
        serde_json::to_string(&summaries).map_err(StatsError::JsonError)
    }))
}

/// Trend series for one category as a JSON array of `{timestamp, value}`.
///
/// # Safety
/// - `documents_json` and `category_id` must be valid null-terminated C strings.
/// - `points <= 0` selects the default cap.
/// - Returns a newly allocated string that must be freed with `hstats_free_string`.
/// - Returns NULL on error; call `hstats_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hstats_trend_json(
    documents_json: *const c_char,
    category_id: *const c_char,
    points: i32,
) -> *mut c_char {
    clear_last_error();

    let json_str = require_str!(documents_json, "JSON");
    let category = require_str!(category_id, "category_id");

    let mut config = StatsConfig::default();
    if points > 0 {
        config.trend_points = points as usize;
    }

    finish(parse_records(&json_str).and_then(|records| {
        let series = StatsProcessor::with_config(config).trend(&records, &category);
        serde_json::to_string(&series).map_err(StatsError::JsonError)
    }))
}

/// Full statistics report for one owner and period ("day", "week", "month").
///
/// # Safety
/// - `documents_json`, `owner_id` and `period` must be valid null-terminated C strings.
/// - `now_rfc3339` may be NULL to use the current time.
/// - Returns a newly allocated string that must be freed with `hstats_free_string`.
/// - Returns NULL on error; call `hstats_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hstats_report_json(
    documents_json: *const c_char,
    owner_id: *const c_char,
    period: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = require_str!(documents_json, "JSON");
    let owner = require_str!(owner_id, "owner_id");
    let period_str = require_str!(period, "period");

    finish(
        timestamp_or_now(now_rfc3339)
            .and_then(|now| documents_to_report_json(json_str, owner, period_str, now)),
    )
}

// ============================================================================
// Stateful Store API
// ============================================================================

/// Opaque handle to an in-memory record store plus processor
pub struct StoreHandle {
    store: InMemoryStore,
    processor: StatsProcessor,
}

/// Create a new, empty record store.
///
/// # Safety
/// - Returns a pointer to a newly allocated store.
/// - Must be freed with `hstats_store_free`.
#[no_mangle]
pub unsafe extern "C" fn hstats_store_new() -> *mut StoreHandle {
    clear_last_error();

    let handle = Box::new(StoreHandle {
        store: InMemoryStore::new(),
        processor: StatsProcessor::new(),
    });
    Box::into_raw(handle)
}

/// Free a record store.
///
/// # Safety
/// - `store` must be a valid pointer returned by `hstats_store_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn hstats_store_free(store: *mut StoreHandle) {
    if !store.is_null() {
        drop(Box::from_raw(store));
    }
}

/// Add a record from form input and return the stored document as JSON.
///
/// # Safety
/// - `store` must be a valid pointer returned by `hstats_store_new`.
/// - `owner_id`, `category_id` and `inputs_json` (a JSON array of strings, one
///   per catalog field) must be valid null-terminated C strings.
/// - `recorded_at` may be NULL to use the current time.
/// - Returns a newly allocated string that must be freed with `hstats_free_string`.
/// - Returns NULL on error; call `hstats_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hstats_store_add_record(
    store: *mut StoreHandle,
    owner_id: *const c_char,
    category_id: *const c_char,
    inputs_json: *const c_char,
    recorded_at: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if store.is_null() {
        set_last_error("Null store pointer");
        return ptr::null_mut();
    }

    let handle = &*store;

    let owner = require_str!(owner_id, "owner_id");
    let category = require_str!(category_id, "category_id");
    let inputs = require_str!(inputs_json, "inputs JSON");

    let result = timestamp_or_now(recorded_at).and_then(|at| {
        let inputs: Vec<String> = serde_json::from_str(&inputs)?;
        let draft = RecordDraft::from_form(&owner, &category, inputs.as_slice(), at)?;
        let record = handle.store.insert(draft)?;
        serde_json::to_string(&RecordAdapter::to_document(&record)).map_err(StatsError::JsonError)
    });

    finish(result)
}

/// Statistics report for records held by the store.
///
/// # Safety
/// - `store` must be a valid pointer returned by `hstats_store_new`.
/// - `owner_id` and `period` must be valid null-terminated C strings.
/// - `now_rfc3339` may be NULL to use the current time.
/// - Returns a newly allocated string that must be freed with `hstats_free_string`.
/// - Returns NULL on error; call `hstats_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn hstats_store_report(
    store: *mut StoreHandle,
    owner_id: *const c_char,
    period: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if store.is_null() {
        set_last_error("Null store pointer");
        return ptr::null_mut();
    }

    let handle = &*store;

    let owner = require_str!(owner_id, "owner_id");
    let period_str = require_str!(period, "period");

    let result = timestamp_or_now(now_rfc3339).and_then(|now| {
        let period: Period = period_str.parse()?;
        let report = handle.processor.report(&handle.store, &owner, period, now)?;
        serde_json::to_string(&report).map_err(StatsError::JsonError)
    });

    finish(result)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Health Stats functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Health Stats function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn hstats_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Health Stats call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn hstats_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn hstats_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_documents() -> CString {
        CString::new(
            r#"[
                {"$id": "c", "userId": "u1", "diseaseId": "diabetes", "diseaseName": "Diabetes", "value1": 90, "unit1": "mg/dL", "recordDate": "2024-01-17T08:00:00Z"},
                {"$id": "b", "userId": "u1", "diseaseId": "diabetes", "diseaseName": "Diabetes", "value1": 110, "unit1": "mg/dL", "recordDate": "2024-01-16T08:00:00Z"},
                {"$id": "a", "userId": "u1", "diseaseId": "diabetes", "diseaseName": "Diabetes", "value1": 100, "unit1": "mg/dL", "recordDate": "2024-01-15T08:00:00Z"}
            ]"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        hstats_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_summarize() {
        let docs = sample_documents();
        unsafe {
            let json = take_string(hstats_summarize_json(docs.as_ptr()));
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["diabetes"]["count"], 3);
            assert_eq!(value["diabetes"]["average"], 100.0);
        }
    }

    #[test]
    fn test_ffi_trend() {
        let docs = sample_documents();
        let category = CString::new("diabetes").unwrap();
        unsafe {
            let json = take_string(hstats_trend_json(docs.as_ptr(), category.as_ptr(), 2));
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            let points = value.as_array().unwrap();
            assert_eq!(points.len(), 2);
            assert_eq!(points[0]["value"], 110.0);
            assert_eq!(points[1]["value"], 90.0);
        }
    }

    #[test]
    fn test_ffi_report_with_fixed_now() {
        let docs = sample_documents();
        let owner = CString::new("u1").unwrap();
        let period = CString::new("day").unwrap();
        let now = CString::new("2024-01-17T12:00:00Z").unwrap();
        unsafe {
            let json = take_string(hstats_report_json(
                docs.as_ptr(),
                owner.as_ptr(),
                period.as_ptr(),
                now.as_ptr(),
            ));
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["overview"]["total_records"], 1);
        }
    }

    #[test]
    fn test_ffi_store_lifecycle() {
        let owner = CString::new("u1").unwrap();
        let category = CString::new("blood-pressure").unwrap();
        let inputs = CString::new(r#"["120", "80"]"#).unwrap();
        let period = CString::new("week").unwrap();

        unsafe {
            let store = hstats_store_new();
            assert!(!store.is_null());

            let record = take_string(hstats_store_add_record(
                store,
                owner.as_ptr(),
                category.as_ptr(),
                inputs.as_ptr(),
                ptr::null(),
            ));
            let document: serde_json::Value = serde_json::from_str(&record).unwrap();
            assert_eq!(document["userId"], "u1");
            assert_eq!(document["diseaseId"], "blood-pressure");
            assert_eq!(document["value2"], 80.0);
            assert_eq!(document["unit1"], "mmHg");

            let report = take_string(hstats_store_report(
                store,
                owner.as_ptr(),
                period.as_ptr(),
                ptr::null(),
            ));
            let value: serde_json::Value = serde_json::from_str(&report).unwrap();
            assert_eq!(value["summaries"][0]["average"], 120.0);

            hstats_store_free(store);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid = CString::new("not json").unwrap();
        unsafe {
            let result = hstats_summarize_json(invalid.as_ptr());
            assert!(result.is_null());

            let error = hstats_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            assert!(hstats_summarize_json(ptr::null()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = hstats_version();
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
