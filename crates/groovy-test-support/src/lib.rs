//! Safe unwrap replacements for tests.
//!
//! The workspace denies `unwrap`/`expect` via clippy lints; tests use these
//! panic-on-failure helpers instead so failures carry a caller location.

/// Extract the value from a Result, or panic with the error.
#[track_caller]
#[allow(clippy::panic)]
pub fn must<T, E: std::fmt::Debug>(r: Result<T, E>) -> T {
    match r {
        Ok(v) => v,
        Err(e) => panic!("unexpected Err: {e:?}"),
    }
}

/// Extract the value from an Option, or panic.
#[track_caller]
#[allow(clippy::panic)]
pub fn must_some<T>(o: Option<T>) -> T {
    match o {
        Some(v) => v,
        None => panic!("unexpected None"),
    }
}

/// Extract the error from a Result, or panic if Ok.
#[track_caller]
#[allow(clippy::panic)]
pub fn must_err<T: std::fmt::Debug, E>(r: Result<T, E>) -> E {
    match r {
        Err(e) => e,
        Ok(v) => panic!("expected Err, got Ok({v:?})"),
    }
}
