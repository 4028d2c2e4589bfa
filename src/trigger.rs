//! Probe macros: the line-event trigger adapter
//!
//! The host environment has no line-level execution hook, so the host
//! inserts probes at the lines it wants observed. [`crate::observe!`]
//! reports "this source location executed" with the site's `file!()` and
//! `line!()` plus its declared bindings; [`crate::snapshot!`] requests an
//! explicit capture. Both resolve the engine through the registry and are
//! no-ops when none is registered, so probes can stay in place while the
//! instrumentation is absent.

/// Build a `&[Binding]` slice from variable names
///
/// Each name is bound under its own identifier; the value must implement
/// [`crate::value::Capturable`].
#[macro_export]
macro_rules! bindings {
    () => {{
        let empty: &[$crate::scope::Binding<'_>] = &[];
        empty
    }};
    ($($name:ident),+ $(,)?) => {
        &[$($crate::scope::Binding::new(stringify!($name), &$name)),+]
    };
}

/// Line probe: forwards a line event to the registered engine
///
/// Expands to a rate-limited capture attempt tagged with this source
/// location. The event only produces a snapshot when the enclosing file
/// is the configured tracee.
///
/// ```no_run
/// let batch = vec![0u8; 4 * 1024 * 1024];
/// recuerdo::observe!(locals: [batch]);
/// ```
#[macro_export]
macro_rules! observe {
    (globals: [$($g:ident),* $(,)?], locals: [$($l:ident),* $(,)?]) => {
        if let ::core::option::Option::Some(engine) = $crate::registry::current() {
            engine.line_event(file!(), line!(), $crate::bindings![$($g),*], $crate::bindings![$($l),*]);
        }
    };
    (locals: [$($l:ident),* $(,)?]) => {
        $crate::observe!(globals: [], locals: [$($l),*])
    };
}

/// Explicit capture through the registered engine, bypassing the rate
/// limiter
///
/// Fire-and-forget: failures are reported through the engine's diagnostic
/// sink. Use [`crate::engine::CaptureEngine::snapshot`] directly to handle
/// the result.
///
/// ```no_run
/// let state = vec![1.0f64; 1024];
/// recuerdo::snapshot!("iteration-100", locals: [state]);
/// ```
#[macro_export]
macro_rules! snapshot {
    ($label:expr, globals: [$($g:ident),* $(,)?], locals: [$($l:ident),* $(,)?]) => {
        if let ::core::option::Option::Some(engine) = $crate::registry::current() {
            let _ = engine.snapshot($label, $crate::bindings![$($g),*], $crate::bindings![$($l),*]);
        }
    };
    ($label:expr, locals: [$($l:ident),* $(,)?]) => {
        $crate::snapshot!($label, globals: [], locals: [$($l),*])
    };
}
