use super::error::PdfError;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::sync::Mutex;

/// Cached state for lazy Pdfium initialization.
enum InitializationState {
    Uninitialized,
    Initialized,
    Failed(String),
}

/// Lazily initialized Pdfium state.
///
/// The first binding attempt is recorded here; a failure is cached so that
/// every subsequent PDF operation fails fast with the original cause
/// instead of probing the system library again.
static PDFIUM_STATE: Lazy<Mutex<InitializationState>> =
    Lazy::new(|| Mutex::new(InitializationState::Uninitialized));

/// Get Pdfium bindings to the system library, with lazy one-time probing.
///
/// Fresh bindings are created per call (they are cheap once the library is
/// known to load); `map_err` selects the error variant appropriate to the
/// calling operation.
pub(crate) fn bind_pdfium(
    map_err: fn(String) -> PdfError,
    context: &'static str,
) -> Result<Box<dyn PdfiumLibraryBindings>, PdfError> {
    let mut state = PDFIUM_STATE
        .lock()
        .map_err(|e| map_err(format!("Failed to acquire Pdfium state lock ({}): {}", context, e)))?;

    match &*state {
        InitializationState::Uninitialized => match Pdfium::bind_to_system_library() {
            Ok(bindings) => {
                *state = InitializationState::Initialized;
                Ok(bindings)
            }
            Err(err) => {
                let message = err.to_string();
                *state = InitializationState::Failed(message.clone());
                Err(map_err(format!(
                    "Pdfium initialization failed ({}): {}",
                    context, message
                )))
            }
        },
        InitializationState::Failed(err) => Err(map_err(format!(
            "Pdfium initialization previously failed ({}): {}",
            context, err
        ))),
        InitializationState::Initialized => Pdfium::bind_to_system_library()
            .map_err(|e| map_err(format!("Failed to create Pdfium bindings ({}): {}", context, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_pdfium_error_mapping() {
        // Verifies the mapping closure shape; actual binding outcome depends
        // on whether a system Pdfium library is present.
        let map_err = |msg: String| PdfError::RenderingFailed(msg);
        let err = map_err("test".to_string());
        match err {
            PdfError::RenderingFailed(msg) => assert_eq!(msg, "test"),
            _ => panic!("error mapping failed"),
        }
    }

    #[test]
    fn test_bind_pdfium_is_deterministic_across_calls() {
        // Two calls must agree: both succeed or both fail with the cached cause.
        let first = bind_pdfium(PdfError::TextExtractionFailed, "probe 1").is_ok();
        let second = bind_pdfium(PdfError::TextExtractionFailed, "probe 2").is_ok();
        assert_eq!(first, second);
    }
}
