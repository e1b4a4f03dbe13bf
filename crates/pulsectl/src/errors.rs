//! Error codes and exit status for pulsectl
//!
//! Values follow sysexits(3) where one fits.

use pulse_common::PulseError;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the CSV tables cannot be loaded (EX_NOINPUT)
pub const EXIT_DATA_UNAVAILABLE: i32 = 66;

/// Exit code when the model endpoint fails (EX_UNAVAILABLE)
pub const EXIT_MODEL_UNAVAILABLE: i32 = 69;

/// Exit code for unreadable or invalid configuration (EX_CONFIG)
pub const EXIT_CONFIG_ERROR: i32 = 78;

/// Map an error to the process exit code
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    let pulse_error = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<PulseError>());

    match pulse_error {
        Some(PulseError::DataLoad { .. }) => EXIT_DATA_UNAVAILABLE,
        Some(PulseError::Llm(_)) => EXIT_MODEL_UNAVAILABLE,
        Some(PulseError::Config(_)) => EXIT_CONFIG_ERROR,
        _ => EXIT_GENERAL_ERROR,
    }
}

/// Short machine-readable label for the invocation log
pub fn error_label(err: &anyhow::Error) -> &'static str {
    match exit_code_for(err) {
        EXIT_DATA_UNAVAILABLE => "data_unavailable",
        EXIT_MODEL_UNAVAILABLE => "model_unavailable",
        EXIT_CONFIG_ERROR => "config_error",
        _ => "error",
    }
}
