//! Shared helpers for command handlers.

use heatlink_core::CommandOutcome;

use crate::error::CliError;

/// Parse an enum-valued flag, rejecting the catch-all sentinel so that a
/// typo never silently round-trips as "unrecognized".
pub fn parse_enum<T>(field: &'static str, input: &str, unrecognized: T) -> Result<T, CliError>
where
    T: std::str::FromStr + PartialEq,
{
    match input.parse::<T>() {
        Ok(value) if value != unrecognized => Ok(value),
        _ => Err(CliError::Validation {
            field: field.into(),
            reason: format!("unrecognized value '{input}'"),
        }),
    }
}

/// Turn a gateway outcome into process output: accepted prints the
/// message, rejected becomes a diagnostic with its own exit code.
pub fn report(outcome: CommandOutcome) -> Result<(), CliError> {
    if outcome.accepted {
        eprintln!("{}", outcome.message);
        Ok(())
    } else {
        Err(CliError::Rejected {
            message: outcome.message,
        })
    }
}
