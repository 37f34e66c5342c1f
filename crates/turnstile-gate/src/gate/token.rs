//! Challenge token extraction.

use turnstile_common::{GateConfig, GateError, TokenLocation};

use super::RequestContext;

/// Pull the token from the configured header or form field.
///
/// An empty token is reported the same way as a missing one.
pub fn extract_token<C: RequestContext + ?Sized>(
    config: &GateConfig,
    ctx: &C,
) -> Result<String, GateError> {
    let name = config.token_name.as_str();

    let token = match config.token_location {
        TokenLocation::Header => ctx
            .header(name)
            .map_err(|e| GateError::TokenHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| GateError::TokenHeader {
                name: name.to_string(),
                reason: "header not present".to_string(),
            })?,
        TokenLocation::Form => {
            let mut form = ctx
                .form_values()
                .map_err(|e| GateError::FormRead(e.to_string()))?;
            // First value wins when the field repeats
            form.remove(name)
                .and_then(|values| values.into_iter().next())
                .ok_or_else(|| GateError::TokenMissing(format!("form field '{}' not found", name)))?
        }
    };

    if token.is_empty() {
        return Err(GateError::TokenMissing(format!(
            "{} '{}' is empty",
            config.token_location, name
        )));
    }

    Ok(token)
}
