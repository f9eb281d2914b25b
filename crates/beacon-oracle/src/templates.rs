//! Template registry.
//!
//! A template binds a reporter to an endpoint and a parameter blob. Its
//! identifier is derived from those three fields, so registering the same
//! tuple twice writes the same entry again.

use beacon_types::events::OracleEvent;
use beacon_types::record::Template;
use beacon_types::{EndpointId, ReporterId, TemplateId, ZERO_ID};

use crate::state::{Changeset, OracleState};
use crate::{ids, OracleError, Result};

/// Register a template and return its identifier.
///
/// # Errors
///
/// [`OracleError::ZeroIdentifier`] if `reporter` is all zeros.
pub fn register_template(
    state: &mut OracleState,
    reporter: ReporterId,
    endpoint_id: EndpointId,
    parameters: &[u8],
) -> Result<TemplateId> {
    if reporter == ZERO_ID {
        return Err(OracleError::ZeroIdentifier("reporter"));
    }
    let template_id = ids::derive_template_id(&reporter, &endpoint_id, parameters);

    let mut changes = Changeset::new();
    changes
        .write_template(
            template_id,
            Template {
                reporter,
                endpoint_id,
                parameters: parameters.to_vec(),
            },
        )
        .emit(OracleEvent::TemplateRegistered {
            template_id,
            reporter,
        });
    state.commit(changes);

    tracing::info!(
        template_id = %hex::encode(template_id),
        reporter = %hex::encode(reporter),
        "template registered"
    );
    Ok(template_id)
}

/// The reporter allowed to sign under `template_id`.
///
/// # Errors
///
/// [`OracleError::UnknownTemplate`] if nothing is registered under it.
pub fn reporter_for(state: &OracleState, template_id: &TemplateId) -> Result<ReporterId> {
    state
        .template(template_id)
        .map(|template| template.reporter)
        .ok_or_else(|| OracleError::UnknownTemplate(hex::encode(template_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut state = OracleState::new();
        let id = register_template(&mut state, [1u8; 32], [2u8; 32], b"p").expect("register");
        assert_eq!(id, ids::derive_template_id(&[1u8; 32], &[2u8; 32], b"p"));
        assert_eq!(reporter_for(&state, &id).expect("registered"), [1u8; 32]);

        let template = state.template(&id).expect("stored");
        assert_eq!(template.parameters, b"p".to_vec());
        assert_eq!(template.endpoint_id, [2u8; 32]);
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let mut state = OracleState::new();
        let a = register_template(&mut state, [1u8; 32], [2u8; 32], b"").expect("first");
        let b = register_template(&mut state, [1u8; 32], [2u8; 32], b"").expect("second");
        assert_eq!(a, b);
        assert_eq!(state.templates().count(), 1);
        assert_eq!(state.events().len(), 2);
    }

    #[test]
    fn test_zero_reporter_rejected() {
        let mut state = OracleState::new();
        let err = register_template(&mut state, ZERO_ID, [2u8; 32], b"").unwrap_err();
        assert!(matches!(err, OracleError::ZeroIdentifier("reporter")));
        assert_eq!(state.templates().count(), 0);
    }

    #[test]
    fn test_unknown_template() {
        let state = OracleState::new();
        let err = reporter_for(&state, &[5u8; 32]).unwrap_err();
        assert!(matches!(err, OracleError::UnknownTemplate(ref id) if id == &hex::encode([5u8; 32])));
    }
}
