use std::path::Path;

use pw_api::{find_template, resume_wizard, start_wizard, ResumeWizardOptions, StartWizardOptions};
use pw_core::{UserContext, WizardError};
use pw_runtime::{PrototypeWizard, TurnOutput};
use tracing::debug;

use crate::{
    emit_turn, load_catalog_by_ref, load_player_state, save_player_state, LoadedCatalog,
    PlayerState, UserArgs, PLAYER_STATE_SCHEMA,
};

pub(crate) fn user_from_args(args: &UserArgs) -> UserContext {
    let mut user = UserContext::new(args.user.as_str());
    user.permissions = args.permissions.clone();
    user.location = args.location.clone();
    user
}

pub(crate) fn start_session(
    catalog: &LoadedCatalog,
    user: &UserContext,
    template: Option<&str>,
    seed: Option<u32>,
) -> Result<PrototypeWizard, WizardError> {
    let existing_template = match template {
        Some(key) => Some(find_template(&catalog.services, key)?),
        None => None,
    };
    start_wizard(StartWizardOptions {
        user: user.clone(),
        existing_template,
        services: catalog.services.clone(),
        random_seed: seed,
        test_parse: None,
        page_size: None,
    })
}

pub(crate) fn resume_session(
    catalog: &LoadedCatalog,
    state: &PlayerState,
) -> Result<PrototypeWizard, WizardError> {
    resume_wizard(ResumeWizardOptions {
        snapshot: state.snapshot.clone(),
        services: catalog.services.clone(),
        options: None,
    })
}

pub(crate) fn save_session_state(
    path: &Path,
    wizard: &PrototypeWizard,
    catalog_id: &str,
) -> Result<(), WizardError> {
    let snapshot = wizard.snapshot()?;
    let state = PlayerState {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        catalog_id: catalog_id.to_string(),
        snapshot,
    };
    save_player_state(path, &state)
}

pub(crate) fn load_session_from_state_for_ref(
    path: &Path,
) -> Result<(LoadedCatalog, PrototypeWizard), WizardError> {
    let state = load_player_state(path)?;
    let catalog = load_catalog_by_ref(&state.catalog_id)?;
    let wizard = resume_session(&catalog, &state)?;
    Ok((catalog, wizard))
}

pub(crate) fn load_session_from_state_for_catalog(
    path: &Path,
    catalog: &LoadedCatalog,
) -> Result<PrototypeWizard, WizardError> {
    let state = load_player_state(path)?;
    if state.catalog_id != catalog.id {
        return Err(WizardError::input(
            "TUI_STATE_CATALOG_MISMATCH",
            format!(
                "State catalog mismatch. expected={} actual={}",
                catalog.id, state.catalog_id
            ),
        ));
    }
    resume_session(catalog, &state)
}

/// Prints the turn and, unless the session ended, writes the state the next
/// invocation resumes from.
pub(crate) fn emit_turn_with_saved_state(
    wizard: &PrototypeWizard,
    output: &TurnOutput,
    state_out: &str,
    catalog_id: &str,
) -> Result<i32, WizardError> {
    if !output.exited {
        save_session_state(Path::new(state_out), wizard, catalog_id)?;
        debug!(node = %output.node, state_out, "agent turn saved");
        emit_turn(output, Some(state_out));
        return Ok(0);
    }

    emit_turn(output, None);
    Ok(0)
}
