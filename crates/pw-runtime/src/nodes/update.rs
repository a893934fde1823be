use std::collections::BTreeSet;

use pw_core::{DiffAction, DiffRecord, FieldMap, Instance, WizardError};
use tracing::{debug, info};

use super::flat_template;
use crate::diff::SAMPLING_NOTICE;
use crate::engine::node::{
    callback, MenuOption, NodeArgs, NodeContent, NodeId, NodeView, Transition, Turn,
};
use crate::engine::session::UpdateFlow;
use crate::rng::pick_index;

const UPDATE_HELP: &str = "\
Changes are worked out against one existing instance picked at random and then \
applied to every instance spawned from this template. Keep a field as-is to \
leave it untouched on all of them. Reset takes a new random example and drops \
your keep choices. Nothing changes until you choose Update.";

/// Starts the review of changes to instances spawned from the current
/// template. `args.back` names the node to return to afterwards.
pub(crate) fn begin_update(turn: &mut Turn<'_>, _raw: &str, args: &NodeArgs) -> Result<Transition, WizardError> {
    let back = args
        .get("back")
        .and_then(|node| node.parse::<NodeId>().ok())
        .unwrap_or(NodeId::Index);
    let key = turn.state.template.key().map(str::to_lowercase).ok_or_else(|| {
        WizardError::input(
            "TEMPLATE_KEY_MISSING",
            "The template needs a key before its instances can be updated.",
        )
    })?;
    let instances = turn.services.registry.objects_using(&key)?;
    let flow = sample_flow(turn, key, &instances, BTreeSet::new(), back)?;
    turn.state.update = Some(flow);
    Ok(Transition::goto(NodeId::UpdateInstances))
}

fn sample_flow(
    turn: &mut Turn<'_>,
    template_key: String,
    instances: &[Instance],
    overrides: BTreeSet<String>,
    back: NodeId,
) -> Result<UpdateFlow, WizardError> {
    let mut flow = UpdateFlow {
        template_key,
        instance_ids: instances.iter().map(|instance| instance.id.clone()).collect(),
        sample_id: None,
        sample_name: None,
        snapshot: FieldMap::new(),
        diff: DiffRecord::new(),
        overrides,
        back,
    };
    let Some(sample) = pick_index(&mut turn.state.rng_state, instances.len()).map(|i| &instances[i])
    else {
        return Ok(flow);
    };
    let (mut diff, snapshot) = turn
        .services
        .instantiation
        .diff_against_instance(&turn.state.template, sample)?;
    for field in &flow.overrides {
        if let Some(action) = diff.get_mut(field) {
            *action = DiffAction::Keep;
        }
    }
    debug!(
        template = %flow.template_key,
        sample = %sample.id,
        changes = diff.len(),
        "update diff sampled"
    );
    flow.sample_id = Some(sample.id.clone());
    flow.sample_name = Some(sample.display_name());
    flow.snapshot = snapshot.into_fields();
    flow.diff = diff;
    Ok(flow)
}

fn back_option(back: NodeId) -> MenuOption {
    MenuOption::invoke(
        "Back",
        callback(move |turn, _raw, _args| {
            turn.state.update = None;
            Ok(Transition::goto(back))
        }),
    )
    .with_keys(["b", "back"])
    .with_desc(back.as_str().replace('_', "-"))
    .nav()
}

pub(crate) fn update_node(turn: &mut Turn<'_>, _args: &NodeArgs) -> Result<NodeView, WizardError> {
    let Some(flow) = turn.state.update.clone() else {
        return Ok(NodeView::new(
            NodeContent::text("No update in progress."),
            vec![back_option(NodeId::Index)],
        ));
    };
    if flow.instance_ids.is_empty() {
        return Ok(NodeView::new(
            NodeContent::text("There are no existing instances to update."),
            vec![back_option(flow.back)],
        ));
    }

    let flat = flat_template(turn);
    let mut lines = vec![
        format!("Suggested changes to {} instances.", flow.instance_ids.len()),
        format!(
            "Showing random example instance to change: {}",
            flow.sample_name.as_deref().unwrap_or("(none)")
        ),
        String::new(),
        SAMPLING_NOTICE.to_string(),
        String::new(),
    ];
    let mut options = Vec::new();
    if flow.diff.is_empty() {
        lines.push("No changes are needed. The example already matches the template.".to_string());
    }
    for (number, (field, action)) in flow.diff.iter().enumerate() {
        let old = flow
            .snapshot
            .get(field)
            .map(|value| value.to_text())
            .unwrap_or_else(|| "(unset)".to_string());
        let new = match (action, flat.get(field)) {
            (DiffAction::Remove, _) | (_, None) => "(removed)".to_string(),
            (_, Some(raw)) => turn.services.resolver.resolve(raw, true).value.to_text(),
        };
        lines.push(format!(" {}. {}: {} -> {} {}", number + 1, field, old, new, action));
        options.push(
            MenuOption::invoke(format!("Keep {} as-is", field), callback(keep_field))
                .with_arg("field", field.as_str()),
        );
    }

    options.push(
        MenuOption::invoke("Update", callback(apply_update))
            .with_keys(["u", "update"])
            .with_desc(format!("apply to all {} instances", flow.instance_ids.len())),
    );
    options.push(
        MenuOption::invoke("Reset changes", callback(reset_update)).with_keys(["r", "reset"]),
    );
    options.push(back_option(flow.back));
    Ok(NodeView::new(
        NodeContent::with_help(lines.join("\n"), UPDATE_HELP),
        options,
    ))
}

fn keep_field(turn: &mut Turn<'_>, _raw: &str, args: &NodeArgs) -> Result<Transition, WizardError> {
    let (Some(flow), Some(field)) = (turn.state.update.as_mut(), args.get("field")) else {
        return Ok(Transition::Stay);
    };
    flow.overrides.insert(field.clone());
    if let Some(action) = flow.diff.get_mut(field) {
        *action = DiffAction::Keep;
    }
    turn.msg(format!("Keeping {} as-is.", field));
    Ok(Transition::Stay)
}

fn reset_update(turn: &mut Turn<'_>, _raw: &str, _args: &NodeArgs) -> Result<Transition, WizardError> {
    let Some(flow) = turn.state.update.clone() else {
        return Ok(Transition::Stay);
    };
    let instances = turn.services.registry.objects_using(&flow.template_key)?;
    let fresh = sample_flow(turn, flow.template_key, &instances, BTreeSet::new(), flow.back)?;
    turn.state.update = Some(fresh);
    turn.msg("Changes were reset.");
    Ok(Transition::Stay)
}

fn apply_update(turn: &mut Turn<'_>, _raw: &str, _args: &NodeArgs) -> Result<Transition, WizardError> {
    let Some(flow) = turn.state.update.clone() else {
        turn.msg("No update in progress.");
        return Ok(Transition::goto(NodeId::Index));
    };
    let updated = turn.services.instantiation.bulk_update(
        &turn.state.template,
        &flow.diff,
        &flow.instance_ids,
    )?;
    info!(template = %flow.template_key, updated, "instances updated from wizard");
    turn.state.update = None;
    turn.msg(format!("{} instances were updated successfully.", updated));
    Ok(Transition::goto(flow.back))
}
