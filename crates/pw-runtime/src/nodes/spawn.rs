use pw_core::{fields, WizardError};
use tracing::info;

use super::update::begin_update;
use super::{flat_template, validate_current};
use crate::engine::navigation::navigation_options;
use crate::engine::node::{
    callback, MenuOption, NodeArgs, NodeContent, NodeId, NodeView, Transition, Turn,
};

const SPAWN_HELP: &str = "\
Spawning creates a live entity from the template as it is now, saved or not. \
Embedded expressions are evaluated anew for every spawn.";

pub(crate) fn spawn_node(turn: &mut Turn<'_>, _args: &NodeArgs) -> Result<NodeView, WizardError> {
    let report = validate_current(turn)?;
    let mut options = Vec::new();
    let body = if report.is_fatal() {
        format!(
            "{}\n\nThe errors above need to be corrected before anything can be spawned.",
            report.to_text()
        )
    } else {
        let flat = flat_template(turn);
        let template_location = flat.get_str(fields::LOCATION).map(str::to_string);
        if let Some(location) = &template_location {
            options.push(MenuOption::invoke(
                format!("Spawn at the template's location ({})", location),
                callback(spawn_instance),
            ));
        }
        if let Some(location) = turn.state.user.location.clone() {
            if template_location.as_deref() != Some(location.as_str()) {
                options.push(
                    MenuOption::invoke(
                        format!("Spawn at your location ({})", location),
                        callback(spawn_instance),
                    )
                    .with_arg("location", location),
                );
            }
        }
        options.push(
            MenuOption::invoke("Spawn in your inventory", callback(spawn_instance))
                .with_arg("location", format!("inventory:{}", turn.state.user.name)),
        );
        if let Some(key) = turn.state.template.key() {
            let count = turn.services.registry.objects_using(key)?.len();
            if count > 0 {
                options.push(
                    MenuOption::invoke(
                        format!("Update {} existing instances", count),
                        callback(begin_update),
                    )
                    .with_arg("back", NodeId::Spawn.as_str()),
                );
            }
        }
        let mut body = match flat.key() {
            Some(key) => format!("Spawn an entity from template '{}'.", key),
            None => "Spawn an entity from the unsaved template.".to_string(),
        };
        if !report.issues.is_empty() {
            body.push_str(&format!("\n\n{}", report.to_text()));
        }
        body
    };
    options.extend(navigation_options(
        Some(NodeId::Spawn),
        Some(NodeId::Save),
        Some(NodeId::Index),
    ));
    Ok(NodeView::new(NodeContent::with_help(body, SPAWN_HELP), options))
}

fn spawn_instance(turn: &mut Turn<'_>, _raw: &str, args: &NodeArgs) -> Result<Transition, WizardError> {
    let location = args.get("location").map(String::as_str);
    let spawned = turn
        .services
        .instantiation
        .instantiate(&turn.state.template, location, false)?;
    if spawned.report.is_fatal() {
        return Err(WizardError::validation(
            "SPAWN_FAILED",
            format!("Could not spawn: {}", spawned.report.fatal_messages().join(" ")),
        ));
    }
    for instance in &spawned.instances {
        info!(id = %instance.id, user = %turn.state.user.name, "spawned from wizard");
        let line = match instance.current.get(fields::LOCATION) {
            Some(location) => format!(
                "Spawned instance {} at {}.",
                instance.display_name(),
                location.to_text()
            ),
            None => format!("Spawned instance {}.", instance.display_name()),
        };
        turn.msg(line);
    }
    Ok(Transition::Stay)
}

#[cfg(test)]
mod spawn_tests {
    use super::*;
    use crate::test_support::{goblin_instance, wizard_for, world_with};
    use pw_core::{PwValue, Template};

    fn goblin() -> Template {
        Template::new()
            .with(fields::KEY, "goblin")
            .with(fields::KIND, "Monster")
            .with(fields::NAME, "Grik")
    }

    #[test]
    fn spawn_offers_locations_and_records_origin() {
        let template = goblin().with(fields::LOCATION, "#9");
        let (mut wizard, world) = wizard_for(world_with(Vec::new(), Vec::new()), Some(template));
        let output = wizard.enter("sp");
        assert!(output.text.contains("  1: Spawn at the template's location (#9)"));
        assert!(output.text.contains("  2: Spawn at your location (#2)"));
        assert!(output.text.contains("  3: Spawn in your inventory"));

        let output = wizard.enter("2");
        assert_eq!(output.node, NodeId::Spawn);
        assert_eq!(output.messages, vec!["Spawned instance Grik (#1) at #2.".to_string()]);
        let instances = world.instances().expect("instances");
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].origin.get(fields::LOCATION), Some(&PwValue::string("#9")));
        assert_eq!(instances[0].current.get(fields::LOCATION), Some(&PwValue::string("#2")));
        assert!(!instances[0].has_diverged(fields::LOCATION));
        assert!(wizard.template().get_str(fields::LOCATION) == Some("#9"));
    }

    #[test]
    fn spawn_location_stays_out_of_the_update_diff() {
        let (mut wizard, world) = wizard_for(world_with(Vec::new(), Vec::new()), Some(goblin()));
        let output = wizard.enter("sp");
        assert!(output.text.contains("  1: Spawn at your location (#2)"));
        let output = wizard.enter("1");
        assert_eq!(output.messages, vec!["Spawned instance Grik (#1) at #2.".to_string()]);
        assert!(output.text.contains("Update 1 existing instances"));

        let instances = world.instances().expect("instances");
        assert!(!instances[0].origin.contains_key(fields::LOCATION));
        assert_eq!(instances[0].current.get(fields::LOCATION), Some(&PwValue::string("#2")));

        let output = wizard.enter("3");
        assert_eq!(output.node, NodeId::UpdateInstances);
        assert!(output.text.contains("No changes are needed"));
        assert!(!output.text.contains("REMOVE"));

        let output = wizard.enter("u");
        assert_eq!(output.messages, vec!["0 instances were updated successfully.".to_string()]);
        let instances = world.instances().expect("instances");
        assert_eq!(instances[0].current.get(fields::LOCATION), Some(&PwValue::string("#2")));
    }

    #[test]
    fn fatal_template_cannot_spawn() {
        let template = Template::new().with(fields::KEY, "blob");
        let (mut wizard, world) = wizard_for(world_with(Vec::new(), Vec::new()), Some(template));
        let output = wizard.enter("sp");
        assert!(output.text.contains("need to be corrected before anything can be spawned"));
        assert_eq!(wizard.enter("1").node, NodeId::Spawn);
        assert!(world.instances().expect("instances").is_empty());
    }

    #[test]
    fn existing_instances_offer_update() {
        let world = world_with(vec![goblin()], vec![goblin_instance("4", 5.0, 5.0)]);
        let (mut wizard, _) = wizard_for(world, Some(goblin()));
        let output = wizard.enter("sp");
        assert!(output.text.contains("Update 1 existing instances"));
        assert_eq!(wizard.enter("3").node, NodeId::UpdateInstances);
    }
}
