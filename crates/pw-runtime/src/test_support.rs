use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use pw_core::{fields, FieldMap, Instance, PwValue, Template, UserContext};

use crate::access::LockAccessPolicy;
use crate::engine::{PrototypeWizard, WizardOptions};
use crate::resolver::RhaiFieldResolver;
use crate::services::Services;
use crate::world::MemoryWorld;

pub(crate) fn world_with(templates: Vec<Template>, instances: Vec<Instance>) -> MemoryWorld {
    let mut world = MemoryWorld::new(Arc::new(RhaiFieldResolver::default()))
        .with_kind("Monster", "Hostile creature")
        .with_kind("Item", "Carryable thing")
        .with_kind("Room", "A place");
    for template in templates {
        world = world.with_template(template);
    }
    for instance in instances {
        world = world.with_instance(instance);
    }
    world
}

pub(crate) fn services_for(world: MemoryWorld) -> (Services, Arc<MemoryWorld>) {
    let world = Arc::new(world);
    let services = Services {
        registry: world.clone(),
        resolver: Arc::new(RhaiFieldResolver::default()),
        instantiation: world.clone(),
        access: Arc::new(LockAccessPolicy),
    };
    (services, world)
}

pub(crate) fn goblin_instance(id: &str, origin_hp: f64, current_hp: f64) -> Instance {
    let origin = FieldMap::from([
        (fields::KIND.to_string(), PwValue::string("Monster")),
        ("hp".to_string(), PwValue::Number(origin_hp)),
    ]);
    let mut current = origin.clone();
    current.insert("hp".to_string(), PwValue::Number(current_hp));
    Instance {
        id: id.to_string(),
        template_key: "goblin".to_string(),
        materialized: origin.clone(),
        origin,
        current,
    }
}

pub(crate) fn builder() -> UserContext {
    let mut user = UserContext::new("alice");
    user.permissions.push("Builder".to_string());
    user.location = Some("#2".to_string());
    user
}

pub(crate) fn wizard_for(world: MemoryWorld, existing: Option<Template>) -> (PrototypeWizard, Arc<MemoryWorld>) {
    let (services, world) = services_for(world);
    let options = WizardOptions {
        random_seed: Some(1),
        ..WizardOptions::default()
    };
    let wizard = PrototypeWizard::start(options, services, builder(), existing)
        .expect("wizard should start");
    (wizard, world)
}

pub(crate) fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("pw-{}-{}", prefix, nanos))
}
