use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pw_core::{
    fields, DiffAction, DiffRecord, FieldMap, Instance, PwValue, Spawned, Template, WizardError,
};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::diff::compute_diff;
use crate::flatten::{check_template, flatten_template};
use crate::services::{FieldResolver, InstantiationService, TemplateRegistry};

const TEMPLATES_DIR: &str = "templates";
const INSTANCES_FILE: &str = "instances.json";
const KINDS_FILE: &str = "kinds.json";

#[derive(Debug, Default)]
struct WorldData {
    templates: BTreeMap<String, Template>,
    instances: Vec<Instance>,
    kinds: BTreeMap<String, String>,
}

/// In-memory template catalog and entity store. When opened from a directory,
/// saves and spawns are written back to it.
pub struct MemoryWorld {
    data: RwLock<WorldData>,
    resolver: Arc<dyn FieldResolver>,
    catalog_dir: Option<PathBuf>,
}

impl MemoryWorld {
    pub fn new(resolver: Arc<dyn FieldResolver>) -> Self {
        Self {
            data: RwLock::new(WorldData::default()),
            resolver,
            catalog_dir: None,
        }
    }

    pub fn with_kind(mut self, kind: &str, description: &str) -> Self {
        if let Ok(data) = self.data.get_mut() {
            data.kinds.insert(kind.to_string(), description.to_string());
        }
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        if let (Some(key), Ok(data)) = (template.key().map(str::to_lowercase), self.data.get_mut())
        {
            data.templates.insert(key, template);
        }
        self
    }

    pub fn with_instance(mut self, instance: Instance) -> Self {
        if let Ok(data) = self.data.get_mut() {
            data.instances.push(instance);
        }
        self
    }

    /// Loads `templates/**/*.json`, `instances.json` and `kinds.json` from `dir`.
    pub fn open(dir: &Path, resolver: Arc<dyn FieldResolver>) -> Result<Self, WizardError> {
        if !dir.is_dir() {
            return Err(WizardError::service(
                "CATALOG_READ",
                format!("Catalog directory \"{}\" does not exist.", dir.display()),
            ));
        }

        let mut data = WorldData::default();
        let templates_dir = dir.join(TEMPLATES_DIR);
        if templates_dir.is_dir() {
            for entry in WalkDir::new(&templates_dir).sort_by_file_name() {
                let entry = entry.map_err(|error| {
                    WizardError::service(
                        "CATALOG_READ",
                        format!("Failed to walk \"{}\": {}", templates_dir.display(), error),
                    )
                })?;
                let path = entry.path();
                if !entry.file_type().is_file()
                    || path.extension().and_then(|ext| ext.to_str()) != Some("json")
                {
                    continue;
                }
                let template: Template = read_json(path)?;
                let key = template.key().map(str::to_lowercase).ok_or_else(|| {
                    WizardError::service(
                        "CATALOG_INVALID",
                        format!("Template file \"{}\" has no key.", path.display()),
                    )
                })?;
                data.templates.insert(key, template);
            }
        }

        let instances_path = dir.join(INSTANCES_FILE);
        if instances_path.is_file() {
            data.instances = read_json(&instances_path)?;
        }
        let kinds_path = dir.join(KINDS_FILE);
        if kinds_path.is_file() {
            data.kinds = read_json(&kinds_path)?;
        }

        debug!(
            templates = data.templates.len(),
            instances = data.instances.len(),
            dir = %dir.display(),
            "catalog opened"
        );
        Ok(Self {
            data: RwLock::new(data),
            resolver,
            catalog_dir: Some(dir.to_path_buf()),
        })
    }

    pub fn instances(&self) -> Result<Vec<Instance>, WizardError> {
        Ok(self.read()?.instances.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, WorldData>, WizardError> {
        self.data.read().map_err(|_| unavailable())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, WorldData>, WizardError> {
        self.data.write().map_err(|_| unavailable())
    }

    fn persist_template(&self, key: &str, template: &Template) -> Result<(), WizardError> {
        let Some(dir) = &self.catalog_dir else {
            return Ok(());
        };
        let templates_dir = dir.join(TEMPLATES_DIR);
        fs::create_dir_all(&templates_dir).map_err(|error| write_error(&templates_dir, error))?;
        write_json(&templates_dir.join(format!("{}.json", key)), template)
    }

    fn persist_instances(&self, instances: &[Instance]) -> Result<(), WizardError> {
        let Some(dir) = &self.catalog_dir else {
            return Ok(());
        };
        write_json(&dir.join(INSTANCES_FILE), &instances)
    }

    fn resolve_fields(&self, template: &Template) -> (FieldMap, FieldMap) {
        let mut origin = FieldMap::new();
        let mut materialized = FieldMap::new();
        for (field, value) in template.target_fields() {
            origin.insert(field.clone(), value.clone());
            materialized.insert(field.clone(), self.resolver.resolve(value, false).value);
        }
        (origin, materialized)
    }
}

impl TemplateRegistry for MemoryWorld {
    fn search(&self, key: Option<&str>) -> Result<Vec<Template>, WizardError> {
        let data = self.read()?;
        Ok(match key {
            None => data.templates.values().cloned().collect(),
            Some(key) => data
                .templates
                .get(&key.trim().to_lowercase())
                .cloned()
                .into_iter()
                .collect(),
        })
    }

    fn save(&self, template: &Template) -> Result<(), WizardError> {
        let key = template.key().map(str::to_lowercase).ok_or_else(|| {
            WizardError::input("TEMPLATE_KEY_MISSING", "A template needs a key to be saved.")
        })?;
        self.persist_template(&key, template)?;
        self.write()?.templates.insert(key.clone(), template.clone());
        info!(key = %key, "template saved");
        Ok(())
    }

    fn objects_using(&self, key: &str) -> Result<Vec<Instance>, WizardError> {
        let data = self.read()?;
        Ok(data
            .instances
            .iter()
            .filter(|instance| instance.template_key.eq_ignore_ascii_case(key))
            .cloned()
            .collect())
    }
}

impl InstantiationService for MemoryWorld {
    fn instantiate(
        &self,
        template: &Template,
        location: Option<&str>,
        validate_only: bool,
    ) -> Result<Spawned, WizardError> {
        let (mut report, flat) = check_template(template, self, self.resolver.as_ref())?;
        if let Some(kind) = flat.as_ref().and_then(Template::kind) {
            let data = self.read()?;
            if !data.kinds.is_empty() && !data.kinds.contains_key(kind) {
                report.fatal(format!("Unknown kind '{}'.", kind));
            }
        }
        let flat = match flat {
            Some(flat) if !validate_only && !report.is_fatal() => flat,
            _ => {
                return Ok(Spawned {
                    report,
                    instances: Vec::new(),
                })
            }
        };

        let (origin, mut materialized) = self.resolve_fields(&flat);
        if let Some(location) = location {
            materialized.insert(fields::LOCATION.to_string(), PwValue::string(location));
        }
        let mut data = self.write()?;
        let next_id = data
            .instances
            .iter()
            .filter_map(|instance| instance.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let instance = Instance {
            id: next_id.to_string(),
            template_key: flat.key().unwrap_or_default().to_string(),
            origin,
            current: materialized.clone(),
            materialized,
        };
        let mut instances = data.instances.clone();
        instances.push(instance.clone());
        self.persist_instances(&instances)?;
        data.instances = instances;
        info!(id = %instance.id, template = %instance.template_key, "instance spawned");
        Ok(Spawned {
            report,
            instances: vec![instance],
        })
    }

    fn bulk_update(
        &self,
        template: &Template,
        diff: &DiffRecord,
        instance_ids: &[String],
    ) -> Result<usize, WizardError> {
        let flat = flatten_template(template, self)?;
        let wanted = instance_ids
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>();

        let mut data = self.write()?;
        let mut instances = data.instances.clone();
        let mut updated = 0usize;
        for instance in instances
            .iter_mut()
            .filter(|instance| wanted.contains(instance.id.as_str()))
        {
            let mut changed = false;
            for (field, action) in diff {
                match action {
                    DiffAction::Keep => {}
                    DiffAction::Update | DiffAction::Replace => {
                        if let Some(raw) = flat.get(field) {
                            let value = self.resolver.resolve(raw, false).value;
                            instance.origin.insert(field.clone(), raw.clone());
                            instance.materialized.insert(field.clone(), value.clone());
                            instance.current.insert(field.clone(), value);
                            changed = true;
                        }
                    }
                    DiffAction::Remove => {
                        instance.origin.remove(field);
                        instance.materialized.remove(field);
                        instance.current.remove(field);
                        changed = true;
                    }
                }
            }
            if changed {
                updated += 1;
            }
        }
        self.persist_instances(&instances)?;
        data.instances = instances;
        info!(
            template = %flat.key().unwrap_or_default(),
            updated,
            "bulk update applied"
        );
        Ok(updated)
    }

    fn diff_against_instance(
        &self,
        template: &Template,
        instance: &Instance,
    ) -> Result<(DiffRecord, Template), WizardError> {
        let flat = flatten_template(template, self)?;
        Ok(compute_diff(&flat, instance, &BTreeSet::new()))
    }

    fn available_kinds(&self) -> Vec<String> {
        self.read()
            .map(|data| data.kinds.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn describe_kind(&self, kind: &str) -> Option<String> {
        self.read().ok()?.kinds.get(kind).cloned()
    }
}

fn unavailable() -> WizardError {
    WizardError::service("SERVICE_UNAVAILABLE", "World storage lock is poisoned.")
}

fn write_error(path: &Path, error: std::io::Error) -> WizardError {
    WizardError::service(
        "CATALOG_WRITE",
        format!("Failed to write \"{}\": {}", path.display(), error),
    )
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, WizardError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        WizardError::service(
            "CATALOG_READ",
            format!("Failed to read \"{}\": {}", path.display(), error),
        )
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        WizardError::service(
            "CATALOG_INVALID",
            format!("Invalid JSON in \"{}\": {}", path.display(), error),
        )
    })
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), WizardError> {
    let raw = serde_json::to_string_pretty(value).map_err(|error| {
        WizardError::internal(
            "CATALOG_ENCODE",
            format!("Failed to encode \"{}\": {}", path.display(), error),
        )
    })?;
    fs::write(path, raw).map_err(|error| write_error(path, error))
}

#[cfg(test)]
mod world_tests {
    use super::*;
    use crate::resolver::RhaiFieldResolver;
    use crate::services::Resolved;
    use crate::test_support::{goblin_instance, temp_dir, world_with};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResolver(AtomicUsize);

    impl FieldResolver for CountingResolver {
        fn resolve(&self, _value: &PwValue, _preview: bool) -> Resolved {
            let next = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            Resolved {
                warning: None,
                value: PwValue::Number(next as f64),
            }
        }
    }

    fn goblin() -> Template {
        Template::new()
            .with(fields::KEY, "goblin")
            .with(fields::KIND, "Monster")
            .with("hp", 10.0)
    }

    #[test]
    fn search_is_case_insensitive_and_lists_all() {
        let world = world_with(vec![goblin()], Vec::new());
        assert_eq!(world.search(Some("GOBLIN")).expect("search").len(), 1);
        assert_eq!(world.search(None).expect("search").len(), 1);
        assert!(world.search(Some("orc")).expect("search").is_empty());
    }

    #[test]
    fn save_requires_key() {
        let world = world_with(Vec::new(), Vec::new());
        let error = world.save(&Template::new()).expect_err("no key");
        assert_eq!(error.code, "TEMPLATE_KEY_MISSING");
    }

    #[test]
    fn unknown_kind_blocks_spawn() {
        let world = world_with(Vec::new(), Vec::new());
        let template = Template::new().with(fields::KEY, "x").with(fields::KIND, "Dragon");
        let spawned = world.instantiate(&template, None, false).expect("instantiate");
        assert!(spawned.report.is_fatal());
        assert!(spawned.instances.is_empty());
    }

    #[test]
    fn validate_only_never_creates_instances() {
        let world = world_with(Vec::new(), Vec::new());
        let spawned = world.instantiate(&goblin(), None, true).expect("instantiate");
        assert!(!spawned.report.is_fatal());
        assert!(spawned.instances.is_empty());
        assert!(world.instances().expect("instances").is_empty());
    }

    #[test]
    fn spawn_records_origin_and_resolved_values() {
        let world = world_with(Vec::new(), Vec::new());
        let template = goblin().with("dmg", "${1 + 1}");
        let spawned = world.instantiate(&template, None, false).expect("instantiate");
        let instance = &spawned.instances[0];
        assert_eq!(instance.id, "1");
        assert_eq!(instance.origin.get("dmg"), Some(&PwValue::string("${1 + 1}")));
        assert_eq!(instance.current.get("dmg"), Some(&PwValue::Number(2.0)));
        assert!(!instance.origin.contains_key(fields::KEY));
        assert!(!instance.has_diverged("dmg"));
    }

    #[test]
    fn bulk_update_touches_all_listed_instances() {
        let world = world_with(
            vec![goblin()],
            vec![goblin_instance("1", 5.0, 5.0), goblin_instance("2", 5.0, 9.0)],
        );
        let diff = DiffRecord::from([("hp".to_string(), DiffAction::Update)]);
        let ids = vec!["1".to_string(), "2".to_string()];
        let count = world.bulk_update(&goblin(), &diff, &ids).expect("update");
        assert_eq!(count, 2);
        for instance in world.instances().expect("instances") {
            assert_eq!(instance.current.get("hp"), Some(&PwValue::Number(10.0)));
        }
    }

    #[test]
    fn bulk_update_skips_kept_fields() {
        let world = world_with(vec![goblin()], vec![goblin_instance("1", 5.0, 5.0)]);
        let diff = DiffRecord::from([("hp".to_string(), DiffAction::Keep)]);
        let count = world
            .bulk_update(&goblin(), &diff, &["1".to_string()])
            .expect("update");
        assert_eq!(count, 0);
    }

    #[test]
    fn bulk_update_resolves_expressions_per_instance() {
        let template = goblin().with("hp", "${random(6)}");
        let world = MemoryWorld::new(Arc::new(CountingResolver(AtomicUsize::new(0))))
            .with_template(template.clone())
            .with_instance(goblin_instance("1", 5.0, 5.0))
            .with_instance(goblin_instance("2", 5.0, 5.0));
        let diff = DiffRecord::from([("hp".to_string(), DiffAction::Update)]);
        let ids = vec!["1".to_string(), "2".to_string()];
        assert_eq!(world.bulk_update(&template, &diff, &ids).expect("update"), 2);

        let instances = world.instances().expect("instances");
        assert_ne!(instances[0].current.get("hp"), instances[1].current.get("hp"));
        for instance in &instances {
            assert_eq!(instance.origin.get("hp"), Some(&PwValue::string("${random(6)}")));
            assert_eq!(instance.current.get("hp"), instance.materialized.get("hp"));
        }
    }

    #[test]
    fn spawn_location_is_not_part_of_origin() {
        let world = world_with(Vec::new(), Vec::new());
        let spawned = world
            .instantiate(&goblin(), Some("#2"), false)
            .expect("instantiate");
        let instance = &spawned.instances[0];
        assert!(!instance.origin.contains_key(fields::LOCATION));
        assert_eq!(instance.current.get(fields::LOCATION), Some(&PwValue::string("#2")));
        let (diff, _) = world
            .diff_against_instance(&goblin(), instance)
            .expect("diff");
        assert!(diff.is_empty());
    }

    #[test]
    fn failed_write_leaves_instances_untouched() {
        let dir = temp_dir("world-write-fail");
        fs::create_dir_all(&dir).expect("mkdir");
        let existing = vec![goblin_instance("1", 5.0, 5.0)];
        fs::write(
            dir.join(INSTANCES_FILE),
            serde_json::to_string(&existing).expect("instances json"),
        )
        .expect("instances");
        let world = MemoryWorld::open(&dir, Arc::new(RhaiFieldResolver::default())).expect("open");

        fs::remove_file(dir.join(INSTANCES_FILE)).expect("remove instances");
        fs::create_dir_all(dir.join(INSTANCES_FILE)).expect("block instances file");

        let error = world
            .instantiate(&goblin(), None, false)
            .err()
            .expect("spawn write should fail");
        assert_eq!(error.code, "CATALOG_WRITE");
        assert_eq!(world.instances().expect("instances").len(), 1);

        let diff = DiffRecord::from([("hp".to_string(), DiffAction::Update)]);
        let error = world
            .bulk_update(&goblin(), &diff, &["1".to_string()])
            .expect_err("update write should fail");
        assert_eq!(error.code, "CATALOG_WRITE");
        let instances = world.instances().expect("instances");
        assert_eq!(instances[0].current.get("hp"), Some(&PwValue::Number(5.0)));
        assert_eq!(instances[0].origin.get("hp"), Some(&PwValue::Number(5.0)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn catalog_directory_roundtrip() {
        let dir = temp_dir("world-catalog");
        fs::create_dir_all(dir.join(TEMPLATES_DIR)).expect("mkdir");
        fs::write(dir.join(KINDS_FILE), r#"{"Monster": "Hostile creature"}"#).expect("kinds");

        let resolver = Arc::new(RhaiFieldResolver::default());
        let world = MemoryWorld::open(&dir, resolver.clone()).expect("open");
        world.save(&goblin()).expect("save");
        world.instantiate(&goblin(), None, false).expect("spawn");

        let reopened = MemoryWorld::open(&dir, resolver).expect("reopen");
        assert_eq!(reopened.search(Some("goblin")).expect("search").len(), 1);
        assert_eq!(reopened.objects_using("goblin").expect("objects").len(), 1);
        assert_eq!(
            reopened.describe_kind("Monster").as_deref(),
            Some("Hostile creature")
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn open_rejects_missing_directory() {
        let resolver = Arc::new(RhaiFieldResolver::default());
        let error = MemoryWorld::open(Path::new("/definitely/not/here"), resolver)
            .err()
            .expect("missing dir");
        assert_eq!(error.code, "CATALOG_READ");
    }
}
