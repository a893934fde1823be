use std::path::{Path, PathBuf};

use pw_api::open_catalog;
use pw_core::WizardError;

use crate::{map_cli_catalog_path, LoadedCatalog};

const CATALOG_REF_PREFIX: &str = "catalog-dir:";

pub(crate) fn load_catalog_by_dir(catalog_dir: &str) -> Result<LoadedCatalog, WizardError> {
    let dir = resolve_catalog_dir(catalog_dir)?;
    let services = open_catalog(&dir)?;
    Ok(LoadedCatalog {
        id: make_catalog_id(&dir),
        dir,
        services,
    })
}

pub(crate) fn load_catalog_by_ref(catalog_ref: &str) -> Result<LoadedCatalog, WizardError> {
    let Some(raw) = catalog_ref.strip_prefix(CATALOG_REF_PREFIX) else {
        return Err(WizardError::input(
            "CLI_CATALOG_REF_INVALID",
            format!("Unsupported catalog ref: {}", catalog_ref),
        ));
    };
    load_catalog_by_dir(raw)
}

pub(crate) fn resolve_catalog_dir(catalog_dir: &str) -> Result<PathBuf, WizardError> {
    let path = PathBuf::from(catalog_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_catalog_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(WizardError::input(
            "CLI_CATALOG_NOT_FOUND",
            format!("catalog does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(WizardError::input(
            "CLI_CATALOG_NOT_DIR",
            format!("catalog is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

pub(crate) fn make_catalog_id(catalog_dir: &Path) -> String {
    format!("{}{}", CATALOG_REF_PREFIX, catalog_dir.display())
}
