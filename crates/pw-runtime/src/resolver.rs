use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::{Mutex, OnceLock};

use pw_core::{PwValue, WizardError};
use regex::Regex;
use rhai::{Array, Dynamic, EvalAltResult, ImmutableString, Map, Position, FLOAT, INT};

use crate::rng::{next_random_bounded, DEFAULT_SEED};
use crate::services::{FieldResolver, Resolved};

fn expression_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\$\{([^{}]+)\}").expect("expression regex must compile"))
}

/// Evaluates `${expr}` fragments with rhai. Preview runs use a fixed seed so
/// the same value previews the same way every time.
#[derive(Debug)]
pub struct RhaiFieldResolver {
    rng_state: Mutex<u32>,
}

impl Default for RhaiFieldResolver {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RhaiFieldResolver {
    pub fn new(seed: u32) -> Self {
        Self {
            rng_state: Mutex::new(seed),
        }
    }

    fn resolve_text(&self, text: &str, preview: bool) -> Result<PwValue, WizardError> {
        let regex = expression_regex();
        let mut rng_state = if preview {
            DEFAULT_SEED
        } else {
            *self.rng_state.lock().map_err(|_| poisoned())?
        };

        if let Some(captures) = regex.captures(text) {
            let whole = captures
                .get(0)
                .expect("capture group 0 must exist for each regex capture");
            if whole.start() == 0 && whole.end() == text.len() {
                let expr = captures
                    .get(1)
                    .expect("capture group 1 must exist for each regex capture");
                let value = eval_expression(expr.as_str(), &mut rng_state)?;
                self.store_rng(rng_state, preview)?;
                return Ok(value);
            }
        }

        let mut output = String::new();
        let mut last_index = 0usize;
        for captures in regex.captures_iter(text) {
            let full = captures
                .get(0)
                .expect("capture group 0 must exist for each regex capture");
            let expr = captures
                .get(1)
                .expect("capture group 1 must exist for each regex capture");
            output.push_str(&text[last_index..full.start()]);
            let value = eval_expression(expr.as_str(), &mut rng_state)?;
            output.push_str(&value.to_text());
            last_index = full.end();
        }
        output.push_str(&text[last_index..]);
        self.store_rng(rng_state, preview)?;
        Ok(PwValue::String(output))
    }

    fn store_rng(&self, rng_state: u32, preview: bool) -> Result<(), WizardError> {
        if !preview {
            *self.rng_state.lock().map_err(|_| poisoned())? = rng_state;
        }
        Ok(())
    }

    fn resolve_value(&self, value: &PwValue, preview: bool, warning: &mut Option<String>) -> PwValue {
        match value {
            PwValue::String(text) if expression_regex().is_match(text) => {
                match self.resolve_text(text, preview) {
                    Ok(resolved) => resolved,
                    Err(error) => {
                        warning.get_or_insert(error.message);
                        value.clone()
                    }
                }
            }
            PwValue::Array(items) => PwValue::Array(
                items
                    .iter()
                    .map(|item| self.resolve_value(item, preview, warning))
                    .collect(),
            ),
            PwValue::Map(entries) => PwValue::Map(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), self.resolve_value(item, preview, warning)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl FieldResolver for RhaiFieldResolver {
    fn resolve(&self, value: &PwValue, preview: bool) -> Resolved {
        let mut warning = None;
        let value = self.resolve_value(value, preview, &mut warning);
        Resolved { warning, value }
    }
}

fn poisoned() -> WizardError {
    WizardError::service("SERVICE_UNAVAILABLE", "Resolver random state is poisoned.")
}

fn runtime_error(message: &str) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        Dynamic::from(message.to_string()),
        Position::NONE,
    ))
}

fn eval_expression(expr: &str, rng_state: &mut u32) -> Result<PwValue, WizardError> {
    let mut engine = rhai::Engine::new();
    engine.set_strict_variables(true);

    let shared_rng = Rc::new(RefCell::new(*rng_state));
    let random_rng = Rc::clone(&shared_rng);
    engine.register_fn(
        "random",
        move |bound: INT| -> Result<INT, Box<EvalAltResult>> {
            if bound <= 0 {
                return Err(runtime_error("random(n) expects positive integer n."));
            }
            let mut state = random_rng.borrow_mut();
            Ok(next_random_bounded(&mut state, bound as u32) as INT)
        },
    );
    let choice_rng = Rc::clone(&shared_rng);
    engine.register_fn(
        "choice",
        move |items: Array| -> Result<Dynamic, Box<EvalAltResult>> {
            if items.is_empty() {
                return Err(runtime_error("choice(list) expects a non-empty list."));
            }
            let mut state = choice_rng.borrow_mut();
            let index = next_random_bounded(&mut state, items.len() as u32) as usize;
            Ok(items[index].clone())
        },
    );

    let result = engine
        .eval::<Dynamic>(&format!("({})", expr))
        .map_err(|error| {
            WizardError::input(
                "RESOLVER_EVAL_ERROR",
                format!("Expression \"{}\" failed: {}", expr.trim(), error),
            )
        })
        .and_then(dynamic_to_value);
    *rng_state = *shared_rng.borrow();
    result
}

fn dynamic_to_value(value: Dynamic) -> Result<PwValue, WizardError> {
    if value.is_unit() {
        return Ok(PwValue::Null);
    }
    if value.is::<bool>() {
        return Ok(PwValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(PwValue::Number(value.cast::<INT>() as f64));
    }
    if value.is::<FLOAT>() {
        return Ok(PwValue::Number(value.cast::<FLOAT>()));
    }
    if value.is::<ImmutableString>() {
        return Ok(PwValue::String(value.cast::<ImmutableString>().to_string()));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_value(item)?);
        }
        return Ok(PwValue::Array(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, item) in map {
            out.insert(key.to_string(), dynamic_to_value(item)?);
        }
        return Ok(PwValue::Map(out));
    }

    Err(WizardError::input(
        "RESOLVER_VALUE_UNSUPPORTED",
        "Expression produced an unsupported value type.",
    ))
}
