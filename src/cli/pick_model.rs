//! Interactive model selection for a persona.
//!
//! Used when `-m` is passed, and in query mode when the persona's model is
//! unset or no longer offered by its endpoint.

use std::error::Error;
use std::io::{BufRead, Write};

use crate::core::client::GenerativeApi;
use crate::core::config::Persona;
use crate::core::persona::PersonaStore;

/// Make sure `persona` names a model its endpoint offers, asking the user
/// when it does not (or always, when `force` is set). The choice is saved.
/// Returns whether the model changed.
pub async fn ensure_model(
    api: &mut dyn GenerativeApi,
    store: &mut PersonaStore,
    persona: &mut Persona,
    force: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<bool, Box<dyn Error>> {
    let models = api.list_models().await?;
    if models.is_empty() {
        return Err("no models found".into());
    }

    if !force && !persona.model.is_empty() && models.contains(&persona.model) {
        return Ok(false);
    }

    let model = choose_model(&models, input, out)?;
    store.update_model(&persona.name, &model)?;
    api.select_model(&model);
    persona.model = model;
    Ok(true)
}

/// Returned when the choice cannot be read, as when stdin was piped in and
/// has already been consumed as the prompt.
pub const NO_TERMINAL: &str =
    "Model selection needs a terminal. Run meh --select-model without piped input.";

/// Print a numbered list and read the choice. A single model is picked
/// without asking.
pub fn choose_model(
    models: &[String],
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<String, Box<dyn Error>> {
    if let [only] = models {
        return Ok(only.clone());
    }

    writeln!(out, "Available models:")?;
    for (i, model) in models.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, model)?;
    }
    write!(out, "Select a model (enter the number): ")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(out)?;
        return Err(NO_TERMINAL.into());
    }
    let choice: usize = line.trim().parse().map_err(|_| "Invalid choice")?;

    if choice == 0 || choice > models.len() {
        return Err("Invalid choice".into());
    }

    Ok(models[choice - 1].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigStore;
    use crate::utils::test_utils::{test_persona, FakeApi};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|m| m.to_string()).collect()
    }

    fn store_with(dir: &TempDir, persona: &Persona) -> PersonaStore {
        let mut store = PersonaStore::load(ConfigStore::new(dir.path().join("config.toml"))).unwrap();
        store.add(persona.clone(), true).unwrap();
        store
    }

    #[test]
    fn single_model_is_picked_without_prompting() {
        let mut out = Vec::new();
        let choice = choose_model(&models(&["llama3"]), &mut Cursor::new(""), &mut out).unwrap();
        assert_eq!(choice, "llama3");
        assert!(out.is_empty());
    }

    #[test]
    fn choice_is_one_based() {
        let mut out = Vec::new();
        let choice =
            choose_model(&models(&["a", "b", "c"]), &mut Cursor::new("2\n"), &mut out).unwrap();
        assert_eq!(choice, "b");
        assert!(String::from_utf8(out).unwrap().contains("  3. c"));
    }

    #[test]
    fn out_of_range_choice_is_rejected() {
        let list = models(&["a", "b"]);
        for answer in ["0\n", "3\n", "two\n"] {
            let err = choose_model(&list, &mut Cursor::new(answer), &mut Vec::new()).unwrap_err();
            assert_eq!(err.to_string(), "Invalid choice");
        }
    }

    #[test]
    fn exhausted_input_asks_for_a_terminal() {
        let err = choose_model(&models(&["a", "b"]), &mut Cursor::new(""), &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.to_string(), NO_TERMINAL);
    }

    #[tokio::test]
    async fn stale_model_with_piped_query_names_the_fix() {
        let dir = TempDir::new().unwrap();
        let mut persona = test_persona("dev");
        persona.model = "gone".into();
        let mut store = store_with(&dir, &persona);
        let mut api = FakeApi::with_models(&["m1", "m2"]);

        let err = ensure_model(&mut api, &mut store, &mut persona, false, &mut Cursor::new(""), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--select-model"));
        assert_eq!(store.find("dev").unwrap().model, "gone");
    }

    #[tokio::test]
    async fn empty_listing_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut persona = test_persona("dev");
        let mut store = store_with(&dir, &persona);
        let mut api = FakeApi::with_models(&[]);

        let err = ensure_model(&mut api, &mut store, &mut persona, false, &mut Cursor::new(""), &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no models found");
    }

    #[tokio::test]
    async fn offered_model_is_kept() {
        let dir = TempDir::new().unwrap();
        let mut persona = test_persona("dev");
        let mut store = store_with(&dir, &persona);
        let mut api = FakeApi::with_models(&["m1", "m2"]);

        let changed = ensure_model(&mut api, &mut store, &mut persona, false, &mut Cursor::new(""), &mut Vec::new())
            .await
            .unwrap();
        assert!(!changed);
        assert_eq!(persona.model, "m1");
    }

    #[tokio::test]
    async fn missing_model_is_replaced_and_saved() {
        let dir = TempDir::new().unwrap();
        let mut persona = test_persona("dev");
        persona.model = "gone".into();
        let mut store = store_with(&dir, &persona);
        let mut api = FakeApi::with_models(&["m1", "m2"]);

        let changed = ensure_model(&mut api, &mut store, &mut persona, false, &mut Cursor::new("2\n"), &mut Vec::new())
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(persona.model, "m2");

        let reloaded = PersonaStore::load(ConfigStore::new(dir.path().join("config.toml"))).unwrap();
        assert_eq!(reloaded.find("dev").unwrap().model, "m2");
    }

    #[tokio::test]
    async fn forced_selection_asks_even_when_valid() {
        let dir = TempDir::new().unwrap();
        let mut persona = test_persona("dev");
        let mut store = store_with(&dir, &persona);
        let mut api = FakeApi::with_models(&["m1", "m2"]);

        ensure_model(&mut api, &mut store, &mut persona, true, &mut Cursor::new("2\n"), &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(persona.model, "m2");
    }
}
