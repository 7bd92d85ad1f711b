//! The working ingredient collection behind the leftover recommender.
//!
//! Ingredients arrive two ways: typed in by the user, or recognized in a
//! photo and confirmed from a selection. The collection never holds two
//! entries with the same name and is written to local storage after every
//! change, so it survives restarts until a recommendation consumes it.

use crate::api::{Api, ImageUpload};
use crate::error::{Error, Result};
use crate::flow::{run_cancellable, CancelToken, LoadingFlag};
use crate::logging;
use crate::storage::Storage;
use freshfood_types::{Ingredient, RecipeSummary, StagedIngredient};
use std::sync::Arc;

/// Storage key of the persisted working collection.
pub const STORAGE_KEY: &str = "leftover_ingredients";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Recognized names waiting for the user to pick from.
    SelectionPending(Vec<StagedIngredient>),
}

pub struct IngredientCollection<A: Api + ?Sized> {
    api: Arc<A>,
    storage: Storage,
    working: Vec<Ingredient>,
    phase: Phase,
    loading: LoadingFlag,
    cancel: CancelToken,
}

impl<A: Api + ?Sized> IngredientCollection<A> {
    /// Start the flow, seeded with whatever was persisted last time.
    ///
    /// A missing or unreadable file starts an empty collection.
    pub async fn open(api: Arc<A>, storage: Storage) -> Self {
        let _flow = logging::enter_flow("ingredients");
        let working = match storage.load::<Vec<Ingredient>>(STORAGE_KEY).await {
            Ok(Some(stored)) => renumber(dedup_by_name(stored)),
            Ok(None) => Vec::new(),
            Err(e) => {
                logging::error(&format!("Ignoring stored ingredients: {:#}", e));
                Vec::new()
            }
        };
        logging::info(&format!("Loaded {} stored ingredients", working.len()));

        Self {
            api,
            storage,
            working,
            phase: Phase::Idle,
            loading: LoadingFlag::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.working
    }

    pub fn names(&self) -> Vec<String> {
        self.working.iter().map(|i| i.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.working.iter().any(|i| i.name == name)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Names staged by the last recognition, empty unless a selection is pending.
    pub fn staged(&self) -> &[StagedIngredient] {
        match &self.phase {
            Phase::SelectionPending(staged) => staged,
            Phase::Idle => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Add a typed-in ingredient.
    ///
    /// If the name is already in the collection the existing entry is
    /// returned and nothing changes.
    pub async fn add(&mut self, name: &str) -> Result<Ingredient> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Please enter an ingredient name"));
        }
        if let Some(existing) = self.working.iter().find(|i| i.name == name) {
            return Ok(existing.clone());
        }

        let ingredient = self.push(name.to_string())?;
        self.persist().await?;
        Ok(ingredient)
    }

    /// Remove an ingredient by id. Unknown ids are a no-op.
    pub async fn remove(&mut self, id: u32) -> Result<()> {
        let before = self.working.len();
        self.working.retain(|i| i.id != id);
        if self.working.len() != before {
            self.persist().await?;
        }
        Ok(())
    }

    /// Send a photo for recognition and stage the names it returns.
    ///
    /// On failure nothing is staged and the flow is back to idle.
    pub async fn upload(&mut self, image: &ImageUpload) -> Result<&[StagedIngredient]> {
        let _flow = logging::enter_flow("ingredients");
        if !matches!(self.phase, Phase::Idle) {
            return Err(Error::validation(
                "Confirm or cancel the current selection before scanning again",
            ));
        }

        let recognized = {
            let _loading = self.loading.begin();
            run_cancellable(&self.cancel, self.api.recognize_ingredients(image)).await
        };

        match recognized {
            Ok(names) => {
                logging::info(&format!("Recognized ingredients: {}", names.join(", ")));
                self.phase = Phase::SelectionPending(stage(names));
                Ok(self.staged())
            }
            Err(e) => {
                logging::error(&format!("Image recognition failed: {}", e));
                self.phase = Phase::Idle;
                Err(e)
            }
        }
    }

    /// Flip the selection of one staged name. Returns the new state.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        let Phase::SelectionPending(staged) = &mut self.phase else {
            return Err(Error::validation("No recognized ingredients to select"));
        };
        let entry = staged
            .get_mut(index)
            .ok_or_else(|| Error::validation(format!("No recognized ingredient at {}", index)))?;
        entry.selected = !entry.selected;
        Ok(entry.selected)
    }

    pub fn select_all(&mut self) {
        if let Phase::SelectionPending(staged) = &mut self.phase {
            for entry in staged.iter_mut() {
                entry.selected = true;
            }
        }
    }

    /// Merge the selected names into the collection and return what was added.
    ///
    /// Names already present are skipped.
    pub async fn confirm(&mut self) -> Result<Vec<Ingredient>> {
        let staged = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::SelectionPending(staged) => staged,
            Phase::Idle => {
                return Err(Error::validation("No recognized ingredients to confirm"));
            }
        };

        let mut added = Vec::new();
        for entry in staged.into_iter().filter(|e| e.selected) {
            if !self.contains(&entry.name) {
                added.push(self.push(entry.name)?);
            }
        }

        if !added.is_empty() {
            self.persist().await?;
        }
        Ok(added)
    }

    /// Drop the staged names without merging anything.
    pub fn cancel_selection(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Ask for recipes using the whole collection.
    ///
    /// On success the collection is consumed: emptied in memory and removed
    /// from storage. On failure it is left as it was.
    pub async fn recommend(&mut self) -> Result<Vec<RecipeSummary>> {
        let _flow = logging::enter_flow("recommendation");
        let names = self.names();
        if names.is_empty() {
            return Err(Error::validation("Please add at least one ingredient"));
        }

        let recipes = {
            let _loading = self.loading.begin();
            run_cancellable(&self.cancel, self.api.recommend(&names)).await
        };

        let recipes = match recipes {
            Ok(recipes) => recipes,
            Err(e) => {
                logging::error(&format!("Recommendation failed: {}", e));
                return Err(e);
            }
        };

        logging::info(&format!(
            "Received {} recipes for {} ingredients",
            recipes.len(),
            names.len()
        ));
        self.working.clear();
        self.phase = Phase::Idle;
        // Recipes are handed back even if the stored file lingers.
        if let Err(e) = self.storage.remove(STORAGE_KEY).await {
            logging::warn(&format!("Clearing stored ingredients failed: {:#}", e));
        }
        Ok(recipes)
    }

    fn push(&mut self, name: String) -> Result<Ingredient> {
        let id = self
            .working
            .iter()
            .map(|i| i.id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| Error::validation("Too many ingredients"))?;
        let ingredient = Ingredient { id, name };
        self.working.push(ingredient.clone());
        Ok(ingredient)
    }

    async fn persist(&self) -> Result<()> {
        if let Err(e) = self.storage.save(STORAGE_KEY, &self.working).await {
            logging::error(&format!("Persisting ingredients failed: {:#}", e));
            return Err(e.into());
        }
        Ok(())
    }
}

/// Stage recognized names: trimmed, blanks dropped, first occurrence kept.
fn stage(names: Vec<String>) -> Vec<StagedIngredient> {
    let mut staged: Vec<StagedIngredient> = Vec::new();
    for name in names {
        let name = name.trim();
        if name.is_empty() || staged.iter().any(|s| s.name == name) {
            continue;
        }
        staged.push(StagedIngredient::new(name));
    }
    staged
}

fn dedup_by_name(ingredients: Vec<Ingredient>) -> Vec<Ingredient> {
    let mut kept: Vec<Ingredient> = Vec::with_capacity(ingredients.len());
    for ingredient in ingredients {
        if !kept.iter().any(|k| k.name == ingredient.name) {
            kept.push(ingredient);
        }
    }
    kept
}

/// Reassign ids as `1..=n` in stored order.
fn renumber(ingredients: Vec<Ingredient>) -> Vec<Ingredient> {
    ingredients
        .into_iter()
        .zip(1..)
        .map(|(ingredient, id)| Ingredient { id, ..ingredient })
        .collect()
}
