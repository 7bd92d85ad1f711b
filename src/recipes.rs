//! Ranked recipe list returned by a recommendation, with on-demand detail.

use crate::api::Api;
use crate::error::{Error, Result};
use crate::flow::{run_cancellable, CancelToken, LoadingFlag};
use crate::logging;
use freshfood_types::{RecipeDetail, RecipeId, RecipeSummary};
use std::sync::Arc;

pub struct RecipeBrowser<A: Api + ?Sized> {
    api: Arc<A>,
    recipes: Vec<RecipeSummary>,
    detail_loading: LoadingFlag,
    cancel: CancelToken,
}

impl<A: Api + ?Sized> RecipeBrowser<A> {
    /// Browse the summaries exactly in the order the server ranked them.
    pub fn new(api: Arc<A>, recipes: Vec<RecipeSummary>) -> Self {
        Self {
            api,
            recipes,
            detail_loading: LoadingFlag::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn recipes(&self) -> &[RecipeSummary] {
        &self.recipes
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Summary at a 1-based rank.
    pub fn by_rank(&self, rank: usize) -> Option<&RecipeSummary> {
        rank.checked_sub(1).and_then(|i| self.recipes.get(i))
    }

    /// False while a detail fetch is in flight.
    pub fn selection_enabled(&self) -> bool {
        !self.detail_loading.is_loading()
    }

    pub fn loading_flag(&self) -> LoadingFlag {
        self.detail_loading.clone()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Fetch the full record of one recipe.
    ///
    /// Only one fetch may run at a time; a second call while one is in flight
    /// fails with [`Error::Busy`]. The result is never cached.
    pub async fn fetch_detail(&self, recipe_id: &RecipeId) -> Result<RecipeDetail> {
        let _flow = logging::enter_flow("recipes");
        if recipe_id.is_blank() {
            logging::warn("Recipe selected without an id");
            return Err(Error::validation("Recipe id is missing"));
        }

        let detail = {
            let _loading = self.detail_loading.try_begin("Loading a recipe")?;
            run_cancellable(&self.cancel, self.api.recipe_detail(recipe_id)).await
        };

        match detail {
            Ok(detail) => Ok(detail),
            Err(Error::Cancelled) => {
                logging::debug(&format!("Dropped late detail for recipe {}", recipe_id));
                Err(Error::Cancelled)
            }
            Err(e) => {
                logging::error(&format!("Fetching recipe {} failed: {}", recipe_id, e));
                Err(e)
            }
        }
    }
}

impl<A: Api + ?Sized> Drop for RecipeBrowser<A> {
    fn drop(&mut self) {
        // Anything still awaiting a clone of the token gives up.
        self.cancel.cancel();
    }
}
