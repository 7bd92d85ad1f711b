//! Staple ingredients: things the user always has at home, kept server-side.

use crate::api::Api;
use crate::error::{Error, Result};
use crate::flow::{run_cancellable, CancelToken, LoadingFlag};
use crate::logging;
use std::sync::Arc;

pub struct Staples<A: Api + ?Sized> {
    api: Arc<A>,
    names: Vec<String>,
    loading: LoadingFlag,
    cancel: CancelToken,
}

impl<A: Api + ?Sized> Staples<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            names: Vec::new(),
            loading: LoadingFlag::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub async fn fetch(&mut self) -> Result<&[String]> {
        let _flow = logging::enter_flow("staples");
        let names = {
            let _loading = self.loading.begin();
            run_cancellable(&self.cancel, self.api.staples()).await
        }
        .inspect_err(|e| logging::error(&format!("Fetching staples failed: {}", e)))?;

        self.names = names;
        Ok(self.names.as_slice())
    }

    /// Add a staple, then reload the list from the server.
    pub async fn add(&mut self, name: &str) -> Result<&[String]> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Please enter an ingredient name."));
        }

        let result = {
            let _loading = self.loading.begin();
            run_cancellable(&self.cancel, self.api.add_staple(name)).await
        };
        result.inspect_err(|e| logging::error(&format!("Adding staple {:?} failed: {}", name, e)))?;

        logging::info(&format!("{} added to staples", name));
        self.fetch().await
    }

    /// Remove a staple, then reload the list from the server.
    pub async fn remove(&mut self, name: &str) -> Result<&[String]> {
        if name.trim().is_empty() {
            return Err(Error::validation("Please choose a staple to remove."));
        }

        let result = {
            let _loading = self.loading.begin();
            run_cancellable(&self.cancel, self.api.remove_staple(name)).await
        };
        result.inspect_err(|e| logging::error(&format!("Removing staple {:?} failed: {}", name, e)))?;

        self.fetch().await
    }

    /// Remove every staple.
    pub async fn clear(&mut self) -> Result<()> {
        let result = {
            let _loading = self.loading.begin();
            run_cancellable(&self.cancel, self.api.clear_staples()).await
        };
        result.inspect_err(|e| logging::error(&format!("Clearing staples failed: {}", e)))?;

        self.names.clear();
        Ok(())
    }
}
