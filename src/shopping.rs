//! Client-held shopping list, synchronized with the backend.

use crate::api::Api;
use crate::error::{Error, Result};
use crate::flow::{run_cancellable, CancelToken, LoadingFlag};
use crate::logging;
use freshfood_types::{clamp_quantity, NewShoppingItem, ShoppingItem};
use std::sync::Arc;

pub struct ShoppingList<A: Api + ?Sized> {
    api: Arc<A>,
    items: Vec<ShoppingItem>,
    loading: LoadingFlag,
    cancel: CancelToken,
}

impl<A: Api + ?Sized> ShoppingList<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            items: Vec::new(),
            loading: LoadingFlag::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&ShoppingItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    /// Token to cancel when the owning screen goes away.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Replace the local list with the server's.
    pub async fn fetch(&mut self) -> Result<&[ShoppingItem]> {
        let _flow = logging::enter_flow("shopping");
        let items = {
            let _loading = self.loading.begin();
            run_cancellable(&self.cancel, self.api.list_items()).await
        };

        match items {
            Ok(items) => {
                logging::info(&format!("Fetched {} shopping list items", items.len()));
                self.items = items;
                Ok(self.items.as_slice())
            }
            Err(e) => {
                logging::error(&format!("Shopping list fetch failed: {}", e));
                Err(e)
            }
        }
    }

    /// Create an item on the server and append it locally.
    ///
    /// `quantity` is clamped to the accepted range before sending.
    pub async fn add(&mut self, name: &str, quantity: i64) -> Result<ShoppingItem> {
        let _flow = logging::enter_flow("shopping");
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Please enter an item name"));
        }

        let new_item = NewShoppingItem {
            name: name.to_string(),
            quantity: clamp_quantity(quantity),
        };

        let created = {
            let _loading = self.loading.begin();
            run_cancellable(&self.cancel, self.api.add_item(&new_item)).await
        };

        match created {
            Ok(item) => {
                logging::info(&format!("Added item {} ({})", item.id, item.name));
                self.items.push(item.clone());
                Ok(item)
            }
            Err(e) => {
                logging::error(&format!("Adding {:?} failed: {}", new_item.name, e));
                Err(e)
            }
        }
    }

    /// Delete an item on the server, then locally.
    ///
    /// The item stays in the list if the server call fails. An id that is not
    /// in the local list is a no-op and makes no request.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        let _flow = logging::enter_flow("shopping");
        if self.get(id).is_none() {
            logging::debug(&format!("Delete of unknown item {} ignored", id));
            return Ok(());
        }

        let deleted = {
            let _loading = self.loading.begin();
            run_cancellable(&self.cancel, self.api.delete_item(id)).await
        };

        match deleted {
            Ok(()) => {
                self.items.retain(|item| item.id != id);
                Ok(())
            }
            Err(e) => {
                logging::error(&format!("Deleting item {} failed: {}", id, e));
                Err(e)
            }
        }
    }

    /// Change an item's quantity locally and on the server.
    ///
    /// The local change is applied first and rolled back if the server
    /// rejects it.
    pub async fn update_quantity(&mut self, id: i64, quantity: i64) -> Result<ShoppingItem> {
        let _flow = logging::enter_flow("shopping");
        let quantity = clamp_quantity(quantity);
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return Err(Error::validation(format!("No shopping list item with id {}", id)));
        };

        let previous = self.items[index].quantity;
        if previous == quantity {
            return Ok(self.items[index].clone());
        }
        self.items[index].quantity = quantity;

        let updated = {
            let _loading = self.loading.begin();
            run_cancellable(&self.cancel, self.api.update_item_quantity(id, quantity)).await
        };

        if let Err(e) = updated {
            logging::error(&format!("Updating quantity of item {} failed: {}", id, e));
            self.items[index].quantity = previous;
            return Err(e);
        }

        Ok(self.items[index].clone())
    }
}
