//! Client for the freshfood food-waste service: a synchronized shopping list,
//! a persisted collection of leftover ingredients (typed in or recognized from
//! a photo), recipe recommendations, and the user's staple ingredients.

pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod ingredients;
pub mod logging;
pub mod recipes;
pub mod shopping;
pub mod staples;
pub mod storage;

pub use error::{Error, Result};
pub use freshfood_types as types;
