//! [`ActorEntity`] implementation for [`Item`], the primary item store's record.

use super::error::ItemError;
use crate::model::{Item, ItemCreate, ItemId, ItemUpdate};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

#[async_trait]
impl ActorEntity for Item {
    type Id = ItemId;
    type Create = ItemCreate;
    type Update = ItemUpdate;
    type Action = ();
    type ActionResult = ();
    type Context = ();
    type Error = ItemError;

    fn from_create_params(id: ItemId, params: ItemCreate) -> Result<Self, ItemError> {
        if !params.window.is_valid() {
            return Err(ItemError::InvalidWindow);
        }
        check_prices(params.price, params.sale_price)?;
        let now = Utc::now();
        Ok(Self {
            id,
            title: params.title,
            description: params.description,
            price: params.price,
            sale_price: params.sale_price,
            stock: params.stock,
            active: params.active,
            window: params.window,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies admin edits. Validation happens before any field is touched.
    async fn on_update(&mut self, update: ItemUpdate, _ctx: &()) -> Result<(), ItemError> {
        if let Some(window) = &update.window {
            if !window.is_valid() {
                return Err(ItemError::InvalidWindow);
            }
        }
        check_prices(
            update.price.unwrap_or(self.price),
            update.sale_price.unwrap_or(self.sale_price),
        )?;

        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(sale_price) = update.sale_price {
            self.sale_price = sale_price;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        if let Some(window) = update.window {
            self.window = window;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    async fn handle_action(&mut self, _action: (), _ctx: &()) -> Result<(), ItemError> {
        Ok(())
    }
}

fn check_prices(price: Decimal, sale_price: Decimal) -> Result<(), ItemError> {
    if price.is_sign_negative() {
        return Err(ItemError::InvalidPrice(price.to_string()));
    }
    if sale_price.is_sign_negative() || sale_price > price {
        return Err(ItemError::InvalidPrice(sale_price.to_string()));
    }
    Ok(())
}
