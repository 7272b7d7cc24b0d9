//! National pricing: regular price, discount price and the on-offer flag.

use crate::error::{CoreError, Result};
use crate::model::{Money, Product};
use crate::storage::{RecordSource, Store};
use serde::Deserialize;

/// A requested price change for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PriceUpdate {
    pub price: Money,
    #[serde(default)]
    pub discount_price: Option<Money>,
    #[serde(default)]
    pub on_offer: bool,
}

impl PriceUpdate {
    /// Price must be positive; an offer needs a positive discount below it.
    pub fn validate(&self) -> Result<()> {
        if !self.price.is_positive() {
            return Err(CoreError::validation("Price must be greater than 0"));
        }
        if self.on_offer {
            match self.discount_price {
                Some(discount) if discount.is_positive() && discount < self.price => {}
                _ => {
                    return Err(CoreError::validation(
                        "Discount price must be greater than 0 and less than the regular price",
                    ));
                }
            }
        }
        Ok(())
    }

    /// The discount kept after the update: only offers carry one.
    #[must_use]
    pub fn stored_discount(&self) -> Option<Money> {
        if self.on_offer {
            self.discount_price
        } else {
            None
        }
    }
}

/// Apply a validated price change. `on_offer` follows the stored discount.
pub fn update_price(store: &Store, product_id: u64, update: PriceUpdate) -> Result<Product> {
    update.validate()?;
    store.write(|txn| {
        txn.update::<Product>(product_id, |product| {
            product.price = update.price;
            product.discount_price = update.stored_discount();
            product.on_offer = product.discount_price.is_some();
            Ok(())
        })
    })
}

/// The catalogue ordered by product name.
pub fn list_products(source: &impl RecordSource) -> Result<Vec<Product>> {
    let mut products: Vec<Product> = source.list()?;
    products.sort_by(|a, b| a.name.cmp(&b.name).then(a.product_id.cmp(&b.product_id)));
    Ok(products)
}
