#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Named, capped item counts held by the player.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised by an [`ItemStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// The item was registered twice.
    #[error("item `{0}` is already registered")]
    Duplicate(String),
    /// The item was never registered.
    #[error("item `{0}` is not registered")]
    Unknown(String),
}

/// Count and capacity of one registered item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    count: u32,
    max: u32,
}

impl ItemStack {
    /// Units currently held.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Largest count the stack can reach.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }
}

/// Starting entry for an inventory, as found in configuration files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Inventory key.
    pub name: String,
    /// Capacity.
    pub max: u32,
    /// Initial count, clamped to `max`.
    pub count: u32,
}

/// Storage of named item counts.
pub trait ItemStore {
    /// Adds a new item with the provided capacity and initial count.
    fn register(&mut self, name: &str, max: u32, count: u32) -> Result<(), InventoryError>;

    /// Reports whether at least one unit of `name` is held.
    fn check_available(&self, name: &str) -> bool;

    /// Adds units up to the item capacity and returns the new count.
    fn add(&mut self, name: &str, quantity: u32) -> Result<u32, InventoryError>;

    /// Removes units, stopping at zero, and returns the new count.
    fn remove(&mut self, name: &str, quantity: u32) -> Result<u32, InventoryError>;

    /// Units of `name` currently held.
    fn quantity(&self, name: &str) -> Result<u32, InventoryError>;
}

/// In-memory [`ItemStore`] ordered by item name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    items: BTreeMap<String, ItemStack>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an inventory from configured entries.
    pub fn from_specs<'a, I>(specs: I) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = &'a ItemSpec>,
    {
        let mut inventory = Self::new();
        for spec in specs {
            inventory.register(&spec.name, spec.max, spec.count)?;
        }
        Ok(inventory)
    }

    /// Stack registered under `name`.
    #[must_use]
    pub fn stack(&self, name: &str) -> Option<&ItemStack> {
        self.items.get(name)
    }

    /// Registered items in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemStack)> {
        self.items.iter().map(|(name, stack)| (name.as_str(), stack))
    }

    fn stack_mut(&mut self, name: &str) -> Result<&mut ItemStack, InventoryError> {
        self.items
            .get_mut(name)
            .ok_or_else(|| InventoryError::Unknown(name.to_owned()))
    }
}

impl ItemStore for Inventory {
    fn register(&mut self, name: &str, max: u32, count: u32) -> Result<(), InventoryError> {
        if self.items.contains_key(name) {
            return Err(InventoryError::Duplicate(name.to_owned()));
        }
        let _ = self.items.insert(
            name.to_owned(),
            ItemStack {
                count: count.min(max),
                max,
            },
        );
        Ok(())
    }

    fn check_available(&self, name: &str) -> bool {
        self.items.get(name).is_some_and(|stack| stack.count > 0)
    }

    fn add(&mut self, name: &str, quantity: u32) -> Result<u32, InventoryError> {
        let stack = self.stack_mut(name)?;
        stack.count = stack.count.saturating_add(quantity).min(stack.max);
        Ok(stack.count)
    }

    fn remove(&mut self, name: &str, quantity: u32) -> Result<u32, InventoryError> {
        let stack = self.stack_mut(name)?;
        if quantity > stack.count {
            tracing::debug!(item = name, held = stack.count, quantity, "removal exceeds held count");
        }
        stack.count = stack.count.saturating_sub(quantity);
        Ok(stack.count)
    }

    fn quantity(&self, name: &str) -> Result<u32, InventoryError> {
        self.items
            .get(name)
            .map(ItemStack::count)
            .ok_or_else(|| InventoryError::Unknown(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Inventory, InventoryError, ItemSpec, ItemStore};

    fn stocked() -> Inventory {
        let mut inventory = Inventory::new();
        inventory.register("DirtBlock", 64, 10).expect("register dirt");
        inventory.register("Stone", 5, 0).expect("register stone");
        inventory
    }

    #[test]
    fn add_clamps_to_capacity() {
        let mut inventory = stocked();
        assert_eq!(inventory.add("DirtBlock", 50), Ok(60));
        assert_eq!(inventory.add("DirtBlock", 50), Ok(64));
        assert_eq!(inventory.add("Stone", u32::MAX), Ok(5));
    }

    #[test]
    fn remove_stops_at_zero() {
        let mut inventory = stocked();
        assert_eq!(inventory.remove("DirtBlock", 4), Ok(6));
        assert_eq!(inventory.remove("DirtBlock", 40), Ok(0));
        assert!(!inventory.check_available("DirtBlock"));
    }

    #[test]
    fn availability_needs_a_positive_count() {
        let inventory = stocked();
        assert!(inventory.check_available("DirtBlock"));
        assert!(!inventory.check_available("Stone"));
        assert!(!inventory.check_available("Cheese"));
    }

    #[test]
    fn unknown_and_duplicate_items_are_errors() {
        let mut inventory = stocked();
        assert_eq!(
            inventory.register("Stone", 5, 1),
            Err(InventoryError::Duplicate("Stone".into()))
        );
        assert_eq!(
            inventory.add("Cheese", 1),
            Err(InventoryError::Unknown("Cheese".into()))
        );
        assert_eq!(
            inventory.quantity("Cheese"),
            Err(InventoryError::Unknown("Cheese".into()))
        );
    }

    #[test]
    fn specs_register_in_name_order_with_clamped_counts() {
        let specs = [
            ItemSpec {
                name: "Stone".into(),
                max: 3,
                count: 9,
            },
            ItemSpec {
                name: "Cheese".into(),
                max: 10,
                count: 1,
            },
        ];
        let inventory = Inventory::from_specs(&specs).expect("inventory");
        let names: Vec<_> = inventory.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Cheese", "Stone"]);
        assert_eq!(inventory.stack("Stone").map(|stack| stack.count()), Some(3));
    }
}
