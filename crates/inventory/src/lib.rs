//! Inventory: bounded item slots, equip slots, and the transitions that move
//! items between stored, carried and in-world states.
//!
//! # Invariants
//! - A container never holds more slots than its capacity; slot indexes are
//!   fixed at creation and never reused.
//! - Every transition either completes or leaves the container, the
//!   equipment and the world exactly as they were.
//! - The world is always passed in explicitly as a [`GridWorld`].
//!
//! [`GridWorld`]: homestead_kernel::GridWorld

mod actions;
mod config;
mod container;
mod equipment;
mod error;

pub use actions::PlacementTarget;
pub use config::InventoryConfig;
pub use container::{ContainerEvent, InventoryContainer, InventorySlot};
pub use equipment::EquipmentMap;
pub use error::InventoryError;

pub fn crate_info() -> &'static str {
    "homestead-inventory v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("inventory"));
    }
}
