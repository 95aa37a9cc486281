//! Property-based tests for the consumption optimizer.
//!
//! These hold for every inventory and target, not just the documented
//! scenarios.

use proptest::prelude::*;
use stampwallet_core::{
    config::OptimizerPolicy,
    optimizer::optimize,
    wallet::DenominationStock,
};

// =============================================================================
// Generators
// =============================================================================

fn arb_stock() -> impl Strategy<Value = DenominationStock> {
    (
        prop::sample::select(vec![5u64, 10, 20, 25, 50, 60, 100, 500]),
        0u32..7,
    )
        .prop_map(|(denomination, count)| DenominationStock::new(denomination, count))
}

fn arb_inventory() -> impl Strategy<Value = Vec<DenominationStock>> {
    prop::collection::vec(arb_stock(), 1..5)
}

/// A permissive cap so that rejections come from inventory, not loss.
fn permissive(max_stamps: u32) -> OptimizerPolicy {
    OptimizerPolicy::default()
        .with_max_stamps(max_stamps)
        .with_loss_cap(100_000.0)
}

fn available(inventory: &[DenominationStock], denomination: u64) -> u32 {
    inventory
        .iter()
        .filter(|s| s.denomination == denomination)
        .map(|s| s.count)
        .sum()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn never_undershoots_or_overdraws(
        inventory in arb_inventory(),
        target in 0u64..1500,
        max_stamps in 1u32..9,
    ) {
        if let Ok(best) = optimize(target, &inventory, &permissive(max_stamps)) {
            prop_assert!(best.total_used >= target);
            prop_assert_eq!(best.loss, best.total_used - target);
            prop_assert!(best.stamps_used <= max_stamps);
            for line in &best.lines {
                prop_assert!(line.quantity > 0);
                prop_assert!(line.quantity <= available(&inventory, line.denomination));
            }
        }
    }

    #[test]
    fn same_input_same_combination(
        inventory in arb_inventory(),
        target in 0u64..1500,
        max_stamps in 1u32..9,
    ) {
        let policy = permissive(max_stamps);
        prop_assert_eq!(
            optimize(target, &inventory, &policy),
            optimize(target, &inventory, &policy)
        );
    }

    #[test]
    fn input_order_does_not_matter(
        inventory in arb_inventory(),
        target in 0u64..1500,
    ) {
        let mut reversed = inventory.clone();
        reversed.reverse();
        let policy = permissive(6);
        prop_assert_eq!(
            optimize(target, &inventory, &policy),
            optimize(target, &reversed, &policy)
        );
    }

    #[test]
    fn raising_stamp_cap_never_raises_loss(
        inventory in arb_inventory(),
        target in 1u64..1500,
        max_stamps in 1u32..8,
    ) {
        if let Ok(tight) = optimize(target, &inventory, &permissive(max_stamps)) {
            let loose = optimize(target, &inventory, &permissive(max_stamps + 1));
            prop_assert!(loose.is_ok(), "looser cap rejected: {:?}", loose);
            if let Ok(loose) = loose {
                prop_assert!(loose.loss <= tight.loss);
            }
        }
    }
}
