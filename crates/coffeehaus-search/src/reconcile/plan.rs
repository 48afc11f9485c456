//! Pure create/update/skip decisions for a batch of directory records.

use std::collections::HashMap;

use coffeehaus_core::{needs_update, ExistingShopSnapshot, SyncInput};

/// Writes a batch needs, decided against the stored snapshots.
#[derive(Debug, Default)]
pub(crate) struct SyncPlan {
    pub to_create: Vec<SyncInput>,
    pub to_update: Vec<SyncInput>,
    pub unchanged: usize,
}

/// Collapses inputs sharing an external id. The last occurrence wins and
/// takes the position of the first.
pub(crate) fn dedupe_last_wins(inputs: Vec<SyncInput>) -> Vec<SyncInput> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(inputs.len());
    let mut unique: Vec<SyncInput> = Vec::with_capacity(inputs.len());

    for input in inputs {
        match positions.get(&input.external_id) {
            Some(&at) => unique[at] = input,
            None => {
                positions.insert(input.external_id.clone(), unique.len());
                unique.push(input);
            }
        }
    }
    unique
}

/// Partitions `inputs` into creates (no snapshot), updates (snapshot differs)
/// and no-ops.
pub(crate) fn plan(inputs: Vec<SyncInput>, snapshots: &[ExistingShopSnapshot]) -> SyncPlan {
    let by_id: HashMap<&str, &ExistingShopSnapshot> = snapshots
        .iter()
        .map(|snapshot| (snapshot.external_id.as_str(), snapshot))
        .collect();

    let mut plan = SyncPlan::default();
    for input in inputs {
        match by_id.get(input.external_id.as_str()) {
            None => plan.to_create.push(input),
            Some(snapshot) if needs_update(snapshot, &input) => plan.to_update.push(input),
            Some(_) => plan.unchanged += 1,
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffeehaus_core::ShopListing;
    use uuid::Uuid;

    fn input(id: &str, name: &str, rating: f32) -> SyncInput {
        SyncInput::new(
            id,
            ShopListing {
                name: name.to_string(),
                rating,
                ..ShopListing::default()
            },
        )
    }

    fn snapshot_of(input: &SyncInput) -> ExistingShopSnapshot {
        ExistingShopSnapshot {
            id: Uuid::new_v4(),
            external_id: input.external_id.clone(),
            name: input.listing.name.clone(),
            formatted_address: input.listing.formatted_address.clone(),
            vicinity: input.listing.vicinity.clone(),
            rating: input.listing.rating,
            ratings_total: input.listing.ratings_total,
            price_level: input.listing.price_level,
            website: input.listing.website.clone(),
            formatted_phone: input.listing.formatted_phone.clone(),
            business_status: input.listing.business_status.clone(),
        }
    }

    #[test]
    fn dedupe_keeps_last_value_at_first_position() {
        let deduped = dedupe_last_wins(vec![
            input("a", "First A", 4.0),
            input("b", "B", 4.0),
            input("a", "Second A", 4.5),
        ]);

        let ids: Vec<&str> = deduped.iter().map(|i| i.external_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(deduped[0].listing.name, "Second A");
    }

    #[test]
    fn plan_partitions_create_update_and_unchanged() {
        let same = input("same", "Same", 4.2);
        let changed = input("changed", "Changed", 4.7);
        let fresh = input("fresh", "Fresh", 4.0);

        let mut stale = snapshot_of(&changed);
        stale.rating = 4.1;
        let snapshots = vec![snapshot_of(&same), stale];

        let plan = plan(vec![same, changed, fresh], &snapshots);

        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].external_id, "fresh");
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].external_id, "changed");
        assert_eq!(plan.unchanged, 1);
    }

    #[test]
    fn zero_and_empty_input_fields_do_not_force_an_update() {
        let stored = input("p1", "Stored Name", 4.4);
        let snapshot = snapshot_of(&stored);
        let sparse = input("p1", "", 0.0);

        let plan = plan(vec![sparse], &[snapshot]);

        assert!(plan.to_update.is_empty());
        assert_eq!(plan.unchanged, 1);
    }
}
