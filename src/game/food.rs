use super::codec::encode_point;
use super::constants::MAX_FOOD_ATTEMPTS;
use super::occupancy::OccupancyModel;
use super::types::{Bounds, Coordinate, PlayerId};
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::HashMap;

/// One food cell per player. Only the owner relocates its own entry.
#[derive(Debug, Default)]
pub struct FoodRegistry {
    foods: HashMap<PlayerId, Coordinate>,
}

impl FoodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks a free cell for `owner_id` and stores it.
    ///
    /// Rejection-samples up to `MAX_FOOD_ATTEMPTS` times, then falls back to
    /// choosing among every free cell. Returns `None` and forgets the owner's
    /// food when the board has no free cell left.
    pub fn place_food<R: Rng>(
        &mut self,
        owner_id: PlayerId,
        bounds: Bounds,
        occupancy: &OccupancyModel,
        own_head: Coordinate,
        rng: &mut R,
    ) -> Option<Coordinate> {
        let is_free =
            |cell: Coordinate| cell != own_head && !occupancy.is_occupied(encode_point(cell));

        if bounds.width <= 0 || bounds.height <= 0 {
            self.foods.remove(&owner_id);
            return None;
        }

        let sampled = (0..MAX_FOOD_ATTEMPTS)
            .map(|_| {
                Coordinate::new(
                    rng.gen_range(0..bounds.width),
                    rng.gen_range(0..bounds.height),
                )
            })
            .find(|cell| is_free(*cell));

        let placed = match sampled {
            Some(cell) => Some(cell),
            None => {
                tracing::debug!(owner_id, "food sampling exhausted, scanning free cells");
                bounds.cells().filter(|cell| is_free(*cell)).choose(rng)
            }
        };

        match placed {
            Some(cell) => {
                self.foods.insert(owner_id, cell);
            }
            None => {
                tracing::warn!(owner_id, "no free cell left for food");
                self.foods.remove(&owner_id);
            }
        }
        placed
    }

    /// Stores a food reported by its owner, returning the one it replaces.
    pub fn set(&mut self, owner_id: PlayerId, food: Coordinate) -> Option<Coordinate> {
        self.foods.insert(owner_id, food)
    }

    pub fn get(&self, owner_id: PlayerId) -> Option<Coordinate> {
        self.foods.get(&owner_id).copied()
    }

    #[cfg(test)]
    pub fn contains(&self, owner_id: PlayerId) -> bool {
        self.foods.contains_key(&owner_id)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, Coordinate)> + '_ {
        self.foods.iter().map(|(id, food)| (*id, *food))
    }
}
