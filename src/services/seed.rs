//! Demo pet catalogue for local runs with the in-memory store

use crate::models::Pet;

const NAMES: &[&str] = &[
    "Buddy", "Luna", "Max", "Bella", "Charlie", "Daisy", "Rocky", "Molly", "Milo", "Coco",
    "Oliver", "Nala", "Teddy", "Ruby", "Leo", "Pepper", "Oscar", "Willow", "Toby", "Hazel",
];

const CATALOGUE: &[(&str, &[&str])] = &[
    ("Dog", &["Labrador", "German Shepherd", "Golden Retriever", "Beagle", "Poodle"]),
    ("Cat", &["Siamese", "Persian", "Maine Coon", "Tabby", "Bengal"]),
    ("Bird", &["Parakeet", "Cockatiel", "Canary"]),
    ("Rabbit", &["Holland Lop", "Mini Rex", "Lionhead"]),
    ("Other", &["Mixed"]),
];

/// Deterministic demo catalogue of `count` pets with ids starting at 1
///
/// Species, breed, age and flags are spread with fixed strides so that every
/// age bucket and flag combination appears in a catalogue of 20 or more.
pub fn demo_pets(count: usize) -> Vec<Pet> {
    (0..count)
        .map(|i| {
            let (species, breeds) = CATALOGUE[i % CATALOGUE.len()];
            let breed = breeds[(i / CATALOGUE.len()) % breeds.len()];
            let name = NAMES[i % NAMES.len()];
            let age = ((i * 7) % 15) as i32;

            Pet {
                id: i as i64 + 1,
                name: name.to_string(),
                species: species.to_string(),
                breed: breed.to_string(),
                age,
                description: Some(format!(
                    "This lovely {} named {} is looking for a home.",
                    breed, name
                )),
                fosterable: i % 3 == 0,
                at_risk: i % 4 == 1,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgeBucket;
    use std::collections::HashSet;

    #[test]
    fn test_demo_pets_are_stable() {
        assert_eq!(demo_pets(30), demo_pets(30));
    }

    #[test]
    fn test_demo_pets_cover_buckets_and_flags() {
        let pets = demo_pets(20);
        let buckets: HashSet<AgeBucket> = pets.iter().map(|p| AgeBucket::from_age(p.age)).collect();

        assert_eq!(buckets.len(), 4);
        assert!(pets.iter().any(|p| p.fosterable));
        assert!(pets.iter().any(|p| p.at_risk));
        assert_eq!(pets.first().map(|p| p.id), Some(1));
    }
}
