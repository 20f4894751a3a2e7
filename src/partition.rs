//! Capacity partitioning.
//!
//! Splits a `ResourceRegistry` into a regular pool, the only capacity the
//! optimizing scheduler can see, and a reserve pool, the only capacity
//! emergency admission can use. The two pools are disjoint by
//! construction and every practiced specialty has exactly one reserved
//! surgeon.
//!
//! # Failure
//! Partitioning fails fast with a `ConfigurationError` before any
//! scheduling proceeds.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::ConfigurationError;
use crate::models::{ResourceRegistry, Room, RoomKind, Surgeon};

/// Which rooms and surgeons are withheld for emergencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationPolicy {
    /// Rooms kept free for emergencies.
    pub reserved_room_ids: BTreeSet<String>,
    /// Specialty → the one surgeon on call for it.
    pub reserved_surgeon_per_specialty: BTreeMap<String, String>,
}

impl ReservationPolicy {
    /// Creates an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a room.
    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.reserved_room_ids.insert(room_id.into());
        self
    }

    /// Reserves a surgeon for a specialty.
    pub fn with_surgeon(mut self, specialty: impl Into<String>, surgeon_id: impl Into<String>) -> Self {
        self.reserved_surgeon_per_specialty
            .insert(specialty.into(), surgeon_id.into());
        self
    }

    /// Distinct reserved surgeon ids.
    pub fn reserved_surgeon_ids(&self) -> BTreeSet<&str> {
        self.reserved_surgeon_per_specialty
            .values()
            .map(String::as_str)
            .collect()
    }
}

/// Capacity available to the optimizing scheduler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegularPool {
    /// Regular rooms, in registry order.
    pub rooms: Vec<Room>,
    /// Regular surgeons, in registry order.
    pub surgeons: Vec<Surgeon>,
    /// Shared equipment capacities.
    pub equipment: BTreeMap<String, u32>,
}

/// Capacity available only to emergency admission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservePool {
    /// Reserved rooms, in registry order.
    pub rooms: Vec<Room>,
    surgeons: HashMap<String, Surgeon>,
    by_specialty: HashMap<String, String>,
}

/// A disjoint split of the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePool {
    pub regular: RegularPool,
    pub reserve: ReservePool,
}

impl RegularPool {
    /// Looks up a regular room.
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// Looks up a regular surgeon.
    pub fn surgeon(&self, id: &str) -> Option<&Surgeon> {
        self.surgeons.iter().find(|s| s.id == id)
    }
}

impl ReservePool {
    /// The surgeon on call for `specialty`. Constant time.
    pub fn surgeon_for(&self, specialty: &str) -> Option<&Surgeon> {
        self.by_specialty
            .get(specialty)
            .and_then(|id| self.surgeons.get(id))
    }

    /// Whether `surgeon_id` is a reserved surgeon.
    pub fn has_surgeon(&self, surgeon_id: &str) -> bool {
        self.surgeons.contains_key(surgeon_id)
    }

    /// Reserved surgeons, in no particular order.
    pub fn surgeons(&self) -> impl Iterator<Item = &Surgeon> {
        self.surgeons.values()
    }

    /// Specialties covered by the reserve.
    pub fn specialties(&self) -> impl Iterator<Item = &str> {
        self.by_specialty.keys().map(String::as_str)
    }
}

impl ResourcePool {
    /// Whether no room or surgeon id appears in both pools.
    pub fn is_disjoint(&self) -> bool {
        let rooms_disjoint = self
            .regular
            .rooms
            .iter()
            .all(|r| !self.reserve.rooms.iter().any(|x| x.id == r.id));
        let surgeons_disjoint = self
            .regular
            .surgeons
            .iter()
            .all(|s| !self.reserve.has_surgeon(&s.id));
        rooms_disjoint && surgeons_disjoint
    }
}

/// Splits `registry` into regular and reserve pools according to `policy`.
///
/// # Checks
/// 1. No duplicate room or surgeon ids in the registry
/// 2. No id listed both as a reserved room and a reserved surgeon
/// 3. Every reserved id exists; reserved surgeons practice their specialty
/// 4. At least one room is reserved
/// 5. Every practiced specialty has a reserved surgeon
/// 6. Nothing tagged reserved in the registry is missing from the policy
pub fn partition(
    registry: &ResourceRegistry,
    policy: &ReservationPolicy,
) -> Result<ResourcePool, ConfigurationError> {
    check_unique_ids(registry)?;

    let reserved_surgeons = policy.reserved_surgeon_ids();
    if let Some(id) = policy
        .reserved_room_ids
        .iter()
        .find(|id| reserved_surgeons.contains(id.as_str()))
    {
        return Err(ConfigurationError::DoubleReservation(id.clone()));
    }

    for room_id in &policy.reserved_room_ids {
        if registry.room(room_id).is_none() {
            return Err(ConfigurationError::UnknownRoom(room_id.clone()));
        }
    }

    for (specialty, surgeon_id) in &policy.reserved_surgeon_per_specialty {
        let surgeon =
            registry
                .surgeon(surgeon_id)
                .ok_or_else(|| ConfigurationError::UnknownSurgeon {
                    specialty: specialty.clone(),
                    surgeon_id: surgeon_id.clone(),
                })?;
        if !surgeon.practices(specialty) {
            return Err(ConfigurationError::SpecialtyMismatch {
                specialty: specialty.clone(),
                surgeon_id: surgeon_id.clone(),
            });
        }
    }

    if policy.reserved_room_ids.is_empty() {
        return Err(ConfigurationError::NoReservedRoom);
    }

    if let Some(specialty) = registry
        .specialties()
        .into_iter()
        .find(|s| !policy.reserved_surgeon_per_specialty.contains_key(*s))
    {
        return Err(ConfigurationError::MissingReserveSurgeon {
            specialty: specialty.to_string(),
        });
    }

    if let Some(room) = registry.rooms.iter().find(|r| {
        r.kind == RoomKind::ReservedEmergency && !policy.reserved_room_ids.contains(&r.id)
    }) {
        return Err(ConfigurationError::UnlistedReserve {
            kind: "room",
            id: room.id.clone(),
        });
    }
    if let Some(surgeon) = registry
        .surgeons
        .iter()
        .find(|s| s.is_reserve && !reserved_surgeons.contains(s.id.as_str()))
    {
        return Err(ConfigurationError::UnlistedReserve {
            kind: "surgeon",
            id: surgeon.id.clone(),
        });
    }

    let (reserve_rooms, regular_rooms): (Vec<Room>, Vec<Room>) = registry
        .rooms
        .iter()
        .cloned()
        .partition(|r| policy.reserved_room_ids.contains(&r.id));

    let mut regular_surgeons = Vec::new();
    let mut reserve_surgeons = HashMap::new();
    for surgeon in &registry.surgeons {
        if reserved_surgeons.contains(surgeon.id.as_str()) {
            reserve_surgeons.insert(surgeon.id.clone(), surgeon.clone().reserve(true));
        } else {
            regular_surgeons.push(surgeon.clone().reserve(false));
        }
    }

    let by_specialty = policy
        .reserved_surgeon_per_specialty
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    tracing::debug!(
        regular_rooms = regular_rooms.len(),
        regular_surgeons = regular_surgeons.len(),
        reserve_rooms = reserve_rooms.len(),
        reserve_surgeons = reserve_surgeons.len(),
        "partitioned resource registry"
    );

    Ok(ResourcePool {
        regular: RegularPool {
            rooms: regular_rooms,
            surgeons: regular_surgeons,
            equipment: registry.equipment.clone(),
        },
        reserve: ReservePool {
            rooms: reserve_rooms,
            surgeons: reserve_surgeons,
            by_specialty,
        },
    })
}

fn check_unique_ids(registry: &ResourceRegistry) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for room in &registry.rooms {
        if !seen.insert(room.id.as_str()) {
            return Err(ConfigurationError::DuplicateId {
                kind: "room",
                id: room.id.clone(),
            });
        }
    }
    let mut seen = HashSet::new();
    for surgeon in &registry.surgeons {
        if !seen.insert(surgeon.id.as_str()) {
            return Err(ConfigurationError::DuplicateId {
                kind: "surgeon",
                id: surgeon.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_registry() -> ResourceRegistry {
        ResourceRegistry::new()
            .with_room(Room::new("OR-1"))
            .with_room(Room::new("OR-2"))
            .with_room(Room::emergency("OR-11"))
            .with_surgeon(Surgeon::new("Dr. Yang", "Cardiovascular"))
            .with_surgeon(Surgeon::new("Dr. Burke", "Cardiovascular"))
            .with_surgeon(Surgeon::new("Dr. Bailey", "General"))
            .with_surgeon(Surgeon::new("Dr. Grey", "General").with_specialty("Urology"))
            .with_equipment("C-Arm", 4)
    }

    fn sample_policy() -> ReservationPolicy {
        ReservationPolicy::new()
            .with_room("OR-11")
            .with_surgeon("Cardiovascular", "Dr. Burke")
            .with_surgeon("General", "Dr. Grey")
            .with_surgeon("Urology", "Dr. Grey")
    }

    #[test]
    fn test_partition_splits_registry() {
        let pool = partition(&sample_registry(), &sample_policy()).unwrap();

        let regular_rooms: Vec<&str> = pool.regular.rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(regular_rooms, vec!["OR-1", "OR-2"]);
        let regular_surgeons: Vec<&str> =
            pool.regular.surgeons.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(regular_surgeons, vec!["Dr. Yang", "Dr. Bailey"]);
        assert_eq!(pool.regular.equipment["C-Arm"], 4);

        assert_eq!(pool.reserve.rooms.len(), 1);
        assert_eq!(pool.reserve.surgeon_for("Cardiovascular").unwrap().id, "Dr. Burke");
        assert_eq!(pool.reserve.surgeon_for("Urology").unwrap().id, "Dr. Grey");
        assert!(pool.reserve.surgeon_for("Neurological").is_none());
        assert!(pool.reserve.surgeons().all(|s| s.is_reserve));
        assert!(pool.is_disjoint());
    }

    #[test]
    fn test_missing_reserve_surgeon() {
        let policy = ReservationPolicy::new()
            .with_room("OR-11")
            .with_surgeon("Cardiovascular", "Dr. Burke");
        let err = partition(&sample_registry(), &policy).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingReserveSurgeon {
                specialty: "General".into()
            }
        );
    }

    #[test]
    fn test_unknown_ids() {
        let policy = sample_policy().with_room("OR-99");
        assert_eq!(
            partition(&sample_registry(), &policy).unwrap_err(),
            ConfigurationError::UnknownRoom("OR-99".into())
        );

        let policy = sample_policy().with_surgeon("Cardiovascular", "Dr. Nobody");
        assert!(matches!(
            partition(&sample_registry(), &policy).unwrap_err(),
            ConfigurationError::UnknownSurgeon { .. }
        ));
    }

    #[test]
    fn test_double_reservation() {
        let registry = sample_registry().with_room(Room::new("Dr. Burke"));
        let policy = sample_policy().with_room("Dr. Burke");
        assert_eq!(
            partition(&registry, &policy).unwrap_err(),
            ConfigurationError::DoubleReservation("Dr. Burke".into())
        );
    }

    #[test]
    fn test_specialty_mismatch() {
        let policy = sample_policy().with_surgeon("Cardiovascular", "Dr. Bailey");
        assert!(matches!(
            partition(&sample_registry(), &policy).unwrap_err(),
            ConfigurationError::SpecialtyMismatch { .. }
        ));
    }

    #[test]
    fn test_no_reserved_room() {
        let mut policy = sample_policy();
        policy.reserved_room_ids.clear();
        let registry = ResourceRegistry {
            rooms: vec![Room::new("OR-1")],
            ..sample_registry()
        };
        assert_eq!(
            partition(&registry, &policy).unwrap_err(),
            ConfigurationError::NoReservedRoom
        );
    }

    #[test]
    fn test_unlisted_reserve_tags() {
        let registry = sample_registry().with_room(Room::emergency("OR-12"));
        assert_eq!(
            partition(&registry, &sample_policy()).unwrap_err(),
            ConfigurationError::UnlistedReserve {
                kind: "room",
                id: "OR-12".into()
            }
        );

        let registry =
            sample_registry().with_surgeon(Surgeon::new("Dr. Hunt", "General").reserve(true));
        assert!(matches!(
            partition(&registry, &sample_policy()).unwrap_err(),
            ConfigurationError::UnlistedReserve { kind: "surgeon", .. }
        ));
    }

    #[test]
    fn test_duplicate_registry_ids() {
        let registry = sample_registry().with_room(Room::new("OR-1"));
        assert!(matches!(
            partition(&registry, &sample_policy()).unwrap_err(),
            ConfigurationError::DuplicateId { kind: "room", .. }
        ));
    }

    const SPECIALTIES: [&str; 4] = ["Neurological", "Cardiovascular", "General", "Orthopedic"];

    fn arb_config() -> impl Strategy<Value = (ResourceRegistry, ReservationPolicy)> {
        (
            1usize..8,
            prop::collection::vec(prop::collection::btree_set(0usize..4, 1..3), 1..10),
            any::<u64>(),
        )
            .prop_map(|(room_count, surgeon_specs, salt)| {
                let mut registry = ResourceRegistry::new();
                for i in 0..room_count {
                    registry = registry.with_room(Room::new(format!("OR-{}", i + 1)));
                }
                for (i, specs) in surgeon_specs.iter().enumerate() {
                    let mut iter = specs.iter();
                    let first = SPECIALTIES[*iter.next().unwrap()];
                    let mut surgeon = Surgeon::new(format!("S-{i}"), first);
                    for s in iter {
                        surgeon = surgeon.with_specialty(SPECIALTIES[*s]);
                    }
                    registry = registry.with_surgeon(surgeon);
                }

                let mut policy = ReservationPolicy::new().with_room("OR-1");
                for i in 0..room_count {
                    if (i as u64 + salt) % 3 == 0 {
                        policy = policy.with_room(format!("OR-{}", i + 1));
                    }
                }
                let specialties: Vec<String> =
                    registry.specialties().into_iter().map(String::from).collect();
                for specialty in specialties {
                    let practitioners: Vec<&Surgeon> = registry
                        .surgeons
                        .iter()
                        .filter(|s| s.practices(&specialty))
                        .collect();
                    let pick = practitioners[(salt as usize) % practitioners.len()].id.clone();
                    policy = policy.with_surgeon(specialty, pick);
                }
                (registry, policy)
            })
    }

    proptest! {
        #[test]
        fn prop_valid_policies_partition_disjointly((registry, policy) in arb_config()) {
            let pool = partition(&registry, &policy).unwrap();

            prop_assert!(pool.is_disjoint());
            prop_assert_eq!(
                pool.regular.rooms.len() + pool.reserve.rooms.len(),
                registry.rooms.len()
            );
            prop_assert_eq!(
                pool.regular.surgeons.len() + pool.reserve.surgeons().count(),
                registry.surgeons.len()
            );
            for specialty in registry.specialties() {
                let reserved = pool.reserve.surgeon_for(specialty);
                prop_assert!(reserved.is_some());
                prop_assert!(reserved.unwrap().practices(specialty));
                prop_assert!(pool.regular.surgeon(&reserved.unwrap().id).is_none());
            }
        }
    }
}
