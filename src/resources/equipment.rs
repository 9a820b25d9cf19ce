//! Equipment manager
//!
//! One counting semaphore per configured equipment name; names that never
//! appear in the configuration are unlimited: acquisition always succeeds,
//! but their usage is still tracked so utilization covers every tool the
//! process touches. Duplicate names within one task are independent
//! acquisitions against the same capacity.

use std::collections::{BTreeMap, VecDeque};

use crate::models::result::{ResourceKind, ResourceUtilization};

#[derive(Debug)]
struct EquipmentUnit {
    /// `None` means unlimited
    capacity: Option<u32>,
    in_use: u32,
    waiters: VecDeque<usize>,
    work_time: f64,
    tasks_served: u64,
}

impl EquipmentUnit {
    fn new(capacity: Option<u32>) -> Self {
        Self {
            capacity,
            in_use: 0,
            waiters: VecDeque::new(),
            work_time: 0.0,
            tasks_served: 0,
        }
    }
}

/// Tracks capacity and usage per equipment name.
///
/// `BTreeMap` keeps statistics output in name order, independent of the
/// order tools were first touched.
pub struct EquipmentManager {
    units: BTreeMap<String, EquipmentUnit>,
}

impl EquipmentManager {
    pub fn new(critical_equipment: &BTreeMap<String, u32>) -> Self {
        let units = critical_equipment
            .iter()
            .map(|(name, &capacity)| (name.clone(), EquipmentUnit::new(Some(capacity))))
            .collect();
        Self { units }
    }

    /// Whether `name` has a configured, finite capacity.
    pub fn is_critical(&self, name: &str) -> bool {
        self.units
            .get(name)
            .map_or(false, |u| u.capacity.is_some())
    }

    /// Acquire one unit of `name` for `token`.
    ///
    /// Returns `true` on an immediate grant; otherwise the token joins the
    /// FIFO waiter queue of that name and resumes when a unit frees.
    pub fn try_acquire(&mut self, name: &str, token: usize) -> bool {
        let unit = self
            .units
            .entry(name.to_string())
            .or_insert_with(|| EquipmentUnit::new(None));
        match unit.capacity {
            Some(capacity) if unit.in_use >= capacity || !unit.waiters.is_empty() => {
                unit.waiters.push_back(token);
                false
            }
            _ => {
                unit.in_use += 1;
                true
            }
        }
    }

    /// Release one unit of `name`, crediting `duration` minutes of use.
    ///
    /// If someone is waiting, the unit transfers directly to the head of the
    /// queue; the returned token must be resumed by the event loop.
    pub fn release(&mut self, name: &str, duration: f64) -> Option<usize> {
        let unit = self.units.get_mut(name)?;
        unit.in_use -= 1;
        unit.work_time += duration;
        unit.tasks_served += 1;
        let next = unit.waiters.pop_front();
        if next.is_some() {
            unit.in_use += 1;
        }
        next
    }

    /// Units of `name` currently held.
    pub fn in_use(&self, name: &str) -> u32 {
        self.units.get(name).map_or(0, |u| u.in_use)
    }

    /// Usage statistics per equipment name, in name order.
    ///
    /// Utilization is `work_time / sim_duration`: the denominator is the run
    /// length, not run length times capacity, so a fully busy two-unit
    /// machine reads as 2.0.
    pub fn stats(&self, sim_duration: f64) -> Vec<ResourceUtilization> {
        self.units
            .iter()
            .map(|(name, unit)| {
                let capacity = f64::from(unit.capacity.unwrap_or(1));
                let total_time = sim_duration * capacity;
                ResourceUtilization {
                    resource_id: name.clone(),
                    resource_type: ResourceKind::Equipment,
                    total_time,
                    work_time: unit.work_time,
                    rest_time: 0.0,
                    idle_time: (total_time - unit.work_time).max(0.0),
                    utilization_rate: if sim_duration > 0.0 {
                        unit.work_time / sim_duration
                    } else {
                        0.0
                    },
                    tasks_completed: unit.tasks_served,
                    fatigue_level: 0.0,
                    high_intensity_count: 0,
                    fatigue_history: Vec::new(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with(name: &str, capacity: u32) -> EquipmentManager {
        let mut critical = BTreeMap::new();
        critical.insert(name.to_string(), capacity);
        EquipmentManager::new(&critical)
    }

    #[test]
    fn test_capacity_limits_grants() {
        let mut mgr = manager_with("balancer", 1);
        assert!(mgr.try_acquire("balancer", 0));
        assert!(!mgr.try_acquire("balancer", 1), "second request must queue");
        assert_eq!(mgr.in_use("balancer"), 1);
    }

    #[test]
    fn test_release_transfers_to_waiter() {
        let mut mgr = manager_with("balancer", 1);
        assert!(mgr.try_acquire("balancer", 0));
        assert!(!mgr.try_acquire("balancer", 1));
        assert!(!mgr.try_acquire("balancer", 2));

        assert_eq!(mgr.release("balancer", 20.0), Some(1), "FIFO head resumes");
        assert_eq!(mgr.in_use("balancer"), 1, "unit transferred, not freed");
        assert_eq!(mgr.release("balancer", 20.0), Some(2));
        assert_eq!(mgr.release("balancer", 20.0), None);
        assert_eq!(mgr.in_use("balancer"), 0);
    }

    #[test]
    fn test_unknown_equipment_is_unlimited() {
        let mut mgr = EquipmentManager::new(&BTreeMap::new());
        for token in 0..100 {
            assert!(mgr.try_acquire("hand_tool", token));
        }
        assert_eq!(mgr.in_use("hand_tool"), 100);
        assert!(!mgr.is_critical("hand_tool"));
    }

    #[test]
    fn test_duplicates_are_independent_acquisitions() {
        let mut mgr = manager_with("jig", 2);
        assert!(mgr.try_acquire("jig", 0));
        assert!(mgr.try_acquire("jig", 0), "same task takes a second unit");
        assert!(!mgr.try_acquire("jig", 1));
    }

    #[test]
    fn test_usage_accrues_per_acquisition() {
        let mut mgr = manager_with("jig", 2);
        assert!(mgr.try_acquire("jig", 0));
        assert!(mgr.try_acquire("jig", 0));
        mgr.release("jig", 15.0);
        mgr.release("jig", 15.0);

        let stats = mgr.stats(60.0);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].work_time, 30.0);
        assert_eq!(stats[0].tasks_completed, 2);
        assert!((stats[0].utilization_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_stats_sorted_by_name() {
        let mut critical = BTreeMap::new();
        critical.insert("z_rig".to_string(), 1);
        critical.insert("a_bench".to_string(), 1);
        let mut mgr = EquipmentManager::new(&critical);
        assert!(mgr.try_acquire("m_tool", 0));

        let names: Vec<String> = mgr.stats(10.0).into_iter().map(|s| s.resource_id).collect();
        assert_eq!(names, vec!["a_bench", "m_tool", "z_rig"]);
    }
}
