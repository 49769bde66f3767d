use crate::state::StateSnapshot;

/// Id of the untracked counterpart of a tracked power/energy sensor.
///
/// `…_power` maps to `…_untracked_power` and `…_energy` to
/// `…_untracked_energy`; other ids have no counterpart.
pub fn untracked_id_of(entity_id: &str) -> Option<String> {
    if let Some(stem) = entity_id.strip_suffix("_power") {
        Some(format!("{stem}_untracked_power"))
    } else {
        entity_id
            .strip_suffix("_energy")
            .map(|stem| format!("{stem}_untracked_energy"))
    }
}

/// Numeric state of the untracked counterpart of `entity_id`.
///
/// A missing or non-numeric counterpart is a normal outcome and yields `None`.
pub fn untracked_value_of(entity_id: &str, store: &StateSnapshot) -> Option<f64> {
    let untracked_id = untracked_id_of(entity_id)?;
    store.value_of(&untracked_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HostState;

    #[test]
    fn test_untracked_id_of() {
        assert_eq!(
            untracked_id_of("sensor.energy_power_monitor_kitchen_power").as_deref(),
            Some("sensor.energy_power_monitor_kitchen_untracked_power")
        );
        assert_eq!(
            untracked_id_of("sensor.energy_power_monitor_kitchen_energy").as_deref(),
            Some("sensor.energy_power_monitor_kitchen_untracked_energy")
        );
        assert_eq!(untracked_id_of("sensor.energy_power_monitor_kitchen"), None);
        assert_eq!(untracked_id_of("sensor.kitchen_powerstrip"), None);
    }

    #[test]
    fn test_untracked_value_of() {
        let store = StateSnapshot::from_states([
            HostState::new("sensor.energy_power_monitor_kitchen_untracked_power", "25"),
            HostState::new("sensor.energy_power_monitor_garage_untracked_energy", "1.5"),
            HostState::new("sensor.energy_power_monitor_attic_untracked_power", "unknown"),
        ]);

        assert_eq!(
            untracked_value_of("sensor.energy_power_monitor_kitchen_power", &store),
            Some(25.0)
        );
        assert_eq!(
            untracked_value_of("sensor.energy_power_monitor_garage_energy", &store),
            Some(1.5)
        );
        assert_eq!(
            untracked_value_of("sensor.energy_power_monitor_attic_power", &store),
            None
        );
        assert_eq!(
            untracked_value_of("sensor.energy_power_monitor_cellar_power", &store),
            None
        );
        assert_eq!(
            untracked_value_of("sensor.energy_power_monitor_kitchen", &store),
            None
        );
    }

    #[test]
    fn test_zero_counterpart_is_present() {
        let store = StateSnapshot::from_states([HostState::new(
            "sensor.energy_power_monitor_kitchen_untracked_power",
            "0",
        )]);
        assert_eq!(
            untracked_value_of("sensor.energy_power_monitor_kitchen_power", &store),
            Some(0.0)
        );
    }
}
