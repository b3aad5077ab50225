use crate::config::ConfigDocument;
use std::collections::HashMap;
use std::fmt;

/// A physical button claimed by two config entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonConflict {
    pub button: i64,
    pub entry: String,
    pub previous: String,
}

impl fmt::Display for ButtonConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Button {} is used by both '{}' and '{}'",
            self.button, self.entry, self.previous
        )
    }
}

/// Two raw axes reading the same device index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisConflict {
    pub index: u32,
    pub axis: String,
    pub previous: String,
}

impl fmt::Display for AxisConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Axis {} is used by both '{}' and '{}'",
            self.index, self.axis, self.previous
        )
    }
}

/// Checks standard bindings, then combo triggers, then the kill switch
///
/// Each conflict names the later entry and the last earlier entry on the
/// same button. Malformed entries claim no button.
pub fn button_conflicts(document: &ConfigDocument) -> Vec<ButtonConflict> {
    let standard = document
        .bindings
        .standard
        .iter()
        .filter_map(|(name, entry)| entry.parsed().map(|b| (name.clone(), b.button)));
    let combos = document
        .bindings
        .combos
        .iter()
        .filter_map(|(name, entry)| entry.parsed().map(|c| (format!("combo:{name}"), c.trigger)));
    let kill = document
        .kill_switch
        .parsed()
        .map(|kill| ("kill_switch".to_string(), kill.button));

    let mut owners: HashMap<i64, String> = HashMap::new();
    let mut conflicts = Vec::new();
    for (entry, button) in standard.chain(combos).chain(kill) {
        let Some(button) = button else { continue };
        if let Some(previous) = owners.insert(button, entry.clone()) {
            conflicts.push(ButtonConflict {
                button,
                entry,
                previous,
            });
        }
    }
    conflicts
}

/// Checks a list of raw axis name → device index assignments
pub fn axis_conflicts(assignments: &[(String, u32)]) -> Vec<AxisConflict> {
    let mut owners: HashMap<u32, &str> = HashMap::new();
    let mut conflicts = Vec::new();
    for (axis, index) in assignments {
        if let Some(previous) = owners.insert(*index, axis) {
            conflicts.push(AxisConflict {
                index: *index,
                axis: axis.clone(),
                previous: previous.to_string(),
            });
        }
    }
    conflicts
}
