//! Button combo detection
//!
//! A combo is a set of gamepad buttons that must all be held at once.
//! [`ComboTracker`] is the pure edge detector: it consumes raw input
//! events, keeps per-button pressed state, and reports the moments the
//! whole combo becomes held or released. The evdev plumbing that feeds
//! it lives in [`listener`] and runs as its own process
//! (`padtalk listen`), supervised by the daemon.

pub mod listener;

use crate::error::ComboError;

/// Analog axes report 0-255 on the devices we care about; above this the
/// trigger counts as pressed.
pub const ANALOG_THRESHOLD: i32 = 128;

/// An analog axis that can satisfy a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSpec {
    /// evdev ABS_* code
    pub code: u16,
    /// Axis value above which the button counts as pressed
    pub threshold: i32,
}

/// One entry of the fixed button-name→code table
#[derive(Debug, Clone, Copy)]
pub struct ButtonSpec {
    pub name: &'static str,
    /// evdev BTN_* code, if the button emits digital events
    pub digital_code: Option<u16>,
    /// Analog axis, for trigger buttons that report pressure
    pub analog: Option<AxisSpec>,
}

/// Fixed button table. Digital codes are the BTN_* constants gamepads
/// emit; L2/R2 additionally carry the ABS_Z/ABS_RZ pressure axes since
/// some devices only report triggers as analog.
const BUTTON_TABLE: &[ButtonSpec] = &[
    ButtonSpec { name: "L1", digital_code: Some(310), analog: None }, // BTN_TL
    ButtonSpec { name: "R1", digital_code: Some(311), analog: None }, // BTN_TR
    ButtonSpec {
        name: "L2",
        digital_code: Some(312), // BTN_TL2
        analog: Some(AxisSpec { code: 2, threshold: ANALOG_THRESHOLD }), // ABS_Z
    },
    ButtonSpec {
        name: "R2",
        digital_code: Some(313), // BTN_TR2
        analog: Some(AxisSpec { code: 5, threshold: ANALOG_THRESHOLD }), // ABS_RZ
    },
    ButtonSpec { name: "L5", digital_code: Some(314), analog: None },
    ButtonSpec { name: "R5", digital_code: Some(315), analog: None },
    ButtonSpec { name: "A", digital_code: Some(304), analog: None }, // BTN_SOUTH
    ButtonSpec { name: "B", digital_code: Some(305), analog: None }, // BTN_EAST
    ButtonSpec { name: "X", digital_code: Some(307), analog: None }, // BTN_NORTH
    ButtonSpec { name: "Y", digital_code: Some(308), analog: None }, // BTN_WEST
];

/// Look up a button by name (case-insensitive)
pub fn button_spec(name: &str) -> Option<&'static ButtonSpec> {
    BUTTON_TABLE
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
}

/// All names in the button table, for error messages
pub fn known_button_names() -> Vec<&'static str> {
    BUTTON_TABLE.iter().map(|spec| spec.name).collect()
}

/// Resolve a configured button list against the table.
/// An unknown name rejects the whole combo.
pub fn resolve_combo(names: &[String]) -> Result<Vec<&'static ButtonSpec>, ComboError> {
    names
        .iter()
        .map(|name| button_spec(name).ok_or_else(|| ComboError::UnknownButton(name.clone())))
        .collect()
}

/// A raw input event, decoupled from evdev so the tracker is testable
#[derive(Debug, Clone, Copy)]
pub enum RawEvent {
    /// Digital button event (EV_KEY)
    Key { code: u16, down: bool },
    /// Analog axis sample (EV_ABS)
    Axis { code: u16, value: i32 },
}

/// A transition of the whole combo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboEdge {
    /// All buttons became held
    Pressed,
    /// At least one button was released
    Released,
}

/// Per-button runtime state. A button is pressed when its digital code is
/// down OR its analog axis is above threshold; either source suffices.
#[derive(Debug, Clone, Copy, Default)]
struct ButtonState {
    digital_down: bool,
    analog_high: bool,
}

impl ButtonState {
    fn pressed(&self) -> bool {
        self.digital_down || self.analog_high
    }
}

/// Pure combo edge detector.
///
/// Edge checks are gated on actual state changes: an event that does not
/// flip any button's pressed value (repeated analog samples while a
/// trigger is held, key-repeat events, unrelated codes) produces no edge.
pub struct ComboTracker {
    specs: Vec<&'static ButtonSpec>,
    states: Vec<ButtonState>,
    combo_active: bool,
}

impl ComboTracker {
    pub fn new(specs: Vec<&'static ButtonSpec>) -> Self {
        let states = vec![ButtonState::default(); specs.len()];
        Self {
            specs,
            states,
            combo_active: false,
        }
    }

    /// Whether every configured button is currently pressed
    pub fn is_active(&self) -> bool {
        self.combo_active
    }

    /// Consume one raw event; returns an edge iff the combo state flipped.
    pub fn handle(&mut self, event: RawEvent) -> Option<ComboEdge> {
        let mut changed = false;

        for (spec, state) in self.specs.iter().zip(self.states.iter_mut()) {
            let was_pressed = state.pressed();

            match event {
                RawEvent::Key { code, down } => {
                    if spec.digital_code == Some(code) {
                        state.digital_down = down;
                    }
                }
                RawEvent::Axis { code, value } => {
                    if let Some(axis) = spec.analog {
                        if axis.code == code {
                            state.analog_high = value > axis.threshold;
                        }
                    }
                }
            }

            if state.pressed() != was_pressed {
                changed = true;
            }
        }

        if !changed {
            return None;
        }

        let all_pressed = self.states.iter().all(|s| s.pressed());
        if all_pressed && !self.combo_active {
            self.combo_active = true;
            Some(ComboEdge::Pressed)
        } else if !all_pressed && self.combo_active {
            self.combo_active = false;
            Some(ComboEdge::Released)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(names: &[&str]) -> ComboTracker {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        ComboTracker::new(resolve_combo(&names).unwrap())
    }

    fn press(code: u16) -> RawEvent {
        RawEvent::Key { code, down: true }
    }

    fn release(code: u16) -> RawEvent {
        RawEvent::Key { code, down: false }
    }

    #[test]
    fn test_unknown_button_rejected() {
        let names = vec!["L1".to_string(), "NOPE".to_string()];
        assert!(matches!(
            resolve_combo(&names),
            Err(ComboError::UnknownButton(name)) if name == "NOPE"
        ));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(button_spec("l1").unwrap().name, "L1");
        assert_eq!(button_spec("r2").unwrap().name, "R2");
    }

    #[test]
    fn test_combo_requires_all_buttons() {
        let mut t = tracker(&["L1", "R1"]);

        assert_eq!(t.handle(press(310)), None); // only L1
        assert!(!t.is_active());
        assert_eq!(t.handle(press(311)), Some(ComboEdge::Pressed));
        assert!(t.is_active());
    }

    #[test]
    fn test_release_of_either_button_ends_combo() {
        let mut t = tracker(&["L1", "R1"]);
        t.handle(press(310));
        t.handle(press(311));

        assert_eq!(t.handle(release(310)), Some(ComboEdge::Released));
        assert!(!t.is_active());
        // Releasing the other button changes its state but not the combo
        assert_eq!(t.handle(release(311)), None);
    }

    #[test]
    fn test_edges_strictly_alternate() {
        let mut t = tracker(&["A"]);
        let mut edges = Vec::new();

        for event in [press(304), press(304), release(304), release(304), press(304)] {
            if let Some(edge) = t.handle(event) {
                edges.push(edge);
            }
        }

        assert_eq!(
            edges,
            vec![ComboEdge::Pressed, ComboEdge::Released, ComboEdge::Pressed]
        );
    }

    #[test]
    fn test_unrelated_codes_are_ignored() {
        let mut t = tracker(&["L1"]);
        t.handle(press(310));
        assert!(t.is_active());

        // Stick movement and face buttons do not disturb the combo
        assert_eq!(t.handle(press(304)), None);
        assert_eq!(t.handle(RawEvent::Axis { code: 0, value: 200 }), None);
        assert!(t.is_active());
    }

    #[test]
    fn test_analog_trigger_level_comparison() {
        let mut t = tracker(&["L2"]);

        assert_eq!(t.handle(RawEvent::Axis { code: 2, value: 10 }), None);
        assert_eq!(
            t.handle(RawEvent::Axis { code: 2, value: 200 }),
            Some(ComboEdge::Pressed)
        );
        // Repeated above-threshold samples while held: no thrash
        assert_eq!(t.handle(RawEvent::Axis { code: 2, value: 220 }), None);
        assert_eq!(t.handle(RawEvent::Axis { code: 2, value: 255 }), None);
        assert_eq!(
            t.handle(RawEvent::Axis { code: 2, value: 0 }),
            Some(ComboEdge::Released)
        );
    }

    #[test]
    fn test_redundant_digital_code_also_satisfies_trigger() {
        let mut t = tracker(&["R2"]);

        // Some devices emit BTN_TR2 alongside the axis; either works
        assert_eq!(t.handle(press(313)), Some(ComboEdge::Pressed));
        // The axis going high while the digital code is down changes nothing
        assert_eq!(t.handle(RawEvent::Axis { code: 5, value: 255 }), None);
        // Digital release alone does not end the press while the axis is high
        assert_eq!(t.handle(release(313)), None);
        assert_eq!(
            t.handle(RawEvent::Axis { code: 5, value: 0 }),
            Some(ComboEdge::Released)
        );
    }

    #[test]
    fn test_key_repeat_does_not_emit_edges() {
        let mut t = tracker(&["A"]);
        assert_eq!(t.handle(press(304)), Some(ComboEdge::Pressed));
        // Kernel key-repeat arrives as another down event
        assert_eq!(t.handle(press(304)), None);
    }
}
