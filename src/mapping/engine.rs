use super::bindings::{BindingResolver, RuntimeControlState};
use super::normalizer::{ControlValues, Normalizer};
use super::translator;
use crate::config::ControllerConfig;
use crate::controller::StickSnapshot;
use crate::pad::PadFrame;

/// Snapshot in, frame out
///
/// Combo state is resolved first so that a combo suppresses its axes on the
/// tick it engages. The frame still lists axis commands before button
/// commands: sticks, rudder and throttle, then standard bindings, then combos.
pub struct MappingEngine {
    normalizer: Normalizer,
    resolver: BindingResolver,
    controls: ControlValues,
}

impl MappingEngine {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
            resolver: BindingResolver::new(config),
            controls: ControlValues::default(),
        }
    }

    pub fn process(&mut self, snapshot: &StickSnapshot) -> PadFrame {
        let buttons = self.resolver.resolve(snapshot);
        self.controls = self.normalizer.process(snapshot);

        let mut frame = translator::translate(&self.controls, self.resolver.state());
        frame.extend(buttons.standard);
        frame.extend(buttons.combos);
        frame
    }

    /// Control values of the last processed tick
    pub fn controls(&self) -> &ControlValues {
        &self.controls
    }

    pub fn control_state(&self) -> &RuntimeControlState {
        self.resolver.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDocument;
    use crate::controller::StickSource;
    use crate::pad::{PadCommand, PadReport, Trigger, XButton};
    use crate::testing::FakeStick;

    fn engine() -> MappingEngine {
        MappingEngine::new(&ControllerConfig::load(&ConfigDocument::builtin()))
    }

    #[test]
    fn full_tick_drives_every_output() {
        let mut engine = engine();
        let (mut stick, handle) = FakeStick::new(4, 8, 1);
        {
            let mut state = handle.lock().unwrap();
            state.axes = vec![1.0, 1.0, 0.9, -0.6];
            state.buttons[1] = true;
            state.hats[0] = (1, 0);
        }

        let pad = engine.process(&stick.snapshot()).resolve(&PadReport::default());
        assert_eq!(pad.left_stick, (1.0, -1.0));
        assert_eq!(pad.right_stick, (1.0, 0.0));
        assert!(pad.is_pressed(XButton::RightShoulder));
        assert!(pad.is_pressed(XButton::A));
        assert!(!pad.is_pressed(XButton::B));
        assert_eq!(pad.left_trigger, 0.0);
        assert!(pad.right_trigger > 0.5);
    }

    #[test]
    fn combo_suppresses_throttle_on_the_tick_it_engages() {
        let mut engine = engine();
        let (mut stick, handle) = FakeStick::new(4, 8, 0);
        {
            let mut state = handle.lock().unwrap();
            state.axes[3] = -0.9;
            state.buttons[4] = true;
        }

        let frame = engine.process(&stick.snapshot());
        let triggers: Vec<&PadCommand> = frame
            .commands()
            .iter()
            .filter(|c| matches!(c, PadCommand::Trigger { .. }))
            .collect();
        assert_eq!(
            triggers,
            [
                &PadCommand::Trigger {
                    trigger: Trigger::Left,
                    value: 1.0
                },
                &PadCommand::Trigger {
                    trigger: Trigger::Right,
                    value: 1.0
                },
            ]
        );
        assert!(engine.control_state().is_disabled("throttle"));

        handle.lock().unwrap().buttons[4] = false;
        let pad = engine.process(&stick.snapshot()).resolve(&PadReport::default());
        assert_eq!(pad.left_trigger, 0.0);
        assert!(pad.right_trigger > 0.8);
    }

    #[test]
    fn button_commands_follow_axis_commands() {
        let mut engine = engine();
        let (mut stick, handle) = FakeStick::new(4, 8, 0);
        handle.lock().unwrap().buttons[0] = true;

        let frame = engine.process(&stick.snapshot());
        let commands = frame.commands();
        let first_standard = commands
            .iter()
            .position(|c| *c == PadCommand::Press(XButton::B))
            .unwrap();
        let last_trigger = commands
            .iter()
            .rposition(|c| matches!(c, PadCommand::Trigger { .. }))
            .unwrap();
        assert!(last_trigger < first_standard);
        assert!(matches!(commands[0], PadCommand::Stick { .. }));
    }

    #[test]
    fn flare_combo_leaves_the_rudder_alone() {
        let mut engine = engine();
        let (mut stick, handle) = FakeStick::new(4, 8, 0);
        {
            let mut state = handle.lock().unwrap();
            state.axes[2] = -1.0;
            state.buttons[5] = true;
        }

        let pad = engine.process(&stick.snapshot()).resolve(&PadReport::default());
        assert!(pad.is_pressed(XButton::LeftThumb));
        assert!(pad.is_pressed(XButton::RightThumb));
        assert!(pad.is_pressed(XButton::LeftShoulder));

        handle.lock().unwrap().buttons[5] = false;
        for _ in 0..2 {
            let next = engine.process(&stick.snapshot()).resolve(&pad);
            assert!(!next.is_pressed(XButton::LeftThumb));
            assert!(!next.is_pressed(XButton::RightThumb));
            assert!(next.is_pressed(XButton::LeftShoulder));
            assert!(!next.is_pressed(XButton::RightShoulder));
        }
    }

    #[test]
    fn controls_of_last_tick_are_kept() {
        let mut engine = engine();
        let (mut stick, handle) = FakeStick::new(4, 0, 0);
        handle.lock().unwrap().axes[0] = 1.0;

        engine.process(&stick.snapshot());
        assert_eq!(engine.controls().get("roll"), 1.0);
    }
}
