//! Draw-command emission.
//!
//! The core never draws. Each frame it turns visible state into a list of
//! [`DrawCommand`]s in view coordinates and hands them to a [`Renderer`].
//! Commands are plain floats since they leave the deterministic world here.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::camera::{Camera, Viewport};
use crate::player::Colour;
use crate::selection::DragRect;
use crate::simulation::Simulation;
use crate::unit::Unit;

/// Line width of a selected unit's health arc.
pub const SELECTED_LINE_WIDTH: f32 = 2.5;
/// Line width of an unselected unit's health arc.
pub const LINE_WIDTH: f32 = 1.0;

/// Independent canvas layers, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Scrolled map image.
    Map,
    /// Unit sprites and health arcs.
    Units,
    /// Live selection rectangle.
    Selection,
}

/// A single drawing instruction, in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// Wipe a layer.
    Clear(Layer),
    /// Draw the map image with its top-left corner at `(-x, -y)`.
    Map {
        /// Camera gap x.
        x: f32,
        /// Camera gap y.
        y: f32,
    },
    /// Filled disc.
    Sprite {
        /// Centre x.
        x: f32,
        /// Centre y.
        y: f32,
        /// Radius.
        radius: f32,
        /// Fill colour.
        colour: Colour,
    },
    /// Stroked arc from angle 0 through `sweep` radians.
    HealthArc {
        /// Centre x.
        x: f32,
        /// Centre y.
        y: f32,
        /// Radius.
        radius: f32,
        /// Swept angle, `2π` at full health.
        sweep: f32,
        /// Stroke width.
        line_width: f32,
        /// Stroke colour.
        colour: Colour,
    },
    /// Stroked rectangle; width and height may be negative.
    Rect {
        /// Origin x.
        x: f32,
        /// Origin y.
        y: f32,
        /// Width.
        width: f32,
        /// Height.
        height: f32,
        /// Stroke colour.
        colour: Colour,
    },
}

/// Sink for draw commands.
pub trait Renderer {
    /// Consume one command.
    fn submit(&mut self, command: &DrawCommand);
}

/// Renderer that keeps every command it receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingRenderer {
    commands: Vec<DrawCommand>,
}

impl RecordingRenderer {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recorded commands.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of sprites recorded (one per drawn unit).
    #[must_use]
    pub fn sprite_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Sprite { .. }))
            .count()
    }
}

impl Renderer for RecordingRenderer {
    fn submit(&mut self, command: &DrawCommand) {
        self.commands.push(*command);
    }
}

/// Frame pacing at a fixed frame rate.
///
/// `then` is advanced to `now - (delta % interval)` on every rendered frame,
/// so frames stay on the interval grid even when the host calls late.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    interval_ms: f64,
    then_ms: f64,
}

impl FrameClock {
    /// Clock for `fps` frames per second, starting at `now_ms`.
    #[must_use]
    pub fn new(fps: u32, now_ms: f64) -> Self {
        Self {
            interval_ms: 1000.0 / f64::from(fps.max(1)),
            then_ms: now_ms,
        }
    }

    /// Milliseconds between frames.
    #[must_use]
    pub const fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Check whether a frame is due at `now_ms`, advancing the clock if so.
    pub fn should_render(&mut self, now_ms: f64) -> bool {
        let delta = now_ms - self.then_ms;
        if delta > self.interval_ms {
            self.then_ms = now_ms - (delta % self.interval_ms);
            true
        } else {
            false
        }
    }
}

/// Display colour of a unit: its archetype colour, else its owner's.
#[must_use]
pub fn unit_colour(sim: &Simulation, unit: &Unit) -> Colour {
    sim.config()
        .archetypes
        .get(unit.archetype())
        .colour
        .or_else(|| {
            unit.owner()
                .and_then(|owner| sim.player(owner))
                .map(|player| player.colour())
        })
        .unwrap_or(Colour::WHITE)
}

/// Unit layer: a clear, then a health arc and a sprite per visible unit in
/// ascending id order.
#[must_use]
pub fn unit_draw_commands(
    sim: &Simulation,
    camera: &Camera,
    viewport: Viewport,
) -> Vec<DrawCommand> {
    let mut commands = vec![DrawCommand::Clear(Layer::Units)];

    for id in sim.units().sorted_ids() {
        let Some(unit) = sim.unit(id) else {
            continue;
        };
        if !camera.is_visible(unit.pos(), viewport) {
            continue;
        }

        let (x, y) = camera.to_view(unit.pos()).to_f32();
        let size = sim.config().archetypes.get(unit.archetype()).size as f32;
        let colour = unit_colour(sim, unit);
        let line_width = if unit.is_selected() {
            SELECTED_LINE_WIDTH
        } else {
            LINE_WIDTH
        };

        commands.push(DrawCommand::HealthArc {
            x,
            y,
            radius: size + line_width + 1.0,
            sweep: TAU * unit.health().fraction(),
            line_width,
            colour,
        });
        commands.push(DrawCommand::Sprite {
            x,
            y,
            radius: size,
            colour,
        });
    }

    commands
}

/// Selection layer: a clear, plus the live rectangle if a drag is in progress.
#[must_use]
pub fn selection_draw_commands(rect: Option<DragRect>) -> Vec<DrawCommand> {
    let mut commands = vec![DrawCommand::Clear(Layer::Selection)];
    if let Some(rect) = rect {
        let (x, y) = rect.origin.to_f32();
        let (width, height) = rect.size.to_f32();
        commands.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            colour: Colour::WHITE,
        });
    }
    commands
}

/// Map layer: the background scrolled by the camera gap.
#[must_use]
pub fn map_draw_commands(camera: &Camera) -> Vec<DrawCommand> {
    let (x, y) = camera.gap.to_f32();
    vec![DrawCommand::Clear(Layer::Map), DrawCommand::Map { x, y }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::Archetype;
    use crate::config::{SimulationConfig, WorldSize};
    use crate::math::Vec2Fixed;
    use crate::player::PlayerId;

    #[test]
    fn test_frame_clock_paces() {
        let mut clock = FrameClock::new(50, 0.0);
        assert!((clock.interval_ms() - 20.0).abs() < f64::EPSILON);
        assert!(!clock.should_render(10.0));
        assert!(!clock.should_render(20.0));
        assert!(clock.should_render(25.0));
        // then = 25 - (25 % 20) = 20
        assert!(!clock.should_render(40.0));
        assert!(clock.should_render(41.0));
    }

    #[test]
    fn test_frame_clock_zero_fps() {
        let clock = FrameClock::new(0, 0.0);
        assert!((clock.interval_ms() - 1000.0).abs() < f64::EPSILON);
    }

    fn sim_with_units() -> Simulation {
        let mut sim = Simulation::new(
            WorldSize::new(2000, 2000),
            SimulationConfig::default().with_wander(None),
        );
        sim.add_player_with_colour(PlayerId::AI, Colour::rgb(1, 2, 3))
            .unwrap();
        sim.add_player_with_colour(PlayerId(1), Colour::rgb(0, 0, 255))
            .unwrap();
        sim.spawn_unit(Archetype::Soldier, Some(PlayerId(1)), Vec2Fixed::from_int(100, 100))
            .unwrap();
        sim.spawn_unit(Archetype::Zombie, Some(PlayerId::AI), Vec2Fixed::from_int(300, 200))
            .unwrap();
        sim.spawn_unit(Archetype::Zombie, Some(PlayerId::AI), Vec2Fixed::from_int(1500, 1500))
            .unwrap();
        sim
    }

    #[test]
    fn test_unit_commands_cull_and_colour() {
        let mut sim = sim_with_units();
        let soldier = sim.units_of(PlayerId(1))[0];
        sim.set_selected(soldier, true).unwrap();
        sim.deal_damage(soldier, 15.0).unwrap();

        let camera = Camera {
            gap: Vec2Fixed::from_int(50, 50),
        };
        let commands = unit_draw_commands(&sim, &camera, Viewport::new(800, 600));

        // Clear + 2 visible units x 2 commands
        assert_eq!(commands.len(), 5);
        assert_eq!(commands[0], DrawCommand::Clear(Layer::Units));
        assert_eq!(
            commands[1],
            DrawCommand::HealthArc {
                x: 50.0,
                y: 50.0,
                radius: 7.0 + 2.5 + 1.0,
                sweep: TAU * 0.5,
                line_width: 2.5,
                colour: Colour::rgb(0, 0, 255),
            }
        );
        assert_eq!(
            commands[4],
            DrawCommand::Sprite {
                x: 250.0,
                y: 150.0,
                radius: 5.0,
                colour: Colour::BLACK,
            }
        );
    }

    #[test]
    fn test_selection_commands() {
        assert_eq!(
            selection_draw_commands(None),
            vec![DrawCommand::Clear(Layer::Selection)]
        );
        let rect = DragRect {
            origin: Vec2Fixed::from_int(10, 20),
            size: Vec2Fixed::from_int(-5, 30),
        };
        let commands = selection_draw_commands(Some(rect));
        assert_eq!(
            commands[1],
            DrawCommand::Rect {
                x: 10.0,
                y: 20.0,
                width: -5.0,
                height: 30.0,
                colour: Colour::WHITE,
            }
        );
    }

    #[test]
    fn test_recording_renderer() {
        let mut renderer = RecordingRenderer::new();
        let sim = sim_with_units();
        for command in unit_draw_commands(&sim, &Camera::new(), Viewport::new(800, 600)) {
            renderer.submit(&command);
        }
        assert_eq!(renderer.sprite_count(), 2);
        assert_eq!(renderer.take().len(), 5);
        assert!(renderer.commands().is_empty());
    }
}
