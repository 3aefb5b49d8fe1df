//! One in-process game session.
//!
//! [`Game`] wires the data flow between the pieces: pointer events feed the
//! selection controller and the camera, each animation frame runs the
//! simulation ticks that are due, and the frame clock decides when the
//! layers are re-emitted to the renderer.

use crate::camera::{Camera, CameraController, Viewport};
use crate::config::{CameraSettings, SimulationConfig, WorldSize};
use crate::input::{PointerEvent, PointerState};
use crate::player::PlayerId;
use crate::render::{
    map_draw_commands, selection_draw_commands, unit_draw_commands, FrameClock, Renderer,
};
use crate::selection::{SelectionController, SelectionOutcome};
use crate::simulation::{Simulation, TickEvents};

/// Upper bound on ticks run in a single frame after a stall.
pub const MAX_TICKS_PER_FRAME: u64 = 30;

/// What happened during one call to [`Game::frame`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Simulation ticks run this frame.
    pub ticks_run: u64,
    /// The camera scrolled.
    pub camera_moved: bool,
    /// Layers were emitted to the renderer.
    pub rendered: bool,
    /// Draw commands submitted.
    pub commands: usize,
    /// Events of every tick run, in order.
    pub events: Vec<TickEvents>,
}

/// Host-visible result of a pointer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputResponse {
    /// Suppress the host's default action (the native context menu).
    pub prevent_default: bool,
    /// Selection or order outcome, for press/release events.
    pub outcome: Option<SelectionOutcome>,
}

/// A running session: simulation, camera, selection and frame pacing.
#[derive(Debug, Clone)]
pub struct Game {
    sim: Simulation,
    camera: Camera,
    controller: CameraController,
    viewport: Viewport,
    selection: SelectionController,
    clock: FrameClock,
    pointer: PointerState,
    started_ms: f64,
    ticks_run: u64,
    map_dirty: bool,
    selection_dirty: bool,
}

impl Game {
    /// Start a session at host time `now_ms`, acting for `player`.
    #[must_use]
    pub fn new(
        sim: Simulation,
        viewport: Viewport,
        camera_settings: CameraSettings,
        player: PlayerId,
        now_ms: f64,
    ) -> Self {
        let fps = sim.config().fps;
        Self {
            sim,
            camera: Camera::new(),
            controller: CameraController::new(camera_settings),
            viewport,
            selection: SelectionController::new(player),
            clock: FrameClock::new(fps, now_ms),
            pointer: PointerState::default(),
            started_ms: now_ms,
            ticks_run: 0,
            map_dirty: true,
            selection_dirty: false,
        }
    }

    /// Convenience constructor with an empty simulation.
    #[must_use]
    pub fn with_world(
        world: WorldSize,
        config: SimulationConfig,
        viewport: Viewport,
        player: PlayerId,
        now_ms: f64,
    ) -> Self {
        Self::new(
            Simulation::new(world, config),
            viewport,
            CameraSettings::default(),
            player,
            now_ms,
        )
    }

    /// The simulation.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Mutable access to the simulation, for setup and scripted events.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    /// The camera.
    #[must_use]
    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The viewport.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The selection controller.
    #[must_use]
    pub const fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Resize the viewport. The camera is re-clamped to the new bounds.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let max = Camera::max_gap(viewport, self.sim.world());
        self.camera.gap = self.camera.gap.min(max);
        self.map_dirty = true;
    }

    /// Feed one pointer event.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> InputResponse {
        match event {
            PointerEvent::Moved { x, y } => {
                self.pointer.record_move(x, y);
                InputResponse {
                    prevent_default: false,
                    outcome: None,
                }
            }
            PointerEvent::Down(button) => {
                let outcome = self
                    .selection
                    .pointer_down(button, self.pointer.position(), &self.camera);
                self.selection_dirty = true;
                InputResponse {
                    prevent_default: false,
                    outcome: Some(outcome),
                }
            }
            PointerEvent::Up(button) => {
                let outcome = self.selection.pointer_up(
                    button,
                    self.pointer.position(),
                    &self.camera,
                    &mut self.sim,
                );
                self.selection_dirty = true;
                InputResponse {
                    prevent_default: false,
                    outcome: Some(outcome),
                }
            }
            PointerEvent::ContextMenu => {
                let action = self.selection.context_menu(&mut self.sim);
                InputResponse {
                    prevent_default: action.prevent_default,
                    outcome: None,
                }
            }
        }
    }

    /// Run one animation frame at host time `now_ms`.
    ///
    /// Order: camera scroll, due simulation ticks, then (if the frame clock
    /// allows) the map, unit and selection layers.
    pub fn frame(&mut self, now_ms: f64, renderer: &mut impl Renderer) -> FrameReport {
        let mut report = FrameReport::default();

        report.camera_moved = self.controller.update(
            &mut self.camera,
            self.pointer.position(),
            self.viewport,
            self.sim.world(),
        );
        self.map_dirty |= report.camera_moved;

        let due = self.ticks_due(now_ms);
        if due > MAX_TICKS_PER_FRAME {
            tracing::warn!(due, max = MAX_TICKS_PER_FRAME, "simulation behind, capping ticks");
        }
        for _ in 0..due.min(MAX_TICKS_PER_FRAME) {
            report.events.push(self.sim.tick());
            self.ticks_run += 1;
            report.ticks_run += 1;
        }

        if self.clock.should_render(now_ms) {
            report.rendered = true;
            let mut commands = Vec::new();
            if std::mem::take(&mut self.map_dirty) {
                commands.extend(map_draw_commands(&self.camera));
            }
            commands.extend(unit_draw_commands(&self.sim, &self.camera, self.viewport));

            let rect = self
                .selection
                .drag_rect(self.pointer.position(), &self.camera, self.sim.world());
            // Keep redrawing while dragging; one final clear once it ends
            if rect.is_some() || std::mem::take(&mut self.selection_dirty) {
                commands.extend(selection_draw_commands(rect));
            }

            for command in &commands {
                renderer.submit(command);
            }
            report.commands = commands.len();
        }

        report
    }

    fn ticks_due(&self, now_ms: f64) -> u64 {
        let elapsed = (now_ms - self.started_ms).max(0.0);
        let target = (elapsed * f64::from(self.sim.config().tick_rate) / 1000.0).floor() as u64;
        target.saturating_sub(self.ticks_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::Archetype;
    use crate::input::Button;
    use crate::math::Vec2Fixed;
    use crate::player::Colour;
    use crate::render::{DrawCommand, Layer, RecordingRenderer};

    const HUMAN: PlayerId = PlayerId(1);

    fn game() -> Game {
        let mut game = Game::with_world(
            WorldSize::new(2000, 1500),
            SimulationConfig::default().with_wander(None),
            Viewport::new(800, 600),
            HUMAN,
            0.0,
        );
        let sim = game.simulation_mut();
        sim.add_player_with_colour(PlayerId::AI, Colour::BLACK).unwrap();
        sim.add_player_with_colour(HUMAN, Colour::WHITE).unwrap();
        sim.spawn_unit(Archetype::Soldier, Some(HUMAN), Vec2Fixed::from_int(100, 100))
            .unwrap();
        game
    }

    #[test]
    fn test_frame_runs_due_ticks() {
        let mut game = game();
        let mut renderer = RecordingRenderer::new();
        game.handle_pointer(PointerEvent::Moved { x: 400.0, y: 300.0 });

        let report = game.frame(90.0, &mut renderer);
        assert_eq!(report.ticks_run, 5);
        assert_eq!(report.events.len(), 5);
        assert!(report.rendered);
        assert!(!report.camera_moved);

        // Clock advanced to ~83.3, so 95 is inside the same frame interval
        let report = game.frame(95.0, &mut renderer);
        assert_eq!(report.ticks_run, 0);
        assert!(!report.rendered);
        assert_eq!(game.simulation().get_tick(), 5);
    }

    #[test]
    fn test_stall_is_capped() {
        let mut game = game();
        let mut renderer = RecordingRenderer::new();
        game.handle_pointer(PointerEvent::Moved { x: 400.0, y: 300.0 });
        let report = game.frame(10_000.0, &mut renderer);
        assert_eq!(report.ticks_run, MAX_TICKS_PER_FRAME);
    }

    #[test]
    fn test_first_frame_draws_map_once() {
        let mut game = game();
        let mut renderer = RecordingRenderer::new();
        game.handle_pointer(PointerEvent::Moved { x: 400.0, y: 300.0 });

        game.frame(20.0, &mut renderer);
        let first = renderer.take();
        assert!(first.contains(&DrawCommand::Clear(Layer::Map)));

        game.frame(40.0, &mut renderer);
        let second = renderer.take();
        assert!(!second.contains(&DrawCommand::Clear(Layer::Map)));
        assert!(second.contains(&DrawCommand::Clear(Layer::Units)));
    }

    #[test]
    fn test_edge_scroll_marks_map_dirty() {
        let mut game = game();
        let mut renderer = RecordingRenderer::new();
        game.handle_pointer(PointerEvent::Moved { x: 799.0, y: 300.0 });
        game.frame(20.0, &mut renderer);
        renderer.take();

        let report = game.frame(40.0, &mut renderer);
        assert!(report.camera_moved);
        assert_eq!(game.camera().gap, Vec2Fixed::from_int(40, 0));
        assert!(renderer
            .commands()
            .contains(&DrawCommand::Map { x: 40.0, y: 0.0 }));
    }

    #[test]
    fn test_pointer_drag_selects_and_orders() {
        let mut game = game();
        let soldier = game.simulation().units_of(HUMAN)[0];

        game.handle_pointer(PointerEvent::Moved { x: 50.0, y: 50.0 });
        game.handle_pointer(PointerEvent::Down(Button::Left));
        game.handle_pointer(PointerEvent::Moved { x: 150.0, y: 150.0 });
        let response = game.handle_pointer(PointerEvent::Up(Button::Left));
        assert!(matches!(
            response.outcome,
            Some(SelectionOutcome::Selected { .. })
        ));
        assert!(game.simulation().unit(soldier).unwrap().is_selected());

        game.handle_pointer(PointerEvent::Moved { x: 300.0, y: 200.0 });
        game.handle_pointer(PointerEvent::Down(Button::Left));
        game.handle_pointer(PointerEvent::Moved { x: 305.0, y: 205.0 });
        game.handle_pointer(PointerEvent::Up(Button::Left));
        assert_eq!(
            game.simulation().unit(soldier).unwrap().destination(),
            Vec2Fixed::from_int(305, 205)
        );
    }

    #[test]
    fn test_selection_layer_cleared_once_after_drag() {
        let mut game = game();
        let mut renderer = RecordingRenderer::new();
        game.handle_pointer(PointerEvent::Moved { x: 400.0, y: 300.0 });
        game.handle_pointer(PointerEvent::Down(Button::Left));
        game.handle_pointer(PointerEvent::Moved { x: 450.0, y: 350.0 });

        game.frame(20.0, &mut renderer);
        let live = renderer.take();
        assert!(live.iter().any(|c| matches!(c, DrawCommand::Rect { .. })));

        game.handle_pointer(PointerEvent::Up(Button::Left));
        game.frame(40.0, &mut renderer);
        let ended = renderer.take();
        assert!(ended.contains(&DrawCommand::Clear(Layer::Selection)));
        assert!(!ended.iter().any(|c| matches!(c, DrawCommand::Rect { .. })));

        game.frame(60.0, &mut renderer);
        assert!(!renderer
            .take()
            .contains(&DrawCommand::Clear(Layer::Selection)));
    }

    #[test]
    fn test_context_menu_prevents_default() {
        let mut game = game();
        let response = game.handle_pointer(PointerEvent::ContextMenu);
        assert!(response.prevent_default);
    }

    #[test]
    fn test_resize_reclamps_camera() {
        let mut game = game();
        game.camera.gap = Vec2Fixed::from_int(1200, 900);
        game.resize(Viewport::new(1600, 1000));
        assert_eq!(game.camera().gap, Vec2Fixed::from_int(400, 500));
    }
}
