//! ASCII map of a simulation for terminal review.
//!
//! Each character covers a block of the world. Blocks show how many units
//! the spatial grid holds there: `.` for none, `1`-`9`, then `+`. Soldiers
//! are overlaid as `S` so the squad stays visible inside a horde.

use hvz_core::archetype::Archetype;
use hvz_core::simulation::Simulation;

/// Size of the ASCII viewport.
#[derive(Debug, Clone, Copy)]
pub struct AsciiConfig {
    /// Characters per row.
    pub width: usize,
    /// Rows of map, not counting the legend.
    pub height: usize,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
        }
    }
}

fn density_char(count: usize) -> char {
    match count {
        0 => '.',
        1..=9 => char::from_digit(count as u32, 10).unwrap_or('+'),
        _ => '+',
    }
}

/// Render the whole world as ASCII, followed by a one-line legend.
#[must_use]
pub fn render_ascii(sim: &Simulation, config: &AsciiConfig) -> String {
    let width = config.width.max(1);
    let height = config.height.max(1);
    let world = sim.world();
    let world_w = f64::from(world.width.max(1));
    let world_h = f64::from(world.height.max(1));

    let column = |x: f64| ((x / world_w * width as f64) as usize).min(width - 1);
    let row = |y: f64| ((y / world_h * height as f64) as usize).min(height - 1);

    let mut counts = vec![vec![0usize; width]; height];
    let cell_size = f64::from(sim.grid().cell_size());
    for (cell, occupants) in sim.grid().occupied_cells() {
        let x = f64::from(cell.i) * cell_size;
        let y = f64::from(cell.j) * cell_size;
        counts[row(y)][column(x)] += occupants;
    }

    let mut rows: Vec<Vec<char>> = counts
        .iter()
        .map(|line| line.iter().map(|&n| density_char(n)).collect())
        .collect();

    let mut soldiers = 0;
    let mut zombies = 0;
    for unit in sim.units().iter() {
        match unit.archetype() {
            Archetype::Soldier => {
                soldiers += 1;
                let pos = unit.pos();
                rows[row(pos.y.to_num::<f64>())][column(pos.x.to_num::<f64>())] = 'S';
            }
            Archetype::Zombie => zombies += 1,
        }
    }

    let mut output = String::with_capacity((width + 1) * (height + 1));
    for line in rows {
        output.extend(line);
        output.push('\n');
    }
    output.push_str(&format!(
        "tick {}  soldiers {}  zombies {}\n",
        sim.get_tick(),
        soldiers,
        zombies
    ));
    output
}
