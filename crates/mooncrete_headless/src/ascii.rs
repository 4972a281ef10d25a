//! ASCII rendering of the puzzle board and the arcade playfield.
//!
//! Used by the `board` protocol command and by `simulate --ascii` to give a
//! quick look at a session without a graphical view.

use mooncrete_core::arcade::StructureKind;
use mooncrete_core::game::MoonGame;

/// Character for a structure kind.
fn structure_char(kind: StructureKind) -> char {
    match kind {
        StructureKind::LunarLand => '#',
        StructureKind::Mooncrete => '=',
        StructureKind::Radar => 'R',
        StructureKind::Turret => 'T',
        StructureKind::Building => 'B',
    }
}

fn framed(rows: Vec<String>, width: usize) -> Vec<String> {
    let edge = format!("+{}+", "-".repeat(width));
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(edge.clone());
    lines.extend(rows.into_iter().map(|row| format!("|{row}|")));
    lines.push(edge);
    lines
}

/// The puzzle board with the falling piece drawn in.
pub fn render_board(game: &MoonGame) -> Vec<String> {
    let board = game.board_with_piece();
    framed(board.to_glyph_rows(), board.width() as usize)
}

/// The arcade playfield, one character per cell.
///
/// Explosions draw over asteroids, which draw over missiles, which draw
/// over structures.
pub fn render_arcade(game: &MoonGame) -> Vec<String> {
    let arcade = game.arcade();
    let config = arcade.config();
    let columns = config.columns as usize;
    let rows = config.rows as usize;
    let mut canvas = vec![vec![' '; columns]; rows];

    let mut plot = |x: i32, y: i32, glyph: char| {
        if x >= 0 && y >= 0 && (x as usize) < columns && (y as usize) < rows {
            canvas[y as usize][x as usize] = glyph;
        }
    };

    for (_, structure) in arcade.structures() {
        plot(structure.cell.x, structure.cell.y, structure_char(structure.kind));
    }
    for (_, missile) in arcade.missiles() {
        let cell = missile.position.to_cell(config.cell_size);
        plot(cell.x, cell.y, '|');
    }
    for (_, asteroid) in arcade.asteroids() {
        let cell = asteroid.position.to_cell(config.cell_size);
        plot(cell.x, cell.y, '*');
    }
    for (_, explosion) in arcade.explosions() {
        let cell = explosion.position.to_cell(config.cell_size);
        plot(cell.x, cell.y, 'o');
    }

    framed(
        canvas.into_iter().map(|row| row.into_iter().collect()).collect(),
        columns,
    )
}

/// Header line plus board and playfield.
pub fn render_game(game: &MoonGame) -> Vec<String> {
    let board = game.scoreboard();
    let state = game
        .current_state()
        .map_or_else(|| "-".to_string(), |state| format!("{state:?}"));
    let time = game
        .time_left()
        .map_or_else(String::new, |seconds| format!(" time {seconds}s"));

    let mut lines = vec![format!(
        "{state} level {} score {}{time}",
        board.level, board.score
    )];
    lines.extend(render_board(game));
    lines.extend(render_arcade(game));
    lines
}
