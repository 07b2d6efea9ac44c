use sprout_core::{BlockCategory, BlockValue, RowOrder};
use sprout_world::{query, GridWorld};

/// Character drawn for a cell value.
pub(crate) fn glyph(value: BlockValue) -> char {
    match value {
        BlockValue::EMPTY => '.',
        BlockValue::BEDROCK => '#',
        BlockValue::GRASS => '"',
        BlockValue::DIRT => '=',
        BlockValue::CHEST => 'C',
        BlockValue::LAVA => '~',
        BlockValue::SHOP => '$',
        BlockValue::GRASS_SEED | BlockValue::DIRT_SEED => ',',
        BlockValue::GRASS_TREE | BlockValue::DIRT_TREE => 'T',
        BlockValue::DOOR => 'D',
        BlockValue::PLAYER_SPAWN => 'P',
        BlockValue::ENEMY_SPAWN => 'E',
        BlockValue::BOSS_SPAWN => 'B',
        other => match BlockCategory::classify(other) {
            BlockCategory::Blocks => '%',
            BlockCategory::Trees => 't',
            BlockCategory::BackgroundBlocks => ':',
            BlockCategory::Collectables => '*',
            BlockCategory::Unknown => '?',
        },
    }
}

/// Draws the active level top row first, one line per row.
pub(crate) fn render(world: &GridWorld) -> String {
    let rows = i32::try_from(query::dimensions(world).rows()).unwrap_or(0);
    let mut out = String::new();
    for row in 0..rows {
        out.extend(
            query::row_values(world, row, RowOrder::TopDown)
                .into_iter()
                .map(glyph),
        );
        out.push('\n');
    }
    out
}
