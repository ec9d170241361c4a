use glam::IVec2;
use rustc_hash::FxHashMap;

/// Resting centre height of a water tile before the wave offset is applied.
pub const WATER_REST_Y: f32 = -0.7;
/// Nominal water surface used for build rules.
pub const WATER_SURFACE_Y: f32 = -0.5;
const WAVE_AMPLITUDE: f32 = 0.2;
const WAVE_FREQUENCY: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterTile {
    pub column: IVec2,
    /// Current centre height; tiles are unit cubes like blocks.
    pub y: f32,
}

impl WaterTile {
    fn at_rest(column: IVec2) -> Self {
        Self {
            column,
            y: WATER_REST_Y,
        }
    }

    pub fn top(&self) -> f32 {
        self.y + 0.5
    }

    pub fn wave_height(column: IVec2, time: f32) -> f32 {
        WATER_REST_Y
            + (time + column.x as f32 * WAVE_FREQUENCY).sin() * WAVE_AMPLITUDE
            + (time + column.y as f32 * WAVE_FREQUENCY).cos() * WAVE_AMPLITUDE
    }
}

/// Animated water tiles indexed by column.
#[derive(Debug, Clone, Default)]
pub struct WaterField {
    tiles: Vec<WaterTile>,
    by_column: FxHashMap<IVec2, usize>,
}

impl WaterField {
    pub fn from_columns(columns: impl IntoIterator<Item = IVec2>) -> Self {
        let mut field = Self::default();
        for column in columns {
            if field.by_column.contains_key(&column) {
                continue;
            }
            field.by_column.insert(column, field.tiles.len());
            field.tiles.push(WaterTile::at_rest(column));
        }
        field
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[WaterTile] {
        &self.tiles
    }

    pub fn tile(&self, column: IVec2) -> Option<&WaterTile> {
        self.by_column.get(&column).map(|&index| &self.tiles[index])
    }

    pub fn has_water(&self, column: IVec2) -> bool {
        self.by_column.contains_key(&column)
    }

    pub fn animate(&mut self, time: f32) {
        for tile in &mut self.tiles {
            tile.y = WaterTile::wave_height(tile.column, time);
        }
    }

    /// Tiles whose column centre lies strictly within `radius` of the planar point.
    pub fn tiles_near(&self, x: f32, z: f32, radius: f32) -> impl Iterator<Item = &WaterTile> + '_ {
        let reach = radius.ceil() as i32;
        let base = IVec2::new(x.round() as i32, z.round() as i32);
        let radius_sq = radius * radius;
        (-reach..=reach)
            .flat_map(move |dx| (-reach..=reach).map(move |dz| base + IVec2::new(dx, dz)))
            .filter_map(move |column| self.tile(column))
            .filter(move |tile| {
                let dx = x - tile.column.x as f32;
                let dz = z - tile.column.y as f32;
                dx * dx + dz * dz < radius_sq
            })
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::{WaterField, WaterTile, WATER_REST_Y};

    #[test]
    fn duplicate_columns_collapse_to_one_tile() {
        let field = WaterField::from_columns([IVec2::new(1, 1), IVec2::new(1, 1), IVec2::new(2, 1)]);
        assert_eq!(field.len(), 2);
        assert_eq!(field.tile(IVec2::new(1, 1)).map(|t| t.y), Some(WATER_REST_Y));
    }

    #[test]
    fn wave_stays_within_amplitude_band() {
        let mut field = WaterField::from_columns((-5..5).map(|x| IVec2::new(x, -x)));
        for step in 0..50 {
            field.animate(step as f32 * 0.37);
            for tile in field.tiles() {
                assert!(tile.y >= WATER_REST_Y - 0.4 - 1e-5);
                assert!(tile.y <= WATER_REST_Y + 0.4 + 1e-5);
            }
        }
        field.animate(1.0);
        let tile = field.tile(IVec2::new(3, -3)).expect("tile exists");
        assert_eq!(tile.y, WaterTile::wave_height(IVec2::new(3, -3), 1.0));
    }

    #[test]
    fn nearby_lookup_uses_strict_planar_radius() {
        let field = WaterField::from_columns([IVec2::new(0, 0), IVec2::new(1, 0), IVec2::new(3, 3)]);
        let near: Vec<IVec2> = field.tiles_near(0.2, 0.0, 1.0).map(|t| t.column).collect();
        assert_eq!(near.len(), 2);
        assert!(near.contains(&IVec2::new(0, 0)));
        assert!(near.contains(&IVec2::new(1, 0)));

        assert_eq!(field.tiles_near(0.0, 0.0, 1.0).count(), 1);
    }
}
