use glam::{IVec3, Vec3};

/// Half the edge length of a block. Blocks are unit cubes centred on integer points.
pub const BLOCK_HALF_EXTENT: f32 = 0.5;

/// Encodes a block position as the `x_y_z` key used by the destroyed-resource set.
pub fn position_key(pos: IVec3) -> String {
    format!("{}_{}_{}", pos.x, pos.y, pos.z)
}

/// Decodes an `x_y_z` key. Returns `None` for anything that is not three integers.
pub fn parse_position_key(key: &str) -> Option<IVec3> {
    let mut parts = key.split('_');
    let x = parts.next()?.trim().parse::<i32>().ok()?;
    let y = parts.next()?.trim().parse::<i32>().ok()?;
    let z = parts.next()?.trim().parse::<i32>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(IVec3::new(x, y, z))
}

/// Block cell containing a world-space point.
pub fn cell_at(point: Vec3) -> IVec3 {
    (point + Vec3::splat(BLOCK_HALF_EXTENT)).floor().as_ivec3()
}

pub fn top_face_y(pos: IVec3) -> f32 {
    pos.y as f32 + BLOCK_HALF_EXTENT
}

pub fn planar_distance_sq(a: Vec3, column_x: f32, column_z: f32) -> f32 {
    let dx = a.x - column_x;
    let dz = a.z - column_z;
    dx * dx + dz * dz
}
