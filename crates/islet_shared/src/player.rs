use glam::Vec3;

use crate::inventory::{Inventory, ResourceKind};

pub const DEFAULT_SPAWN: Vec3 = Vec3::new(0.0, 10.0, 0.0);
pub const SPAWN_HEIGHT: f32 = 10.0;
pub const DEFAULT_MAX_STAMINA: f32 = 10.0;
pub const MAX_PITCH: f32 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Feet position.
    pub position: Vec3,
    pub yaw: f32,
    /// Look angle above the horizon; not persisted.
    pub pitch: f32,
    pub vertical_velocity: f32,
    pub inventory: Inventory,
    pub selected: ResourceKind,
    pub stamina: f32,
    pub max_stamina: f32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::spawn_at(DEFAULT_SPAWN)
    }
}

impl PlayerState {
    pub fn spawn_at(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            vertical_velocity: 0.0,
            inventory: Inventory::new(),
            selected: ResourceKind::Wood,
            stamina: DEFAULT_MAX_STAMINA,
            max_stamina: DEFAULT_MAX_STAMINA,
        }
    }

    pub fn with_max_stamina(mut self, max_stamina: f32) -> Self {
        self.max_stamina = max_stamina.max(0.0);
        self.stamina = self.max_stamina;
        self
    }

    /// Unit vector the player faces. Yaw 0 looks down -Z.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Full look direction including pitch.
    pub fn look_direction(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(
            -self.yaw.sin() * cos_pitch,
            sin_pitch,
            -self.yaw.cos() * cos_pitch,
        )
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn eye(&self) -> Vec3 {
        self.position + Vec3::Y
    }

    pub fn select_slot(&mut self, slot: usize) {
        self.selected = ResourceKind::from_slot(slot);
    }

    pub fn selected_count(&self) -> u32 {
        self.inventory.count(self.selected)
    }

    pub fn set_stamina(&mut self, value: f32) {
        self.stamina = value.clamp(0.0, self.max_stamina);
    }

    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.vertical_velocity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{PlayerState, DEFAULT_SPAWN};
    use crate::inventory::ResourceKind;

    #[test]
    fn forward_follows_yaw() {
        let mut player = PlayerState::default();
        assert!(player.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        player.yaw = std::f32::consts::FRAC_PI_2;
        assert!(player.forward().abs_diff_eq(Vec3::NEG_X, 1e-6));

        player.set_pitch(-3.0);
        assert_eq!(player.pitch, -1.5);
        assert!(player.look_direction().y < -0.99);
        assert!((player.look_direction().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn stamina_is_clamped_to_range() {
        let mut player = PlayerState::default().with_max_stamina(4.0);
        assert_eq!(player.stamina, 4.0);
        player.set_stamina(-1.0);
        assert_eq!(player.stamina, 0.0);
        player.set_stamina(9.0);
        assert_eq!(player.stamina, 4.0);
    }

    #[test]
    fn slot_selection_and_teleport() {
        let mut player = PlayerState::default();
        player.select_slot(2);
        assert_eq!(player.selected, ResourceKind::Stone);
        player.select_slot(7);
        assert_eq!(player.selected, ResourceKind::Wood);

        player.vertical_velocity = -0.4;
        player.teleport(DEFAULT_SPAWN);
        assert_eq!(player.vertical_velocity, 0.0);
    }
}
