//! Scene graph of the room viewport and the procedural room builder.

use glam::Vec3;
use planview_gpu::MeshVertex;

use super::backend::TextureId;
use crate::config::RoomConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Linear RGB base color.
    pub color: [f32; 3],
    pub opacity: f32,
    pub texture: Option<TextureId>,
}

impl Material {
    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: &'static str,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
    pub material: Material,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient {
        color: [f32; 3],
        intensity: f32,
    },
    /// `direction` points from the scene towards the light.
    Directional {
        color: [f32; 3],
        intensity: f32,
        direction: Vec3,
    },
}

/// Everything a viewport draws. Geometry changes bump `revision` so
/// backends can cache uploaded meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    background: [u8; 3],
    lights: Vec<Light>,
    meshes: Vec<Mesh>,
    revision: u64,
}

impl Scene {
    pub fn new(background: [u8; 3]) -> Self {
        Self {
            background,
            lights: Vec::new(),
            meshes: Vec::new(),
            revision: 0,
        }
    }

    pub fn background(&self) -> [u8; 3] {
        self.background
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn set_lights(&mut self, lights: Vec<Light>) {
        self.lights = lights;
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn set_meshes(&mut self, meshes: Vec<Mesh>) {
        self.meshes = meshes;
        self.revision += 1;
    }

    /// Remove all geometry, returning it.
    pub fn take_meshes(&mut self) -> Vec<Mesh> {
        self.revision += 1;
        std::mem::take(&mut self.meshes)
    }

    /// Remove geometry and lights.
    pub fn clear(&mut self) {
        self.lights.clear();
        self.take_meshes();
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.lights.is_empty()
    }
}

fn rgb(color: [u8; 3]) -> [f32; 3] {
    color.map(|c| c as f32 / 255.0)
}

/// Ambient plus directional light of the room.
pub fn room_lights(config: &RoomConfig) -> Vec<Light> {
    vec![
        Light::Ambient {
            color: rgb(config.ambient_color),
            intensity: config.ambient_intensity,
        },
        Light::Directional {
            color: rgb(config.directional_color),
            intensity: config.directional_intensity,
            direction: Vec3::from(config.light_direction)
                .try_normalize()
                .unwrap_or(Vec3::Y),
        },
    ]
}

/// Quad from four corners in order, with a shared normal.
fn quad(name: &'static str, corners: [Vec3; 4], uvs: [[f32; 2]; 4], normal: Vec3, material: Material) -> Mesh {
    let vertices = corners
        .iter()
        .zip(uvs)
        .map(|(p, uv)| MeshVertex {
            position: p.to_array(),
            normal: normal.to_array(),
            uv,
        })
        .collect();
    Mesh {
        name,
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
        material,
    }
}

/// Floor textured with `floor_texture` plus four translucent walls on its
/// edges, facing inward.
///
/// The image's top edge lies along the far side (negative z) of the floor,
/// as seen from the default camera.
pub fn build_room(config: &RoomConfig, floor_texture: TextureId) -> Vec<Mesh> {
    let size = config.floor_size;
    let half = size / 2.0;
    let floor_y = config.floor_elevation;
    let top_y = floor_y + config.wall_height;

    let floor = quad(
        "floor",
        [
            Vec3::new(-half, floor_y, -half),
            Vec3::new(half, floor_y, -half),
            Vec3::new(half, floor_y, half),
            Vec3::new(-half, floor_y, half),
        ],
        [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        Vec3::Y,
        Material {
            color: [1.0; 3],
            opacity: 1.0,
            texture: Some(floor_texture),
        },
    );

    let wall_material = Material {
        color: rgb(config.wall_color),
        opacity: config.wall_opacity.clamp(0.0, 1.0),
        texture: None,
    };

    let walls = [
        ("wall-front", Vec3::new(0.0, 0.0, -half), Vec3::Z),
        ("wall-back", Vec3::new(0.0, 0.0, half), Vec3::NEG_Z),
        ("wall-left", Vec3::new(-half, 0.0, 0.0), Vec3::X),
        ("wall-right", Vec3::new(half, 0.0, 0.0), Vec3::NEG_X),
    ]
    .into_iter()
    .map(|(name, center, inward)| {
        let along = Vec3::Y.cross(inward) * half;
        let bottom = center.with_y(floor_y);
        let top = center.with_y(top_y);
        quad(
            name,
            [bottom - along, bottom + along, top + along, top - along],
            [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
            inward,
            wall_material,
        )
    });

    std::iter::once(floor).chain(walls).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(mesh: &Mesh) -> (Vec3, Vec3) {
        mesh.vertices.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(lo, hi), v| {
                let p = Vec3::from(v.position);
                (lo.min(p), hi.max(p))
            },
        )
    }

    #[test]
    fn test_room_geometry() {
        let meshes = build_room(&RoomConfig::default(), TextureId::new(7));
        assert_eq!(meshes.len(), 5);

        let floor = &meshes[0];
        assert_eq!(floor.name, "floor");
        assert_eq!(floor.material.texture, Some(TextureId::new(7)));
        assert!(!floor.material.is_translucent());
        let (lo, hi) = bounds(floor);
        assert_eq!(lo, Vec3::new(-5.0, -0.5, -5.0));
        assert_eq!(hi, Vec3::new(5.0, -0.5, 5.0));

        for wall in &meshes[1..] {
            assert!(wall.material.is_translucent());
            assert_eq!(wall.material.opacity, 0.5);
            assert_eq!(wall.material.texture, None);
            let (lo, hi) = bounds(wall);
            assert!((lo.y - -0.5).abs() < 1e-6 && (hi.y - 2.5).abs() < 1e-6);
            // 10 wide along one horizontal axis, flat along the other.
            let extent = hi - lo;
            assert!((extent.x.max(extent.z) - 10.0).abs() < 1e-5);
            assert!(extent.x.min(extent.z).abs() < 1e-5);
        }
    }

    #[test]
    fn test_walls_face_inward() {
        let meshes = build_room(&RoomConfig::default(), TextureId::new(0));
        for wall in &meshes[1..] {
            let (lo, hi) = bounds(wall);
            let center = (lo + hi) / 2.0;
            let normal = Vec3::from(wall.vertices[0].normal);
            // Normal points from the wall towards the room center.
            assert!(normal.dot(-center.with_y(0.0)) > 0.0, "{}", wall.name);
        }
    }

    #[test]
    fn test_floor_uv_orientation() {
        let meshes = build_room(&RoomConfig::default(), TextureId::new(0));
        let floor = &meshes[0];
        for v in &floor.vertices {
            let expected = [(v.position[0] + 5.0) / 10.0, (v.position[2] + 5.0) / 10.0];
            assert_eq!(v.uv, expected);
        }
    }

    #[test]
    fn test_geometry_changes_bump_revision() {
        let mut scene = Scene::new([0xf5; 3]);
        scene.set_lights(room_lights(&RoomConfig::default()));
        assert_eq!(scene.revision(), 0);

        scene.set_meshes(build_room(&RoomConfig::default(), TextureId::new(1)));
        assert_eq!(scene.revision(), 1);

        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.revision(), 2);
    }

    #[test]
    fn test_room_lights() {
        let lights = room_lights(&RoomConfig::default());
        assert_eq!(
            lights[0],
            Light::Ambient {
                color: [0x40 as f32 / 255.0; 3],
                intensity: 2.0
            }
        );
        match lights[1] {
            Light::Directional { direction, intensity, .. } => {
                assert_eq!(intensity, 1.0);
                assert!((direction - Vec3::ONE.normalize()).length() < 1e-6);
            }
            other => panic!("expected directional light, got {other:?}"),
        }
    }
}
