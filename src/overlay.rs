//! The 3D overlay: wireframe head geometry and camera placement.

use bevy::prelude::*;
use bevy::render::mesh::Mesh;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::PrimitiveTopology;

/// Narrow field of view, so the head fills the frame like a portrait.
pub const CAMERA_FOV_DEG: f32 = 20.0;
/// Camera sits just over a meter in front of the face.
pub const CAMERA_DISTANCE: f32 = 1.1;

/// Head-sized ellipsoid radii in meters (width, height, depth).
const RADII: [f32; 3] = [0.08, 0.11, 0.09];
const STACKS: usize = 12;
const SLICES: usize = 16;

/// Wireframe head: an ellipsoid traced as latitude rings and longitude
/// arcs, rendered as a line list. Stands in for a scanned face mesh
/// drawn with line fill.
pub fn head_mesh() -> Mesh {
    use std::f32::consts::{PI, TAU};

    let point = |i: usize, j: usize| -> [f32; 3] {
        let theta = PI * i as f32 / STACKS as f32;
        let phi = TAU * j as f32 / SLICES as f32;
        [
            RADII[0] * theta.sin() * phi.sin(),
            RADII[1] * theta.cos(),
            RADII[2] * theta.sin() * phi.cos(),
        ]
    };

    let mut lines: Vec<[f32; 3]> = Vec::new();
    // latitude rings (poles carry no ring)
    for i in 1..STACKS {
        for j in 0..SLICES {
            lines.push(point(i, j));
            lines.push(point(i, j + 1));
        }
    }
    // longitude arcs, pole to pole
    for j in 0..SLICES {
        for i in 0..STACKS {
            lines.push(point(i, j));
            lines.push(point(i + 1, j));
        }
    }

    let normals = vec![[0.0, 0.0, 1.0]; lines.len()];
    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, lines);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh
}

pub fn camera_transform() -> Transform {
    Transform::from_xyz(0.0, 0.0, CAMERA_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y)
}
