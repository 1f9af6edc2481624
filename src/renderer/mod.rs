//! High-level rendering
//!
//! Geometry expansion, materials, lights, the fly camera, shadow targets and
//! the three-pass scene renderer. Everything here talks to the GPU through
//! the traits in [`crate::gpu`].

pub mod camera;
pub mod drawable;
pub mod geometry;
pub mod light;
pub mod passes;
pub mod scene;
pub mod shadow;
pub mod texture_map;
pub mod transform;

pub use camera::{FlyCamera, Movement};
pub use drawable::{Drawable, MATERIAL_UNIT_LIMIT};
pub use geometry::{GeometryBuilder, MeshData};
pub use light::{Attenuation, DirectionalLight, LightColor, LightSource, PointLight};
pub use passes::{
    FrameState, PassConfig, RenderMode, ScenePrograms, SceneRenderer, SHADOW_CUBE_UNIT_BASE,
    SHADOW_MAP_UNIT,
};
pub use scene::Scene;
pub use shadow::{
    cube_face_views, CubeShadowRange, DirectionalShadowVolume, LightSpace, ShadowCubeTarget,
    ShadowMapTarget, ShadowTarget, CUBE_FACES,
};
pub use texture_map::{bind_shadow_map, bind_texture_map, TextureMap, TextureParams, TextureRole};
pub use transform::{FigurePosition, Transform};
