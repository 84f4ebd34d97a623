mod common;

use common::*;
use p3d_viewer::gpu::recording::GpuCall;
use p3d_viewer::gpu::TextureId;
use p3d_viewer::model::{DecodedChunk, DecodedModel};
use p3d_viewer::LoadError;
use std::collections::HashSet;

fn quad(material: usize, uvs: bool, index_offset: u32, index_count: u32) -> DecodedChunk {
    DecodedChunk {
        positions: vec![[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]],
        normals: Some(vec![[0.0, 0.0, 1.0]; 4]),
        uvs: uvs.then(|| vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
        index_offset,
        index_count,
        material,
    }
}

#[test]
fn reset_distance_and_empty_frame() {
    let mut viewer = viewer_with(StubModel::new(Vec::new(), 5.0, 0));
    viewer.load_model(b"model", "p3d").unwrap();

    assert!((viewer.camera().camera_dist() - 4.7 * 5.0).abs() < 1e-4);

    viewer.gpu_mut().clear_calls();
    viewer.draw_frame();
    let gpu = viewer.gpu();
    assert!(gpu.draw_calls().is_empty());
    assert!(gpu.calls.contains(&GpuCall::Clear(viewer.config().clear_color)));
    assert!(gpu.calls.contains(&GpuCall::Viewport {
        x: 0,
        y: 0,
        width: 800,
        height: 600
    }));
    assert!(!gpu
        .calls
        .iter()
        .any(|c| matches!(c, GpuCall::UseProgram(_) | GpuCall::UniformMatrix4 { .. })));
}

#[test]
fn nothing_loaded_is_an_idle_frame() {
    let mut viewer = viewer_with(StubModel::new(vec![stub_chunk(0, 3, 0, false)], 1.0, 1));
    viewer.gpu_mut().clear_calls();
    viewer.draw_frame();
    assert_eq!(viewer.gpu().calls, vec![GpuCall::Clear(viewer.config().clear_color)]);
}

#[test]
fn zero_index_chunks_are_never_drawn() {
    let model = DecodedModel {
        chunks: vec![quad(0, false, 0, 0), quad(0, false, 0, 6)],
        indices: vec![0, 1, 2, 0, 2, 3],
        material_count: 1,
    };
    let mut viewer = viewer_with(gpu_model(model));
    viewer.load_model(b"model", ".P3D").unwrap();
    viewer.draw_frame();

    let draws = viewer.gpu().draw_calls();
    assert_eq!(draws.len(), 1);
    assert!(matches!(draws[0], GpuCall::DrawIndexed { count: 6, byte_offset: 0, .. }));
}

#[test]
fn failed_variant_skips_its_chunks_every_frame() {
    init_logging();
    let mut gpu = p3d_viewer::gpu::recording::RecordingGpu::new();
    gpu.reject_shaders_containing("#define USE_DIFFUSE_TEXTURE");
    let mut viewer = p3d_viewer::Viewer::new(
        gpu,
        MockPlatform::default(),
        StubModel::new(
            vec![
                stub_chunk(0, 3, 0, true),
                stub_chunk(3, 3, 0, false),
                stub_chunk(6, 3, 1, true),
            ],
            2.0,
            2,
        ),
    );
    viewer.on_surface_created();
    viewer.on_surface_changed(320, 240);
    viewer.load_model(b"model", "p3d").unwrap();

    for _ in 0..3 {
        viewer.gpu_mut().clear_calls();
        viewer.draw_frame();
        let draws = viewer.gpu().draw_calls();
        assert_eq!(draws.len(), 1);
        assert!(matches!(draws[0], GpuCall::DrawIndexed { count: 3, byte_offset: 6, .. }));
    }
    assert_eq!(viewer.gpu().live_programs(), 1);
}

#[test]
fn out_of_range_material_properties_are_ignored() {
    let mut viewer = viewer_with(StubModel::new(Vec::new(), 1.0, 2));
    viewer.load_model(b"model", "p3d").unwrap();

    viewer.set_material_property(2, "diff_col", "ff0000");
    viewer.set_material_property(7, "diffuseTexture", "a.png");
    viewer.set_material_property(0, "emissive", "ff0000");

    assert_eq!(viewer.materials().len(), 2);
    let defaults = p3d_viewer::material::Material::default();
    for index in 0..2 {
        let material = viewer.materials().get(index).unwrap();
        assert_eq!(material.diff_col, defaults.diff_col);
        assert_eq!(material.diffuse_texture(), None);
    }
    assert!(viewer.platform().requested.is_empty());

    viewer.set_material_property(1, "diff_col", "0f0");
    assert_eq!(viewer.materials().get(1).unwrap().diff_col, glam::Vec3::new(0.0, 1.0, 0.0));
}

#[test]
fn texture_urls_get_the_prefix() {
    let mut viewer = viewer_with(StubModel::new(Vec::new(), 1.0, 1));
    viewer.load_model(b"model", "p3d").unwrap();
    viewer.set_url_prefix("https://cdn.example/models/");
    viewer.set_material_property(0, "specTexture", "spec.jpg");
    assert_eq!(viewer.platform().requested, vec!["https://cdn.example/models/spec.jpg"]);
}

#[test]
fn load_then_clear_releases_each_texture_once() {
    let mut viewer = viewer_with(StubModel::new(vec![stub_chunk(0, 3, 0, true)], 1.0, 2));
    viewer.load_model(b"model", "p3d").unwrap();

    viewer.set_material_property(0, "diffuseTexture", "a.png");
    viewer.set_material_property(0, "diffuseTexture", "b.png");
    viewer.set_material_property(1, "specTexture", "c.png");
    viewer.draw_frame();
    assert_eq!(viewer.platform().created.len(), 3);

    // Still in flight when the model goes away.
    viewer.set_material_property(1, "diffuseTexture", "d.png");
    assert_eq!(viewer.platform().pending(), 1);
    viewer.clear_model();
    viewer.draw_frame();

    let platform = viewer.platform();
    assert_eq!(platform.pending(), 0);
    assert_eq!(platform.created.len(), 3);
    let deleted: HashSet<TextureId> = platform.deleted.iter().copied().collect();
    assert_eq!(deleted.len(), platform.deleted.len(), "double release");
    assert_eq!(deleted, platform.created.iter().copied().collect());
    assert_eq!(viewer.gpu().live_textures(), 0);
    assert!(viewer.materials().is_empty());
}

#[test]
fn reload_releases_the_previous_model() {
    let model = DecodedModel {
        chunks: vec![quad(0, true, 0, 6)],
        indices: vec![0, 1, 2, 0, 2, 3],
        material_count: 1,
    };
    let mut viewer = viewer_with(gpu_model(model));
    viewer.load_model(b"model", "p3d").unwrap();
    viewer.set_material_property(0, "diffuseTexture", "a.png");
    viewer.draw_frame();
    let buffers = viewer.gpu().live_buffers();
    assert_eq!(buffers, 4);

    viewer.load_model(b"model", "p3d").unwrap();
    assert_eq!(viewer.gpu().live_buffers(), buffers);
    assert_eq!(viewer.gpu().live_textures(), 0);
    assert_eq!(viewer.materials().len(), 1);
}

#[test]
fn unsupported_format_leaves_the_model_alone() {
    let model = DecodedModel {
        chunks: vec![quad(0, false, 0, 6)],
        indices: vec![0, 1, 2, 0, 2, 3],
        material_count: 1,
    };
    let mut viewer = viewer_with(gpu_model(model));
    viewer.load_model(b"model", "p3d").unwrap();
    viewer.set_material_property(0, "diff_str", "0.3");
    viewer.gpu_mut().clear_calls();

    let err = viewer.load_model(b"model", "fbx").unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat(ref f) if f == "fbx"));
    assert!(viewer.gpu().calls.is_empty());
    assert!(viewer.model().is_loaded());
    assert_eq!(viewer.materials().get(0).unwrap().diff_str, 0.3);

    viewer.draw_frame();
    assert_eq!(viewer.gpu().draw_calls().len(), 1);
}

#[test]
fn decode_failure_leaves_nothing_loaded() {
    let model = DecodedModel {
        chunks: vec![quad(0, false, 0, 6)],
        indices: vec![0, 1, 2, 0, 2, 3],
        material_count: 1,
    };
    let mut viewer = viewer_with(gpu_model(model));
    viewer.load_model(b"model", "p3d").unwrap();

    assert!(matches!(viewer.load_model(b"", "p3d"), Err(LoadError::Decode(_))));
    assert!(!viewer.model().is_loaded());
    assert_eq!(viewer.gpu().live_buffers(), 0);

    viewer.gpu_mut().clear_calls();
    viewer.draw_frame();
    assert!(viewer.gpu().draw_calls().is_empty());
}

#[test]
fn surface_recreation_releases_old_programs() {
    let mut viewer = viewer_with(StubModel::new(vec![stub_chunk(0, 3, 0, false)], 1.0, 1));
    assert_eq!(viewer.gpu().live_programs(), 2);
    viewer.on_surface_created();
    viewer.on_surface_created();
    assert_eq!(viewer.gpu().live_programs(), 2);

    viewer.load_model(b"model", "p3d").unwrap();
    viewer.gpu_mut().clear_calls();
    viewer.draw_frame();
    assert_eq!(viewer.gpu().draw_calls().len(), 1);
}

#[test]
fn camera_gestures_and_reset() {
    let mut viewer = viewer_with(StubModel::new(Vec::new(), 2.0, 0));
    viewer.load_model(b"model", "p3d").unwrap();
    let home = viewer.camera().view_matrix();

    viewer.start_rotate_camera(0.0, 0.0);
    viewer.rotate_camera(40.0, -10.0);
    viewer.zoom_camera(0.5);
    assert_ne!(viewer.camera().view_matrix(), home);
    assert!((viewer.camera().elevation_deg() - 15.0).abs() < 1e-3);
    assert!((viewer.camera().camera_dist() - 4.7).abs() < 1e-4);

    viewer.reset_camera();
    assert!(viewer.camera().view_matrix().abs_diff_eq(home, 1e-6));
}

#[test]
fn common_uniforms_once_per_variant_per_frame() {
    let mut viewer = viewer_with(StubModel::new(
        vec![
            stub_chunk(0, 3, 0, false),
            stub_chunk(3, 3, 0, true),
            stub_chunk(6, 3, 0, false),
            stub_chunk(9, 3, 0, true),
        ],
        1.0,
        1,
    ));
    viewer.load_model(b"model", "p3d").unwrap();
    viewer.gpu_mut().clear_calls();

    viewer.draw_frame();
    viewer.draw_frame();
    let gpu = viewer.gpu();
    assert_eq!(gpu.draw_calls().len(), 8);
    for name in ["modelViewMatrix", "projectionMatrix", "viewMatrix", "normalMatrix"] {
        assert_eq!(gpu.uniform_uploads(name), 4, "{name}");
    }
    assert_eq!(gpu.uniform_uploads("uSpecularColor"), 8);
}
