//! End-to-end draws through a `Viewport`.

use std::io::Cursor;

use approx::assert_relative_eq;
use softrast::clipper::{classify, FrustumTest, PolygonClipper};
use softrast::prelude::*;

fn viewport(size: u32) -> Viewport {
    let config = ViewportConfig {
        device: [size, size],
        ..ViewportConfig::default()
    };
    let mut vp = Viewport::new(config).unwrap();
    vp.clear_frame_buffer(Vec3::new(0.2, 0.3, 0.4));
    vp
}

fn white_vertex(x: f32, y: f32, z: f32) -> Vertex {
    Vertex::new(Vec4::new(x, y, z, 1.0)).with(COLOUR, Vec3::ONE)
}

/// Anticlockwise in NDC, centred on the origin.
fn centred_triangle(z: f32) -> [Vertex; 3] {
    [
        white_vertex(-0.5, -0.5, z),
        white_vertex(0.5, -0.5, z),
        white_vertex(0.0, 0.5, z),
    ]
}

fn solid(colour: Vec4) -> impl Fn(&Vertex) -> Result<Option<Vec4>, RenderError> {
    move |_| Ok(Some(colour))
}

#[test]
fn single_opaque_triangle() {
    let mut vp = viewport(64);
    let background = vp.buffer().colour_at(0, 0).unwrap();

    let stats = vp
        .draw_indexed_triangles(
            Mat4::identity(),
            &centred_triangle(0.0),
            &[0, 1, 2],
            &PassThrough,
            &VertexColour,
        )
        .unwrap();
    assert_eq!(stats.rasterized, 1);

    let fb = vp.buffer();
    assert_eq!(fb.colour_at(32, 32), Some(0xFFFF_FFFF));
    assert_eq!(fb.colour_at(32, 40), Some(0xFFFF_FFFF));
    for (x, y) in [(0, 0), (63, 0), (0, 63), (63, 63), (32, 4)] {
        assert_eq!(fb.colour_at(x, y), Some(background), "pixel {x},{y}");
    }

    let written = fb.colour().iter().filter(|&&c| c == 0xFFFF_FFFF).count();
    assert_eq!(written, stats.fragments_written);
}

#[test]
fn nearer_triangle_wins_regardless_of_order() {
    let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
    let green = Vec4::new(0.0, 1.0, 0.0, 1.0);

    for near_first in [false, true] {
        let mut vp = viewport(32);
        let draws = if near_first {
            [(-0.5, green), (0.5, red)]
        } else {
            [(0.5, red), (-0.5, green)]
        };
        for (z, colour) in draws {
            vp.draw_indexed_triangles(
                Mat4::identity(),
                &centred_triangle(z),
                &[0, 1, 2],
                &PassThrough,
                &solid(colour),
            )
            .unwrap();
        }
        assert_eq!(vp.buffer().colour_at(16, 16), Some(0xFF00_FF00));
        assert_relative_eq!(vp.buffer().depth_at(16, 16).unwrap(), -0.5, epsilon = 1e-5);
    }
}

#[test]
fn stencil_replace_marks_covered_pixels() {
    let mut vp = viewport(16);
    vp.state.stencil = StencilState {
        enable: true,
        reference: 1,
        pass: StencilOperation::Replace,
        ..StencilState::default()
    };

    // Covers the whole viewport
    let vertices = [
        white_vertex(-1.0, -1.0, 0.0),
        white_vertex(3.0, -1.0, 0.0),
        white_vertex(-1.0, 3.0, 0.0),
    ];
    let stats = vp
        .draw_indexed_triangles(Mat4::identity(), &vertices, &[0, 1, 2], &PassThrough, &White)
        .unwrap();

    assert_eq!(stats.fragments_written, 16 * 16);
    assert!(vp.buffer().stencil().iter().all(|&s| s == 1));

    vp.clear_stencil_buffer();
    assert!(vp.buffer().stencil().iter().all(|&s| s == 0));
}

#[test]
fn stencil_masks_later_draws() {
    let mut vp = viewport(16);
    vp.state.depth.test = DepthTestState::Disable;
    vp.state.stencil = StencilState {
        enable: true,
        reference: 1,
        pass: StencilOperation::Replace,
        ..StencilState::default()
    };
    let triangle = centred_triangle(0.0);
    vp.draw_indexed_triangles(Mat4::identity(), &triangle, &[0, 1, 2], &PassThrough, &White)
        .unwrap();

    // Only draw where the first triangle did not.
    vp.state.stencil = StencilState {
        enable: true,
        reference: 1,
        function: Comparison::NotEqual,
        ..StencilState::default()
    };
    let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
    let full = [
        white_vertex(-1.0, -1.0, 0.0),
        white_vertex(3.0, -1.0, 0.0),
        white_vertex(-1.0, 3.0, 0.0),
    ];
    vp.draw_indexed_triangles(Mat4::identity(), &full, &[0, 1, 2], &PassThrough, &solid(red))
        .unwrap();

    assert_eq!(vp.buffer().colour_at(8, 8), Some(0xFFFF_FFFF));
    assert_eq!(vp.buffer().colour_at(0, 0), Some(0xFFFF_0000));
}

#[test]
fn cull_modes_select_winding() {
    let anticlockwise = centred_triangle(0.0);
    let clockwise = [
        anticlockwise[0].clone(),
        anticlockwise[2].clone(),
        anticlockwise[1].clone(),
    ];

    let mut counts = Vec::new();
    for cull_mode in [CullMode::AntiClockwise, CullMode::Clockwise, CullMode::None] {
        for triangle in [&anticlockwise, &clockwise] {
            let mut vp = viewport(32);
            vp.state.cull_mode = cull_mode;
            let stats = vp
                .draw_indexed_triangles(Mat4::identity(), triangle, &[0, 1, 2], &PassThrough, &White)
                .unwrap();
            counts.push(stats.fragments_written);
        }
    }

    let [acw_acw, acw_cw, cw_acw, cw_cw, none_acw, none_cw] = counts[..] else {
        panic!("expected six draws");
    };
    assert!(acw_acw > 0);
    assert_eq!(acw_cw, 0);
    assert_eq!(cw_acw, 0);
    assert_eq!(cw_cw, acw_acw);
    assert_eq!(none_acw, acw_acw);
    assert_eq!(none_cw, acw_acw);
}

#[test]
fn alpha_blending_mixes_with_background() {
    let mut vp = viewport(16);
    vp.clear_colour_buffer(Vec3::ONE);
    vp.state.blend = BlendState::alpha();

    let half_red = Vec4::new(1.0, 0.0, 0.0, 0.5);
    vp.draw_indexed_triangles(
        Mat4::identity(),
        &centred_triangle(0.0),
        &[0, 1, 2],
        &PassThrough,
        &solid(half_red),
    )
    .unwrap();

    let c = vp.buffer().colour_vec_at(8, 8).unwrap();
    assert_relative_eq!(c.x, 1.0);
    assert_relative_eq!(c.y, 0.5, epsilon = 1.0 / 255.0);
    assert_relative_eq!(c.z, 0.5, epsilon = 1.0 / 255.0);
}

#[test]
fn discarded_fragments_leave_buffers_untouched() {
    let mut vp = viewport(16);
    vp.state.stencil = StencilState {
        enable: true,
        reference: 7,
        pass: StencilOperation::Replace,
        ..StencilState::default()
    };
    let before = vp.buffer().clone();

    let discard = |_: &Vertex| -> Result<Option<Vec4>, RenderError> { Ok(None) };
    let stats = vp
        .draw_indexed_triangles(
            Mat4::identity(),
            &centred_triangle(0.0),
            &[0, 1, 2],
            &PassThrough,
            &discard,
        )
        .unwrap();

    assert_eq!(stats.fragments_written, 0);
    assert_eq!(vp.buffer().colour(), before.colour());
    assert_eq!(vp.buffer().depth(), before.depth());
    assert_eq!(vp.buffer().stencil(), before.stencil());
}

#[test]
fn shader_errors_abort_the_draw() {
    let mut vp = viewport(16);
    let plain = [
        Vertex::new(Vec4::new(-0.5, -0.5, 0.0, 1.0)),
        Vertex::new(Vec4::new(0.5, -0.5, 0.0, 1.0)),
        Vertex::new(Vec4::new(0.0, 0.5, 0.0, 1.0)),
    ];
    let err = vp
        .draw_indexed_triangles(Mat4::identity(), &plain, &[0, 1, 2], &PassThrough, &VertexColour)
        .unwrap_err();
    assert!(matches!(err, RenderError::MissingAttribute(ref key) if key == COLOUR));
}

#[test]
fn clip_conservation() {
    let clipper = PolygonClipper::new();

    let inside = centred_triangle(0.0);
    assert_eq!(
        classify(inside[0].position, inside[1].position, inside[2].position),
        FrustumTest::Accept
    );
    let result = clipper
        .clip_triangle(&inside[0], &inside[1], &inside[2])
        .unwrap();
    assert_eq!(result, vec![inside.clone()]);

    // Behind the near plane entirely: the culler rejects it, and the clipper
    // hands it back unchanged.
    let behind = centred_triangle(-2.0);
    assert_eq!(
        classify(behind[0].position, behind[1].position, behind[2].position),
        FrustumTest::Reject
    );
    let result = clipper
        .clip_triangle(&behind[0], &behind[1], &behind[2])
        .unwrap();
    assert_eq!(result, vec![behind.clone()]);
}

#[test]
fn clipped_triangle_keeps_attributes_and_stays_in_frustum() {
    let clipper = PolygonClipper::new();
    let v0 = white_vertex(-0.5, -0.5, -3.0);
    let v1 = white_vertex(0.5, -0.5, 0.0);
    let v2 = white_vertex(0.0, 0.5, 3.0);

    let triangles = clipper.clip_triangle(&v0, &v1, &v2).unwrap();
    assert!(!triangles.is_empty());
    for triangle in &triangles {
        for v in triangle {
            let p = v.position;
            assert!(p.z >= -p.w - 1e-5 && p.z <= p.w + 1e-5, "z {} w {}", p.z, p.w);
            assert_eq!(v.attributes.get_vec3(COLOUR).unwrap(), Vec3::ONE);
        }
    }
}

#[test]
fn ply_round_trip() {
    let text = "ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
-0.5 -0.5 0
0.5 -0.5 0
0 0.5 0
3 0 1 2
";
    let mesh = Mesh::parse_ply(Cursor::new(text)).unwrap();
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.indices.len(), 3);
    assert!(!mesh.has_normals);
    assert!(!mesh.has_colours);
    assert!(!mesh.has_uvs);

    let mut vp = viewport(32);
    let stats = vp
        .draw_indexed_triangles(
            Mat4::identity(),
            &mesh.vertices,
            &mesh.indices,
            &PassThrough,
            &White,
        )
        .unwrap();
    assert_eq!(stats.rasterized, 1);
    assert_eq!(vp.buffer().colour_at(16, 16), Some(0xFFFF_FFFF));
}

#[test]
fn cube_through_camera() {
    let mut vp = viewport(64);
    vp.look_at(Vec3::new(0.0, 0.0, 6.0), Vec3::ZERO, Vec3::UP)
        .unwrap();
    let cube = Mesh::cube();

    let stats = vp
        .draw_indexed_triangles(
            Transform::new().to_matrix(),
            &cube.vertices,
            &cube.indices,
            &Projective,
            &VertexColour,
        )
        .unwrap();

    assert_eq!(stats.triangles, 12);
    assert!(stats.fragments_written > 0);
    // Only the +z face points at the camera; its centre is (0.5, 0.5, 1.0).
    let centre = vp.buffer().colour_vec_at(32, 32).unwrap();
    assert_relative_eq!(centre.x, 0.5, epsilon = 0.02);
    assert_relative_eq!(centre.y, 0.5, epsilon = 0.02);
    assert_relative_eq!(centre.z, 1.0, epsilon = 0.01);
}

#[test]
fn viewport_from_json_config() {
    let config = ViewportConfig::from_json_str(
        r#"{ "device": [20, 10], "far": 50.0, "state": { "depth": { "function": "LessEqual" } } }"#,
    )
    .unwrap();
    let mut vp = Viewport::new(config).unwrap();
    vp.clear_z_buffer();

    assert_eq!((vp.width(), vp.height()), (20, 10));
    assert_eq!(vp.state.depth.function, Comparison::LessEqual);
    assert_eq!(vp.buffer().depth_at(19, 9), Some(50.0));
}
