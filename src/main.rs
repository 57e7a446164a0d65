//! Spinning-mesh viewer.
//!
//! ```text
//! softrast [MESH.ply|MESH.obj] [VIEWPORT.json]
//! ```
//!
//! Without a mesh a colour cube is shown. Space pauses, Escape quits.

use std::error::Error;
use std::path::PathBuf;

use softrast::prelude::*;

struct Args {
    mesh: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args {
        mesh: None,
        config: None,
    };
    for arg in std::env::args_os().skip(1).map(PathBuf::from) {
        let is_json = arg
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            args.config = Some(arg);
        } else {
            args.mesh = Some(arg);
        }
    }
    args
}

/// Centre and radius of the mesh's bounding sphere, roughly.
fn bounds(mesh: &Mesh) -> (Vec3, f32) {
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for v in &mesh.vertices {
        let p = v.position.to_vec3();
        min = Vec3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
        max = Vec3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
    }
    if mesh.vertices.is_empty() {
        return (Vec3::ZERO, 1.0);
    }
    let centre = (min + max) * 0.5;
    let radius = (max - centre).magnitude();
    (centre, if radius > 0.0 { radius } else { 1.0 })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = parse_args();

    let config = match &args.config {
        Some(path) => ViewportConfig::from_json_file(path)?,
        None => ViewportConfig::default(),
    };
    let mesh = match &args.mesh {
        Some(path) => Mesh::from_file(path)?,
        None => Mesh::cube(),
    };

    let (vertex_shader, pixel_shader): (Box<dyn VertexShader>, Box<dyn PixelShader>) =
        if mesh.has_colours {
            (Box::new(Projective), Box::new(VertexColour))
        } else if mesh.has_normals {
            (Box::new(NormalVertexShader), Box::new(NormalPixelShader))
        } else {
            (Box::new(Projective), Box::new(White))
        };

    let mut viewport = Viewport::new(config)?;
    viewport.look_at(Vec3::new(0.0, 1.0, 4.0), Vec3::ZERO, Vec3::UP)?;

    let (centre, radius) = bounds(&mesh);
    let recentre = Mat4::translation(-centre.x, -centre.y, -centre.z);
    let mut transform = Transform::new();
    transform.set_scale_uniform(1.0 / radius);

    let mut window = Window::new("softrast", viewport.width(), viewport.height())?;
    let mut limiter = FrameLimiter::new(&window);
    let mut paused = false;

    loop {
        match window.poll_events() {
            WindowEvent::Quit => break,
            WindowEvent::TogglePause => paused = !paused,
            WindowEvent::None => {}
        }

        let delta = limiter.wait_and_get_delta(&window) as f32 / 1000.0;
        if !paused {
            transform.rotate_y(delta * 0.8).rotate_x(delta * 0.3);
        }

        viewport.clear_frame_buffer(Vec3::new(0.1, 0.1, 0.12));
        viewport.draw_indexed_triangles(
            recentre * transform.to_matrix(),
            &mesh.vertices,
            &mesh.indices,
            vertex_shader.as_ref(),
            pixel_shader.as_ref(),
        )?;
        window.present(viewport.buffer())?;
    }

    Ok(())
}
