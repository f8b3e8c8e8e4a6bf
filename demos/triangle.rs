//=========================================================================
// Triangle Demo
//
// One session that sets up a single triangle, draws it every frame and
// releases everything on teardown. Escape or closing the window quits.
//
//   cargo run --example triangle              winit window
//   cargo run --example triangle -- --headless  no window, 90 frames
//
// GPU calls go through `HeadlessGraphics`: creating a GL context is up to
// the host, and `GlowGraphics::new(gl)` takes its place once one is
// current on this thread.
//
//=========================================================================

use std::rc::Rc;

use log::info;
use luna_runtime::prelude::*;

const WINDOW_WIDTH: u32 = 1024;
const WINDOW_HEIGHT: u32 = 768;
const HEADLESS_FRAMES: u64 = 90;

const VERTEX_SHADER: &str = r#"
#version 330 core
in vec3 vert0;
void main() {
    gl_Position = vec4(vert0, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"
#version 330 core
out vec4 color;
void main() {
    color = vec4(1.0, 0.5, 0.2, 1.0);
}
"#;

const VERTICES: [f32; 9] = [0.0, 0.8, 0.0, -0.8, -0.8, 0.0, 0.8, -0.8, 0.0];

//=== Scene ===============================================================

/// Handles owned by the demo between SETUP and TEARDOWN.
#[derive(Debug, Default)]
struct Scene {
    shaders: Vec<Handle>,
    program: Option<Handle>,
    vao: Option<Handle>,
    vbo: Option<Handle>,
    headless: bool,
}

fn setup(scene: &mut Scene, ctx: &mut Context<'_>) -> anyhow::Result<()> {
    let resources = ctx.resources();

    scene.shaders = vec![
        resources.add_shader(&ShaderSource::text(FRAGMENT_SHADER), ShaderKind::Fragment)?,
        resources.add_shader(&ShaderSource::text(VERTEX_SHADER), ShaderKind::Vertex)?,
    ];
    let program = resources.add_program(&scene.shaders)?;

    let vertex = resources.vertex_mut();
    let vao = vertex.add_array(1)?;
    vertex.bind_array(Some(vao))?;
    let vbo = vertex.add_buffer(BufferTarget::Array, 1)?;
    vertex.bind_buffer(BufferTarget::Array, Some(vbo))?;

    let bytes: Vec<u8> = VERTICES.iter().flat_map(|v| v.to_ne_bytes()).collect();
    vertex.set_buffer_data(BufferTarget::Array, &bytes, BufferUsage::Static)?;

    let attribute = resources.programs().attribute(program, "vert0")?;
    let vertex = resources.vertex_mut();
    vertex.set_attribute(attribute, 3)?;
    vertex.bind_buffer(BufferTarget::Array, None)?;
    vertex.bind_array(None)?;

    scene.program = Some(program);
    scene.vao = Some(vao);
    scene.vbo = Some(vbo);
    info!("SETUP: program 0x{:x}, vao 0x{:x}, vbo 0x{:x}", program, vao, vbo);
    Ok(())
}

fn draw(scene: &mut Scene, ctx: &mut Context<'_>) -> anyhow::Result<()> {
    let resources = ctx.resources();

    resources.programs().use_program(scene.program)?;
    resources.vertex().bind_array(scene.vao)?;
    resources.vertex().draw_triangles(0, 3)?;
    resources.vertex().bind_array(None)?;
    resources.programs().use_program(None)?;
    Ok(())
}

fn teardown(scene: &mut Scene, ctx: &mut Context<'_>) -> anyhow::Result<()> {
    let resources = ctx.resources();

    if let Some(vbo) = scene.vbo.take() {
        resources.vertex_mut().remove_buffer(vbo)?;
    }
    if let Some(vao) = scene.vao.take() {
        resources.vertex_mut().remove_array(vao)?;
    }
    if let Some(program) = scene.program.take() {
        resources.remove_program(program)?;
    }
    for shader in scene.shaders.drain(..) {
        resources.remove_shader(shader)?;
    }

    info!("TEARDOWN: {} program(s) left", ctx.resources().programs().size()?);
    Ok(())
}

//=== Session =============================================================

fn session() -> SessionConfig<Scene> {
    let title = format!("Luna [{}x{}]", WINDOW_WIDTH, WINDOW_HEIGHT);

    SessionConfig::new()
        .with_display(
            DisplayConfig::new(title)
                .with_size(WINDOW_WIDTH, WINDOW_HEIGHT)
                .with_flags(DisplayFlags::RESIZABLE),
        )
        .on(Event::Setup, setup)
        .on(Event::Start, |_, ctx| {
            info!("START: {:?}", ctx.window());
            Ok(())
        })
        .on(Event::Stop, |_, ctx| {
            info!("STOP after {} tick(s)", ctx.tick());
            Ok(())
        })
        .on(Event::Teardown, teardown)
        .on_tick(|scene, ctx| {
            if scene.headless && ctx.tick() + 1 >= HEADLESS_FRAMES {
                ctx.request_stop();
            }
            Ok(())
        })
        .on_draw(draw)
        .on_input(InputEventKind::KeyDown, |_, event| {
            info!("KEYDOWN: {:?}", event.key());
            match event.key() {
                Some(KeyCode::Escape) => InputOutcome::Quit,
                _ => InputOutcome::None,
            }
        })
        .on_input(InputEventKind::Window, |_, event| {
            info!("WIN_CHANGE: {:?}", event);
            InputOutcome::None
        })
}

fn run<P: Platform>(platform: P, headless: bool) -> anyhow::Result<()> {
    let mut runtime = RuntimeBuilder::new()
        .with_platform(platform)
        .with_graphics(Rc::new(HeadlessGraphics::new()))
        .build::<Scene>();

    info!("Luna {}", runtime.version());
    runtime.initialize()?;

    let mut scene = Scene {
        headless,
        ..Scene::default()
    };
    let outcome = runtime.start(&mut scene, session());
    runtime.uninitialize()?;

    Ok(outcome?)
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    if std::env::args().any(|arg| arg == "--headless") {
        let (platform, _events) = HeadlessPlatform::new();
        return run(platform, true);
    }
    run(luna_runtime::backend::WinitPlatform::new(), false)
}
