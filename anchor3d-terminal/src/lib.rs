/// Terminal demo: a bobbing cube carrying a screen-anchored label
use anyhow::Result;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use nalgebra::{Point3, Vector3};
use std::io::{stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use anchor3d_core::{
    Camera, HeadlessDocument, HeadlessElement, LabelAnchor, Mesh, RotationState, Scene, SceneHost,
    TransformNode, Viewport,
};

pub mod config;
pub mod labels;
pub mod renderer;

pub use config::DemoConfig;
pub use renderer::AsciiRenderer;

const CAMERA_STEP: f32 = 0.2;

/// The demo scene: camera, animated box and the label riding on its corner
pub struct DemoScene {
    scene: Rc<Scene>,
    document: HeadlessDocument,
    box_node: Rc<TransformNode>,
    box_mesh: Mesh,
    label: LabelAnchor<HeadlessDocument>,
}

impl DemoScene {
    pub fn new(config: &DemoConfig, viewport: Viewport) -> Result<Self> {
        let camera = Camera::looking_at(
            Point3::new(0.0, 0.0, -4.0),
            Point3::origin(),
            0.8,
            viewport,
        );
        let scene = Rc::new(Scene::with_camera(camera, viewport));
        let document = HeadlessDocument::new();

        let box_node = TransformNode::new("box");
        let corner = TransformNode::new("box-corner");
        corner.set_position(Point3::new(0.5, 0.5, -0.5));
        corner.set_parent(Some(box_node.clone()));

        let content = HeadlessElement::new("div");
        content.set_text(config.text.clone());

        let label = LabelAnchor::new(
            "html-node",
            config.label_options(content).node(corner),
            &scene,
            &document,
        )?;

        Ok(Self {
            scene,
            document,
            box_node,
            box_mesh: Mesh::cube(1.0),
            label,
        })
    }

    /// Bob and sway the box, then run the frame notifications
    pub fn tick(&self, elapsed: Duration) {
        let wave = elapsed.as_secs_f32().sin();
        self.box_node
            .set_position(Point3::new(0.0, 0.0, (wave + 1.0) * 3.0));
        self.box_node.set_rotation(RotationState::new(
            (wave - 0.5) * 1.5,
            (wave - 0.5) * 1.5,
            0.0,
        ));
        self.scene.render();
    }

    /// Move the camera and its target together
    pub fn move_camera(&self, delta: Vector3<f32>) {
        self.scene.update_camera(|camera| {
            camera.position += delta;
            camera.target += delta;
        });
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.scene.resize(width, height);
        self.document.resize();
    }

    /// Name of the mesh under a screen cell, if any
    pub fn pick(&self, column: f32, row: f32) -> Option<&'static str> {
        let camera = self.scene.camera()?;
        let ray = camera.picking_ray(column, row, self.scene.viewport())?;
        let distance = self
            .box_mesh
            .intersect_ray(&ray, &self.box_node.world_matrix())?;
        debug!(distance, "pick hit");
        Some("box")
    }

    pub fn draw(&self, renderer: &mut AsciiRenderer) {
        renderer.clear();
        if let Some(camera) = self.scene.camera() {
            renderer.render_mesh(&self.box_mesh, &self.box_node.world_matrix(), &camera);
        }
        labels::paint_labels(renderer, &self.document);
    }

    pub fn label(&self) -> &LabelAnchor<HeadlessDocument> {
        &self.label
    }

    pub fn dispose(&mut self) {
        self.label.dispose();
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    demo: DemoScene,
    renderer: AsciiRenderer,
    frame_time: Duration,
    running: bool,
    started: Instant,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
    last_pick: String,
}

impl TerminalApp {
    pub fn new(config: &DemoConfig) -> Result<Self> {
        let (width, height) = terminal::size()?;
        let renderer = AsciiRenderer::new(width as usize, height as usize);
        let demo = DemoScene::new(config, renderer.viewport())?;

        Ok(Self {
            demo,
            renderer,
            frame_time: Duration::from_secs(1) / config.fps,
            running: true,
            started: Instant::now(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            last_pick: String::from("-"),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        self.demo.dispose();
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        info!(mode = ?self.demo.label().update_mode(), "terminal demo started");

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Update
            self.demo.tick(self.started.elapsed());

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, .. }) => self.handle_key(code),
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => {
                let hit = self.demo.pick(column as f32 + 0.5, row as f32 + 0.5);
                info!(column, row, mesh = ?hit, "pointer down");
                self.last_pick = hit.unwrap_or("-").to_string();
            }
            Event::Resize(width, height) => {
                self.renderer.resize(width as usize, height as usize);
                self.demo.resize(width as u32, height as u32);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        let delta = match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                return;
            }
            KeyCode::Char('w') | KeyCode::Up => Vector3::new(0.0, 0.0, CAMERA_STEP),
            KeyCode::Char('s') | KeyCode::Down => Vector3::new(0.0, 0.0, -CAMERA_STEP),
            KeyCode::Char('a') | KeyCode::Left => Vector3::new(CAMERA_STEP, 0.0, 0.0),
            KeyCode::Char('d') | KeyCode::Right => Vector3::new(-CAMERA_STEP, 0.0, 0.0),
            KeyCode::Char('e') => Vector3::new(0.0, CAMERA_STEP, 0.0),
            KeyCode::Char('r') => Vector3::new(0.0, -CAMERA_STEP, 0.0),
            _ => return,
        };
        self.demo.move_camera(delta);
    }

    fn render(&mut self) -> Result<()> {
        self.demo.draw(&mut self.renderer);

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let scale = self
            .demo
            .label()
            .screen_position()
            .map_or(1.0, |position| position.scale);
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "anchor3d | FPS: {:.1} | label scale: {:.2} | pick: {} | WASD/Arrows=Move E/R=Up/Down Click=Pick Q=Quit",
                self.fps, scale, self.last_pick
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
