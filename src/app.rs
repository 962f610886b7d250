//! The UI role: an egui application hosting the scene and driving the
//! render engine.
//!
//! Every input event becomes (i) a state mutation, (ii) an accumulation
//! reset, and (iii) a submission of the current camera and toggles. On
//! quiet ticks the accumulation counter advances instead — unless a scene
//! build is in flight, which pauses refinement so the first frame against
//! a new scene always observes `frame_count = 0`.

use std::path::PathBuf;

use glam::Vec3;

use crate::camera::Camera;
use crate::engine::{Frame, RenderEngine};
use crate::error::LumoError;
use crate::geometry::Material;
use crate::input::MotionKeys;
use crate::options::Options;
use crate::scene::{BuildTask, ModelInstance, Scene};

/// The viewer application.
pub struct LumoApp {
    engine: RenderEngine,
    scene: Scene,
    camera: Camera,
    sky_enabled: bool,
    exposure: f32,
    move_speed: f32,
    build_task: Option<BuildTask>,
    rebuild_queued: bool,
    selected: Option<usize>,
    frame_texture: Option<egui::TextureHandle>,
    status: String,
    error_message: Option<String>,
}

impl LumoApp {
    /// Start the render engine and set up the initial UI state. Any
    /// `initial_models` are added to the scene and built immediately.
    ///
    /// # Errors
    ///
    /// Engine startup failures (kernel missing, no GPU) are returned so
    /// the binary can surface them before any window work happens.
    pub fn new(options: &Options, initial_models: &[PathBuf]) -> Result<Self, LumoError> {
        let engine = RenderEngine::start(options)?;

        let camera = Camera::new(
            Vec3::from(options.camera.origin),
            Vec3::from(options.camera.look_at),
            options.camera.vfov,
            options.aspect(),
        );

        let mut scene = Scene::new();
        for path in initial_models {
            scene.add(ModelInstance::new(path));
        }

        let mut app = Self {
            engine,
            scene,
            camera,
            sky_enabled: options.render.sky_enabled,
            exposure: options.render.exposure,
            move_speed: options.camera.move_speed,
            build_task: None,
            rebuild_queued: false,
            selected: None,
            frame_texture: None,
            status: "add a model to get started".into(),
            error_message: None,
        };

        app.engine.submit_sky(app.sky_enabled);
        app.engine.submit_exposure(app.exposure);
        app.engine.submit_camera(app.camera);
        if !app.scene.is_empty() {
            app.selected = Some(0);
            app.start_rebuild();
        }
        Ok(app)
    }

    /// Kick off a scene rebuild, or queue one if a build is already in
    /// flight (at most one build task is ever alive).
    fn start_rebuild(&mut self) {
        if self.build_task.is_some() {
            self.rebuild_queued = true;
            return;
        }
        match BuildTask::spawn(self.scene.snapshot()) {
            Ok(task) => {
                self.build_task = Some(task);
                self.status = "building scene...".into();
            }
            Err(e) => self.error_message = Some(e.to_string()),
        }
    }

    /// Poll the in-flight build. Returns `true` when a package was
    /// submitted this tick (an accumulation-reset event).
    fn poll_build(&mut self) -> bool {
        let Some(task) = self.build_task.as_mut() else {
            return false;
        };
        let Some(result) = task.try_take() else {
            return false;
        };
        self.build_task = None;

        let mut submitted = false;
        match result {
            Ok(package) => {
                self.status =
                    format!("scene ready: {} triangles", package.triangle_count);
                self.engine.submit_scene(package);
                submitted = true;
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                self.status = "scene build failed".into();
            }
        }
        if self.rebuild_queued {
            self.rebuild_queued = false;
            self.start_rebuild();
        }
        submitted
    }

    /// W/A/S/D forward-back and strafe, Q/E vertical. Returns `true` when
    /// the camera moved.
    fn handle_camera_keys(&mut self, ctx: &egui::Context) -> bool {
        if ctx.wants_keyboard_input() {
            return false;
        }
        let keys = ctx.input(|i| MotionKeys {
            forward: i.key_down(egui::Key::W),
            back: i.key_down(egui::Key::S),
            right: i.key_down(egui::Key::D),
            left: i.key_down(egui::Key::A),
            up: i.key_down(egui::Key::E),
            down: i.key_down(egui::Key::Q),
        });
        keys.apply(&mut self.camera, self.move_speed)
    }

    /// Scene and environment side panel. Returns `true` on any edit.
    fn scene_panel(&mut self, ctx: &egui::Context) -> bool {
        let mut edited = false;
        let mut add_clicked = false;
        let mut remove_clicked = false;
        let mut apply_clicked = false;

        egui::SidePanel::right("scene_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Scene");
                for (i, instance) in self.scene.instances().iter().enumerate() {
                    let is_selected = self.selected == Some(i);
                    if ui.selectable_label(is_selected, &instance.name).clicked() {
                        self.selected = Some(i);
                    }
                }
                ui.horizontal(|ui| {
                    add_clicked = ui.button("Add model...").clicked();
                    remove_clicked = ui.button("Remove").clicked();
                });
                ui.separator();

                if let Some(index) = self.selected {
                    if let Some(instance) = self.scene.instance_mut(index) {
                        edited |= instance_editor(ui, instance);
                        apply_clicked = ui.button("Apply changes").clicked();
                    }
                }
                ui.separator();

                ui.heading("Environment");
                if ui.checkbox(&mut self.sky_enabled, "Sky").changed() {
                    self.engine.submit_sky(self.sky_enabled);
                    edited = true;
                }
                if ui
                    .add(
                        egui::Slider::new(&mut self.exposure, 0.1..=4.0)
                            .text("Exposure"),
                    )
                    .changed()
                {
                    self.engine.submit_exposure(self.exposure);
                    edited = true;
                }
                ui.separator();
                ui.label(&self.status);
            });

        if add_clicked {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("Wavefront OBJ", &["obj"])
                .pick_file()
            {
                self.scene.add(ModelInstance::new(path));
                self.selected = Some(self.scene.len() - 1);
                self.start_rebuild();
                edited = true;
            }
        }
        if remove_clicked {
            if let Some(index) = self.selected.take() {
                let _ = self.scene.remove(index);
                self.start_rebuild();
                edited = true;
            }
        }
        if apply_clicked {
            self.start_rebuild();
            edited = true;
        }

        edited
    }

    fn error_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error_message.clone() else {
            return;
        };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("Dismiss").clicked() {
                    self.error_message = None;
                }
            });
    }

    fn upload_frame(&mut self, ctx: &egui::Context, frame: &Frame) {
        let size = [frame.width as usize, frame.height as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, &frame.pixels);
        match &mut self.frame_texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.frame_texture = Some(ctx.load_texture(
                    "render-output",
                    image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }
    }
}

impl eframe::App for LumoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut event = self.poll_build();
        event |= self.handle_camera_keys(ctx);
        event |= self.scene_panel(ctx);
        self.error_modal(ctx);

        if !self.engine.is_running() && self.error_message.is_none() {
            self.error_message =
                Some("render engine stopped; see the log for details".into());
        }

        // The UI is the sole writer of the accumulation counter.
        step_accumulation(&mut self.camera, event, self.build_task.is_some());
        self.engine.submit_camera(self.camera);

        if let Some(frame) = self.engine.take_frame() {
            self.upload_frame(ctx, &frame);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                if let Some(texture) = &self.frame_texture {
                    ui.add(egui::Image::new(texture).max_size(ui.available_size()));
                } else {
                    ui.spinner();
                }
            });
        });

        // Keep ticking even without input events.
        ctx.request_repaint();
    }
}

/// One tick of the accumulation protocol: any event restarts refinement,
/// a quiet tick advances it, and an in-flight scene build pauses the
/// advance so the first frame against a new scene observes a zero counter.
fn step_accumulation(camera: &mut Camera, event: bool, building: bool) {
    if event {
        camera.reset_accumulation();
    } else if !building {
        camera.advance_frame();
    }
}

/// Per-instance property widgets. Returns `true` on any change.
fn instance_editor(ui: &mut egui::Ui, instance: &mut ModelInstance) -> bool {
    let mut edited = false;

    ui.label("Position");
    let mut position = instance.position.to_array();
    ui.horizontal(|ui| {
        for (axis, value) in position.iter_mut().enumerate() {
            let prefix = ["x ", "y ", "z "][axis];
            edited |= ui
                .add(egui::DragValue::new(value).speed(0.1).prefix(prefix))
                .changed();
        }
    });
    if edited {
        instance.position = Vec3::from(position);
    }

    ui.label("Scale");
    let mut scale = instance.scale.x;
    if ui
        .add(
            egui::DragValue::new(&mut scale)
                .speed(0.05)
                .range(0.01..=1000.0),
        )
        .changed()
    {
        instance.scale = Vec3::splat(scale);
        edited = true;
    }

    ui.label("Color");
    let mut rgb = instance.color.to_array();
    if ui.color_edit_button_rgb(&mut rgb).changed() {
        instance.color = Vec3::from(rgb);
        edited = true;
    }

    egui::ComboBox::from_label("Material")
        .selected_text(instance.material.label())
        .show_ui(ui, |ui| {
            for material in Material::ALL {
                edited |= ui
                    .selectable_value(
                        &mut instance.material,
                        material,
                        material.label(),
                    )
                    .changed();
            }
        });

    edited
}
