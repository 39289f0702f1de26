/// Command-line settings for the terminal demo
use std::path::PathBuf;

use anchor3d_core::{LabelOptions, UpdateMode};
use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Terminal demo of screen-anchored 3D labels", long_about = None)]
pub struct DemoConfig {
    /// Label text
    #[arg(long, default_value = "Hello World")]
    pub text: String,

    /// Center the label on its anchor point
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub center: bool,

    /// Re-project only when the camera moves (the label will lag the moving box)
    #[arg(long)]
    pub camera_move_only: bool,

    /// Distance attenuation factor for the label scale
    #[arg(long, default_value_t = 4.5)]
    pub distance_factor: f32,

    /// Keep the label scale fixed at 1
    #[arg(long, conflicts_with = "distance_factor")]
    pub no_distance_scaling: bool,

    /// Target frames per second
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Write logs to this file (the terminal is taken over by the renderer)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl DemoConfig {
    pub fn update_mode(&self) -> UpdateMode {
        if self.camera_move_only {
            UpdateMode::OnCameraMove
        } else {
            UpdateMode::PerFrame
        }
    }

    pub fn label_options<E>(&self, content: E) -> LabelOptions<E> {
        let options = LabelOptions::new(content)
            .centered(self.center)
            .update_mode(self.update_mode());

        if self.no_distance_scaling {
            options
        } else {
            options.distance_factor(self.distance_factor)
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self::parse_from(["anchor3d-terminal"])
    }
}
