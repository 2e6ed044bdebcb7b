mod app;
mod data;
mod error;
mod export;
mod processing;
mod render;
mod state;
mod ui;

use std::path::PathBuf;

use app::SummaryStatApp;
use eframe::egui;
use eframe::egui_wgpu;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Files named on the command line are loaded at startup.
    let initial_files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if !initial_files.is_empty() {
        tracing::info!("Loading {} file(s) from the command line", initial_files.len());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("SummaryStat")
            .with_inner_size([1300.0, 850.0])
            .with_min_inner_size([900.0, 600.0])
            .with_drag_and_drop(true),
        wgpu_options: egui_wgpu::WgpuConfiguration {
            present_mode: eframe::wgpu::PresentMode::AutoVsync,
            wgpu_setup: egui_wgpu::WgpuSetup::CreateNew(egui_wgpu::WgpuSetupCreateNew {
                instance_descriptor: eframe::wgpu::InstanceDescriptor {
                    backends: eframe::wgpu::Backends::DX12
                        | eframe::wgpu::Backends::VULKAN
                        | eframe::wgpu::Backends::METAL
                        | eframe::wgpu::Backends::GL,
                    ..Default::default()
                },
                power_preference: eframe::wgpu::PowerPreference::LowPower,
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    eframe::run_native(
        "SummaryStat",
        options,
        Box::new(move |cc| Ok(Box::new(SummaryStatApp::new(cc, initial_files)))),
    )
}
