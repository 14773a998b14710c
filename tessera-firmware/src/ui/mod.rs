//! Demo renderer standing in for a generated widget UI

mod band;
mod renderer;
mod screens;

pub use renderer::DemoRenderer;
