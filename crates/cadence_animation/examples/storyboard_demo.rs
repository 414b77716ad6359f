//! Storyboard Demo
//!
//! Builds a small scene (a canvas holding a button with a rotate transform and
//! a solid-color background), starts a storyboard that slides, spins and
//! recolors the button, and drives it with a simulated frame loop.
//!
//! Run with: RUST_LOG=cadence_animation=debug cargo run -p cadence_animation --example storyboard_demo

use cadence_animation::{
    set_global_scheduler, AnimationScheduler, ClockState, ColorAnimation, DoubleAnimation, Easing,
    PropertyPath, RepeatBehavior, SchedulerConfig, Storyboard,
};
use cadence_core::{Color, DependencyObject, ObjectRef};
use std::sync::Arc;
use std::time::Duration;

const CONFIG: &str = r#"
target_fps = 60
default_animation_duration_ms = 800
"#;

const SPIN_PATH: &str =
    "(UIElement.RenderTransform).(TransformGroup.Children)[0].(RotateTransform.Angle)";
const COLOR_PATH: &str = "(Control.Background).(SolidColorBrush.Color)";

fn build_scene() -> Result<(ObjectRef, ObjectRef), Box<dyn std::error::Error>> {
    let canvas = DependencyObject::create("Canvas")?;
    let button = DependencyObject::create("Button")?.with_name("Submit");

    let group = DependencyObject::create("TransformGroup")?;
    let rotate = DependencyObject::create("RotateTransform")?;
    if let Some(children) = group.get("Children")?.as_object() {
        children.add_item(rotate)?;
    }
    button.set("RenderTransform", group)?;

    let brush = DependencyObject::create("SolidColorBrush")?;
    brush.set("Color", Color::from_hex(0x3366CC))?;
    button.set("Background", brush)?;

    canvas.add_item(button.clone())?;
    Ok((canvas, button))
}

fn build_storyboard() -> Result<Storyboard, Box<dyn std::error::Error>> {
    let sb = Storyboard::new();
    sb.set_name("intro");
    Storyboard::set_target_name(&sb, "Submit")?;

    let slide = DoubleAnimation::new()
        .from(0.0)
        .to(240.0)
        .easing(Easing::CubicOut)
        .into_timeline();
    Storyboard::set_target_property(&slide, "Canvas.Left")?;
    sb.add_child(slide)?;

    let spin = DoubleAnimation::new()
        .by(180.0)
        .into_timeline()
        .with_duration(Duration::from_millis(400))
        .with_repeat_behavior(RepeatBehavior::count(2));
    Storyboard::set_target_property(&spin, SPIN_PATH)?;
    sb.add_child(spin)?;

    let recolor = ColorAnimation::new()
        .to(Color::from_hex(0xCC3333))
        .easing(Easing::SineInOut)
        .into_timeline();
    Storyboard::set_target_property(&recolor, COLOR_PATH)?;
    sb.add_child(recolor)?;

    Ok(sb)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let scheduler = AnimationScheduler::with_config(SchedulerConfig::from_toml_str(CONFIG)?);
    set_global_scheduler(scheduler.handle());

    let (canvas, button) = build_scene()?;
    let sb = build_storyboard()?;
    canvas.resources().insert("IntroStoryboard", Arc::new(sb.clone()));

    sb.on_completed(|timeline| {
        tracing::info!(state = ?timeline.current_state(), "storyboard completed");
    });
    sb.begin()?;

    let frame = scheduler.frame_interval();
    let mut frames = 0u32;
    while scheduler.tick_by(frame) {
        frames += 1;
        if frames % 10 == 0 {
            tracing::info!(
                time_ms = sb.current_time().as_millis() as u64,
                left = ?button.get("Canvas.Left")?,
                "frame {frames}"
            );
        }
    }

    let angle = PropertyPath::new(SPIN_PATH).resolve(&button)?.get();
    let color = PropertyPath::new(COLOR_PATH).resolve(&button)?.get();
    tracing::info!(frames, ?angle, ?color, "finished");
    assert_eq!(sb.current_state(), ClockState::Filling);

    sb.stop()?;
    tracing::info!(left = ?button.get("Canvas.Left")?, "stopped and reverted");
    Ok(())
}
