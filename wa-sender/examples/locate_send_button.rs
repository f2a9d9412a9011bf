use std::path::PathBuf;

use wa_sender::platforms::create_engine;
use wa_sender::AutomationError;

fn main() -> Result<(), AutomationError> {
    let image = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("send_button.png"));

    let engine = create_engine()?;
    let (width, height) = engine.screen_size()?;
    println!("=== Send Button Finder ===\n");
    println!("📺 Screen: {width}x{height}");

    for confidence in [0.9_f32, 0.8, 0.7] {
        match engine.locate_on_screen(&image, confidence)? {
            Some(region) => {
                let (x, y) = region.center();
                println!(
                    "🎯 Found {} at ({}, {}) {}x{} - center ({x}, {y}) with confidence {confidence:.1}",
                    image.display(),
                    region.left,
                    region.top,
                    region.width,
                    region.height
                );
                return Ok(());
            }
            None => println!("  Not visible at confidence {confidence:.1}"),
        }
    }
    println!("❌ {} is not on screen", image.display());
    Ok(())
}
