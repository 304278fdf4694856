use cropline::app::CropLineApp;
use cropline::{cli, logger};
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -----------------------------------------------------

    // Session log (overwrites the previous session's file)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("CropLine"),
        ..Default::default()
    };

    eframe::run_native(
        "CropLine",
        options,
        Box::new(|cc| Box::new(CropLineApp::new(cc))),
    )
}
