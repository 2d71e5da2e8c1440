use std::env;
use std::path::PathBuf;

use log::info;
use medley::app::App;

mod command;
mod event_loop;
mod settings;


pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    let mut app = App::open(settings.clone())?;
    info!(
        "library restored: {} tracks, state file {}",
        app.index().len(),
        settings.state_path().display()
    );

    // Folders given on the command line replace the configured scan roots.
    let roots: Vec<PathBuf> = env::args_os().skip(1).map(PathBuf::from).collect();
    let roots = (!roots.is_empty()).then_some(roots);
    app.start_scan(roots, settings.library.deep_scan);

    println!("medley: {} tracks. Type `help` for commands.", app.index().len());
    let run_result = event_loop::run(&settings, &mut app);

    app.shutdown()?;
    run_result
}
