use std::io;

use quill_pad::app::controllers::session::SessionManager;
use quill_pad::app::domain::settings::AppSettings;
use quill_pad::app::infrastructure::logging;
use quill_pad::ui::console::{Console, StatusLog};

fn main() {
    let settings = AppSettings::load();
    logging::init(settings.log_to_file);
    tracing::info!(
        notes = %settings.notes_directory.display(),
        "QuillPad {} starting",
        env!("CARGO_PKG_VERSION")
    );

    let mut session = SessionManager::new(settings);
    session.subscribe(Box::new(StatusLog));

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    console.run(&mut session);

    tracing::info!("QuillPad exiting");
}
