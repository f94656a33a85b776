use anyhow::Context;
use clap::Parser;
use tracing::info;

use bay_calendar::config::{Cli, Command};
use bay_calendar::display::{render_booking_list, render_grid, write_grid_to_file};
use bay_calendar::telemetry::init_telemetry;
use bay_calendar::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry()?;
    let cli = Cli::parse();

    let grid = cli.layout.build_grid().context("failed to build calendar")?;
    info!(
        slots = grid.slots().len(),
        resources = grid.resources().len(),
        "calendar loaded"
    );

    match cli.command {
        Command::Show { title, list, output } => {
            if list {
                print!("{}", render_booking_list(&grid));
            } else {
                println!("=== {} ===", title);
                print!("{}", render_grid(&grid));
            }
            if let Some(path) = output {
                write_grid_to_file(&title, &grid, &path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "calendar written");
            }
        }
        Command::Serve { port, admin_password } => {
            if admin_password.is_none() {
                info!("ADMIN_PASSWORD not set, snapshot uploads are disabled");
            }
            web::start_server(port, AppState::new(grid, admin_password)).await?;
        }
    }

    Ok(())
}
