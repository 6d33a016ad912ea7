use clap::{Parser, ValueEnum};

use chess_session::controller::SessionController;
use chess_session::mock::{self, Orientation};
use chess_session::rules::ShakmatyRules;
use chess_session::session::{Position, SessionConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    White,
    Black,
}

/// Play a chess session in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Start from this FEN instead of the standard position
    #[arg(long)]
    fen: Option<String>,

    /// Side shown at the bottom of the board
    #[arg(long, value_enum, default_value_t = Side::White)]
    orientation: Side,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut config = SessionConfig::default();
    if let Some(fen) = args.fen {
        config = config.with_start_position(Position::new(fen));
    }
    let orientation = match args.orientation {
        Side::White => Orientation::White,
        Side::Black => Orientation::Black,
    };

    log::info!("Chess session, {:?} at the bottom", orientation);
    let controller = match SessionController::with_config(ShakmatyRules::new(), config) {
        Ok(controller) => controller,
        Err(e) => {
            log::error!("Cannot start session: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = mock::run_interactive_terminal(controller, orientation) {
        log::error!("Terminal session ended: {e}");
        std::process::exit(1);
    }
}
