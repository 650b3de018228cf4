pub mod health;
pub mod todo;

use crate::app::App;

/// Register every route the service exposes.
pub fn init_routes(app: &mut App) {
    health::init_routes(app);
    todo::init_routes(app);
}
