pub mod clock;
pub mod config_loader;
pub mod events;
pub mod logging;
pub mod traits;
pub mod venue;

pub mod prelude {
    pub use crate::clock::*;
    pub use crate::config_loader::*;
    pub use crate::events::*;
    pub use crate::logging::*;
    pub use crate::traits::*;
    pub use crate::venue::*;
}
