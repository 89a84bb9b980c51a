mod category;
mod inputs;
mod post;
mod thread;
mod user;

pub use category::*;
pub use inputs::*;
pub use post::*;
pub use thread::*;
pub use user::*;
