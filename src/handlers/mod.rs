pub mod diagnostics;
pub mod editor;
pub mod health;
pub mod home;
pub mod login;

pub use diagnostics::*;
pub use editor::*;
pub use health::*;
pub use home::*;
pub use login::*;
