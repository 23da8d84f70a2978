pub mod enums;
pub mod health_data;
pub mod session;
pub mod suggestion;
pub mod task;
pub mod timestamp;
pub mod user;

pub use enums::*;
pub use health_data::*;
pub use session::*;
pub use suggestion::*;
pub use task::*;
pub use user::*;
